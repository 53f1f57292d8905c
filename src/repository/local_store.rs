//! Local Persistence Adapter
//!
//! Serializes each state slice to its own versioned key after every
//! mutation, and loads the slices independently on start. Loading is
//! best-effort: a corrupt value for one slice falls back to that slice's
//! default without touching the others.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::domain::{DomainError, DomainResult, Item, User};

use super::db;

/// Key for the JSON-encoded item list
pub const ITEMS_KEY: &str = "japan_shopping_list_v1";
/// Key for the stringified exchange rate
pub const RATE_KEY: &str = "japan_shopping_rate_v1";
/// Key for the active user name
pub const USER_KEY: &str = "japan_shopping_user_v1";

/// Fallback rate when nothing is stored yet (1 JPY in TWD)
pub const DEFAULT_EXCHANGE_RATE: f64 = 0.20;

/// SQLite-backed slice store
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub fn open(db_path: &Path) -> DomainResult<Self> {
        Ok(Self {
            conn: db::init_db(db_path)?,
        })
    }

    pub fn in_memory() -> DomainResult<Self> {
        Ok(Self {
            conn: db::init_db_in_memory()?,
        })
    }

    fn get(&self, key: &str) -> Option<String> {
        let row = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional();
        match row {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read key {}: {}", key, e);
                None
            }
        }
    }

    fn put(&self, key: &str, value: &str) -> DomainResult<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                [key, value],
            )
            .map_err(|e| DomainError::Storage(format!("failed to write key {}: {}", key, e)))?;
        Ok(())
    }

    /// Load the item list; absent or unreadable means empty.
    pub fn load_items(&self) -> Vec<Item> {
        match self.get(ITEMS_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<Item>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("stored item list is unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
        }
    }

    pub fn save_items(&self, items: &[Item]) -> DomainResult<()> {
        let raw = serde_json::to_string(items)
            .map_err(|e| DomainError::Storage(format!("failed to encode items: {}", e)))?;
        self.put(ITEMS_KEY, &raw)
    }

    /// Load the exchange rate; absent or unreadable means the default.
    pub fn load_rate(&self) -> f64 {
        match self.get(RATE_KEY) {
            None => DEFAULT_EXCHANGE_RATE,
            Some(raw) => match raw.parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate >= 0.0 => rate,
                _ => {
                    log::warn!("stored rate {:?} is unreadable, using default", raw);
                    DEFAULT_EXCHANGE_RATE
                }
            },
        }
    }

    pub fn save_rate(&self, rate: f64) -> DomainResult<()> {
        self.put(RATE_KEY, &rate.to_string())
    }

    /// Load the active user; absent or unknown means the default user.
    pub fn load_user(&self) -> User {
        match self.get(USER_KEY) {
            None => User::default(),
            Some(raw) => User::from_str(&raw),
        }
    }

    pub fn save_user(&self, user: User) -> DomainResult<()> {
        self.put(USER_KEY, user.as_str())
    }

    /// Write an arbitrary raw value, used by tests to simulate corruption.
    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &str, value: &str) {
        self.put(key, value).expect("raw write failed");
    }
}
