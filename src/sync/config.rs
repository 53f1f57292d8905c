//! Sync Configuration
//!
//! The Firebase web-app config, supplied by the operator either as a pasted
//! JSON blob or as a `sync_config.json` file next to the database. All
//! fields are opaque strings; only the API key and database URL are checked
//! for presence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Placeholder left in fresh configs; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Remote connection settings, passed through to Firebase unexamined
/// beyond the presence checks in [`SyncConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default, rename = "databaseURL")]
    pub database_url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
}

impl SyncConfig {
    /// Minimal validation: an API key that is present and not the
    /// placeholder, and a database URL. Everything else is optional.
    pub fn validate(&self) -> DomainResult<()> {
        if self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY {
            return Err(DomainError::InvalidInput(
                "sync config has no API key; cloud sync stays off".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "sync config has no database URL; cloud sync stays off".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a pasted Firebase web config JSON blob.
    pub fn from_json(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::InvalidInput(format!("config is not valid JSON: {}", e)))
    }

    /// Config file lives next to the database file.
    pub fn config_path(db_path: &Path) -> PathBuf {
        match db_path.parent() {
            Some(dir) => dir.join("sync_config.json"),
            None => PathBuf::from("sync_config.json"),
        }
    }

    /// Load the saved config, if any. Unreadable configs count as absent.
    pub fn load(db_path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(Self::config_path(db_path)).ok()?;
        match Self::from_json(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("saved sync config is unreadable: {}", e);
                None
            }
        }
    }

    /// Persist the config for the next start.
    pub fn save(&self, db_path: &Path) -> DomainResult<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::Storage(format!("failed to encode config: {}", e)))?;
        std::fs::write(Self::config_path(db_path), raw)
            .map_err(|e| DomainError::Storage(format!("failed to save config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SyncConfig {
        SyncConfig {
            api_key: "AIzaSyTest".to_string(),
            database_url: "https://demo-default-rtdb.firebaseio.com".to_string(),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let mut config = valid_config();
        config.api_key = PLACEHOLDER_API_KEY.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_database_url_rejected() {
        let mut config = valid_config();
        config.database_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parses_pasted_firebase_blob() {
        let raw = r#"{
            "apiKey": "AIzaSyTest",
            "authDomain": "demo.firebaseapp.com",
            "databaseURL": "https://demo-default-rtdb.firebaseio.com",
            "projectId": "demo",
            "storageBucket": "demo.appspot.com",
            "messagingSenderId": "123",
            "appId": "1:123:web:abc"
        }"#;
        let config = SyncConfig::from_json(raw).expect("should parse");
        assert_eq!(config.project_id, "demo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_blob_still_parses() {
        // Missing fields default to empty; validate() then rejects it
        let config = SyncConfig::from_json(r#"{"apiKey": "k"}"#).expect("should parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("kaimono.db");

        let config = valid_config();
        config.save(&db_path).expect("save failed");
        assert_eq!(SyncConfig::load(&db_path), Some(config));
    }

    #[test]
    fn test_load_absent_config_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(SyncConfig::load(&dir.path().join("kaimono.db")), None);
    }
}
