//! Database Connection and Setup
//!
//! Manages the SQLite database connection and migrations. Storage is a
//! plain key-value table: each state slice lives under its own key.

use std::path::Path;

use rusqlite::Connection;

use crate::domain::{DomainError, DomainResult};

/// Open (or create) the database at `db_path` and run migrations.
pub fn init_db(db_path: &Path) -> DomainResult<Connection> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Storage(format!("failed to open db: {}", e)))?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// In-memory database for tests.
pub fn init_db_in_memory() -> DomainResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| DomainError::Storage(format!("failed to open db: {}", e)))?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| DomainError::Storage(e.to_string()))?;

    Ok(())
}
