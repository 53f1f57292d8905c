//! Domain Layer - Error Taxonomy
//!
//! Nothing in this system is fatal: storage errors degrade to defaults on
//! load, sync errors leave the local list fully usable offline, and bad
//! input is rejected at the boundary.

use serde::{Deserialize, Serialize};

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Storage(String),
    Sync(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Storage(msg) => write!(f, "Storage error: {}", msg),
            DomainError::Sync(msg) => write!(f, "Sync error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
