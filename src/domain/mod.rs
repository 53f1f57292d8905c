//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO external dependencies (except serde/uuid/chrono for
//! serialization, ids and timestamps).

mod error;
mod item;
mod summary;

pub use error::{DomainError, DomainResult};
pub use item::{BuyDraft, Category, Item, ItemDraft, ItemPatch, User};
pub use summary::{compute_summary, line_total_jpy, line_total_twd, SummaryStats};
