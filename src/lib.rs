//! Kaimono Core
//!
//! Shared two-person Japan-shopping wishlist: item ledger, JPY/TWD summary
//! totals, local persistence and optional cloud mirroring.
//!
//! Layered architecture:
//! - domain: Core entities, summary math and business rules
//! - store: The ordered item collection and its mutations
//! - repository: Local durable key-value persistence (SQLite)
//! - sync: Remote real-time document mirror (last writer wins)
//! - controller: Application-facing entry points the UI calls into

pub mod controller;
pub mod domain;
pub mod repository;
pub mod store;
pub mod sync;
pub mod urls;

pub use controller::Controller;
pub use domain::{Category, Item, ItemDraft, ItemPatch, SummaryStats, User};
pub use repository::{LocalStore, DEFAULT_EXCHANGE_RATE};
pub use store::ListStore;
pub use sync::{RemoteSnapshot, SyncAdapter, SyncConfig, SyncState};
