//! Remote Sync Layer
//!
//! Mirrors the item list and exchange rate to one well-known document in a
//! Firebase Realtime Database, and subscribes to remote changes. The merge
//! policy is deliberately last-writer-wins: two trusted users, no conflict
//! detection.

mod adapter;
mod config;
mod sse;

pub use adapter::{RemoteSnapshot, RemoteStore, SyncAdapter, SyncState, SyncStatus, REMOTE_PATH};
pub use config::{SyncConfig, PLACEHOLDER_API_KEY};
pub use sse::{SseEvent, SseParser};
