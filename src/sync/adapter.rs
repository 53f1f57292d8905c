//! Remote Sync Adapter
//!
//! Mirrors the full `{items, exchangeRate, updatedAt, updatedBy}` snapshot
//! to one well-known Realtime Database document, and subscribes to that
//! document over the streaming REST endpoint. Inbound payloads overwrite
//! local state wholesale: last writer wins, no merge, no version checks.
//!
//! Nothing here is fatal. A missing or invalid config keeps the adapter
//! Disabled; failed writes are logged and surfaced as a status string and
//! never roll back the local mutation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::{DomainError, DomainResult, Item, User};

use super::config::SyncConfig;
use super::sse::SseParser;

/// The single document all devices share
pub const REMOTE_PATH: &str = "shopping-list/data";

/// Delay before re-subscribing after the stream drops
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Remote document payload. Every field is optional on the way in:
/// fields absent from a payload are left untouched by the applier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<User>,
}

/// Adapter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Sync is off: no valid remote configuration, or the listener has
    /// been torn down. Terminal until a config is supplied or the
    /// listener is started again.
    #[default]
    Disabled,
    /// Configuration present, subscription being established
    Connecting,
    /// An active subscription is delivering updates
    Connected,
}

/// Current state plus the most recent non-fatal error, if any
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_error: Option<String>,
}

/// Transport seam: how a snapshot reaches the remote document.
/// Tests swap in a recording mock; production uses [`FirebaseRest`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn put_snapshot(&self, snapshot: &RemoteSnapshot) -> DomainResult<()>;
}

/// Realtime Database REST transport
pub struct FirebaseRest {
    client: reqwest::Client,
    endpoint: String,
}

impl FirebaseRest {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: document_endpoint(&config.database_url),
        }
    }
}

#[async_trait]
impl RemoteStore for FirebaseRest {
    async fn put_snapshot(&self, snapshot: &RemoteSnapshot) -> DomainResult<()> {
        let response = self
            .client
            .put(&self.endpoint)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| DomainError::Sync(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| DomainError::Sync(e.to_string()))?;
        Ok(())
    }
}

fn document_endpoint(database_url: &str) -> String {
    format!("{}/{}.json", database_url.trim_end_matches('/'), REMOTE_PATH)
}

/// Mirrors local state to the remote document and listens for pushes
pub struct SyncAdapter {
    config: Option<SyncConfig>,
    remote: Option<Arc<dyn RemoteStore>>,
    status: Arc<Mutex<SyncStatus>>,
    listener: Option<JoinHandle<()>>,
}

impl SyncAdapter {
    /// Adapter with sync turned off; item management works fully offline.
    pub fn disabled() -> Self {
        Self {
            config: None,
            remote: None,
            status: Arc::new(Mutex::new(SyncStatus::default())),
            listener: None,
        }
    }

    /// Build from an optional config. An absent or invalid config leaves
    /// the adapter Disabled with a readable status message.
    pub fn new(config: Option<SyncConfig>) -> Self {
        let Some(config) = config else {
            return Self::disabled();
        };
        if let Err(e) = config.validate() {
            log::warn!("cloud sync disabled: {}", e);
            let adapter = Self::disabled();
            set_status(&adapter.status, SyncState::Disabled, Some(e.to_string()));
            return adapter;
        }
        let remote: Arc<dyn RemoteStore> = Arc::new(FirebaseRest::new(&config));
        Self {
            config: Some(config),
            remote: Some(remote),
            status: Arc::new(Mutex::new(SyncStatus {
                state: SyncState::Connecting,
                last_error: None,
            })),
            listener: None,
        }
    }

    /// Adapter over a custom transport; used by tests.
    pub fn with_remote(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            config: None,
            remote: Some(remote),
            status: Arc::new(Mutex::new(SyncStatus {
                state: SyncState::Connected,
                last_error: None,
            })),
            listener: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Fire-and-forget full-snapshot write. The caller's mutation has
    /// already been applied and persisted locally; a failed write is
    /// recorded as a status string and changes nothing else. Callers
    /// without an async runtime get the same degraded status instead of
    /// a panic: there are no fatal error conditions here.
    pub fn queue_push(&self, items: Vec<Item>, exchange_rate: f64, updated_by: User) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let snapshot = RemoteSnapshot {
            items: Some(items),
            exchange_rate: Some(exchange_rate),
            updated_at: Some(Utc::now().timestamp_millis()),
            updated_by: Some(updated_by),
        };
        let status = self.status.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(deliver(remote, status, snapshot));
            }
            Err(_) => {
                log::warn!("remote write skipped: no async runtime available");
                if let Ok(mut s) = status.lock() {
                    s.last_error =
                        Some("remote write skipped: no async runtime available".to_string());
                }
            }
        }
    }

    /// Subscribe to the remote document. Inbound snapshots are forwarded on
    /// `tx`; the receiving side applies them. A dropped stream is
    /// re-subscribed after a short delay; the loop ends when the receiver
    /// goes away or [`shutdown`](Self::shutdown) aborts it.
    pub fn start_listener(&mut self, tx: mpsc::Sender<RemoteSnapshot>) {
        let Some(config) = self.config.clone() else {
            return;
        };
        self.stop_listener();

        let endpoint = document_endpoint(&config.database_url);
        let status = self.status.clone();
        set_status(&status, SyncState::Connecting, None);

        self.listener = Some(tokio::spawn(async move {
            let client = reqwest::Client::new();
            loop {
                if !run_subscription(&client, &endpoint, &status, &tx).await {
                    return; // receiver gone
                }
                set_status_state(&status, SyncState::Connecting);
                tokio::time::sleep(RESUBSCRIBE_DELAY).await;
            }
        }));
    }

    /// Unsubscribe cleanly. Nothing is being established afterwards, so
    /// the status drops back to Disabled; reconnection goes through
    /// [`start_listener`](Self::start_listener) again, which re-validates
    /// from scratch.
    pub fn stop_listener(&mut self) {
        if let Some(task) = self.listener.take() {
            task.abort();
            set_status_state(&self.status, SyncState::Disabled);
        }
    }
}

impl Drop for SyncAdapter {
    fn drop(&mut self) {
        if let Some(task) = self.listener.take() {
            task.abort();
        }
    }
}

/// Perform one outbound write, recording the outcome in the shared status.
async fn deliver(
    remote: Arc<dyn RemoteStore>,
    status: Arc<Mutex<SyncStatus>>,
    snapshot: RemoteSnapshot,
) {
    match remote.put_snapshot(&snapshot).await {
        Ok(()) => {
            if let Ok(mut s) = status.lock() {
                s.last_error = None;
            }
        }
        Err(e) => {
            log::warn!("remote write failed: {}", e);
            if let Ok(mut s) = status.lock() {
                s.last_error = Some(format!("remote write failed: {}", e));
            }
        }
    }
}

/// One subscription attempt: open the event stream and pump frames until it
/// drops. Returns false when the receiving side is gone and the listener
/// should stop for good.
async fn run_subscription(
    client: &reqwest::Client,
    endpoint: &str,
    status: &Arc<Mutex<SyncStatus>>,
    tx: &mpsc::Sender<RemoteSnapshot>,
) -> bool {
    let response = client
        .get(endpoint)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await;

    let mut response = match response {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            set_status(
                status,
                SyncState::Connecting,
                Some(format!("subscription refused: HTTP {}", r.status())),
            );
            return true;
        }
        Err(e) => {
            set_status(
                status,
                SyncState::Connecting,
                Some(format!("subscription failed: {}", e)),
            );
            return true;
        }
    };

    set_status(status, SyncState::Connected, None);
    let mut parser = SseParser::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                for event in parser.feed(&chunk) {
                    match event.name.as_str() {
                        "put" | "patch" => {
                            if let Some(snapshot) = decode_put_frame(&event.data) {
                                if tx.send(snapshot).await.is_err() {
                                    return false;
                                }
                            }
                        }
                        "keep-alive" => {}
                        "cancel" | "auth_revoked" => {
                            set_status(
                                status,
                                SyncState::Connecting,
                                Some(format!("subscription ended by server: {}", event.name)),
                            );
                            return true;
                        }
                        _ => {}
                    }
                }
            }
            Ok(None) => return true, // stream ended
            Err(e) => {
                set_status(
                    status,
                    SyncState::Connecting,
                    Some(format!("subscription read failed: {}", e)),
                );
                return true;
            }
        }
    }
}

/// Streaming frame: `{"path": "/...", "data": {...}}`
#[derive(Debug, Deserialize)]
struct PutFrame {
    path: String,
    #[serde(default)]
    data: Option<RemoteSnapshot>,
}

/// Decode a put/patch frame into a snapshot. The original client only ever
/// received whole-document values, so sub-path frames are skipped with a
/// warning rather than partially applied.
fn decode_put_frame(raw: &str) -> Option<RemoteSnapshot> {
    match serde_json::from_str::<PutFrame>(raw) {
        Ok(frame) if frame.path == "/" => frame.data,
        Ok(frame) => {
            log::warn!("ignoring sub-path frame for {}", frame.path);
            None
        }
        Err(e) => {
            log::warn!("unreadable remote frame: {}", e);
            None
        }
    }
}

fn set_status(status: &Arc<Mutex<SyncStatus>>, state: SyncState, error: Option<String>) {
    if let Ok(mut s) = status.lock() {
        s.state = state;
        s.last_error = error;
    }
}

fn set_status_state(status: &Arc<Mutex<SyncStatus>>, state: SyncState) {
    if let Ok(mut s) = status.lock() {
        s.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemDraft, User};

    struct RecordingRemote {
        pushes: Mutex<Vec<RemoteSnapshot>>,
        fail: bool,
    }

    impl RecordingRemote {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                pushes: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl RemoteStore for RecordingRemote {
        async fn put_snapshot(&self, snapshot: &RemoteSnapshot) -> DomainResult<()> {
            if self.fail {
                return Err(DomainError::Sync("permission denied".to_string()));
            }
            self.pushes.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    fn sample_items() -> Vec<Item> {
        vec![Item::from_draft(
            ItemDraft {
                name: "Snack".to_string(),
                quantity: 2,
                price_jpy: 500.0,
                add_tax: true,
                ..ItemDraft::default()
            },
            User::Ash,
        )]
    }

    #[test]
    fn test_missing_config_is_disabled() {
        let adapter = SyncAdapter::new(None);
        assert!(!adapter.is_enabled());
        assert_eq!(adapter.status().state, SyncState::Disabled);
    }

    #[test]
    fn test_invalid_config_is_disabled_with_message() {
        let adapter = SyncAdapter::new(Some(SyncConfig::default()));
        assert!(!adapter.is_enabled());
        let status = adapter.status();
        assert_eq!(status.state, SyncState::Disabled);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_valid_config_starts_connecting() {
        let config = SyncConfig {
            api_key: "AIzaSyTest".to_string(),
            database_url: "https://demo-default-rtdb.firebaseio.com".to_string(),
            ..SyncConfig::default()
        };
        let adapter = SyncAdapter::new(Some(config));
        assert!(adapter.is_enabled());
        assert_eq!(adapter.status().state, SyncState::Connecting);
    }

    #[test]
    fn test_document_endpoint() {
        assert_eq!(
            document_endpoint("https://demo-default-rtdb.firebaseio.com/"),
            "https://demo-default-rtdb.firebaseio.com/shopping-list/data.json"
        );
    }

    #[tokio::test]
    async fn test_deliver_records_full_snapshot() {
        let remote = RecordingRemote::new(false);
        let status = Arc::new(Mutex::new(SyncStatus::default()));

        let snapshot = RemoteSnapshot {
            items: Some(sample_items()),
            exchange_rate: Some(0.2),
            updated_at: Some(1_700_000_000_000),
            updated_by: Some(User::Greg),
        };
        deliver(remote.clone(), status.clone(), snapshot.clone()).await;

        let pushes = remote.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0], snapshot);
        assert!(status.lock().unwrap().last_error.is_none());
    }

    #[tokio::test]
    async fn test_deliver_failure_is_recorded_not_fatal() {
        let remote = RecordingRemote::new(true);
        let status = Arc::new(Mutex::new(SyncStatus::default()));

        deliver(
            remote,
            status.clone(),
            RemoteSnapshot {
                items: Some(sample_items()),
                exchange_rate: Some(0.2),
                ..RemoteSnapshot::default()
            },
        )
        .await;

        let error = status.lock().unwrap().last_error.clone();
        assert!(error.expect("error should be recorded").contains("permission denied"));
    }

    #[test]
    fn test_queue_push_without_runtime_degrades_to_status() {
        // A sync-enabled mutation from a plain synchronous caller must not
        // panic; the skipped write surfaces as a status string.
        let remote = RecordingRemote::new(false);
        let adapter = SyncAdapter::with_remote(remote.clone());

        adapter.queue_push(sample_items(), 0.2, User::Ash);

        assert!(remote.pushes.lock().unwrap().is_empty());
        let status = adapter.status();
        assert!(status
            .last_error
            .expect("skipped write should be surfaced")
            .contains("no async runtime"));
    }

    #[tokio::test]
    async fn test_stop_listener_reports_disabled() {
        let config = SyncConfig {
            api_key: "AIzaSyTest".to_string(),
            database_url: "https://demo-default-rtdb.firebaseio.com".to_string(),
            ..SyncConfig::default()
        };
        let mut adapter = SyncAdapter::new(Some(config));
        let (tx, _rx) = mpsc::channel(4);
        adapter.start_listener(tx);
        assert_eq!(adapter.status().state, SyncState::Connecting);

        adapter.stop_listener();
        assert_eq!(adapter.status().state, SyncState::Disabled);
    }

    #[tokio::test]
    async fn test_queue_push_is_fire_and_forget() {
        let remote = RecordingRemote::new(false);
        let adapter = SyncAdapter::with_remote(remote.clone());

        adapter.queue_push(sample_items(), 0.2, User::Ash);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let pushes = remote.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].exchange_rate, Some(0.2));
        assert_eq!(pushes[0].updated_by, Some(User::Ash));
        assert!(pushes[0].updated_at.is_some());
    }

    #[test]
    fn test_decode_root_put_frame() {
        let raw = r#"{"path":"/","data":{"exchangeRate":0.21,"updatedBy":"Greg"}}"#;
        let snapshot = decode_put_frame(raw).expect("should decode");
        assert_eq!(snapshot.exchange_rate, Some(0.21));
        assert_eq!(snapshot.updated_by, Some(User::Greg));
        assert_eq!(snapshot.items, None);
    }

    #[test]
    fn test_decode_null_data_is_none() {
        assert_eq!(decode_put_frame(r#"{"path":"/","data":null}"#), None);
    }

    #[test]
    fn test_decode_sub_path_frame_is_skipped() {
        let raw = r#"{"path":"/items/0","data":{"priceJpy":100}}"#;
        assert_eq!(decode_put_frame(raw), None);
    }

    #[test]
    fn test_decode_garbage_is_none() {
        assert_eq!(decode_put_frame("not json"), None);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let snapshot = RemoteSnapshot {
            items: Some(sample_items()),
            exchange_rate: Some(0.2),
            updated_at: Some(1),
            updated_by: Some(User::Ash),
        };
        let raw = serde_json::to_string(&snapshot).unwrap();
        assert!(raw.contains("\"exchangeRate\""));
        assert!(raw.contains("\"updatedAt\""));
        assert!(raw.contains("\"updatedBy\":\"Ash\""));
    }
}
