//! Application Controller
//!
//! Single owner of the whole-app state (items, exchange rate, active user).
//! The UI calls these entry points; nothing else mutates the state. Every
//! successful mutation saves the affected slices locally, synchronously,
//! then queues a fire-and-forget remote push of the full snapshot.
//!
//! Local state is the immediately-consistent source of truth for the local
//! user; the remote document is eventually consistent. An inbound remote
//! snapshot and a local edit can interleave with no ordering guarantee
//! beyond "last write wins" — accepted behavior for two trusted users.

use std::path::Path;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::{
    compute_summary, BuyDraft, DomainError, DomainResult, Item, ItemDraft, ItemPatch,
    SummaryStats, User,
};
use crate::repository::LocalStore;
use crate::store::ListStore;
use crate::sync::{RemoteSnapshot, SyncAdapter, SyncConfig, SyncStatus};

pub struct Controller {
    store: ListStore,
    exchange_rate: f64,
    current_user: User,
    local: LocalStore,
    sync: SyncAdapter,
}

impl Controller {
    /// Open the database at `db_path`, load all three slices (each falling
    /// back independently), and set up sync from the optional config.
    pub fn open(db_path: &Path, config: Option<SyncConfig>) -> DomainResult<Self> {
        let local = LocalStore::open(db_path)?;
        Ok(Self::with_parts(local, SyncAdapter::new(config)))
    }

    pub fn with_parts(local: LocalStore, sync: SyncAdapter) -> Self {
        let store = ListStore::from_items(local.load_items());
        let exchange_rate = local.load_rate();
        let current_user = local.load_user();
        Self {
            store,
            exchange_rate,
            current_user,
            local,
            sync,
        }
    }

    // --- Read access ---

    pub fn items(&self) -> &[Item] {
        self.store.items()
    }

    pub fn item(&self, id: Uuid) -> Option<&Item> {
        self.store.get(id)
    }

    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }

    pub fn current_user(&self) -> User {
        self.current_user
    }

    /// Derived totals, recomputed from scratch on every call.
    pub fn summary(&self) -> SummaryStats {
        compute_summary(self.store.items(), self.exchange_rate)
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    // --- Mutations ---

    /// Add a new item stamped with the active user. Returns `None` when the
    /// draft has a blank name (rejected at the boundary, not an error).
    pub fn add_item(&mut self, draft: ItemDraft) -> DomainResult<Option<Uuid>> {
        let Some(id) = self.store.add(draft, self.current_user) else {
            return Ok(None);
        };
        self.persist_items()?;
        Ok(Some(id))
    }

    /// Merge a partial update into an item; false when the id is unknown.
    pub fn update_item(&mut self, id: Uuid, patch: ItemPatch) -> DomainResult<bool> {
        if !self.store.update(id, patch) {
            return Ok(false);
        }
        self.persist_items()?;
        Ok(true)
    }

    pub fn delete_item(&mut self, id: Uuid) -> DomainResult<bool> {
        if !self.store.delete(id) {
            return Ok(false);
        }
        self.persist_items()?;
        Ok(true)
    }

    pub fn clear_all(&mut self) -> DomainResult<()> {
        self.store.clear();
        self.persist_items()
    }

    /// Start the buy flow: seed the dialog from the current estimate.
    pub fn buy_draft(&self, id: Uuid) -> Option<BuyDraft> {
        self.store.buy_draft(id)
    }

    /// Finish the buy flow with the confirmed final price and tax flag.
    pub fn confirm_purchase(
        &mut self,
        id: Uuid,
        price_jpy: f64,
        add_tax: bool,
    ) -> DomainResult<bool> {
        if !self.store.confirm_purchase(id, price_jpy, add_tax) {
            return Ok(false);
        }
        self.persist_items()?;
        Ok(true)
    }

    /// Revert a purchase; the confirmed price/tax stay as entered.
    pub fn unmark_bought(&mut self, id: Uuid) -> DomainResult<bool> {
        if !self.store.unmark_bought(id) {
            return Ok(false);
        }
        self.persist_items()?;
        Ok(true)
    }

    /// Change the exchange rate shared by every converted total.
    pub fn set_rate(&mut self, rate: f64) -> DomainResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "exchange rate must be a non-negative number, got {}",
                rate
            )));
        }
        self.exchange_rate = rate;
        self.local.save_rate(rate)?;
        self.queue_push();
        Ok(())
    }

    /// Switch the active user. Local-only: the selection stamps new items
    /// but is not part of the synced payload.
    pub fn set_user(&mut self, user: User) -> DomainResult<()> {
        self.current_user = user;
        self.local.save_user(user)
    }

    // --- Sync ---

    /// Apply an inbound remote snapshot: overwrite items and rate wholesale
    /// when present, leave absent fields untouched, persist locally, and do
    /// not echo a push back. This is the whole merge policy.
    pub fn apply_remote_snapshot(&mut self, snapshot: RemoteSnapshot) -> DomainResult<()> {
        if let Some(items) = snapshot.items {
            self.store.replace_all(items);
            self.local.save_items(self.store.items())?;
        }
        if let Some(rate) = snapshot.exchange_rate {
            if rate.is_finite() && rate >= 0.0 {
                self.exchange_rate = rate;
                self.local.save_rate(rate)?;
            } else {
                log::warn!("ignoring invalid remote rate {}", rate);
            }
        }
        Ok(())
    }

    /// Subscribe to remote changes; snapshots arrive on the returned
    /// receiver and are applied via
    /// [`apply_remote_snapshot`](Self::apply_remote_snapshot).
    pub fn start_sync(&mut self) -> mpsc::Receiver<RemoteSnapshot> {
        let (tx, rx) = mpsc::channel(16);
        self.sync.start_listener(tx);
        rx
    }

    pub fn stop_sync(&mut self) {
        self.sync.stop_listener();
    }

    fn persist_items(&self) -> DomainResult<()> {
        self.local.save_items(self.store.items())?;
        self.queue_push();
        Ok(())
    }

    fn queue_push(&self) {
        self.sync.queue_push(
            self.store.items().to_vec(),
            self.exchange_rate,
            self.current_user,
        );
    }
}
