//! Item Store
//!
//! The ordered in-memory collection of wishlist items, most-recent-first.
//! All mutations run synchronously to completion; there is no parallel
//! mutation path, so the collection needs no locking of its own.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::{BuyDraft, Item, ItemDraft, ItemPatch, User};

/// Ordered collection of wishlist items
#[derive(Debug, Default)]
pub struct ListStore {
    items: Vec<Item>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded records, normalizing each one.
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut store = Self::new();
        store.replace_all(items);
        store
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add a new item to the front of the list (most-recent-first order).
    ///
    /// Returns the new item's id, or `None` when the draft has a
    /// blank name. Blank names are rejected at the input boundary; the
    /// store just refuses them silently.
    pub fn add(&mut self, draft: ItemDraft, created_by: User) -> Option<Uuid> {
        if draft.name.trim().is_empty() {
            return None;
        }
        let item = Item::from_draft(draft, created_by);
        let id = item.id;
        self.items.insert(0, item);
        Some(id)
    }

    /// Merge a partial update into the matching item.
    ///
    /// Returns false (no-op) when the id is unknown. Quantity below 1 is
    /// clamped back to 1.
    pub fn update(&mut self, id: Uuid, patch: ItemPatch) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(price_jpy) = patch.price_jpy {
            item.price_jpy = price_jpy;
        }
        if let Some(add_tax) = patch.add_tax {
            item.add_tax = add_tax;
        }
        if let Some(notes) = patch.notes {
            item.notes = notes;
        }
        if let Some(image_url) = patch.image_url {
            item.image_url = image_url;
        }
        if let Some(product_url) = patch.product_url {
            item.product_url = product_url;
        }
        if let Some(is_bought) = patch.is_bought {
            item.is_bought = is_bought;
        }
        item.normalize();
        true
    }

    /// Remove the matching item; no-op when the id is unknown.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Empty the entire collection.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Pre-seed the buy dialog from the item's current price/tax estimate.
    pub fn buy_draft(&self, id: Uuid) -> Option<BuyDraft> {
        self.get(id).map(BuyDraft::for_item)
    }

    /// Finish the two-step buy flow: record the final price and tax flag
    /// and mark the item bought. Nothing else changes.
    pub fn confirm_purchase(&mut self, id: Uuid, price_jpy: f64, add_tax: bool) -> bool {
        self.update(id, ItemPatch::confirm_purchase(price_jpy, add_tax))
    }

    /// Revert a purchase. Deliberately leaves the confirmed price/tax in
    /// place rather than restoring the pre-purchase estimate.
    pub fn unmark_bought(&mut self, id: Uuid) -> bool {
        self.update(id, ItemPatch::unmark_bought())
    }

    /// Whole-collection replacement, used by local load and remote
    /// snapshots. Every record is normalized and duplicate ids are dropped
    /// (first occurrence wins) so a malformed payload can never leave the
    /// collection structurally invalid.
    pub fn replace_all(&mut self, items: Vec<Item>) {
        let mut seen = HashSet::new();
        self.items = items
            .into_iter()
            .filter_map(|mut item| {
                item.normalize();
                seen.insert(item.id).then_some(item)
            })
            .collect();
    }
}
