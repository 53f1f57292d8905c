//! Wishlist Item Entity
//!
//! One purchasable entry on the shared list. Items are serialized in
//! camelCase so the same records round-trip through local storage and the
//! remote document unchanged.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two users sharing the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum User {
    #[default]
    Ash,
    Greg,
}

impl User {
    pub fn as_str(&self) -> &'static str {
        match self {
            User::Ash => "Ash",
            User::Greg => "Greg",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Greg" => User::Greg,
            _ => User::Ash,
        }
    }
}

/// Rough category for grouping items on the list
///
/// Legacy payloads have no category field; absent means `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Category {
    Food,
    Drugstore,
    Clothing,
    Souvenir,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Drugstore => "Drugstore",
            Category::Clothing => "Clothing",
            Category::Souvenir => "Souvenir",
            Category::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Food" => Category::Food,
            "Drugstore" => Category::Drugstore,
            "Clothing" => Category::Clothing,
            "Souvenir" => Category::Souvenir,
            _ => Category::Other,
        }
    }
}

/// A single wishlist / purchase-tracking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier, assigned at creation
    pub id: Uuid,
    /// Who added the item
    pub created_by: User,
    /// Display name (non-empty, enforced at creation)
    pub name: String,
    #[serde(default)]
    pub category: Category,
    /// Always >= 1
    pub quantity: u32,
    /// Unit price in JPY; 0 means unknown/unset
    pub price_jpy: f64,
    /// Whether a flat 10% tax applies on top of `price_jpy`
    pub add_tax: bool,
    #[serde(default)]
    pub notes: String,
    /// Drives the thumbnail; doubles as the link target when `product_url`
    /// is absent (legacy items)
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    pub is_bought: bool,
    /// Creation timestamp, epoch milliseconds
    pub created_at: i64,
}

impl Item {
    /// Build a fresh item from a draft: assigns id and timestamp,
    /// starts unbought, and normalizes the numeric fields.
    pub fn from_draft(draft: ItemDraft, created_by: User) -> Self {
        let mut item = Self {
            id: Uuid::new_v4(),
            created_by,
            name: draft.name,
            category: draft.category,
            quantity: draft.quantity,
            price_jpy: draft.price_jpy,
            add_tax: draft.add_tax,
            notes: draft.notes,
            image_url: draft.image_url,
            product_url: draft.product_url,
            is_bought: false,
            created_at: Utc::now().timestamp_millis(),
        };
        item.normalize();
        item
    }

    /// Clamp fields back into their invariants. Applied once whenever an
    /// item enters the store (creation, local load, remote snapshot).
    pub fn normalize(&mut self) {
        if self.quantity < 1 {
            self.quantity = 1;
        }
        if !self.price_jpy.is_finite() || self.price_jpy < 0.0 {
            self.price_jpy = 0.0;
        }
        if matches!(&self.product_url, Some(url) if url.trim().is_empty()) {
            self.product_url = None;
        }
    }

    /// Outbound link target: the product URL, or the image URL for legacy
    /// items that only recorded one link.
    pub fn display_link(&self) -> Option<&str> {
        match &self.product_url {
            Some(url) => Some(url.as_str()),
            None if !self.image_url.is_empty() => Some(self.image_url.as_str()),
            None => None,
        }
    }
}

/// Fields supplied by the add form
///
/// `id`, `created_at` and `is_bought` are assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub quantity: u32,
    #[serde(default)]
    pub price_jpy: f64,
    #[serde(default)]
    pub add_tax: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: Option<String>,
}

/// Partial update for an existing item; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub quantity: Option<u32>,
    pub price_jpy: Option<f64>,
    pub add_tax: Option<bool>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    /// `Some(None)` clears the product URL
    pub product_url: Option<Option<String>>,
    pub is_bought: Option<bool>,
}

impl ItemPatch {
    /// Patch for confirming a purchase: the two-step buy flow ends with
    /// exactly these three fields changing.
    pub fn confirm_purchase(price_jpy: f64, add_tax: bool) -> Self {
        Self {
            price_jpy: Some(price_jpy),
            add_tax: Some(add_tax),
            is_bought: Some(true),
            ..Self::default()
        }
    }

    /// Patch for reverting a purchase: only the bought flag moves, the
    /// confirmed price and tax stay as entered.
    pub fn unmark_bought() -> Self {
        Self {
            is_bought: Some(false),
            ..Self::default()
        }
    }
}

/// Candidate final price/tax captured while confirming a purchase,
/// pre-seeded from the item's current estimate so the user only changes
/// what differs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyDraft {
    pub price_jpy: f64,
    pub add_tax: bool,
}

impl BuyDraft {
    pub fn for_item(item: &Item) -> Self {
        Self {
            price_jpy: item.price_jpy,
            add_tax: item.add_tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            quantity: 1,
            ..ItemDraft::default()
        }
    }

    #[test]
    fn test_from_draft_defaults() {
        let item = Item::from_draft(draft("Wakamoto"), User::Ash);
        assert_eq!(item.name, "Wakamoto");
        assert_eq!(item.created_by, User::Ash);
        assert!(!item.is_bought);
        assert!(item.created_at > 0);
        assert_eq!(item.category, Category::Other);
    }

    #[test]
    fn test_normalize_clamps() {
        let mut item = Item::from_draft(draft("x"), User::Greg);
        item.quantity = 0;
        item.price_jpy = -5.0;
        item.product_url = Some("  ".to_string());
        item.normalize();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price_jpy, 0.0);
        assert_eq!(item.product_url, None);
    }

    #[test]
    fn test_display_link_fallback() {
        let mut item = Item::from_draft(draft("x"), User::Ash);
        assert_eq!(item.display_link(), None);

        item.image_url = "https://img.example/a.jpg".to_string();
        assert_eq!(item.display_link(), Some("https://img.example/a.jpg"));

        item.product_url = Some("https://shop.example/a".to_string());
        assert_eq!(item.display_link(), Some("https://shop.example/a"));
    }

    #[test]
    fn test_legacy_payload_without_category() {
        // Early variants never wrote a category field
        let raw = r#"{
            "id": "4a4e5e1e-6f44-41a5-bb6b-3e2f77d0a111",
            "createdBy": "Greg",
            "name": "Uniqlo T-shirt",
            "quantity": 2,
            "priceJpy": 1500.0,
            "addTax": true,
            "notes": "",
            "imageUrl": "",
            "isBought": false,
            "createdAt": 1700000000000
        }"#;
        let item: Item = serde_json::from_str(raw).expect("legacy item should parse");
        assert_eq!(item.category, Category::Other);
        assert_eq!(item.product_url, None);
        assert_eq!(item.created_by, User::Greg);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let item = Item::from_draft(draft("Snack"), User::Ash);
        let raw = serde_json::to_string(&item).unwrap();
        assert!(raw.contains("\"priceJpy\""));
        assert!(raw.contains("\"addTax\""));
        assert!(raw.contains("\"isBought\""));
        assert!(raw.contains("\"createdAt\""));
    }

    #[test]
    fn test_user_round_trip() {
        assert_eq!(User::from_str("Greg"), User::Greg);
        assert_eq!(User::from_str("nobody"), User::Ash);
        assert_eq!(Category::from_str("Drugstore"), Category::Drugstore);
        assert_eq!(Category::from_str(""), Category::Other);
    }
}
