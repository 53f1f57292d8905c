//! Pricing / Summary Calculator
//!
//! Pure derivation of aggregate totals from the item list and the current
//! exchange rate. Recomputed on every read; never stored or cached.

use serde::{Deserialize, Serialize};

use super::item::Item;

/// Derived aggregate totals, split by purchase state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Sum of quantities across all items
    pub total_count: u64,
    pub total_jpy: i64,
    pub total_twd: i64,
    /// Sum of quantities across bought items only
    pub bought_count: u64,
    pub bought_jpy: i64,
    pub bought_twd: i64,
}

/// Line total in JPY: unit price x quantity x tax multiplier, rounded once
/// per line so rounding error does not compound across the quantity.
pub fn line_total_jpy(item: &Item) -> i64 {
    let tax_multiplier = if item.add_tax { 1.1 } else { 1.0 };
    (item.price_jpy * item.quantity as f64 * tax_multiplier).round() as i64
}

/// Line total converted to TWD at the given rate
pub fn line_total_twd(item: &Item, rate: f64) -> i64 {
    (line_total_jpy(item) as f64 * rate).round() as i64
}

/// Compute the grand totals and the bought-only subtotals in one pass.
pub fn compute_summary(items: &[Item], rate: f64) -> SummaryStats {
    let mut stats = SummaryStats::default();
    for item in items {
        let jpy = line_total_jpy(item);
        let twd = line_total_twd(item, rate);

        stats.total_count += item.quantity as u64;
        stats.total_jpy += jpy;
        stats.total_twd += twd;

        if item.is_bought {
            stats.bought_count += item.quantity as u64;
            stats.bought_jpy += jpy;
            stats.bought_twd += twd;
        }
    }
    stats
}
