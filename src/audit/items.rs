//! Per-category item filtering.

use crate::core::market::{Category, MarketItem};
use std::collections::HashSet;
use std::fmt::Display;

/// Largest plausible day-over-day move, in percent.
pub const MAX_ABS_TREND_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRejection {
    InvalidPrice,
    TrendOutOfRange,
    DuplicateTicker,
}

/// Diagnostics for one audited category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAudit {
    pub category: Category,
    pub received: usize,
    pub kept: usize,
    pub invalid_price: usize,
    pub trend_out_of_range: usize,
    pub duplicate_ticker: usize,
}

impl ItemAudit {
    fn new(category: Category, received: usize) -> Self {
        Self {
            category,
            received,
            kept: 0,
            invalid_price: 0,
            trend_out_of_range: 0,
            duplicate_ticker: 0,
        }
    }

    pub fn dropped(&self) -> usize {
        self.received - self.kept
    }

    fn record(&mut self, rejection: ItemRejection) {
        match rejection {
            ItemRejection::InvalidPrice => self.invalid_price += 1,
            ItemRejection::TrendOutOfRange => self.trend_out_of_range += 1,
            ItemRejection::DuplicateTicker => self.duplicate_ticker += 1,
        }
    }
}

impl Display for ItemAudit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}/{} kept", self.category, self.kept, self.received)?;

        let reasons: Vec<String> = [
            (self.invalid_price, "invalid price"),
            (self.trend_out_of_range, "trend out of range"),
            (self.duplicate_ticker, "duplicate ticker"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, reason)| format!("{count} {reason}"))
        .collect();

        if !reasons.is_empty() {
            write!(f, " ({})", reasons.join(", "))?;
        }
        Ok(())
    }
}

/// Checks one item against the rules in order; the first failure wins.
fn check_item(item: &MarketItem, seen: &HashSet<String>) -> Result<(), ItemRejection> {
    if !item.price.is_finite() || item.price <= 0.0 {
        return Err(ItemRejection::InvalidPrice);
    }
    // NaN fails this comparison as well.
    if !(item.trend.abs() <= MAX_ABS_TREND_PCT) {
        return Err(ItemRejection::TrendOutOfRange);
    }
    if seen.contains(&item.ticker) {
        return Err(ItemRejection::DuplicateTicker);
    }
    Ok(())
}

/// Filters `items`, keeping survivors verbatim and in their original order.
///
/// Only items that passed the price and trend rules count as "seen" for the
/// duplicate rule, so an invalid first occurrence does not shadow a valid one.
pub fn audit_items(category: Category, items: Vec<MarketItem>) -> (Vec<MarketItem>, ItemAudit) {
    let mut audit = ItemAudit::new(category, items.len());
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        match check_item(&item, &seen) {
            Ok(()) => {
                seen.insert(item.ticker.clone());
                kept.push(item);
            }
            Err(rejection) => audit.record(rejection),
        }
    }

    audit.kept = kept.len();
    (kept, audit)
}
