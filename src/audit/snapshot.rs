//! Whole-snapshot accept/reject decision.

use super::freshness::{Freshness, classify};
use super::items::{ItemAudit, audit_items};
use super::rates::{RateAudit, RateRejection, audit_rates};
use crate::core::market::{Category, MarketSnapshot};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Fewest non-empty categories (after item filtering) for a usable snapshot.
pub const MIN_POPULATED_CATEGORIES: usize = 3;

/// Human-readable outcome that accompanies every audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Verified,
    Stale,
    TooOld,
    Incomplete { categories: usize },
    RatesRejected(RateRejection),
}

impl Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Verified => write!(f, "data verified"),
            AuditStatus::Stale => write!(f, "stale (not from today)"),
            AuditStatus::TooOld => write!(f, "data too old"),
            AuditStatus::Incomplete { categories } => {
                write!(f, "incomplete data ({categories} categories)")
            }
            AuditStatus::RatesRejected(rejection) => write!(f, "rates rejected: {rejection}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub freshness: Freshness,
    pub items: Vec<ItemAudit>,
    /// `None` when the snapshot was rejected before rates were looked at.
    pub rates: Option<RateAudit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    /// The filtered snapshot, or `None` on hard rejection.
    pub snapshot: Option<MarketSnapshot>,
    pub status: AuditStatus,
    pub report: AuditReport,
}

impl AuditOutcome {
    fn rejected(status: AuditStatus, report: AuditReport) -> Self {
        Self {
            snapshot: None,
            status,
            report,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Accepted but not from today.
    pub fn is_stale(&self) -> bool {
        self.is_accepted() && self.report.freshness == Freshness::Stale
    }
}

fn log_publisher_audit(snapshot: &MarketSnapshot) {
    if let Some(audit) = &snapshot.exchanger_audit {
        if !audit.fetch_failed.is_empty() {
            warn!(currencies = ?audit.fetch_failed, "Publisher failed to fetch rates");
        }
        if !audit.bounds_rejected.is_empty() {
            let codes: Vec<&str> = audit
                .bounds_rejected
                .iter()
                .map(|r| r.code.as_str())
                .collect();
            warn!(currencies = ?codes, "Publisher rejected out-of-bounds rates");
        }
    }
    if let Some(total) = snapshot.total_items {
        if total != snapshot.item_count() {
            debug!(
                declared = total,
                received = snapshot.item_count(),
                "Item count differs from publisher total"
            );
        }
    }
}

/// Runs freshness, item, completeness and rate checks in that order.
pub fn audit_snapshot(snapshot: MarketSnapshot, now: DateTime<Utc>) -> AuditOutcome {
    log_publisher_audit(&snapshot);

    let freshness = classify(&snapshot.last_update, now);
    let mut report = AuditReport {
        freshness,
        items: Vec::with_capacity(Category::ALL.len()),
        rates: None,
    };

    if freshness == Freshness::Rejected {
        warn!(last_update = %snapshot.last_update, "Snapshot rejected: too old or unparseable");
        return AuditOutcome::rejected(AuditStatus::TooOld, report);
    }
    let mut status = if freshness == Freshness::Stale {
        AuditStatus::Stale
    } else {
        AuditStatus::Verified
    };

    let mut audited = snapshot;
    for category in Category::ALL {
        let items = std::mem::take(audited.items_mut(category));
        let (kept, item_audit) = audit_items(category, items);
        debug!(audit = %item_audit, "Audited category");
        *audited.items_mut(category) = kept;
        report.items.push(item_audit);
    }

    let populated = audited.populated_categories();
    if populated < MIN_POPULATED_CATEGORIES {
        warn!(categories = populated, "Snapshot rejected: incomplete data");
        return AuditOutcome::rejected(AuditStatus::Incomplete { categories: populated }, report);
    }

    let rate_audit = audit_rates(std::mem::take(&mut audited.rates));
    if let Some(rejection) = rate_audit.rejection {
        warn!(reason = %rejection, "Exchange rates rejected");
        status = AuditStatus::RatesRejected(rejection);
    }
    if !rate_audit.out_of_bounds.is_empty() {
        warn!(currencies = ?rate_audit.out_of_bounds, "Dropped out-of-bounds rates");
    }
    if !rate_audit.missing_majors.is_empty() {
        warn!(currencies = ?rate_audit.missing_majors, "Major currencies missing from rates");
    }
    audited.rates = rate_audit.rates.clone();
    report.rates = Some(rate_audit);

    info!(
        %status,
        categories = populated,
        items = audited.item_count(),
        rates = audited.rates.len(),
        "Snapshot accepted"
    );

    AuditOutcome {
        snapshot: Some(audited),
        status,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::MarketItem;
    use crate::test_support::{item, snapshot_at, valid_rates};
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_clean_snapshot_is_verified() {
        let snapshot = snapshot_at(now() - TimeDelta::hours(2));
        let outcome = audit_snapshot(snapshot.clone(), now());

        assert!(outcome.is_accepted());
        assert!(!outcome.is_stale());
        assert_eq!(outcome.status, AuditStatus::Verified);
        assert_eq!(outcome.status.to_string(), "data verified");
        assert_eq!(outcome.snapshot, Some(snapshot));
        assert_eq!(outcome.report.items.len(), 5);
    }

    #[test]
    fn test_invalid_currency_item_is_filtered() {
        let mut snapshot = snapshot_at(now() - TimeDelta::hours(1));
        snapshot.currencies = vec![item("USDMAD=X", -5.0, 0.1), item("EURUSD=X", 10.0, 0.2)];
        snapshot.rates = valid_rates(29);

        let outcome = audit_snapshot(snapshot, now());
        let audited = outcome.snapshot.expect("Expected accepted snapshot");
        assert_eq!(audited.currencies.len(), 1);
        assert_eq!(audited.currencies[0].price, 10.0);
        assert_eq!(audited.rates.len(), 29);
        assert_eq!(outcome.status.to_string(), "data verified");
    }

    #[test]
    fn test_too_old_snapshot_is_rejected() {
        let snapshot = snapshot_at(now() - TimeDelta::hours(50));
        let outcome = audit_snapshot(snapshot, now());

        assert!(!outcome.is_accepted());
        assert_eq!(outcome.status, AuditStatus::TooOld);
        assert_eq!(outcome.status.to_string(), "data too old");
        assert!(outcome.report.items.is_empty());
    }

    #[test]
    fn test_unparseable_timestamp_is_rejected() {
        let mut snapshot = snapshot_at(now());
        snapshot.last_update = "soon".to_string();
        assert_eq!(audit_snapshot(snapshot, now()).status, AuditStatus::TooOld);
    }

    #[test]
    fn test_stale_snapshot_is_accepted_with_warning() {
        let snapshot = snapshot_at(now() - TimeDelta::hours(30));
        let outcome = audit_snapshot(snapshot, now());

        assert!(outcome.is_accepted());
        assert!(outcome.is_stale());
        assert_eq!(outcome.status.to_string(), "stale (not from today)");
    }

    #[test]
    fn test_fewer_than_three_categories_is_rejected() {
        let mut snapshot = snapshot_at(now());
        snapshot.energy.clear();
        snapshot.metals = vec![item("GC=F", -1.0, 0.0)];
        snapshot.agriculture = vec![item("KC=F", 300.0, 75.0)];

        let outcome = audit_snapshot(snapshot, now());
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.status, AuditStatus::Incomplete { categories: 2 });
        assert_eq!(outcome.status.to_string(), "incomplete data (2 categories)");
        assert!(outcome.report.rates.is_none());
    }

    #[test]
    fn test_exactly_three_categories_is_accepted() {
        let mut snapshot = snapshot_at(now());
        snapshot.energy.clear();
        snapshot.metals.clear();

        let outcome = audit_snapshot(snapshot, now());
        assert!(outcome.is_accepted());
        assert_eq!(outcome.snapshot.unwrap().populated_categories(), 3);
    }

    #[test]
    fn test_incomplete_rejected_even_when_fresh_and_rates_valid() {
        let mut snapshot = snapshot_at(now());
        snapshot.currencies.clear();
        snapshot.energy.clear();
        snapshot.metals.clear();
        assert_eq!(
            audit_snapshot(snapshot, now()).status,
            AuditStatus::Incomplete { categories: 2 }
        );
    }

    #[test]
    fn test_rate_failure_keeps_snapshot_and_sets_status() {
        let mut snapshot = snapshot_at(now());
        snapshot.rates.insert("USD".to_string(), 2.0);

        let outcome = audit_snapshot(snapshot, now());
        assert!(outcome.is_accepted());
        assert_eq!(
            outcome.status,
            AuditStatus::RatesRejected(RateRejection::InvalidAnchor)
        );
        assert_eq!(outcome.status.to_string(), "rates rejected: invalid anchor");
        assert!(outcome.snapshot.unwrap().rates.is_empty());
    }

    #[test]
    fn test_rate_failure_overrides_stale_status_but_not_flag() {
        let mut snapshot = snapshot_at(now() - TimeDelta::hours(26));
        snapshot.rates = valid_rates(4);

        let outcome = audit_snapshot(snapshot, now());
        assert!(outcome.is_stale());
        assert_eq!(
            outcome.status.to_string(),
            "rates rejected: insufficient currencies (4)"
        );
    }

    #[test]
    fn test_preserves_order_and_metadata() {
        let mut snapshot = snapshot_at(now());
        snapshot.total_items = Some(99);
        snapshot.indices = vec![
            item("^N225", 38000.0, 0.5),
            item("^GSPC", 5700.0, 0.1),
            item("^N225", 1.0, 0.0),
        ];

        let audited = audit_snapshot(snapshot.clone(), now()).snapshot.unwrap();
        let tickers: Vec<&str> = audited.indices.iter().map(|i: &MarketItem| i.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["^N225", "^GSPC"]);
        assert_eq!(audited.total_items, Some(99));
        assert_eq!(audited.last_update, snapshot.last_update);
    }
}
