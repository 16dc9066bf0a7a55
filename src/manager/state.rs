use crate::core::market::MarketSnapshot;
use crate::store::SnapshotSource;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Display;

/// Everything a consumer can observe about the current market data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    pub snapshot: Option<MarketSnapshot>,
    pub source: Option<SnapshotSource>,
    pub is_loading: bool,
    pub last_fetch: Option<DateTime<Utc>>,
    pub status: String,
    pub is_stale: bool,
}

impl ManagerState {
    pub fn time_since_update(&self, now: DateTime<Utc>) -> Option<UpdateAge> {
        self.last_fetch
            .map(|fetched| UpdateAge::from_elapsed(now - fetched))
    }
}

/// Coarse age of the data, as shown next to the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAge {
    JustNow,
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl UpdateAge {
    /// Negative durations (clock skew) count as just now.
    pub fn from_elapsed(elapsed: TimeDelta) -> Self {
        if elapsed < TimeDelta::minutes(1) {
            UpdateAge::JustNow
        } else if elapsed < TimeDelta::hours(1) {
            UpdateAge::Minutes(elapsed.num_minutes())
        } else if elapsed < TimeDelta::days(1) {
            UpdateAge::Hours(elapsed.num_hours())
        } else {
            UpdateAge::Days(elapsed.num_days())
        }
    }
}

impl Display for UpdateAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateAge::JustNow => write!(f, "just now"),
            UpdateAge::Minutes(n) => write!(f, "{n} min ago"),
            UpdateAge::Hours(n) => write!(f, "{n} h ago"),
            UpdateAge::Days(n) => write!(f, "{n} d ago"),
        }
    }
}
