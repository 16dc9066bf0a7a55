//! Owner of the current market snapshot.
//!
//! All writes go through [`MarketManager::refresh`] and
//! [`MarketManager::bootstrap`], which share one single-flight flag. Readers
//! take a cheap borrow of the state or subscribe to changes.

pub mod failure;
pub mod schedule;
pub mod state;

pub use failure::RefreshFailure;
pub use schedule::{RefreshSchedule, Scheduler};
pub use state::{ManagerState, UpdateAge};

use crate::audit::freshness::{Freshness, classify};
use crate::audit::{AuditStatus, audit_snapshot, parse_last_update};
use crate::core::config::AppConfig;
use crate::core::feed::MarketFeed;
use crate::core::market::MarketSnapshot;
use crate::providers::HttpMarketFeed;
use crate::store::{LoadedSnapshot, SnapshotCache, SnapshotSource};
use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

const INITIAL_STATUS: &str = "waiting for data";

struct Fetched {
    raw: Vec<u8>,
    snapshot: MarketSnapshot,
    status: AuditStatus,
    is_stale: bool,
}

pub struct MarketManager {
    feed: Arc<dyn MarketFeed>,
    cache: SnapshotCache,
    refreshing: AtomicBool,
    state: watch::Sender<ManagerState>,
    resume_threshold: TimeDelta,
}

/// Releases the single-flight flag and clears the loading flag on every exit path.
struct RefreshGuard<'a> {
    manager: &'a MarketManager,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.manager.state.send_modify(|state| state.is_loading = false);
        self.manager.refreshing.store(false, Ordering::Release);
    }
}

impl MarketManager {
    pub fn new(feed: Arc<dyn MarketFeed>, cache: SnapshotCache, resume_threshold: TimeDelta) -> Self {
        let (state, _) = watch::channel(ManagerState {
            status: INITIAL_STATUS.to_string(),
            ..ManagerState::default()
        });
        Self {
            feed,
            cache,
            refreshing: AtomicBool::new(false),
            state,
            resume_threshold,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let feed = HttpMarketFeed::from_config(&config.feed)?;
        let cache = SnapshotCache::open(config);
        Ok(Self::new(
            Arc::new(feed),
            cache,
            config.schedule.resume_threshold(),
        ))
    }

    pub fn state(&self) -> ManagerState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<MarketSnapshot> {
        self.state.borrow().snapshot.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn status(&self) -> String {
        self.state.borrow().status.clone()
    }

    pub fn is_stale(&self) -> bool {
        self.state.borrow().is_stale
    }

    pub fn time_since_update(&self, now: DateTime<Utc>) -> Option<UpdateAge> {
        self.state.borrow().time_since_update(now)
    }

    /// Receiver woken after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.state.subscribe()
    }

    fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { manager: self })
    }

    /// Publishes the best offline snapshot when nothing is loaded yet.
    /// Returns `false` if a snapshot exists or a refresh is running.
    pub fn bootstrap(&self) -> bool {
        let Some(_guard) = self.try_begin() else {
            debug!("Refresh in progress, skipping bootstrap");
            return false;
        };
        if self.state.borrow().snapshot.is_some() {
            return false;
        }

        let loaded = self.cache.load(Utc::now());
        let status = loaded.source.to_string();
        self.publish_loaded(loaded, status);
        true
    }

    /// Fetches, audits and publishes a new snapshot. Returns `false` without
    /// doing anything if another refresh is already running. Failures are
    /// reported through the state, never to the caller.
    #[instrument(name = "MarketRefresh", skip(self))]
    pub async fn refresh(&self) -> bool {
        let Some(_guard) = self.try_begin() else {
            debug!("Refresh already in progress");
            return false;
        };
        self.state.send_modify(|state| state.is_loading = true);

        match self.fetch_audited().await {
            Ok(fetched) => self.publish_fetched(fetched),
            Err(failure) => self.recover(failure),
        }
        true
    }

    async fn fetch_audited(&self) -> std::result::Result<Fetched, RefreshFailure> {
        let raw = self
            .feed
            .fetch()
            .await
            .map_err(RefreshFailure::Transport)?;
        let snapshot = MarketSnapshot::from_slice(&raw)?;

        let outcome = audit_snapshot(snapshot, Utc::now());
        let is_stale = outcome.is_stale();
        match outcome.snapshot {
            Some(snapshot) => Ok(Fetched {
                raw,
                snapshot,
                status: outcome.status,
                is_stale,
            }),
            None => Err(RefreshFailure::Rejected(outcome.status)),
        }
    }

    fn publish_fetched(&self, fetched: Fetched) {
        let Fetched {
            raw,
            snapshot,
            status,
            is_stale,
        } = fetched;

        let last_fetch = parse_last_update(&snapshot.last_update).unwrap_or_else(Utc::now);
        if !self.cache.save(&raw) {
            debug!("Snapshot not cached");
        }

        info!(%status, is_stale, "Published network snapshot");
        self.state.send_modify(|state| {
            state.snapshot = Some(snapshot);
            state.source = Some(SnapshotSource::Network);
            state.last_fetch = Some(last_fetch);
            state.status = status.to_string();
            state.is_stale = is_stale;
        });
    }

    fn recover(&self, failure: RefreshFailure) {
        warn!(error = %failure, "Refresh failed");
        let now = Utc::now();

        let has_snapshot = self.state.borrow().snapshot.is_some();
        if has_snapshot {
            self.state.send_modify(|state| {
                if let Some(snapshot) = &state.snapshot {
                    let freshness = classify(&snapshot.last_update, now);
                    let offline_source = matches!(
                        state.source,
                        Some(SnapshotSource::Bundled | SnapshotSource::Synthetic)
                    );
                    state.is_stale = offline_source || freshness != Freshness::Fresh;
                }
                state.status = format!("{failure}; showing last data");
            });
            return;
        }

        let loaded = self.cache.load(now);
        let status = format!("{failure}; using {}", loaded.source);
        self.publish_loaded(loaded, status);
    }

    fn publish_loaded(&self, loaded: LoadedSnapshot, status: String) {
        let is_stale = loaded.is_stale();
        let last_fetch = match loaded.source {
            SnapshotSource::Cache => parse_last_update(&loaded.snapshot.last_update),
            _ => None,
        };

        info!(source = %loaded.source, is_stale, "Published fallback snapshot");
        self.state.send_modify(|state| {
            state.snapshot = Some(loaded.snapshot);
            state.source = Some(loaded.source);
            if last_fetch.is_some() {
                state.last_fetch = last_fetch;
            }
            state.status = status;
            state.is_stale = is_stale;
        });
    }

    /// Whether data is old enough that a resumed consumer should refresh.
    pub fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        let state = self.state.borrow();
        let reference = state
            .snapshot
            .as_ref()
            .and_then(|snapshot| parse_last_update(&snapshot.last_update))
            .or(state.last_fetch);

        match reference {
            Some(reference) => now - reference > self.resume_threshold,
            None => true,
        }
    }

    /// Starts a background refresh if the data has aged past the resume
    /// threshold. Returns the spawned task, if any.
    pub fn check_freshness_on_resume(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.refresh_due(Utc::now()) {
            debug!("Data recent enough, no refresh on resume");
            return None;
        }

        info!("Data aged while paused, refreshing");
        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            manager.refresh().await;
        }))
    }
}
