//! Persistence of the last audited snapshot and the offline fallback chain.
//!
//! Load order is cache, then the bundled snapshot, then synthetic data, so a
//! started process always has something to show.

pub mod disk;
pub mod fallback;
pub mod memory;

use crate::audit::freshness::{Freshness, classify};
use crate::core::cache::BlobStore;
use crate::core::config::AppConfig;
use crate::core::market::MarketSnapshot;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use disk::DiskStore;
use fallback::{BundledSnapshot, synthetic_snapshot};
use memory::MemoryStore;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Payloads above this size are never persisted.
pub const MAX_CACHE_BYTES: usize = 512_000;

pub const SNAPSHOT_KEY: &str = "market_data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Network,
    Cache,
    Bundled,
    Synthetic,
}

impl Display for SnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SnapshotSource::Network => "live data",
                SnapshotSource::Cache => "cached data",
                SnapshotSource::Bundled => "bundled data",
                SnapshotSource::Synthetic => "offline data",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    pub snapshot: MarketSnapshot,
    pub source: SnapshotSource,
    pub freshness: Freshness,
}

impl LoadedSnapshot {
    /// Bundled and synthetic data are always shown as stale.
    pub fn is_stale(&self) -> bool {
        match self.source {
            SnapshotSource::Network | SnapshotSource::Cache => self.freshness != Freshness::Fresh,
            SnapshotSource::Bundled | SnapshotSource::Synthetic => true,
        }
    }
}

pub struct SnapshotCache {
    store: Arc<dyn BlobStore>,
    bundled: BundledSnapshot,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn BlobStore>, bundled: BundledSnapshot) -> Self {
        Self { store, bundled }
    }

    /// Opens the on-disk cache under the data path, falling back to memory.
    pub fn open(config: &AppConfig) -> Self {
        let bundled = BundledSnapshot::from_config(config.bundled_snapshot.as_deref());
        let disk = config
            .default_data_path()
            .and_then(|path| DiskStore::open(&path.join("cache")));

        let store: Arc<dyn BlobStore> = match disk {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Persistent cache unavailable, using memory");
                Arc::new(MemoryStore::new())
            }
        };
        Self::new(store, bundled)
    }

    /// Persists `raw` verbatim unless it exceeds [`MAX_CACHE_BYTES`].
    /// Returns whether the payload was written.
    pub fn save(&self, raw: &[u8]) -> bool {
        if raw.len() > MAX_CACHE_BYTES {
            debug!(bytes = raw.len(), "Snapshot too large to cache");
            return false;
        }
        match self.store.put(SNAPSHOT_KEY, raw) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist snapshot");
                false
            }
        }
    }

    /// Returns the best available snapshot, never failing.
    pub fn load(&self, now: DateTime<Utc>) -> LoadedSnapshot {
        match self.load_cached(now) {
            Ok(Some(loaded)) => return loaded,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cached snapshot unusable"),
        }

        match self.bundled.load() {
            Ok(snapshot) => {
                info!("Using bundled snapshot");
                let freshness = classify(&snapshot.last_update, now);
                return LoadedSnapshot {
                    snapshot,
                    source: SnapshotSource::Bundled,
                    freshness,
                };
            }
            Err(e) => warn!(error = %e, "Bundled snapshot unusable"),
        }

        warn!("Using synthetic snapshot");
        let snapshot = synthetic_snapshot();
        let freshness = classify(&snapshot.last_update, now);
        LoadedSnapshot {
            snapshot,
            source: SnapshotSource::Synthetic,
            freshness,
        }
    }

    /// Cached bytes were audited when saved, so only freshness is rechecked.
    fn load_cached(&self, now: DateTime<Utc>) -> Result<Option<LoadedSnapshot>> {
        let Some(raw) = self.store.get(SNAPSHOT_KEY)? else {
            debug!("No cached snapshot");
            return Ok(None);
        };
        let snapshot =
            MarketSnapshot::from_slice(&raw).context("Failed to decode cached snapshot")?;

        let freshness = classify(&snapshot.last_update, now);
        if freshness == Freshness::Rejected {
            warn!(last_update = %snapshot.last_update, "Cached snapshot too old");
            return Ok(None);
        }

        debug!(%freshness, "Loaded cached snapshot");
        Ok(Some(LoadedSnapshot {
            snapshot,
            source: SnapshotSource::Cache,
            freshness,
        }))
    }
}
