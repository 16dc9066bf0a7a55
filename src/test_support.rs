//! Shared fixtures for unit tests.

use crate::audit::rates::{BASE_CURRENCY, RATE_BOUNDS};
use crate::core::cache::BlobStore;
use crate::core::config::ScheduleConfig;
use crate::core::feed::MarketFeed;
use crate::core::market::{MarketItem, MarketSnapshot};
use crate::manager::MarketManager;
use crate::store::SnapshotCache;
use crate::store::fallback::BundledSnapshot;
use crate::store::memory::MemoryStore;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn item(ticker: &str, price: f64, trend: f64) -> MarketItem {
    MarketItem {
        ticker: ticker.to_string(),
        price,
        trend,
        name: ticker.to_string(),
        currency: None,
        unit: None,
    }
}

/// Base currency plus `count - 1` in-bounds entries.
pub fn valid_rates(count: usize) -> BTreeMap<String, f64> {
    let mut rates = BTreeMap::from([(BASE_CURRENCY.to_string(), 1.0)]);
    for (code, low, high) in RATE_BOUNDS.iter().take(count.saturating_sub(1)) {
        rates.insert(code.to_string(), (low + high) / 2.0);
    }
    rates
}

/// A snapshot that passes every audit rule when classified on the same day.
pub fn snapshot_at(published: DateTime<Utc>) -> MarketSnapshot {
    MarketSnapshot {
        last_update: published.to_rfc3339_opts(SecondsFormat::Micros, false),
        currencies: vec![item("EURUSD=X", 1.08, 0.12), item("USDJPY=X", 151.2, -0.3)],
        energy: vec![item("BZ=F", 74.1, -0.85), item("NG=F", 2.9, 3.4)],
        metals: vec![item("GC=F", 2650.0, 0.4)],
        indices: vec![item("^GSPC", 5712.3, 0.42)],
        agriculture: vec![item("KC=F", 245.5, 1.9)],
        rates: valid_rates(RATE_BOUNDS.len() + 1),
        total_items: None,
        exchanger_audit: None,
    }
}

pub fn snapshot_json(published: DateTime<Utc>) -> Vec<u8> {
    serde_json::to_vec(&snapshot_at(published)).expect("Failed to encode snapshot")
}

/// Feed that replays scripted responses, then reports itself offline.
pub struct StubFeed {
    responses: Mutex<VecDeque<Result<Vec<u8>, String>>>,
    calls: AtomicUsize,
}

impl StubFeed {
    pub fn new(responses: Vec<Result<Vec<u8>, &str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map_err(str::to_string))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketFeed for StubFeed {
    async fn fetch(&self) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("feed offline")),
        }
    }
}

pub fn memory_cache() -> (Arc<MemoryStore>, SnapshotCache) {
    let store = Arc::new(MemoryStore::new());
    let cache = SnapshotCache::new(Arc::clone(&store) as Arc<dyn BlobStore>, BundledSnapshot::Embedded);
    (store, cache)
}

/// Manager with an in-memory cache and a feed that always fails.
pub fn offline_manager() -> MarketManager {
    let (_, cache) = memory_cache();
    MarketManager::new(
        Arc::new(StubFeed::new(Vec::new())),
        cache,
        ScheduleConfig::default().resume_threshold(),
    )
}
