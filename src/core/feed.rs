//! Market data source abstraction

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetches the raw, undecoded snapshot document.
    async fn fetch(&self) -> Result<Vec<u8>>;
}
