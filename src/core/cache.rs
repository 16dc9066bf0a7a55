//! Persistent blob storage abstraction

use anyhow::Result;

/// A key-value store holding whole binary values.
///
/// Writes replace the entire value for a key; there are no partial updates.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
}
