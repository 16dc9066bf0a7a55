//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod feed;
pub mod log;
pub mod market;

// Re-export main types for cleaner imports
pub use cache::BlobStore;
pub use feed::MarketFeed;
pub use market::{Category, MarketItem, MarketSnapshot};
