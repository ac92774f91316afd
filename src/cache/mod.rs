// Cache module for the result cache engine
//
// This module provides the cache SPI, the shipped store implementations,
// and the manager that ties per-query stores to the table index.

mod bounded;
mod manager;
mod provider;
mod store;

// Re-exports
pub use bounded::BoundedCache;
pub use manager::{CacheManager, LinkSet, QueryLinks};
pub use provider::{CacheProvider, DefaultCacheProvider};
pub use store::{Cache, UnboundedCache};
