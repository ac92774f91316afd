use std::time::Duration;
use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

/// Result cache configuration
///
/// Controls the policy of the caches handed out by the default provider.
/// The table index is always unbounded; the per-query stores are bounded
/// and may expire entries, so a hot query set cannot mirror the whole
/// data set in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries in each per-query store
    pub max_entries_per_query: usize,

    /// Time-to-live for per-query entries; `None` disables expiry
    pub ttl: Option<Duration>,

    /// Results whose estimated size exceeds this are not cached
    pub max_result_size: ByteSize,

    /// Whether to report hit/miss/store counters through the metrics facade
    pub collect_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries_per_query: 1024,
            ttl: Some(Duration::from_secs(300)),
            max_result_size: ByteSize::mib(16),
            collect_metrics: false,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries per query store
    pub fn with_max_entries_per_query(mut self, max_entries: usize) -> Self {
        self.max_entries_per_query = max_entries;
        self
    }

    /// Set the time-to-live for per-query entries
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Disable time-based expiry of per-query entries
    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Set the maximum size of a single cacheable result
    pub fn with_max_result_size(mut self, max_result_size: ByteSize) -> Self {
        self.max_result_size = max_result_size;
        self
    }

    /// Set whether to collect metrics
    pub fn with_collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// Create a development configuration with small stores and fast expiry
    pub fn development() -> Self {
        Self {
            max_entries_per_query: 64,
            ttl: Some(Duration::from_secs(30)),
            max_result_size: ByteSize::mib(1),
            collect_metrics: true,
        }
    }

    /// Create a production configuration with larger stores
    pub fn production() -> Self {
        Self {
            max_entries_per_query: 4096,
            ttl: Some(Duration::from_secs(600)),
            max_result_size: ByteSize::mib(64),
            collect_metrics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = CacheConfig::new()
            .with_max_entries_per_query(8)
            .with_ttl(Duration::from_secs(1))
            .with_max_result_size(ByteSize::kib(512));
        assert_eq!(config.max_entries_per_query, 8);
        assert_eq!(config.ttl, Some(Duration::from_secs(1)));
        assert_eq!(config.max_result_size, ByteSize::kib(512));
    }

    #[test]
    fn test_without_ttl() {
        let config = CacheConfig::default().without_ttl();
        assert!(config.ttl.is_none());
    }
}
