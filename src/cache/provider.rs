use std::sync::Arc;

use crate::cache::bounded::BoundedCache;
use crate::cache::manager::QueryLinks;
use crate::cache::store::{Cache, UnboundedCache};
use crate::config::CacheConfig;
use crate::data::CachedData;
use crate::error::Result;

/// Supplier of the two underlying cache instances used by the engine
///
/// Implementations own the storage policy: the table index is expected not
/// to expire (dropping an index entry silently widens the set of stale
/// results), while the per-query stores are expected to be bounded so the
/// cache cannot mirror the whole data set.
///
/// A provider is constructed by the caller and injected into one
/// [`CacheManager`](crate::CacheManager); there is no process-wide registry.
pub trait CacheProvider: Send + Sync {
    /// Produce the table index cache
    fn table_index(&self) -> Result<Arc<dyn Cache<QueryLinks>>>;

    /// Produce the result store for one query fingerprint
    ///
    /// Called at most once per fingerprint for the lifetime of the owning
    /// manager.
    fn fetch_by_query(&self, query: &str) -> Result<Arc<dyn Cache<Arc<CachedData>>>>;
}

/// Default cache provider backed by in-process stores
///
/// Hands out an unbounded table index and bounded, optionally expiring
/// per-query stores, all configured through a [`CacheConfig`].
pub struct DefaultCacheProvider {
    config: CacheConfig,
}

impl DefaultCacheProvider {
    /// Create a provider from a configuration
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// The configuration this provider hands out caches for
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl Default for DefaultCacheProvider {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl CacheProvider for DefaultCacheProvider {
    fn table_index(&self) -> Result<Arc<dyn Cache<QueryLinks>>> {
        Ok(Arc::new(UnboundedCache::new()))
    }

    fn fetch_by_query(&self, _query: &str) -> Result<Arc<dyn Cache<Arc<CachedData>>>> {
        let cache = BoundedCache::new(self.config.max_entries_per_query, self.config.ttl)
            .with_max_value_size(self.config.max_result_size.as_u64(), |data: &Arc<CachedData>| {
                data.estimated_size()
            })
            .with_collect_metrics(self.config.collect_metrics);
        Ok(Arc::new(cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_query_caches_are_distinct() {
        let provider = DefaultCacheProvider::default();
        let a = provider.fetch_by_query("SELECT 1").unwrap();
        let b = provider.fetch_by_query("SELECT 2").unwrap();

        let data = Arc::new(CachedData::new(vec![], vec![], vec![]));
        a.put("[]".to_string(), Arc::clone(&data));
        assert!(a.contains("[]"));
        assert!(!b.contains("[]"));
    }

    #[test]
    fn test_table_index_is_unbounded() {
        let provider = DefaultCacheProvider::new(CacheConfig::default().with_max_entries_per_query(1));
        let index = provider.table_index().unwrap();

        for i in 0..100 {
            index.put(format!("table{}", i), crate::cache::manager::QueryLinks::default());
        }
        for i in 0..100 {
            assert!(index.contains(&format!("table{}", i)));
        }
    }
}
