use std::fmt::Write as _;
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::provider::CacheProvider;
use crate::cache::store::Cache;
use crate::data::CachedData;
use crate::error::Result;
use crate::value::Value;

/// A concurrency-safe set of query fingerprints linked to one table
///
/// Insertion is idempotent and safe for concurrent callers; the set only
/// grows until the owning index entry is cleared.
pub struct LinkSet {
    links: RwLock<FxHashSet<String>>,
}

impl LinkSet {
    /// Create an empty link set
    pub fn new() -> Self {
        Self {
            links: RwLock::new(FxHashSet::default()),
        }
    }

    /// Add a query fingerprint to the set
    ///
    /// Returns true if the fingerprint was not already present.
    pub fn insert(&self, query: impl Into<String>) -> bool {
        self.links.write().insert(query.into())
    }

    /// Check whether a fingerprint is linked
    pub fn contains(&self, query: &str) -> bool {
        self.links.read().contains(query)
    }

    /// Number of linked fingerprints
    pub fn len(&self) -> usize {
        self.links.read().len()
    }

    /// Check if no fingerprints are linked
    pub fn is_empty(&self) -> bool {
        self.links.read().is_empty()
    }

    /// Copy the current membership out of the set
    ///
    /// Invalidation iterates over the copy so it never holds the set lock
    /// while clearing per-query caches.
    pub fn snapshot(&self) -> Vec<String> {
        self.links.read().iter().cloned().collect()
    }
}

impl Default for LinkSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to one table's link set, as stored in the table index
pub type QueryLinks = Arc<LinkSet>;

/// The caching engine: one result store per query fingerprint plus the
/// table index used for targeted invalidation
///
/// A manager owns every per-query cache it creates (lazily, once per
/// fingerprint) and the single table index, both obtained from the injected
/// [`CacheProvider`]. All public operations are safe for concurrent callers
/// with no caller-side locking; one manager is typically shared by every
/// worker thread executing queries against one configuration.
pub struct CacheManager {
    /// Supplier of the underlying cache instances
    provider: Arc<dyn CacheProvider>,

    /// Per-fingerprint result stores, created on first reference
    queries: RwLock<FxHashMap<String, Arc<dyn Cache<Arc<CachedData>>>>>,

    /// Table name to linked query fingerprints
    table_index: Arc<dyn Cache<QueryLinks>>,

    /// Serializes creation of a table's link set
    index_lock: Mutex<()>,
}

impl CacheManager {
    /// Create a manager on top of a cache provider
    ///
    /// The table index is acquired up front; a provider failure here is a
    /// configuration error and surfaces immediately.
    pub fn new(provider: Arc<dyn CacheProvider>) -> Result<Self> {
        let table_index = provider.table_index()?;
        Ok(Self {
            provider,
            queries: RwLock::new(FxHashMap::default()),
            table_index,
            index_lock: Mutex::new(()),
        })
    }

    /// Look up the cached result for one execution of a query
    ///
    /// A miss is `Ok(None)`, never an error; the caller routes it back to
    /// normal execution. The per-query cache is created on the first
    /// reference to the fingerprint.
    pub fn get_cached_data_if_present(
        &self,
        query: &str,
        parameters: &[Value],
    ) -> Result<Option<Arc<CachedData>>> {
        let cache = self.fetch_by_query(query)?;
        let found = cache.get(&Self::join_parameters(parameters));

        match found {
            Some(_) => metrics::counter!("result_cache_hits_total", 1),
            None => metrics::counter!("result_cache_misses_total", 1),
        }

        Ok(found)
    }

    /// Store a fully materialized query result
    ///
    /// The result lands in the per-query store under the execution's
    /// parameter signature, and the fingerprint is indexed under every
    /// referenced table so the entry can be invalidated later.
    pub fn cache_query_result<I, T>(
        &self,
        referenced_tables: I,
        query: &str,
        parameters: &[Value],
        data: Arc<CachedData>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let cache = self.fetch_by_query(query)?;
        cache.put(Self::join_parameters(parameters), data);

        for table in referenced_tables {
            self.index(table.as_ref(), query);
        }

        metrics::counter!("result_cache_stores_total", 1);
        Ok(())
    }

    /// Empty the per-query cache for a fingerprint
    ///
    /// The cache is emptied, not removed, so the next execution still finds
    /// its store. A fingerprint that was never cached is a no-op; cache
    /// state is advisory and clearing an unknown key is not an error.
    pub fn clear_by_query(&self, query: &str) {
        if let Some(cache) = self.queries.read().get(query) {
            cache.clear();
        }
    }

    /// Empty every per-query cache whose fingerprint references a table
    ///
    /// An unknown table name is a no-op.
    pub fn clear_by_table(&self, table_name: &str) {
        if let Some(links) = self.table_index.get(table_name) {
            for query in links.snapshot() {
                self.clear_by_query(&query);
            }
            metrics::counter!("result_cache_invalidations_total", 1);
        }
    }

    /// Fetch the per-query cache for a fingerprint, creating it once
    ///
    /// Creation is compute-once: two threads racing on the first reference
    /// to a fingerprint must observe the identical cache instance, otherwise
    /// two competing populations could silently diverge.
    fn fetch_by_query(&self, query: &str) -> Result<Arc<dyn Cache<Arc<CachedData>>>> {
        if let Some(cache) = self.queries.read().get(query) {
            return Ok(Arc::clone(cache));
        }

        let mut queries = self.queries.write();
        if let Some(cache) = queries.get(query) {
            return Ok(Arc::clone(cache));
        }
        let cache = self.provider.fetch_by_query(query)?;
        queries.insert(query.to_string(), Arc::clone(&cache));
        Ok(cache)
    }

    /// Link a query fingerprint to a table in the index
    ///
    /// Optimistic read first; if the table has no link set yet, re-check
    /// under the index lock before creating one, since a second caller may
    /// have won the race. The critical section is exactly the creation and
    /// insertion of one set.
    fn index(&self, table_name: &str, query: &str) {
        if let Some(links) = self.table_index.get(table_name) {
            links.insert(query);
            return;
        }

        let _guard = self.index_lock.lock();
        if let Some(links) = self.table_index.get(table_name) {
            links.insert(query);
            return;
        }

        let links = LinkSet::new();
        links.insert(query);
        self.table_index.put(table_name.to_string(), Arc::new(links));
    }

    /// Canonical, order-sensitive rendering of a parameter list
    ///
    /// Identically-valued parameters in a different order produce a
    /// different signature; no semantic parameter equivalence is attempted.
    fn join_parameters(parameters: &[Value]) -> String {
        let mut signature = String::from("[");
        for (i, parameter) in parameters.iter().enumerate() {
            if i > 0 {
                signature.push_str(", ");
            }
            let _ = write!(signature, "{}", parameter);
        }
        signature.push(']');
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use crate::cache::provider::DefaultCacheProvider;
    use crate::config::CacheConfig;
    use crate::data::ColumnInfo;

    fn manager() -> CacheManager {
        CacheManager::new(Arc::new(DefaultCacheProvider::default())).unwrap()
    }

    fn result(rows: Vec<Vec<Value>>) -> Arc<CachedData> {
        Arc::new(CachedData::new(
            rows,
            vec![("id".to_string(), 0)],
            vec![ColumnInfo::new(10, 0, "id", "BIGINT")],
        ))
    }

    #[test]
    fn test_store_then_lookup() {
        let manager = manager();
        let data = result(vec![vec![Value::Integer(1)]]);

        manager
            .cache_query_result(["users"], "SELECT * FROM users", &[], Arc::clone(&data))
            .unwrap();

        let found = manager
            .get_cached_data_if_present("SELECT * FROM users", &[])
            .unwrap()
            .unwrap();
        assert_eq!(*found, *data);
    }

    #[test]
    fn test_miss_is_none() {
        let manager = manager();
        let found = manager
            .get_cached_data_if_present("SELECT * FROM absent", &[])
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_parameter_order_sensitivity() {
        let manager = manager();
        let params = [Value::Integer(1), Value::Integer(2)];
        let reversed = [Value::Integer(2), Value::Integer(1)];

        manager
            .cache_query_result(["t"], "SELECT * FROM t WHERE a = ? AND b = ?", &params, result(vec![]))
            .unwrap();

        assert!(manager
            .get_cached_data_if_present("SELECT * FROM t WHERE a = ? AND b = ?", &params)
            .unwrap()
            .is_some());
        assert!(manager
            .get_cached_data_if_present("SELECT * FROM t WHERE a = ? AND b = ?", &reversed)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_clear_by_query_unknown_is_noop() {
        let manager = manager();
        manager.clear_by_query("SELECT * FROM absent");
    }

    #[test]
    fn test_clear_by_query_does_not_create_cache() {
        let manager = manager();
        manager.clear_by_query("SELECT * FROM absent");
        assert!(manager.queries.read().is_empty());
    }

    #[test]
    fn test_clear_by_table_unknown_is_noop() {
        let manager = manager();
        manager.clear_by_table("absent_table");
    }

    #[test]
    fn test_clear_by_table_scopes_invalidation() {
        let manager = manager();
        let orders = "SELECT * FROM orders";
        let joined = "SELECT * FROM orders o JOIN customers c ON o.cid = c.id";
        let customers_only = "SELECT * FROM customers";

        manager.cache_query_result(["orders"], orders, &[], result(vec![])).unwrap();
        manager
            .cache_query_result(["orders", "customers"], joined, &[], result(vec![]))
            .unwrap();
        manager
            .cache_query_result(["customers"], customers_only, &[], result(vec![]))
            .unwrap();

        manager.clear_by_table("orders");

        assert!(manager.get_cached_data_if_present(orders, &[]).unwrap().is_none());
        assert!(manager.get_cached_data_if_present(joined, &[]).unwrap().is_none());
        assert!(manager
            .get_cached_data_if_present(customers_only, &[])
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_index_is_idempotent() {
        let manager = manager();
        manager.cache_query_result(["t"], "SELECT * FROM t", &[], result(vec![])).unwrap();
        manager.cache_query_result(["t"], "SELECT * FROM t", &[], result(vec![])).unwrap();

        let links = manager.table_index.get("t").unwrap();
        assert_eq!(links.len(), 1);
        assert!(links.contains("SELECT * FROM t"));
    }

    #[test]
    fn test_concurrent_first_index_no_lost_update() {
        let manager = Arc::new(manager());
        let mut handles = vec![];

        for _ in 0..16 {
            let manager = Arc::clone(&manager);
            handles.push(thread::spawn(move || {
                manager
                    .cache_query_result(["fresh_table"], "SELECT * FROM fresh_table", &[], {
                        Arc::new(CachedData::new(vec![], vec![("id".to_string(), 0)], vec![]))
                    })
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let links = manager.table_index.get("fresh_table").unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_concurrent_fetch_yields_one_cache_instance() {
        let manager = Arc::new(manager());
        let mut handles = vec![];

        // Each thread stores under its own signature; if two threads ever
        // observed different cache instances, one signature would be lost.
        for i in 0..16i64 {
            let manager = Arc::clone(&manager);
            handles.push(thread::spawn(move || {
                let params = [Value::Integer(i)];
                manager
                    .cache_query_result(["t"], "SELECT * FROM t WHERE id = ?", &params, {
                        Arc::new(CachedData::new(vec![], vec![("id".to_string(), 0)], vec![]))
                    })
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..16i64 {
            let params = [Value::Integer(i)];
            assert!(manager
                .get_cached_data_if_present("SELECT * FROM t WHERE id = ?", &params)
                .unwrap()
                .is_some());
        }
        assert_eq!(manager.queries.read().len(), 1);
    }

    #[test]
    fn test_join_parameters_rendering() {
        let signature = CacheManager::join_parameters(&[
            Value::Integer(1),
            Value::Text("a, b".to_string()),
            Value::Null,
        ]);
        assert_eq!(signature, "[1, \"a, b\", NULL]");
        assert_eq!(CacheManager::join_parameters(&[]), "[]");
    }
}
