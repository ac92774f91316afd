use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Minimal thread-safe key/value container
///
/// The engine only ever needs four operations from a physical store; policy
/// (bounds, expiry, persistence) lives entirely in the implementation handed
/// out by a [`CacheProvider`](crate::CacheProvider).
///
/// All operations must be race-free under concurrent callers. No ordering is
/// guaranteed between concurrent `put` and `get` beyond last-write-wins
/// visibility.
pub trait Cache<V: Clone + Send + Sync>: Send + Sync {
    /// Store a value under a key, overwriting any previous value
    ///
    /// Returns the value that was stored.
    fn put(&self, key: String, value: V) -> V;

    /// Get the value stored under a key
    fn get(&self, key: &str) -> Option<V>;

    /// Empty the whole container
    fn clear(&self);

    /// Check whether a key is present
    fn contains(&self, key: &str) -> bool;
}

/// An unbounded cache backed by a hash map
///
/// Entries never expire and are only removed by `clear`. Used for the table
/// index, which must not silently drop invalidation links.
pub struct UnboundedCache<V> {
    entries: RwLock<FxHashMap<String, V>>,
}

impl<V> UnboundedCache<V> {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V> Default for UnboundedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for UnboundedCache<V> {
    fn put(&self, key: String, value: V) -> V {
        self.entries.write().insert(key, value.clone());
        value
    }

    fn get(&self, key: &str) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let cache = UnboundedCache::new();
        cache.put("k".to_string(), 1);
        assert_eq!(cache.get("k"), Some(1));

        // Overwrite semantics
        cache.put("k".to_string(), 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = UnboundedCache::new();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_contains() {
        let cache = UnboundedCache::new();
        assert!(!cache.contains("k"));
        cache.put("k".to_string(), 7);
        assert!(cache.contains("k"));
    }

    #[test]
    fn test_concurrent_put_get() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(UnboundedCache::new());
        let mut handles = vec![];
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    cache.put(format!("k{}-{}", i, j), j);
                    assert_eq!(cache.get(&format!("k{}-{}", i, j)), Some(j));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
