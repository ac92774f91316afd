use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use lru::LruCache as Lru;
use parking_lot::{Mutex, RwLock};

use crate::cache::store::Cache;

/// Entry stored in a bounded cache
struct TimedEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> TimedEntry<V> {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.stored_at.elapsed() > ttl,
            None => false,
        }
    }
}

/// A bounded cache with LRU eviction and optional time-based expiry
///
/// Used for the per-query stores so that a long-running process cannot end
/// up mirroring the whole data set in memory. Expired entries are treated
/// as absent and dropped when touched.
pub struct BoundedCache<V> {
    /// Cache entries, most recently used first
    entries: Mutex<Lru<String, TimedEntry<V>>>,

    /// Time-to-live for entries; `None` disables expiry
    ttl: Option<Duration>,

    /// Values whose estimated size exceeds this are not stored
    max_value_size: Option<u64>,

    /// Size estimator for the value type
    sizer: Option<fn(&V) -> u64>,

    /// Whether to report hit/miss counters through the metrics facade
    collect_metrics: bool,

    /// Cache hit count
    hits: RwLock<u64>,

    /// Cache miss count
    misses: RwLock<u64>,
}

impl<V> BoundedCache<V> {
    /// Create a new bounded cache with the given capacity and expiry policy
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Lru::new(capacity)),
            ttl,
            max_value_size: None,
            sizer: None,
            collect_metrics: false,
            hits: RwLock::new(0),
            misses: RwLock::new(0),
        }
    }

    /// Reject values larger than `max_size` as estimated by `sizer`
    pub fn with_max_value_size(mut self, max_size: u64, sizer: fn(&V) -> u64) -> Self {
        self.max_value_size = Some(max_size);
        self.sizer = Some(sizer);
        self
    }

    /// Set whether to report hit/miss counters through the metrics facade
    pub fn with_collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// Get the number of live entries in the cache
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Get the cache hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    fn record_hit(&self) {
        *self.hits.write() += 1;
        if self.collect_metrics {
            metrics::counter!("result_cache_store_hits_total", 1);
        }
    }

    fn record_miss(&self) {
        *self.misses.write() += 1;
        if self.collect_metrics {
            metrics::counter!("result_cache_store_misses_total", 1);
        }
    }
}

impl<V: Clone + Send + Sync> Cache<V> for BoundedCache<V> {
    fn put(&self, key: String, value: V) -> V {
        if let (Some(max_size), Some(sizer)) = (self.max_value_size, self.sizer) {
            if sizer(&value) > max_size {
                // Oversized results are served but never stored
                return value;
            }
        }

        let entry = TimedEntry {
            value: value.clone(),
            stored_at: Instant::now(),
        };
        self.entries.lock().push(key, entry);
        value
    }

    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(self.ttl) => {
                entries.pop(key);
                self.record_miss();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.record_hit();
                Some(value)
            }
            None => {
                self.record_miss();
                None
            }
        }
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock();
        match entries.peek(key) {
            Some(entry) => !entry.is_expired(self.ttl),
            None => false,
        }
    }
}
