//! Cache throughput benchmark
//!
//! Measures store, hit and invalidation throughput of the cache manager
//! under a read-heavy workload, single-threaded and with worker threads
//! sharing one manager.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use result_cache::{CacheConfig, CacheManager, CachedData, ColumnInfo, DefaultCacheProvider, Value};

/// Benchmark configuration
struct BenchmarkConfig {
    /// Number of distinct query fingerprints
    query_count: usize,

    /// Number of parameter signatures per query
    params_per_query: usize,

    /// Number of rows per cached result
    rows_per_result: usize,

    /// Number of lookup operations to run
    lookup_count: usize,

    /// Number of worker threads in the concurrent phase
    thread_count: usize,

    /// Random seed for reproducibility
    seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            query_count: 100,
            params_per_query: 20,
            rows_per_result: 50,
            lookup_count: 200_000,
            thread_count: 8,
            seed: 42,
        }
    }
}

fn make_result(rng: &mut StdRng, rows: usize) -> Arc<CachedData> {
    let mut data = Vec::with_capacity(rows);
    for _ in 0..rows {
        data.push(vec![
            Value::Integer(rng.gen()),
            Value::Text(format!("row-{}", rng.gen::<u32>())),
            Value::Float(rng.gen()),
        ]);
    }
    Arc::new(CachedData::new(
        data,
        vec![
            ("id".to_string(), 0),
            ("name".to_string(), 1),
            ("score".to_string(), 2),
        ],
        vec![
            ColumnInfo::new(19, 0, "id", "BIGINT"),
            ColumnInfo::new(255, 0, "name", "VARCHAR"),
            ColumnInfo::new(15, 6, "score", "DOUBLE"),
        ],
    ))
}

fn query_text(i: usize) -> String {
    format!("SELECT id, name, score FROM table{} WHERE id = ?", i)
}

fn populate(manager: &CacheManager, config: &BenchmarkConfig, rng: &mut StdRng) {
    let start = Instant::now();
    let mut stored = 0usize;

    for q in 0..config.query_count {
        let query = query_text(q);
        let table = format!("table{}", q);
        for p in 0..config.params_per_query {
            let params = vec![Value::Integer(p as i64)];
            let result = make_result(rng, config.rows_per_result);
            manager
                .cache_query_result([table.as_str()], &query, &params, result)
                .expect("store failed");
            stored += 1;
        }
    }

    let elapsed = start.elapsed();
    println!(
        "populate: {} entries in {:?} ({:.0} entries/s)",
        stored,
        elapsed,
        stored as f64 / elapsed.as_secs_f64()
    );
}

fn lookups(manager: &CacheManager, config: &BenchmarkConfig, rng: &mut StdRng) {
    let start = Instant::now();
    let mut hits = 0usize;

    for _ in 0..config.lookup_count {
        let q = rng.gen_range(0..config.query_count);
        let p = rng.gen_range(0..config.params_per_query);
        let params = vec![Value::Integer(p as i64)];
        if manager
            .get_cached_data_if_present(&query_text(q), &params)
            .expect("lookup failed")
            .is_some()
        {
            hits += 1;
        }
    }

    let elapsed = start.elapsed();
    println!(
        "lookups: {} in {:?} ({:.0} lookups/s, {} hits)",
        config.lookup_count,
        elapsed,
        config.lookup_count as f64 / elapsed.as_secs_f64(),
        hits
    );
}

fn concurrent_lookups(manager: &Arc<CacheManager>, config: &BenchmarkConfig) {
    let per_thread = config.lookup_count / config.thread_count;
    let start = Instant::now();
    let mut handles = vec![];

    for t in 0..config.thread_count {
        let manager = Arc::clone(manager);
        let query_count = config.query_count;
        let params_per_query = config.params_per_query;
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(t as u64);
            for _ in 0..per_thread {
                let q = rng.gen_range(0..query_count);
                let p = rng.gen_range(0..params_per_query);
                let params = vec![Value::Integer(p as i64)];
                manager
                    .get_cached_data_if_present(&query_text(q), &params)
                    .expect("lookup failed");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let elapsed = start.elapsed();
    let total = per_thread * config.thread_count;
    println!(
        "concurrent lookups: {} across {} threads in {:?} ({:.0} lookups/s)",
        total,
        config.thread_count,
        elapsed,
        total as f64 / elapsed.as_secs_f64()
    );
}

fn invalidations(manager: &CacheManager, config: &BenchmarkConfig) {
    let start = Instant::now();
    for q in 0..config.query_count {
        manager.clear_by_table(&format!("table{}", q));
    }
    let elapsed = start.elapsed();
    println!(
        "invalidations: {} tables in {:?} ({:.0} tables/s)",
        config.query_count,
        elapsed,
        config.query_count as f64 / elapsed.as_secs_f64()
    );
}

fn main() {
    let config = BenchmarkConfig::default();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let provider = Arc::new(DefaultCacheProvider::new(
        CacheConfig::default().without_ttl(),
    ));
    let manager = Arc::new(CacheManager::new(provider).expect("provider failed"));

    println!(
        "result_cache throughput benchmark ({} queries x {} signatures, {} rows each)",
        config.query_count, config.params_per_query, config.rows_per_result
    );

    populate(&manager, &config, &mut rng);
    lookups(&manager, &config, &mut rng);
    concurrent_lookups(&manager, &config);
    invalidations(&manager, &config);
}
