//! # Result Cache
//!
//! Result Cache is an embedded query-result cache with table-based
//! invalidation. The first execution of an expensive query is captured row
//! by row while the caller reads it; identical executions are then served
//! from memory until data backing one of the referenced tables may have
//! changed.
//!
//! ## Features
//!
//! - Per-query result stores keyed by query text plus parameter signature
//! - Table-to-query index for targeted invalidation
//! - Capture/replay cursor pair that is transparent to the reading caller
//! - Pluggable cache provider so storage policy varies independently
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use result_cache::{
//!     CacheConfig, CacheManager, CachedData, ColumnInfo, DefaultCacheProvider,
//!     ResultCursor, Value,
//! };
//!
//! let provider = Arc::new(DefaultCacheProvider::new(CacheConfig::default()));
//! let manager = CacheManager::new(provider).unwrap();
//!
//! let query = "SELECT name FROM users WHERE id = ?";
//! let params = vec![Value::from(42i64)];
//!
//! // First execution: nothing cached yet, so the caller runs the query for
//! // real (normally through a CaptureCursor, which commits on close).
//! assert!(manager.get_cached_data_if_present(query, &params).unwrap().is_none());
//!
//! let data = Arc::new(CachedData::new(
//!     vec![vec![Value::from("alice")]],
//!     vec![("name".to_string(), 0)],
//!     vec![ColumnInfo::new(255, 0, "name", "VARCHAR")],
//! ));
//! manager.cache_query_result(["users"], query, &params, data).unwrap();
//!
//! // Second execution: replayed from memory.
//! let hit = manager.get_cached_data_if_present(query, &params).unwrap().unwrap();
//! let mut cursor = hit.replay();
//! assert!(cursor.next().unwrap());
//! assert_eq!(cursor.get_str(0).unwrap(), Some("alice".to_string()));
//!
//! // A write to "users" invalidates every query that reads from it.
//! manager.clear_by_table("users");
//! assert!(manager.get_cached_data_if_present(query, &params).unwrap().is_none());
//! ```

mod cache;
mod capture;
mod config;
mod cursor;
mod data;
mod error;
mod replay;
mod source;
mod value;

// Re-export public API
pub use capture::{CaptureCursor, QueryInfo};
pub use config::CacheConfig;
pub use cursor::ResultCursor;
pub use data::{CachedData, ColumnInfo, Row};
pub use error::{CacheError, Result};
pub use replay::ReplayCursor;
pub use source::{RowSource, SourceColumn};
pub use value::Value;

// Re-export cache API
pub use cache::{
    BoundedCache,
    Cache,
    CacheManager,
    CacheProvider,
    DefaultCacheProvider,
    LinkSet,
    QueryLinks,
    UnboundedCache,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
