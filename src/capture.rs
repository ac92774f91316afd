use std::sync::Arc;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::CacheManager;
use crate::cursor::ResultCursor;
use crate::data::{CachedData, ColumnInfo, Row};
use crate::error::{CacheError, Result};
use crate::source::RowSource;
use crate::value::Value;

/// Everything the capture cursor needs to know about the query it wraps
///
/// The referenced-table set is populated out-of-band, typically while the
/// query text is being built, and travels with the cursor so the close path
/// can index the result for invalidation.
#[derive(Debug, Clone)]
pub struct QueryInfo {
    query: String,
    parameters: Vec<Value>,
    referenced_tables: FxHashSet<String>,
}

impl QueryInfo {
    /// Describe one execution of a query
    pub fn new(query: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            query: query.into(),
            parameters,
            referenced_tables: FxHashSet::default(),
        }
    }

    /// Add the tables the query reads from
    pub fn with_tables<I, T>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.referenced_tables.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Record one referenced table
    pub fn add_referenced_table(&mut self, table: impl Into<String>) {
        self.referenced_tables.insert(table.into());
    }

    /// The query text (the cache fingerprint)
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The bound parameters of this execution
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// The tables this query reads from
    pub fn referenced_tables(&self) -> &FxHashSet<String> {
        &self.referenced_tables
    }
}

/// A cursor that records every value read from a live row source
///
/// Callers iterate it exactly as they would the live source; nothing about
/// the read path changes. On [`close`](CaptureCursor::close) the accumulated
/// rows become a [`CachedData`] and are handed to the cache manager together
/// with the referenced-table set.
///
/// Used by exactly one thread for the lifetime of one query execution; no
/// internal synchronization.
pub struct CaptureCursor<S: RowSource> {
    source: S,
    manager: Arc<CacheManager>,
    info: QueryInfo,

    fields: FxHashMap<String, usize>,
    columns: Vec<ColumnInfo>,

    /// Rows fully read through and flushed
    rows: Vec<Row>,

    /// Buffer for the row the cursor is currently positioned on
    row: Option<Row>,

    /// Ordinal of the most recently read column, for null checks
    last_read: Option<usize>,

    /// Set on any source failure; a poisoned capture never commits
    poisoned: bool,
}

impl<S: RowSource> CaptureCursor<S> {
    /// Wrap a live row source
    ///
    /// Reads the column metadata once; the field map and column-info list
    /// are immutable for the lifetime of the cursor.
    pub fn new(source: S, info: QueryInfo, manager: Arc<CacheManager>) -> Result<Self> {
        let source_columns = source.columns()?;

        let mut fields = FxHashMap::default();
        let mut columns = Vec::with_capacity(source_columns.len());
        for (ordinal, column) in source_columns.iter().enumerate() {
            fields.insert(column.name.clone(), ordinal);
            columns.push(column.info());
        }

        Ok(Self {
            source,
            manager,
            info,
            fields,
            columns,
            rows: Vec::new(),
            row: None,
            last_read: None,
            poisoned: false,
        })
    }

    /// Close the cursor and commit the captured result
    ///
    /// A still-pending row buffer is flushed, the materialized result is
    /// assembled and submitted to the cache manager under this execution's
    /// fingerprint and parameter signature. Closing after zero rows caches
    /// a legitimately empty result.
    ///
    /// If the source failed at any point, the partial capture is discarded
    /// and nothing is committed.
    pub fn close(mut self) -> Result<()> {
        let closed = self.source.close();

        if self.poisoned {
            return closed;
        }
        closed?;

        self.flush_pending();
        let data = CachedData::new(self.rows, self.fields, self.columns);
        self.manager.cache_query_result(
            &self.info.referenced_tables,
            &self.info.query,
            &self.info.parameters,
            Arc::new(data),
        )
    }

    /// The query this cursor is capturing
    pub fn info(&self) -> &QueryInfo {
        &self.info
    }

    fn flush_pending(&mut self) {
        if let Some(row) = self.row.take() {
            self.rows.push(row);
        }
        self.last_read = None;
    }
}

impl<S: RowSource> ResultCursor for CaptureCursor<S> {
    fn next(&mut self) -> Result<bool> {
        self.flush_pending();

        match self.source.next_row() {
            Ok(true) => {
                self.row = Some(vec![Value::Null; self.columns.len()]);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                self.poisoned = true;
                Err(err)
            }
        }
    }

    fn get(&mut self, ordinal: usize) -> Result<Value> {
        if ordinal >= self.columns.len() {
            return Err(CacheError::ColumnOutOfRange {
                ordinal,
                width: self.columns.len(),
            });
        }
        if self.row.is_none() {
            return Err(CacheError::NoCurrentRow);
        }

        match self.source.read(ordinal) {
            Ok(value) => {
                // Nulls land in the buffer here, at read time; there is no
                // retroactive patching keyed on a later null check.
                if let Some(row) = self.row.as_mut() {
                    row[ordinal] = value.clone();
                }
                self.last_read = Some(ordinal);
                Ok(value)
            }
            Err(err) => {
                self.poisoned = true;
                Err(err)
            }
        }
    }

    fn was_null(&self) -> Result<bool> {
        let ordinal = self.last_read.ok_or(CacheError::NoCurrentRow)?;
        let row = self.row.as_ref().ok_or(CacheError::NoCurrentRow)?;
        Ok(row[ordinal].is_null())
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_info(&self, ordinal: usize) -> Result<&ColumnInfo> {
        self.columns.get(ordinal).ok_or(CacheError::ColumnOutOfRange {
            ordinal,
            width: self.columns.len(),
        })
    }

    fn find_column(&self, name: &str) -> Result<usize> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| CacheError::UnknownColumn(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DefaultCacheProvider;
    use crate::source::SourceColumn;

    /// In-memory row source for tests; can be armed to fail mid-iteration
    struct StubSource {
        columns: Vec<SourceColumn>,
        rows: Vec<Vec<Value>>,
        position: Option<usize>,
        fail_on_row: Option<usize>,
        closed: bool,
    }

    impl StubSource {
        fn new(rows: Vec<Vec<Value>>) -> Self {
            Self {
                columns: vec![
                    SourceColumn::new("id", "BIGINT").with_precision(10, 0),
                    SourceColumn::new("name", "VARCHAR"),
                ],
                rows,
                position: None,
                fail_on_row: None,
                closed: false,
            }
        }

        fn failing_at(mut self, row: usize) -> Self {
            self.fail_on_row = Some(row);
            self
        }
    }

    impl RowSource for StubSource {
        fn columns(&self) -> Result<Vec<SourceColumn>> {
            Ok(self.columns.clone())
        }

        fn next_row(&mut self) -> Result<bool> {
            let next = self.position.map_or(0, |p| p + 1);
            if Some(next) == self.fail_on_row {
                return Err(CacheError::row_source(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )));
            }
            if next < self.rows.len() {
                self.position = Some(next);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        fn read(&mut self, ordinal: usize) -> Result<Value> {
            let position = self.position.ok_or(CacheError::NoCurrentRow)?;
            Ok(self.rows[position][ordinal].clone())
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn manager() -> Arc<CacheManager> {
        Arc::new(CacheManager::new(Arc::new(DefaultCacheProvider::default())).unwrap())
    }

    fn capture(source: StubSource, manager: &Arc<CacheManager>) -> CaptureCursor<StubSource> {
        let info = QueryInfo::new("SELECT id, name FROM users", vec![]).with_tables(["users"]);
        CaptureCursor::new(source, info, Arc::clone(manager)).unwrap()
    }

    #[test]
    fn test_capture_and_commit() {
        let manager = manager();
        let source = StubSource::new(vec![
            vec![Value::Integer(1), Value::Text("alice".to_string())],
            vec![Value::Integer(2), Value::Null],
        ]);
        let mut cursor = capture(source, &manager);

        while cursor.next().unwrap() {
            for ordinal in 0..cursor.column_count() {
                cursor.get(ordinal).unwrap();
            }
        }
        cursor.close().unwrap();

        let data = manager
            .get_cached_data_if_present("SELECT id, name FROM users", &[])
            .unwrap()
            .unwrap();
        assert_eq!(data.row_count(), 2);
        assert_eq!(data.row(0).unwrap()[1], Value::Text("alice".to_string()));
        assert!(data.row(1).unwrap()[1].is_null());
    }

    #[test]
    fn test_null_recorded_at_read_time() {
        let manager = manager();
        let source = StubSource::new(vec![vec![Value::Integer(1), Value::Null]]);
        let mut cursor = capture(source, &manager);

        cursor.next().unwrap();
        assert_eq!(cursor.get(1).unwrap(), Value::Null);
        // Null is observable without any further accessor call
        assert!(cursor.was_null().unwrap());

        cursor.get(0).unwrap();
        assert!(!cursor.was_null().unwrap());
        cursor.close().unwrap();

        // The captured cell is null even though was_null was last asked
        // about a different column
        let data = manager
            .get_cached_data_if_present("SELECT id, name FROM users", &[])
            .unwrap()
            .unwrap();
        assert!(data.row(0).unwrap()[1].is_null());
    }

    #[test]
    fn test_unread_columns_capture_as_null() {
        let manager = manager();
        let source = StubSource::new(vec![vec![Value::Integer(1), Value::Text("a".to_string())]]);
        let mut cursor = capture(source, &manager);

        cursor.next().unwrap();
        cursor.get(0).unwrap();
        cursor.close().unwrap();

        let data = manager
            .get_cached_data_if_present("SELECT id, name FROM users", &[])
            .unwrap()
            .unwrap();
        assert_eq!(data.row(0).unwrap()[0], Value::Integer(1));
        assert!(data.row(0).unwrap()[1].is_null());
    }

    #[test]
    fn test_zero_row_close_caches_empty_result() {
        let manager = manager();
        let mut cursor = capture(StubSource::new(vec![]), &manager);

        assert!(!cursor.next().unwrap());
        cursor.close().unwrap();

        let data = manager
            .get_cached_data_if_present("SELECT id, name FROM users", &[])
            .unwrap()
            .unwrap();
        assert_eq!(data.row_count(), 0);
        assert_eq!(data.ordinal("name"), Some(1));
        assert_eq!(data.column_count(), 2);
    }

    #[test]
    fn test_close_without_any_next_caches_empty_result() {
        let manager = manager();
        let cursor = capture(StubSource::new(vec![vec![Value::Integer(1), Value::Null]]), &manager);
        cursor.close().unwrap();

        let data = manager
            .get_cached_data_if_present("SELECT id, name FROM users", &[])
            .unwrap()
            .unwrap();
        assert_eq!(data.row_count(), 0);
    }

    #[test]
    fn test_failed_source_commits_nothing() {
        let manager = manager();
        let source = StubSource::new(vec![
            vec![Value::Integer(1), Value::Text("a".to_string())],
            vec![Value::Integer(2), Value::Text("b".to_string())],
        ])
        .failing_at(1);
        let mut cursor = capture(source, &manager);

        cursor.next().unwrap();
        cursor.get(0).unwrap();
        assert!(cursor.next().is_err());
        cursor.close().unwrap();

        assert!(manager
            .get_cached_data_if_present("SELECT id, name FROM users", &[])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_get_before_next_is_rejected() {
        let manager = manager();
        let mut cursor = capture(StubSource::new(vec![vec![Value::Integer(1), Value::Null]]), &manager);
        assert!(matches!(cursor.get(0), Err(CacheError::NoCurrentRow)));
    }

    #[test]
    fn test_rewind_unsupported() {
        let manager = manager();
        let mut cursor = capture(StubSource::new(vec![]), &manager);
        assert!(matches!(cursor.rewind(), Err(CacheError::Unsupported(_))));
    }

    #[test]
    fn test_metadata_accessors() {
        let manager = manager();
        let cursor = capture(StubSource::new(vec![]), &manager);
        assert_eq!(cursor.column_count(), 2);
        assert_eq!(cursor.find_column("name").unwrap(), 1);
        assert!(cursor.find_column("missing").is_err());
        assert_eq!(cursor.column_info(0).unwrap().precision, 10);
        assert!(cursor.column_info(9).is_err());
    }
}
