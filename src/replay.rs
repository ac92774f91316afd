use std::sync::Arc;

use crate::cursor::ResultCursor;
use crate::data::{CachedData, ColumnInfo};
use crate::error::{CacheError, Result};
use crate::value::Value;

/// A cursor that serves rows from a materialized result
///
/// Never touches the live data source: every value, null flag and piece of
/// column metadata comes from the [`CachedData`] recorded at capture time.
/// Forward-only, like the capture cursor it replays.
pub struct ReplayCursor {
    data: Arc<CachedData>,

    /// Index of the next row to serve
    next_row: usize,

    /// Index of the row the cursor is positioned on
    current: Option<usize>,

    /// Ordinal of the most recently read column, for null checks
    last_read: Option<usize>,
}

impl ReplayCursor {
    /// Create a cursor over a materialized result
    pub fn new(data: Arc<CachedData>) -> Self {
        Self {
            data,
            next_row: 0,
            current: None,
            last_read: None,
        }
    }

    /// The materialized result this cursor replays
    pub fn data(&self) -> &Arc<CachedData> {
        &self.data
    }

    fn current_row(&self) -> Result<&[Value]> {
        let index = self.current.ok_or(CacheError::NoCurrentRow)?;
        self.data.row(index).ok_or(CacheError::NoCurrentRow)
    }
}

impl ResultCursor for ReplayCursor {
    fn next(&mut self) -> Result<bool> {
        self.last_read = None;
        if self.next_row >= self.data.row_count() {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(self.next_row);
        self.next_row += 1;
        Ok(true)
    }

    fn get(&mut self, ordinal: usize) -> Result<Value> {
        let row = self.current_row()?;
        let value = row
            .get(ordinal)
            .ok_or(CacheError::ColumnOutOfRange {
                ordinal,
                width: self.data.column_count(),
            })?
            .clone();
        self.last_read = Some(ordinal);
        Ok(value)
    }

    fn was_null(&self) -> Result<bool> {
        let ordinal = self.last_read.ok_or(CacheError::NoCurrentRow)?;
        let row = self.current_row()?;
        Ok(row[ordinal].is_null())
    }

    fn column_count(&self) -> usize {
        self.data.column_count()
    }

    fn column_info(&self, ordinal: usize) -> Result<&ColumnInfo> {
        self.data.column(ordinal).ok_or(CacheError::ColumnOutOfRange {
            ordinal,
            width: self.data.column_count(),
        })
    }

    fn find_column(&self, name: &str) -> Result<usize> {
        self.data
            .ordinal(name)
            .ok_or_else(|| CacheError::UnknownColumn(name.to_string()))
    }
}
