use crate::data::ColumnInfo;
use crate::error::{CacheError, Result};
use crate::value::Value;

/// The capability surface shared by capture and replay cursors
///
/// Deliberately narrow: forward iteration, typed column access and column
/// metadata. Scrolling, row mutation and batch operations are not part of
/// the contract at all, so a caller cannot even express them; the one
/// operation a generic caller might probe for, rewinding, is rejected
/// explicitly instead of being silently ignored.
pub trait ResultCursor {
    /// Advance to the next row
    ///
    /// Returns false once the cursor is exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Read the value of the column at the given zero-based ordinal
    fn get(&mut self, ordinal: usize) -> Result<Value>;

    /// Check whether the last value read from this row was NULL
    fn was_null(&self) -> Result<bool>;

    /// Number of columns in the result
    fn column_count(&self) -> usize;

    /// Metadata for the column at the given ordinal
    fn column_info(&self, ordinal: usize) -> Result<&ColumnInfo>;

    /// Resolve a column name to its zero-based ordinal
    fn find_column(&self, name: &str) -> Result<usize>;

    /// Reposition the cursor before the first row
    ///
    /// Both cursors are forward-only; this always fails with
    /// [`CacheError::Unsupported`].
    fn rewind(&mut self) -> Result<()> {
        Err(CacheError::Unsupported("rewind: cursors are forward-only"))
    }

    /// Read the value of a column by name
    fn get_by_name(&mut self, name: &str) -> Result<Value> {
        let ordinal = self.find_column(name)?;
        self.get(ordinal)
    }

    /// Read a text column; NULL becomes `None`
    fn get_str(&mut self, ordinal: usize) -> Result<Option<String>> {
        match self.get(ordinal)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s)),
            other => Err(mismatch(ordinal, "text", &other)),
        }
    }

    /// Read an integer column; NULL becomes `None`
    fn get_i64(&mut self, ordinal: usize) -> Result<Option<i64>> {
        match self.get(ordinal)? {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(i)),
            other => Err(mismatch(ordinal, "integer", &other)),
        }
    }

    /// Read a floating-point column; NULL becomes `None`
    fn get_f64(&mut self, ordinal: usize) -> Result<Option<f64>> {
        match self.get(ordinal)? {
            Value::Null => Ok(None),
            Value::Float(f) => Ok(Some(f)),
            other => Err(mismatch(ordinal, "float", &other)),
        }
    }

    /// Read a boolean column; NULL becomes `None`
    fn get_bool(&mut self, ordinal: usize) -> Result<Option<bool>> {
        match self.get(ordinal)? {
            Value::Null => Ok(None),
            Value::Boolean(b) => Ok(Some(b)),
            other => Err(mismatch(ordinal, "boolean", &other)),
        }
    }

    /// Read a binary column; NULL becomes `None`
    fn get_bytes(&mut self, ordinal: usize) -> Result<Option<Vec<u8>>> {
        match self.get(ordinal)? {
            Value::Null => Ok(None),
            Value::Bytes(b) => Ok(Some(b)),
            other => Err(mismatch(ordinal, "bytes", &other)),
        }
    }

    /// Read a temporal column as epoch milliseconds; NULL becomes `None`
    fn get_timestamp(&mut self, ordinal: usize) -> Result<Option<i64>> {
        match self.get(ordinal)? {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(ts)),
            other => Err(mismatch(ordinal, "timestamp", &other)),
        }
    }
}

fn mismatch(column: usize, expected: &'static str, found: &Value) -> CacheError {
    CacheError::TypeMismatch {
        column,
        expected,
        found: found.kind(),
    }
}
