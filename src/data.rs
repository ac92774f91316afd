use std::sync::Arc;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::replay::ReplayCursor;
use crate::value::Value;

/// A single captured row
pub type Row = Vec<Value>;

/// Metadata describing one column of a cached result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column precision as reported by the source
    pub precision: u32,

    /// Column scale as reported by the source
    pub scale: i32,

    /// Display label of the column
    pub label: String,

    /// Source-specific type name of the column
    pub type_name: String,
}

impl ColumnInfo {
    /// Create a new column descriptor
    pub fn new(
        precision: u32,
        scale: i32,
        label: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            precision,
            scale,
            label: label.into(),
            type_name: type_name.into(),
        }
    }
}

/// A fully materialized query result
///
/// Holds the captured rows together with the name-to-ordinal field map and
/// the column metadata list. Immutable once built: a `CachedData` is
/// assembled exactly once, when a capture cursor is closed, and is shared
/// between the cache and any number of replay cursors through an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData {
    /// Captured rows in source order
    rows: Vec<Row>,

    /// Column name to zero-based ordinal
    fields: FxHashMap<String, usize>,

    /// Column metadata, indexed by ordinal
    columns: Vec<ColumnInfo>,
}

impl CachedData {
    /// Assemble a materialized result from captured parts
    ///
    /// `fields` maps each column name to its zero-based ordinal.
    pub fn new(
        rows: Vec<Row>,
        fields: impl IntoIterator<Item = (String, usize)>,
        columns: Vec<ColumnInfo>,
    ) -> Self {
        Self {
            rows,
            fields: fields.into_iter().collect(),
            columns,
        }
    }

    /// Number of captured rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns in the result
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a column name to its zero-based ordinal
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.fields.get(name).copied()
    }

    /// Metadata for the column at the given ordinal
    pub fn column(&self, ordinal: usize) -> Option<&ColumnInfo> {
        self.columns.get(ordinal)
    }

    /// Metadata for all columns, in ordinal order
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// The row at the given index, if within bounds
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Create a replay cursor over this result
    pub fn replay(self: &Arc<Self>) -> ReplayCursor {
        ReplayCursor::new(Arc::clone(self))
    }

    /// Estimate the in-memory size of this result in bytes
    ///
    /// Used by bounded stores to reject results too large to cache.
    pub fn estimated_size(&self) -> u64 {
        let mut size = std::mem::size_of::<Self>();

        for (name, _) in &self.fields {
            size += std::mem::size_of::<String>() + name.len() + std::mem::size_of::<usize>();
        }

        for column in &self.columns {
            size += std::mem::size_of::<ColumnInfo>();
            size += column.label.len() + column.type_name.len();
        }

        for row in &self.rows {
            size += std::mem::size_of::<Row>();
            for value in row {
                size += estimate_value_size(value);
            }
        }

        size as u64
    }
}

/// Estimate the size of a single cell value in bytes
fn estimate_value_size(value: &Value) -> usize {
    let base = std::mem::size_of::<Value>();
    match value {
        Value::Text(s) => base + s.len(),
        Value::Bytes(b) => base + b.len(),
        _ => base,
    }
}
