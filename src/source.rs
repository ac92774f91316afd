use crate::data::ColumnInfo;
use crate::error::Result;
use crate::value::Value;

/// Metadata one live source column reports
#[derive(Debug, Clone, PartialEq)]
pub struct SourceColumn {
    /// Column name, used for name-based access
    pub name: String,

    /// Display label of the column
    pub label: String,

    /// Column precision
    pub precision: u32,

    /// Column scale
    pub scale: i32,

    /// Source-specific type name
    pub type_name: String,
}

impl SourceColumn {
    /// Create a column descriptor where the label equals the name
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            precision: 0,
            scale: 0,
            type_name: type_name.into(),
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set precision and scale
    pub fn with_precision(mut self, precision: u32, scale: i32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// The column metadata that ends up in a materialized result
    pub fn info(&self) -> ColumnInfo {
        ColumnInfo::new(
            self.precision,
            self.scale,
            self.label.clone(),
            self.type_name.clone(),
        )
    }
}

/// A live, forward-only row source
///
/// This is the boundary to the actual execution engine: something that ran
/// a query and can hand out column metadata and typed cell values. A
/// capture cursor wraps one of these and records everything read through it.
///
/// NULL must be reported as [`Value::Null`] from `read`, so the null flag is
/// part of the captured value itself rather than a separate side channel.
pub trait RowSource {
    /// Column metadata, in ordinal order
    ///
    /// Called once, at capture cursor construction.
    fn columns(&self) -> Result<Vec<SourceColumn>>;

    /// Advance to the next row; false once exhausted
    fn next_row(&mut self) -> Result<bool>;

    /// Read the value of the column at the given zero-based ordinal
    fn read(&mut self, ordinal: usize) -> Result<Value>;

    /// Release the underlying resources
    fn close(&mut self) -> Result<()>;
}
