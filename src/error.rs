use thiserror::Error;

/// Custom error types for the result cache library
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache provider could not produce or load a cache instance
    #[error("Cache store error: {0}")]
    Store(String),

    /// A typed accessor was called on a value of an incompatible kind
    #[error("Type mismatch for column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        column: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// The requested column label is not part of the result
    #[error("Unknown column label: {0}")]
    UnknownColumn(String),

    /// A column ordinal outside the result width was requested
    #[error("Column ordinal {ordinal} out of range (result has {width} columns)")]
    ColumnOutOfRange { ordinal: usize, width: usize },

    /// The cursor is not positioned on a row
    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    /// The requested operation is outside the cursor capability set
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    /// The underlying row source failed
    #[error("Row source error: {0}")]
    RowSource(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wrap a live row source failure
    pub fn row_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::RowSource(Box::new(err))
    }
}

/// Result type alias for result cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
