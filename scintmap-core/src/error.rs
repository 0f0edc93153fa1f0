//! Error types for scintmap-core.

use thiserror::Error;

/// Result type alias for scintmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for scintmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A column of a record table has a different length than its siblings.
    #[error("column {table}.{column} has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        table: &'static str,
        column: &'static str,
        expected: usize,
        found: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
