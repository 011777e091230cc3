//! Error types for cerhist-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for record and geometry handling.
#[derive(Error, Debug)]
pub enum Error {
    /// Record row count does not split evenly into sub-blocks.
    #[error("record with {rows} rows does not split into {expected} sub-blocks")]
    ShapeMismatch {
        /// Number of 7-column rows in the offending record.
        rows: usize,
        /// Required sub-block count.
        expected: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
