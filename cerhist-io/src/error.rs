//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record violates the Fortran unformatted framing or element layout.
    #[error("malformed record {record}: {reason}")]
    MalformedRecord {
        /// 1-based index of the offending record.
        record: usize,
        /// The violated invariant.
        reason: String,
    },

    /// The stream ended without a run-end marker.
    #[error("stream ended after {records} record(s) without a run-end marker; truncated or non-CORSIKA input")]
    UnexpectedEof {
        /// Records successfully read before the end of the stream.
        records: usize,
    },

    /// Datacard configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] cerhist_core::Error),
}
