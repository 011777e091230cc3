//! cerhist-io: file I/O for CORSIKA Cherenkov histograms.
//!
//! This crate provides memory-mapped reading of Fortran unformatted record
//! streams, datacard configuration parsing, the streaming driver that turns
//! a record stream into accumulated histograms, and the formatted table
//! writer.

mod datacard;
mod error;
pub mod pipeline;
mod reader;
mod writer;

pub use datacard::DataCard;
pub use error::{Error, Result};
pub use pipeline::{run, RunSummary, FLUSH_CADENCE};
pub use reader::{MappedFileReader, RecordReader};
pub use writer::{output_filename, HistogramWriter, Pointing};
