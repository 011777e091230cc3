//! cerhist-core: record model and density histograms for CORSIKA Cherenkov
//! output.
//!
//! This crate provides the in-memory half of the pipeline: reshaping flat
//! record payloads into sub-blocks, buffering photon-bunch rows across
//! records, and binning them into per-shower photon density histograms.

pub mod bunch;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod record;

pub use bunch::{BunchBuffer, CommittedBunches};
pub use error::{Error, Result};
pub use geometry::{AxisMode, Geometry, BIN_SIZE_M};
pub use histogram::{DensityHistogram, HistogramAccumulator};
pub use record::{BlockKind, Record, SubBlock, BUNCH_COLUMNS, SUB_BLOCKS_PER_RECORD};
