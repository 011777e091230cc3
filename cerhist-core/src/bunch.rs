//! Cross-record buffering of photon-bunch rows.
//!
//! Bunch rows are cheap to append but comparatively expensive to bin, so the
//! driver batches them across several records and flushes the buffer into the
//! histogram at a fixed cadence.

use crate::record::{BlockKind, SubBlock, BUNCH_COLUMNS};
use ndarray::Array2;

/// Growable buffer of photon-bunch rows accumulated across records.
#[derive(Debug, Clone, Default)]
pub struct BunchBuffer {
    rows: Vec<[f32; BUNCH_COLUMNS]>,
}

/// The two bunch populations of a committed buffer, partitioned by tag sign.
#[derive(Debug, Clone)]
pub struct CommittedBunches {
    /// Rows with a positive tag.
    pub cherenkov: Array2<f32>,
    /// Rows with a negative tag.
    pub fluorescence: Array2<f32>,
}

impl BunchBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no rows are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends the rows of every bunch block among `blocks`.
    ///
    /// Blocks whose tag magnitude reaches `threshold` are control blocks and
    /// never enter the buffer.
    pub fn absorb(&mut self, blocks: &[SubBlock<'_>], threshold: f32) {
        for block in blocks {
            if block.classify(threshold) != BlockKind::Bunches {
                continue;
            }
            for row in block.rows().rows() {
                let mut buffered = [0.0f32; BUNCH_COLUMNS];
                for (dst, src) in buffered.iter_mut().zip(row.iter()) {
                    *dst = *src;
                }
                self.rows.push(buffered);
            }
        }
    }

    /// Partitions the buffer by tag sign, drops all-zero padding rows, and
    /// clears the buffer.
    ///
    /// An empty buffer commits to two zero-row partitions; this is the
    /// expected steady state until enough records accumulate.
    pub fn commit(&mut self) -> CommittedBunches {
        let mut cherenkov = Vec::new();
        let mut fluorescence = Vec::new();
        for row in self.rows.drain(..) {
            if row.iter().all(|v| *v == 0.0) {
                continue;
            }
            if row[0] > 0.0 {
                cherenkov.push(row);
            } else if row[0] < 0.0 {
                fluorescence.push(row);
            }
        }
        CommittedBunches {
            cherenkov: rows_to_array(cherenkov),
            fluorescence: rows_to_array(fluorescence),
        }
    }
}

/// Packs fixed-width rows into a (n × 7) array.
///
/// The element count is `rows.len() * BUNCH_COLUMNS` by construction, so the
/// reshape cannot fail.
fn rows_to_array(rows: Vec<[f32; BUNCH_COLUMNS]>) -> Array2<f32> {
    let n = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, BUNCH_COLUMNS), flat).unwrap()
}
