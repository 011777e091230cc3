//! CORSIKA record layout: reshaping, sub-block splitting, classification.
//!
//! A Cherenkov output record is a flat sequence of 32-bit floats that
//! reshapes to rows of [`BUNCH_COLUMNS`] columns and partitions into
//! [`SUB_BLOCKS_PER_RECORD`] equal contiguous row-groups. The first value of
//! a sub-block is its tag, which classifies the block and carries the
//! Cherenkov/fluorescence sign on bunch data.

use crate::{Error, Result};
use ndarray::{Array2, ArrayView2, Axis};

/// Columns per photon-bunch row:
/// `[tag, x, y, u, v, time, wavelength]`.
pub const BUNCH_COLUMNS: usize = 7;

/// Sub-blocks per logical record.
pub const SUB_BLOCKS_PER_RECORD: usize = 21;

/// Required divisor of a record's element count.
pub const RECORD_ELEMENT_MULTIPLE: usize = BUNCH_COLUMNS * SUB_BLOCKS_PER_RECORD;

/// Open interval of tags marking the run-end sub-block (float-coded `RUNE`).
const RUN_END_TAG_RANGE: (f32, f32) = (3300.0, 3303.0);

/// Sub-block classification by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Photon-bunch data rows.
    Bunches,
    /// Header/trailer block carrying control codes.
    Control,
    /// Control block whose tag flags the end of the simulation run.
    RunEnd,
}

/// One logical record reshaped to rows of [`BUNCH_COLUMNS`] columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    data: Array2<f32>,
}

impl Record {
    /// Reshapes a flat element sequence into a record.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the element count is not a
    /// multiple of [`BUNCH_COLUMNS`].
    pub fn from_elements(elements: Vec<f32>) -> Result<Self> {
        if elements.is_empty() || !elements.len().is_multiple_of(BUNCH_COLUMNS) {
            return Err(Error::ShapeMismatch {
                rows: elements.len() / BUNCH_COLUMNS,
                expected: SUB_BLOCKS_PER_RECORD,
            });
        }
        let rows = elements.len() / BUNCH_COLUMNS;
        let data = Array2::from_shape_vec((rows, BUNCH_COLUMNS), elements)
            .map_err(|_| Error::ShapeMismatch {
                rows,
                expected: SUB_BLOCKS_PER_RECORD,
            })?;
        Ok(Self { data })
    }

    /// Wraps an already-shaped (rows × 7) block.
    #[must_use]
    pub fn from_rows(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Number of 7-column rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Borrowed view of the full record.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Partitions the record into [`SUB_BLOCKS_PER_RECORD`] equal contiguous
    /// row-groups.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the row count is zero or not a
    /// multiple of the sub-block count.
    pub fn split(&self) -> Result<Vec<SubBlock<'_>>> {
        let rows = self.rows();
        if rows == 0 || !rows.is_multiple_of(SUB_BLOCKS_PER_RECORD) {
            return Err(Error::ShapeMismatch {
                rows,
                expected: SUB_BLOCKS_PER_RECORD,
            });
        }
        let rows_per_block = rows / SUB_BLOCKS_PER_RECORD;
        Ok(self
            .data
            .axis_chunks_iter(Axis(0), rows_per_block)
            .map(|rows| SubBlock { rows })
            .collect())
    }
}

/// One of the 21 partitions of a record, borrowed from it.
#[derive(Debug, Clone, Copy)]
pub struct SubBlock<'a> {
    rows: ArrayView2<'a, f32>,
}

impl<'a> SubBlock<'a> {
    /// The first value of the first row, used for classification.
    #[must_use]
    pub fn tag(&self) -> f32 {
        self.rows[[0, 0]]
    }

    /// Classifies the block against the configured bunch-weight threshold.
    ///
    /// Tags strictly inside (3300, 3303) mark the run end; otherwise a tag
    /// magnitude below `threshold` marks photon-bunch data.
    #[must_use]
    pub fn classify(&self, threshold: f32) -> BlockKind {
        let tag = self.tag();
        if tag > RUN_END_TAG_RANGE.0 && tag < RUN_END_TAG_RANGE.1 {
            BlockKind::RunEnd
        } else if tag.abs() < threshold {
            BlockKind::Bunches
        } else {
            BlockKind::Control
        }
    }

    /// Borrowed view of the block's rows.
    #[must_use]
    pub fn rows(&self) -> ArrayView2<'a, f32> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_tags(tags: [f32; SUB_BLOCKS_PER_RECORD], rows_per_block: usize) -> Record {
        let mut elements = Vec::new();
        for tag in tags {
            for row in 0..rows_per_block {
                elements.push(if row == 0 { tag } else { 1.0 });
                elements.extend_from_slice(&[1.0; BUNCH_COLUMNS - 1]);
            }
        }
        Record::from_elements(elements).unwrap()
    }

    #[test]
    fn test_split_yields_21_blocks() {
        let record = record_with_tags([5.0; SUB_BLOCKS_PER_RECORD], 3);
        let blocks = record.split().unwrap();
        assert_eq!(blocks.len(), SUB_BLOCKS_PER_RECORD);
        let total: usize = blocks.iter().map(|b| b.rows().nrows()).sum();
        assert_eq!(total, record.rows());
    }

    #[test]
    fn test_split_rejects_uneven_rows() {
        let record = Record::from_elements(vec![0.0; 20 * BUNCH_COLUMNS]).unwrap();
        assert!(matches!(
            record.split(),
            Err(Error::ShapeMismatch { rows: 20, .. })
        ));
    }

    #[test]
    fn test_from_elements_rejects_ragged_payload() {
        assert!(Record::from_elements(vec![0.0; 10]).is_err());
        assert!(Record::from_elements(Vec::new()).is_err());
    }

    #[test]
    fn test_classify_by_tag() {
        let mut tags = [211_285.3_f32; SUB_BLOCKS_PER_RECORD];
        tags[3] = 4.5; // Cherenkov bunches
        tags[4] = -2.0; // fluorescence bunches
        tags[20] = 3301.0; // run end
        let record = record_with_tags(tags, 1);
        let blocks = record.split().unwrap();

        assert_eq!(blocks[0].classify(100.0), BlockKind::Control);
        assert_eq!(blocks[3].classify(100.0), BlockKind::Bunches);
        assert_eq!(blocks[4].classify(100.0), BlockKind::Bunches);
        assert_eq!(blocks[20].classify(100.0), BlockKind::RunEnd);
    }

    #[test]
    fn test_classify_respects_configured_threshold() {
        let mut tags = [500.0_f32; SUB_BLOCKS_PER_RECORD];
        tags[0] = 120.0;
        let record = record_with_tags(tags, 1);
        let blocks = record.split().unwrap();

        // |120| is a bunch weight under a large configured bunch size but a
        // control code under the historical 100 cutoff.
        assert_eq!(blocks[0].classify(150.0), BlockKind::Bunches);
        assert_eq!(blocks[0].classify(100.0), BlockKind::Control);
    }
}
