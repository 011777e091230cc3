//! Streaming driver: records in, accumulated histograms out.
//!
//! One strict sequential pull-loop over the record stream. Bunch rows are
//! buffered across [`FLUSH_CADENCE`] records before being binned; the
//! batching is purely a performance device — binning is additive, so the
//! result is identical to binning record by record.

use crate::datacard::DataCard;
use crate::reader::RecordReader;
use crate::{Error, Result};
use cerhist_core::{
    BlockKind, BunchBuffer, DensityHistogram, Geometry, HistogramAccumulator,
};

/// Records buffered between histogram commits.
pub const FLUSH_CADENCE: usize = 10;

/// Everything the run produced, handed to the writer once the stream is
/// done.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Accumulated per-species histograms.
    pub accumulator: HistogramAccumulator,
    /// The binning geometry the run used.
    pub geometry: Geometry,
    /// Records read from the stream.
    pub records: usize,
    /// Bunch rows absorbed before zero-row filtering.
    pub bunch_rows: usize,
}

/// Runs the full streaming pass over an opened record stream.
///
/// # Errors
/// Returns [`Error::UnexpectedEof`] if the stream ends before a run-end
/// marker, [`Error::MalformedRecord`] on framing violations, and
/// [`Error::Core`] on geometry or sub-block shape failures.
pub fn run(reader: &mut RecordReader, card: &DataCard, pointing_angle_deg: f64) -> Result<RunSummary> {
    let geometry = Geometry::from_extents(card.xcerary, card.ycerary)?;
    let binner = DensityHistogram::new(geometry.clone(), pointing_angle_deg, card.nshow);
    let threshold = card.bunch_threshold();

    let mut accumulator = HistogramAccumulator::new(geometry.num_bins());
    let mut buffer = BunchBuffer::new();
    let mut pending = 0usize;
    let mut bunch_rows = 0usize;
    let mut run_ended = false;

    while let Some(record) = reader.next_record()? {
        let blocks = record.split()?;
        let saw_run_end = blocks
            .iter()
            .any(|block| block.classify(threshold) == BlockKind::RunEnd);

        let buffered_before = buffer.len();
        buffer.absorb(&blocks, threshold);
        bunch_rows += buffer.len() - buffered_before;
        pending += 1;

        if pending == FLUSH_CADENCE {
            flush(&mut buffer, &binner, &mut accumulator);
            pending = 0;
        }
        if saw_run_end {
            // Final commit regardless of how few records are pending.
            flush(&mut buffer, &binner, &mut accumulator);
            run_ended = true;
            break;
        }
    }

    if !run_ended {
        return Err(Error::UnexpectedEof {
            records: reader.records_read(),
        });
    }

    Ok(RunSummary {
        accumulator,
        geometry,
        records: reader.records_read(),
        bunch_rows,
    })
}

fn flush(buffer: &mut BunchBuffer, binner: &DensityHistogram, accumulator: &mut HistogramAccumulator) {
    let committed = buffer.commit();
    accumulator.accumulate(
        &binner.bin(committed.cherenkov.view()),
        &binner.bin(committed.fluorescence.view()),
    );
}
