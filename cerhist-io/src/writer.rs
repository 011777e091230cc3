//! Formatted histogram table output.

use crate::datacard::DataCard;
use crate::pipeline::RunSummary;
use crate::Result;
use cerhist_core::AxisMode;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Telescope pointing choice, part of the output naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointing {
    /// Telescope pointed along the primary incidence angle.
    OnAxis,
    /// Telescope offset by a user-supplied angle.
    OffAxis,
}

impl Pointing {
    /// Label used in output filenames.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Pointing::OnAxis => "onaxis",
            Pointing::OffAxis => "offaxis",
        }
    }
}

/// Derives the deterministic output filename for a run.
///
/// Pattern: `{energy}GeV_{showers}sh_{theta}deg_{angle}{label}_hist_{mode}.dat`,
/// with numeric fields truncated to integers.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn output_filename(
    card: &DataCard,
    pointing_angle_deg: f64,
    pointing: Pointing,
    mode: AxisMode,
) -> String {
    format!(
        "{}GeV_{}sh_{}deg_{}{}_hist_{}.dat",
        card.erange as i64,
        card.nshow,
        card.thetap as i64,
        pointing_angle_deg as i64,
        pointing.label(),
        mode.label()
    )
}

/// Writer for the whitespace-delimited histogram table.
pub struct HistogramWriter {
    writer: BufWriter<File>,
}

impl HistogramWriter {
    /// Creates the output file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Writes the header block and one row per bin.
    ///
    /// Columns: bin midpoint (m), Cherenkov density and second moment,
    /// fluorescence density and second moment.
    ///
    /// # Errors
    /// Returns an error on any write failure.
    pub fn write_table(
        &mut self,
        card: &DataCard,
        pointing_angle_deg: f64,
        summary: &RunSummary,
    ) -> Result<()> {
        writeln!(self.writer, "# Num_showers: {}", card.nshow)?;
        writeln!(self.writer, "# E_primary (GeV): {}", card.erange)?;
        writeln!(self.writer, "# ID_prim_particle: {}", card.prmpar)?;
        writeln!(self.writer, "# Seeds: {}, {}", card.seed1, card.seed2)?;
        writeln!(
            self.writer,
            "# Theta prim. part. incidence: {} deg",
            card.thetap
        )?;
        writeln!(
            self.writer,
            "# Pointing angle: {pointing_angle_deg} deg"
        )?;
        writeln!(self.writer, "# Obs level (m): {}", card.obslev_cm * 1e-2)?;
        writeln!(self.writer, "# Atmosp model: {}", card.atmod)?;
        writeln!(self.writer, "# Cerenk_bunch_size: {}", card.cersiz)?;
        writeln!(self.writer, "# Fluor_bunch_size: {}", card.flsize)?;
        writeln!(
            self.writer,
            "# Distance to shower axis (m) | Phot_density_Cher/fluor (1/m2)"
        )?;

        let cherenkov = summary.accumulator.cherenkov();
        let fluorescence = summary.accumulator.fluorescence();
        for (bin, midpoint) in summary.geometry.midpoints().iter().enumerate() {
            writeln!(
                self.writer,
                "{:7.2} {} {} {} {}",
                midpoint,
                sci(cherenkov[[0, bin]]),
                sci(cherenkov[[1, bin]]),
                sci(fluorescence[[0, bin]]),
                sci(fluorescence[[1, bin]]),
            )?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

/// Formats a value as fixed-width scientific notation (`1.234560e+02`).
#[allow(clippy::cast_possible_truncation)]
fn sci(value: f64) -> String {
    if value == 0.0 {
        return "0.000000e+00".to_string();
    }
    let mut exponent = value.abs().log10().floor() as i32;
    let mut mantissa = value / 10f64.powi(exponent);
    // Rounding the mantissa to six decimals can carry it to 10.0.
    if format!("{mantissa:.6}").starts_with("10") || format!("{mantissa:.6}").starts_with("-10") {
        mantissa /= 10.0;
        exponent += 1;
    }
    format!("{mantissa:.6}e{exponent:+03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datacard::DataCard;
    use crate::pipeline::RunSummary;
    use cerhist_core::{Geometry, HistogramAccumulator};
    use tempfile::NamedTempFile;

    fn card() -> DataCard {
        DataCard {
            xcerary: 40_000.0,
            ycerary: 40_000.0,
            thetap: 20.0,
            nshow: 10,
            erange: 100.0,
            prmpar: 14,
            seed1: 900_001,
            seed2: 900_002,
            obslev_cm: 220_000.0,
            atmod: 1,
            cersiz: 5.0,
            flsize: 1.0,
        }
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename(&card(), 20.0, Pointing::OnAxis, AxisMode::Radial),
            "100GeV_10sh_20deg_20onaxis_hist_r.dat"
        );
        assert_eq!(
            output_filename(&card(), 35.5, Pointing::OffAxis, AxisMode::X),
            "100GeV_10sh_20deg_35offaxis_hist_x.dat"
        );
    }

    #[test]
    fn test_sci_format() {
        assert_eq!(sci(0.0), "0.000000e+00");
        assert_eq!(sci(123.456), "1.234560e+02");
        assert_eq!(sci(-0.00125), "-1.250000e-03");
        assert_eq!(sci(9.999_999_9), "1.000000e+01");
    }

    #[test]
    fn test_write_table() {
        let card = card();
        let geometry = Geometry::from_extents(card.xcerary, card.ycerary).unwrap();
        let mut accumulator = HistogramAccumulator::new(geometry.num_bins());
        let mut batch = ndarray::Array2::zeros((2, geometry.num_bins()));
        batch[[0, 3]] = 0.25;
        accumulator.accumulate(&batch, &batch);

        let summary = RunSummary {
            accumulator,
            geometry,
            records: 3,
            bunch_rows: 1,
        };

        let file = NamedTempFile::new().unwrap();
        let mut writer = HistogramWriter::create(file.path()).unwrap();
        writer.write_table(&card, 20.0, &summary).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("# Num_showers: 10"));
        assert!(content.contains("# Seeds: 900001, 900002"));
        assert!(content.contains("# Obs level (m): 2200"));
        assert!(content.contains("  35.00 2.500000e-01"));
        assert_eq!(
            content.lines().count(),
            11 + summary.geometry.num_bins()
        );
    }
}
