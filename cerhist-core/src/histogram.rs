//! Photon density binning and the running histogram accumulator.

use crate::geometry::{AxisMode, Geometry};
use ndarray::{Array2, ArrayView2};

/// Rows of the per-species statistic matrix.
const STAT_ROWS: usize = 2;

/// Bins bunch rows into per-bin photon density statistics.
///
/// Each call returns a `(2, num_bins)` matrix: row 0 accumulates photon
/// density (photons / m² / shower), row 1 the second moment of the same
/// estimator. Both rows are plain sums over the input rows, so matrices from
/// separate calls add — the driver relies on this to merge per-batch results.
#[derive(Debug, Clone)]
pub struct DensityHistogram {
    geometry: Geometry,
    cos_pointing: f64,
    n_showers: f64,
}

impl DensityHistogram {
    /// Creates a binner for the given geometry and run parameters.
    #[must_use]
    pub fn new(geometry: Geometry, pointing_angle_deg: f64, n_showers: u32) -> Self {
        Self {
            geometry,
            cos_pointing: pointing_angle_deg.to_radians().cos(),
            n_showers: f64::from(n_showers),
        }
    }

    /// The binning geometry.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Bins a set of bunch rows.
    ///
    /// Rows whose distance falls outside `[0, maxlen)` are dropped; zero rows
    /// in give an all-zero matrix out.
    #[must_use]
    pub fn bin(&self, rows: ArrayView2<'_, f32>) -> Array2<f64> {
        let num_bins = self.geometry.num_bins();
        let mut stats = Array2::<f64>::zeros((STAT_ROWS, num_bins));

        for row in rows.rows() {
            let weight = f64::from(row[0]).abs();
            // Ground coordinates arrive in cm; the shower is inclined along
            // x, so only x is projected onto the shower-transverse plane.
            let x = f64::from(row[1]) * 1e-2 * self.cos_pointing;
            let y = f64::from(row[2]) * 1e-2;
            let distance = match self.geometry.mode() {
                AxisMode::X => x.abs(),
                AxisMode::Y => y.abs(),
                AxisMode::Radial => x.hypot(y),
            };
            if !distance.is_finite() || distance >= self.geometry.maxlen_m() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let bin = (distance / self.geometry.bin_width_m()).floor() as usize;
            if bin >= num_bins {
                continue;
            }
            let norm = self.geometry.bin_area_m2(bin) * self.n_showers;
            stats[[0, bin]] += weight / norm;
            stats[[1, bin]] += (weight * weight) / (norm * norm);
        }

        stats
    }
}

/// Running per-species histogram totals.
///
/// Zero-initialized, monotonically accumulated over the run, never reset.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    cherenkov: Array2<f64>,
    fluorescence: Array2<f64>,
}

impl HistogramAccumulator {
    /// Creates a zeroed accumulator for `num_bins` bins.
    #[must_use]
    pub fn new(num_bins: usize) -> Self {
        Self {
            cherenkov: Array2::zeros((STAT_ROWS, num_bins)),
            fluorescence: Array2::zeros((STAT_ROWS, num_bins)),
        }
    }

    /// Sums one batch of per-species statistics into the running totals.
    pub fn accumulate(&mut self, cherenkov: &Array2<f64>, fluorescence: &Array2<f64>) {
        self.cherenkov += cherenkov;
        self.fluorescence += fluorescence;
    }

    /// Cherenkov statistics, `(2, num_bins)`.
    #[must_use]
    pub fn cherenkov(&self) -> &Array2<f64> {
        &self.cherenkov
    }

    /// Fluorescence statistics, `(2, num_bins)`.
    #[must_use]
    pub fn fluorescence(&self) -> &Array2<f64> {
        &self.fluorescence
    }
}
