//! Histogram geometry derived from the detector extents.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nominal bin size in metres.
pub const BIN_SIZE_M: f64 = 10.0;

/// Centimetres (datacard units) to metres.
const CM_TO_M: f64 = 1e-2;

/// Histogram axis selected from the detector extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisMode {
    /// Linear histogram along the x axis (x extent dominates).
    X,
    /// Linear histogram along the y axis (y extent dominates).
    Y,
    /// Radial histogram (equal extents).
    Radial,
}

impl AxisMode {
    /// Selects the histogram axis from the two detector extents (cm).
    ///
    /// The dominant extent wins; equal extents force radial mode.
    #[must_use]
    pub fn select(xcerary_cm: f64, ycerary_cm: f64) -> Self {
        if xcerary_cm > ycerary_cm {
            AxisMode::X
        } else if xcerary_cm < ycerary_cm {
            AxisMode::Y
        } else {
            AxisMode::Radial
        }
    }

    /// Single-letter label used in output filenames.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AxisMode::X => "x",
            AxisMode::Y => "y",
            AxisMode::Radial => "r",
        }
    }
}

/// Binning geometry, immutable after construction.
///
/// The histogram spans `[0, maxlen)` metres in `num_bins` equal-width bins,
/// where `maxlen` is half the dominant extent and the bin count comes from
/// the nominal [`BIN_SIZE_M`] spacing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geometry {
    mode: AxisMode,
    maxlen_m: f64,
    bin_width_m: f64,
    num_bins: usize,
    transverse_m: f64,
}

impl Geometry {
    /// Derives the geometry from the detector extents (cm).
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the dominant extent is too small to hold
    /// a single bin.
    pub fn from_extents(xcerary_cm: f64, ycerary_cm: f64) -> Result<Self> {
        let mode = AxisMode::select(xcerary_cm, ycerary_cm);
        let (dominant, transverse) = match mode {
            AxisMode::X => (xcerary_cm, ycerary_cm),
            AxisMode::Y => (ycerary_cm, xcerary_cm),
            AxisMode::Radial => (xcerary_cm, xcerary_cm),
        };
        let maxlen_m = CM_TO_M * dominant / 2.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_bins = (maxlen_m / BIN_SIZE_M).floor() as usize;
        if num_bins == 0 {
            return Err(Error::Config(format!(
                "detector extents ({xcerary_cm}, {ycerary_cm}) cm are too small \
                 for a single {BIN_SIZE_M} m bin"
            )));
        }
        #[allow(clippy::cast_precision_loss)]
        let bin_width_m = maxlen_m / num_bins as f64;
        Ok(Self {
            mode,
            maxlen_m,
            bin_width_m,
            num_bins,
            transverse_m: CM_TO_M * transverse,
        })
    }

    /// Histogram axis.
    #[must_use]
    pub fn mode(&self) -> AxisMode {
        self.mode
    }

    /// Upper edge of the histogram range in metres (exclusive).
    #[must_use]
    pub fn maxlen_m(&self) -> f64 {
        self.maxlen_m
    }

    /// Width of one bin in metres.
    #[must_use]
    pub fn bin_width_m(&self) -> f64 {
        self.bin_width_m
    }

    /// Number of bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Bin midpoints in metres, one per bin.
    #[must_use]
    pub fn midpoints(&self) -> Vec<f64> {
        #[allow(clippy::cast_precision_loss)]
        (0..self.num_bins)
            .map(|i| (i as f64 + 0.5) * self.bin_width_m)
            .collect()
    }

    /// Collection area of one bin in square metres.
    ///
    /// Radial bins are annuli; linear bins are strips covering both
    /// half-planes of the folded |coordinate|.
    #[must_use]
    pub fn bin_area_m2(&self, bin: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let i = bin as f64;
        match self.mode {
            AxisMode::Radial => {
                let r_in = i * self.bin_width_m;
                let r_out = (i + 1.0) * self.bin_width_m;
                std::f64::consts::PI * (r_out * r_out - r_in * r_in)
            }
            AxisMode::X | AxisMode::Y => 2.0 * self.bin_width_m * self.transverse_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_selection() {
        assert_eq!(AxisMode::select(200.0, 100.0), AxisMode::X);
        assert_eq!(AxisMode::select(100.0, 200.0), AxisMode::Y);
        assert_eq!(AxisMode::select(200.0, 200.0), AxisMode::Radial);
    }

    #[test]
    fn test_geometry_from_extents() {
        // 40000 cm -> 200 m half-extent -> 20 bins of 10 m.
        let geometry = Geometry::from_extents(40_000.0, 20_000.0).unwrap();
        assert_eq!(geometry.mode(), AxisMode::X);
        assert_eq!(geometry.num_bins(), 20);
        assert_relative_eq!(geometry.maxlen_m(), 200.0);
        assert_relative_eq!(geometry.bin_width_m(), 10.0);

        let mids = geometry.midpoints();
        assert_eq!(mids.len(), 20);
        assert_relative_eq!(mids[0], 5.0);
        assert_relative_eq!(mids[19], 195.0);
    }

    #[test]
    fn test_degenerate_extents_rejected() {
        assert!(Geometry::from_extents(0.0, 0.0).is_err());
        // 1 m half-extent cannot hold a 10 m bin.
        assert!(Geometry::from_extents(200.0, 100.0).is_err());
    }

    #[test]
    fn test_bin_areas() {
        let radial = Geometry::from_extents(40_000.0, 40_000.0).unwrap();
        assert_relative_eq!(radial.bin_area_m2(0), std::f64::consts::PI * 100.0);
        assert_relative_eq!(
            radial.bin_area_m2(1),
            std::f64::consts::PI * (400.0 - 100.0)
        );

        let linear = Geometry::from_extents(40_000.0, 20_000.0).unwrap();
        // 2 * 10 m * 200 m transverse width.
        assert_relative_eq!(linear.bin_area_m2(0), 4_000.0);
        assert_relative_eq!(linear.bin_area_m2(7), 4_000.0);
    }
}
