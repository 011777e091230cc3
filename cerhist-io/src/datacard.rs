//! CORSIKA datacard parsing.
//!
//! The datacard is the human-edited simulation steering file: one keyword
//! per line followed by its values. Only the keywords this tool needs are
//! extracted, but every one of them is required and validated up front, so a
//! broken card fails before any binary parsing begins.

use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strongly typed view of the datacard keys the histogram needs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataCard {
    /// Detector x extent (cm).
    pub xcerary: f64,
    /// Detector y extent (cm).
    pub ycerary: f64,
    /// Primary incidence angle (deg); first value of a `THETAP` range.
    pub thetap: f64,
    /// Number of simulated showers.
    pub nshow: u32,
    /// Primary energy (GeV); first value of an `ERANGE` range.
    pub erange: f64,
    /// Primary particle id.
    pub prmpar: u32,
    /// First random seed.
    pub seed1: i64,
    /// Second random seed.
    pub seed2: i64,
    /// Observation level (cm).
    pub obslev_cm: f64,
    /// Atmosphere model number.
    pub atmod: u32,
    /// Cherenkov bunch size threshold.
    pub cersiz: f64,
    /// Fluorescence bunch size threshold.
    pub flsize: f64,
}

impl DataCard {
    /// Reads and parses a datacard file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Config`] on missing or invalid keys.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses datacard text.
    ///
    /// Lines are keyword-first; `*` comment lines and blanks are skipped;
    /// a later occurrence of a keyword overrides an earlier one, except
    /// `SEED` lines which are positional (first line is seed 1, second is
    /// seed 2). Multi-valued keywords expose their first value.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a required key is missing or
    /// non-numeric, the shower count is zero, or both bunch-size thresholds
    /// are non-positive.
    pub fn parse(text: &str) -> Result<Self> {
        let mut values: HashMap<&str, f64> = HashMap::new();
        let mut seeds: Vec<f64> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('*') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            if keyword.eq_ignore_ascii_case("EXIT") {
                break;
            }
            let Some(first) = tokens.next().and_then(|t| t.parse::<f64>().ok()) else {
                continue;
            };
            if keyword.eq_ignore_ascii_case("SEED") {
                seeds.push(first);
            } else if let Some(key) = KEYWORDS.iter().copied().find(|k| keyword.eq_ignore_ascii_case(k)) {
                values.insert(key, first);
            }
        }

        let get = |key: &str| -> Result<f64> {
            values.get(key).copied().ok_or_else(|| {
                Error::Config(format!("required datacard key {key} is missing or non-numeric"))
            })
        };

        let card = Self {
            xcerary: get("XCERARY")?,
            ycerary: get("YCERARY")?,
            thetap: get("THETAP")?,
            nshow: to_count(get("NSHOW")?, "NSHOW")?,
            erange: get("ERANGE")?,
            prmpar: to_count(get("PRMPAR")?, "PRMPAR")?,
            seed1: seed_at(&seeds, 0)?,
            seed2: seed_at(&seeds, 1)?,
            obslev_cm: get("OBSLEV")?,
            atmod: to_count(get("ATMOD")?, "ATMOD")?,
            cersiz: get("CERSIZ")?,
            flsize: get("FLSIZE")?,
        };

        if card.bunch_threshold() <= 0.0 {
            return Err(Error::Config(
                "max(CERSIZ, FLSIZE) must be positive to classify bunch sub-blocks".to_string(),
            ));
        }
        Ok(card)
    }

    /// Bunch classification threshold: a sub-block is bunch data iff its tag
    /// magnitude stays below the larger configured bunch size.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bunch_threshold(&self) -> f32 {
        self.cersiz.max(self.flsize) as f32
    }
}

/// Required single-valued keywords.
const KEYWORDS: [&str; 10] = [
    "XCERARY", "YCERARY", "THETAP", "NSHOW", "ERANGE", "PRMPAR", "OBSLEV", "ATMOD", "CERSIZ",
    "FLSIZE",
];

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64, key: &str) -> Result<u32> {
    if value < 1.0 || value > f64::from(u32::MAX) {
        return Err(Error::Config(format!("datacard key {key} must be a positive count, got {value}")));
    }
    Ok(value.round() as u32)
}

#[allow(clippy::cast_possible_truncation)]
fn seed_at(seeds: &[f64], index: usize) -> Result<i64> {
    seeds.get(index).map(|s| *s as i64).ok_or_else(|| {
        Error::Config(format!("datacard is missing SEED line {}", index + 1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "\
* example steering card
RUNNR   1
NSHOW   10
PRMPAR  14
ERANGE  100. 100.
THETAP  20. 20.
SEED    900001  0  0
SEED    900002  0  0
OBSLEV  220000.
ATMOD   1
XCERARY 40000.
YCERARY 20000.
CERSIZ  5.
FLSIZE  1.
EXIT
XCERARY 1.
";

    #[test]
    fn test_parse_card() {
        let card = DataCard::parse(CARD).unwrap();
        assert_eq!(card.nshow, 10);
        assert_eq!(card.prmpar, 14);
        assert_eq!(card.erange, 100.0);
        assert_eq!(card.thetap, 20.0);
        assert_eq!(card.seed1, 900_001);
        assert_eq!(card.seed2, 900_002);
        assert_eq!(card.obslev_cm, 220_000.0);
        assert_eq!(card.atmod, 1);
        // The XCERARY after EXIT is ignored.
        assert_eq!(card.xcerary, 40_000.0);
        assert_eq!(card.bunch_threshold(), 5.0);
    }

    #[test]
    fn test_missing_key_fails() {
        let text = CARD.replace("XCERARY 40000.\n", "");
        assert!(matches!(DataCard::parse(&text), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_second_seed_fails() {
        let text = CARD.replace("SEED    900002  0  0\n", "");
        let err = DataCard::parse(&text).unwrap_err();
        assert!(err.to_string().contains("SEED"));
    }

    #[test]
    fn test_nonpositive_thresholds_fail() {
        let text = CARD.replace("CERSIZ  5.", "CERSIZ  0.").replace("FLSIZE  1.", "FLSIZE  0.");
        assert!(matches!(DataCard::parse(&text), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_showers_fail() {
        let text = CARD.replace("NSHOW   10", "NSHOW   0");
        assert!(matches!(DataCard::parse(&text), Err(Error::Config(_))));
    }
}
