//! Sensitivity curves of the grism, one per dither.
//!
//! A sensitivity table is a two-column numeric text file, wavelength (Å) then
//! sensitivity, the columns separated by commas or blanks. Lines starting with `#`
//! are comments:
//!
//! ```text
//! # wavelength  sensitivity
//! 12000.0  1.2e16
//! 12010.0  1.3e16
//! ```
//!
//! The tables of a field are listed by a sensitivity manifest, a JSON object from
//! dither index to table name (see [`crate::manifest`]).
use std::collections::BTreeMap;

use camino::Utf8Path;
use itertools::Itertools;
use serde::Deserialize;

use crate::constants::{Angstrom, Dither, MAX_DITHER, MIN_DITHER};
use crate::decontam_errors::DecontamError;
use crate::manifest::read_file_map;
use crate::progress::LoadProgress;

use super::numeric::interp_all;

#[derive(Debug, Deserialize)]
struct SensitivityRecord {
    wavelength: f64,
    sensitivity: f64,
}

/// Sensitivity of the instrument as a function of wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityCurve {
    wavelengths: Vec<Angstrom>,
    sensitivities: Vec<f64>,
}

impl SensitivityCurve {
    /// Build a curve from its samples; they are sorted by wavelength.
    ///
    /// Return
    /// ----------
    /// * The curve, or [`DecontamError::InvalidSensitivityTable`] if the columns
    ///   differ in length, are empty or hold non-finite values.
    pub fn new(wavelengths: Vec<Angstrom>, sensitivities: Vec<f64>) -> Result<Self, DecontamError> {
        let invalid = |detail: &str| {
            Err(DecontamError::InvalidSensitivityTable(
                "<memory>".into(),
                detail.into(),
            ))
        };
        if wavelengths.len() != sensitivities.len() {
            return invalid("the columns differ in length");
        }
        if wavelengths.is_empty() {
            return invalid("the table is empty");
        }
        if wavelengths
            .iter()
            .chain(sensitivities.iter())
            .any(|v| !v.is_finite())
        {
            return invalid("the table holds non-finite values");
        }

        let (wavelengths, sensitivities) = wavelengths
            .into_iter()
            .zip(sensitivities)
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .unzip();

        Ok(SensitivityCurve {
            wavelengths,
            sensitivities,
        })
    }

    /// Read a sensitivity table.
    pub fn from_file(path: &Utf8Path) -> Result<Self, DecontamError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| match e {
            DecontamError::InvalidSensitivityTable(_, detail) => {
                DecontamError::InvalidSensitivityTable(path.to_string(), detail)
            }
            DecontamError::CsvError(e) => {
                DecontamError::InvalidSensitivityTable(path.to_string(), e.to_string())
            }
            other => other,
        })
    }

    /// Parse the text of a sensitivity table.
    pub fn parse(text: &str) -> Result<Self, DecontamError> {
        // blank-separated columns are rewritten as comma-separated ones
        let normalized = text
            .lines()
            .map(|line| {
                let line = line.trim();
                if line.starts_with('#') {
                    line.to_string()
                } else {
                    line.split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|field| !field.is_empty())
                        .collect::<Vec<_>>()
                        .join(",")
                }
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(normalized.as_bytes());

        let mut wavelengths = Vec::new();
        let mut sensitivities = Vec::new();
        for record in reader.deserialize::<SensitivityRecord>() {
            let record = record?;
            wavelengths.push(record.wavelength);
            sensitivities.push(record.sensitivity);
        }
        Self::new(wavelengths, sensitivities)
    }

    pub fn wavelengths(&self) -> &[Angstrom] {
        &self.wavelengths
    }

    pub fn sensitivities(&self) -> &[f64] {
        &self.sensitivities
    }

    /// Sensitivity interpolated at each of `wavelengths`, clamped to the end values
    /// outside the tabulated range.
    pub fn sample(&self, wavelengths: &[Angstrom]) -> Vec<f64> {
        interp_all(wavelengths, &self.wavelengths, &self.sensitivities)
    }
}

/// Sensitivity curves by dither. A dither without a curve cannot be calibrated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitivityCurves {
    curves: BTreeMap<Dither, SensitivityCurve>,
}

impl SensitivityCurves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dither: Dither, curve: SensitivityCurve) -> Option<SensitivityCurve> {
        self.curves.insert(dither, curve)
    }

    pub fn get(&self, dither: Dither) -> Option<&SensitivityCurve> {
        self.curves.get(&dither)
    }

    pub fn dithers(&self) -> impl Iterator<Item = Dither> + '_ {
        self.curves.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Read every table listed by the sensitivity manifest at `path`.
    ///
    /// Arguments
    /// -----------------
    /// * `path` – JSON object from dither index to table name, tables being read from
    ///   the `data` directory next to the manifest.
    /// * `progress` – sink receiving a report after each table.
    ///
    /// Return
    /// ----------
    /// * The curves, or the first error. Keys that are not a valid dither index are
    ///   reported as [`DecontamError::InvalidManifest`].
    pub fn load_manifest(
        path: &Utf8Path,
        progress: &mut dyn LoadProgress,
    ) -> Result<Self, DecontamError> {
        let files = read_file_map(path)?;

        let mut listed = Vec::with_capacity(files.len());
        for (key, file) in files {
            let dither = key
                .trim()
                .parse::<Dither>()
                .ok()
                .filter(|d| (MIN_DITHER..=MAX_DITHER).contains(d))
                .ok_or_else(|| {
                    DecontamError::InvalidManifest(
                        path.to_string(),
                        format!("{key:?} is not a dither index"),
                    )
                })?;
            listed.push((dither, file));
        }

        let mut curves = SensitivityCurves::new();
        progress.begin(listed.len(), "Loading sensitivities");
        for (i, (dither, file)) in listed.iter().enumerate() {
            match SensitivityCurve::from_file(file) {
                Ok(curve) => {
                    curves.insert(*dither, curve);
                }
                Err(e) => {
                    progress.finish();
                    return Err(e);
                }
            }
            progress.advance(i + 1, file.as_str());
        }
        progress.finish();

        log::info!("Loaded {} sensitivity curves from {path}", curves.len());
        Ok(curves)
    }
}

impl FromIterator<(Dither, SensitivityCurve)> for SensitivityCurves {
    fn from_iter<I: IntoIterator<Item = (Dither, SensitivityCurve)>>(iter: I) -> Self {
        SensitivityCurves {
            curves: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod sensitivity_test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_parse_blank_and_comma_separated() {
        let text = "# wavelength sensitivity\n\
                    12000.0   2.0\n\
                    12100.0,4.0\n\
                    \n\
                    12200.0 ,\t 6.0\n";
        let curve = SensitivityCurve::parse(text).unwrap();
        assert_eq!(curve.wavelengths(), &[12_000.0, 12_100.0, 12_200.0]);
        assert_eq!(curve.sensitivities(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_parse_rejects_bad_tables() {
        assert!(matches!(
            SensitivityCurve::parse("12000.0 abc\n"),
            Err(DecontamError::CsvError(_))
        ));
        assert!(matches!(
            SensitivityCurve::parse("# only a comment\n"),
            Err(DecontamError::InvalidSensitivityTable(..))
        ));
    }

    #[test]
    fn test_curve_is_sorted_and_sampled() {
        let curve = SensitivityCurve::new(vec![3.0, 1.0, 2.0], vec![30.0, 10.0, 20.0]).unwrap();
        assert_eq!(curve.wavelengths(), &[1.0, 2.0, 3.0]);

        let sampled = curve.sample(&[0.0, 1.5, 2.5, 10.0]);
        assert_relative_eq!(sampled[0], 10.0);
        assert_relative_eq!(sampled[1], 15.0);
        assert_relative_eq!(sampled[2], 25.0);
        assert_relative_eq!(sampled[3], 30.0);
    }

    #[test]
    fn test_curves_by_dither() {
        let curve = SensitivityCurve::new(vec![1.0, 2.0], vec![1.0, 1.0]).unwrap();
        let curves: SensitivityCurves = [(2, curve.clone())].into_iter().collect();
        assert_eq!(curves.get(2), Some(&curve));
        assert_eq!(curves.get(1), None);
        assert_eq!(curves.dithers().collect::<Vec<_>>(), vec![2]);
    }
}
