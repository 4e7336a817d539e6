//! # Decontaminated spectra container format
//!
//! One container holds every decontaminated spectrum and every contaminant model of
//! a single `(dither, detector)` pair, plus the metadata of the exposure they come
//! from. Containers are JSON documents with the following layout:
//!
//! ```text
//! {
//!   "file_format": "DecontaminatedSpectraCollection",
//!   "dither": 1, "detector": 5,
//!   "exp_time": 549.6, "grism_position": "RGS000", "exposure_id": 1042, "field_id": "F1",
//!   "spectra": [
//!     { "object_id": 101, "x_offset": 120, "y_offset": 48,
//!       "science":  { "shape": [rows, columns], "data": [...] },
//!       "variance": { ... }, "mask": { ... },
//!       "contaminants": [ { "id": 102, "order": 1 }, ... ],
//!       "solution": { "dispersion_axis": 0, "coefficients": [c0, c1, ...] } }
//!   ],
//!   "models": [
//!     { "object_id": 102, "order": 1, "x_offset": 130, "y_offset": 40,
//!       "pixels": { "shape": [rows, columns], "data": [...] } }
//!   ]
//! }
//! ```
//!
//! Arrays are stored row-major, the first row being the bottom row of the cutout.
//! Identifiers may be written as integers or strings; they are normalized to strings.
//!
//! [`SpectraContainer::into_products`] validates a decoded container and turns it into
//! the entities indexed by the store. Validation is complete before anything is
//! returned, so a rejected container never reaches the store.
use std::collections::BTreeMap;

use camino::Utf8Path;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::constants::{
    Detector, Dither, ObjectId, FILE_FORMAT_NAME, MAX_DETECTOR, MAX_DITHER, MIN_DETECTOR,
    MIN_DITHER, VALID_CONTAINER_EXTENSIONS,
};
use crate::decontam_errors::DecontamError;
use crate::spectra::wavelength::PolynomialSolution;
use crate::spectra::{Contaminant, DecontaminatedSpectrum, ModelSpectrum, SpectralOrder};

use super::{DetectorModels, DetectorProducts, ExposureInfo};

/// Scalar attribute written either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Label {
    pub fn into_string(self) -> String {
        match self {
            Label::Int(i) => i.to_string(),
            Label::Float(f) => f.to_string(),
            Label::Text(s) => s,
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self {
        Label::Int(i)
    }
}

/// Row-major 2-D array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArray<T> {
    pub shape: [usize; 2],
    pub data: Vec<T>,
}

impl<T> RawArray<T> {
    pub fn new(shape: [usize; 2], data: Vec<T>) -> Self {
        RawArray { shape, data }
    }

    fn into_array(self, source: &str, what: &str) -> Result<Array2<T>, DecontamError> {
        let [rows, columns] = self.shape;
        let len = self.data.len();
        Array2::from_shape_vec((rows, columns), self.data).map_err(|_| {
            DecontamError::Format(
                source.to_string(),
                format!("{what}: {len} values do not fill a {rows}x{columns} array"),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminantEntry {
    pub id: Label,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumEntry {
    pub object_id: Label,
    pub x_offset: i64,
    pub y_offset: i64,
    pub science: RawArray<f32>,
    pub variance: RawArray<f32>,
    pub mask: RawArray<u32>,
    #[serde(default)]
    pub contaminants: Vec<ContaminantEntry>,
    pub solution: PolynomialSolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub object_id: Label,
    pub order: i64,
    pub x_offset: i64,
    pub y_offset: i64,
    pub pixels: RawArray<f32>,
}

/// Decoded, not yet validated, container of one `(dither, detector)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectraContainer {
    pub file_format: String,
    pub dither: i64,
    pub detector: i64,
    pub exp_time: f64,
    pub grism_position: Label,
    pub exposure_id: Label,
    pub field_id: Label,
    #[serde(default)]
    pub spectra: Vec<SpectrumEntry>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Content of a validated container, ready to be merged into the store.
#[derive(Debug)]
pub(crate) struct ValidatedContainer {
    pub dither: Dither,
    pub detector: Detector,
    pub field_id: String,
    pub exposure: ExposureInfo,
    pub products: DetectorProducts,
}

impl SpectraContainer {
    /// Read a container file.
    ///
    /// The extension must be one of [`VALID_CONTAINER_EXTENSIONS`]; a file that does not
    /// decode as a container is reported as [`DecontamError::Format`].
    pub fn from_file(path: &Utf8Path) -> Result<Self, DecontamError> {
        check_extension(path)?;
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| DecontamError::Format(path.to_string(), e.to_string()))
    }

    /// Check the header (tag, dither, detector, exposure time) of the container.
    fn validate_header(&self, source: &str) -> Result<(Dither, Detector), DecontamError> {
        if self.file_format != FILE_FORMAT_NAME {
            return Err(DecontamError::Format(
                source.to_string(),
                format!("unexpected file format tag {:?}", self.file_format),
            ));
        }
        if !(MIN_DITHER as i64..=MAX_DITHER as i64).contains(&self.dither) {
            return Err(DecontamError::DitherOutOfRange(self.dither));
        }
        if !(MIN_DETECTOR as i64..=MAX_DETECTOR as i64).contains(&self.detector) {
            return Err(DecontamError::DetectorOutOfRange(self.detector));
        }
        if self.exp_time.is_nan() || self.exp_time <= 0.0 {
            return Err(DecontamError::ExposureTimeOutOfRange(self.exp_time));
        }
        Ok((self.dither as Dither, self.detector as Detector))
    }

    /// Validate the container and build its spectra and models.
    pub(crate) fn into_products(self, source: &str) -> Result<ValidatedContainer, DecontamError> {
        let (dither, detector) = self.validate_header(source)?;

        let mut spectra = BTreeMap::new();
        for entry in self.spectra {
            let spectrum = entry.into_spectrum(source)?;
            let id = spectrum.id().to_string();
            if spectra.contains_key(&id) {
                return Err(DecontamError::Format(
                    source.to_string(),
                    format!("object {id} has more than one spectrum"),
                ));
            }
            spectra.insert(id, spectrum);
        }

        let mut models = DetectorModels::default();
        for entry in self.models {
            models.insert(entry.into_model(source)?);
        }

        Ok(ValidatedContainer {
            dither,
            detector,
            field_id: self.field_id.into_string(),
            exposure: ExposureInfo {
                exposure_time: self.exp_time,
                grism_position: self.grism_position.into_string(),
                exposure_id: self.exposure_id.into_string(),
            },
            products: DetectorProducts { spectra, models },
        })
    }
}

impl SpectrumEntry {
    fn into_spectrum(self, source: &str) -> Result<DecontaminatedSpectrum, DecontamError> {
        let id: ObjectId = self.object_id.into_string();
        let contaminants = self
            .contaminants
            .into_iter()
            .map(|c| Ok(Contaminant::new(c.id.into_string(), SpectralOrder::try_from(c.order)?)))
            .collect::<Result<Vec<_>, DecontamError>>()?;

        DecontaminatedSpectrum::new(
            id.clone(),
            (self.x_offset, self.y_offset),
            self.science.into_array(source, &format!("science of {id}"))?,
            self.variance.into_array(source, &format!("variance of {id}"))?,
            self.mask.into_array(source, &format!("mask of {id}"))?,
            contaminants,
            self.solution,
        )
    }
}

impl ModelEntry {
    fn into_model(self, source: &str) -> Result<ModelSpectrum, DecontamError> {
        let id: ObjectId = self.object_id.into_string();
        let order = SpectralOrder::try_from(self.order)?;
        if order == SpectralOrder::Zeroth {
            return Err(DecontamError::Format(
                source.to_string(),
                format!("model of {id} has spectral order 0"),
            ));
        }
        let pixels = self.pixels.into_array(source, &format!("model of {id}"))?;
        ModelSpectrum::new(id, order, pixels, (self.x_offset, self.y_offset))
    }
}

fn check_extension(path: &Utf8Path) -> Result<(), DecontamError> {
    match path.extension() {
        Some(ext) if VALID_CONTAINER_EXTENSIONS.contains(&ext) => Ok(()),
        _ => Err(DecontamError::Format(
            path.to_string(),
            format!(
                "the file extension must be one of {:?}",
                VALID_CONTAINER_EXTENSIONS
            ),
        )),
    }
}

#[cfg(test)]
mod container_test {
    use super::*;
    use crate::spectra::wavelength::DispersionAxis;

    fn container() -> SpectraContainer {
        SpectraContainer {
            file_format: FILE_FORMAT_NAME.to_string(),
            dither: 2,
            detector: 7,
            exp_time: 549.6,
            grism_position: "RGS000".into(),
            exposure_id: Label::Int(1042),
            field_id: "F1".into(),
            spectra: vec![SpectrumEntry {
                object_id: Label::Int(101),
                x_offset: 10,
                y_offset: 20,
                science: RawArray::new([2, 3], vec![1.0; 6]),
                variance: RawArray::new([2, 3], vec![0.1; 6]),
                mask: RawArray::new([2, 3], vec![0; 6]),
                contaminants: vec![ContaminantEntry {
                    id: Label::Int(102),
                    order: 1,
                }],
                solution: PolynomialSolution::linear(DispersionAxis::X, 12_000.0, 13.4),
            }],
            models: vec![ModelEntry {
                object_id: "102".into(),
                order: 1,
                x_offset: 11,
                y_offset: 19,
                pixels: RawArray::new([2, 2], vec![0.5; 4]),
            }],
        }
    }

    #[test]
    fn test_valid_container() {
        let validated = container().into_products("test").unwrap();
        assert_eq!((validated.dither, validated.detector), (2, 7));
        assert_eq!(validated.field_id, "F1");
        assert_eq!(validated.exposure.exposure_id, "1042");
        assert_eq!(validated.exposure.grism_position, "RGS000");

        let spectrum = &validated.products.spectra["101"];
        assert_eq!(spectrum.shape(), (2, 3));
        assert_eq!(
            spectrum.contaminants(),
            &[Contaminant::new("102", SpectralOrder::First)]
        );
        assert!(validated
            .products
            .models
            .get("102", SpectralOrder::First)
            .is_some());
    }

    #[test]
    fn test_header_errors() {
        let mut bad_tag = container();
        bad_tag.file_format = "SomethingElse".into();
        assert!(matches!(
            bad_tag.into_products("test"),
            Err(DecontamError::Format(..))
        ));

        let mut bad_dither = container();
        bad_dither.dither = 5;
        assert_eq!(
            bad_dither.into_products("test").unwrap_err(),
            DecontamError::DitherOutOfRange(5)
        );

        let mut bad_detector = container();
        bad_detector.detector = 0;
        assert_eq!(
            bad_detector.into_products("test").unwrap_err(),
            DecontamError::DetectorOutOfRange(0)
        );

        let mut bad_time = container();
        bad_time.exp_time = 0.0;
        let err = bad_time.into_products("test").unwrap_err();
        assert!(err.is_range_error());

        let mut nan_time = container();
        nan_time.exp_time = f64::NAN;
        assert!(nan_time.into_products("test").unwrap_err().is_range_error());
    }

    #[test]
    fn test_array_errors() {
        let mut short = container();
        short.spectra[0].science = RawArray::new([2, 3], vec![1.0; 5]);
        assert!(matches!(
            short.into_products("test"),
            Err(DecontamError::Format(..))
        ));

        let mut mismatched = container();
        mismatched.spectra[0].mask = RawArray::new([3, 2], vec![0; 6]);
        assert!(matches!(
            mismatched.into_products("test"),
            Err(DecontamError::ShapeMismatch { .. })
        ));

        let mut zeroth = container();
        zeroth.models[0].order = 0;
        assert!(matches!(
            zeroth.into_products("test"),
            Err(DecontamError::Format(..))
        ));
    }

    #[test]
    fn test_duplicate_spectrum_is_rejected() {
        let mut duplicated = container();
        let mut second = duplicated.spectra[0].clone();
        second.x_offset = 40;
        duplicated.spectra.push(second);

        match duplicated.into_products("test") {
            Err(DecontamError::Format(source, detail)) => {
                assert_eq!(source, "test");
                assert!(detail.contains("101"), "{detail}");
            }
            other => panic!("expected a format error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_layout() {
        let text = r#"{
            "file_format": "DecontaminatedSpectraCollection",
            "dither": 1, "detector": 5, "exp_time": 100.0,
            "grism_position": 4, "exposure_id": "E-7", "field_id": 3,
            "spectra": [{
                "object_id": "A", "x_offset": 0, "y_offset": 0,
                "science": {"shape": [1, 2], "data": [1.0, 2.0]},
                "variance": {"shape": [1, 2], "data": [1.0, 1.0]},
                "mask": {"shape": [1, 2], "data": [0, 1]},
                "solution": {"dispersion_axis": 0, "coefficients": [12000.0, 10.0]}
            }]
        }"#;
        let container: SpectraContainer = serde_json::from_str(text).unwrap();
        let validated = container.into_products("inline").unwrap();
        assert_eq!(validated.field_id, "3");
        assert_eq!(validated.exposure.grism_position, "4");
        assert!(validated.products.spectra["A"].contaminants().is_empty());
        assert!(validated.products.models.is_empty());
    }

    #[test]
    fn test_extension_check() {
        assert!(check_extension(Utf8Path::new("/data/dsc_1_5.json")).is_ok());
        assert!(check_extension(Utf8Path::new("/data/dsc_1_5.dsc")).is_ok());
        assert!(matches!(
            check_extension(Utf8Path::new("/data/dsc_1_5.fits")),
            Err(DecontamError::Format(..))
        ));
        assert!(check_extension(Utf8Path::new("/data/noext")).is_err());
    }
}
