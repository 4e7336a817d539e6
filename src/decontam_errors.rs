use thiserror::Error;

use crate::constants::Dither;

#[derive(Error, Debug)]
pub enum DecontamError {
    #[error("{0} is not a valid decontaminated spectra file: {1}")]
    Format(String, String),

    #[error("The value, dither={0}, is out of the expected range 1..=4")]
    DitherOutOfRange(i64),

    #[error("The detector value, {0}, is out of the expected range 1..=16")]
    DetectorOutOfRange(i64),

    #[error("The exposure time must be > 0.0 seconds, got {0}")]
    ExposureTimeOutOfRange(f64),

    #[error("Encountered a new field ID ({found}); the collection only holds spectra of field {expected}")]
    FieldMismatch { expected: String, found: String },

    #[error("Models are not created for zeroth-order spectra")]
    InvalidOrder,

    #[error("Spectral order {0} is not supported (expected 0, 1 or 2)")]
    UnsupportedOrder(i64),

    #[error("Layers of object {object_id} do not share a shape: {detail}")]
    ShapeMismatch { object_id: String, detail: String },

    #[error("Dither {0} was never loaded")]
    UnknownDither(Dither),

    #[error("Unknown detector label: {0}")]
    UnknownDetectorLabel(String),

    #[error("Invalid manifest {0}: {1}")]
    InvalidManifest(String, String),

    #[error("Invalid sensitivity table {0}: {1}")]
    InvalidSensitivityTable(String, String),

    #[error("At least two pixels are needed to compute wavelength bins, got {0}")]
    InsufficientWavelengthSamples(usize),

    #[error("The signal has {signal} samples but the wavelength grid has {wavelengths}")]
    SignalLengthMismatch { signal: usize, wavelengths: usize },

    #[error("Invalid calibration parameters: {0}")]
    InvalidCalibrationParams(String),

    #[error("Invalid smoothing window width: {0}")]
    InvalidWindowWidth(usize),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON decoding error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV decoding error: {0}")]
    CsvError(#[from] csv::Error),
}

impl DecontamError {
    /// `true` for the errors raised when a dither, detector or exposure time
    /// falls outside of its domain.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            DecontamError::DitherOutOfRange(_)
                | DecontamError::DetectorOutOfRange(_)
                | DecontamError::ExposureTimeOutOfRange(_)
        )
    }
}

impl PartialEq for DecontamError {
    fn eq(&self, other: &Self) -> bool {
        use DecontamError::*;
        match (self, other) {
            (Format(a, b), Format(c, d)) => a == c && b == d,
            (DitherOutOfRange(a), DitherOutOfRange(b)) => a == b,
            (DetectorOutOfRange(a), DetectorOutOfRange(b)) => a == b,
            (ExposureTimeOutOfRange(a), ExposureTimeOutOfRange(b)) => a == b,
            (
                FieldMismatch {
                    expected: a,
                    found: b,
                },
                FieldMismatch {
                    expected: c,
                    found: d,
                },
            ) => a == c && b == d,
            (UnsupportedOrder(a), UnsupportedOrder(b)) => a == b,
            (
                ShapeMismatch {
                    object_id: a,
                    detail: b,
                },
                ShapeMismatch {
                    object_id: c,
                    detail: d,
                },
            ) => a == c && b == d,
            (UnknownDither(a), UnknownDither(b)) => a == b,
            (UnknownDetectorLabel(a), UnknownDetectorLabel(b)) => a == b,
            (InvalidManifest(a, b), InvalidManifest(c, d)) => a == c && b == d,
            (InvalidSensitivityTable(a, b), InvalidSensitivityTable(c, d)) => a == c && b == d,
            (InsufficientWavelengthSamples(a), InsufficientWavelengthSamples(b)) => a == b,
            (
                SignalLengthMismatch {
                    signal: a,
                    wavelengths: b,
                },
                SignalLengthMismatch {
                    signal: c,
                    wavelengths: d,
                },
            ) => a == c && b == d,
            (InvalidCalibrationParams(a), InvalidCalibrationParams(b)) => a == b,
            (InvalidWindowWidth(a), InvalidWindowWidth(b)) => a == b,

            // Foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (InvalidOrder, InvalidOrder) => true,

            _ => false,
        }
    }
}
