//! # Flux calibration
//!
//! Converts the 1-D profile of a cutout from detector units (electrons) into a flux
//! density per unit wavelength (erg/s/cm²/Å).
//!
//! Pipeline
//! -----------------
//! 1. Collapse the selected [`SpectrumLayer`] across the dispersion direction.
//! 2. Build the detector pixel coordinates along the dispersion axis, offset by the
//!    placement of the cutout.
//! 3. Map the pixels to wavelengths with the [`WavelengthSolution`] of the spectrum.
//! 4. Divide by the bin widths (see [`numeric::bin_widths`]) and by the exposure time.
//! 5. Interpolate the sensitivity of the dither onto the wavelength grid, invert it
//!    (zero where the sensitivity is zero) and multiply.
//! 6. Optionally keep only the valid wavelength window of the grism.
//!
//! A dither without a sensitivity curve cannot be calibrated; the calibrator then
//! returns `None` instead of an error.
//!
//! Configuration
//! -----------------
//! [`CalibrationParams`] holds the wavelength window and the photometric constants.
//! Build custom parameters with [`CalibrationParams::builder`]:
//!
//! ```rust
//! use decontam::calibration::CalibrationParams;
//!
//! let params = CalibrationParams::builder()
//!     .min_wavelength(12_500.0)
//!     .restrict_to_window(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.max_wavelength, 18_600.0);
//! ```
pub mod numeric;
pub mod photometry;
pub mod sensitivity;

use std::ops::Range;

use ndarray::ArrayView2;

use crate::constants::{
    Angstrom, Detector, Dither, Pixel, H_BAND_WAVELENGTH, J_BAND_WAVELENGTH,
    MAX_VALID_WAVELENGTH, MICROJANSKY_ZERO_POINT, MIN_VALID_WAVELENGTH,
};
use crate::decontam_errors::DecontamError;
use crate::spectra::wavelength::{DispersionAxis, WavelengthSolution};
use crate::spectra::SpectralOrder;
use crate::store::SpectralStore;

use self::numeric::{bin_widths, nearest_index, reciprocal_or_zero};
use self::sensitivity::{SensitivityCurve, SensitivityCurves};

/// Parameters of the flux calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationParams {
    /// Short end of the valid wavelength window (Å).
    pub min_wavelength: Angstrom,
    /// Long end of the valid wavelength window (Å).
    pub max_wavelength: Angstrom,
    /// Keep only the samples inside the window.
    pub restrict_to_window: bool,
    /// AB zero point of the photometric fluxes, 22.0 for µJy.
    pub zero_point: f64,
    pub j_wavelength: Angstrom,
    pub h_wavelength: Angstrom,
}

impl CalibrationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CalibrationParamsBuilder {
        CalibrationParamsBuilder::new()
    }
}

impl Default for CalibrationParams {
    fn default() -> Self {
        CalibrationParams {
            min_wavelength: MIN_VALID_WAVELENGTH,
            max_wavelength: MAX_VALID_WAVELENGTH,
            restrict_to_window: true,
            zero_point: MICROJANSKY_ZERO_POINT,
            j_wavelength: J_BAND_WAVELENGTH,
            h_wavelength: H_BAND_WAVELENGTH,
        }
    }
}

/// Builder for [`CalibrationParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct CalibrationParamsBuilder {
    params: CalibrationParams,
}

impl CalibrationParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: CalibrationParams::default(),
        }
    }

    pub fn min_wavelength(mut self, v: Angstrom) -> Self {
        self.params.min_wavelength = v;
        self
    }
    pub fn max_wavelength(mut self, v: Angstrom) -> Self {
        self.params.max_wavelength = v;
        self
    }
    pub fn restrict_to_window(mut self, v: bool) -> Self {
        self.params.restrict_to_window = v;
        self
    }
    pub fn zero_point(mut self, v: f64) -> Self {
        self.params.zero_point = v;
        self
    }
    pub fn j_wavelength(mut self, v: Angstrom) -> Self {
        self.params.j_wavelength = v;
        self
    }
    pub fn h_wavelength(mut self, v: Angstrom) -> Self {
        self.params.h_wavelength = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Return
    /// ----------
    /// * [`DecontamError::InvalidCalibrationParams`] unless every value is finite,
    ///   `0 < min_wavelength < max_wavelength` and the band wavelengths are positive.
    pub fn build(self) -> Result<CalibrationParams, DecontamError> {
        let p = &self.params;

        let values = [
            p.min_wavelength,
            p.max_wavelength,
            p.zero_point,
            p.j_wavelength,
            p.h_wavelength,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DecontamError::InvalidCalibrationParams(
                "all values must be finite".into(),
            ));
        }
        if p.min_wavelength <= 0.0 {
            return Err(DecontamError::InvalidCalibrationParams(
                "min_wavelength must be > 0".into(),
            ));
        }
        if p.min_wavelength >= p.max_wavelength {
            return Err(DecontamError::InvalidCalibrationParams(
                "min_wavelength must be < max_wavelength".into(),
            ));
        }
        if p.j_wavelength <= 0.0 || p.h_wavelength <= 0.0 {
            return Err(DecontamError::InvalidCalibrationParams(
                "band wavelengths must be > 0".into(),
            ));
        }
        Ok(self.params)
    }
}

/// Layer of a cutout that can be collapsed and calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumLayer {
    /// Science plus contamination, the data before decontamination.
    Original,
    Contamination,
    /// The science layer.
    Decontaminated,
    /// First-order model of the object itself.
    Model,
}

/// A layer collapsed into a 1-D profile, in detector units.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProfile {
    /// Detector coordinate of each sample along the dispersion axis.
    pub pixels: Vec<f64>,
    pub wavelengths: Vec<Angstrom>,
    pub values: Vec<f64>,
}

/// A calibrated profile.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxSeries {
    pub pixels: Vec<f64>,
    pub wavelengths: Vec<Angstrom>,
    /// Flux density in erg/s/cm²/Å.
    pub flux: Vec<f64>,
}

/// Detector coordinates of the samples of a cutout along `axis`.
///
/// Arguments
/// -----------------
/// * `axis` – dispersion axis.
/// * `(x_offset, y_offset)` – detector position of the lower-left pixel.
/// * `(rows, columns)` – shape of the cutout.
pub fn pixel_grid(
    axis: DispersionAxis,
    (x_offset, y_offset): (i64, i64),
    (rows, columns): (usize, usize),
) -> Vec<f64> {
    match axis {
        DispersionAxis::X => (0..columns)
            .map(|i| x_offset.saturating_add(i as i64) as f64)
            .collect(),
        DispersionAxis::Y => (0..rows)
            .map(|i| y_offset.saturating_add(i as i64) as f64)
            .collect(),
    }
}

/// Sum `layer` across the dispersion direction.
pub fn collapse(layer: ArrayView2<'_, Pixel>, axis: DispersionAxis) -> Vec<f64> {
    layer
        .sum_axis(axis.collapse_axis())
        .iter()
        .map(|&v| v as f64)
        .collect()
}

/// Convert `signal` (electrons per pixel) into erg/s/cm²/Å.
///
/// Arguments
/// -----------------
/// * `signal` – collapsed profile.
/// * `wavelengths` – wavelength of each sample (Å), at least two.
/// * `exposure_time` – seconds.
/// * `curve` – sensitivity of the instrument.
///
/// Return
/// ----------
/// * `signal / (bin_width × exposure_time) × 1/sensitivity` for each sample, a
///   zero sensitivity or bin width giving zero.
pub fn calibrate_signal(
    signal: &[f64],
    wavelengths: &[Angstrom],
    exposure_time: f64,
    curve: &SensitivityCurve,
) -> Result<Vec<f64>, DecontamError> {
    if signal.len() != wavelengths.len() {
        return Err(DecontamError::SignalLengthMismatch {
            signal: signal.len(),
            wavelengths: wavelengths.len(),
        });
    }
    let widths = bin_widths(wavelengths)?;
    let sensitivity = curve.sample(wavelengths);

    Ok(signal
        .iter()
        .zip(widths)
        .zip(sensitivity)
        .map(|((&s, width), k)| {
            s * reciprocal_or_zero(width * exposure_time) * reciprocal_or_zero(k)
        })
        .collect())
}

/// Collapse a layer of the spectrum of `object_id` on `(dither, detector)`.
///
/// The spectrum is materialized first. The [`SpectrumLayer::Model`] profile uses the
/// placement of the model and the wavelength solution of the spectrum.
///
/// Return
/// ----------
/// * `None` if the spectrum, or the model for [`SpectrumLayer::Model`], is absent.
pub fn layer_profile(
    store: &mut SpectralStore,
    dither: Dither,
    detector: Detector,
    object_id: &str,
    layer: SpectrumLayer,
) -> Result<Option<LayerProfile>, DecontamError> {
    if store.get_spectrum(dither, detector, object_id).is_none() {
        return Ok(None);
    }
    let store: &SpectralStore = store;
    let Some(spectrum) = store.peek_spectrum(dither, detector, object_id) else {
        return Ok(None);
    };

    let solution = spectrum.solution();
    let axis = solution.dispersion_axis();
    let offset = (spectrum.x_offset(), spectrum.y_offset());

    let (values, offset, shape) = match layer {
        SpectrumLayer::Original => (
            collapse(spectrum.original().view(), axis),
            offset,
            spectrum.shape(),
        ),
        SpectrumLayer::Contamination => {
            (collapse(spectrum.contamination(), axis), offset, spectrum.shape())
        }
        SpectrumLayer::Decontaminated => {
            (collapse(spectrum.science(), axis), offset, spectrum.shape())
        }
        SpectrumLayer::Model => {
            let Some(model) = store.get_model(dither, detector, object_id, SpectralOrder::First)?
            else {
                return Ok(None);
            };
            (
                collapse(model.pixels(), axis),
                (model.x_offset(), model.y_offset()),
                model.pixels().dim(),
            )
        }
    };

    let pixels = pixel_grid(axis, offset, shape);
    let wavelengths = solution.compute_wavelengths(&pixels);
    Ok(Some(LayerProfile {
        pixels,
        wavelengths,
        values,
    }))
}

/// Flux calibrator of a field: sensitivity curves by dither and parameters.
#[derive(Debug, Clone, Default)]
pub struct FluxCalibrator {
    curves: SensitivityCurves,
    params: CalibrationParams,
}

impl FluxCalibrator {
    pub fn new(curves: SensitivityCurves, params: CalibrationParams) -> Self {
        FluxCalibrator { curves, params }
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    pub fn curves(&self) -> &SensitivityCurves {
        &self.curves
    }

    /// `true` if `dither` has a sensitivity curve.
    pub fn can_calibrate(&self, dither: Dither) -> bool {
        self.curves.get(dither).is_some()
    }

    /// Range of the samples of `wavelengths` inside the window of the parameters.
    ///
    /// The bounds are the samples nearest to each end of the window; the range runs
    /// from the smaller to the larger of the two, the larger one excluded.
    pub fn window(&self, wavelengths: &[Angstrom]) -> Range<usize> {
        match (
            nearest_index(wavelengths, self.params.min_wavelength),
            nearest_index(wavelengths, self.params.max_wavelength),
        ) {
            (Some(a), Some(b)) => a.min(b)..a.max(b),
            _ => 0..0,
        }
    }

    /// Calibrate `signal` taken at `dither`.
    ///
    /// Return
    /// ----------
    /// * `None` if the dither has no sensitivity curve.
    ///
    /// See also
    /// ------------
    /// * [`calibrate_signal`] – the conversion itself.
    pub fn calibrate(
        &self,
        dither: Dither,
        signal: &[f64],
        wavelengths: &[Angstrom],
        exposure_time: f64,
    ) -> Result<Option<Vec<f64>>, DecontamError> {
        let Some(curve) = self.curves.get(dither) else {
            log::warn!("No sensitivity curve for dither {dither}, flux calibration unavailable");
            return Ok(None);
        };
        calibrate_signal(signal, wavelengths, exposure_time, curve).map(Some)
    }

    /// Calibrate a layer of the spectrum of `object_id` on `(dither, detector)`.
    ///
    /// Arguments
    /// -----------------
    /// * `store` – the loaded spectra; the spectrum is materialized if needed.
    /// * `dither`, `detector`, `object_id` – the spectrum.
    /// * `layer` – the layer to calibrate.
    ///
    /// Return
    /// ----------
    /// * `None` if the dither cannot be calibrated or the layer is absent, otherwise
    ///   the calibrated profile, cut to the wavelength window when
    ///   [`CalibrationParams::restrict_to_window`] is set.
    pub fn calibrate_layer(
        &self,
        store: &mut SpectralStore,
        dither: Dither,
        detector: Detector,
        object_id: &str,
        layer: SpectrumLayer,
    ) -> Result<Option<FluxSeries>, DecontamError> {
        if !self.can_calibrate(dither) {
            log::warn!("No sensitivity curve for dither {dither}, flux calibration unavailable");
            return Ok(None);
        }
        let Some(profile) = layer_profile(store, dither, detector, object_id, layer)? else {
            return Ok(None);
        };
        let exposure_time = store.get_exposure_time(dither)?;

        let Some(flux) = self.calibrate(dither, &profile.values, &profile.wavelengths, exposure_time)?
        else {
            return Ok(None);
        };

        let LayerProfile {
            mut pixels,
            mut wavelengths,
            ..
        } = profile;
        let mut flux = flux;

        if self.params.restrict_to_window {
            let window = self.window(&wavelengths);
            pixels = pixels[window.clone()].to_vec();
            wavelengths = wavelengths[window.clone()].to_vec();
            flux = flux[window].to_vec();
        }

        Ok(Some(FluxSeries {
            pixels,
            wavelengths,
            flux,
        }))
    }
}
