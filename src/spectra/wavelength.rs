//! # Wavelength solutions
//!
//! A wavelength solution maps a detector pixel coordinate, measured along the
//! dispersion direction, to a wavelength in Ångström.
//!
//! The flux calibration only relies on the [`WavelengthSolution`] trait; the
//! containers store a [`PolynomialSolution`].
use serde::{Deserialize, Serialize};

use crate::constants::Angstrom;
use crate::decontam_errors::DecontamError;

/// Axis of a cutout along which the light is dispersed.
///
/// The numbering follows the array layout `[row, column]`: on [`DispersionAxis::X`]
/// the wavelength changes from one column to the next, and collapsing the cutout
/// means summing over rows (array axis 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DispersionAxis {
    /// Dispersion along the detector x axis (columns), encoded as `0`.
    X,
    /// Dispersion along the detector y axis (rows), encoded as `1`.
    Y,
}

impl DispersionAxis {
    /// Array axis summed over when collapsing a cutout into a 1-D spectrum.
    pub fn collapse_axis(self) -> ndarray::Axis {
        match self {
            DispersionAxis::X => ndarray::Axis(0),
            DispersionAxis::Y => ndarray::Axis(1),
        }
    }
}

impl TryFrom<u8> for DispersionAxis {
    type Error = DecontamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DispersionAxis::X),
            1 => Ok(DispersionAxis::Y),
            other => Err(DecontamError::Format(
                "wavelength solution".into(),
                format!("dispersion axis must be 0 or 1, got {other}"),
            )),
        }
    }
}

impl From<DispersionAxis> for u8 {
    fn from(axis: DispersionAxis) -> Self {
        match axis {
            DispersionAxis::X => 0,
            DispersionAxis::Y => 1,
        }
    }
}

/// Pixel to wavelength mapping of a single spectrum.
pub trait WavelengthSolution {
    /// Axis along which the wavelength varies.
    fn dispersion_axis(&self) -> DispersionAxis;

    /// Wavelength (Å) at a detector pixel coordinate along the dispersion axis.
    fn wavelength(&self, pixel: f64) -> Angstrom;

    /// Wavelengths of a sequence of pixel coordinates.
    fn compute_wavelengths(&self, pixels: &[f64]) -> Vec<Angstrom> {
        pixels.iter().map(|&p| self.wavelength(p)).collect()
    }
}

/// Polynomial dispersion relation `λ(p) = Σ cᵢ·pⁱ`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialSolution {
    pub dispersion_axis: DispersionAxis,
    /// Coefficients in increasing power of the pixel coordinate.
    pub coefficients: Vec<f64>,
}

impl PolynomialSolution {
    pub fn new(dispersion_axis: DispersionAxis, coefficients: Vec<f64>) -> Self {
        PolynomialSolution {
            dispersion_axis,
            coefficients,
        }
    }

    /// Linear solution `λ(p) = zero_point + dispersion·p`.
    pub fn linear(dispersion_axis: DispersionAxis, zero_point: f64, dispersion: f64) -> Self {
        Self::new(dispersion_axis, vec![zero_point, dispersion])
    }
}

impl WavelengthSolution for PolynomialSolution {
    fn dispersion_axis(&self) -> DispersionAxis {
        self.dispersion_axis
    }

    fn wavelength(&self, pixel: f64) -> Angstrom {
        // Horner scheme
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * pixel + c)
    }
}
