//! Broad-band photometry shown next to calibrated spectra.
//!
//! The J and H magnitudes of an object are turned into flux densities per unit
//! wavelength (erg/s/cm²/Å), so they can be compared with a calibrated spectrum.
use crate::constants::{Angstrom, C_ANGSTROM};
use crate::location::ObjectInfo;

use super::CalibrationParams;

/// F_ν of an AB magnitude, in the unit fixed by `zero_point` (µJy for 22.0).
pub fn mag_to_fnu(mag: f64, zero_point: f64) -> f64 {
    10f64.powf(0.4 * (zero_point - mag))
}

/// µJy → erg/s/cm²/Å at `wavelength` (Å).
pub fn ujy_to_flambda(flux: f64, wavelength: Angstrom) -> f64 {
    1e-29 * flux * C_ANGSTROM / (wavelength * wavelength)
}

/// erg/s/cm²/Å → µJy at `wavelength` (Å).
pub fn flambda_to_ujy(flux: f64, wavelength: Angstrom) -> f64 {
    wavelength * wavelength * flux / (1e-29 * C_ANGSTROM)
}

/// A photometric point: band centre and flux density there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandFlux {
    pub band: &'static str,
    pub wavelength: Angstrom,
    /// erg/s/cm²/Å
    pub flux: f64,
}

/// J and H band fluxes of `info`, skipping the bands without a magnitude.
pub fn band_fluxes(info: &ObjectInfo, params: &CalibrationParams) -> Vec<BandFlux> {
    [
        ("J", info.jmag, params.j_wavelength),
        ("H", info.hmag, params.h_wavelength),
    ]
    .into_iter()
    .filter_map(|(band, mag, wavelength)| {
        let fnu = mag_to_fnu(mag?, params.zero_point);
        Some(BandFlux {
            band,
            wavelength,
            flux: ujy_to_flambda(fnu, wavelength),
        })
    })
    .collect()
}
