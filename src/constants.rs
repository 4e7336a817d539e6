//! # Constants and type definitions for decontam
//!
//! This module centralizes the **container conventions**, **key ranges**, **instrument
//! constants** and **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Format tag and accepted file extensions of decontaminated spectra containers
//! - Valid ranges for dither and detector indices
//! - Wavelength window of the red grism and photometric band centres
//! - Physical constants used by the flux conversions
//! - Core type aliases (dither, detector, object id, pixel values)

use ndarray::Array2;

// -------------------------------------------------------------------------------------------------
// Container conventions
// -------------------------------------------------------------------------------------------------

/// Format tag carried by every decontaminated spectra container.
pub const FILE_FORMAT_NAME: &str = "DecontaminatedSpectraCollection";

/// Format tag carried by every location table.
pub const LOCATION_TABLE_FORMAT_NAME: &str = "LocationTable";

/// File extensions accepted for a single container.
pub const VALID_CONTAINER_EXTENSIONS: [&str; 2] = ["json", "dsc"];

/// Name of the directory, next to a manifest, holding the files it lists.
pub const DATA_SUBDIRECTORY: &str = "data";

// -------------------------------------------------------------------------------------------------
// Key ranges
// -------------------------------------------------------------------------------------------------

/// Smallest valid dither index.
pub const MIN_DITHER: Dither = 1;

/// Largest valid dither index.
pub const MAX_DITHER: Dither = 4;

/// Smallest valid detector index.
pub const MIN_DETECTOR: Detector = 1;

/// Largest valid detector index.
pub const MAX_DETECTOR: Detector = 16;

// -------------------------------------------------------------------------------------------------
// Instrument and physical constants
// -------------------------------------------------------------------------------------------------

/// Short end of the valid wavelength window of the red grism (Å).
pub const MIN_VALID_WAVELENGTH: Angstrom = 12_400.0;

/// Long end of the valid wavelength window of the red grism (Å).
pub const MAX_VALID_WAVELENGTH: Angstrom = 18_600.0;

/// Effective wavelength of the J band (Å).
pub const J_BAND_WAVELENGTH: Angstrom = 13_697.01;

/// Effective wavelength of the H band (Å).
pub const H_BAND_WAVELENGTH: Angstrom = 17_761.52;

/// AB magnitude zero point producing fluxes in µJy.
pub const MICROJANSKY_ZERO_POINT: f64 = 22.0;

/// Speed of light in Å/s
pub const C_ANGSTROM: f64 = 2.997_924_58e18;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Index of an exposure within the dither sequence (1..=4)
pub type Dither = u8;
/// Index of a detector within the focal plane (1..=16)
pub type Detector = u8;
/// Opaque object identifier
pub type ObjectId = String;
/// Wavelength in Ångström
pub type Angstrom = f64;
/// Value of a science, variance, contamination or model pixel
pub type Pixel = f32;
/// Mask flags of a cutout pixel
pub type MaskFlags = u32;

/// A 2-D image of pixel values, indexed `[row, column]` i.e. `[y, x]`.
pub type Image = Array2<Pixel>;
