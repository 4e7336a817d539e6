pub mod calibration;
pub mod compositor;
pub mod constants;
pub mod decontam_errors;
pub mod detectors;
pub mod location;
pub mod manifest;
pub mod progress;
pub mod spectra;
pub mod store;
