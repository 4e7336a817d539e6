//! # Detector indices and focal plane labels
//!
//! The focal plane is tiled by a 4×4 mosaic of detectors. Containers and the
//! store address them by a linear index `1..=16`, while exposures label them by
//! their `(column, row)` position in the mosaic as a two-digit string, e.g.
//! `"11"` for the first detector and `"44"` for the last one.
//!
//! The linear index runs along the rows of the mosaic:
//!
//! ```text
//!  index :  1   2   3   4   5   6  ...  16
//!  label : 11  21  31  41  12  22  ...  44
//! ```
//!
//! [`DetectorMap`] resolves both directions.
pub(crate) mod bimap;

use once_cell::sync::Lazy;

use crate::constants::{Detector, MAX_DETECTOR, MIN_DETECTOR};
use crate::decontam_errors::DecontamError;

use self::bimap::BiMap;

static NISP_DETECTORS: Lazy<DetectorMap> = Lazy::new(DetectorMap::nisp);

/// Bidirectional mapping between detector indices and focal plane labels.
#[derive(Debug, Clone)]
pub struct DetectorMap {
    labels: BiMap<Detector, String>,
}

impl DetectorMap {
    /// Build the standard 4×4 NISP mapping.
    pub fn nisp() -> Self {
        let labels = (MIN_DETECTOR..=MAX_DETECTOR)
            .map(|detector| {
                let zero_based = detector - 1;
                let column = zero_based % 4 + 1;
                let row = zero_based / 4 + 1;
                (detector, format!("{column}{row}"))
            })
            .collect();
        DetectorMap { labels }
    }

    /// Focal plane label of a detector index, `None` outside `1..=16`.
    pub fn label(&self, detector: Detector) -> Option<&str> {
        self.labels.get_by_key(&detector).map(String::as_str)
    }

    /// Detector index of a focal plane label.
    pub fn detector(&self, label: &str) -> Result<Detector, DecontamError> {
        self.labels
            .get_by_value(&label.to_string())
            .copied()
            .ok_or_else(|| DecontamError::UnknownDetectorLabel(label.to_string()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Shared NISP mapping.
pub fn nisp_detectors() -> &'static DetectorMap {
    &NISP_DETECTORS
}
