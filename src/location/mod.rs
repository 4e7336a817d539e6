//! # Location tables
//!
//! Per-object catalogue information: sky position, J and H magnitudes and
//! morphology. It is only used to annotate spectra and is loaded independently of
//! the [`SpectralStore`](crate::store::SpectralStore).
//!
//! A location table is a JSON document keyed by object id:
//!
//! ```text
//! {
//!   "file_format": "LocationTable",
//!   "objects": {
//!     "101": { "ra": 150.1, "dec": 2.2,
//!              "magnitudes": [ { "band": "J", "value": 21.4 }, { "band": "H", "value": 21.1 } ],
//!              "color": 0.3, "angle": 12.0, "type": "galaxy",
//!              "major_axis": 1.4, "minor_axis": 0.9 }
//!   }
//! }
//! ```
//!
//! Every object attribute is optional. Bands other than J and H are ignored.
use std::collections::HashMap;

use ahash::RandomState;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::constants::{ObjectId, LOCATION_TABLE_FORMAT_NAME};
use crate::decontam_errors::DecontamError;
use crate::manifest::read_file_list;
use crate::progress::LoadProgress;

/// Catalogue information of one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectInfo {
    pub id: ObjectId,
    /// Right ascension (degrees).
    pub ra: Option<f64>,
    /// Declination (degrees).
    pub dec: Option<f64>,
    /// J band AB magnitude.
    pub jmag: Option<f64>,
    /// H band AB magnitude.
    pub hmag: Option<f64>,
    pub color: Option<f64>,
    /// Position angle (degrees).
    pub angle: Option<f64>,
    pub object_type: Option<String>,
    pub major_axis: Option<f64>,
    pub minor_axis: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Magnitude {
    band: String,
    value: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ObjectEntry {
    ra: Option<f64>,
    dec: Option<f64>,
    #[serde(default)]
    magnitudes: Vec<Magnitude>,
    color: Option<f64>,
    angle: Option<f64>,
    #[serde(rename = "type")]
    object_type: Option<String>,
    major_axis: Option<f64>,
    minor_axis: Option<f64>,
}

impl ObjectEntry {
    fn into_info(self, id: ObjectId) -> ObjectInfo {
        let magnitude = |band: &str| {
            self.magnitudes
                .iter()
                .find(|m| m.band.eq_ignore_ascii_case(band))
                .map(|m| m.value)
        };
        let (jmag, hmag) = (magnitude("J"), magnitude("H"));

        ObjectInfo {
            id,
            ra: self.ra,
            dec: self.dec,
            jmag,
            hmag,
            color: self.color,
            angle: self.angle,
            object_type: self.object_type,
            major_axis: self.major_axis,
            minor_axis: self.minor_axis,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocationTableFile {
    file_format: String,
    #[serde(default)]
    objects: HashMap<String, ObjectEntry>,
}

/// Catalogue information of the objects of a field, by object id.
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    objects: HashMap<ObjectId, ObjectInfo, RandomState>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one location table.
    ///
    /// Return
    /// ----------
    /// * The table, or [`DecontamError::Format`] if the file is not a location table.
    pub fn load_file(path: &Utf8Path) -> Result<Self, DecontamError> {
        let text = std::fs::read_to_string(path)?;
        let file: LocationTableFile = serde_json::from_str(&text)
            .map_err(|e| DecontamError::Format(path.to_string(), e.to_string()))?;

        if file.file_format != LOCATION_TABLE_FORMAT_NAME {
            return Err(DecontamError::Format(
                path.to_string(),
                format!("unexpected file format tag {:?}", file.file_format),
            ));
        }

        let objects = file
            .objects
            .into_iter()
            .map(|(id, entry)| {
                let info = entry.into_info(id.clone());
                (id, info)
            })
            .collect::<HashMap<_, _, RandomState>>();

        log::info!("Loaded {} objects from location table {path}", objects.len());
        Ok(LocationTable { objects })
    }

    /// Read and merge every location table listed by the manifest at `path`.
    ///
    /// The manifest follows the same convention as the spectra manifests: a JSON
    /// array of file names found in the `data` directory next to it.
    ///
    /// See also
    /// ------------
    /// * [`SpectralStore::load_manifest`](crate::store::SpectralStore::load_manifest)
    pub fn load_manifest(
        path: &Utf8Path,
        progress: &mut dyn LoadProgress,
    ) -> Result<Self, DecontamError> {
        let files = read_file_list(path)?;

        let mut table = LocationTable::new();
        progress.begin(files.len(), "Loading location tables");
        for (i, file) in files.iter().enumerate() {
            match LocationTable::load_file(file) {
                Ok(part) => table.merge(part),
                Err(e) => {
                    progress.finish();
                    return Err(e);
                }
            }
            progress.advance(i + 1, file.file_name().unwrap_or(file.as_str()));
        }
        progress.finish();
        Ok(table)
    }

    /// Add the objects of `other`, replacing the ones already known.
    pub fn merge(&mut self, other: LocationTable) {
        self.objects.extend(other.objects);
    }

    pub fn insert(&mut self, info: ObjectInfo) -> Option<ObjectInfo> {
        self.objects.insert(info.id.clone(), info)
    }

    pub fn get_info(&self, object_id: &str) -> Option<&ObjectInfo> {
        self.objects.get(object_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod location_test {
    use super::*;

    #[test]
    fn test_entry_conversion() {
        let entry: ObjectEntry = serde_json::from_str(
            r#"{
                "ra": 150.25, "dec": 2.5,
                "magnitudes": [
                    {"band": "Y", "value": 22.0},
                    {"band": "j", "value": 21.5},
                    {"band": "H", "value": 21.0}
                ],
                "type": "star", "major_axis": 1.2
            }"#,
        )
        .unwrap();

        let info = entry.into_info("7".into());
        assert_eq!(info.id, "7");
        assert_eq!(info.ra, Some(150.25));
        assert_eq!(info.jmag, Some(21.5));
        assert_eq!(info.hmag, Some(21.0));
        assert_eq!(info.object_type.as_deref(), Some("star"));
        assert_eq!(info.minor_axis, None);
        assert_eq!(info.color, None);
    }

    #[test]
    fn test_merge_replaces_known_objects() {
        let mut table = LocationTable::new();
        table.insert(ObjectInfo {
            id: "1".into(),
            jmag: Some(20.0),
            ..ObjectInfo::default()
        });

        let mut other = LocationTable::new();
        other.insert(ObjectInfo {
            id: "1".into(),
            jmag: Some(19.0),
            ..ObjectInfo::default()
        });
        other.insert(ObjectInfo {
            id: "2".into(),
            ..ObjectInfo::default()
        });

        table.merge(other);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_info("1").unwrap().jmag, Some(19.0));
        assert!(table.get_info("3").is_none());
    }
}
