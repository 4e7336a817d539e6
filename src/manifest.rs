//! # Manifests
//!
//! A manifest is a small JSON document naming the files of a data set. The files
//! themselves live in a `data` directory next to the manifest:
//!
//! ```text
//! field_F1/
//! ├── spectra.json          ["dsc_1_05.json", "dsc_1_06.json"]
//! ├── sensitivities.json    {"1": "sens_1.dat", "2": "sens_2.dat"}
//! └── data/
//!     ├── dsc_1_05.json
//!     ├── dsc_1_06.json
//!     ├── sens_1.dat
//!     └── sens_2.dat
//! ```
//!
//! [`read_file_list`] reads list manifests (containers, location tables) and
//! [`read_file_map`] reads keyed manifests (sensitivity curves per dither). Both
//! resolve every entry against the data directory and check that the file exists,
//! so that a data set with a missing file is rejected before anything is loaded.
use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::constants::DATA_SUBDIRECTORY;
use crate::decontam_errors::DecontamError;

/// Directory holding the files listed by `manifest`.
pub fn data_directory(manifest: &Utf8Path) -> Utf8PathBuf {
    manifest
        .parent()
        .unwrap_or_else(|| Utf8Path::new(""))
        .join(DATA_SUBDIRECTORY)
}

fn resolve(manifest: &Utf8Path, data_dir: &Utf8Path, name: &str) -> Result<Utf8PathBuf, DecontamError> {
    let full = data_dir.join(name);
    if !full.is_file() {
        return Err(DecontamError::InvalidManifest(
            manifest.to_string(),
            format!("{full} does not exist"),
        ));
    }
    Ok(full)
}

/// Read a manifest holding a JSON array of file names.
///
/// Return
/// ----------
/// * The resolved paths, in manifest order.
pub fn read_file_list(manifest: &Utf8Path) -> Result<Vec<Utf8PathBuf>, DecontamError> {
    let text = std::fs::read_to_string(manifest)?;
    let names: Vec<String> = serde_json::from_str(&text)
        .map_err(|e| DecontamError::InvalidManifest(manifest.to_string(), e.to_string()))?;

    let data_dir = data_directory(manifest);
    names
        .iter()
        .map(|name| resolve(manifest, &data_dir, name))
        .collect()
}

/// Read a manifest holding a JSON object from keys to file names.
///
/// Return
/// ----------
/// * The resolved paths by key.
pub fn read_file_map(manifest: &Utf8Path) -> Result<BTreeMap<String, Utf8PathBuf>, DecontamError> {
    let text = std::fs::read_to_string(manifest)?;
    let names: BTreeMap<String, String> = serde_json::from_str(&text)
        .map_err(|e| DecontamError::InvalidManifest(manifest.to_string(), e.to_string()))?;

    let data_dir = data_directory(manifest);
    names
        .into_iter()
        .map(|(key, name)| Ok((key, resolve(manifest, &data_dir, &name)?)))
        .collect()
}

#[cfg(test)]
mod manifest_test {
    use super::*;

    #[test]
    fn test_data_directory() {
        assert_eq!(
            data_directory(Utf8Path::new("/field/spectra.json")),
            Utf8PathBuf::from("/field/data")
        );
        assert_eq!(
            data_directory(Utf8Path::new("spectra.json")),
            Utf8PathBuf::from("data")
        );
    }

    #[test]
    fn test_missing_manifest() {
        let err = read_file_list(Utf8Path::new("tests/data/does_not_exist.json")).unwrap_err();
        assert!(matches!(err, DecontamError::IoError(_)));
    }
}
