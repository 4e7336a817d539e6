//! # Spectral store
//!
//! [`SpectralStore`] owns every decontaminated spectrum and contaminant model loaded
//! from [containers](container::SpectraContainer), indexed as
//!
//! ```text
//! dither → detector → object-id → DecontaminatedSpectrum
//! dither → detector → object-id → order → ModelSpectrum
//! ```
//!
//! together with the exposure metadata of each dither. All the spectra of a store
//! belong to the same field; a container of another field is rejected.
//!
//! Loading
//! -----------------
//! * [`SpectralStore::load`] – merge an already decoded container.
//! * [`SpectralStore::load_file`] – read and merge one container file.
//! * [`SpectralStore::load_manifest`] – read and merge every container listed by a
//!   manifest, reporting progress after each file.
//!
//! A container is fully validated before any of it is merged: a rejected container
//! leaves the store as it was, and the containers merged before it stay merged.
//!
//! Serving spectra
//! -----------------
//! The contamination layer of a spectrum is rebuilt by the
//! [compositor](crate::compositor) the first time the spectrum is served by
//! [`SpectralStore::get_spectrum`], [`SpectralStore::get_spectra`] or
//! [`SpectralStore::get_object_spectra`]. These accessors take `&mut self` for that
//! reason.
//!
//! Lookups of missing keys return `None`, never an error.
pub mod container;
pub mod object_index;

use std::collections::BTreeMap;

use camino::Utf8Path;
use once_cell::unsync::OnceCell;

use crate::compositor::{materialize, ModelLookup};
use crate::constants::{Detector, Dither, ObjectId};
use crate::decontam_errors::DecontamError;
use crate::manifest::read_file_list;
use crate::progress::LoadProgress;
use crate::spectra::{DecontaminatedSpectrum, ModelSpectrum, SpectralOrder};

use self::container::{SpectraContainer, ValidatedContainer};
use self::object_index::ObjectIndex;

/// Metadata of the exposure taken at one dither.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureInfo {
    /// Exposure time in seconds.
    pub exposure_time: f64,
    pub grism_position: String,
    pub exposure_id: String,
}

/// Contaminant models of one detector, by object and order.
#[derive(Debug, Clone, Default)]
pub struct DetectorModels {
    models: BTreeMap<ObjectId, BTreeMap<SpectralOrder, ModelSpectrum>>,
}

impl DetectorModels {
    /// Insert `model`, replacing a previous model of the same object and order.
    pub fn insert(&mut self, model: ModelSpectrum) {
        self.models
            .entry(model.id().to_string())
            .or_default()
            .insert(model.order(), model);
    }

    pub fn get(&self, object_id: &str, order: SpectralOrder) -> Option<&ModelSpectrum> {
        self.models.get(object_id)?.get(&order)
    }

    /// Number of models, all orders included.
    pub fn len(&self) -> usize {
        self.models.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelLookup for DetectorModels {
    fn find_model(&self, object_id: &str, order: SpectralOrder) -> Option<&ModelSpectrum> {
        self.get(object_id, order)
    }
}

/// Spectra and models of one `(dither, detector)` pair.
#[derive(Debug, Clone, Default)]
pub struct DetectorProducts {
    pub(crate) spectra: BTreeMap<ObjectId, DecontaminatedSpectrum>,
    pub(crate) models: DetectorModels,
}

/// Hierarchical store of the decontamination products of one field.
#[derive(Debug, Default)]
pub struct SpectralStore {
    products: BTreeMap<Dither, BTreeMap<Detector, DetectorProducts>>,
    exposures: BTreeMap<Dither, ExposureInfo>,
    field_id: Option<String>,
    object_index: OnceCell<ObjectIndex>,
}

impl SpectralStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `container` and merge its content into the store.
    ///
    /// Return
    /// ----------
    /// * The `(dither, detector)` pair filled by the container, or the first
    ///   validation error, in which case the store is left untouched.
    pub fn load(&mut self, container: SpectraContainer) -> Result<(Dither, Detector), DecontamError> {
        self.ingest(container, "<memory>")
    }

    /// Read the container file at `path` and merge it into the store.
    ///
    /// See also
    /// ------------
    /// * [`SpectralStore::load`] – validation rules.
    pub fn load_file(&mut self, path: &Utf8Path) -> Result<(Dither, Detector), DecontamError> {
        let container = SpectraContainer::from_file(path)?;
        self.ingest(container, path.as_str())
    }

    /// Load every container listed by the manifest at `path`.
    ///
    /// The manifest is a JSON array of file names, resolved in the `data` directory
    /// next to it. Every listed file must exist before any of them is read. Files are
    /// then loaded in manifest order and `progress` is notified after each one.
    ///
    /// Arguments
    /// -----------------
    /// * `path` – the manifest.
    /// * `progress` – sink receiving a report after each container.
    ///
    /// Return
    /// ----------
    /// * The number of containers loaded, or the error of the first container that
    ///   failed. Containers loaded before that one stay in the store; the ones after
    ///   it are not read.
    pub fn load_manifest(
        &mut self,
        path: &Utf8Path,
        progress: &mut dyn LoadProgress,
    ) -> Result<usize, DecontamError> {
        let files = read_file_list(path)?;

        progress.begin(files.len(), "Loading spectra");
        for (i, file) in files.iter().enumerate() {
            if let Err(e) = self.load_file(file) {
                progress.finish();
                return Err(e);
            }
            progress.advance(i + 1, file.file_name().unwrap_or(file.as_str()));
        }
        progress.finish();

        log::info!("Loaded {} containers listed in {path}", files.len());
        Ok(files.len())
    }

    fn ingest(
        &mut self,
        container: SpectraContainer,
        source: &str,
    ) -> Result<(Dither, Detector), DecontamError> {
        let ValidatedContainer {
            dither,
            detector,
            field_id,
            exposure,
            products,
        } = container.into_products(source)?;

        if let Some(expected) = &self.field_id {
            if *expected != field_id {
                return Err(DecontamError::FieldMismatch {
                    expected: expected.clone(),
                    found: field_id,
                });
            }
        }

        log::info!(
            "Loaded {} spectra and {} models of dither {dither}, detector {detector} from {source}",
            products.spectra.len(),
            products.models.len(),
        );

        let detectors = self.products.entry(dither).or_default();
        if detectors.insert(detector, products).is_some() {
            log::warn!("Detector {detector} of dither {dither} was already loaded, replacing it");
        }
        self.exposures.insert(dither, exposure);
        self.field_id.get_or_insert(field_id);
        self.object_index.take();

        Ok((dither, detector))
    }

    /// Field of the loaded spectra, `None` before the first load.
    pub fn field_id(&self) -> Option<&str> {
        self.field_id.as_deref()
    }

    /// Loaded dithers, in increasing order.
    pub fn get_dithers(&self) -> Vec<Dither> {
        self.products.keys().copied().collect()
    }

    /// Loaded detectors of `dither`, in increasing order.
    pub fn get_detectors(&self, dither: Dither) -> Vec<Detector> {
        self.products
            .get(&dither)
            .map(|detectors| detectors.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Objects with a spectrum on `(dither, detector)`, in lexicographic order.
    pub fn get_object_ids(&self, dither: Dither, detector: Detector) -> Vec<&str> {
        self.detector_products(dither, detector)
            .map(|p| p.spectra.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn detector_products(&self, dither: Dither, detector: Detector) -> Option<&DetectorProducts> {
        self.products.get(&dither)?.get(&detector)
    }

    /// Spectrum of `object_id` on `(dither, detector)`, with its contamination layer
    /// materialized.
    ///
    /// Serving the same spectrum again returns the same contamination values.
    pub fn get_spectrum(
        &mut self,
        dither: Dither,
        detector: Detector,
        object_id: &str,
    ) -> Option<&DecontaminatedSpectrum> {
        let products = self.products.get_mut(&dither)?.get_mut(&detector)?;
        let spectrum = products.spectra.get_mut(object_id)?;
        materialize(spectrum, &products.models);
        Some(&*spectrum)
    }

    /// Spectrum of `object_id` on `(dither, detector)` as it stands. Its contamination
    /// layer may still be all zeros.
    pub(crate) fn peek_spectrum(
        &self,
        dither: Dither,
        detector: Detector,
        object_id: &str,
    ) -> Option<&DecontaminatedSpectrum> {
        self.detector_products(dither, detector)?
            .spectra
            .get(object_id)
    }

    /// Every spectrum of `(dither, detector)`, in object-id order.
    ///
    /// The sequence is lazy: each spectrum is materialized when the iterator reaches
    /// it. It is empty for an unknown pair, and a new call starts over.
    pub fn get_spectra(
        &mut self,
        dither: Dither,
        detector: Detector,
    ) -> impl Iterator<Item = &DecontaminatedSpectrum> + '_ {
        self.products
            .get_mut(&dither)
            .and_then(|detectors| detectors.get_mut(&detector))
            .into_iter()
            .flat_map(|products| {
                let DetectorProducts { spectra, models } = products;
                let models: &DetectorModels = models;
                spectra.values_mut().map(move |spectrum| {
                    materialize(spectrum, models);
                    &*spectrum
                })
            })
    }

    /// Model of `object_id` in `order` on `(dither, detector)`.
    ///
    /// Return
    /// ----------
    /// * [`DecontamError::InvalidOrder`] for the zeroth order, otherwise the model
    ///   or `None`.
    pub fn get_model(
        &self,
        dither: Dither,
        detector: Detector,
        object_id: &str,
        order: SpectralOrder,
    ) -> Result<Option<&ModelSpectrum>, DecontamError> {
        if order == SpectralOrder::Zeroth {
            return Err(DecontamError::InvalidOrder);
        }
        Ok(self
            .detector_products(dither, detector)
            .and_then(|p| p.models.get(object_id, order)))
    }

    /// Exposure metadata of `dither`.
    pub fn exposure(&self, dither: Dither) -> Result<&ExposureInfo, DecontamError> {
        self.exposures
            .get(&dither)
            .ok_or(DecontamError::UnknownDither(dither))
    }

    /// Exposure time of `dither`, in seconds.
    pub fn get_exposure_time(&self, dither: Dither) -> Result<f64, DecontamError> {
        Ok(self.exposure(dither)?.exposure_time)
    }

    pub fn get_grism_position(&self, dither: Dither) -> Result<&str, DecontamError> {
        Ok(&self.exposure(dither)?.grism_position)
    }

    pub fn get_exposure_id(&self, dither: Dither) -> Result<&str, DecontamError> {
        Ok(&self.exposure(dither)?.exposure_id)
    }

    /// Index of the `(dither, detector)` pairs holding each object, built on first use.
    pub fn object_index(&self) -> &ObjectIndex {
        self.object_index
            .get_or_init(|| ObjectIndex::build(&self.products))
    }

    /// Every `(dither, detector)` pair holding a spectrum of `object_id`, sorted.
    pub fn locate(&self, object_id: &str) -> Vec<(Dither, Detector)> {
        self.object_index().locate(object_id)
    }

    /// Every spectrum of `object_id`, materialized, with the pair it was found on.
    pub fn get_object_spectra(
        &mut self,
        object_id: &str,
    ) -> Vec<(Dither, Detector, &DecontaminatedSpectrum)> {
        let locations = self.locate(object_id);

        for &(dither, detector) in &locations {
            if let Some(products) = self
                .products
                .get_mut(&dither)
                .and_then(|detectors| detectors.get_mut(&detector))
            {
                if let Some(spectrum) = products.spectra.get_mut(object_id) {
                    materialize(spectrum, &products.models);
                }
            }
        }

        locations
            .into_iter()
            .filter_map(|(dither, detector)| {
                self.peek_spectrum(dither, detector, object_id)
                    .map(|spectrum| (dither, detector, spectrum))
            })
            .collect()
    }
}
