use std::collections::{BTreeMap, BTreeSet, HashMap};

use ahash::RandomState;

use crate::constants::{Detector, Dither, ObjectId};

use super::DetectorProducts;

/// Where each object appears: `object-id → dither → detectors`.
///
/// Holds keys only; the spectra stay owned by the store.
#[derive(Debug, Default, Clone)]
pub struct ObjectIndex {
    locations: HashMap<ObjectId, BTreeMap<Dither, BTreeSet<Detector>>, RandomState>,
}

impl ObjectIndex {
    pub(crate) fn build(products: &BTreeMap<Dither, BTreeMap<Detector, DetectorProducts>>) -> Self {
        let mut locations: HashMap<ObjectId, BTreeMap<Dither, BTreeSet<Detector>>, RandomState> =
            HashMap::default();

        for (&dither, detectors) in products {
            for (&detector, detector_products) in detectors {
                for object_id in detector_products.spectra.keys() {
                    locations
                        .entry(object_id.clone())
                        .or_default()
                        .entry(dither)
                        .or_default()
                        .insert(detector);
                }
            }
        }
        ObjectIndex { locations }
    }

    /// Every `(dither, detector)` pair holding a spectrum of `object_id`, sorted.
    pub fn locate(&self, object_id: &str) -> Vec<(Dither, Detector)> {
        self.locations
            .get(object_id)
            .map(|dithers| {
                dithers
                    .iter()
                    .flat_map(|(&dither, detectors)| detectors.iter().map(move |&d| (dither, d)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Detectors of `dither` holding a spectrum of `object_id`.
    pub fn detectors(&self, object_id: &str, dither: Dither) -> Option<&BTreeSet<Detector>> {
        self.locations.get(object_id)?.get(&dither)
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.locations.contains_key(object_id)
    }

    /// Number of distinct objects.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
