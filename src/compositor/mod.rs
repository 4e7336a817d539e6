//! # Contamination compositing
//!
//! Rebuilds the total contamination of a [`DecontaminatedSpectrum`] by summing the
//! model traces of every contaminant listed in its contaminant table.
//!
//! Each model lives in its own pixel frame. [`apply_contaminant`] places the model
//! and the target canvas in the shared detector frame, computes their overlap with
//! [`geometry::overlap`], and adds the overlapping model pixels onto the canvas. The
//! accumulation is a plain elementwise sum, so the result does not depend on the order
//! of the contaminants.
//!
//! Skipped contaminants
//! -----------------
//! * Zeroth-order entries: the undispersed image of a neighbour is never modeled.
//! * Entries whose model is absent from the lookup (not modeled, out of frame…).
//! * Models that do not intersect the canvas.
//!
//! None of these is an error.
//!
//! Materialize once
//! -----------------
//! The canvas is never reset between contributions, so a second pass would double the
//! contamination. [`materialize`] is guarded by the spectrum's
//! [`MaterializationState`] and runs at most once per spectrum.
pub mod geometry;

use ndarray::{s, ArrayView2, ArrayViewMut2};

use crate::constants::Pixel;
use crate::spectra::{
    DecontaminatedSpectrum, MaterializationState, ModelSpectrum, SpectralOrder,
};

use self::geometry::{overlap, PixelBox};

/// Source of contaminant models for one detector.
pub trait ModelLookup {
    /// Model of `object_id` in a first or second order, `None` if it was not modeled.
    fn find_model(&self, object_id: &str, order: SpectralOrder) -> Option<&ModelSpectrum>;
}

/// Add the part of `contaminant` that overlaps `canvas` onto `canvas`.
///
/// Arguments
/// -----------------
/// * `contaminant` – model pixels and the detector position of their lower-left pixel.
/// * `canvas` – accumulated contamination and the detector position of its lower-left pixel.
///
/// Return
/// ----------
/// * `true` if some pixels were added, `false` if the arrays do not intersect.
pub fn apply_contaminant(
    (contaminant, contaminant_offset): (ArrayView2<'_, Pixel>, (i64, i64)),
    (mut canvas, canvas_offset): (ArrayViewMut2<'_, Pixel>, (i64, i64)),
) -> bool {
    let contaminant_box =
        PixelBox::of_array(contaminant_offset.0, contaminant_offset.1, contaminant.dim());
    let canvas_box = PixelBox::of_array(canvas_offset.0, canvas_offset.1, canvas.dim());

    let Some(ov) = overlap(&contaminant_box, &canvas_box) else {
        return false;
    };

    let (src, dst) = (ov.first, ov.second);
    let mut target = canvas.slice_mut(s![dst.bottom..dst.top, dst.left..dst.right]);
    target += &contaminant.slice(s![src.bottom..src.top, src.left..src.right]);
    true
}

/// Fill the contamination layer of `spectrum` from the models found in `models`.
///
/// Does nothing if the spectrum is already materialized. A spectrum left in the
/// `Materializing` state by an interrupted pass has its canvas zeroed before the
/// contaminants are added again.
///
/// Return
/// ----------
/// * The number of contaminant models that overlapped the cutout during this call.
pub fn materialize<L: ModelLookup + ?Sized>(
    spectrum: &mut DecontaminatedSpectrum,
    models: &L,
) -> usize {
    match spectrum.state {
        MaterializationState::Materialized => return 0,
        MaterializationState::Materializing => {
            log::warn!(
                "contamination of {} was left half-built, rebuilding it",
                spectrum.id()
            );
            spectrum.contamination.fill(0.0);
        }
        MaterializationState::Unmaterialized => {}
    }
    spectrum.state = MaterializationState::Materializing;

    let canvas_offset = (spectrum.x_offset(), spectrum.y_offset());
    let (id, contaminants, mut canvas) = spectrum.canvas_parts();
    let mut applied = 0;

    for contaminant in contaminants {
        match contaminant.order {
            SpectralOrder::Zeroth => continue,
            SpectralOrder::First | SpectralOrder::Second => {
                let Some(model) = models.find_model(&contaminant.id, contaminant.order) else {
                    log::debug!(
                        "no order {} model for contaminant {} of {id}",
                        contaminant.order,
                        contaminant.id,
                    );
                    continue;
                };
                let added = apply_contaminant(
                    (model.pixels(), (model.x_offset(), model.y_offset())),
                    (canvas.view_mut(), canvas_offset),
                );
                if added {
                    applied += 1;
                }
            }
        }
    }

    spectrum.state = MaterializationState::Materialized;
    log::debug!(
        "materialized contamination of {} from {applied} contaminant(s)",
        spectrum.id()
    );
    applied
}

#[cfg(test)]
mod compositor_test {
    use ahash::RandomState;
    use ndarray::Array2;
    use std::collections::HashMap;

    use super::*;
    use crate::spectra::wavelength::{DispersionAxis, PolynomialSolution};
    use crate::spectra::Contaminant;

    type Models = HashMap<(String, SpectralOrder), ModelSpectrum, RandomState>;

    impl ModelLookup for Models {
        fn find_model(&self, object_id: &str, order: SpectralOrder) -> Option<&ModelSpectrum> {
            self.get(&(object_id.to_string(), order))
        }
    }

    fn model(id: &str, order: SpectralOrder, pixels: Array2<f32>, offset: (i64, i64)) -> ModelSpectrum {
        ModelSpectrum::new(id, order, pixels, offset).unwrap()
    }

    fn models(list: Vec<ModelSpectrum>) -> Models {
        list.into_iter()
            .map(|m| ((m.id().to_string(), m.order()), m))
            .collect()
    }

    fn target(contaminants: Vec<Contaminant>) -> DecontaminatedSpectrum {
        DecontaminatedSpectrum::new(
            "target",
            (0, 0),
            Array2::zeros((4, 4)),
            Array2::zeros((4, 4)),
            Array2::zeros((4, 4)),
            contaminants,
            PolynomialSolution::linear(DispersionAxis::X, 12_000.0, 10.0),
        )
        .unwrap()
    }

    #[test]
    fn test_corner_overlap() {
        let mut canvas = Array2::<f32>::zeros((4, 4));
        let contaminant = Array2::<f32>::ones((4, 4));

        let added = apply_contaminant((contaminant.view(), (2, 2)), (canvas.view_mut(), (0, 0)));
        assert!(added);

        for ((row, col), &value) in canvas.indexed_iter() {
            let expected = if row >= 2 && col >= 2 { 1.0 } else { 0.0 };
            assert_eq!(value, expected, "pixel ({row}, {col})");
        }
    }

    #[test]
    fn test_disjoint_contaminant_leaves_canvas_unchanged() {
        let mut canvas = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f32);
        let before = canvas.clone();
        let contaminant = Array2::<f32>::ones((3, 3));

        let added = apply_contaminant((contaminant.view(), (50, -20)), (canvas.view_mut(), (0, 0)));
        assert!(!added);
        assert_eq!(canvas, before);
    }

    #[test]
    fn test_extreme_offsets_are_ignored() {
        let mut canvas = Array2::<f32>::zeros((4, 4));
        let contaminant = Array2::<f32>::ones((4, 4));

        let added = apply_contaminant(
            (contaminant.view(), (i64::MAX - 1, 0)),
            (canvas.view_mut(), (-10, 0)),
        );
        assert!(!added);
        let added = apply_contaminant(
            (contaminant.view(), (0, i64::MIN)),
            (canvas.view_mut(), (0, 1)),
        );
        assert!(!added);
        assert_eq!(canvas.sum(), 0.0);
    }

    #[test]
    fn test_contained_contaminant_added_once() {
        let mut canvas = Array2::<f32>::zeros((10, 12));
        let contaminant = Array2::from_shape_fn((3, 4), |(r, c)| 1.0 + (r * 4 + c) as f32);

        apply_contaminant((contaminant.view(), (105, 52)), (canvas.view_mut(), (100, 50)));

        assert_eq!(canvas.sum(), contaminant.sum());
        assert_eq!(canvas.slice(s![2..5, 5..9]), contaminant);
    }

    #[test]
    fn test_accumulation_is_commutative() {
        let a = Array2::from_shape_fn((3, 5), |(r, c)| 0.5 + r as f32 + 0.25 * c as f32);
        let b = Array2::from_shape_fn((6, 2), |(r, c)| 2.0 - 0.125 * (r + c) as f32);

        let mut ab = Array2::<f32>::zeros((5, 5));
        apply_contaminant((a.view(), (1, -1)), (ab.view_mut(), (0, 0)));
        apply_contaminant((b.view(), (3, 1)), (ab.view_mut(), (0, 0)));

        let mut ba = Array2::<f32>::zeros((5, 5));
        apply_contaminant((b.view(), (3, 1)), (ba.view_mut(), (0, 0)));
        apply_contaminant((a.view(), (1, -1)), (ba.view_mut(), (0, 0)));

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_materialize_runs_once() {
        let lookup = models(vec![model(
            "7",
            SpectralOrder::First,
            Array2::ones((4, 4)),
            (2, 2),
        )]);
        let mut spectrum = target(vec![Contaminant::new("7", SpectralOrder::First)]);

        assert_eq!(materialize(&mut spectrum, &lookup), 1);
        assert_eq!(spectrum.state(), MaterializationState::Materialized);
        let first = spectrum.contamination().to_owned();

        assert_eq!(materialize(&mut spectrum, &lookup), 0);
        assert_eq!(spectrum.contamination(), first);
        assert_eq!(first.sum(), 4.0);
    }

    #[test]
    fn test_materialize_skips_zeroth_order_and_missing_models() {
        let lookup = models(vec![
            model("7", SpectralOrder::First, Array2::ones((4, 4)), (0, 0)),
            model("8", SpectralOrder::Second, Array2::from_elem((2, 2), 3.0), (1, 1)),
        ]);
        let mut spectrum = target(vec![
            Contaminant::new("7", SpectralOrder::Zeroth),
            Contaminant::new("9", SpectralOrder::First),
            Contaminant::new("8", SpectralOrder::Second),
            Contaminant::new("8", SpectralOrder::First),
        ]);

        assert_eq!(materialize(&mut spectrum, &lookup), 1);
        assert_eq!(spectrum.contamination().sum(), 12.0);
        assert_eq!(spectrum.contamination()[[1, 1]], 3.0);
        assert_eq!(spectrum.contamination()[[0, 0]], 0.0);
    }

    #[test]
    fn test_interrupted_materialization_is_rebuilt_from_zero() {
        let lookup = models(vec![model(
            "7",
            SpectralOrder::First,
            Array2::ones((4, 4)),
            (0, 0),
        )]);
        let mut spectrum = target(vec![Contaminant::new("7", SpectralOrder::First)]);
        spectrum.contamination.fill(5.0);
        spectrum.state = MaterializationState::Materializing;

        materialize(&mut spectrum, &lookup);
        assert!(spectrum.contamination().iter().all(|&v| v == 1.0));
    }
}
