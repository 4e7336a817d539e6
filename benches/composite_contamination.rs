use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ndarray::Array2;

use decontam::compositor::{apply_contaminant, materialize};
use decontam::spectra::wavelength::{DispersionAxis, PolynomialSolution};
use decontam::spectra::{Contaminant, DecontaminatedSpectrum, ModelSpectrum, SpectralOrder};
use decontam::store::DetectorModels;

/// Target cutout surrounded by `n` first-order neighbours on a ring.
fn crowded_field(n: usize) -> (DecontaminatedSpectrum, DetectorModels) {
    let mut models = DetectorModels::default();
    let mut contaminants = Vec::with_capacity(n);

    for i in 0..n {
        let id = format!("n{i}");
        let angle = i as f64 / n as f64 * std::f64::consts::TAU;
        let offset = (
            (200.0 + 150.0 * angle.cos()) as i64,
            (40.0 + 30.0 * angle.sin()) as i64,
        );
        let pixels = Array2::from_elem((40, 400), 0.01f32);
        if let Ok(model) = ModelSpectrum::new(id.clone(), SpectralOrder::First, pixels, offset) {
            models.insert(model);
        }
        contaminants.push(Contaminant::new(id, SpectralOrder::First));
    }

    let target = DecontaminatedSpectrum::new(
        "target",
        (200, 40),
        Array2::zeros((40, 400)),
        Array2::zeros((40, 400)),
        Array2::zeros((40, 400)),
        contaminants,
        PolynomialSolution::linear(DispersionAxis::X, 12_000.0, 13.4),
    )
    .expect("valid cutout");

    (target, models)
}

fn bench_apply_contaminant(c: &mut Criterion) {
    let contaminant = Array2::from_elem((40, 400), 1.0f32);
    let mut canvas = Array2::<f32>::zeros((40, 400));

    c.bench_function("apply_contaminant/half_overlap", |b| {
        b.iter(|| {
            apply_contaminant(
                (black_box(contaminant.view()), (200, 20)),
                (canvas.view_mut(), (0, 0)),
            )
        })
    });
}

fn bench_materialize(c: &mut Criterion) {
    for n in [8usize, 64] {
        let (target, models) = crowded_field(n);
        c.bench_function(&format!("materialize/{n}_contaminants"), |b| {
            b.iter_batched(
                || target.clone(),
                |mut spectrum| {
                    let applied = materialize(&mut spectrum, &models);
                    black_box((applied, spectrum))
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_apply_contaminant, bench_materialize);
criterion_main!(benches);
