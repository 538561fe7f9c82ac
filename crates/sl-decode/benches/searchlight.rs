use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sl_core::{ClassifierKind, Fold};
use sl_decode::{CatalogTemplate, PredefinedSplit, SearchLight, SearchLightConfig, SphereIndex};
use sl_nifti::{Affine, NiftiImage};
use std::hint::black_box;

const AFFINE: Affine =
    [[2.0, 0.0, 0.0, -20.0], [0.0, 2.0, 0.0, -20.0], [0.0, 0.0, 2.0, -20.0], [0.0, 0.0, 0.0, 1.0]];

/// `n_trials` noisy volumes on an `edge`³ grid; half the trials shift every voxel.
fn synthetic(edge: usize, n_trials: usize) -> (NiftiImage, NiftiImage, Vec<usize>, PredefinedSplit) {
    let mut rng = StdRng::seed_from_u64(7);
    let v = edge * edge * edge;
    let targets: Vec<usize> = (0..n_trials).map(|t| t % 2).collect();
    let mut data = Vec::with_capacity(v * n_trials);
    for &y in &targets {
        for _ in 0..v {
            data.push(rng.random::<f32>() + y as f32 * 0.5);
        }
    }
    let betas = NiftiImage::from_volumes([edge, edge, edge], n_trials, &AFFINE, data).unwrap();
    let mask = betas.like(vec![1.0; v]).unwrap();
    let folds: Vec<Fold> =
        (0..n_trials).map(|t| if t < n_trials * 3 / 4 { Fold::Train } else { Fold::Test(0) }).collect();
    (betas, mask, targets, PredefinedSplit::from_folds(&folds).unwrap())
}

fn bench_sphere_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere_index");
    for edge in [16usize, 32] {
        let mask: Vec<usize> = (0..edge * edge * edge).collect();
        group.bench_with_input(BenchmarkId::from_parameter(edge), &edge, |b, &edge| {
            b.iter(|| SphereIndex::new([edge; 3], &AFFINE, black_box(&mask), 4.0).unwrap())
        });
    }
    group.finish();
}

fn bench_searchlight(c: &mut Criterion) {
    let (betas, mask, targets, split) = synthetic(8, 40);
    let sl = SearchLight::new(SearchLightConfig { radius_mm: 4.0, threads: 0 });
    let mut group = c.benchmark_group("searchlight/8^3x40");
    group.sample_size(10);
    for kind in [ClassifierKind::SvcLinear, ClassifierKind::Lda, ClassifierKind::Gnb] {
        let template = CatalogTemplate::new(kind, 21);
        group.bench_function(kind.token(), |b| {
            b.iter(|| sl.fit_score(black_box(&betas), &mask, &targets, &split, &template).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sphere_index, bench_searchlight);
criterion_main!(benches);
