//! Searchlight over a synthetic volume with a separable cube inside the mask.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sl_core::{ClassifierKind, Fold};
use sl_decode::{CatalogTemplate, PredefinedSplit, SearchLight, SearchLightConfig};
use sl_nifti::{Affine, NiftiImage};

const AFFINE: Affine =
    [[2.0, 0.0, 0.0, -4.0], [0.0, 2.0, 0.0, -4.0], [0.0, 0.0, 2.0, -4.0], [0.0, 0.0, 0.0, 1.0]];
const SHAPE: [usize; 3] = [5, 5, 5];

fn lin(i: usize, j: usize, k: usize) -> usize {
    i + SHAPE[0] * (j + SHAPE[1] * k)
}

/// Mask = central 3x3x3 cube. Every voxel in the cube encodes the class.
fn dataset(n_trials: usize) -> (NiftiImage, NiftiImage, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(21);
    let v: usize = SHAPE.iter().product();
    let mut mask = vec![0f32; v];
    for k in 1..4 {
        for j in 1..4 {
            for i in 1..4 {
                mask[lin(i, j, k)] = 1.0;
            }
        }
    }
    let targets: Vec<usize> = (0..n_trials).map(|t| t % 2).collect();
    let mut data = Vec::with_capacity(v * n_trials);
    for &y in &targets {
        for &m in &mask {
            let signal = if m > 0.0 && y == 1 { 1.0 } else if m > 0.0 { -1.0 } else { 0.0 };
            data.push(signal + rng.random_range(-0.1f32..0.1));
        }
    }
    let betas = NiftiImage::from_volumes(SHAPE, n_trials, &AFFINE, data).unwrap();
    let mask = betas.like(mask).unwrap();
    (betas, mask, targets)
}

fn split(n_trials: usize, n_test: usize) -> PredefinedSplit {
    let folds: Vec<Fold> =
        (0..n_trials).map(|t| if t + n_test < n_trials { Fold::Train } else { Fold::Test(0) }).collect();
    PredefinedSplit::from_folds(&folds).unwrap()
}

#[test]
fn separable_cube_scores_one_inside_zero_outside() {
    let (betas, mask, targets) = dataset(20);
    let split = split(20, 8);
    let sl = SearchLight::new(SearchLightConfig { radius_mm: 4.0, threads: 2 });
    for kind in [ClassifierKind::SvcLinear, ClassifierKind::Lda, ClassifierKind::Gbc] {
        let out = sl
            .fit_score(&betas, &mask, &targets, &split, &CatalogTemplate::new(kind, 21))
            .unwrap();
        assert_eq!(out.n_spheres, 27, "{kind}");
        assert_eq!(out.mean_accuracy, 1.0, "{kind}");
        for (idx, (&score, &m)) in out.scores.iter().zip(mask.data()).enumerate() {
            if m > 0.0 {
                assert_eq!(score, 1.0, "{kind} voxel {idx}");
            } else {
                assert_eq!(score, 0.0, "{kind} voxel {idx}");
            }
        }
    }
}

#[test]
fn global_and_dedicated_pools_agree() {
    let (betas, mask, targets) = dataset(16);
    let split = split(16, 6);
    let template = CatalogTemplate::new(ClassifierKind::SvcRbf, 21);
    let a = SearchLight::new(SearchLightConfig { radius_mm: 4.0, threads: 0 })
        .fit_score(&betas, &mask, &targets, &split, &template)
        .unwrap();
    let b = SearchLight::new(SearchLightConfig { radius_mm: 4.0, threads: 3 })
        .fit_score(&betas, &mask, &targets, &split, &template)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn mask_grid_must_match_betas() {
    let (betas, _, targets) = dataset(8);
    let other = NiftiImage::from_volumes([4, 5, 5], 1, &AFFINE, vec![1.0; 100]).unwrap();
    let err = SearchLight::default()
        .fit_score(&betas, &other, &targets, &split(8, 2), &CatalogTemplate::new(ClassifierKind::Lda, 21))
        .unwrap_err();
    assert!(err.to_string().contains("grid"), "{err}");
}
