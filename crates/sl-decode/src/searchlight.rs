//! Searchlight decoding: cross-validated accuracy of a fresh classifier in
//! every sphere of the mask.
//!
//! Each sphere's score is the mean test accuracy over the folds of a
//! [`PredefinedSplit`]. Voxels outside the mask score `0`.

use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::DMatrix;
use rayon::prelude::*;
use sl_core::{ClassifierTemplate, Error, Result};
use sl_nifti::NiftiImage;

use crate::metrics::accuracy;
use crate::sphere::SphereIndex;
use crate::split::PredefinedSplit;

/// Searchlight settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLightConfig {
    /// Sphere radius in world units (mm)
    pub radius_mm: f64,
    /// Worker threads; `0` uses the global rayon pool
    pub threads: usize,
}

impl Default for SearchLightConfig {
    fn default() -> Self {
        Self { radius_mm: 4.0, threads: 0 }
    }
}

/// Per-voxel scores of one searchlight pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLightScores {
    /// One value per voxel of the grid (x fastest); 0 outside the mask
    pub scores: Vec<f32>,
    /// Spheres evaluated
    pub n_spheres: usize,
    /// Mean score over the spheres
    pub mean_accuracy: f64,
}

/// Searchlight runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLight {
    config: SearchLightConfig,
}

impl SearchLight {
    /// Runner with the given settings.
    pub fn new(config: SearchLightConfig) -> Self {
        Self { config }
    }

    /// Settings.
    pub fn config(&self) -> &SearchLightConfig {
        &self.config
    }

    /// Score every sphere of `mask` on `betas`.
    ///
    /// `betas` holds one volume per selected trial, `targets` and `split`
    /// one entry per volume. `mask` must share the grid of `betas`.
    ///
    /// # Thread pool
    /// If `threads > 0` a dedicated rayon pool runs the spheres; otherwise
    /// the global pool does.
    pub fn fit_score(
        &self,
        betas: &NiftiImage,
        mask: &NiftiImage,
        targets: &[usize],
        split: &PredefinedSplit,
        template: &dyn ClassifierTemplate,
    ) -> Result<SearchLightScores> {
        let shape = betas.spatial_shape();
        if mask.spatial_shape() != shape {
            return Err(Error::Validation(format!(
                "mask grid {:?} differs from beta grid {:?}",
                mask.spatial_shape(),
                shape
            )));
        }
        let n_trials = betas.n_volumes();
        if targets.len() != n_trials || split.len() != n_trials {
            return Err(Error::Validation(format!(
                "{} volumes but {} targets and {} fold codes",
                n_trials,
                targets.len(),
                split.len()
            )));
        }

        let mask_voxels = mask.nonzero_voxels();
        if mask_voxels.is_empty() {
            return Err(Error::Validation("mask has no non-zero voxels".into()));
        }
        let spheres = SphereIndex::new(shape, &betas.affine(), &mask_voxels, self.config.radius_mm)?;
        let folds: Vec<(Vec<usize>, Vec<usize>)> = split.splits().collect();

        tracing::debug!(
            classifier = template.token(),
            spheres = spheres.n_spheres(),
            mean_sphere_size = spheres.mean_size(),
            folds = folds.len(),
            "searchlight started"
        );

        let n = spheres.n_spheres();
        let step = (n / 10).max(1);
        let done = AtomicUsize::new(0);
        let score_all = || -> Result<Vec<f32>> {
            (0..n)
                .into_par_iter()
                .map(|s| {
                    let acc = score_sphere(betas, spheres.members(s), targets, &folds, template)?;
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % step == 0 || finished == n {
                        tracing::debug!(finished, total = n, "searchlight progress");
                    }
                    Ok(acc as f32)
                })
                .collect()
        };

        let sphere_scores = if self.config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| Error::Computation(format!("failed to create thread pool: {e}")))?;
            pool.install(score_all)?
        } else {
            score_all()?
        };

        let mut scores = vec![0f32; betas.voxels_per_volume()];
        for (&c, &v) in spheres.centres().iter().zip(&sphere_scores) {
            scores[c] = v;
        }
        let mean_accuracy =
            sphere_scores.iter().map(|&v| f64::from(v)).sum::<f64>() / sphere_scores.len() as f64;

        Ok(SearchLightScores { scores, n_spheres: n, mean_accuracy })
    }
}

/// Mean test accuracy over `folds` using the voxels `members` as features.
fn score_sphere(
    betas: &NiftiImage,
    members: &[usize],
    targets: &[usize],
    folds: &[(Vec<usize>, Vec<usize>)],
    template: &dyn ClassifierTemplate,
) -> Result<f64> {
    let v = betas.voxels_per_volume();
    let data = betas.data();
    let features = |rows: &[usize]| {
        DMatrix::from_fn(rows.len(), members.len(), |r, f| f64::from(data[rows[r] * v + members[f]]))
    };

    let mut total = 0.0;
    for (train, test) in folds {
        let y_train: Vec<usize> = train.iter().map(|&i| targets[i]).collect();
        let y_test: Vec<usize> = test.iter().map(|&i| targets[i]).collect();
        let mut clf = template.instantiate();
        clf.fit(&features(train), &y_train)?;
        let pred = clf.predict(&features(test))?;
        total += accuracy(&y_test, &pred)?;
    }
    Ok(total / folds.len() as f64)
}
