//! Binary gradient boosting on the binomial deviance.
//!
//! `F_0 = ln(p / (1 - p))` with `p` the positive-class prior; each stage fits
//! a [`RegressionTree`] to the residuals `y - sigmoid(F)` and replaces every
//! leaf with the Newton step `Σ r / Σ p (1 - p)`.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sl_core::{Classifier, Result};

use crate::dataset::{binary_classes, validate_predict, validate_xy};
use crate::tree::{RegressionTree, TreeParams};

/// Boosting hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbcConfig {
    /// Boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to every stage
    pub learning_rate: f64,
    /// Fraction of rows drawn (without replacement) per stage
    pub subsample: f64,
    /// Weak learner limits
    pub tree: TreeParams,
    /// Seed for row subsampling
    pub seed: u64,
}

impl Default for GbcConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            subsample: 1.0,
            tree: TreeParams::default(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct GbcModel {
    classes: [usize; 2],
    n_features: usize,
    init: f64,
    trees: Vec<RegressionTree>,
}

/// Gradient-boosted decision trees for two classes.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    config: GbcConfig,
    model: Option<GbcModel>,
}

impl GradientBoosting {
    /// Unfitted model.
    pub fn new(config: GbcConfig) -> Self {
        Self { config, model: None }
    }

    /// Raw scores `F(x)` (log-odds of the larger class index).
    pub fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        let n_features = self.model.as_ref().map(|m| m.n_features).unwrap_or(0);
        validate_predict(x, n_features, self.name())?;
        let Some(m) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        let lr = self.config.learning_rate;
        Ok((0..x.nrows())
            .map(|r| m.init + lr * m.trees.iter().map(|t| t.predict_row(x, r)).sum::<f64>())
            .collect())
    }
}

impl Classifier for GradientBoosting {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[usize]) -> Result<()> {
        validate_xy(x, y)?;
        let classes = binary_classes(y, self.name())?;
        let n = y.len();
        let yb: Vec<f64> = y.iter().map(|&c| if c == classes[1] { 1.0 } else { 0.0 }).collect();

        let prior = yb.iter().sum::<f64>() / n as f64;
        let init = (prior / (1.0 - prior)).ln();
        let cfg = self.config;

        let n_draw = ((cfg.subsample * n as f64) as usize).clamp(1, n);
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let all_rows: Vec<usize> = (0..n).collect();

        let mut raw = vec![init; n];
        let mut trees = Vec::with_capacity(cfg.n_estimators);
        for _ in 0..cfg.n_estimators {
            let prob: Vec<f64> = raw.iter().map(|&f| sigmoid(f)).collect();
            let resid: Vec<f64> = yb.iter().zip(&prob).map(|(y, p)| y - p).collect();

            let rows = if n_draw < n {
                let mut r = rand::seq::index::sample(&mut rng, n, n_draw).into_vec();
                r.sort_unstable();
                r
            } else {
                all_rows.clone()
            };

            let tree = RegressionTree::fit(x, &resid, &rows, cfg.tree, |leaf| {
                let num: f64 = leaf.iter().map(|&i| resid[i]).sum();
                let den: f64 = leaf.iter().map(|&i| prob[i] * (1.0 - prob[i])).sum();
                if den.abs() < 1e-150 { 0.0 } else { num / den }
            });
            for (r, f) in raw.iter_mut().enumerate() {
                *f += cfg.learning_rate * tree.predict_row(x, r);
            }
            trees.push(tree);
        }

        self.model = Some(GbcModel { classes, n_features: x.ncols(), init, trees });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>> {
        let f = self.decision_function(x)?;
        let Some(m) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(f.into_iter().map(|v| if v > 0.0 { m.classes[1] } else { m.classes[0] }).collect())
    }

    fn name(&self) -> &str {
        "GBC"
    }
}

#[inline]
fn sigmoid(f: f64) -> f64 {
    1.0 / (1.0 + (-f).exp())
}
