//! Linear discriminant analysis with a pooled within-class covariance.
//!
//! `delta_k(x) = xᵀ Σ⁺ mu_k - 0.5 mu_kᵀ Σ⁺ mu_k + ln pi_k`, where `Σ` is the
//! within-class scatter divided by `n - K` and `Σ⁺` its pseudo-inverse, so
//! rank-deficient spheres (more voxels than trials, constant voxels) still fit.

use nalgebra::{DMatrix, DVector};
use sl_core::{Classifier, Error, Result};

use crate::dataset::{distinct_classes, validate_predict, validate_xy};

#[derive(Debug, Clone)]
struct LdaModel {
    classes: Vec<usize>,
    /// p × K discriminant weights
    coef: DMatrix<f64>,
    /// K intercepts
    intercept: DVector<f64>,
}

/// Multi-class LDA (no shrinkage).
#[derive(Debug, Clone, Default)]
pub struct LinearDiscriminant {
    model: Option<LdaModel>,
}

impl LinearDiscriminant {
    /// Unfitted model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discriminant scores, one row per sample and one column per class.
    pub fn decision_scores(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let n_features = self.model.as_ref().map(|m| m.coef.nrows()).unwrap_or(0);
        validate_predict(x, n_features, self.name())?;
        let m = self
            .model
            .as_ref()
            .ok_or_else(|| Error::Computation("LDA: predict called before fit".into()))?;
        let mut scores = x * &m.coef;
        for mut row in scores.row_iter_mut() {
            row += m.intercept.transpose();
        }
        Ok(scores)
    }
}

impl Classifier for LinearDiscriminant {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[usize]) -> Result<()> {
        validate_xy(x, y)?;
        let classes = distinct_classes(y);
        if classes.len() < 2 {
            return Err(Error::Validation("LDA needs at least 2 classes in the training fold".into()));
        }
        let (n, p) = x.shape();
        let k = classes.len();

        let mut means = DMatrix::<f64>::zeros(p, k);
        let mut counts = vec![0usize; k];
        for (i, &c) in y.iter().enumerate() {
            let col = classes.binary_search(&c).unwrap_or_default();
            counts[col] += 1;
            let mut m = means.column_mut(col);
            m += x.row(i).transpose();
        }
        for (col, &cnt) in counts.iter().enumerate() {
            means.column_mut(col).unscale_mut(cnt as f64);
        }

        let mut centered = x.clone();
        for (i, &c) in y.iter().enumerate() {
            let col = classes.binary_search(&c).unwrap_or_default();
            let mut row = centered.row_mut(i);
            row -= means.column(col).transpose();
        }
        let dof = if n > k { (n - k) as f64 } else { n as f64 };
        let sigma = (centered.transpose() * &centered).unscale(dof);

        let svd = sigma.svd(true, true);
        let max_sv = svd.singular_values.max();
        let tol = max_sv * p as f64 * f64::EPSILON;
        let precision = svd
            .pseudo_inverse(tol)
            .map_err(|e| Error::Computation(format!("LDA: pseudo-inverse failed: {e}")))?;

        let coef = &precision * &means;
        let intercept = DVector::from_fn(k, |col, _| {
            let quad = means.column(col).dot(&coef.column(col));
            -0.5 * quad + (counts[col] as f64 / n as f64).ln()
        });

        self.model = Some(LdaModel { classes, coef, intercept });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>> {
        let scores = self.decision_scores(x)?;
        let Some(m) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(scores.row_iter().map(|row| m.classes[argmax(row.iter().copied())]).collect())
    }

    fn name(&self) -> &str {
        "LDA"
    }
}

/// Index of the first maximum.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_v = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_v {
            best = i;
            best_v = v;
        }
    }
    best
}
