//! Gaussian naive Bayes.

use nalgebra::DMatrix;
use sl_core::{Classifier, Error, Result};

use crate::dataset::{distinct_classes, validate_predict, validate_xy};
use crate::lda::argmax;

/// Fraction of the largest feature variance added to every variance.
const VAR_SMOOTHING: f64 = 1e-9;

#[derive(Debug, Clone)]
struct GnbModel {
    classes: Vec<usize>,
    log_prior: Vec<f64>,
    /// K × p
    means: DMatrix<f64>,
    /// K × p, smoothed
    vars: DMatrix<f64>,
}

/// Per-class independent Gaussian likelihoods.
#[derive(Debug, Clone, Default)]
pub struct GaussianNb {
    model: Option<GnbModel>,
}

impl GaussianNb {
    /// Unfitted model.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for GaussianNb {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[usize]) -> Result<()> {
        validate_xy(x, y)?;
        let classes = distinct_classes(y);
        if classes.len() < 2 {
            return Err(Error::Validation("GNB needs at least 2 classes in the training fold".into()));
        }
        let (n, p) = x.shape();
        let k = classes.len();

        let max_var = (0..p)
            .map(|f| {
                let col = x.column(f);
                let m = col.mean();
                col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64
            })
            .fold(0.0, f64::max);
        let eps = VAR_SMOOTHING * max_var;

        let mut means = DMatrix::zeros(k, p);
        let mut vars = DMatrix::zeros(k, p);
        let mut log_prior = Vec::with_capacity(k);
        for (ci, &c) in classes.iter().enumerate() {
            let rows: Vec<usize> = (0..n).filter(|&i| y[i] == c).collect();
            let sub = x.select_rows(rows.iter());
            for f in 0..p {
                let col = sub.column(f);
                let m = col.mean();
                means[(ci, f)] = m;
                vars[(ci, f)] = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / rows.len() as f64 + eps;
            }
            log_prior.push((rows.len() as f64 / n as f64).ln());
        }
        // A zero-variance fit (all features constant) would divide by zero.
        if vars.iter().any(|v| *v <= 0.0) {
            vars.apply(|v| *v = v.max(f64::MIN_POSITIVE));
        }

        self.model = Some(GnbModel { classes, log_prior, means, vars });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>> {
        let n_features = self.model.as_ref().map(|m| m.means.ncols()).unwrap_or(0);
        validate_predict(x, n_features, self.name())?;
        let Some(m) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        let two_pi = 2.0 * std::f64::consts::PI;
        Ok(x.row_iter()
            .map(|row| {
                let joint = (0..m.classes.len()).map(|ci| {
                    let ll: f64 = row
                        .iter()
                        .enumerate()
                        .map(|(f, v)| {
                            let var = m.vars[(ci, f)];
                            -0.5 * (two_pi * var).ln() - (v - m.means[(ci, f)]).powi(2) / (2.0 * var)
                        })
                        .sum();
                    m.log_prior[ci] + ll
                });
                m.classes[argmax(joint)]
            })
            .collect())
    }

    fn name(&self) -> &str {
        "GNB"
    }
}
