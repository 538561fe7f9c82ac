//! k-nearest-neighbours majority vote.

use nalgebra::DMatrix;
use sl_core::{Classifier, Result};

use crate::dataset::{validate_predict, validate_xy};

/// Euclidean k-NN. Vote ties go to the smallest class index.
#[derive(Debug, Clone)]
pub struct KNearest {
    k: usize,
    train_x: Option<DMatrix<f64>>,
    train_y: Vec<usize>,
}

impl KNearest {
    /// Unfitted model with `k` neighbours (at least 1).
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1), train_x: None, train_y: Vec::new() }
    }
}

impl Default for KNearest {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Classifier for KNearest {
    fn fit(&mut self, x: &DMatrix<f64>, y: &[usize]) -> Result<()> {
        validate_xy(x, y)?;
        self.train_x = Some(x.clone());
        self.train_y = y.to_vec();
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>> {
        let n_features = self.train_x.as_ref().map(|t| t.ncols()).unwrap_or(0);
        validate_predict(x, n_features, self.name())?;
        let Some(train) = self.train_x.as_ref() else {
            return Ok(Vec::new());
        };
        let k = self.k.min(train.nrows());
        let n_classes = self.train_y.iter().max().map_or(0, |m| m + 1);

        Ok(x.row_iter()
            .map(|q| {
                let mut dist: Vec<(f64, usize)> = train
                    .row_iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let d2: f64 = t.iter().zip(q.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                        (d2, i)
                    })
                    .collect();
                // Stable on equal distances: earlier training rows win.
                dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                let mut votes = vec![0usize; n_classes];
                for &(_, i) in &dist[..k] {
                    votes[self.train_y[i]] += 1;
                }
                let top = votes.iter().copied().max().unwrap_or(0);
                votes.iter().position(|&v| v == top).unwrap_or(0)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "KNN"
    }
}
