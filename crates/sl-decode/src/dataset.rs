//! Shared input validation and target encoding for the classifiers.

use nalgebra::DMatrix;
use sl_core::{Error, Result};

/// Maps string targets to dense class indices, in sorted label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the sorted set of distinct labels.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Distinct labels; index `k` is class `k`.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Encode labels to class indices.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|s| {
                let s = s.as_ref();
                self.classes
                    .binary_search_by(|c| c.as_str().cmp(s))
                    .map_err(|_| Error::Validation(format!("unknown label '{s}'")))
            })
            .collect()
    }
}

pub(crate) fn validate_xy(x: &DMatrix<f64>, y: &[usize]) -> Result<()> {
    if x.nrows() == 0 {
        return Err(Error::Validation("X/y must be non-empty".to_string()));
    }
    if x.ncols() == 0 {
        return Err(Error::Validation("X must have at least 1 feature column".to_string()));
    }
    if y.len() != x.nrows() {
        return Err(Error::Validation(format!(
            "y has wrong length: expected n={}, got {}",
            x.nrows(),
            y.len()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::Validation("X must contain only finite values".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_predict(x: &DMatrix<f64>, n_features: usize, who: &str) -> Result<()> {
    if n_features == 0 {
        return Err(Error::Computation(format!("{who}: predict called before fit")));
    }
    if x.ncols() != n_features {
        return Err(Error::Validation(format!(
            "{who}: expected {} features, got {}",
            n_features,
            x.ncols()
        )));
    }
    Ok(())
}

/// Sorted distinct class indices present in `y`.
pub(crate) fn distinct_classes(y: &[usize]) -> Vec<usize> {
    let mut c = y.to_vec();
    c.sort_unstable();
    c.dedup();
    c
}

/// The two classes of a binary problem, `[negative, positive]`.
pub(crate) fn binary_classes(y: &[usize], who: &str) -> Result<[usize; 2]> {
    match distinct_classes(y).as_slice() {
        [a, b] => Ok([*a, *b]),
        other => Err(Error::Validation(format!(
            "{who} needs exactly 2 classes in the training fold, got {}",
            other.len()
        ))),
    }
}

/// Population variance over every entry of `x` (numpy's `X.var()`).
pub(crate) fn total_variance(x: &DMatrix<f64>) -> f64 {
    let n = x.len() as f64;
    let mean = x.sum() / n;
    x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_sorts_labels() {
        let enc = LabelEncoder::fit(&["word", "pseudoword", "word"]);
        assert_eq!(enc.classes(), &["pseudoword".to_string(), "word".to_string()]);
        assert_eq!(enc.encode(&["word", "pseudoword"]).unwrap(), vec![1, 0]);
        assert!(enc.encode(&["nonword"]).is_err());
    }

    #[test]
    fn binary_classes_rejects_single_class() {
        assert_eq!(binary_classes(&[3, 1, 3], "t").unwrap(), [1, 3]);
        assert!(binary_classes(&[1, 1], "t").is_err());
        assert!(binary_classes(&[0, 1, 2], "t").is_err());
    }

    #[test]
    fn validate_rejects_nan() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        assert!(validate_xy(&x, &[0, 1]).is_err());
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        assert!(validate_xy(&x, &[0]).is_err());
        assert!(validate_xy(&x, &[0, 1]).is_ok());
    }
}
