//! Predefined train/test splits.
//!
//! A split is a vector of fold codes, one per selected trial: `-1` keeps the
//! trial in every training set, `k >= 0` places it in test fold `k`. Each
//! distinct `k` yields one (train, test) pair, in ascending `k`.

use sl_core::{Error, Fold, Result};

/// Cross-validation iterator driven by fixed fold codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedSplit {
    codes: Vec<i32>,
    folds: Vec<i32>,
}

impl PredefinedSplit {
    /// Validate `codes` and build the split.
    pub fn new(codes: Vec<i32>) -> Result<Self> {
        if let Some(bad) = codes.iter().find(|&&c| c < -1) {
            return Err(Error::Validation(format!("invalid fold code {bad}")));
        }
        let mut folds: Vec<i32> = codes.iter().copied().filter(|&c| c >= 0).collect();
        folds.sort_unstable();
        folds.dedup();
        if folds.is_empty() {
            return Err(Error::Validation("predefined split has no test fold".into()));
        }
        let split = Self { codes, folds };
        for &k in &split.folds {
            if split.codes.iter().all(|&c| c == k) {
                return Err(Error::Validation(format!("fold {k} leaves no training samples")));
            }
        }
        Ok(split)
    }

    /// Build from typed fold assignments.
    pub fn from_folds(folds: &[Fold]) -> Result<Self> {
        Self::new(folds.iter().map(|f| f.code()).collect())
    }

    /// Number of (train, test) pairs.
    pub fn n_splits(&self) -> usize {
        self.folds.len()
    }

    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the split covers no samples (never true once built).
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Fold codes.
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// `(train, test)` sample indices for each fold.
    pub fn splits(&self) -> impl Iterator<Item = (Vec<usize>, Vec<usize>)> + '_ {
        self.folds.iter().map(move |&k| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..self.codes.len()).partition(|&i| self.codes[i] == k);
            (train, test)
        })
    }
}
