//! Core traits for slmvpa
//!
//! The searchlight engine only sees these traits; concrete models live in
//! `sl-decode` and are picked from the catalog at run time.

use nalgebra::DMatrix;

use crate::Result;

/// A supervised classifier over dense samples (rows = trials, columns = voxels).
///
/// Targets are class indices. A classifier only ever predicts classes it saw
/// during [`Classifier::fit`].
pub trait Classifier: Send {
    /// Fit on `x` (n × p) with targets `y` (length n).
    fn fit(&mut self, x: &DMatrix<f64>, y: &[usize]) -> Result<()>;

    /// Predict one class index per row of `x`.
    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>>;

    /// Catalog token (e.g. "SVClin")
    fn name(&self) -> &str;
}

/// Untrained model template; each sphere and fold gets a fresh instance.
pub trait ClassifierTemplate: Send + Sync {
    /// Fresh, unfitted classifier.
    fn instantiate(&self) -> Box<dyn Classifier>;

    /// Catalog token (e.g. "SVClin")
    fn token(&self) -> &str;
}
