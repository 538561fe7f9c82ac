//! # sl-decode
//!
//! Decoding machinery for slmvpa:
//!
//! - the classifier catalog (linear/RBF SVM, LDA, gradient boosting,
//!   Gaussian naive Bayes, k-NN), all behind [`sl_core::Classifier`]
//! - predefined train/test splits
//! - world-space sphere indexing and the parallel searchlight

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod dataset;
pub mod gbc;
pub mod gnb;
pub mod knn;
pub mod lda;
pub mod metrics;
pub mod searchlight;
pub mod sphere;
pub mod split;
pub mod svm;
pub mod tree;

pub use catalog::CatalogTemplate;
pub use dataset::LabelEncoder;
pub use gbc::{GbcConfig, GradientBoosting};
pub use gnb::GaussianNb;
pub use knn::KNearest;
pub use lda::LinearDiscriminant;
pub use metrics::accuracy;
pub use searchlight::{SearchLight, SearchLightConfig, SearchLightScores};
pub use sphere::SphereIndex;
pub use split::PredefinedSplit;
pub use svm::{Kernel, SupportVectorClassifier, SvcConfig};
pub use tree::{RegressionTree, TreeParams};
