//! # sl-core
//!
//! Shared vocabulary for slmvpa: the error type, trial/fold/condition types
//! and the classifier traits the searchlight engine is written against.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Classifier, ClassifierTemplate};
pub use types::{ClassifierKind, Condition, Fold, Modality, TrialLabel};
