//! Error types for slmvpa

use std::path::PathBuf;
use thiserror::Error;

/// slmvpa error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required input file is absent.
    #[error("missing {role}: {}", path.display())]
    MissingInput {
        /// What the file is (roster, trial labels, beta stack, ROI mask, ...)
        role: String,
        /// Where it was expected
        path: PathBuf,
    },

    /// A leave-one-subject-out split has no usable trials on one side.
    #[error("empty {side} fold for participant {subject}, modality {modality} ({condition}): {reason}")]
    EmptyFold {
        /// `"validation"` or `"training"`
        side: &'static str,
        /// Held-out participant
        subject: String,
        /// Target modality
        modality: String,
        /// Condition token (`unimodal` / `crossmodal`)
        condition: String,
        /// Human readable detail
        reason: String,
    },

    /// Tabular input could not be parsed.
    #[error("table error in {}: {message}", path.display())]
    Table {
        /// Offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Image input could not be decoded or written.
    #[error("image error: {0}")]
    Image(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
