//! Common data types for slmvpa

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Stimulus modality token as it appears in the trial table (e.g. `V`, `A`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modality(pub String);

impl Modality {
    /// Create a modality from its token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether train and test trials share the stimulus modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Train and validate on the target modality.
    Unimodal,
    /// Train on the target modality, validate on every other modality.
    Crossmodal,
}

impl Condition {
    /// Both conditions, in sweep order.
    pub const ALL: [Condition; 2] = [Condition::Unimodal, Condition::Crossmodal];

    /// Suffix appended to the modality token in output file names.
    pub fn file_suffix(self) -> &'static str {
        match self {
            Condition::Unimodal => "",
            Condition::Crossmodal => "2",
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Unimodal => "unimodal",
            Condition::Crossmodal => "crossmodal",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predefined-split membership of one selected trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fold {
    /// Always in the training set (code `-1`).
    Train,
    /// Member of test fold `k` (code `k >= 0`).
    Test(u16),
}

impl Fold {
    /// Integer code of the predefined-split contract (`-1` = train, `k` = test fold).
    pub fn code(self) -> i32 {
        match self {
            Fold::Train => -1,
            Fold::Test(k) => i32::from(k),
        }
    }

    /// Inverse of [`Fold::code`].
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            -1 => Ok(Fold::Train),
            k if (0..=i32::from(u16::MAX)).contains(&k) => Ok(Fold::Test(k as u16)),
            other => Err(Error::Validation(format!("invalid fold code {other}"))),
        }
    }
}

/// Classifier catalog. Every entry uses fixed, untuned defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// C-SVC, linear kernel, C = 1.
    #[serde(rename = "SVClin")]
    SvcLinear,
    /// C-SVC, RBF kernel with `gamma = 1 / (n_features * Var(X))`, C = 1.
    #[serde(rename = "SVCrbf")]
    SvcRbf,
    /// Linear discriminant analysis with pooled within-class covariance.
    #[serde(rename = "LDA")]
    Lda,
    /// Gradient-boosted depth-3 regression trees on the binomial deviance.
    #[serde(rename = "GBC")]
    Gbc,
    /// Gaussian naive Bayes.
    #[serde(rename = "GNB")]
    Gnb,
    /// 5-nearest-neighbours majority vote (Euclidean).
    #[serde(rename = "KNN")]
    Knn,
}

impl ClassifierKind {
    /// The classifiers swept when no explicit list is configured.
    pub const DEFAULT_SWEEP: [ClassifierKind; 4] =
        [ClassifierKind::SvcLinear, ClassifierKind::SvcRbf, ClassifierKind::Lda, ClassifierKind::Gbc];

    /// Abbreviation used in output file names.
    pub fn token(self) -> &'static str {
        match self {
            ClassifierKind::SvcLinear => "SVClin",
            ClassifierKind::SvcRbf => "SVCrbf",
            ClassifierKind::Lda => "LDA",
            ClassifierKind::Gbc => "GBC",
            ClassifierKind::Gnb => "GNB",
            ClassifierKind::Knn => "KNN",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ClassifierKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SVClin" => Ok(ClassifierKind::SvcLinear),
            "SVCrbf" => Ok(ClassifierKind::SvcRbf),
            "LDA" => Ok(ClassifierKind::Lda),
            "GBC" => Ok(ClassifierKind::Gbc),
            "GNB" => Ok(ClassifierKind::Gnb),
            "KNN" => Ok(ClassifierKind::Knn),
            other => Err(Error::Validation(format!(
                "unknown classifier '{other}' (expected one of SVClin, SVCrbf, LDA, GBC, GNB, KNN)"
            ))),
        }
    }
}

/// One row of the trial-level label table.
///
/// Row order is the volume order of the beta stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialLabel {
    /// Participant the trial belongs to
    pub participant_id: String,
    /// Stimulus modality
    pub modality: Modality,
    /// Whether the behavioural response was correct
    pub correct: bool,
    /// Lexical status (decoding target)
    pub lexicon: String,
}
