//! Leave-one-subject-out trial selection.
//!
//! For target modality `m`, held-out subject `s`:
//!
//! - train: `correct && modality == m && participant != s` (both conditions)
//! - unimodal validation: `correct && modality == m && participant == s`
//! - cross-modal validation: `correct && modality != m && participant == s`
//!
//! Selected trials keep table order; training trials get fold `-1`,
//! validation trials fold `0`.

use serde::Serialize;
use sl_core::{Condition, Error, Fold, Modality, Result, TrialLabel};

/// Trials selected for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSelection {
    /// Held-out subject
    pub subject: String,
    /// Target modality
    pub modality: Modality,
    /// Condition
    pub condition: Condition,
    /// Training membership, one flag per table row
    pub train: Vec<bool>,
    /// Validation membership, one flag per table row
    pub valid: Vec<bool>,
    /// Selected row (= volume) indices, ascending
    pub indices: Vec<usize>,
    /// Fold of each selected trial
    pub folds: Vec<Fold>,
    /// Target label of each selected trial
    pub targets: Vec<String>,
}

impl LeafSelection {
    /// `train || valid`, one flag per table row.
    pub fn selected(&self) -> Vec<bool> {
        self.train.iter().zip(&self.valid).map(|(t, v)| *t || *v).collect()
    }

    /// Integer fold codes of the selected trials.
    pub fn fold_codes(&self) -> Vec<i32> {
        self.folds.iter().map(|f| f.code()).collect()
    }

    /// Number of training trials.
    pub fn n_train(&self) -> usize {
        self.folds.iter().filter(|f| **f == Fold::Train).count()
    }

    /// Number of validation trials.
    pub fn n_valid(&self) -> usize {
        self.folds.len() - self.n_train()
    }

    /// Fail unless the training trials carry at least two target classes.
    pub fn ensure_trainable(&self) -> Result<()> {
        let mut classes: Vec<&str> = self
            .folds
            .iter()
            .zip(&self.targets)
            .filter(|(f, _)| **f == Fold::Train)
            .map(|(_, t)| t.as_str())
            .collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(empty_fold(
                "training",
                &self.subject,
                &self.modality,
                self.condition,
                format!("training trials carry a single target class ({})", classes.join(", ")),
            ));
        }
        Ok(())
    }
}

fn empty_fold(
    side: &'static str,
    subject: &str,
    modality: &Modality,
    condition: Condition,
    reason: String,
) -> Error {
    Error::EmptyFold {
        side,
        subject: subject.to_string(),
        modality: modality.to_string(),
        condition: condition.to_string(),
        reason,
    }
}

/// JSON view of a selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    /// Held-out subject
    pub subject: String,
    /// Target modality
    pub modality: Modality,
    /// Condition
    pub condition: Condition,
    /// Training / validation trial counts
    pub n_train: usize,
    /// Validation trial count
    pub n_valid: usize,
    /// Selected volume indices
    pub indices: Vec<usize>,
    /// Fold codes (`-1` train, `0` validation)
    pub folds: Vec<i32>,
    /// Targets of the selected trials
    pub targets: Vec<String>,
}

impl From<&LeafSelection> for SelectionReport {
    fn from(sel: &LeafSelection) -> Self {
        Self {
            subject: sel.subject.clone(),
            modality: sel.modality.clone(),
            condition: sel.condition,
            n_train: sel.n_train(),
            n_valid: sel.n_valid(),
            indices: sel.indices.clone(),
            folds: sel.fold_codes(),
            targets: sel.targets.clone(),
        }
    }
}

/// Build the selection for (`modality`, held-out `subject`, `condition`).
///
/// # Errors
/// [`Error::EmptyFold`] when either side has no trials. Class balance is
/// checked separately by [`LeafSelection::ensure_trainable`].
pub fn build_selection(
    table: &[TrialLabel],
    modality: &Modality,
    subject: &str,
    condition: Condition,
) -> Result<LeafSelection> {
    let empty = |side, reason: &str| empty_fold(side, subject, modality, condition, reason.to_string());

    let train: Vec<bool> = table
        .iter()
        .map(|r| r.correct && r.modality == *modality && r.participant_id != subject)
        .collect();
    let valid: Vec<bool> = table
        .iter()
        .map(|r| {
            let same = r.modality == *modality;
            let wanted = match condition {
                Condition::Unimodal => same,
                Condition::Crossmodal => !same,
            };
            r.correct && wanted && r.participant_id == subject
        })
        .collect();

    let mut indices = Vec::new();
    let mut folds = Vec::new();
    let mut targets = Vec::new();
    for (i, row) in table.iter().enumerate() {
        let fold = if train[i] {
            Fold::Train
        } else if valid[i] {
            Fold::Test(0)
        } else {
            continue;
        };
        indices.push(i);
        folds.push(fold);
        targets.push(row.lexicon.clone());
    }

    let sel = LeafSelection {
        subject: subject.to_string(),
        modality: modality.clone(),
        condition,
        train,
        valid,
        indices,
        folds,
        targets,
    };
    if sel.n_valid() == 0 {
        return Err(empty("validation", "no correct trials of the held-out subject"));
    }
    if sel.n_train() == 0 {
        return Err(empty("training", "no correct trials of the other subjects"));
    }
    Ok(sel)
}
