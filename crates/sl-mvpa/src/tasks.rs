//! The sweep as a lazy sequence of leaf tasks.
//!
//! Order: modality, ROI, classifier, subject, then unimodal before
//! cross-modal.

use serde::Serialize;
use sl_core::{ClassifierKind, Condition, Modality};

use crate::naming::map_file_name;

/// One (modality, ROI, classifier, subject, condition) unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LeafTask {
    /// Target modality
    pub modality: Modality,
    /// ROI label
    pub roi: String,
    /// Classifier entry
    pub classifier: ClassifierKind,
    /// Held-out subject
    pub subject: String,
    /// Condition
    pub condition: Condition,
}

impl LeafTask {
    /// Output file name for a searchlight of `radius_mm`.
    pub fn file_name(&self, radius_mm: f64) -> String {
        map_file_name(&self.subject, self.classifier, &self.modality, self.condition, radius_mm, &self.roi)
    }
}

/// Axes of the sweep.
#[derive(Debug, Clone, Copy)]
pub struct TaskPlan<'a> {
    modalities: &'a [Modality],
    rois: &'a [String],
    classifiers: &'a [ClassifierKind],
    subjects: &'a [String],
}

impl<'a> TaskPlan<'a> {
    /// Plan over the given axes.
    pub fn new(
        modalities: &'a [Modality],
        rois: &'a [String],
        classifiers: &'a [ClassifierKind],
        subjects: &'a [String],
    ) -> Self {
        Self { modalities, rois, classifiers, subjects }
    }

    /// Total number of leaves.
    pub fn len(&self) -> usize {
        self.modalities.len() * self.rois.len() * self.classifiers.len() * self.subjects.len() * 2
    }

    /// Whether the sweep has no leaves.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leaves in sweep order, built on demand.
    pub fn iter(&self) -> impl Iterator<Item = LeafTask> + 'a {
        let Self { modalities, rois, classifiers, subjects } = *self;
        modalities.iter().flat_map(move |m| {
            rois.iter().flat_map(move |roi| {
                classifiers.iter().flat_map(move |&clf| {
                    subjects.iter().flat_map(move |s| {
                        Condition::ALL.into_iter().map(move |condition| LeafTask {
                            modality: m.clone(),
                            roi: roi.clone(),
                            classifier: clf,
                            subject: s.clone(),
                            condition,
                        })
                    })
                })
            })
        })
    }
}
