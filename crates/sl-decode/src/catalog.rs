//! Maps catalog tokens to concrete, untuned classifiers.

use sl_core::{Classifier, ClassifierKind, ClassifierTemplate};

use crate::gbc::{GbcConfig, GradientBoosting};
use crate::gnb::GaussianNb;
use crate::knn::KNearest;
use crate::lda::LinearDiscriminant;
use crate::svm::{SupportVectorClassifier, SvcConfig};

/// Template for one catalog entry; `seed` feeds the stochastic learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogTemplate {
    kind: ClassifierKind,
    seed: u64,
}

impl CatalogTemplate {
    /// Template for `kind`.
    pub fn new(kind: ClassifierKind, seed: u64) -> Self {
        Self { kind, seed }
    }

    /// Catalog entry.
    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }
}

impl ClassifierTemplate for CatalogTemplate {
    fn instantiate(&self) -> Box<dyn Classifier> {
        match self.kind {
            ClassifierKind::SvcLinear => Box::new(SupportVectorClassifier::new(SvcConfig::linear())),
            ClassifierKind::SvcRbf => Box::new(SupportVectorClassifier::new(SvcConfig::rbf())),
            ClassifierKind::Lda => Box::new(LinearDiscriminant::new()),
            ClassifierKind::Gbc => {
                Box::new(GradientBoosting::new(GbcConfig { seed: self.seed, ..GbcConfig::default() }))
            }
            ClassifierKind::Gnb => Box::new(GaussianNb::new()),
            ClassifierKind::Knn => Box::new(KNearest::default()),
        }
    }

    fn token(&self) -> &str {
        self.kind.token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_report_their_token() {
        for kind in [
            ClassifierKind::SvcLinear,
            ClassifierKind::SvcRbf,
            ClassifierKind::Lda,
            ClassifierKind::Gbc,
            ClassifierKind::Gnb,
            ClassifierKind::Knn,
        ] {
            let t = CatalogTemplate::new(kind, 21);
            assert_eq!(t.instantiate().name(), kind.token());
            assert_eq!(t.token(), kind.token());
        }
    }
}
