//! Decoding engine seam between the driver and the searchlight.

use sl_core::{ClassifierKind, Result};
use sl_decode::{CatalogTemplate, LabelEncoder, PredefinedSplit, SearchLight, SearchLightConfig};
use sl_nifti::NiftiImage;

use crate::labels::LeafSelection;

/// Produces the accuracy map of one leaf.
pub trait DecodingEngine {
    /// Decode `selection` from `betas` (full stack, one volume per table
    /// row) within `mask`, returning a 3-D map on the beta grid.
    fn decode(
        &self,
        betas: &NiftiImage,
        mask: &NiftiImage,
        selection: &LeafSelection,
        classifier: ClassifierKind,
    ) -> Result<NiftiImage>;
}

/// Searchlight over the selected volumes; the map reuses the geometry of
/// their mean image.
#[derive(Debug, Clone, Copy)]
pub struct SearchlightEngine {
    searchlight: SearchLight,
    seed: u64,
}

impl SearchlightEngine {
    /// Engine with the given sphere radius, thread count and learner seed.
    pub fn new(radius_mm: f64, threads: usize, seed: u64) -> Self {
        Self { searchlight: SearchLight::new(SearchLightConfig { radius_mm, threads }), seed }
    }
}

impl DecodingEngine for SearchlightEngine {
    fn decode(
        &self,
        betas: &NiftiImage,
        mask: &NiftiImage,
        selection: &LeafSelection,
        classifier: ClassifierKind,
    ) -> Result<NiftiImage> {
        let selected = betas.select_volumes(&selection.indices)?;
        let encoder = LabelEncoder::fit(&selection.targets);
        let targets = encoder.encode(&selection.targets)?;
        let split = PredefinedSplit::from_folds(&selection.folds)?;
        let template = CatalogTemplate::new(classifier, self.seed);

        let out = self.searchlight.fit_score(&selected, mask, &targets, &split, &template)?;
        tracing::info!(
            classifier = %classifier,
            spheres = out.n_spheres,
            mean_accuracy = out.mean_accuracy,
            "searchlight finished"
        );
        Ok(selected.mean_volume()?.like(out.scores)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::build_selection;
    use sl_core::{Condition, Modality, TrialLabel};

    #[test]
    fn map_takes_the_beta_geometry() {
        let affine = [[3.0, 0.0, 0.0, -9.0], [0.0, 3.0, 0.0, 1.0], [0.0, 0.0, 3.0, 2.0], [0.0, 0.0, 0.0, 1.0]];
        // 2x1x1 grid: voxel 0 encodes the word/pseudoword contrast, voxel 1 is outside the mask.
        let mut table = Vec::new();
        let mut data = Vec::new();
        for (i, subject) in ["S1", "S1", "S2", "S2", "S3", "S3"].into_iter().enumerate() {
            let word = i % 2 == 0;
            table.push(TrialLabel {
                participant_id: subject.into(),
                modality: Modality::new("V"),
                correct: true,
                lexicon: if word { "word".into() } else { "pseudoword".into() },
            });
            let jitter = 0.1 * i as f32;
            data.extend_from_slice(&[if word { 1.0 + jitter } else { -1.0 - jitter }, 0.0]);
        }
        let betas = NiftiImage::from_volumes([2, 1, 1], 6, &affine, data).unwrap();
        let mask = betas.mean_volume().unwrap().like(vec![1.0, 0.0]).unwrap();
        let sel = build_selection(&table, &Modality::new("V"), "S1", Condition::Unimodal).unwrap();

        let engine = SearchlightEngine::new(4.0, 1, 21);
        let map = engine.decode(&betas, &mask, &sel, ClassifierKind::Lda).unwrap();
        assert_eq!(map.n_volumes(), 1);
        assert_eq!(map.affine(), betas.affine());
        assert_eq!(map.data(), &[1.0, 0.0]);
    }
}
