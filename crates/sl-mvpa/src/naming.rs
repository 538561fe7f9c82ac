//! Output file naming.

use sl_core::{ClassifierKind, Condition, Modality};

/// `{subject}_gMVPA-{clf}_LOSOCV_ACC-{modality}[2]_searchlight-{radius}mm_mask-{roi}.nii.gz`
///
/// The radius prints in shortest form (`4`, `4.5`); the `2` suffix marks the
/// cross-modal condition.
pub fn map_file_name(
    subject: &str,
    classifier: ClassifierKind,
    modality: &Modality,
    condition: Condition,
    radius_mm: f64,
    roi: &str,
) -> String {
    format!(
        "{subject}_gMVPA-{classifier}_LOSOCV_ACC-{modality}{suffix}_searchlight-{radius_mm}mm_mask-{roi}.nii.gz",
        suffix = condition.file_suffix(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unimodal_and_crossmodal_names() {
        let v = Modality::new("V");
        assert_eq!(
            map_file_name("sub-01", ClassifierKind::SvcLinear, &v, Condition::Unimodal, 4.0, "lvOT"),
            "sub-01_gMVPA-SVClin_LOSOCV_ACC-V_searchlight-4mm_mask-lvOT.nii.gz"
        );
        assert_eq!(
            map_file_name("sub-01", ClassifierKind::Gbc, &v, Condition::Crossmodal, 4.0, "lvOT"),
            "sub-01_gMVPA-GBC_LOSOCV_ACC-V2_searchlight-4mm_mask-lvOT.nii.gz"
        );
    }

    #[test]
    fn fractional_radius_keeps_decimals() {
        let a = Modality::new("A");
        let name = map_file_name("sub-02", ClassifierKind::Lda, &a, Condition::Unimodal, 4.5, "rSTG");
        assert_eq!(name, "sub-02_gMVPA-LDA_LOSOCV_ACC-A_searchlight-4.5mm_mask-rSTG.nii.gz");
    }

    #[test]
    fn names_are_pure() {
        let v = Modality::new("V");
        let a = map_file_name("s", ClassifierKind::Knn, &v, Condition::Crossmodal, 6.0, "r");
        let b = map_file_name("s", ClassifierKind::Knn, &v, Condition::Crossmodal, 6.0, "r");
        assert_eq!(a, b);
        assert_ne!(a, map_file_name("s", ClassifierKind::Knn, &v, Condition::Unimodal, 6.0, "r"));
    }
}
