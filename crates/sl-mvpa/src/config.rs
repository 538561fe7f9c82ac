//! Analysis configuration (YAML or JSON) and the input/output layout it implies.

use serde::{Deserialize, Serialize};
use sl_core::{ClassifierKind, Error, Modality, Result};
use std::path::{Path, PathBuf};

/// Everything that parameterises one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Multivariate analysis folder (roster, ROI catalog, labels, betas).
    pub mvpa_dir: PathBuf,
    /// Masks folder; defaults to `masks` next to `mvpa_dir`.
    #[serde(default)]
    pub mask_dir: Option<PathBuf>,
    /// Where maps are written; defaults to `{mvpa_dir}/groupMVPA/SearchlightMaps`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// BIDS task label.
    #[serde(default = "default_task")]
    pub task: String,
    /// Template space label used in mask file names.
    #[serde(default = "default_space")]
    pub space: String,
    /// Target modalities, in sweep order.
    #[serde(default = "default_modalities")]
    pub modalities: Vec<Modality>,
    /// Classifier catalog entries, in sweep order.
    #[serde(default = "default_classifiers")]
    pub classifiers: Vec<ClassifierKind>,
    /// Searchlight radius (mm).
    #[serde(default = "default_radius")]
    pub radius_mm: f64,
    /// Seed for stochastic learners.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Threads (0 = all CPUs).
    #[serde(default)]
    pub threads: usize,

    /// Input file names inside `mvpa_dir`.
    #[serde(default)]
    pub files: InputFiles,
}

/// File-name overrides; defaults follow the group-analysis layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputFiles {
    /// Subject roster (TSV, `participant_id`).
    pub roster: String,
    /// ROI catalog (CSV, `label`, `input`).
    pub roi_catalog: String,
    /// Trial labels (TSV); `None` derives `group_{task}_labels-group-trial.tsv`.
    pub labels: Option<String>,
    /// 4-D beta stack.
    pub betas: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            roster: "participants_final.tsv".to_string(),
            roi_catalog: "group_masks_searchlight.csv".to_string(),
            labels: None,
            betas: "group_LSS_nilearn.nii.gz".to_string(),
        }
    }
}

fn default_task() -> String {
    "task-AudioVisAssos1word".to_string()
}

fn default_space() -> String {
    "space-MNI152NLin2009cAsym".to_string()
}

fn default_modalities() -> Vec<Modality> {
    vec![Modality::new("V"), Modality::new("A")]
}

fn default_classifiers() -> Vec<ClassifierKind> {
    ClassifierKind::DEFAULT_SWEEP.to_vec()
}

fn default_radius() -> f64 {
    4.0
}

fn default_seed() -> u64 {
    21
}

impl AnalysisConfig {
    /// Config with every default and the given `mvpa_dir`.
    pub fn with_mvpa_dir(mvpa_dir: impl Into<PathBuf>) -> Self {
        Self {
            mvpa_dir: mvpa_dir.into(),
            mask_dir: None,
            output_dir: None,
            task: default_task(),
            space: default_space(),
            modalities: default_modalities(),
            classifiers: default_classifiers(),
            radius_mm: default_radius(),
            seed: default_seed(),
            threads: 0,
            files: InputFiles::default(),
        }
    }

    /// Reject settings no sweep can run with.
    pub fn validate(&self) -> Result<()> {
        if self.modalities.is_empty() {
            return Err(Error::Validation("config: `modalities` must not be empty".into()));
        }
        if self.classifiers.is_empty() {
            return Err(Error::Validation("config: `classifiers` must not be empty".into()));
        }
        if !(self.radius_mm.is_finite() && self.radius_mm >= 0.0) {
            return Err(Error::Validation(format!(
                "config: `radius_mm` must be a non-negative number, got {}",
                self.radius_mm
            )));
        }
        Ok(())
    }

    /// Resolved paths.
    pub fn layout(&self) -> InputLayout {
        let mvpa = &self.mvpa_dir;
        let mask_dir = self.mask_dir.clone().unwrap_or_else(|| {
            mvpa.parent().map(|p| p.join("masks")).unwrap_or_else(|| PathBuf::from("masks"))
        });
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| mvpa.join("groupMVPA").join("SearchlightMaps"));
        let labels = self
            .files
            .labels
            .clone()
            .unwrap_or_else(|| format!("group_{}_labels-group-trial.tsv", self.task));
        InputLayout {
            roster: mvpa.join(&self.files.roster),
            roi_catalog: mvpa.join(&self.files.roi_catalog),
            labels: mvpa.join(labels),
            betas: mvpa.join(&self.files.betas),
            mask_group_dir: mask_dir.join("group"),
            space: self.space.clone(),
            output_dir,
        }
    }
}

/// Read a config file; `.json` is parsed as JSON, anything else as YAML.
pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    if !path.is_file() {
        return Err(Error::MissingInput { role: "config".into(), path: path.to_path_buf() });
    }
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: AnalysisConfig = if ext == "json" {
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Validation(format!("config {}: {e}", path.display())))?
    } else {
        serde_yaml_ng::from_slice(&bytes)
            .map_err(|e| Error::Validation(format!("config {}: {e}", path.display())))?
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Concrete file locations of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputLayout {
    /// Subject roster
    pub roster: PathBuf,
    /// ROI catalog
    pub roi_catalog: PathBuf,
    /// Trial label table
    pub labels: PathBuf,
    /// 4-D beta stack
    pub betas: PathBuf,
    /// Folder holding the group masks
    pub mask_group_dir: PathBuf,
    /// Space label used in mask names
    pub space: String,
    /// Output folder for maps
    pub output_dir: PathBuf,
}

impl InputLayout {
    /// `group_{space}_mask-{roi}.nii.gz` in the group mask folder.
    pub fn mask(&self, roi: &str) -> PathBuf {
        self.mask_group_dir.join(format!("group_{}_mask-{}.nii.gz", self.space, roi))
    }
}
