//! Sweep driver: walks the leaf plan, skips completed leaves and runs the
//! engine on the rest.
//!
//! Inputs are checked for existence before the first leaf runs. The beta
//! stack is read once, on the first leaf that needs it; a mask is read when
//! its ROI comes up.

use serde::Serialize;
use sl_core::{Condition, Error, Modality, Result};
use sl_nifti::NiftiImage;
use std::time::Instant;

use crate::config::AnalysisConfig;
use crate::engine::{DecodingEngine, SearchlightEngine};
use crate::labels::{SelectionReport, build_selection};
use crate::source::{FsImageSource, ImageSource};
use crate::store::{FsResultStore, ResultStore};
use crate::tables::Dataset;
use crate::tasks::{LeafTask, TaskPlan};

/// Outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Leaves in the plan
    pub total: usize,
    /// Leaves computed in this run
    pub computed: usize,
    /// Leaves already complete
    pub skipped: usize,
    /// Wall time (seconds)
    pub wall_s: f64,
}

/// Leaf status in a plan listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafStatus {
    /// Map exists
    Done,
    /// Map missing
    Pending,
}

/// One row of a plan listing.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedLeaf {
    /// The leaf
    #[serde(flatten)]
    pub task: LeafTask,
    /// Output file name
    pub file_name: String,
    /// Whether it is already done
    pub status: LeafStatus,
}

/// Sweep driver over an image source, a decoding engine and a result store.
pub struct Driver<S, E, R> {
    config: AnalysisConfig,
    source: S,
    engine: E,
    store: R,
}

impl<S: ImageSource, E: DecodingEngine, R: ResultStore> Driver<S, E, R> {
    /// Assemble a driver.
    pub fn new(config: AnalysisConfig, source: S, engine: E, store: R) -> Self {
        Self { config, source, engine, store }
    }

    /// Configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Result store.
    pub fn store(&self) -> &R {
        &self.store
    }

    /// Engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Leaf plan over `dataset`.
    pub fn plan<'a>(&'a self, dataset: &'a Dataset) -> TaskPlan<'a> {
        TaskPlan::new(&self.config.modalities, &dataset.rois, &self.config.classifiers, &dataset.subjects)
    }

    /// Every leaf with its output name and completion status.
    pub fn status(&self, dataset: &Dataset) -> Result<Vec<PlannedLeaf>> {
        self.plan(dataset)
            .iter()
            .map(|task| -> Result<PlannedLeaf> {
                let status =
                    if self.store.is_complete(&task)? { LeafStatus::Done } else { LeafStatus::Pending };
                let file_name = task.file_name(self.config.radius_mm);
                Ok(PlannedLeaf { task, file_name, status })
            })
            .collect()
    }

    /// Run every pending leaf.
    pub fn run(&mut self, dataset: &Dataset) -> Result<RunSummary> {
        let start = Instant::now();
        self.source.check_available(&dataset.rois)?;

        let plan = TaskPlan::new(
            &self.config.modalities,
            &dataset.rois,
            &self.config.classifiers,
            &dataset.subjects,
        );
        let total = plan.len();
        tracing::info!(
            leaves = total,
            modalities = self.config.modalities.len(),
            rois = dataset.rois.len(),
            classifiers = self.config.classifiers.len(),
            subjects = dataset.subjects.len(),
            radius_mm = self.config.radius_mm,
            "========== START JOB =========="
        );

        let mut betas: Option<NiftiImage> = None;
        let mut mask: Option<(String, NiftiImage)> = None;
        let (mut computed, mut skipped) = (0usize, 0usize);

        for (n, task) in plan.iter().enumerate() {
            if self.store.is_complete(&task)? {
                skipped += 1;
                tracing::debug!(file = %task.file_name(self.config.radius_mm), "already done, skipping");
                continue;
            }
            tracing::info!(
                leaf = n + 1,
                total,
                classifier = %task.classifier,
                roi = %task.roi,
                modality = %task.modality,
                condition = %task.condition,
                subject = %task.subject,
                "searchlight"
            );

            let selection =
                build_selection(&dataset.labels, &task.modality, &task.subject, task.condition)?;
            selection.ensure_trainable()?;

            let betas_img: &NiftiImage = match &betas {
                Some(b) => b,
                None => &*betas.insert(load_betas(&self.source, dataset)?),
            };
            let mask_img: &NiftiImage = match &mask {
                Some((roi, m)) if *roi == task.roi => m,
                _ => &mask.insert((task.roi.clone(), self.source.load_mask(&task.roi)?)).1,
            };

            let map = self.engine.decode(betas_img, mask_img, &selection, task.classifier)?;
            self.store.store(&task, &map)?;
            computed += 1;
        }

        let summary = RunSummary { total, computed, skipped, wall_s: start.elapsed().as_secs_f64() };
        tracing::info!(
            computed = summary.computed,
            skipped = summary.skipped,
            wall_s = summary.wall_s,
            "========== ALL DONE =========="
        );
        Ok(summary)
    }
}

fn load_betas<S: ImageSource>(source: &S, dataset: &Dataset) -> Result<NiftiImage> {
    let betas = source.load_betas()?;
    if betas.n_volumes() != dataset.labels.len() {
        return Err(Error::Validation(format!(
            "beta stack has {} volumes but the trial table has {} rows",
            betas.n_volumes(),
            dataset.labels.len()
        )));
    }
    tracing::info!(volumes = betas.n_volumes(), shape = ?betas.spatial_shape(), "beta stack loaded");
    Ok(betas)
}

/// Filesystem-backed driver for `config`.
pub type FsDriver = Driver<FsImageSource, SearchlightEngine, FsResultStore>;

/// Wire the filesystem source, searchlight engine and file store for `config`.
pub fn fs_driver(config: AnalysisConfig) -> FsDriver {
    let layout = config.layout();
    let store = FsResultStore::new(layout.output_dir.clone(), config.radius_mm);
    let engine = SearchlightEngine::new(config.radius_mm, config.threads, config.seed);
    Driver::new(config, FsImageSource::new(layout), engine, store)
}

/// Load the tables of `config` and run the sweep.
pub fn run_sweep(config: AnalysisConfig) -> Result<RunSummary> {
    let dataset = Dataset::load(&config.layout())?;
    fs_driver(config).run(&dataset)
}

/// Load the tables of `config` and list every leaf with its status.
pub fn plan_sweep(config: AnalysisConfig) -> Result<Vec<PlannedLeaf>> {
    let dataset = Dataset::load(&config.layout())?;
    fs_driver(config).status(&dataset)
}

/// Trial selection of one leaf, read from the label table of `config`.
pub fn preview_split(
    config: &AnalysisConfig,
    subject: &str,
    modality: &Modality,
    condition: Condition,
) -> Result<SelectionReport> {
    let labels = crate::tables::read_trial_labels(&config.layout().labels)?;
    let sel = build_selection(&labels, modality, subject, condition)?;
    Ok(SelectionReport::from(&sel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LeafSelection;
    use crate::store::MemoryResultStore;
    use sl_core::{ClassifierKind, TrialLabel};
    use std::cell::{Cell, RefCell};

    const EYE: sl_nifti::Affine =
        [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]];

    struct FakeSource {
        n_volumes: usize,
        betas_loads: Cell<usize>,
        mask_loads: RefCell<Vec<String>>,
        missing_roi: Option<String>,
    }

    impl FakeSource {
        fn new(n_volumes: usize) -> Self {
            Self { n_volumes, betas_loads: Cell::new(0), mask_loads: RefCell::new(Vec::new()), missing_roi: None }
        }
    }

    impl ImageSource for FakeSource {
        fn check_available(&self, rois: &[String]) -> Result<()> {
            match &self.missing_roi {
                Some(r) if rois.contains(r) => {
                    Err(Error::MissingInput { role: format!("mask for ROI {r}"), path: r.into() })
                }
                _ => Ok(()),
            }
        }

        fn load_betas(&self) -> Result<NiftiImage> {
            self.betas_loads.set(self.betas_loads.get() + 1);
            Ok(NiftiImage::from_volumes([1, 1, 1], self.n_volumes, &EYE, vec![0.0; self.n_volumes])?)
        }

        fn load_mask(&self, roi: &str) -> Result<NiftiImage> {
            self.mask_loads.borrow_mut().push(roi.to_string());
            Ok(NiftiImage::from_volumes([1, 1, 1], 1, &EYE, vec![1.0])?)
        }
    }

    /// Records each call and returns a constant map.
    #[derive(Default)]
    struct CountingEngine {
        calls: RefCell<Vec<(ClassifierKind, usize)>>,
    }

    impl DecodingEngine for CountingEngine {
        fn decode(
            &self,
            _betas: &NiftiImage,
            _mask: &NiftiImage,
            selection: &LeafSelection,
            classifier: ClassifierKind,
        ) -> Result<NiftiImage> {
            self.calls.borrow_mut().push((classifier, selection.indices.len()));
            Ok(NiftiImage::from_volumes([1, 1, 1], 1, &EYE, vec![0.5])?)
        }
    }

    fn label(p: &str, m: &str, lex: &str) -> TrialLabel {
        TrialLabel { participant_id: p.into(), modality: Modality::new(m), correct: true, lexicon: lex.into() }
    }

    fn dataset() -> Dataset {
        let mut labels = Vec::new();
        for s in ["S1", "S2", "S3"] {
            for m in ["V", "A"] {
                labels.push(label(s, m, "word"));
                labels.push(label(s, m, "pseudoword"));
            }
        }
        Dataset {
            subjects: vec!["S1".into(), "S2".into(), "S3".into()],
            rois: vec!["lvOT".into(), "rSTG".into()],
            labels,
        }
    }

    fn config() -> AnalysisConfig {
        let mut cfg = AnalysisConfig::with_mvpa_dir("unused");
        cfg.classifiers = vec![ClassifierKind::SvcLinear, ClassifierKind::Lda];
        cfg
    }

    #[test]
    fn computes_every_leaf_then_nothing() {
        let ds = dataset();
        let mut driver = Driver::new(
            config(),
            FakeSource::new(ds.labels.len()),
            CountingEngine::default(),
            MemoryResultStore::new(4.0),
        );
        // 2 modalities x 2 ROIs x 2 classifiers x 3 subjects x 2 conditions
        let first = driver.run(&ds).unwrap();
        assert_eq!((first.total, first.computed, first.skipped), (48, 48, 0));
        assert_eq!(driver.engine().calls.borrow().len(), 48);
        assert_eq!(driver.store().len(), 48);

        let second = driver.run(&ds).unwrap();
        assert_eq!((second.computed, second.skipped), (0, 48));
        assert_eq!(driver.engine().calls.borrow().len(), 48);
    }

    #[test]
    fn partial_completion_only_runs_the_rest() {
        let ds = dataset();
        let cfg = config();
        let mut store = MemoryResultStore::new(cfg.radius_mm);
        let plan: Vec<LeafTask> =
            TaskPlan::new(&cfg.modalities, &ds.rois, &cfg.classifiers, &ds.subjects).iter().collect();
        for t in plan.iter().step_by(3) {
            store.mark_complete(t);
        }
        let mut driver =
            Driver::new(cfg, FakeSource::new(ds.labels.len()), CountingEngine::default(), store);
        let summary = driver.run(&ds).unwrap();
        assert_eq!(summary.skipped, 16);
        assert_eq!(summary.computed, 32);
        assert_eq!(driver.engine().calls.borrow().len(), 32);
    }

    #[test]
    fn inputs_load_lazily_and_once() {
        let ds = dataset();
        let mut driver = Driver::new(
            config(),
            FakeSource::new(ds.labels.len()),
            CountingEngine::default(),
            MemoryResultStore::new(4.0),
        );
        driver.run(&ds).unwrap();
        assert_eq!(driver.source.betas_loads.get(), 1);
        // Modality is the outer axis, so each ROI comes up once per modality.
        assert_eq!(*driver.source.mask_loads.borrow(), vec!["lvOT", "rSTG", "lvOT", "rSTG"]);

        // A finished sweep touches no image.
        driver.run(&ds).unwrap();
        assert_eq!(driver.source.betas_loads.get(), 1);
        assert_eq!(driver.source.mask_loads.borrow().len(), 4);
    }

    #[test]
    fn missing_mask_fails_before_any_leaf() {
        let ds = dataset();
        let mut source = FakeSource::new(ds.labels.len());
        source.missing_roi = Some("rSTG".into());
        let mut driver = Driver::new(config(), source, CountingEngine::default(), MemoryResultStore::new(4.0));
        assert!(matches!(driver.run(&ds), Err(Error::MissingInput { .. })));
        assert!(driver.engine().calls.borrow().is_empty());
    }

    #[test]
    fn volume_count_must_match_table() {
        let ds = dataset();
        let mut driver = Driver::new(
            config(),
            FakeSource::new(ds.labels.len() - 1),
            CountingEngine::default(),
            MemoryResultStore::new(4.0),
        );
        assert!(matches!(driver.run(&ds), Err(Error::Validation(_))));
    }

    #[test]
    fn empty_validation_fold_aborts() {
        let mut ds = dataset();
        ds.subjects.push("S9".into());
        let mut driver = Driver::new(
            config(),
            FakeSource::new(ds.labels.len()),
            CountingEngine::default(),
            MemoryResultStore::new(4.0),
        );
        let err = driver.run(&ds).unwrap_err();
        assert!(matches!(err, Error::EmptyFold { side: "validation", .. }), "{err}");
        // S1..S3 of the first ROI/classifier ran before S9 came up.
        assert_eq!(driver.engine().calls.borrow().len(), 6);
    }

    #[test]
    fn status_lists_done_and_pending() {
        let ds = dataset();
        let cfg = config();
        let mut store = MemoryResultStore::new(cfg.radius_mm);
        let first = TaskPlan::new(&cfg.modalities, &ds.rois, &cfg.classifiers, &ds.subjects)
            .iter()
            .next()
            .unwrap();
        store.mark_complete(&first);
        let driver = Driver::new(cfg, FakeSource::new(0), CountingEngine::default(), store);
        let rows = driver.status(&ds).unwrap();
        assert_eq!(rows.len(), 48);
        assert_eq!(rows[0].status, LeafStatus::Done);
        assert_eq!(rows[0].file_name, "S1_gMVPA-SVClin_LOSOCV_ACC-V_searchlight-4mm_mask-lvOT.nii.gz");
        assert!(rows[1..].iter().all(|r| r.status == LeafStatus::Pending));

        let json = serde_json::to_value(&rows[1]).unwrap();
        assert_eq!(json["condition"], "crossmodal");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["classifier"], "SVClin");
    }
}
