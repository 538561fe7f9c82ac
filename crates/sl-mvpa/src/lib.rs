//! # sl-mvpa
//!
//! Leave-one-subject-out searchlight sweep over modalities, ROIs,
//! classifiers and subjects.
//!
//! - [`config`]: YAML/JSON analysis config and derived file layout
//! - [`tables`]: roster, ROI catalog and trial-label readers
//! - [`labels`]: per-leaf train/validation selection and fold codes
//! - [`tasks`]: the sweep as a lazy iterator of [`tasks::LeafTask`]s
//! - [`store`]: completed-leaf registry (filesystem or memory)
//! - [`engine`], [`source`]: seams to the searchlight and image inputs
//! - [`driver`]: ties it together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod driver;
pub mod engine;
pub mod labels;
pub mod naming;
pub mod source;
pub mod store;
pub mod tables;
pub mod tasks;

pub use config::{AnalysisConfig, InputFiles, InputLayout, read_config};
pub use driver::{
    Driver, FsDriver, LeafStatus, PlannedLeaf, RunSummary, fs_driver, plan_sweep, preview_split,
    run_sweep,
};
pub use engine::{DecodingEngine, SearchlightEngine};
pub use labels::{LeafSelection, SelectionReport, build_selection};
pub use naming::map_file_name;
pub use source::{FsImageSource, ImageSource};
pub use store::{FsResultStore, MemoryResultStore, ResultStore};
pub use tables::Dataset;
pub use tasks::{LeafTask, TaskPlan};
