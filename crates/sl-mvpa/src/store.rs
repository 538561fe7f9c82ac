//! Completed-leaf registry and map persistence.

use sl_core::Result;
use sl_nifti::NiftiImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::tasks::LeafTask;

/// Where finished maps live. A leaf is complete once its map is stored.
pub trait ResultStore {
    /// Whether `task` already has a stored map.
    fn is_complete(&self, task: &LeafTask) -> Result<bool>;

    /// Persist the map of `task`. After this returns `Ok`, `is_complete` is true.
    fn store(&mut self, task: &LeafTask, map: &NiftiImage) -> Result<()>;
}

/// Maps as `.nii.gz` files in one directory.
#[derive(Debug, Clone)]
pub struct FsResultStore {
    dir: PathBuf,
    radius_mm: f64,
}

impl FsResultStore {
    /// Store rooted at `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>, radius_mm: f64) -> Self {
        Self { dir: dir.into(), radius_mm }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path of the map of `task`.
    pub fn path(&self, task: &LeafTask) -> PathBuf {
        self.dir.join(task.file_name(self.radius_mm))
    }

    /// Temporary path the map of `task` is written to before the rename.
    pub fn partial_path(&self, task: &LeafTask) -> PathBuf {
        self.dir.join(format!(".partial-{}", task.file_name(self.radius_mm)))
    }
}

impl ResultStore for FsResultStore {
    fn is_complete(&self, task: &LeafTask) -> Result<bool> {
        Ok(self.path(task).is_file())
    }

    fn store(&mut self, task: &LeafTask, map: &NiftiImage) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let final_path = self.path(task);
        // The temporary keeps the `.gz` suffix so it is written compressed. Its
        // name depends only on the leaf, so a retry overwrites a leftover.
        let tmp = self.partial_path(task);
        if let Err(e) = sl_nifti::write_image(&tmp, map) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        std::fs::rename(&tmp, &final_path)?;
        tracing::debug!(path = %final_path.display(), "map written");
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultStore {
    radius_mm: f64,
    maps: BTreeMap<String, Option<NiftiImage>>,
}

impl MemoryResultStore {
    /// Empty store naming leaves with `radius_mm`.
    pub fn new(radius_mm: f64) -> Self {
        Self { radius_mm, maps: BTreeMap::new() }
    }

    /// Mark `task` complete without a map (simulates an earlier run).
    pub fn mark_complete(&mut self, task: &LeafTask) {
        self.maps.insert(task.file_name(self.radius_mm), None);
    }

    /// Map stored for `task` in this session.
    pub fn get(&self, task: &LeafTask) -> Option<&NiftiImage> {
        self.maps.get(&task.file_name(self.radius_mm)).and_then(Option::as_ref)
    }

    /// Number of complete leaves.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether nothing is complete.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// File names of complete leaves, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}

impl ResultStore for MemoryResultStore {
    fn is_complete(&self, task: &LeafTask) -> Result<bool> {
        Ok(self.maps.contains_key(&task.file_name(self.radius_mm)))
    }

    fn store(&mut self, task: &LeafTask, map: &NiftiImage) -> Result<()> {
        self.maps.insert(task.file_name(self.radius_mm), Some(map.clone()));
        Ok(())
    }
}
