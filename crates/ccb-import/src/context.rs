//! Conversion state, made explicit.
//!
//! `BatchContext` spans one whole batch run and carries the only cross-file
//! mutable state: the already-converted set (append-only), the converted
//! tree cache nested references instantiate from, and the in-progress set
//! guarding against cyclic nested-file references. `ConversionContext` lives
//! for exactly one file.

use crate::animation::AnimationData;
use crate::prefab::PrefabNode;
use ccb_data::SequenceInfo;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// The three path/URL contexts a batch runs against: where converted assets
/// are registered, where staged resources live, and where the staged legacy
/// files live.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub res_root_url: String,
    pub res_temp_path: PathBuf,
    pub ccbs_temp_path: PathBuf,
}

/// Cross-file state for one batch run.
#[derive(Debug, Default)]
pub struct BatchContext {
    imported: HashSet<PathBuf>,
    in_progress: HashSet<PathBuf>,
    cache: HashMap<PathBuf, PrefabNode>,
}

impl BatchContext {
    pub fn is_imported(&self, path: &Path) -> bool {
        self.imported.contains(path)
    }

    pub fn is_in_progress(&self, path: &Path) -> bool {
        self.in_progress.contains(path)
    }

    /// Marks a file as being converted. Returns `false` when the file is
    /// already on the conversion stack (a cyclic nested-file reference).
    pub fn begin(&mut self, path: &Path) -> bool {
        self.in_progress.insert(path.to_path_buf())
    }

    pub fn finish(&mut self, path: &Path) {
        self.in_progress.remove(path);
    }

    /// Records a finished conversion; the set is append-only for the run.
    pub fn complete(&mut self, path: PathBuf, tree: PrefabNode) {
        self.imported.insert(path.clone());
        self.cache.insert(path, tree);
    }

    pub fn cached(&self, path: &Path) -> Option<&PrefabNode> {
        self.cache.get(path)
    }
}

/// Per-file state: the file's timeline headers plus the animation data the
/// walker collects on its way down.
#[derive(Debug, Default)]
pub struct ConversionContext {
    pub sequences: Vec<SequenceInfo>,
    pub animation: AnimationData,
}

impl ConversionContext {
    pub fn new(sequences: Vec<SequenceInfo>) -> Self {
        Self {
            sequences,
            animation: AnimationData::default(),
        }
    }
}
