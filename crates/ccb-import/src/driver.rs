//! Top-level conversion driving.
//!
//! One file at a time, in input order, single-threaded: nested-file
//! references and the shared already-converted set make concurrent
//! conversion unsafe without extra coordination. Re-encountering a source
//! path anywhere in the recursion short-circuits to a no-op.

use crate::animation::{build_clips, ACTION_FOLDER_SUFFIX};
use crate::assets::{join_url, AssetDb, DocumentLoader, SourceFs};
use crate::context::{BatchContext, ConversionContext, ImportOptions};
use crate::error::ImportError;
use crate::prefab::{AnimationComponent, ClipRef, Component, PrefabNode};
use glam::Vec2;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Converts batches of legacy scene files through the collaborator seams.
pub struct Importer {
    pub(crate) db: Box<dyn AssetDb>,
    pub(crate) fs: Box<dyn SourceFs>,
    pub(crate) loader: Box<dyn DocumentLoader>,
    pub(crate) options: ImportOptions,
}

/// What happened to one submitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Converted,
    /// Already converted earlier in this run; nothing to do.
    AlreadyImported,
    /// The file does not exist; logged and skipped.
    Missing,
}

/// Batch summary. Malformed documents land in `failures`; the batch itself
/// always runs to completion, and the caller decides what a failure means.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub imported: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, ImportError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Importer {
    pub fn new(
        db: Box<dyn AssetDb>,
        fs: Box<dyn SourceFs>,
        loader: Box<dyn DocumentLoader>,
        options: ImportOptions,
    ) -> Self {
        Self {
            db,
            fs,
            loader,
            options,
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Converts every file in input order. Idempotent per path: duplicates
    /// (including files already pulled in as nested references) are no-ops.
    pub fn import_files(&mut self, files: &[PathBuf]) -> BatchReport {
        let mut batch = BatchContext::default();
        let mut report = BatchReport::default();

        for file in files {
            match self.import_file(&mut batch, file) {
                Ok(ImportOutcome::Converted) => report.imported.push(file.clone()),
                Ok(ImportOutcome::Missing) => report.missing.push(file.clone()),
                Ok(ImportOutcome::AlreadyImported) => {}
                Err(err) => {
                    error!(file = %file.display(), "conversion failed: {err}");
                    report.failures.push((file.clone(), err));
                }
            }
        }

        report
    }

    pub(crate) fn import_file(
        &mut self,
        batch: &mut BatchContext,
        path: &Path,
    ) -> Result<ImportOutcome, ImportError> {
        if batch.is_imported(path) {
            return Ok(ImportOutcome::AlreadyImported);
        }
        if !self.fs.exists(path) {
            warn!(file = %path.display(), "file does not exist; skipped");
            return Ok(ImportOutcome::Missing);
        }
        if !batch.begin(path) {
            // Guarded again at the nested-reference call site; kept here so
            // the invariant holds no matter who calls.
            warn!(file = %path.display(), "file is already being converted; skipped");
            return Ok(ImportOutcome::AlreadyImported);
        }

        info!(file = %path.display(), "importing legacy scene file");
        let result = self.convert_file(batch, path);
        batch.finish(path);

        let tree = result?;
        batch.complete(path.to_path_buf(), tree);
        Ok(ImportOutcome::Converted)
    }

    fn convert_file(
        &mut self,
        batch: &mut BatchContext,
        path: &Path,
    ) -> Result<PrefabNode, ImportError> {
        let document = self
            .loader
            .load(path)
            .map_err(|source| ImportError::MalformedDocument {
                path: path.to_path_buf(),
                source,
            })?;

        let (width, height) = document.scene_size();
        let mut ctx = ConversionContext::new(document.sequences.clone());
        let mut root = self.convert_node(
            batch,
            &mut ctx,
            &document.node_graph,
            "",
            Vec2::new(width, height),
        );

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rel = path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.options.ccbs_temp_path).ok())
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();

        self.attach_animation(&ctx, &mut root, &rel, &stem)?;

        let rel_url = rel.to_string_lossy().replace('\\', "/");
        let prefab_file = format!("{stem}.prefab");
        let fs_path = self.options.res_temp_path.join(&rel).join(&prefab_file);
        let url = join_url(&join_url(&self.options.res_root_url, &rel_url), &prefab_file);
        self.db
            .persist_prefab(&root, &fs_path, &url)
            .map_err(|source| ImportError::Persist {
                path: fs_path.clone(),
                source,
            })?;

        Ok(root)
    }

    /// Converts a staged nested-file reference and hands back a copy of its
    /// tree. `None` (the caller degrades to a plain node) covers an empty
    /// reference, a missing or malformed file, and a cyclic reference.
    pub(crate) fn node_from_ccb_path(
        &mut self,
        batch: &mut BatchContext,
        relative: &str,
    ) -> Option<PrefabNode> {
        if relative.is_empty() {
            return None;
        }
        let path = self.options.ccbs_temp_path.join(relative);
        if batch.is_in_progress(&path) {
            warn!(file = %path.display(), "cyclic nested-file reference; inserting a plain node");
            return None;
        }
        match self.import_file(batch, &path) {
            Ok(_) => batch.cached(&path).cloned(),
            Err(err) => {
                warn!(file = %path.display(), "nested file conversion failed: {err}");
                None
            }
        }
    }

    /// Materializes the file's timelines: clips persisted to a sibling
    /// `<name>_action` folder (numeric suffix when that URL is taken), then
    /// an animation holder on the tree root referencing them, with the
    /// flagged default clip set to play on load.
    fn attach_animation(
        &mut self,
        ctx: &ConversionContext,
        root: &mut PrefabNode,
        rel: &Path,
        stem: &str,
    ) -> Result<(), ImportError> {
        let Some(set) = build_clips(
            &ctx.sequences,
            &ctx.animation,
            root,
            &self.options.res_root_url,
            self.db.as_ref(),
        ) else {
            return Ok(());
        };

        let rel_url = rel.to_string_lossy().replace('\\', "/");
        let parent_url = join_url(&self.options.res_root_url, &rel_url);
        let mut folder = format!("{stem}{ACTION_FOLDER_SUFFIX}");
        let mut counter = 1;
        while self.db.url_exists(&join_url(&parent_url, &folder)) {
            folder = format!("{stem}{ACTION_FOLDER_SUFFIX}{counter}");
            counter += 1;
        }
        let folder_url = join_url(&parent_url, &folder);
        let folder_fs = self.options.res_temp_path.join(rel).join(&folder);

        let mut holder = AnimationComponent::default();
        for (index, clip) in set.clips.iter().enumerate() {
            let clip_file = format!("{}.anim", clip.name);
            let fs_path = folder_fs.join(&clip_file);
            let url = join_url(&folder_url, &clip_file);
            self.db
                .persist_clip(clip, &fs_path, &url)
                .map_err(|source| ImportError::Persist {
                    path: fs_path.clone(),
                    source,
                })?;

            let Some(asset) = self.db.resolve(&url) else {
                continue;
            };
            holder.clips.push(ClipRef {
                name: clip.name.clone(),
                asset,
            });
            if set.default_index == Some(index) {
                holder.default_clip = Some(clip.name.clone());
                holder.play_on_load = true;
            }
        }

        root.add_component(Component::Animation(holder));
        Ok(())
    }
}
