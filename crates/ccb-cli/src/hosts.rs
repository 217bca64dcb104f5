//! Filesystem-backed implementations of the conversion collaborators.
//!
//! The importer itself only talks to traits; this module is the CLI's side
//! of the contract. Converted trees and clips are written out as JSON,
//! logical URLs map onto the staging resource directory, and asset metadata
//! lives in `.meta` sidecar files next to the asset.

use anyhow::{Context, Result};
use ccb_data::SceneDocument;
use ccb_import::animation::AnimationClip;
use ccb_import::assets::{AssetDb, AssetId, DocumentLoader, SourceFs, SpriteMeta};
use ccb_import::prefab::PrefabNode;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct FsAssetDb {
    root_url: String,
    res_root: PathBuf,
    registered: HashSet<String>,
    /// Identifier → URL, filled as identifiers are handed out.
    ids: Mutex<HashMap<String, String>>,
}

impl FsAssetDb {
    pub fn new(root_url: impl Into<String>, res_root: impl Into<PathBuf>) -> Self {
        Self {
            root_url: root_url.into(),
            res_root: res_root.into(),
            registered: HashSet::new(),
            ids: Mutex::new(HashMap::new()),
        }
    }

    /// Maps a logical URL onto the staged file backing it. A frame URL
    /// addresses an entry *inside* a spritesheet or image, so a URL whose
    /// direct path is missing falls back to its parent when that parent is
    /// a file.
    fn locate(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(&self.root_url)?.trim_start_matches('/');
        if rest.is_empty() {
            return None;
        }
        let path = self.res_root.join(rest);
        if path.exists() {
            return Some(path);
        }
        let parent = path.parent()?;
        parent.is_file().then(|| parent.to_path_buf())
    }

    fn known(&self, url: &str) -> bool {
        self.registered.contains(url)
            || url.starts_with("db://internal/")
            || self.locate(url).is_some()
    }

    fn intern(&self, url: &str) -> AssetId {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let id = format!("{:016x}", hasher.finish());
        self.ids
            .lock()
            .unwrap()
            .insert(id.clone(), url.to_string());
        AssetId::new(id)
    }

    fn url_of(&self, id: &AssetId) -> Option<String> {
        self.ids.lock().unwrap().get(&id.0).cloned()
    }

    fn meta_path(&self, id: &AssetId) -> Option<PathBuf> {
        let url = self.url_of(id)?;
        let path = self.locate(&url)?;
        if !path.is_file() {
            return None;
        }
        let mut name = path.file_name()?.to_os_string();
        name.push(".meta");
        Some(path.with_file_name(name))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let data = serde_json::to_string_pretty(value)?;
        fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
    }
}

impl AssetDb for FsAssetDb {
    fn resolve(&self, url: &str) -> Option<AssetId> {
        self.known(url).then(|| self.intern(url))
    }

    fn contains(&self, id: &AssetId) -> bool {
        self.url_of(id).is_some_and(|url| self.known(&url))
    }

    fn url_exists(&self, url: &str) -> bool {
        self.known(url)
    }

    fn persist_prefab(&mut self, tree: &PrefabNode, fs_path: &Path, url: &str) -> Result<()> {
        Self::write_json(fs_path, tree)?;
        self.registered.insert(url.to_string());
        Ok(())
    }

    fn persist_clip(&mut self, clip: &AnimationClip, fs_path: &Path, url: &str) -> Result<()> {
        Self::write_json(fs_path, clip)?;
        self.registered.insert(url.to_string());
        Ok(())
    }

    fn query_meta(&self, id: &AssetId) -> Option<SpriteMeta> {
        let path = self.meta_path(id)?;
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).ok().or(Some(SpriteMeta::default())),
            Err(_) => Some(SpriteMeta::default()),
        }
    }

    fn save_meta(&mut self, id: &AssetId, meta: SpriteMeta) -> Result<()> {
        let path = self
            .meta_path(id)
            .context("asset has no backing file for metadata")?;
        Self::write_json(&path, &meta)
    }
}

/// Plain filesystem access plus JSON document loading. The conversion
/// engine treats the parse as external; this host feeds it documents
/// encoded as JSON key-value trees.
pub struct FsSources;

impl SourceFs for FsSources {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

impl DocumentLoader for FsSources {
    fn load(&self, path: &Path) -> Result<SceneDocument> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("not a valid scene document: {}", path.display()))
    }
}
