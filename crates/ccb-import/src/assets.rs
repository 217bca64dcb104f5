//! Collaborator seams and asset addressing.
//!
//! The engine never touches the asset repository or the filesystem directly;
//! it talks to these traits. Lookup failures are tolerated (the dependent
//! feature is left unset); only persistence failures surface to the driver.

use crate::animation::AnimationClip;
use crate::prefab::PrefabNode;
use anyhow::Result;
use ccb_data::SceneDocument;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SPLASH_SPRITE_URL: &str =
    "db://internal/image/default_sprite_splash.png/default_sprite_splash";
pub const DEFAULT_BTN_NORMAL_URL: &str =
    "db://internal/image/default_btn_normal.png/default_btn_normal";
pub const DEFAULT_BTN_PRESSED_URL: &str =
    "db://internal/image/default_btn_pressed.png/default_btn_pressed";
pub const DEFAULT_BTN_DISABLED_URL: &str =
    "db://internal/image/default_btn_disabled.png/default_btn_disabled";
pub const DEFAULT_VSCROLLBAR_URL: &str =
    "db://internal/image/default_scrollbar_vertical.png/default_scrollbar_vertical";
pub const DEFAULT_HSCROLLBAR_URL: &str = "db://internal/image/default_scrollbar.png/default_scrollbar";

/// Opaque identifier of an asset in the target repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Metadata blob carried by an image asset. The nine-slice builder writes
/// border insets back through this, the one conversion step that mutates
/// shared asset state rather than the tree under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteMeta {
    pub trim_threshold: i64,
    pub border_top: f32,
    pub border_bottom: f32,
    pub border_left: f32,
    pub border_right: f32,
}

impl Default for SpriteMeta {
    fn default() -> Self {
        Self {
            trim_threshold: -1,
            border_top: 0.0,
            border_bottom: 0.0,
            border_left: 0.0,
            border_right: 0.0,
        }
    }
}

/// The target asset repository.
pub trait AssetDb {
    /// Resolves a logical URL to an identifier, if the repository knows it.
    fn resolve(&self, url: &str) -> Option<AssetId>;
    /// Whether an asset with this identifier exists.
    fn contains(&self, id: &AssetId) -> bool;
    /// Whether anything is registered under this URL (used to pick a fresh
    /// action-folder name).
    fn url_exists(&self, url: &str) -> bool;
    /// Persists a converted tree and registers it under `url`.
    fn persist_prefab(&mut self, tree: &PrefabNode, fs_path: &Path, url: &str) -> Result<()>;
    /// Persists one animation clip and registers it under `url`.
    fn persist_clip(&mut self, clip: &AnimationClip, fs_path: &Path, url: &str) -> Result<()>;
    fn query_meta(&self, id: &AssetId) -> Option<SpriteMeta>;
    fn save_meta(&mut self, id: &AssetId, meta: SpriteMeta) -> Result<()>;
}

/// Read access to the staging directories holding the legacy project files.
pub trait SourceFs {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Parses one legacy file into the in-memory document. Parsing the
/// property-list text is the host's business; a failure here is the one
/// fatal per-file condition.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<SceneDocument>;
}

/// Joins logical URL segments, skipping empties.
pub fn join_url(base: &str, segment: &str) -> String {
    let segment = segment.trim_matches('/');
    if segment.is_empty() || segment == "." {
        return base.trim_end_matches('/').to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

/// Last path segment of a URL with its extension stripped.
pub fn url_stem(url: &str) -> &str {
    let base = url.rsplit('/').next().unwrap_or(url);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

/// Resolution of a `(spritesheet, frame-name)` pair or a bare image path to
/// a usable image asset, with a configured fallback. `None` means the
/// feature stays unset, never an error.
pub fn resolve_sprite_frame(
    db: &dyn AssetDb,
    root_url: &str,
    frame: Option<&(String, String)>,
    default_url: Option<&str>,
) -> Option<AssetId> {
    let url = match frame {
        Some((sheet, name)) => {
            if !sheet.is_empty() {
                join_url(&join_url(root_url, sheet), name)
            } else {
                let image_url = join_url(root_url, name);
                let stem = url_stem(&image_url).to_string();
                join_url(&image_url, &stem)
            }
        }
        None => default_url?.to_string(),
    };

    let id = db.resolve(&url)?;
    db.contains(&id).then_some(id)
}

/// Best-effort scan of a bitmap-font config for its nominal size
/// (`info ... size=NN`). The caller continues silently when this fails.
pub fn fnt_font_size(config: &str) -> Option<f32> {
    for line in config.lines() {
        let line = line.trim_start();
        if !line.starts_with("info") {
            continue;
        }
        for token in line.split_whitespace() {
            if let Some(raw) = token.strip_prefix("size=") {
                return raw.parse::<f32>().ok();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_skips_empty_segments() {
        assert_eq!(join_url("db://assets/", "ui/menu.plist"), "db://assets/ui/menu.plist");
        assert_eq!(join_url("db://assets", ""), "db://assets");
        assert_eq!(join_url("db://assets", "."), "db://assets");
    }

    #[test]
    fn url_stem_strips_one_extension() {
        assert_eq!(url_stem("db://assets/ui/icon.png"), "icon");
        assert_eq!(url_stem("plain"), "plain");
    }

    #[test]
    fn fnt_size_comes_from_the_info_line() {
        let config = "info face=\"Arial\" size=32 bold=0\ncommon lineHeight=36 size=99";
        assert_eq!(fnt_font_size(config), Some(32.0));
        assert_eq!(fnt_font_size("common lineHeight=36"), None);
    }
}
