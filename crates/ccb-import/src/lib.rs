//! # ccb-import
//!
//! The conversion engine: turns parsed CocosBuilder documents into prefab
//! trees plus named animation clips.
//!
//! ## Responsibilities
//! - **Coordinate normalization**: unit-tagged positions/sizes → absolute
//!   parent-space values, then anchor-relative offsets (`units`).
//! - **Node graph walk**: recursive instantiation with per-type builders and
//!   sibling-name collision handling (`graph`, `builders`).
//! - **Animation reconstruction**: scattered per-node keyframe data →
//!   path-addressed, named clips (`animation`).
//! - **Batch driving**: one file at a time, idempotent against files already
//!   converted this run (`driver`).
//!
//! Everything that touches the outside world (locating files, persisting
//! trees, asset lookups) goes through the collaborator traits in `assets`.

pub mod animation;
pub mod assets;
pub mod builders;
pub mod context;
pub mod driver;
pub mod error;
pub mod graph;
pub mod prefab;
pub mod units;

pub use assets::{AssetDb, AssetId, DocumentLoader, SourceFs, SpriteMeta};
pub use context::{BatchContext, ConversionContext, ImportOptions};
pub use driver::{BatchReport, ImportOutcome, Importer};
pub use error::ImportError;
pub use prefab::{Component, PrefabNode};
