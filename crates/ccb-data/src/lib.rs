//! # ccb-data
//!
//! Typed model of a parsed CocosBuilder document.
//!
//! The property-list text itself is parsed by the host; whatever generic
//! key-value tree it produces is fed into these structs through any serde
//! deserializer. Field names follow the legacy camelCase spelling via
//! per-field renames.
//!
//! ## Key Types
//! - `SceneDocument`: one `.ccb` file (node graph, sequences, resolutions).
//! - `SourceNode`: one entry in the legacy tree.
//! - `PropertyBag`: name → `{type, value}` lookups with typed defaults.

pub mod bag;
pub mod document;
pub mod value;

pub use bag::PropertyBag;
pub use document::{
    AnimatedProperty, KeyframeEasing, PropertyEntry, Resolution, SceneDocument, SequenceInfo,
    SourceKeyframe, SourceNode,
};
pub use value::SizedValue;
