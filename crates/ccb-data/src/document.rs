use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One parsed `.ccb` document.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDocument {
    #[serde(rename = "nodeGraph")]
    pub node_graph: SourceNode,
    #[serde(default)]
    pub sequences: Vec<SequenceInfo>,
    #[serde(rename = "currentResolution", default)]
    pub current_resolution: usize,
    #[serde(default)]
    pub resolutions: Vec<Resolution>,
    #[serde(rename = "fileVersion", default)]
    pub file_version: Option<i64>,
}

impl SceneDocument {
    /// Reference size for the root node, taken from the resolution the
    /// document was last edited at. Documents without resolution info get a
    /// zero size (the root then resolves everything as absolute).
    pub fn scene_size(&self) -> (f32, f32) {
        match self.resolutions.get(self.current_resolution) {
            Some(r) => (r.width, r.height),
            None => (0.0, 0.0),
        }
    }
}

/// One node of the legacy editor tree. Read-only input to the conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceNode {
    #[serde(rename = "baseClass", default)]
    pub base_class: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
    #[serde(default)]
    pub children: Vec<SourceNode>,
    /// Keyframe lists keyed first by sequence index (stringly encoded, as the
    /// legacy format writes it), then by property name.
    #[serde(rename = "animatedProperties", default)]
    pub animated_properties: Option<BTreeMap<String, BTreeMap<String, AnimatedProperty>>>,
}

/// A raw `{name, type, value}` property record.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimatedProperty {
    #[serde(default)]
    pub keyframes: Vec<SourceKeyframe>,
    #[serde(rename = "type", default)]
    pub kind: Option<i64>,
}

/// A single keyframe. Times are carried in the legacy file's absolute units.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceKeyframe {
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub easing: Option<KeyframeEasing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyframeEasing {
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub opt: Option<f64>,
}

/// One legacy timeline ("sequence") header.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceInfo {
    pub name: String,
    #[serde(default)]
    pub length: f32,
    #[serde(rename = "autoPlay", default)]
    pub autoplay: bool,
    #[serde(rename = "sequenceId", default)]
    pub sequence_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Resolution {
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}
