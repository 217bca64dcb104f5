//! Animation-timeline reconstruction.
//!
//! The walker records each node's raw keyframe data keyed by its relative
//! path from the conversion root; once the whole tree exists, this module
//! aggregates that data into one clip per legacy sequence. Per-property
//! parsers emit target-curve fragments; position curves are converted into
//! the parent-anchor-relative space of the node's (static) parent.

use crate::assets::{resolve_sprite_frame, AssetDb, AssetId};
use crate::prefab::PrefabNode;
use crate::units;
use ccb_data::value as raw;
use ccb_data::{AnimatedProperty, KeyframeEasing, SequenceInfo, SourceKeyframe};
use glam::Vec2;
use serde::Serialize;
use std::collections::BTreeMap;

/// Clips are sampled at the legacy editor's fixed authoring rate.
pub const DEFAULT_SAMPLE_RATE: f32 = 30.0;

/// Clips land in a sibling folder named after the converted tree.
pub const ACTION_FOLDER_SUFFIX: &str = "_action";

/// Raw animated-property map of one node: sequence index → property name →
/// keyframe list, exactly as the document stores it.
pub type RecordedNode = BTreeMap<String, BTreeMap<String, AnimatedProperty>>;

/// Keyframe data collected during the node-graph walk, keyed by relative
/// path from the conversion root (the root's own data kept separate).
#[derive(Debug, Default)]
pub struct AnimationData {
    self_data: Option<RecordedNode>,
    children: BTreeMap<String, RecordedNode>,
}

impl AnimationData {
    pub fn record(&mut self, node_path: &str, data: &RecordedNode) {
        if node_path.is_empty() {
            self.self_data = Some(data.clone());
        } else {
            self.children.insert(node_path.to_string(), data.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.self_data.is_none() && self.children.is_empty()
    }
}

/// A named, sampled clip ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub sample: f32,
    pub curve_data: CurveData,
}

/// Curves for the clip's root node plus path-indexed curves for descendants.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurveData {
    #[serde(flatten)]
    pub own: CurveBucket,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, CurveBucket>,
}

/// Property curves applied to the node itself plus curves addressed to one
/// of its components.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurveBucket {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Vec<CurveKeyframe>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub comps: BTreeMap<String, BTreeMap<String, Vec<CurveKeyframe>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveKeyframe {
    pub frame: f32,
    pub value: CurveValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CurveValue {
    Number(f32),
    Pair([f32; 2]),
    Bool(bool),
    Color([u8; 3]),
    Frame(AssetId),
}

/// The clips of one file plus which of them (at most one) auto-plays.
#[derive(Debug)]
pub struct TimelineSet {
    pub clips: Vec<AnimationClip>,
    pub default_index: Option<usize>,
}

const EASING_NAMES: [&str; 14] = [
    "constant",
    "linear",
    "cubicIn",
    "cubicOut",
    "cubicInOut",
    "elasticIn",
    "elasticOut",
    "elasticInOut",
    "bounceIn",
    "bounceOut",
    "bounceInOut",
    "backIn",
    "backOut",
    "backInOut",
];

/// Curve name for a legacy easing record; codes outside 0–13 carry none.
pub fn easing_name(easing: Option<&KeyframeEasing>) -> Option<&'static str> {
    let easing = easing?;
    usize::try_from(easing.kind)
        .ok()
        .and_then(|idx| EASING_NAMES.get(idx))
        .copied()
}

/// Builds one clip per sequence from the collected animation data, or
/// nothing when the file recorded no keyframes at all.
pub fn build_clips(
    sequences: &[SequenceInfo],
    data: &AnimationData,
    root: &PrefabNode,
    root_url: &str,
    db: &dyn AssetDb,
) -> Option<TimelineSet> {
    if data.is_empty() {
        return None;
    }

    let default_index = sequences.iter().rposition(|s| s.autoplay);
    let mut clips: Vec<AnimationClip> = sequences
        .iter()
        .map(|s| AnimationClip {
            name: s.name.clone(),
            duration: s.length,
            sample: DEFAULT_SAMPLE_RATE,
            curve_data: CurveData::default(),
        })
        .collect();

    for (index, clip) in clips.iter_mut().enumerate() {
        let key = index.to_string();

        if let Some(recorded) = &data.self_data {
            if let Some(props) = recorded.get(&key) {
                let ctx = NodeContext {
                    parent: None,
                    has_sprite: root.sprite().is_some(),
                };
                gather_curves(props, &ctx, &mut clip.curve_data.own, db, root_url);
            }
        }

        for (path, recorded) in &data.children {
            let Some(props) = recorded.get(&key) else {
                continue;
            };
            let ctx = match root.lookup(path) {
                Some(hit) => NodeContext {
                    parent: hit.parent.map(|p| (p.anchor, p.content_size)),
                    has_sprite: hit.node.sprite().is_some(),
                },
                None => {
                    tracing::debug!(path = %path, "animated node path not found in converted tree");
                    NodeContext {
                        parent: None,
                        has_sprite: false,
                    }
                }
            };
            let bucket = clip.curve_data.paths.entry(path.clone()).or_default();
            gather_curves(props, &ctx, bucket, db, root_url);
        }
    }

    Some(TimelineSet {
        clips,
        default_index,
    })
}

/// Static context of an animated node: its parent's anchor/size (none for
/// the root) and whether it carries a sprite.
struct NodeContext {
    parent: Option<(Vec2, Vec2)>,
    has_sprite: bool,
}

fn gather_curves(
    props: &BTreeMap<String, AnimatedProperty>,
    ctx: &NodeContext,
    out: &mut CurveBucket,
    db: &dyn AssetDb,
    root_url: &str,
) {
    for (name, anim) in props {
        match name.as_str() {
            "position" => {
                out.props
                    .insert("position".into(), parse_position(&anim.keyframes, ctx.parent));
            }
            "rotation" => {
                out.props
                    .insert("rotation".into(), parse_numbers(&anim.keyframes));
            }
            "opacity" => {
                out.props
                    .insert("opacity".into(), parse_numbers(&anim.keyframes));
            }
            "scale" => {
                let (x, y) = parse_scale(&anim.keyframes);
                out.props.insert("scaleX".into(), x);
                out.props.insert("scaleY".into(), y);
            }
            "visible" => {
                out.props
                    .insert("active".into(), parse_visibility(&anim.keyframes));
            }
            "color" => {
                out.props
                    .insert("color".into(), parse_colors(&anim.keyframes));
            }
            "displayFrame" => {
                if ctx.has_sprite {
                    out.comps
                        .entry("Sprite".into())
                        .or_default()
                        .insert("spriteFrame".into(), parse_frames(&anim.keyframes, db, root_url));
                }
            }
            other => {
                tracing::info!(property = other, "animated property is not supported; skipped");
            }
        }
    }
}

fn parse_position(keyframes: &[SourceKeyframe], parent: Option<(Vec2, Vec2)>) -> Vec<CurveKeyframe> {
    keyframes
        .iter()
        .filter_map(|kf| {
            let [x, y] = raw::as_f32_array::<2>(&kf.value)?;
            let pos = match parent {
                Some((anchor, size)) => units::to_parent_relative(Vec2::new(x, y), anchor, size),
                None => Vec2::new(x, y),
            };
            Some(CurveKeyframe {
                frame: kf.time,
                value: CurveValue::Pair([pos.x, pos.y]),
                curve: easing_name(kf.easing.as_ref()),
            })
        })
        .collect()
}

fn parse_numbers(keyframes: &[SourceKeyframe]) -> Vec<CurveKeyframe> {
    keyframes
        .iter()
        .filter_map(|kf| {
            Some(CurveKeyframe {
                frame: kf.time,
                value: CurveValue::Number(raw::as_f32(&kf.value)?),
                curve: easing_name(kf.easing.as_ref()),
            })
        })
        .collect()
}

/// The legacy scale keyframe carries both axes; the target wants two
/// independent single-axis curves sharing the easing.
fn parse_scale(keyframes: &[SourceKeyframe]) -> (Vec<CurveKeyframe>, Vec<CurveKeyframe>) {
    let mut xs = Vec::with_capacity(keyframes.len());
    let mut ys = Vec::with_capacity(keyframes.len());
    for kf in keyframes {
        let Some([sx, sy]) = raw::as_f32_array::<2>(&kf.value) else {
            continue;
        };
        let curve = easing_name(kf.easing.as_ref());
        xs.push(CurveKeyframe {
            frame: kf.time,
            value: CurveValue::Number(sx),
            curve,
        });
        ys.push(CurveKeyframe {
            frame: kf.time,
            value: CurveValue::Number(sy),
            curve,
        });
    }
    (xs, ys)
}

/// The legacy format records toggle instants, not booleans: visibility
/// alternates by keyframe parity, starting visible.
fn parse_visibility(keyframes: &[SourceKeyframe]) -> Vec<CurveKeyframe> {
    keyframes
        .iter()
        .enumerate()
        .map(|(i, kf)| CurveKeyframe {
            frame: kf.time,
            value: CurveValue::Bool(i % 2 == 0),
            curve: None,
        })
        .collect()
}

fn parse_colors(keyframes: &[SourceKeyframe]) -> Vec<CurveKeyframe> {
    keyframes
        .iter()
        .filter_map(|kf| {
            Some(CurveKeyframe {
                frame: kf.time,
                value: CurveValue::Color(raw::as_color3(&kf.value)?),
                curve: easing_name(kf.easing.as_ref()),
            })
        })
        .collect()
}

/// Display-frame keyframes store `[frame, sheet]`, the reverse of the
/// static property order. Unresolvable frames drop out of the curve.
fn parse_frames(keyframes: &[SourceKeyframe], db: &dyn AssetDb, root_url: &str) -> Vec<CurveKeyframe> {
    keyframes
        .iter()
        .filter_map(|kf| {
            let (frame, sheet) = raw::as_frame_ref(&kf.value)?;
            let id = resolve_sprite_frame(db, root_url, Some(&(sheet, frame)), None)?;
            Some(CurveKeyframe {
                frame: kf.time,
                value: CurveValue::Frame(id),
                curve: None,
            })
        })
        .collect()
}
