//! The prefab tree being built.
//!
//! This is the write-side model of the target runtime's scene graph: plain
//! data, serialized whole by the persistence collaborator once a file's
//! conversion finishes. Nodes own their children; components are a closed
//! set of typed variants.

use crate::assets::AssetId;
use glam::Vec2;
use serde::Serialize;

/// A mutable scene-graph node under construction. Owned by its parent once
/// attached; the root is owned by the driver for the duration of one file's
/// conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefabNode {
    pub name: String,
    pub anchor: Vec2,
    pub content_size: Vec2,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub color: [u8; 3],
    pub opacity: u8,
    pub active: bool,
    pub children: Vec<PrefabNode>,
    pub components: Vec<Component>,
}

impl Default for PrefabNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            anchor: Vec2::ZERO,
            content_size: Vec2::ZERO,
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            color: [255, 255, 255],
            opacity: 255,
            active: true,
            children: Vec::new(),
            components: Vec::new(),
        }
    }
}

impl PrefabNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn sprite(&self) -> Option<&SpriteComponent> {
        self.components.iter().find_map(|c| match c {
            Component::Sprite(sp) => Some(sp),
            _ => None,
        })
    }

    pub fn sprite_mut(&mut self) -> Option<&mut SpriteComponent> {
        self.components.iter_mut().find_map(|c| match c {
            Component::Sprite(sp) => Some(sp),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&PrefabNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follows a slash-separated path of child names from this node.
    /// Also yields the final segment's parent, whose anchor and size the
    /// animation reconstructor needs for position curves.
    pub fn lookup(&self, path: &str) -> Option<NodeLookup<'_>> {
        let mut parent: Option<&PrefabNode> = None;
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            parent = Some(node);
            node = node.child(segment)?;
        }
        Some(NodeLookup { node, parent })
    }

    /// Descends a child-index trail; used to reach the effective node of a
    /// creator that returns a subtree (the scroll container's content).
    pub fn descend_mut(&mut self, trail: &[usize]) -> &mut PrefabNode {
        let mut node = self;
        for &idx in trail {
            node = &mut node.children[idx];
        }
        node
    }

    pub fn descend(&self, trail: &[usize]) -> &PrefabNode {
        let mut node = self;
        for &idx in trail {
            node = &node.children[idx];
        }
        node
    }
}

/// A resolved path lookup: the node plus the parent that owns it.
pub struct NodeLookup<'a> {
    pub node: &'a PrefabNode,
    pub parent: Option<&'a PrefabNode>,
}

/// The closed set of component types the conversion can emit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Component {
    Sprite(SpriteComponent),
    Label(LabelComponent),
    Button(ButtonComponent),
    ScrollView(ScrollViewComponent),
    Scrollbar(ScrollbarComponent),
    Widget(WidgetComponent),
    Mask,
    ParticleSystem(ParticleComponent),
    Animation(AnimationComponent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeMode {
    /// Component size follows the source image.
    Raw,
    /// Explicit content size.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpriteKind {
    Simple,
    Sliced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteComponent {
    pub frame: Option<AssetId>,
    pub size_mode: SizeMode,
    pub kind: SpriteKind,
    pub trim: bool,
    pub src_blend: i64,
    pub dst_blend: i64,
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self {
            frame: None,
            size_mode: SizeMode::Raw,
            kind: SpriteKind::Simple,
            trim: false,
            src_blend: 770,
            dst_blend: 771,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Overflow {
    None,
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelComponent {
    pub text: String,
    pub overflow: Overflow,
    pub use_original_size: bool,
    pub line_height: f32,
    pub horizontal_align: i64,
    pub vertical_align: i64,
    pub font: Option<AssetId>,
    pub font_size: Option<f32>,
}

impl Default for LabelComponent {
    fn default() -> Self {
        Self {
            text: String::new(),
            overflow: Overflow::None,
            use_original_size: true,
            line_height: 0.0,
            horizontal_align: 0,
            vertical_align: 0,
            font: None,
            font_size: None,
        }
    }
}

/// Sprite-transition button; normal and hover share one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonComponent {
    pub interactable: bool,
    pub normal: Option<AssetId>,
    pub hover: Option<AssetId>,
    pub pressed: Option<AssetId>,
    pub disabled: Option<AssetId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollViewComponent {
    pub inertia: bool,
    pub horizontal: bool,
    pub vertical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrollbarAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollbarComponent {
    pub axis: ScrollbarAxis,
}

/// Edge-alignment constraints for synthesized scrollbars.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WidgetComponent {
    pub align_left: bool,
    pub align_right: bool,
    pub align_top: bool,
    pub align_bottom: bool,
}

/// A `base ± variance` scalar pair, the particle system's native encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Varied {
    pub base: f32,
    pub var: f32,
}

impl Varied {
    pub fn new(base: f32, var: f32) -> Self {
        Self { base, var }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleComponent {
    pub emission_rate: f32,
    pub duration: f32,
    pub total_particles: i64,
    pub life: Varied,
    pub start_size: Varied,
    pub end_size: Varied,
    pub start_spin: Varied,
    pub end_spin: Varied,
    pub angle: Varied,
    pub start_color: [u8; 4],
    pub start_color_var: [u8; 4],
    pub end_color: [u8; 4],
    pub end_color_var: [u8; 4],
    pub src_blend: i64,
    pub dst_blend: i64,
    pub pos_var: Vec2,
    pub shape: EmitterShape,
    pub texture: Option<AssetId>,
}

/// Mode-specific emitter parameters; gravity-style and radius-style expose
/// disjoint field sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode")]
pub enum EmitterShape {
    Gravity {
        gravity: Vec2,
        speed: Varied,
        tangential_accel: Varied,
        radial_accel: Varied,
    },
    Radius {
        start_radius: Varied,
        end_radius: Varied,
        rotate_per_second: Varied,
    },
}

/// Clip list attached to a converted tree's root.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnimationComponent {
    pub clips: Vec<ClipRef>,
    pub default_clip: Option<String>,
    pub play_on_load: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipRef {
    pub name: String,
    pub asset: AssetId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_follows_renamed_segments() {
        let mut root = PrefabNode::new("Scene");
        let mut panel = PrefabNode::new("panel");
        panel.children.push(PrefabNode::new("box"));
        panel.children.push(PrefabNode::new("box_1"));
        root.children.push(panel);

        let hit = root.lookup("panel/box_1").expect("path should resolve");
        assert_eq!(hit.node.name, "box_1");
        assert_eq!(hit.parent.unwrap().name, "panel");

        assert!(root.lookup("panel/missing").is_none());
    }

    #[test]
    fn empty_path_resolves_to_self_without_parent() {
        let root = PrefabNode::new("Scene");
        let hit = root.lookup("").unwrap();
        assert_eq!(hit.node.name, "Scene");
        assert!(hit.parent.is_none());
    }
}
