//! The node-graph walker.
//!
//! One invocation per source node: **create** (type-specific creators for
//! nested-file and scroll-container nodes, a plain node otherwise) →
//! **configure** (record animation data under the node's path, apply base
//! properties, dispatch the matching builder) → **recurse** (children in
//! source order, collision-free names, attach, reposition anchor-relative).
//! Children are normalized against the parent's finalized content size, and
//! repositioned only after the parent's anchor and size are final.

use crate::builders::NodeKind;
use crate::context::{BatchContext, ConversionContext};
use crate::driver::Importer;
use crate::prefab::PrefabNode;
use crate::units;
use ccb_data::{PropertyBag, SizedValue, SourceNode};
use glam::Vec2;
use tracing::warn;

impl Importer {
    /// Converts one source node (and everything under it) into a prefab
    /// node. `node_path` is the slash path from the conversion root; the
    /// root itself passes `""` and additionally takes the tree's display
    /// name. Never fails: unrecognized types and unresolvable nested
    /// references degrade to plain structural nodes.
    pub(crate) fn convert_node(
        &mut self,
        batch: &mut BatchContext,
        ctx: &mut ConversionContext,
        data: &SourceNode,
        node_path: &str,
        parent_size: Vec2,
    ) -> PrefabNode {
        let kind = NodeKind::from_tag(&data.base_class);
        let props = PropertyBag::from_entries(&data.properties);
        let is_root = node_path.is_empty();

        // Create. The root node is always created in place; creators only
        // run for children (the effective trail points at the node the rest
        // of the conversion should apply to: the scroll container's
        // content, not the container itself).
        let (mut node, effective) = if is_root {
            (PrefabNode::default(), Vec::new())
        } else {
            match kind {
                NodeKind::CcbFile => (self.instantiate_nested(batch, &props), Vec::new()),
                NodeKind::ScrollView => self.create_scroll_view(batch, &props, parent_size),
                _ => (PrefabNode::default(), Vec::new()),
            }
        };

        // Configure.
        if let Some(animated) = &data.animated_properties {
            ctx.animation.record(node_path, animated);
        }
        {
            let target = node.descend_mut(&effective);
            if is_root {
                target.name = data.display_name.clone();
            }
            // Scroll-view creators apply base properties to the container
            // themselves; everything else configures the node in place.
            if kind != NodeKind::ScrollView {
                apply_base_properties(target, &props, parent_size);
            }
        }
        match kind {
            NodeKind::Sprite => self.init_sprite(node.descend_mut(&effective), &props),
            NodeKind::Scale9Sprite => self.init_scale9_sprite(node.descend_mut(&effective), &props),
            NodeKind::LayerColor => self.init_layer_color(node.descend_mut(&effective)),
            NodeKind::LabelTtf | NodeKind::LabelBmFont => {
                self.init_label(node.descend_mut(&effective), &props)
            }
            NodeKind::MenuItemImage => self.init_button(node.descend_mut(&effective), &props),
            NodeKind::ControlButton => {
                self.init_control_button(node.descend_mut(&effective), &props)
            }
            NodeKind::Particle => self.init_particle(node.descend_mut(&effective), &props),
            NodeKind::Plain | NodeKind::ScrollView | NodeKind::CcbFile => {}
            NodeKind::Unknown => {
                tracing::debug!(tag = %data.base_class, "no importer for node type; keeping a plain node");
            }
        }

        // Recurse.
        if !data.children.is_empty() {
            let (own_anchor, own_size) = {
                let target = node.descend(&effective);
                (target.anchor, target.content_size)
            };
            let prefix = if is_root {
                String::new()
            } else {
                format!("{node_path}/")
            };
            let mut added: Vec<String> = Vec::new();
            for child_data in &data.children {
                let child_name = unique_child_name(&child_data.display_name, &added);
                let child_path = format!("{prefix}{child_name}");
                let mut child = self.convert_node(batch, ctx, child_data, &child_path, own_size);
                child.name = child_name.clone();
                child.position = units::to_parent_relative(child.position, own_anchor, own_size);
                added.push(child_name);
                node.descend_mut(&effective).children.push(child);
            }
        }

        node
    }
}

/// Base properties shared by every node type: visibility, anchor, unit
/// normalization of size and position, rotation, flip-folded scale, color,
/// opacity.
pub(crate) fn apply_base_properties(node: &mut PrefabNode, props: &PropertyBag, parent_size: Vec2) {
    node.active = props.bool_or("visible", true);

    let anchor = props.f32_pair_or("anchorPoint", [0.0, 0.0]);
    node.anchor = if props.bool_or("ignoreAnchorPointForPosition", false) {
        Vec2::ZERO
    } else {
        Vec2::from(anchor)
    };

    set_size_and_position(node, props, parent_size);

    node.rotation = props.f32_or("rotation", 0.0);

    let flip = props.bool_pair_or("flip", [false, false]);
    let scale = props.f32_pair_or("scale", [1.0, 1.0]);
    node.scale = Vec2::new(
        if flip[0] { -scale[0] } else { scale[0] },
        if flip[1] { -scale[1] } else { scale[1] },
    );

    node.color = props.color3_or("color", [255, 255, 255]);
    node.opacity = props.f32_or("opacity", 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Size comes from the first of `preferedSize`/`dimensions`/`contentSize`
/// the node carries; both size and position resolve against the parent size
/// exactly once, here.
fn set_size_and_position(node: &mut PrefabNode, props: &PropertyBag, parent_size: Vec2) {
    let zero = SizedValue::new(0.0, 0.0, 0);
    let size = if props.contains("preferedSize") {
        props.sized_or("preferedSize", zero)
    } else if props.contains("dimensions") {
        props.sized_or("dimensions", zero)
    } else {
        props.sized_or("contentSize", zero)
    };
    node.content_size = units::resolve_size(size, parent_size);

    let position = props.sized_or("position", zero);
    node.position = units::resolve_position(position, parent_size);
}

/// Picks a collision-free sibling name: slashes become underscores (they
/// would corrupt animation paths), conflicts get a numeric suffix. Renames
/// are surfaced as warnings.
pub(crate) fn unique_child_name(display_name: &str, taken: &[String]) -> String {
    let base = display_name.replace('/', "_");
    let mut candidate = base.clone();
    let mut counter = 1;
    while taken.iter().any(|name| name == &candidate) {
        candidate = format!("{base}_{counter}");
        counter += 1;
    }

    if candidate != display_name {
        warn!(from = display_name, to = %candidate, "node renamed during conversion");
    }

    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_collisions_get_numeric_suffixes() {
        let mut taken: Vec<String> = Vec::new();
        for expected in ["box", "box_1", "box_2"] {
            let name = unique_child_name("box", &taken);
            assert_eq!(name, expected);
            taken.push(name);
        }
    }

    #[test]
    fn slashes_are_folded_into_underscores() {
        assert_eq!(unique_child_name("a/b", &[]), "a_b");
    }

    #[test]
    fn base_properties_fold_flip_into_scale_sign() {
        let props = PropertyBag::from_entries(&[
            entry("scale", serde_json::json!([2.0, 3.0, false, 0])),
            entry("flip", serde_json::json!([true, false])),
        ]);
        let mut node = PrefabNode::default();
        apply_base_properties(&mut node, &props, Vec2::ZERO);
        assert_eq!(node.scale, Vec2::new(-2.0, 3.0));
    }

    #[test]
    fn ignore_anchor_flag_forces_zero_anchor() {
        let props = PropertyBag::from_entries(&[
            entry("anchorPoint", serde_json::json!([0.5, 0.5])),
            entry("ignoreAnchorPointForPosition", serde_json::json!(true)),
        ]);
        let mut node = PrefabNode::default();
        apply_base_properties(&mut node, &props, Vec2::ZERO);
        assert_eq!(node.anchor, Vec2::ZERO);
    }

    #[test]
    fn preferred_size_wins_over_content_size() {
        let props = PropertyBag::from_entries(&[
            entry("preferedSize", serde_json::json!([50.0, 50.0, 1])),
            entry("contentSize", serde_json::json!([10.0, 10.0, 0])),
        ]);
        let mut node = PrefabNode::default();
        apply_base_properties(&mut node, &props, Vec2::new(200.0, 100.0));
        assert_eq!(node.content_size, Vec2::new(100.0, 50.0));
    }

    fn entry(name: &str, value: serde_json::Value) -> ccb_data::PropertyEntry {
        ccb_data::PropertyEntry {
            name: name.to_string(),
            kind: String::new(),
            value,
        }
    }
}
