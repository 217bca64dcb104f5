//! Type-specific node builders.
//!
//! One mapping per supported legacy class, dispatched through the closed
//! `NodeKind` variant set. Builders receive the already-normalized base node
//! plus its property bag and attach target components. They never fail:
//! unresolved assets leave the feature unset or fall back to the configured
//! placeholder images.

use crate::assets::{
    resolve_sprite_frame, fnt_font_size, join_url, AssetDb, AssetId, DEFAULT_BTN_DISABLED_URL,
    DEFAULT_BTN_NORMAL_URL, DEFAULT_BTN_PRESSED_URL, DEFAULT_HSCROLLBAR_URL,
    DEFAULT_SPLASH_SPRITE_URL, DEFAULT_VSCROLLBAR_URL,
};
use crate::context::BatchContext;
use crate::driver::Importer;
use crate::graph::apply_base_properties;
use crate::prefab::{
    ButtonComponent, Component, EmitterShape, LabelComponent, Overflow, ParticleComponent,
    PrefabNode, ScrollViewComponent, ScrollbarAxis, ScrollbarComponent, SizeMode, SpriteComponent,
    SpriteKind, Varied, WidgetComponent,
};
use crate::units;
use ccb_data::{PropertyBag, SizedValue};
use glam::Vec2;
use tracing::warn;

/// Closed set of legacy node classes the conversion maps. Anything else is
/// `Unknown` and degrades to a plain structural node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plain,
    Sprite,
    Scale9Sprite,
    LayerColor,
    LabelTtf,
    LabelBmFont,
    MenuItemImage,
    ControlButton,
    Particle,
    ScrollView,
    CcbFile,
    Unknown,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "CCNode" | "CCLayer" | "CCMenu" => NodeKind::Plain,
            "CCSprite" => NodeKind::Sprite,
            "CCScale9Sprite" => NodeKind::Scale9Sprite,
            "CCLayerColor" => NodeKind::LayerColor,
            "CCLabelTTF" => NodeKind::LabelTtf,
            "CCLabelBMFont" => NodeKind::LabelBmFont,
            "CCMenuItemImage" => NodeKind::MenuItemImage,
            "CCControlButton" => NodeKind::ControlButton,
            "CCParticleSystemQuad" => NodeKind::Particle,
            "CCScrollView" => NodeKind::ScrollView,
            "CCBFile" => NodeKind::CcbFile,
            _ => NodeKind::Unknown,
        }
    }
}

impl Importer {
    fn lookup_frame(
        &self,
        props: &PropertyBag,
        key: &str,
        default_url: Option<&str>,
    ) -> Option<AssetId> {
        resolve_sprite_frame(
            self.db.as_ref(),
            &self.options.res_root_url,
            props.frame_ref(key).as_ref(),
            default_url,
        )
    }

    fn resolve_font(&self, config_path: &str) -> Option<AssetId> {
        let url = join_url(&self.options.res_root_url, config_path);
        let id = self.db.resolve(&url)?;
        self.db.contains(&id).then_some(id)
    }

    /// Plain image: component size follows the source image.
    pub(crate) fn init_sprite(&mut self, node: &mut PrefabNode, props: &PropertyBag) {
        self.init_sprite_with_size_mode(node, props, "displayFrame", SizeMode::Raw);
    }

    fn init_sprite_with_size_mode(
        &mut self,
        node: &mut PrefabNode,
        props: &PropertyBag,
        frame_key: &str,
        size_mode: SizeMode,
    ) {
        let blend = props.f32_pair_or("blendFunc", [770.0, 771.0]);
        let src_blend = blend[0] as i64;
        node.add_component(Component::Sprite(SpriteComponent {
            frame: self.lookup_frame(props, frame_key, None),
            size_mode,
            kind: SpriteKind::Simple,
            trim: false,
            // The legacy "1" constant means the engine's default source blend.
            src_blend: if src_blend == 1 { 770 } else { src_blend },
            dst_blend: blend[1] as i64,
        }));
    }

    /// Nine-slice image. Border insets are written back onto the resolved
    /// image asset's metadata, the one step that mutates shared asset
    /// state rather than the node under construction.
    pub(crate) fn init_scale9_sprite(&mut self, node: &mut PrefabNode, props: &PropertyBag) {
        self.init_sprite_with_size_mode(node, props, "spriteFrame", SizeMode::Custom);

        let current = node.content_size;
        let preferred = props.sized_or("preferedSize", SizedValue::new(current.x, current.y, 0));
        node.content_size = Vec2::new(preferred.x, preferred.y);

        let Some(frame) = node.sprite().and_then(|sp| sp.frame.clone()) else {
            return;
        };
        if let Some(sprite) = node.sprite_mut() {
            sprite.kind = SpriteKind::Sliced;
        }

        let Some(mut meta) = self.db.query_meta(&frame) else {
            return;
        };
        meta.trim_threshold = -1;
        meta.border_top = props.f32_or("insetTop", 0.0);
        meta.border_bottom = props.f32_or("insetBottom", 0.0);
        meta.border_left = props.f32_or("insetLeft", 0.0);
        meta.border_right = props.f32_or("insetRight", 0.0);
        if let Err(err) = self.db.save_meta(&frame, meta) {
            warn!(asset = %frame.0, "failed to save nine-slice borders: {err:#}");
        }
    }

    /// Solid-color panel: a stretched placeholder image tinted by the node
    /// color.
    pub(crate) fn init_layer_color(&mut self, node: &mut PrefabNode) {
        node.add_component(Component::Sprite(SpriteComponent {
            frame: self.db.resolve(DEFAULT_SPLASH_SPRITE_URL),
            size_mode: SizeMode::Custom,
            ..SpriteComponent::default()
        }));
    }

    /// Text label; the TTF and bitmap-font classes share this builder.
    pub(crate) fn init_label(&mut self, node: &mut PrefabNode, props: &PropertyBag) {
        let mut label = LabelComponent::default();

        let dimensions = props.sized_or("dimensions", SizedValue::new(0.0, 0.0, 0));
        if dimensions.x == 0.0 || dimensions.y == 0.0 {
            label.overflow = Overflow::None;
        } else {
            label.overflow = Overflow::Clamp;
            label.use_original_size = false;
            node.content_size = Vec2::new(dimensions.x, dimensions.y);
        }

        label.text = props.str_or("string", "");
        label.line_height = 0.0;
        label.horizontal_align = props.i64_or("horizontalAlignment", 0);
        label.vertical_align = props.i64_or("verticalAlignment", 0);

        let ttf = props.str_or("fontName", "");
        let bitmap_font = props.str_or("fntFile", "");
        if !bitmap_font.is_empty() {
            label.font = self.resolve_font(&bitmap_font);
        } else if ttf.ends_with(".ttf") {
            label.font = self.resolve_font(&ttf);
        }

        let font_size = props.f32_pair_or("fontSize", [-1.0, 0.0]);
        if font_size[0] >= 0.0 {
            label.font_size = Some(font_size[0]);
        } else if !bitmap_font.is_empty() {
            // Best-effort: recover the nominal size from the font config;
            // continue silently when the read or the scan fails.
            let config_path = self.options.res_temp_path.join(&bitmap_font);
            if let Ok(config) = self.fs.read_to_string(&config_path) {
                label.font_size = fnt_font_size(&config);
            }
        }

        node.add_component(Component::Label(label));
    }

    /// Image button: sprite + interactive button; normal and hover share one
    /// frame, pressed/disabled resolve independently.
    pub(crate) fn init_button(&mut self, node: &mut PrefabNode, props: &PropertyBag) {
        let normal = self.lookup_frame(props, "normalSpriteFrame", Some(DEFAULT_BTN_NORMAL_URL));
        node.add_component(Component::Sprite(SpriteComponent {
            frame: normal.clone(),
            size_mode: SizeMode::Custom,
            ..SpriteComponent::default()
        }));
        node.add_component(Component::Button(ButtonComponent {
            interactable: props.bool_or("isEnabled", true),
            hover: normal.clone(),
            normal,
            pressed: self.lookup_frame(props, "selectedSpriteFrame", Some(DEFAULT_BTN_PRESSED_URL)),
            disabled: self.lookup_frame(props, "disabledSpriteFrame", Some(DEFAULT_BTN_DISABLED_URL)),
        }));
    }

    /// Composite control button: sliced background with suffix-indexed frame
    /// keys (`…|1`/`…|2`/`…|3` for normal/pressed/disabled) plus a
    /// synthesized title label at the button's visual center.
    pub(crate) fn init_control_button(&mut self, node: &mut PrefabNode, props: &PropertyBag) {
        let preferred = props.sized_or("preferedSize", SizedValue::new(0.0, 0.0, 0));
        node.content_size = Vec2::new(preferred.x, preferred.y);

        let normal = self.lookup_frame(props, "backgroundSpriteFrame|1", Some(DEFAULT_BTN_NORMAL_URL));
        node.add_component(Component::Sprite(SpriteComponent {
            frame: normal.clone(),
            size_mode: SizeMode::Custom,
            kind: SpriteKind::Sliced,
            ..SpriteComponent::default()
        }));
        node.add_component(Component::Button(ButtonComponent {
            interactable: props.bool_or("enabled", true),
            hover: normal.clone(),
            normal,
            pressed: self.lookup_frame(props, "backgroundSpriteFrame|2", Some(DEFAULT_BTN_PRESSED_URL)),
            disabled: self.lookup_frame(
                props,
                "backgroundSpriteFrame|3",
                Some(DEFAULT_BTN_DISABLED_URL),
            ),
        }));

        let mut title = PrefabNode::new("title");
        title.anchor = Vec2::from(props.f32_pair_or("labelAnchorPoint", [0.0, 0.0]));
        title.position =
            units::to_parent_relative(node.content_size / 2.0, node.anchor, node.content_size);
        title.color = props.color3_or("titleColor|1", [255, 255, 255]);

        let mut label = LabelComponent::default();
        label.text = props.str_or("title|1", "");
        label.line_height = 0.0;
        let title_size = props.f32_pair_or("titleTTFSize|1", [-1.0, 0.0]);
        if title_size[0] >= 0.0 {
            label.font_size = Some(title_size[0]);
        }
        let title_font = props.str_or("titleTTF|1", "");
        if title_font.ends_with(".ttf") {
            label.font = self.resolve_font(&title_font);
        }
        title.add_component(Component::Label(label));

        node.children.push(title);
    }

    /// Particle emitter: full property transcription, branching on the
    /// emitter mode. An unresolvable texture stays unset.
    pub(crate) fn init_particle(&mut self, node: &mut PrefabNode, props: &PropertyBag) {
        let shape = if props.i64_or("emitterMode", 0) == 0 {
            let gravity = props.f32_pair_or("gravity", [0.0, 0.0]);
            EmitterShape::Gravity {
                gravity: Vec2::from(gravity),
                speed: varied(props, "speed"),
                tangential_accel: varied(props, "tangentialAccel"),
                radial_accel: varied(props, "radialAccel"),
            }
        } else {
            EmitterShape::Radius {
                start_radius: varied(props, "startRadius"),
                end_radius: varied(props, "endRadius"),
                rotate_per_second: varied(props, "rotatePerSecond"),
            }
        };

        let (start_color, start_color_var) = color_quads(props, "startColor");
        let (end_color, end_color_var) = color_quads(props, "endColor");
        let blend = props.f32_pair_or("blendFunc", [770.0, 771.0]);
        let pos_var = props.f32_pair_or("posVar", [0.0, 0.0]);
        let life = props.f32_pair_or("life", [3.0, 0.25]);

        let texture = {
            let file = props.str_or("texture", "");
            if file.is_empty() {
                None
            } else {
                let url = join_url(&self.options.res_root_url, &file);
                self.db
                    .resolve(&url)
                    .filter(|id| self.db.contains(id))
            }
        };

        node.add_component(Component::ParticleSystem(ParticleComponent {
            emission_rate: props.f32_or("emissionRate", 10.0),
            duration: props.f32_or("duration", -1.0),
            total_particles: props.i64_or("totalParticles", 250),
            life: Varied::new(life[0], life[1]),
            start_size: varied(props, "startSize"),
            end_size: varied(props, "endSize"),
            start_spin: varied(props, "startSpin"),
            end_spin: varied(props, "endSpin"),
            angle: varied(props, "angle"),
            start_color,
            start_color_var,
            end_color,
            end_color_var,
            src_blend: blend[0] as i64,
            dst_blend: blend[1] as i64,
            pos_var: Vec2::from(pos_var),
            shape,
            texture,
        }));
    }

    /// Scroll container. A creator, not a plain builder: the returned tree
    /// is the container to attach, while the trail points at the content
    /// node, which is the effective node for configuration and recursion.
    pub(crate) fn create_scroll_view(
        &mut self,
        batch: &mut BatchContext,
        props: &PropertyBag,
        parent_size: Vec2,
    ) -> (PrefabNode, Vec<usize>) {
        let mut scroll = PrefabNode::default();
        apply_base_properties(&mut scroll, props, parent_size);

        let direction = props.i64_or("direction", 2);
        let vertical = direction == 1 || direction == 2;
        let horizontal = direction == 0 || direction == 2;

        if props.bool_or("clipsToBounds", true) {
            scroll.add_component(Component::Mask);
        }
        scroll.add_component(Component::ScrollView(ScrollViewComponent {
            inertia: props.bool_or("bounces", true),
            horizontal,
            vertical,
        }));

        let container_file = props.str_or("container", "");
        let mut content = self
            .node_from_ccb_path(batch, &container_file)
            .unwrap_or_default();
        content.name = "container".to_string();
        scroll.children.push(content);

        let view = scroll.content_size;
        if vertical {
            scroll
                .children
                .push(make_scroll_bar(self.db.as_ref(), ScrollbarAxis::Vertical, "vScrollBar", view));
        }
        if horizontal {
            scroll.children.push(make_scroll_bar(
                self.db.as_ref(),
                ScrollbarAxis::Horizontal,
                "hScrollBar",
                view,
            ));
        }

        (scroll, vec![0])
    }

    /// Nested-file reference: instantiates a copy of the referenced file's
    /// converted tree, or a plain node when the reference is absent or
    /// unconvertible.
    pub(crate) fn instantiate_nested(
        &mut self,
        batch: &mut BatchContext,
        props: &PropertyBag,
    ) -> PrefabNode {
        let file = props.str_or("ccbFile", "");
        self.node_from_ccb_path(batch, &file).unwrap_or_default()
    }
}

fn varied(props: &PropertyBag, key: &str) -> Varied {
    let pair = props.f32_pair_or(key, [0.0, 0.0]);
    Varied::new(pair[0], pair[1])
}

fn color_quads(props: &PropertyBag, key: &str) -> ([u8; 4], [u8; 4]) {
    let (base, var) = props.color_quad_pair_or(
        key,
        ([255.0, 255.0, 255.0, 255.0], [0.0, 0.0, 0.0, 0.0]),
    );
    (base.map(color_channel), var.map(color_channel))
}

/// Legacy colors mix 0–255 channels with 0–1 floats; anything ≤ 1 rescales.
fn color_channel(value: f32) -> u8 {
    if value > 1.0 {
        value.round().clamp(0.0, 255.0) as u8
    } else {
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// Synthesized scrollbar: a track node with edge-alignment constraints and
/// a handle child sized to 70% of the viewport along the scroll axis.
fn make_scroll_bar(
    db: &dyn AssetDb,
    axis: ScrollbarAxis,
    name: &str,
    view_size: Vec2,
) -> PrefabNode {
    const TRACK_THICKNESS: f32 = 15.0;
    const HANDLE_RATIO: f32 = 0.7;

    let mut track = PrefabNode::new(name);
    track.add_component(Component::Scrollbar(ScrollbarComponent { axis }));
    track.add_component(Component::Widget(WidgetComponent {
        align_right: true,
        align_bottom: true,
        align_top: axis == ScrollbarAxis::Vertical,
        align_left: axis == ScrollbarAxis::Horizontal,
    }));

    let (track_size, handle_size, frame_url) = match axis {
        ScrollbarAxis::Horizontal => (
            Vec2::new(view_size.x, TRACK_THICKNESS),
            Vec2::new(view_size.x * HANDLE_RATIO, TRACK_THICKNESS),
            DEFAULT_HSCROLLBAR_URL,
        ),
        ScrollbarAxis::Vertical => (
            Vec2::new(TRACK_THICKNESS, view_size.y),
            Vec2::new(TRACK_THICKNESS, view_size.y * HANDLE_RATIO),
            DEFAULT_VSCROLLBAR_URL,
        ),
    };
    track.content_size = track_size;

    let mut handle = PrefabNode::new("bar");
    handle.content_size = handle_size;
    handle.add_component(Component::Sprite(SpriteComponent {
        frame: db.resolve(frame_url),
        size_mode: SizeMode::Custom,
        kind: SpriteKind::Sliced,
        ..SpriteComponent::default()
    }));
    track.children.push(handle);

    track
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_tags_fall_into_unknown() {
        assert_eq!(NodeKind::from_tag("CCSprite"), NodeKind::Sprite);
        assert_eq!(NodeKind::from_tag("CCNode"), NodeKind::Plain);
        assert_eq!(NodeKind::from_tag("CCTableView"), NodeKind::Unknown);
    }

    #[test]
    fn color_channels_rescale_normalized_floats() {
        assert_eq!(color_channel(0.5), 128);
        assert_eq!(color_channel(1.0), 255);
        assert_eq!(color_channel(128.0), 128);
        assert_eq!(color_channel(300.0), 255);
    }
}
