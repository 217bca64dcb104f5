use anyhow::Result;
use ccb_import::animation::AnimationClip;
use ccb_import::assets::{AssetDb, AssetId, DocumentLoader, SourceFs, SpriteMeta};
use ccb_import::prefab::{Component, EmitterShape, PrefabNode};
use ccb_import::{ImportOptions, Importer};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DbState {
    /// Logical URLs the repository knows about (source images, sheets, fonts).
    assets: HashSet<String>,
    /// URLs registered by persist calls during the run.
    registered: HashSet<String>,
    prefabs: Vec<(PathBuf, String, PrefabNode)>,
    clips: Vec<(PathBuf, String, AnimationClip)>,
    meta: HashMap<String, SpriteMeta>,
}

#[derive(Clone, Default)]
struct MockDb {
    state: Arc<Mutex<DbState>>,
}

impl MockDb {
    fn known(&self, url: &str) -> bool {
        let state = self.state.lock().unwrap();
        url.starts_with("db://internal/")
            || state.assets.contains(url)
            || state.registered.contains(url)
    }
}

impl AssetDb for MockDb {
    fn resolve(&self, url: &str) -> Option<AssetId> {
        self.known(url).then(|| AssetId::new(format!("uuid:{url}")))
    }

    fn contains(&self, id: &AssetId) -> bool {
        id.0.strip_prefix("uuid:").is_some_and(|url| self.known(url))
    }

    fn url_exists(&self, url: &str) -> bool {
        self.known(url)
    }

    fn persist_prefab(&mut self, tree: &PrefabNode, fs_path: &Path, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.registered.insert(url.to_string());
        state
            .prefabs
            .push((fs_path.to_path_buf(), url.to_string(), tree.clone()));
        Ok(())
    }

    fn persist_clip(&mut self, clip: &AnimationClip, fs_path: &Path, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.registered.insert(url.to_string());
        state
            .clips
            .push((fs_path.to_path_buf(), url.to_string(), clip.clone()));
        Ok(())
    }

    fn query_meta(&self, id: &AssetId) -> Option<SpriteMeta> {
        self.contains(id).then(|| {
            let state = self.state.lock().unwrap();
            state.meta.get(&id.0).cloned().unwrap_or_default()
        })
    }

    fn save_meta(&mut self, id: &AssetId, meta: SpriteMeta) -> Result<()> {
        self.state.lock().unwrap().meta.insert(id.0.clone(), meta);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockSources {
    documents: Arc<HashMap<PathBuf, Value>>,
    extra_files: Arc<HashMap<PathBuf, String>>,
}

impl SourceFs for MockSources {
    fn exists(&self, path: &Path) -> bool {
        self.documents.contains_key(path) || self.extra_files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.extra_files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }
}

impl DocumentLoader for MockSources {
    fn load(&self, path: &Path) -> Result<ccb_data::SceneDocument> {
        let raw = self
            .documents
            .get(path)
            .ok_or_else(|| anyhow::anyhow!("no such document: {}", path.display()))?;
        Ok(serde_json::from_value(raw.clone())?)
    }
}

struct Rig {
    importer: Importer,
    db: MockDb,
}

fn rig(documents: Vec<(&str, Value)>, assets: &[&str]) -> Rig {
    rig_with_files(documents, assets, Vec::new())
}

fn rig_with_files(documents: Vec<(&str, Value)>, assets: &[&str], files: Vec<(&str, &str)>) -> Rig {
    let db = MockDb::default();
    {
        let mut state = db.state.lock().unwrap();
        state.assets = assets.iter().map(|s| s.to_string()).collect();
    }
    let sources = MockSources {
        documents: Arc::new(
            documents
                .into_iter()
                .map(|(p, v)| (PathBuf::from(p), v))
                .collect(),
        ),
        extra_files: Arc::new(
            files
                .into_iter()
                .map(|(p, v)| (PathBuf::from(p), v.to_string()))
                .collect(),
        ),
    };
    let importer = Importer::new(
        Box::new(db.clone()),
        Box::new(sources.clone()),
        Box::new(sources),
        ImportOptions {
            res_root_url: "db://assets".to_string(),
            res_temp_path: PathBuf::from("/res"),
            ccbs_temp_path: PathBuf::from("/ccbs"),
        },
    );
    Rig { importer, db }
}

fn node(base_class: &str, name: &str, properties: Value, children: Value) -> Value {
    json!({
        "baseClass": base_class,
        "displayName": name,
        "properties": properties,
        "children": children,
    })
}

fn prop(name: &str, kind: &str, value: Value) -> Value {
    json!({ "name": name, "type": kind, "value": value })
}

fn doc(node_graph: Value) -> Value {
    json!({
        "nodeGraph": node_graph,
        "sequences": [],
        "resolutions": [{ "width": 480.0, "height": 320.0 }],
        "currentResolution": 0,
    })
}

fn first_prefab(db: &MockDb) -> PrefabNode {
    let state = db.state.lock().unwrap();
    state.prefabs.first().expect("a prefab was persisted").2.clone()
}

#[test]
fn colliding_sibling_names_get_suffixes() {
    let scene = doc(node(
        "CCNode",
        "Scene",
        json!([]),
        json!([
            node("CCNode", "box", json!([]), json!([])),
            node("CCNode", "box", json!([]), json!([])),
        ]),
    ));
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);

    let report = rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);
    assert!(report.is_clean());

    let root = first_prefab(&rig.db);
    let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["box", "box_1"]);
}

#[test]
fn resubmitting_a_file_is_idempotent() {
    let scene = doc(node("CCNode", "Scene", json!([]), json!([])));
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);

    let report = rig.importer.import_files(&[
        PathBuf::from("/ccbs/scene.ccb"),
        PathBuf::from("/ccbs/scene.ccb"),
    ]);

    assert!(report.is_clean());
    assert_eq!(report.imported.len(), 1);
    assert_eq!(rig.db.state.lock().unwrap().prefabs.len(), 1);
}

#[test]
fn missing_file_is_skipped_not_fatal() {
    let mut rig = rig(vec![], &[]);
    let report = rig.importer.import_files(&[PathBuf::from("/ccbs/gone.ccb")]);
    assert!(report.is_clean());
    assert_eq!(report.missing.len(), 1);
    assert!(rig.db.state.lock().unwrap().prefabs.is_empty());
}

#[test]
fn malformed_document_fails_that_file_only() {
    let good = doc(node("CCNode", "Scene", json!([]), json!([])));
    let mut rig = rig(
        vec![
            ("/ccbs/bad.ccb", json!("not a scene document")),
            ("/ccbs/good.ccb", good),
        ],
        &[],
    );

    let report = rig.importer.import_files(&[
        PathBuf::from("/ccbs/bad.ccb"),
        PathBuf::from("/ccbs/good.ccb"),
    ]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.imported, vec![PathBuf::from("/ccbs/good.ccb")]);
    // No partial result for the malformed file.
    assert_eq!(rig.db.state.lock().unwrap().prefabs.len(), 1);
}

#[test]
fn unknown_node_type_degrades_to_plain_node() {
    let scene = doc(node(
        "CCNode",
        "Scene",
        json!([]),
        json!([node("CCTableView", "table", json!([]), json!([]))]),
    ));
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let root = first_prefab(&rig.db);
    assert_eq!(root.children[0].name, "table");
    assert!(root.children[0].components.is_empty());
}

#[test]
fn base_properties_and_anchor_relative_positioning() {
    let scene = doc(node(
        "CCNode",
        "Scene",
        json!([
            prop("contentSize", "size", json!([200.0, 100.0, 0])),
            prop("anchorPoint", "point", json!([0.5, 0.5])),
        ]),
        json!([node(
            "CCNode",
            "center",
            json!([
                prop("position", "position", json!([50.0, 50.0, 4])),
                prop("rotation", "float", json!(45.0)),
                prop("opacity", "byte", json!(128)),
            ]),
            json!([]),
        )]),
    ));
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let root = first_prefab(&rig.db);
    assert_eq!(root.name, "Scene");
    let child = &root.children[0];
    // Percent position (50%, 50%) of a 200×100 parent, re-expressed
    // relative to the parent's centered anchor.
    assert_eq!(child.position, glam::Vec2::new(0.0, 0.0));
    assert_eq!(child.rotation, 45.0);
    assert_eq!(child.opacity, 128);
}

#[test]
fn nested_file_reference_instantiates_converted_tree() {
    let widget = doc(node(
        "CCSprite",
        "Widget",
        json!([prop("displayFrame", "spriteFrame", json!(["sheet.plist", "icon.png"]))]),
        json!([]),
    ));
    let scene = doc(node(
        "CCNode",
        "Scene",
        json!([]),
        json!([node(
            "CCBFile",
            "widgetRef",
            json!([prop("ccbFile", "ccbFile", json!("widget.ccb"))]),
            json!([]),
        )]),
    ));
    let mut rig = rig(
        vec![("/ccbs/scene.ccb", scene), ("/ccbs/widget.ccb", widget)],
        &["db://assets/sheet.plist/icon.png"],
    );

    let report = rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);
    assert!(report.is_clean());

    let state = rig.db.state.lock().unwrap();
    // The nested file was converted (and persisted) exactly once.
    assert_eq!(state.prefabs.len(), 2);
    let scene_tree = &state
        .prefabs
        .iter()
        .find(|(_, url, _)| url.ends_with("scene.prefab"))
        .unwrap()
        .2;
    let reference = &scene_tree.children[0];
    assert_eq!(reference.name, "widgetRef");
    assert!(reference.sprite().is_some(), "instantiated copy keeps its components");
}

#[test]
fn missing_nested_file_degrades_to_plain_node() {
    let scene = doc(node(
        "CCNode",
        "Scene",
        json!([]),
        json!([node(
            "CCBFile",
            "ref",
            json!([prop("ccbFile", "ccbFile", json!("absent.ccb"))]),
            json!([]),
        )]),
    ));
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);
    let report = rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    assert!(report.is_clean());
    let root = first_prefab(&rig.db);
    assert_eq!(root.children[0].name, "ref");
    assert!(root.children[0].components.is_empty());
}

#[test]
fn cyclic_nested_references_terminate_with_a_stub() {
    let a = doc(node(
        "CCNode",
        "A",
        json!([]),
        json!([node(
            "CCBFile",
            "toB",
            json!([prop("ccbFile", "ccbFile", json!("b.ccb"))]),
            json!([]),
        )]),
    ));
    let b = doc(node(
        "CCNode",
        "B",
        json!([]),
        json!([node(
            "CCBFile",
            "toA",
            json!([prop("ccbFile", "ccbFile", json!("a.ccb"))]),
            json!([]),
        )]),
    ));
    let mut rig = rig(vec![("/ccbs/a.ccb", a), ("/ccbs/b.ccb", b)], &[]);

    let report = rig.importer.import_files(&[PathBuf::from("/ccbs/a.ccb")]);
    assert!(report.is_clean());

    let state = rig.db.state.lock().unwrap();
    assert_eq!(state.prefabs.len(), 2);
    let b_tree = &state
        .prefabs
        .iter()
        .find(|(_, url, _)| url.ends_with("b.prefab"))
        .unwrap()
        .2;
    // The back-reference into the in-progress file became a plain stub.
    assert_eq!(b_tree.children[0].name, "toA");
    assert!(b_tree.children[0].children.is_empty());
}

#[test]
fn nine_slice_borders_are_written_back_to_asset_meta() {
    let scene = doc(node(
        "CCScale9Sprite",
        "panel",
        json!([
            prop("spriteFrame", "spriteFrame", json!(["sheet.plist", "panel.png"])),
            prop("preferedSize", "size", json!([120.0, 60.0, 0])),
            prop("insetTop", "float", json!(4.0)),
            prop("insetBottom", "float", json!(5.0)),
            prop("insetLeft", "float", json!(6.0)),
            prop("insetRight", "float", json!(7.0)),
        ]),
        json!([]),
    ));
    let mut rig = rig(
        vec![("/ccbs/scene.ccb", scene)],
        &["db://assets/sheet.plist/panel.png"],
    );
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let root = first_prefab(&rig.db);
    assert_eq!(root.content_size, glam::Vec2::new(120.0, 60.0));

    let state = rig.db.state.lock().unwrap();
    let meta = state
        .meta
        .get("uuid:db://assets/sheet.plist/panel.png")
        .expect("meta was saved");
    assert_eq!(meta.trim_threshold, -1);
    assert_eq!(
        (meta.border_top, meta.border_bottom, meta.border_left, meta.border_right),
        (4.0, 5.0, 6.0, 7.0)
    );
}

#[test]
fn scroll_view_synthesizes_content_and_scrollbars() {
    let panel = doc(node("CCNode", "Panel", json!([]), json!([])));
    let scene = doc(node(
        "CCNode",
        "Scene",
        json!([]),
        json!([node(
            "CCScrollView",
            "scroll",
            json!([
                prop("contentSize", "size", json!([100.0, 80.0, 0])),
                prop("direction", "int", json!(2)),
                prop("container", "ccbFile", json!("panel.ccb")),
            ]),
            json!([node("CCNode", "inner", json!([]), json!([]))]),
        )]),
    ));
    let mut rig = rig(
        vec![("/ccbs/scene.ccb", scene), ("/ccbs/panel.ccb", panel)],
        &[],
    );
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let state = rig.db.state.lock().unwrap();
    let scene_tree = &state
        .prefabs
        .iter()
        .find(|(_, url, _)| url.ends_with("scene.prefab"))
        .unwrap()
        .2;

    let scroll = &scene_tree.children[0];
    assert_eq!(scroll.name, "scroll");
    assert!(scroll
        .components
        .iter()
        .any(|c| matches!(c, Component::Mask)));
    let view = scroll
        .components
        .iter()
        .find_map(|c| match c {
            Component::ScrollView(sv) => Some(sv),
            _ => None,
        })
        .expect("scroll component");
    assert!(view.horizontal && view.vertical && view.inertia);

    let names: Vec<_> = scroll.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["container", "vScrollBar", "hScrollBar"]);

    // Source children land under the content node, not the container node.
    let container = &scroll.children[0];
    assert_eq!(container.children[0].name, "inner");

    let vbar = &scroll.children[1];
    assert_eq!(vbar.content_size, glam::Vec2::new(15.0, 80.0));
    assert_eq!(vbar.children[0].content_size, glam::Vec2::new(15.0, 56.0));
    let hbar = &scroll.children[2];
    assert_eq!(hbar.content_size, glam::Vec2::new(100.0, 15.0));
    assert_eq!(hbar.children[0].content_size, glam::Vec2::new(70.0, 15.0));
}

#[test]
fn particle_without_emitter_mode_defaults_to_gravity() {
    let scene = doc(node(
        "CCParticleSystemQuad",
        "emitter",
        json!([
            prop("gravity", "point", json!([0.0, -90.0])),
            prop("speed", "floatVar", json!([60.0, 5.0])),
            prop("startColor", "colorVar", json!([[1.0, 0.5, 0.0, 1.0], [0.0, 0.0, 0.0, 0.0]])),
        ]),
        json!([]),
    ));
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let root = first_prefab(&rig.db);
    let particle = root
        .components
        .iter()
        .find_map(|c| match c {
            Component::ParticleSystem(p) => Some(p),
            _ => None,
        })
        .expect("particle component");

    match &particle.shape {
        EmitterShape::Gravity { gravity, speed, .. } => {
            assert_eq!(*gravity, glam::Vec2::new(0.0, -90.0));
            assert_eq!((speed.base, speed.var), (60.0, 5.0));
        }
        EmitterShape::Radius { .. } => panic!("expected gravity-style emitter"),
    }
    // Normalized float channels rescale to 0–255.
    assert_eq!(particle.start_color, [255, 128, 0, 255]);
}

#[test]
fn bitmap_font_size_is_recovered_from_the_config() {
    let scene = doc(node(
        "CCLabelBMFont",
        "label",
        json!([
            prop("string", "text", json!("hello")),
            prop("fntFile", "fntFile", json!("fonts/menu.fnt")),
        ]),
        json!([]),
    ));
    let mut rig = rig_with_files(
        vec![("/ccbs/scene.ccb", scene)],
        &["db://assets/fonts/menu.fnt"],
        vec![(
            "/res/fonts/menu.fnt",
            "info face=\"Menu\" size=24 bold=0\ncommon lineHeight=28",
        )],
    );
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let root = first_prefab(&rig.db);
    let label = root
        .components
        .iter()
        .find_map(|c| match c {
            Component::Label(l) => Some(l),
            _ => None,
        })
        .expect("label component");
    assert_eq!(label.font_size, Some(24.0));
    assert!(label.font.is_some());
}

#[test]
fn autoplay_sequence_becomes_the_default_clip() {
    let scene = json!({
        "nodeGraph": {
            "baseClass": "CCNode",
            "displayName": "Scene",
            "properties": [],
            "children": [],
            "animatedProperties": {
                "0": {
                    "rotation": {
                        "type": 2,
                        "keyframes": [
                            { "time": 0.0, "value": 0.0 },
                            { "time": 1.0, "value": 180.0, "easing": { "type": 2 } }
                        ]
                    }
                },
                "1": {
                    "opacity": {
                        "type": 3,
                        "keyframes": [{ "time": 0.0, "value": 255.0 }]
                    }
                }
            }
        },
        "sequences": [
            { "name": "intro", "length": 1.0, "autoPlay": false },
            { "name": "idle", "length": 2.0, "autoPlay": true }
        ],
        "resolutions": [{ "width": 480.0, "height": 320.0 }],
        "currentResolution": 0,
    });
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);
    let report = rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);
    assert!(report.is_clean());

    let state = rig.db.state.lock().unwrap();
    assert_eq!(state.clips.len(), 2);
    assert!(state
        .clips
        .iter()
        .all(|(path, _, _)| path.starts_with("/res/scene_action")));

    let clip = &state.clips[0].2;
    assert_eq!(clip.name, "intro");
    assert_eq!(clip.sample, 30.0);
    let rotation = &clip.curve_data.own.props["rotation"];
    assert_eq!(rotation.len(), 2);
    assert_eq!(rotation[1].curve, Some("cubicIn"));

    let root = &state.prefabs[0].2;
    let holder = root
        .components
        .iter()
        .find_map(|c| match c {
            Component::Animation(a) => Some(a),
            _ => None,
        })
        .expect("animation holder");
    assert_eq!(holder.clips.len(), 2);
    assert_eq!(holder.default_clip.as_deref(), Some("idle"));
    assert!(holder.play_on_load);
}

#[test]
fn child_position_curves_convert_against_the_parent_context() {
    let scene = json!({
        "nodeGraph": {
            "baseClass": "CCNode",
            "displayName": "Scene",
            "properties": [
                { "name": "contentSize", "type": "size", "value": [200.0, 100.0, 0] },
                { "name": "anchorPoint", "type": "point", "value": [0.5, 0.5] }
            ],
            "children": [{
                "baseClass": "CCNode",
                "displayName": "mover",
                "properties": [],
                "children": [],
                "animatedProperties": {
                    "0": {
                        "position": {
                            "type": 0,
                            "keyframes": [{ "time": 0.0, "value": [100.0, 50.0] }]
                        }
                    }
                }
            }]
        },
        "sequences": [{ "name": "slide", "length": 1.0, "autoPlay": false }],
        "resolutions": [],
        "currentResolution": 0,
    });
    let mut rig = rig(vec![("/ccbs/scene.ccb", scene)], &[]);
    rig.importer.import_files(&[PathBuf::from("/ccbs/scene.ccb")]);

    let state = rig.db.state.lock().unwrap();
    let clip = &state.clips[0].2;
    let mover = &clip.curve_data.paths["mover"];
    let position = &mover.props["position"];
    // (100, 50) in the parent's bottom-left space is the center of the
    // 200×100 parent, which sits on its (0.5, 0.5) anchor.
    assert_eq!(
        position[0].value,
        ccb_import::animation::CurveValue::Pair([0.0, 0.0])
    );
}
