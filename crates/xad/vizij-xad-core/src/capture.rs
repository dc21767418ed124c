//! Capture: build a document from a live selection (export path).

use crate::config::Config;
use crate::curve::{AnimCurve, Infinity, KeyframeRecord};
use crate::document::Document;
use crate::error::{Result, XadError};
use crate::header::{FileKind, Header, FORMAT_VERSION};
use crate::naming;
use crate::progress::Progress;
use crate::record::{AttributeRecord, ObjectRecord, PoseValue};
use crate::scene::{AttributeScope, FrameRange, SceneAdapter, SceneKey, SceneValue};

/// Everything capture needs besides the scene.
#[derive(Clone, Debug)]
pub struct CaptureRequest {
    /// Full object paths in selection order.
    pub selection: Vec<String>,
    pub start_frame: f64,
    pub end_frame: f64,
    pub kind: FileKind,
    pub scope: AttributeScope,
    pub comments: String,
    pub exported_by: String,
    pub exported_at: String,
}

impl CaptureRequest {
    pub fn new(selection: Vec<String>, start_frame: f64, end_frame: f64, kind: FileKind) -> Self {
        Self {
            selection,
            start_frame,
            end_frame,
            kind,
            scope: AttributeScope::default(),
            comments: String::new(),
            exported_by: current_user(),
            exported_at: timestamp(),
        }
    }

    pub fn with_scope(mut self, scope: AttributeScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    fn range(&self) -> FrameRange {
        FrameRange::new(self.start_frame, self.end_frame)
    }

    fn clip_length(&self) -> u32 {
        match self.kind {
            FileKind::Pose => 1,
            FileKind::Anim => ((self.end_frame - self.start_frame).round().max(0.0) as u32) + 1,
        }
    }
}

/// Login name of the exporting user, `"[Username]"` when unavailable.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "[Username]".to_string())
}

/// Export timestamp in `hh:mm-DD/MM/YY` form.
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M-%d/%m/%y").to_string()
}

/// Build a document from `request.selection`.
pub fn capture<S>(scene: &S, request: &CaptureRequest, cfg: &Config) -> Result<Document>
where
    S: SceneAdapter + ?Sized,
{
    if request.selection.is_empty() {
        return Err(XadError::EmptySelection);
    }
    naming::check_clashing_names(&request.selection)?;
    if request.kind == FileKind::Anim && request.end_frame - request.start_frame < 1.0 {
        return Err(XadError::InvalidFrameRange {
            start: request.start_frame,
            end: request.end_frame,
        });
    }

    let header = Header {
        format_version: FORMAT_VERSION,
        producer_version: cfg.producer_version.clone(),
        kind: request.kind,
        framerate: scene.framerate(),
        exported_by: request.exported_by.clone(),
        exported_at: request.exported_at.clone(),
        clip_length: request.clip_length(),
        origin_frame: request.start_frame,
        comments: request.comments.clone(),
    };
    let mut doc = Document::new(header);

    let mut progress = Progress::new(
        "Exporting Data",
        request.selection.len(),
        cfg.report_progress,
    );
    for path in &request.selection {
        let record = capture_object(scene, path, request)?;
        let namespace = naming::namespace_label(path);
        let idx = doc.push_object(namespace, record);
        if cfg.text_enabled() {
            log::debug!("captured {path} as [{namespace}][{idx}]");
        }
        progress.step();
    }
    progress.finish();

    let has_attrs = doc
        .data
        .values()
        .flat_map(|arena| arena.iter())
        .any(ObjectRecord::has_content);
    if !has_attrs {
        return Err(XadError::NoDataCaptured);
    }
    log::info!(
        "captured {} object(s) in {} namespace(s) as {}",
        request.selection.len(),
        doc.data.len(),
        request.kind
    );
    Ok(doc)
}

fn capture_object<S>(scene: &S, path: &str, request: &CaptureRequest) -> Result<ObjectRecord>
where
    S: SceneAdapter + ?Sized,
{
    let rotation_order = scene.rotation_order(path).unwrap_or_default();
    let mut record = ObjectRecord::new(naming::strip_path(path), rotation_order);

    for attr in scene.list_attributes(path, request.scope)? {
        let data = capture_attribute(scene, path, &attr, request)?;
        record.attributes.insert(attr, data);
    }
    Ok(record)
}

fn capture_attribute<S>(
    scene: &S,
    path: &str,
    attr: &str,
    request: &CaptureRequest,
) -> Result<AttributeRecord>
where
    S: SceneAdapter + ?Sized,
{
    let range = request.range();
    let key_count = scene.keyframe_count(path, attr, range)?;

    if request.kind == FileKind::Anim && key_count > 0 {
        let weighted_tangents = scene.weighted_tangents(path, attr)?;
        let (pre_infinity, post_infinity) = match scene.infinity(path, attr) {
            Ok(modes) => modes,
            Err(err) => {
                log::warn!(
                    "getting infinity values for {path}.{attr} failed ({err}); defaulting to 'constant'"
                );
                (Infinity::Constant, Infinity::Constant)
            }
        };
        let keys = scene
            .keyframes(path, attr, range)?
            .iter()
            .map(|k| relative_key(k, request.start_frame))
            .collect();
        return Ok(AttributeRecord::Anim(AnimCurve {
            weighted_tangents,
            pre_infinity,
            post_infinity,
            keys,
        }));
    }

    let pose = match scene.get_value(path, attr)? {
        SceneValue::Float(f) => PoseValue::float(f),
        SceneValue::Int(i) => PoseValue::int(i),
        SceneValue::Bool(b) => PoseValue::int(i64::from(b)),
        other @ SceneValue::Other(_) => {
            log::error!("attribute type isn't supported: {path}.{attr}");
            return Err(XadError::UnsupportedValue {
                object: path.to_string(),
                attribute: attr.to_string(),
                value: other.describe(),
            });
        }
    };
    Ok(AttributeRecord::Pose(pose))
}

fn relative_key(key: &SceneKey, start_frame: f64) -> KeyframeRecord {
    KeyframeRecord {
        time: key.time - start_frame,
        value: key.value,
        in_angle: key.in_angle,
        out_angle: key.out_angle,
        in_weight: key.in_weight,
        out_weight: key.out_weight,
        in_tangent: key.in_tangent,
        out_tangent: key.out_tangent,
        lock: key.lock,
        weight_lock: key.weight_lock,
        breakdown: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::memory::{MemoryAttribute, MemoryCurve, MemoryScene};

    fn keyed_scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        let obj = scene.insert_object("|rig:root|rig:arm");
        let mut tx = MemoryAttribute::new(SceneValue::Float(0.0));
        tx.curve = Some(MemoryCurve {
            keys: [10.0, 15.0, 20.0]
                .iter()
                .map(|t| SceneKey::new(*t, *t))
                .collect(),
            ..Default::default()
        });
        obj.attributes.insert("tx".into(), tx);
        obj.attributes
            .insert("visibility".into(), MemoryAttribute::new(SceneValue::Bool(true)));
        scene
    }

    fn request(kind: FileKind) -> CaptureRequest {
        let mut req = CaptureRequest::new(vec!["|rig:root|rig:arm".into()], 10.0, 20.0, kind);
        req.exported_by = "tester".into();
        req.exported_at = "00:00-01/01/26".into();
        req
    }

    #[test]
    fn pose_capture_ignores_keys() {
        let doc = capture(&keyed_scene(), &request(FileKind::Pose), &Config::default()).unwrap();
        assert_eq!(doc.header.clip_length, 1);
        let obj = &doc.data["rig:"][0];
        assert_eq!(obj.full_path, "|root|arm");
        assert!(!obj.attributes["tx"].is_anim());
        assert_eq!(
            obj.attributes["visibility"].as_pose(),
            Some(&PoseValue::int(1))
        );
    }

    #[test]
    fn anim_capture_normalizes_key_times() {
        let doc = capture(&keyed_scene(), &request(FileKind::Anim), &Config::default()).unwrap();
        assert_eq!(doc.header.clip_length, 11);
        assert_eq!(doc.header.origin_frame, 10.0);
        let curve = doc.data["rig:"][0].attributes["tx"].as_curve().unwrap();
        let times: Vec<f64> = curve.keys.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0]);
        assert!(curve.keys.iter().all(|k| !k.breakdown));
    }

    #[test]
    fn anim_range_must_span_two_frames() {
        let mut req = request(FileKind::Anim);
        req.end_frame = req.start_frame;
        assert!(matches!(
            capture(&keyed_scene(), &req, &Config::default()),
            Err(XadError::InvalidFrameRange { .. })
        ));
    }

    #[test]
    fn clashing_leaf_names_fail_capture() {
        let mut scene = keyed_scene();
        scene
            .insert_object("|other|rig:arm")
            .attributes
            .insert("tx".into(), MemoryAttribute::new(SceneValue::Float(1.0)));
        let mut req = request(FileKind::Pose);
        req.selection.push("|other|rig:arm".into());
        match capture(&scene, &req, &Config::default()) {
            Err(XadError::NameClash { names }) => assert_eq!(names, vec!["rig:arm".to_string()]),
            other => panic!("expected a name clash, got {other:?}"),
        }
    }

    #[test]
    fn objects_without_capturable_attributes_produce_no_document() {
        let mut scene = MemoryScene::new();
        let mut locked = MemoryAttribute::new(SceneValue::Float(1.0));
        locked.locked = true;
        scene
            .insert_object("|locked")
            .attributes
            .insert("tx".into(), locked);
        scene.insert_object("|bare");
        let selection = vec!["|locked".to_string(), "|bare".to_string()];
        let req = CaptureRequest::new(selection, 1.0, 1.0, FileKind::Pose);
        assert_eq!(
            capture(&scene, &req, &Config::default()).unwrap_err(),
            XadError::NoDataCaptured
        );
    }

    #[test]
    fn non_numeric_values_fail_the_whole_capture() {
        let mut scene = keyed_scene();
        scene
            .insert_object("|rig:label")
            .attributes
            .insert(
                "text".into(),
                MemoryAttribute::new(SceneValue::Other(serde_json::json!("left arm"))),
            );
        let mut req = request(FileKind::Pose);
        req.selection.push("|rig:label".into());
        match capture(&scene, &req, &Config::default()) {
            Err(XadError::UnsupportedValue {
                object,
                attribute,
                value,
            }) => {
                assert_eq!(object, "|rig:label");
                assert_eq!(attribute, "text");
                assert_eq!(value, "\"left arm\"");
            }
            other => panic!("expected an unsupported value, got {other:?}"),
        }
    }

    #[test]
    fn objects_without_namespace_are_labelled_none() {
        let mut scene = keyed_scene();
        scene
            .insert_object("|prop")
            .attributes
            .insert("height".into(), MemoryAttribute::new(SceneValue::Float(3.0)));
        let mut req = request(FileKind::Pose);
        req.selection.push("|prop".into());
        let doc = capture(&scene, &req, &Config::default()).unwrap();
        assert_eq!(doc.namespaces(), vec!["rig:".to_string(), "none".to_string()]);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut req = request(FileKind::Pose);
        req.selection.clear();
        assert_eq!(
            capture(&keyed_scene(), &req, &Config::default()).unwrap_err(),
            XadError::EmptySelection
        );
    }
}
