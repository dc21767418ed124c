//! Versioned document container and its accessors.
//!
//! A document is a header plus one object arena per namespace label. The
//! arena position is the object's index; indices are only meaningful inside
//! the document that produced them.
//!
//! All accessors read from the *active* namespace (default `"none"`). A miss
//! at any level of the key path is logged in full and returned as
//! [`XadError::NotFound`]: it means the file is corrupt or the caller asked for
//! something it never listed, never a user input problem.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::curve::{AnimCurve, KeyframeRecord, TangentType};
use crate::error::{Result, XadError};
use crate::header::{FileKind, Header, FORMAT_VERSION};
use crate::ids::{KeyIndex, ObjectIndex};
use crate::naming::NO_NAMESPACE;
use crate::record::{AttributeRecord, ObjectRecord, PoseValue, RotationOrder};

/// Individually addressable keyframe fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyField {
    Time,
    Value,
    InAngle,
    OutAngle,
    InWeight,
    OutWeight,
    InTangent,
    OutTangent,
    Lock,
    WeightLock,
    Breakdown,
}

impl KeyField {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyField::Time => "time",
            KeyField::Value => "value",
            KeyField::InAngle => "in_angle",
            KeyField::OutAngle => "out_angle",
            KeyField::InWeight => "in_weight",
            KeyField::OutWeight => "out_weight",
            KeyField::InTangent => "in_tangent",
            KeyField::OutTangent => "out_tangent",
            KeyField::Lock => "lock",
            KeyField::WeightLock => "weight_lock",
            KeyField::Breakdown => "breakdown",
        }
    }
}

/// Value of a single keyframe field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Tangent(TangentType),
    Flag(bool),
}

impl FieldValue {
    pub fn as_number(self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

/// Header plus namespace-keyed object arenas.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub header: Header,
    pub data: IndexMap<String, Vec<ObjectRecord>>,
    #[serde(skip, default = "no_namespace")]
    active: String,
}

fn no_namespace() -> String {
    NO_NAMESPACE.to_string()
}

#[derive(Deserialize)]
struct VersionProbe {
    header: ProbeHeader,
}

#[derive(Deserialize)]
struct ProbeHeader {
    format_version: serde_json::Value,
}

impl Document {
    /// Empty document with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            data: IndexMap::new(),
            active: no_namespace(),
        }
    }

    /// Append an object to a namespace arena and return its index there.
    pub fn push_object(&mut self, namespace: &str, record: ObjectRecord) -> ObjectIndex {
        let arena = self.data.entry(namespace.to_string()).or_default();
        arena.push(record);
        ObjectIndex::from(arena.len() - 1)
    }

    // ----- codec -----

    /// Serialize to a self-describing, version-tagged byte blob.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| XadError::corrupt(format!("encode: {e}")))
    }

    /// Parse a blob produced by [`Document::encode`].
    ///
    /// The version tag is checked before the body is touched; any other
    /// version is rejected rather than partially decoded.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        let version_matches = probe
            .header
            .format_version
            .as_u64()
            .is_some_and(|v| v == FORMAT_VERSION as u64);
        if !version_matches {
            let found = probe.header.format_version.to_string();
            log::warn!("document version {found} does not match supported version {FORMAT_VERSION}");
            return Err(XadError::VersionMismatch {
                found,
                expected: FORMAT_VERSION,
            });
        }

        let doc: Document = serde_json::from_slice(bytes)?;
        doc.validate().map_err(XadError::corrupt)?;
        Ok(doc)
    }

    /// Write the encoded document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !self.has_content() {
            log::warn!("saving a document without content to {}", path.display());
        }
        let bytes = self.encode()?;
        fs::write(path, bytes).map_err(|e| XadError::io(path, e))?;
        log::info!("file was successfully written at: {}", path.display());
        Ok(())
    }

    /// Read and decode a document from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| XadError::io(path, e))?;
        Self::decode(&bytes)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        self.header.validate()?;
        for (namespace, arena) in &self.data {
            for (i, obj) in arena.iter().enumerate() {
                for (attr, record) in &obj.attributes {
                    match record {
                        AttributeRecord::Anim(_) if self.header.kind == FileKind::Pose => {
                            return Err(format!(
                                "pose document holds a curve at [{namespace}][{i}][{attr}]"
                            ));
                        }
                        AttributeRecord::Anim(curve) => curve
                            .validate()
                            .map_err(|e| format!("[{namespace}][{i}][{attr}]: {e}"))?,
                        AttributeRecord::Pose(p) if !p.value.is_finite() => {
                            return Err(format!("[{namespace}][{i}][{attr}]: non-finite value"));
                        }
                        AttributeRecord::Pose(_) => {}
                    }
                }
            }
        }
        Ok(())
    }

    // ----- namespace view -----

    /// True when at least one namespace holds an object.
    pub fn has_content(&self) -> bool {
        self.data.values().any(|arena| !arena.is_empty())
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn has_namespace(&self, label: &str) -> bool {
        self.data.contains_key(label)
    }

    /// Select the namespace subsequent accessors read from.
    pub fn set_active_namespace(&mut self, label: &str) {
        self.active = label.to_string();
    }

    pub fn active_namespace(&self) -> &str {
        &self.active
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_lines(&self) -> Vec<String> {
        self.header.lines()
    }

    /// Indented listing of the whole document, one line per map entry.
    ///
    /// Nested maps and lists open a `{ }` block; leaves print as
    /// `'key':` padded to a fixed column followed by the value.
    pub fn dump_lines(&self) -> Result<Vec<String>> {
        let tree =
            serde_json::to_value(self).map_err(|e| XadError::corrupt(format!("dump: {e}")))?;
        let mut out = Vec::new();
        dump_value(&tree, 0, &mut out);
        Ok(out)
    }

    // ----- scoped accessors -----

    fn arena(&self) -> Result<&Vec<ObjectRecord>> {
        self.data
            .get(&self.active)
            .ok_or_else(|| self.not_found(None, None, None, None))
    }

    /// Index and stored full path of every object in the active namespace.
    pub fn objects(&self) -> Result<Vec<(ObjectIndex, &str)>> {
        Ok(self
            .arena()?
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectIndex::from(i), o.full_path.as_str()))
            .collect())
    }

    pub fn object_ids(&self) -> Result<Vec<ObjectIndex>> {
        Ok(self.objects()?.into_iter().map(|(i, _)| i).collect())
    }

    pub fn object_paths(&self) -> Result<Vec<&str>> {
        Ok(self.objects()?.into_iter().map(|(_, p)| p).collect())
    }

    pub fn object_count(&self) -> usize {
        self.data.get(&self.active).map_or(0, Vec::len)
    }

    pub fn object(&self, idx: ObjectIndex) -> Result<&ObjectRecord> {
        self.arena()?
            .get(idx.get())
            .ok_or_else(|| self.not_found(Some(idx), None, None, None))
    }

    pub fn rotation_order(&self, idx: ObjectIndex) -> Result<RotationOrder> {
        Ok(self.object(idx)?.rotation_order)
    }

    pub fn attribute_names(&self, idx: ObjectIndex) -> Result<Vec<&str>> {
        Ok(self
            .object(idx)?
            .attributes
            .keys()
            .map(String::as_str)
            .collect())
    }

    pub fn attribute(&self, idx: ObjectIndex, attr: &str) -> Result<&AttributeRecord> {
        self.object(idx)?
            .attributes
            .get(attr)
            .ok_or_else(|| self.not_found(Some(idx), Some(attr), None, None))
    }

    pub fn has_anim(&self, idx: ObjectIndex, attr: &str) -> Result<bool> {
        Ok(self.attribute(idx, attr)?.is_anim())
    }

    pub fn pose(&self, idx: ObjectIndex, attr: &str) -> Result<&PoseValue> {
        self.attribute(idx, attr)?
            .as_pose()
            .ok_or_else(|| self.not_found(Some(idx), Some(attr), None, Some("pose")))
    }

    pub fn curve(&self, idx: ObjectIndex, attr: &str) -> Result<&AnimCurve> {
        self.attribute(idx, attr)?
            .as_curve()
            .ok_or_else(|| self.not_found(Some(idx), Some(attr), None, Some("anim")))
    }

    pub fn key_ids(&self, idx: ObjectIndex, attr: &str) -> Result<Vec<KeyIndex>> {
        Ok((0..self.curve(idx, attr)?.keys.len())
            .map(KeyIndex::from)
            .collect())
    }

    pub fn key(&self, idx: ObjectIndex, attr: &str, key: KeyIndex) -> Result<&KeyframeRecord> {
        self.curve(idx, attr)?
            .keys
            .get(key.get())
            .ok_or_else(|| self.not_found(Some(idx), Some(attr), Some(key), None))
    }

    pub fn key_field(
        &self,
        idx: ObjectIndex,
        attr: &str,
        key: KeyIndex,
        field: KeyField,
    ) -> Result<FieldValue> {
        let k = self.key(idx, attr, key)?;
        Ok(match field {
            KeyField::Time => FieldValue::Number(k.time),
            KeyField::Value => FieldValue::Number(k.value),
            KeyField::InAngle => FieldValue::Number(k.in_angle),
            KeyField::OutAngle => FieldValue::Number(k.out_angle),
            KeyField::InWeight => FieldValue::Number(k.in_weight),
            KeyField::OutWeight => FieldValue::Number(k.out_weight),
            KeyField::InTangent => FieldValue::Tangent(k.in_tangent),
            KeyField::OutTangent => FieldValue::Tangent(k.out_tangent),
            KeyField::Lock => FieldValue::Flag(k.lock),
            KeyField::WeightLock => FieldValue::Flag(k.weight_lock),
            KeyField::Breakdown => FieldValue::Flag(k.breakdown),
        })
    }

    fn not_found(
        &self,
        idx: Option<ObjectIndex>,
        attr: Option<&str>,
        key: Option<KeyIndex>,
        field: Option<&str>,
    ) -> XadError {
        let mut path = format!("[{}]", self.active);
        if let Some(i) = idx {
            path.push_str(&format!("[{i}]"));
        }
        if let Some(a) = attr {
            path.push_str(&format!("[{a}]"));
        }
        if let Some(k) = key {
            path.push_str(&format!("[key {k}]"));
        }
        if let Some(f) = field {
            path.push_str(&format!("[{f}]"));
        }
        log::error!(
            "document lookup failed: namespace={} object={:?} attribute={:?} key={:?} field={:?}",
            self.active,
            idx,
            attr,
            key,
            field
        );
        XadError::NotFound { path }
    }
}

fn dump_value(value: &serde_json::Value, depth: usize, out: &mut Vec<String>) {
    let entries: Vec<(String, &serde_json::Value)> = match value {
        serde_json::Value::Object(map) => map.iter().map(|(k, v)| (format!("'{k}'"), v)).collect(),
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return,
    };
    let pad = "  ".repeat(depth);
    for (key, child) in entries {
        match child {
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                out.push(format!("{pad}{key}:"));
                out.push(format!("{pad}{{"));
                dump_value(child, depth + 1, out);
                out.push(format!("{pad}}}"));
            }
            leaf => out.push(format!("{pad}{:<16}  {leaf},", format!("{key}:"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Framerate;
    use crate::record::ValueType;

    fn anim_doc() -> Document {
        let mut doc = Document::new(Header {
            format_version: FORMAT_VERSION,
            producer_version: "test".into(),
            kind: FileKind::Anim,
            framerate: Framerate::fps(24),
            exported_by: "tester".into(),
            exported_at: "now".into(),
            clip_length: 11,
            origin_frame: 10.0,
            comments: String::new(),
        });
        let mut arm = ObjectRecord::new("|root|arm", RotationOrder::Yzx);
        arm.attributes.insert(
            "rotateX".into(),
            AttributeRecord::Anim(AnimCurve {
                keys: vec![KeyframeRecord::new(0.0, 1.0), KeyframeRecord::new(5.0, 3.0)],
                ..Default::default()
            }),
        );
        arm.attributes
            .insert("visibility".into(), AttributeRecord::Pose(PoseValue::int(1)));
        doc.push_object("none", arm);
        doc.push_object("rig:", ObjectRecord::new("|hand", RotationOrder::Xyz));
        doc
    }

    #[test]
    fn content_and_namespaces() {
        let doc = anim_doc();
        assert!(doc.has_content());
        assert_eq!(doc.namespaces(), vec!["none".to_string(), "rig:".to_string()]);
        assert!(!Document::new(anim_doc().header).has_content());
    }

    #[test]
    fn accessors_follow_active_namespace() {
        let mut doc = anim_doc();
        assert_eq!(doc.object_paths().unwrap(), vec!["|root|arm"]);
        doc.set_active_namespace("rig:");
        assert_eq!(doc.object_paths().unwrap(), vec!["|hand"]);
        assert!(doc.attribute(ObjectIndex(0), "rotateX").is_err());
    }

    #[test]
    fn key_field_lookup() {
        let doc = anim_doc();
        let v = doc
            .key_field(ObjectIndex(0), "rotateX", KeyIndex(1), KeyField::Time)
            .unwrap();
        assert_eq!(v.as_number(), Some(5.0));
        assert_eq!(
            doc.key_field(ObjectIndex(0), "rotateX", KeyIndex(0), KeyField::Breakdown)
                .unwrap(),
            FieldValue::Flag(false)
        );
        assert_eq!(doc.pose(ObjectIndex(0), "visibility").unwrap().value_type, ValueType::Int);
        assert_eq!(doc.rotation_order(ObjectIndex(0)).unwrap(), RotationOrder::Yzx);
    }

    #[test]
    fn missing_levels_report_full_path() {
        let mut doc = anim_doc();
        let err = doc
            .key(ObjectIndex(0), "rotateX", KeyIndex(9))
            .unwrap_err();
        assert_eq!(
            err,
            XadError::NotFound {
                path: "[none][0][rotateX][key 9]".into()
            }
        );
        let err = doc.curve(ObjectIndex(0), "visibility").unwrap_err();
        assert!(matches!(err, XadError::NotFound { path } if path.ends_with("[anim]")));
        doc.set_active_namespace("missing:");
        assert!(matches!(doc.objects(), Err(XadError::NotFound { .. })));
    }

    #[test]
    fn decode_rejects_other_versions_before_body() {
        let blob = br#"{"header":{"format_version":2},"data":"not even a map"}"#;
        match Document::decode(blob) {
            Err(XadError::VersionMismatch { found, expected }) => {
                assert_eq!(found, "2");
                assert_eq!(expected, FORMAT_VERSION);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
        let blob = br#"{"header":{"format_version":1.0},"data":{}}"#;
        assert!(matches!(
            Document::decode(blob),
            Err(XadError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn decode_rejects_broken_payloads_as_corrupt() {
        assert!(matches!(
            Document::decode(b"\x80\x04pickle"),
            Err(XadError::Corrupt { .. })
        ));
        let blob = br#"{"header":{"format_version":1},"data":{}}"#;
        assert!(matches!(Document::decode(blob), Err(XadError::Corrupt { .. })));
    }

    #[test]
    fn dump_lists_nested_records_with_indentation() {
        let lines = anim_doc().dump_lines().unwrap();
        assert_eq!(lines[0], "'header':");
        assert_eq!(lines[1], "{");
        assert!(lines.contains(&format!("  {:<16}  1,", "'format_version':")));
        assert!(lines.contains(&"  'framerate':".to_string()));
        assert!(lines.contains(&format!("    {:<16}  24,", "'num':")));
        assert!(lines.iter().any(|l| l.trim_start() == "'data':"));
        assert!(lines.contains(&"  'none':".to_string()));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("      'full_path':") && l.ends_with("\"|root|arm\",")));
        assert_eq!(lines.last().map(String::as_str), Some("}"));
        let opens = lines.iter().filter(|l| l.trim() == "{").count();
        let closes = lines.iter().filter(|l| l.trim() == "}").count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn encode_decode_keeps_records() {
        let doc = anim_doc();
        let bytes = doc.encode().unwrap();
        let back = Document::decode(&bytes).unwrap();
        assert_eq!(back.header, doc.header);
        assert_eq!(back.data, doc.data);
        assert_eq!(back.active_namespace(), "none");
    }
}
