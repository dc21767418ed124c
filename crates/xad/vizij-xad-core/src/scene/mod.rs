//! Scene adapter contract.
//!
//! The capture and reconciliation engines never touch a host scene directly;
//! hosts implement [`SceneAdapter`] and pass it in. Objects are addressed by
//! their full path string (the host's long name).

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::curve::{CurveSide, Infinity, TangentType};
use crate::error::SceneError;
use crate::header::Framerate;
use crate::record::RotationOrder;

pub use memory::{MemoryScene, SceneEdit};

/// Which attributes capture enumerates on an object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeScope {
    /// Every unlocked scalar attribute.
    All,
    /// Unlocked scalar attributes that are keyable and visible in the channel box.
    #[default]
    KeyableVisible,
}

/// Inclusive time range in host frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: f64,
    pub end: f64,
}

impl FrameRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Raw attribute value as reported by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Strings, matrices, compound values: anything capture cannot store.
    Other(serde_json::Value),
}

impl SceneValue {
    /// Numeric view used for pose comparisons and writes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SceneValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            SceneValue::Int(i) => Some(*i as f64),
            SceneValue::Float(f) => Some(*f),
            SceneValue::Other(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SceneValue::Bool(b) => b.to_string(),
            SceneValue::Int(i) => i.to_string(),
            SceneValue::Float(f) => f.to_string(),
            SceneValue::Other(v) => v.to_string(),
        }
    }
}

/// A key as the host reports it, with absolute time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneKey {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub in_angle: f64,
    #[serde(default)]
    pub out_angle: f64,
    #[serde(default = "unit_weight")]
    pub in_weight: f64,
    #[serde(default = "unit_weight")]
    pub out_weight: f64,
    #[serde(default)]
    pub in_tangent: TangentType,
    #[serde(default)]
    pub out_tangent: TangentType,
    #[serde(default = "default_lock")]
    pub lock: bool,
    #[serde(default)]
    pub weight_lock: bool,
}

fn unit_weight() -> f64 {
    1.0
}

fn default_lock() -> bool {
    true
}

impl SceneKey {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            in_angle: 0.0,
            out_angle: 0.0,
            in_weight: 1.0,
            out_weight: 1.0,
            in_tangent: TangentType::Auto,
            out_tangent: TangentType::Auto,
            lock: true,
            weight_lock: false,
        }
    }
}

/// One tangent edit on the key at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TangentEdit {
    Angles {
        in_angle: f64,
        out_angle: f64,
        in_weight: f64,
        out_weight: f64,
    },
    Types {
        in_tangent: TangentType,
        out_tangent: TangentType,
    },
    Lock(bool),
    WeightLock(bool),
}

/// Host capability consumed by capture and reconciliation.
pub trait SceneAdapter {
    // ----- scene state -----
    fn framerate(&self) -> Framerate;
    fn current_time(&self) -> f64;
    fn playback_range(&self) -> FrameRange;
    /// First and last key time across `objects`, `None` when nothing is keyed.
    fn keyed_range(&self, objects: &[String]) -> Option<FrameRange>;
    /// Current selection as full paths, expanded through sets.
    fn selection(&self) -> Vec<String>;

    // ----- objects and attributes -----
    fn object_exists(&self, object: &str) -> bool;
    fn list_attributes(
        &self,
        object: &str,
        scope: AttributeScope,
    ) -> Result<Vec<String>, SceneError>;
    fn has_attribute(&self, object: &str, attribute: &str) -> bool;
    fn get_value(&self, object: &str, attribute: &str) -> Result<SceneValue, SceneError>;
    fn set_value(&mut self, object: &str, attribute: &str, value: f64) -> Result<(), SceneError>;
    /// `None` when the object has no rotation order attribute.
    fn rotation_order(&self, object: &str) -> Option<RotationOrder>;
    fn set_rotation_order(
        &mut self,
        object: &str,
        order: RotationOrder,
    ) -> Result<(), SceneError>;

    // ----- curve queries -----
    fn keyframe_count(
        &self,
        object: &str,
        attribute: &str,
        range: FrameRange,
    ) -> Result<usize, SceneError>;
    /// Keys on any attribute of `object`; fails with `NoSuchObject` when unresolvable.
    fn object_keyframe_count(&self, object: &str, range: FrameRange)
        -> Result<usize, SceneError>;
    fn keyframes(
        &self,
        object: &str,
        attribute: &str,
        range: FrameRange,
    ) -> Result<Vec<SceneKey>, SceneError>;
    fn weighted_tangents(&self, object: &str, attribute: &str) -> Result<bool, SceneError>;
    /// Pre and post infinity of the attribute's curve.
    fn infinity(&self, object: &str, attribute: &str) -> Result<(Infinity, Infinity), SceneError>;

    // ----- curve edits -----
    fn set_keyframe(
        &mut self,
        object: &str,
        attribute: &str,
        time: f64,
        value: f64,
    ) -> Result<(), SceneError>;
    fn set_weighted_tangents(
        &mut self,
        object: &str,
        attribute: &str,
        weighted: bool,
    ) -> Result<(), SceneError>;
    fn edit_key_tangent(
        &mut self,
        object: &str,
        attribute: &str,
        time: f64,
        edit: TangentEdit,
    ) -> Result<(), SceneError>;
    fn set_infinity(
        &mut self,
        object: &str,
        attribute: &str,
        side: CurveSide,
        mode: Infinity,
    ) -> Result<(), SceneError>;
    fn clear_keys(&mut self, objects: &[String], range: FrameRange) -> Result<(), SceneError>;

    // ----- optional host features -----
    fn begin_undo_chunk(&mut self, _label: &str) {}
    fn end_undo_chunk(&mut self) {}
    fn auto_keyframe(&self) -> bool {
        false
    }
    fn set_auto_keyframe(&mut self, _enabled: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_values_parse_untagged() {
        let v: SceneValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, SceneValue::Bool(true));
        let v: SceneValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, SceneValue::Int(3));
        let v: SceneValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v.as_f64(), Some(2.5));
        let v: SceneValue = serde_json::from_str("\"text\"").unwrap();
        assert!(v.as_f64().is_none());
    }

    #[test]
    fn frame_range_is_inclusive() {
        let r = FrameRange::new(10.0, 20.0);
        assert!(r.contains(10.0));
        assert!(r.contains(20.0));
        assert!(!r.contains(20.5));
    }
}
