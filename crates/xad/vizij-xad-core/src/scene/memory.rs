//! In-memory scene implementing [`SceneAdapter`].
//!
//! Loaded from a JSON snapshot; every mutation is appended to a journal so
//! callers can inspect exactly which edits an import performed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{AttributeScope, FrameRange, SceneAdapter, SceneKey, SceneValue, TangentEdit};
use crate::curve::{CurveSide, Infinity};
use crate::error::SceneError;
use crate::header::Framerate;
use crate::record::RotationOrder;

const TIME_EPSILON: f64 = 1e-6;

/// Recorded scene mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SceneEdit {
    SetValue {
        object: String,
        attribute: String,
        value: f64,
    },
    SetRotationOrder {
        object: String,
        order: RotationOrder,
    },
    SetKeyframe {
        object: String,
        attribute: String,
        time: f64,
        value: f64,
    },
    SetWeightedTangents {
        object: String,
        attribute: String,
        weighted: bool,
    },
    EditTangent {
        object: String,
        attribute: String,
        time: f64,
        edit: TangentEdit,
    },
    SetInfinity {
        object: String,
        attribute: String,
        side: CurveSide,
        mode: Infinity,
    },
    ClearKeys {
        objects: Vec<String>,
        range: FrameRange,
    },
    UndoChunk {
        label: String,
    },
    AutoKeyframe {
        enabled: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryCurve {
    #[serde(default)]
    pub weighted: bool,
    #[serde(default)]
    pub pre_infinity: Infinity,
    #[serde(default)]
    pub post_infinity: Infinity,
    /// Host refuses infinity queries on this curve.
    #[serde(default)]
    pub infinity_unavailable: bool,
    #[serde(default)]
    pub keys: Vec<SceneKey>,
}

impl MemoryCurve {
    fn key_at_mut(&mut self, time: f64) -> Option<&mut SceneKey> {
        self.keys
            .iter_mut()
            .find(|k| (k.time - time).abs() < TIME_EPSILON)
    }

    fn in_range(&self, range: FrameRange) -> impl Iterator<Item = &SceneKey> {
        self.keys.iter().filter(move |k| range.contains(k.time))
    }
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryAttribute {
    pub value: SceneValue,
    #[serde(default = "yes")]
    pub keyable: bool,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub curve: Option<MemoryCurve>,
}

impl MemoryAttribute {
    pub fn new(value: SceneValue) -> Self {
        Self {
            value,
            keyable: true,
            visible: true,
            locked: false,
            curve: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryObject {
    #[serde(default)]
    pub rotation_order: Option<RotationOrder>,
    #[serde(default)]
    pub rotation_order_locked: bool,
    #[serde(default)]
    pub attributes: IndexMap<String, MemoryAttribute>,
}

/// Scene snapshot keyed by full object path.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryScene {
    pub framerate: Framerate,
    pub current_time: f64,
    pub playback: FrameRange,
    pub selection: Vec<String>,
    pub auto_keyframe: bool,
    pub objects: IndexMap<String, MemoryObject>,
    #[serde(skip)]
    journal: Vec<SceneEdit>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self {
            framerate: Framerate::fps(24),
            current_time: 1.0,
            playback: FrameRange::new(1.0, 24.0),
            selection: Vec::new(),
            auto_keyframe: false,
            objects: IndexMap::new(),
            journal: Vec::new(),
        }
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(s: &str) -> Result<Self, SceneError> {
        serde_json::from_str(s).map_err(|e| SceneError::host(format!("scene snapshot: {e}")))
    }

    /// Add (or replace) an object; returns it for further setup.
    pub fn insert_object(&mut self, path: &str) -> &mut MemoryObject {
        self.objects.insert(path.to_string(), MemoryObject::default());
        &mut self.objects[path]
    }

    pub fn object(&self, path: &str) -> Option<&MemoryObject> {
        self.objects.get(path)
    }

    pub fn attribute(&self, object: &str, attribute: &str) -> Option<&MemoryAttribute> {
        self.objects.get(object)?.attributes.get(attribute)
    }

    pub fn curve(&self, object: &str, attribute: &str) -> Option<&MemoryCurve> {
        self.attribute(object, attribute)?.curve.as_ref()
    }

    pub fn journal(&self) -> &[SceneEdit] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<SceneEdit> {
        std::mem::take(&mut self.journal)
    }

    /// Number of static value writes recorded so far.
    pub fn value_writes(&self) -> usize {
        self.journal
            .iter()
            .filter(|e| matches!(e, SceneEdit::SetValue { .. }))
            .count()
    }

    fn obj(&self, object: &str) -> Result<&MemoryObject, SceneError> {
        self.objects.get(object).ok_or_else(|| SceneError::NoSuchObject {
            object: object.to_string(),
        })
    }

    fn attr(&self, object: &str, attribute: &str) -> Result<&MemoryAttribute, SceneError> {
        self.obj(object)?
            .attributes
            .get(attribute)
            .ok_or_else(|| SceneError::NoSuchAttribute {
                object: object.to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn attr_mut(
        &mut self,
        object: &str,
        attribute: &str,
    ) -> Result<&mut MemoryAttribute, SceneError> {
        let obj = self
            .objects
            .get_mut(object)
            .ok_or_else(|| SceneError::NoSuchObject {
                object: object.to_string(),
            })?;
        obj.attributes
            .get_mut(attribute)
            .ok_or_else(|| SceneError::NoSuchAttribute {
                object: object.to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn editable_curve(
        &mut self,
        object: &str,
        attribute: &str,
    ) -> Result<&mut MemoryCurve, SceneError> {
        let attr = self.attr_mut(object, attribute)?;
        if attr.locked {
            return Err(SceneError::Locked {
                object: object.to_string(),
                attribute: attribute.to_string(),
            });
        }
        attr.curve
            .as_mut()
            .ok_or_else(|| SceneError::host(format!("{object}.{attribute} has no curve")))
    }
}

impl SceneAdapter for MemoryScene {
    fn framerate(&self) -> Framerate {
        self.framerate
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn playback_range(&self) -> FrameRange {
        self.playback
    }

    fn keyed_range(&self, objects: &[String]) -> Option<FrameRange> {
        let times = objects
            .iter()
            .filter_map(|o| self.objects.get(o))
            .flat_map(|o| o.attributes.values())
            .filter_map(|a| a.curve.as_ref())
            .flat_map(|c| c.keys.iter().map(|k| k.time));
        times.fold(None, |acc: Option<FrameRange>, t| {
            Some(match acc {
                None => FrameRange::new(t, t),
                Some(r) => FrameRange::new(r.start.min(t), r.end.max(t)),
            })
        })
    }

    fn selection(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn object_exists(&self, object: &str) -> bool {
        self.objects.contains_key(object)
    }

    fn list_attributes(
        &self,
        object: &str,
        scope: AttributeScope,
    ) -> Result<Vec<String>, SceneError> {
        Ok(self
            .obj(object)?
            .attributes
            .iter()
            .filter(|(_, a)| !a.locked)
            .filter(|(_, a)| match scope {
                AttributeScope::All => true,
                AttributeScope::KeyableVisible => a.keyable && a.visible,
            })
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn has_attribute(&self, object: &str, attribute: &str) -> bool {
        self.attribute(object, attribute).is_some()
    }

    fn get_value(&self, object: &str, attribute: &str) -> Result<SceneValue, SceneError> {
        Ok(self.attr(object, attribute)?.value.clone())
    }

    fn set_value(&mut self, object: &str, attribute: &str, value: f64) -> Result<(), SceneError> {
        let attr = self.attr_mut(object, attribute)?;
        if attr.locked {
            return Err(SceneError::Locked {
                object: object.to_string(),
                attribute: attribute.to_string(),
            });
        }
        attr.value = match attr.value {
            SceneValue::Bool(_) => SceneValue::Bool(value != 0.0),
            SceneValue::Int(_) => SceneValue::Int(value.round() as i64),
            SceneValue::Float(_) => SceneValue::Float(value),
            SceneValue::Other(_) => {
                return Err(SceneError::Unsupported {
                    what: format!("numeric write to {object}.{attribute}"),
                })
            }
        };
        self.journal.push(SceneEdit::SetValue {
            object: object.to_string(),
            attribute: attribute.to_string(),
            value,
        });
        Ok(())
    }

    fn rotation_order(&self, object: &str) -> Option<RotationOrder> {
        self.objects.get(object)?.rotation_order
    }

    fn set_rotation_order(
        &mut self,
        object: &str,
        order: RotationOrder,
    ) -> Result<(), SceneError> {
        let obj = self
            .objects
            .get_mut(object)
            .ok_or_else(|| SceneError::NoSuchObject {
                object: object.to_string(),
            })?;
        if obj.rotation_order.is_none() {
            return Err(SceneError::NoSuchAttribute {
                object: object.to_string(),
                attribute: "rotateOrder".to_string(),
            });
        }
        if obj.rotation_order_locked {
            return Err(SceneError::Locked {
                object: object.to_string(),
                attribute: "rotateOrder".to_string(),
            });
        }
        obj.rotation_order = Some(order);
        self.journal.push(SceneEdit::SetRotationOrder {
            object: object.to_string(),
            order,
        });
        Ok(())
    }

    fn keyframe_count(
        &self,
        object: &str,
        attribute: &str,
        range: FrameRange,
    ) -> Result<usize, SceneError> {
        Ok(self
            .attr(object, attribute)?
            .curve
            .as_ref()
            .map_or(0, |c| c.in_range(range).count()))
    }

    fn object_keyframe_count(
        &self,
        object: &str,
        range: FrameRange,
    ) -> Result<usize, SceneError> {
        Ok(self
            .obj(object)?
            .attributes
            .values()
            .filter_map(|a| a.curve.as_ref())
            .map(|c| c.in_range(range).count())
            .sum())
    }

    fn keyframes(
        &self,
        object: &str,
        attribute: &str,
        range: FrameRange,
    ) -> Result<Vec<SceneKey>, SceneError> {
        let mut keys: Vec<SceneKey> = self
            .attr(object, attribute)?
            .curve
            .as_ref()
            .map(|c| c.in_range(range).cloned().collect())
            .unwrap_or_default();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(keys)
    }

    fn weighted_tangents(&self, object: &str, attribute: &str) -> Result<bool, SceneError> {
        Ok(self
            .attr(object, attribute)?
            .curve
            .as_ref()
            .is_some_and(|c| c.weighted))
    }

    fn infinity(&self, object: &str, attribute: &str) -> Result<(Infinity, Infinity), SceneError> {
        match self.attr(object, attribute)?.curve.as_ref() {
            Some(c) if !c.infinity_unavailable => Ok((c.pre_infinity, c.post_infinity)),
            _ => Err(SceneError::Unsupported {
                what: format!("infinity query on {object}.{attribute}"),
            }),
        }
    }

    fn set_keyframe(
        &mut self,
        object: &str,
        attribute: &str,
        time: f64,
        value: f64,
    ) -> Result<(), SceneError> {
        let attr = self.attr_mut(object, attribute)?;
        if attr.locked {
            return Err(SceneError::Locked {
                object: object.to_string(),
                attribute: attribute.to_string(),
            });
        }
        let curve = attr.curve.get_or_insert_with(MemoryCurve::default);
        match curve.key_at_mut(time) {
            Some(key) => key.value = value,
            None => {
                let at = curve.keys.partition_point(|k| k.time < time);
                curve.keys.insert(at, SceneKey::new(time, value));
            }
        }
        self.journal.push(SceneEdit::SetKeyframe {
            object: object.to_string(),
            attribute: attribute.to_string(),
            time,
            value,
        });
        Ok(())
    }

    fn set_weighted_tangents(
        &mut self,
        object: &str,
        attribute: &str,
        weighted: bool,
    ) -> Result<(), SceneError> {
        self.editable_curve(object, attribute)?.weighted = weighted;
        self.journal.push(SceneEdit::SetWeightedTangents {
            object: object.to_string(),
            attribute: attribute.to_string(),
            weighted,
        });
        Ok(())
    }

    fn edit_key_tangent(
        &mut self,
        object: &str,
        attribute: &str,
        time: f64,
        edit: TangentEdit,
    ) -> Result<(), SceneError> {
        let key = self
            .editable_curve(object, attribute)?
            .key_at_mut(time)
            .ok_or_else(|| {
                SceneError::host(format!("{object}.{attribute} has no key at {time}"))
            })?;
        match edit {
            TangentEdit::Angles {
                in_angle,
                out_angle,
                in_weight,
                out_weight,
            } => {
                key.in_angle = in_angle;
                key.out_angle = out_angle;
                key.in_weight = in_weight;
                key.out_weight = out_weight;
            }
            TangentEdit::Types {
                in_tangent,
                out_tangent,
            } => {
                key.in_tangent = in_tangent;
                key.out_tangent = out_tangent;
            }
            TangentEdit::Lock(lock) => key.lock = lock,
            TangentEdit::WeightLock(lock) => key.weight_lock = lock,
        }
        self.journal.push(SceneEdit::EditTangent {
            object: object.to_string(),
            attribute: attribute.to_string(),
            time,
            edit,
        });
        Ok(())
    }

    fn set_infinity(
        &mut self,
        object: &str,
        attribute: &str,
        side: CurveSide,
        mode: Infinity,
    ) -> Result<(), SceneError> {
        let curve = self.editable_curve(object, attribute)?;
        match side {
            CurveSide::Pre => curve.pre_infinity = mode,
            CurveSide::Post => curve.post_infinity = mode,
        }
        self.journal.push(SceneEdit::SetInfinity {
            object: object.to_string(),
            attribute: attribute.to_string(),
            side,
            mode,
        });
        Ok(())
    }

    fn clear_keys(&mut self, objects: &[String], range: FrameRange) -> Result<(), SceneError> {
        for path in objects {
            if let Some(obj) = self.objects.get_mut(path) {
                for attr in obj.attributes.values_mut() {
                    if let Some(curve) = attr.curve.as_mut() {
                        curve.keys.retain(|k| !range.contains(k.time));
                    }
                }
            }
        }
        self.journal.push(SceneEdit::ClearKeys {
            objects: objects.to_vec(),
            range,
        });
        Ok(())
    }

    fn begin_undo_chunk(&mut self, label: &str) {
        self.journal.push(SceneEdit::UndoChunk {
            label: label.to_string(),
        });
    }

    fn auto_keyframe(&self) -> bool {
        self.auto_keyframe
    }

    fn set_auto_keyframe(&mut self, enabled: bool) {
        self.auto_keyframe = enabled;
        self.journal.push(SceneEdit::AutoKeyframe { enabled });
    }
}
