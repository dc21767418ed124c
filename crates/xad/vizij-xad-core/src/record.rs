//! Per-object and per-attribute records stored in a document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::curve::AnimCurve;

/// Axis application order for a 3-axis rotation, integer code 0-5.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RotationOrder {
    #[default]
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    Yxz,
    Zyx,
}

impl RotationOrder {
    pub fn code(self) -> u8 {
        self.into()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RotationOrder::Xyz => "xyz",
            RotationOrder::Yzx => "yzx",
            RotationOrder::Zxy => "zxy",
            RotationOrder::Xzy => "xzy",
            RotationOrder::Yxz => "yxz",
            RotationOrder::Zyx => "zyx",
        }
    }
}

impl TryFrom<u8> for RotationOrder {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => RotationOrder::Xyz,
            1 => RotationOrder::Yzx,
            2 => RotationOrder::Zxy,
            3 => RotationOrder::Xzy,
            4 => RotationOrder::Yxz,
            5 => RotationOrder::Zyx,
            other => return Err(format!("rotation order code {other} is outside 0..=5")),
        })
    }
}

impl From<RotationOrder> for u8 {
    fn from(order: RotationOrder) -> u8 {
        match order {
            RotationOrder::Xyz => 0,
            RotationOrder::Yzx => 1,
            RotationOrder::Zxy => 2,
            RotationOrder::Xzy => 3,
            RotationOrder::Yxz => 4,
            RotationOrder::Zyx => 5,
        }
    }
}

impl fmt::Display for RotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.as_str())
    }
}

/// Numeric shape of a static value. Booleans are stored as `Int` 0/1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
}

/// Static snapshot of one attribute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseValue {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: f64,
}

impl PoseValue {
    pub fn int(value: i64) -> Self {
        Self {
            value_type: ValueType::Int,
            value: value as f64,
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            value_type: ValueType::Float,
            value,
        }
    }
}

/// Data captured for one attribute: exactly one of a pose value or a curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeRecord {
    Pose(PoseValue),
    Anim(AnimCurve),
}

impl AttributeRecord {
    #[inline]
    pub fn is_anim(&self) -> bool {
        matches!(self, AttributeRecord::Anim(_))
    }

    pub fn as_pose(&self) -> Option<&PoseValue> {
        match self {
            AttributeRecord::Pose(p) => Some(p),
            AttributeRecord::Anim(_) => None,
        }
    }

    pub fn as_curve(&self) -> Option<&AnimCurve> {
        match self {
            AttributeRecord::Anim(c) => Some(c),
            AttributeRecord::Pose(_) => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            AttributeRecord::Pose(_) => "pose",
            AttributeRecord::Anim(_) => "anim",
        }
    }
}

/// One captured object: namespace-stripped path, rotation order and attributes
/// in capture order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub full_path: String,
    #[serde(default)]
    pub rotation_order: RotationOrder,
    pub attributes: IndexMap<String, AttributeRecord>,
}

impl ObjectRecord {
    pub fn new(full_path: impl Into<String>, rotation_order: RotationOrder) -> Self {
        Self {
            full_path: full_path.into(),
            rotation_order,
            attributes: IndexMap::new(),
        }
    }

    /// Last path segment, the name used for identity matching.
    pub fn leaf_name(&self) -> &str {
        crate::naming::leaf(&self.full_path)
    }

    pub fn has_content(&self) -> bool {
        !self.attributes.is_empty()
    }
}
