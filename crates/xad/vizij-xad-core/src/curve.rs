//! Keyframe curve model: keys, tangent shapes and extrapolation.
//!
//! Enumeration spellings follow the host convention and are part of the file
//! format; do not rename variants without bumping the format version.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tangent shape on either side of a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TangentType {
    Spline,
    Linear,
    Fast,
    Slow,
    Flat,
    Step,
    StepNext,
    Fixed,
    Clamped,
    Plateau,
    #[default]
    Auto,
}

impl TangentType {
    pub fn as_str(self) -> &'static str {
        match self {
            TangentType::Spline => "spline",
            TangentType::Linear => "linear",
            TangentType::Fast => "fast",
            TangentType::Slow => "slow",
            TangentType::Flat => "flat",
            TangentType::Step => "step",
            TangentType::StepNext => "stepnext",
            TangentType::Fixed => "fixed",
            TangentType::Clamped => "clamped",
            TangentType::Plateau => "plateau",
            TangentType::Auto => "auto",
        }
    }
}

impl fmt::Display for TangentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Curve behavior before the first / after the last key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Infinity {
    #[default]
    Constant,
    Linear,
    Cycle,
    CycleRelative,
    Oscillate,
}

impl Infinity {
    pub fn as_str(self) -> &'static str {
        match self {
            Infinity::Constant => "constant",
            Infinity::Linear => "linear",
            Infinity::Cycle => "cycle",
            Infinity::CycleRelative => "cycleRelative",
            Infinity::Oscillate => "oscillate",
        }
    }

    /// Constant is the host default; anything else needs an explicit edit.
    #[inline]
    pub fn is_default(self) -> bool {
        self == Infinity::Constant
    }
}

impl fmt::Display for Infinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of a curve an infinity setting applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveSide {
    Pre,
    Post,
}

/// One stored key. `time` is relative to the capture start frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeRecord {
    pub time: f64,
    pub value: f64,
    pub in_angle: f64,
    pub out_angle: f64,
    pub in_weight: f64,
    pub out_weight: f64,
    pub in_tangent: TangentType,
    pub out_tangent: TangentType,
    pub lock: bool,
    pub weight_lock: bool,
    /// Always written as false; the host query for it is not reliable.
    #[serde(default)]
    pub breakdown: bool,
}

impl KeyframeRecord {
    /// Key at `time` with flat auto tangents and unit weights.
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
            breakdown: false,
        }
    }

    /// Destination time after applying an import offset.
    #[inline]
    pub fn absolute_time(&self, frame_offset: f64) -> f64 {
        self.time + frame_offset
    }
}

/// Animation curve for one attribute.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimCurve {
    pub weighted_tangents: bool,
    pub pre_infinity: Infinity,
    pub post_infinity: Infinity,
    pub keys: Vec<KeyframeRecord>,
}

impl AnimCurve {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Relative time span covered by the keys, if any.
    pub fn span(&self) -> Option<(f64, f64)> {
        let first = self.keys.first()?.time;
        let last = self.keys.last()?.time;
        Some((first, last))
    }

    /// Keys must be stored in non-decreasing time order.
    pub fn validate(&self) -> Result<(), String> {
        let mut last = f64::NEG_INFINITY;
        for (i, k) in self.keys.iter().enumerate() {
            if !k.time.is_finite() || !k.value.is_finite() {
                return Err(format!("key {i} has a non-finite time or value"));
            }
            if k.time < last {
                return Err(format!("key {i} is out of time order"));
            }
            last = k.time;
        }
        Ok(())
    }
}
