//! Document header: format tag and export metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the on-disk layout this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// Whether a document stores static poses or animation curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pose,
    Anim,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileKind::Pose => "pose",
            FileKind::Anim => "anim",
        })
    }
}

/// Frames per second as a rational. `0/1` means the host time unit has no
/// frame rate (or the host could not report one).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Framerate {
    pub num: u32,
    pub den: u32,
}

impl Framerate {
    pub const UNKNOWN: Framerate = Framerate { num: 0, den: 1 };

    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub const fn fps(fps: u32) -> Self {
        Self { num: fps, den: 1 }
    }

    #[inline]
    pub fn is_known(self) -> bool {
        self.num != 0 && self.den != 0
    }

    pub fn as_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

    /// Host time-unit names mapped to rates; unrecognised units are unknown.
    pub fn from_time_unit(unit: &str) -> Self {
        match unit {
            "game" => Self::fps(15),
            "film" => Self::fps(24),
            "pal" => Self::fps(25),
            "ntsc" => Self::fps(30),
            "show" => Self::fps(48),
            "palf" => Self::fps(50),
            "ntscf" => Self::fps(60),
            "millisec" => Self::fps(1000),
            "sec" => Self::fps(1),
            "min" => Self::new(1, 60),
            _ => Self::UNKNOWN,
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl PartialEq for Framerate {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_known() || !other.is_known() {
            return self.is_known() == other.is_known();
        }
        self.num as u64 * other.den as u64 == other.num as u64 * self.den as u64
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            f.write_str("unknown")
        } else if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Header written at the top of every document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub format_version: u32,
    pub producer_version: String,
    pub kind: FileKind,
    #[serde(default)]
    pub framerate: Framerate,
    #[serde(default)]
    pub exported_by: String,
    #[serde(default)]
    pub exported_at: String,
    pub clip_length: u32,
    #[serde(default)]
    pub origin_frame: f64,
    #[serde(default)]
    pub comments: String,
}

impl Header {
    /// `clip_length == 1` exactly when the document is a pose.
    pub fn validate(&self) -> Result<(), String> {
        if self.clip_length == 0 {
            return Err("clip_length must be at least 1".into());
        }
        match self.kind {
            FileKind::Pose if self.clip_length != 1 => Err(format!(
                "pose document has clip_length {}",
                self.clip_length
            )),
            FileKind::Anim if self.clip_length == 1 => {
                Err("anim document has clip_length 1".into())
            }
            _ if !self.origin_frame.is_finite() => Err("origin_frame is not finite".into()),
            _ => Ok(()),
        }
    }

    /// Last destination frame for a clip placed at `frame_offset`.
    pub fn window_end(&self, frame_offset: f64) -> f64 {
        frame_offset + self.clip_length as f64 - 1.0
    }

    /// Human-readable listing; comments come last under their own label.
    pub fn lines(&self) -> Vec<String> {
        let rows: [(&str, String); 8] = [
            ("format", self.format_version.to_string()),
            ("producer", self.producer_version.clone()),
            ("kind", self.kind.to_string()),
            ("framerate", self.framerate.to_string()),
            ("exportedBy", self.exported_by.clone()),
            ("exportedAt", self.exported_at.clone()),
            ("clipLength", self.clip_length.to_string()),
            ("startframe", self.origin_frame.to_string()),
        ];
        let mut out: Vec<String> = rows
            .iter()
            .map(|(k, v)| format!("{k:<14}{v}"))
            .collect();
        out.push(String::new());
        out.push("comments:".to_string());
        out.push(self.comments.clone());
        out
    }
}
