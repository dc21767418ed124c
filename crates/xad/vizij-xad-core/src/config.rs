//! Configuration passed explicitly into export/import entry points.

use serde::{Deserialize, Serialize};

/// Diagnostic verbosity. Replaces a process-wide debug switch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    /// No extra diagnostics.
    #[default]
    Off,
    /// Step-by-step text output at debug level.
    Text,
    /// Text output plus elapsed-time markers per reconciliation step.
    Timing,
}

/// Configuration for capture, reconciliation and file operations.
/// Keep this minimal; expand without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: DebugLevel,

    /// File extension (without dot) used by `ops::export`/`ops::list_documents`.
    pub file_extension: String,

    /// Emit percentage progress while capturing/applying.
    pub report_progress: bool,

    /// Written into every exported header.
    pub producer_version: String,
}

impl Config {
    pub fn timing_enabled(&self) -> bool {
        self.debug == DebugLevel::Timing
    }

    pub fn text_enabled(&self) -> bool {
        self.debug != DebugLevel::Off
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: DebugLevel::Off,
            file_extension: "xad".to_string(),
            report_progress: true,
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
