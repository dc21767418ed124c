//! Error types for export/import

use serde::{Deserialize, Serialize};

/// Failure reported by a scene adapter for a single query or edit.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SceneError {
    /// Object path does not resolve in the live scene
    #[error("Object does not exist: {object}")]
    NoSuchObject { object: String },

    /// Attribute missing on an existing object
    #[error("Attribute does not exist: {object}.{attribute}")]
    NoSuchAttribute { object: String, attribute: String },

    /// Attribute is locked or driven and cannot be edited
    #[error("Attribute cannot be modified: {object}.{attribute}")]
    Locked { object: String, attribute: String },

    /// Host cannot answer this query
    #[error("Unsupported scene query: {what}")]
    Unsupported { what: String },

    /// Any other host-side failure
    #[error("Scene error: {message}")]
    Host { message: String },
}

impl SceneError {
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }
}

/// Error type for capture, document codec, reconciliation and file operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum XadError {
    /// File unreadable/unwritable
    #[error("IO error on '{path}': {reason}")]
    Io { path: String, reason: String },

    /// Format version gate
    #[error("Unsupported file version {found} (this build reads version {expected})")]
    VersionMismatch { found: String, expected: u32 },

    /// Structurally invalid payload
    #[error("Corrupt document: {reason}")]
    Corrupt { reason: String },

    /// Nothing selected to export or import onto
    #[error("Selection is empty")]
    EmptySelection,

    /// Capture produced no attribute data
    #[error("Could not get any data from the selected objects")]
    NoDataCaptured,

    /// Frame range cannot hold an animation clip
    #[error("Invalid frame range {start}..{end}")]
    InvalidFrameRange { start: f64, end: f64 },

    /// No target corresponds to any document object
    #[error("No imported objects matched the selection")]
    NoMatch,

    /// Import targets span multiple namespaces
    #[error("Importing onto multiple namespaces is not supported: {namespaces:?}")]
    NamespaceAmbiguity { namespaces: Vec<String> },

    /// Several selected objects share a leaf name
    #[error("Selection contains non-unique names: {names:?}")]
    NameClash { names: Vec<String> },

    /// Captured attribute value has an unsupported shape
    #[error("Attribute type isn't supported: {object}.{attribute} = {value}")]
    UnsupportedValue {
        object: String,
        attribute: String,
        value: String,
    },

    /// A blocking confirmation was declined
    #[error("Cancelled by user: {reason}")]
    UserCancelled { reason: String },

    /// Key lookup into a document failed
    #[error("Document entry not found: {path}")]
    NotFound { path: String },

    /// Fatal adapter failure outside the apply phase
    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type Result<T> = std::result::Result<T, XadError>;

impl XadError {
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::UserCancelled {
            reason: reason.into(),
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }

    /// Check if the operation was stopped by a user decision rather than a fault
    #[inline]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::UserCancelled { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::VersionMismatch { .. } | Self::Corrupt { .. } => "format",
            Self::EmptySelection
            | Self::NamespaceAmbiguity { .. }
            | Self::NameClash { .. }
            | Self::NoMatch => "selection",
            Self::NoDataCaptured
            | Self::InvalidFrameRange { .. }
            | Self::UnsupportedValue { .. } => "capture",
            Self::UserCancelled { .. } => "cancelled",
            Self::NotFound { .. } => "data",
            Self::Scene(_) => "scene",
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for XadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt {
            reason: err.to_string(),
        }
    }
}
