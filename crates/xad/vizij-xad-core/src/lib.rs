//! Vizij XAD Core (host-agnostic)
//!
//! Exports the attribute state of selected scene objects to a versioned `.xad`
//! document and reapplies it onto other objects, either as a static pose or as
//! keyframed curves. Hosts plug in through [`SceneAdapter`] and [`Confirm`];
//! [`MemoryScene`] is a serde-loadable adapter used by tests and tooling.

pub mod capture;
pub mod config;
pub mod confirm;
pub mod curve;
pub mod document;
pub mod error;
pub mod header;
pub mod ids;
pub mod naming;
pub mod ops;
pub mod progress;
pub mod reconcile;
pub mod record;
pub mod scene;

// Re-exports for hosts
pub use capture::{capture, CaptureRequest};
pub use config::{Config, DebugLevel};
pub use confirm::{AlwaysAnswer, Confirm, ScriptedConfirm};
pub use curve::{AnimCurve, CurveSide, Infinity, KeyframeRecord, TangentType};
pub use document::{Document, FieldValue, KeyField};
pub use error::{Result, SceneError, XadError};
pub use header::{FileKind, Framerate, Header, FORMAT_VERSION};
pub use ids::{KeyIndex, ObjectIndex};
pub use ops::{
    export, fix_extension, import, list_documents, ExportOptions, ExportSummary, ImportOptions,
};
pub use reconcile::{map_targets, reconcile, ImportReport, ImportRequest};
pub use record::{AttributeRecord, ObjectRecord, PoseValue, RotationOrder, ValueType};
pub use scene::{
    AttributeScope, FrameRange, MemoryScene, SceneAdapter, SceneEdit, SceneKey, SceneValue,
    TangentEdit,
};
