//! Reconciliation: apply a loaded document onto a target selection (import path).
//!
//! Steps, in order:
//! 1. map document objects to targets (by name, or by selection order)
//! 2. confirm a framerate divergence
//! 3. split targets into resolved / nonexistent, noting pre-existing keys
//! 4. confirm and clear the destination window (anim documents only)
//! 5. report and optionally sync rotation orders
//! 6. write curves and pose values
//!
//! Everything before step 4's clear is read-only. Failures inside step 6 are
//! per-attribute skips; the import as a whole still succeeds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::confirm::Confirm;
use crate::curve::{AnimCurve, CurveSide};
use crate::document::Document;
use crate::error::{Result, SceneError, XadError};
use crate::header::FileKind;
use crate::ids::ObjectIndex;
use crate::naming;
use crate::progress::{Progress, Timer};
use crate::record::{AttributeRecord, PoseValue, RotationOrder};
use crate::scene::{FrameRange, SceneAdapter, TangentEdit};

/// Target selection and placement for one import.
#[derive(Clone, Debug)]
pub struct ImportRequest {
    /// Document namespace to read objects from.
    pub namespace: String,
    /// Full paths of the objects to write onto, in selection order.
    pub targets: Vec<String>,
    /// Pair by position instead of by name.
    pub match_by_selection_order: bool,
    /// Destination frame of relative time 0.
    pub frame_offset: f64,
}

impl ImportRequest {
    pub fn new(targets: Vec<String>, frame_offset: f64) -> Self {
        Self {
            namespace: naming::NO_NAMESPACE.to_string(),
            targets,
            match_by_selection_order: false,
            frame_offset,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn by_selection_order(mut self, enabled: bool) -> Self {
        self.match_by_selection_order = enabled;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationMismatch {
    pub object: String,
    pub current: RotationOrder,
    pub source: RotationOrder,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedAttribute {
    pub object: String,
    pub attribute: String,
    pub reason: String,
}

/// Outcome of a successful import, including everything that was skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub namespace: String,
    /// Document object index → target path.
    pub mapped: BTreeMap<ObjectIndex, String>,
    /// Mapped targets that do not exist in the scene.
    pub nonexistent: Vec<String>,
    pub rotation_mismatches: Vec<RotationMismatch>,
    pub rotation_orders_changed: Vec<String>,
    pub keys_cleared: bool,
    pub keys_written: usize,
    pub values_written: usize,
    pub skipped: Vec<SkippedAttribute>,
}

/// Map document objects (active namespace) to targets.
///
/// By name: each target's namespace-free leaf is compared with each stored
/// object's leaf; the first unclaimed match wins. By order: target `i` maps to
/// object index `i`. An empty mapping is [`XadError::NoMatch`].
pub fn map_targets(
    doc: &Document,
    targets: &[String],
    by_selection_order: bool,
) -> Result<BTreeMap<ObjectIndex, String>> {
    let objects = doc.objects()?;
    let mut mapped = BTreeMap::new();

    if by_selection_order {
        for ((idx, _), target) in objects.iter().zip(targets) {
            mapped.insert(*idx, target.clone());
        }
    } else {
        let mut pool: Vec<(ObjectIndex, &str)> = objects
            .iter()
            .map(|(idx, path)| (*idx, naming::leaf(path)))
            .collect();
        for target in targets {
            let name = naming::bare_name(target);
            if let Some(pos) = pool.iter().position(|(_, leaf)| *leaf == name) {
                let (idx, _) = pool.remove(pos);
                mapped.insert(idx, target.clone());
            }
        }
    }

    if mapped.is_empty() {
        log::error!("no imported objects matched selection {targets:?}");
        return Err(XadError::NoMatch);
    }
    Ok(mapped)
}

/// Apply `doc` onto `request.targets`.
pub fn reconcile<S, C>(
    doc: &mut Document,
    scene: &mut S,
    confirm: &mut C,
    request: &ImportRequest,
    cfg: &Config,
) -> Result<ImportReport>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    let timer = Timer::new(cfg.timing_enabled());
    timer.mark("# writeToScene start");

    if request.targets.is_empty() {
        return Err(XadError::EmptySelection);
    }
    naming::check_clashing_names(&request.targets)?;
    naming::check_single_namespace(&request.targets)?;
    if !doc.has_namespace(&request.namespace) {
        log::error!(
            "namespace '{}' not in document (has {:?})",
            request.namespace,
            doc.namespaces()
        );
        return Err(XadError::NotFound {
            path: format!("[{}]", request.namespace),
        });
    }
    doc.set_active_namespace(&request.namespace);
    let doc: &Document = doc;

    let mut report = ImportReport {
        namespace: request.namespace.clone(),
        ..Default::default()
    };

    timer.mark("# identity mapping start");
    report.mapped = map_targets(doc, &request.targets, request.match_by_selection_order)?;
    timer.mark("# identity mapping end");

    check_framerate(doc, &*scene, confirm)?;

    let window = FrameRange::new(
        request.frame_offset,
        doc.header.window_end(request.frame_offset),
    );
    timer.mark("# check for existing keys");
    let partition = partition_targets(&*scene, &report.mapped, window);
    for missing in &partition.nonexistent {
        log::warn!("target {missing} does not exist in the scene; skipping it");
    }
    report.nonexistent = partition.nonexistent;
    let resolved = partition.resolved;

    if doc.header.kind == FileKind::Anim && partition.has_existing_keys {
        let message = format!(
            "Keys already exist in framerange: {}-{}\nOverwrite?",
            frame_label(window.start),
            frame_label(window.end)
        );
        if !confirm.confirm("Keys exist", &message) {
            return Err(XadError::cancelled("existing keys were not overwritten"));
        }
        let objects: Vec<String> = resolved.iter().map(|(_, t)| t.clone()).collect();
        scene.begin_undo_chunk("clear import window");
        let cleared = scene.clear_keys(&objects, window);
        scene.end_undo_chunk();
        cleared?;
        report.keys_cleared = true;
    }

    timer.mark("# rotation order check");
    report.rotation_mismatches = rotation_mismatches(doc, &*scene, &resolved)?;
    if !report.rotation_mismatches.is_empty() {
        report.rotation_orders_changed =
            sync_rotation_orders(scene, confirm, &report.rotation_mismatches);
    }

    timer.mark("# write keys start");
    let mut progress = Progress::new("Importing Data", resolved.len(), cfg.report_progress);
    for (idx, target) in &resolved {
        apply_object(doc, scene, *idx, target, request.frame_offset, &mut report)?;
        progress.step();
    }
    progress.finish();
    timer.mark("# write keys end");

    if !report.skipped.is_empty() {
        log::warn!(
            "import finished with {} skipped attribute(s)",
            report.skipped.len()
        );
    }
    log::info!(
        "import was successful: {} object(s), {} key(s), {} value(s)",
        resolved.len(),
        report.keys_written,
        report.values_written
    );
    Ok(report)
}

fn frame_label(frame: f64) -> String {
    if frame.fract() == 0.0 {
        format!("{}", frame as i64)
    } else {
        frame.to_string()
    }
}

fn check_framerate<S, C>(doc: &Document, scene: &S, confirm: &mut C) -> Result<()>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    let current = scene.framerate();
    let source = doc.header.framerate;
    if current.is_known() && source.is_known() && current != source {
        let message = format!(
            "Animation was exported with a different framerate than\nyour current settings. Continue anyway?\n\nSource: {source} fps\nCurrent: {current} fps"
        );
        if !confirm.confirm("Framerate doesn't match", &message) {
            return Err(XadError::cancelled("framerate mismatch"));
        }
        log::warn!("importing {source} fps data into a {current} fps scene");
    }
    Ok(())
}

struct Partition {
    resolved: Vec<(ObjectIndex, String)>,
    nonexistent: Vec<String>,
    has_existing_keys: bool,
}

fn partition_targets<S>(
    scene: &S,
    mapped: &BTreeMap<ObjectIndex, String>,
    window: FrameRange,
) -> Partition
where
    S: SceneAdapter + ?Sized,
{
    let mut out = Partition {
        resolved: Vec::with_capacity(mapped.len()),
        nonexistent: Vec::new(),
        has_existing_keys: false,
    };
    for (idx, target) in mapped {
        if !scene.object_exists(target) {
            out.nonexistent.push(target.clone());
            continue;
        }
        match scene.object_keyframe_count(target, window) {
            Ok(count) => {
                out.has_existing_keys |= count > 0;
                out.resolved.push((*idx, target.clone()));
            }
            Err(SceneError::NoSuchObject { .. }) => out.nonexistent.push(target.clone()),
            Err(err) => {
                log::warn!("could not probe keys on {target}: {err}");
                out.resolved.push((*idx, target.clone()));
            }
        }
    }
    out
}

fn rotation_mismatches<S>(
    doc: &Document,
    scene: &S,
    resolved: &[(ObjectIndex, String)],
) -> Result<Vec<RotationMismatch>>
where
    S: SceneAdapter + ?Sized,
{
    let mut out = Vec::new();
    for (idx, target) in resolved {
        let Some(current) = scene.rotation_order(target) else {
            continue;
        };
        let source = doc.rotation_order(*idx)?;
        if current != source {
            out.push(RotationMismatch {
                object: target.clone(),
                current,
                source,
            });
        }
    }
    Ok(out)
}

/// Ask once, then set every mismatched rotation order. Returns the objects changed.
fn sync_rotation_orders<S, C>(
    scene: &mut S,
    confirm: &mut C,
    mismatches: &[RotationMismatch],
) -> Vec<String>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    log::warn!("target objects with mismatching rotation order:");
    for m in mismatches {
        log::warn!(
            "{}: source roo: {}, target roo: {}",
            naming::leaf(&m.object),
            m.source,
            m.current
        );
    }

    let message = "One or more objects' rotation order mismatches the import values.\nMatch target rotation order to source?";
    if !confirm.confirm("Rotation order mismatch", message) {
        log::info!("not touching rotation order");
        return Vec::new();
    }

    let mut changed = Vec::new();
    for m in mismatches {
        match scene.set_rotation_order(&m.object, m.source) {
            Ok(()) => {
                log::info!("{}.rotateOrder -> {}", naming::leaf(&m.object), m.source);
                changed.push(m.object.clone());
            }
            Err(err) => log::warn!(
                "failed to set rotation order on {} ({err}); it is probably locked",
                m.object
            ),
        }
    }
    changed
}

fn apply_object<S>(
    doc: &Document,
    scene: &mut S,
    idx: ObjectIndex,
    target: &str,
    frame_offset: f64,
    report: &mut ImportReport,
) -> Result<()>
where
    S: SceneAdapter + ?Sized,
{
    let object = doc.object(idx)?;
    for (attr, record) in &object.attributes {
        if !scene.has_attribute(target, attr) {
            log::debug!("{target} has no attribute '{attr}'; skipping");
            report.skipped.push(SkippedAttribute {
                object: target.to_string(),
                attribute: attr.clone(),
                reason: "attribute missing on target".to_string(),
            });
            continue;
        }

        let outcome = match record {
            AttributeRecord::Anim(curve) => {
                apply_curve(scene, target, attr, curve, frame_offset).map(|n| {
                    report.keys_written += n;
                })
            }
            AttributeRecord::Pose(pose) => apply_pose(scene, target, attr, pose).map(|written| {
                if written {
                    report.values_written += 1;
                }
            }),
        };

        if let Err(err) = outcome {
            log::warn!(
                "[{}][{idx}] {target}.{attr} ({}) cannot be modified: {err}. Skipping...",
                doc.active_namespace(),
                record.variant_name()
            );
            report.skipped.push(SkippedAttribute {
                object: target.to_string(),
                attribute: attr.clone(),
                reason: err.to_string(),
            });
        }
    }
    Ok(())
}

/// Create every key, then apply tangents key by key, then non-default
/// infinities. Returns the number of keys created.
fn apply_curve<S>(
    scene: &mut S,
    target: &str,
    attr: &str,
    curve: &AnimCurve,
    frame_offset: f64,
) -> std::result::Result<usize, SceneError>
where
    S: SceneAdapter + ?Sized,
{
    if curve.is_empty() {
        log::debug!("{target}.{attr}: curve has no keys in range; nothing to write");
        return Ok(0);
    }

    for key in &curve.keys {
        scene.set_keyframe(target, attr, key.absolute_time(frame_offset), key.value)?;
    }

    scene.set_weighted_tangents(target, attr, curve.weighted_tangents)?;
    for key in &curve.keys {
        let time = key.absolute_time(frame_offset);
        let edits = [
            TangentEdit::Angles {
                in_angle: key.in_angle,
                out_angle: key.out_angle,
                in_weight: key.in_weight,
                out_weight: key.out_weight,
            },
            TangentEdit::Types {
                in_tangent: key.in_tangent,
                out_tangent: key.out_tangent,
            },
            TangentEdit::Lock(key.lock),
        ];
        for edit in edits {
            scene.edit_key_tangent(target, attr, time, edit)?;
        }
        if curve.weighted_tangents {
            scene.edit_key_tangent(target, attr, time, TangentEdit::WeightLock(key.weight_lock))?;
        }
    }

    if !curve.pre_infinity.is_default() {
        scene.set_infinity(target, attr, CurveSide::Pre, curve.pre_infinity)?;
    }
    if !curve.post_infinity.is_default() {
        scene.set_infinity(target, attr, CurveSide::Post, curve.post_infinity)?;
    }
    Ok(curve.keys.len())
}

/// Write the stored value unless the target already holds it.
fn apply_pose<S>(
    scene: &mut S,
    target: &str,
    attr: &str,
    pose: &PoseValue,
) -> std::result::Result<bool, SceneError>
where
    S: SceneAdapter + ?Sized,
{
    let current = scene.get_value(target, attr)?;
    if current.as_f64() == Some(pose.value) {
        return Ok(false);
    }
    scene.set_value(target, attr, pose.value)?;
    Ok(true)
}
