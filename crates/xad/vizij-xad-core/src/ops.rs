//! File-level entry points for hosts and scripts.
//!
//! `export` captures the selection and writes a `.xad` file; `import` loads
//! one and reconciles it onto the selection. Both report fatal failures as a
//! single [`XadError`]; per-attribute skips end up in the [`ImportReport`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capture::{capture, CaptureRequest};
use crate::config::Config;
use crate::confirm::Confirm;
use crate::document::Document;
use crate::error::{Result, XadError};
use crate::header::FileKind;
use crate::naming;
use crate::reconcile::{reconcile, ImportReport, ImportRequest};
use crate::scene::{AttributeScope, FrameRange, SceneAdapter};

/// Options for [`export`]. Unset frames and objects come from the scene.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub kind: FileKind,
    pub scope: AttributeScope,
    /// Take missing frames from the playback range instead of the keyed range.
    pub use_timeline: bool,
    pub start_frame: Option<f64>,
    pub end_frame: Option<f64>,
    pub objects: Option<Vec<String>>,
    pub comments: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            kind: FileKind::Anim,
            scope: AttributeScope::KeyableVisible,
            use_timeline: true,
            start_frame: None,
            end_frame: None,
            objects: None,
            comments: String::new(),
        }
    }
}

/// Options for [`import`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub match_by_selection_order: bool,
    /// Destination of the clip's first frame; defaults to the current time.
    pub start_frame: Option<f64>,
    /// Place the clip at the frame it was exported from.
    pub apply_at_origin: bool,
    pub namespace: String,
    pub objects: Option<Vec<String>>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            match_by_selection_order: false,
            start_frame: None,
            apply_at_origin: false,
            namespace: naming::NO_NAMESPACE.to_string(),
            objects: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub kind: FileKind,
    pub range: FrameRange,
    pub objects: usize,
    pub namespaces: Vec<String>,
}

/// Append the configured extension unless the file name already has it.
pub fn fix_extension(path: impl AsRef<Path>, cfg: &Config) -> PathBuf {
    let path = path.as_ref();
    match path.extension() {
        Some(ext) if ext == cfg.file_extension.as_str() => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(&cfg.file_extension);
            PathBuf::from(name)
        }
    }
}

/// Sorted stems of the document files in `dir`. A missing directory lists nothing.
pub fn list_documents(dir: impl AsRef<Path>, cfg: &Config) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        log::warn!("no directory matching path {}", dir.display());
        return Ok(Vec::new());
    }
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| XadError::io(dir, e))? {
        let path = entry.map_err(|e| XadError::io(dir, e))?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext == cfg.file_extension.as_str());
        if matches && path.is_file() {
            if let Some(stem) = path.file_stem() {
                stems.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    stems.sort();
    Ok(stems)
}

/// Fail early on a missing or read-only export directory.
fn check_writable_dir(dir: &Path) -> Result<()> {
    let fail = |reason: &str| XadError::Io {
        path: dir.display().to_string(),
        reason: reason.to_string(),
    };
    let meta = fs::metadata(dir).map_err(|_| fail("directory does not exist"))?;
    if !meta.is_dir() {
        return Err(fail("directory does not exist"));
    }
    if meta.permissions().readonly() {
        return Err(fail("directory is not writable"));
    }
    Ok(())
}

fn resolve_objects<S>(scene: &S, objects: &Option<Vec<String>>) -> Result<Vec<String>>
where
    S: SceneAdapter + ?Sized,
{
    let objects = match objects {
        Some(list) => list.clone(),
        None => scene.selection(),
    };
    if objects.is_empty() {
        return Err(XadError::EmptySelection);
    }
    Ok(objects)
}

/// Capture the selection and write it to `path`.
pub fn export<S, C>(
    scene: &S,
    confirm: &mut C,
    path: impl AsRef<Path>,
    opts: &ExportOptions,
    cfg: &Config,
) -> Result<ExportSummary>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    let result = export_inner(scene, confirm, path.as_ref(), opts, cfg);
    if let Err(err) = &result {
        if !err.is_cancellation() {
            log::error!("export failed ({}): {err}", err.category());
        } else {
            log::info!("export was cancelled");
        }
    }
    result
}

fn export_inner<S, C>(
    scene: &S,
    confirm: &mut C,
    path: &Path,
    opts: &ExportOptions,
    cfg: &Config,
) -> Result<ExportSummary>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    if path.as_os_str().is_empty() {
        return Err(XadError::Io {
            path: String::new(),
            reason: "no file path given".to_string(),
        });
    }
    let objects = resolve_objects(scene, &opts.objects)?;
    naming::check_clashing_names(&objects)?;

    let fallback = if opts.use_timeline {
        scene.playback_range()
    } else {
        scene.keyed_range(&objects).unwrap_or_else(|| {
            log::warn!("selection has no keys; using the playback range");
            scene.playback_range()
        })
    };
    let range = FrameRange::new(
        opts.start_frame.unwrap_or(fallback.start),
        opts.end_frame.unwrap_or(fallback.end),
    );

    let path = fix_extension(path, cfg);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        check_writable_dir(parent)?;
    }
    if path.exists()
        && !confirm.confirm("File exists", "File already exists. Overwrite it?")
    {
        return Err(XadError::cancelled("export was cancelled"));
    }

    let request = CaptureRequest::new(objects.clone(), range.start, range.end, opts.kind)
        .with_scope(opts.scope)
        .with_comments(opts.comments.clone());
    let doc = capture(scene, &request, cfg)?;
    doc.save(&path)?;

    Ok(ExportSummary {
        path,
        kind: opts.kind,
        range,
        objects: objects.len(),
        namespaces: doc.namespaces(),
    })
}

/// Load `path` and apply it onto the selection.
pub fn import<S, C>(
    scene: &mut S,
    confirm: &mut C,
    path: impl AsRef<Path>,
    opts: &ImportOptions,
    cfg: &Config,
) -> Result<ImportReport>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    let result = import_inner(scene, confirm, path.as_ref(), opts, cfg);
    if let Err(err) = &result {
        if !err.is_cancellation() {
            log::error!("import failed ({}): {err}", err.category());
        } else {
            log::info!("import was cancelled: {err}");
        }
    }
    result
}

fn import_inner<S, C>(
    scene: &mut S,
    confirm: &mut C,
    path: &Path,
    opts: &ImportOptions,
    cfg: &Config,
) -> Result<ImportReport>
where
    S: SceneAdapter + ?Sized,
    C: Confirm + ?Sized,
{
    let path = fix_extension(path, cfg);
    let mut doc = Document::load(&path)?;
    if !doc.has_content() {
        return Err(XadError::corrupt("document has no objects"));
    }

    let frame_offset = match opts.start_frame {
        Some(frame) => frame,
        None if opts.apply_at_origin => {
            log::info!(
                "applying data at original start frame {}",
                doc.header.origin_frame
            );
            doc.header.origin_frame
        }
        None => scene.current_time(),
    };
    let targets = resolve_objects(&*scene, &opts.objects)?;

    let request = ImportRequest {
        namespace: opts.namespace.clone(),
        targets,
        match_by_selection_order: opts.match_by_selection_order,
        frame_offset,
    };

    if doc.header.kind != FileKind::Anim {
        return reconcile(&mut doc, scene, confirm, &request, cfg);
    }

    // Auto-keying would add a key per value write; suspend it for the import.
    let auto_key = scene.auto_keyframe();
    if auto_key {
        scene.set_auto_keyframe(false);
    }
    let result = reconcile(&mut doc, scene, confirm, &request, cfg);
    if auto_key {
        scene.set_auto_keyframe(true);
    }
    result
}
