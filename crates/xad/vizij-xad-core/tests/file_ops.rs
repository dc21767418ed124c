use std::fs;

use tempfile::tempdir;
use vizij_xad::scene::memory::MemoryAttribute;
use vizij_xad::{
    export, import, list_documents, AlwaysAnswer, Config, ExportOptions, FileKind, FrameRange,
    ImportOptions, MemoryScene, SceneEdit, SceneValue, ScriptedConfirm, XadError,
};

const ROOT: &str = "|char:root";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rig() -> MemoryScene {
    vizij_test_fixtures::scenes::load("rig").expect("load rig scene fixture")
}

fn target() -> MemoryScene {
    vizij_test_fixtures::scenes::load("target").expect("load target scene fixture")
}

fn walk_options() -> ExportOptions {
    ExportOptions {
        start_frame: Some(10.0),
        end_frame: Some(20.0),
        comments: "walk".into(),
        ..Default::default()
    }
}

fn rig_import() -> ImportOptions {
    ImportOptions {
        namespace: "rig:".into(),
        ..Default::default()
    }
}

fn key_times(scene: &MemoryScene, object: &str, attr: &str) -> Vec<f64> {
    scene
        .curve(object, attr)
        .map(|c| c.keys.iter().map(|k| k.time).collect())
        .unwrap_or_default()
}

#[test]
fn exported_files_import_at_the_current_time() {
    init_logging();
    let dir = tempdir().unwrap();
    let cfg = Config::default();

    let summary = export(
        &rig(),
        &mut AlwaysAnswer(true),
        dir.path().join("walk"),
        &walk_options(),
        &cfg,
    )
    .expect("export");
    assert_eq!(summary.path, dir.path().join("walk.xad"));
    assert_eq!(summary.kind, FileKind::Anim);
    assert_eq!(summary.objects, 3);
    assert_eq!(summary.namespaces, vec!["rig:".to_string()]);
    assert_eq!(list_documents(dir.path(), &cfg).unwrap(), vec!["walk"]);

    let mut scene = target();
    scene.auto_keyframe = true;
    let report = import(
        &mut scene,
        &mut AlwaysAnswer(true),
        dir.path().join("walk.xad"),
        &rig_import(),
        &cfg,
    )
    .expect("import");
    assert_eq!(report.keys_written, 5);
    assert_eq!(key_times(&scene, ROOT, "translateX"), vec![100.0, 105.0, 110.0]);

    // Auto-keying is suspended for the import and restored afterwards.
    assert!(scene.auto_keyframe);
    let toggles: Vec<bool> = scene
        .journal()
        .iter()
        .filter_map(|e| match e {
            SceneEdit::AutoKeyframe { enabled } => Some(*enabled),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![false, true]);
    assert!(matches!(
        scene.journal().first(),
        Some(SceneEdit::AutoKeyframe { enabled: false })
    ));
}

#[test]
fn import_can_target_the_origin_or_an_explicit_frame() {
    init_logging();
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let path = dir.path().join("walk.xad");
    export(&rig(), &mut AlwaysAnswer(true), &path, &walk_options(), &cfg).unwrap();

    let mut scene = target();
    let at_origin = ImportOptions {
        apply_at_origin: true,
        ..rig_import()
    };
    import(&mut scene, &mut AlwaysAnswer(true), &path, &at_origin, &cfg).unwrap();
    assert_eq!(key_times(&scene, ROOT, "translateX"), vec![10.0, 15.0, 20.0]);

    let mut scene = target();
    let explicit = ImportOptions {
        start_frame: Some(40.0),
        apply_at_origin: true,
        ..rig_import()
    };
    import(&mut scene, &mut AlwaysAnswer(true), &path, &explicit, &cfg).unwrap();
    assert_eq!(key_times(&scene, ROOT, "translateX"), vec![40.0, 45.0, 50.0]);
}

#[test]
fn overwriting_an_existing_file_asks_first() {
    init_logging();
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let path = dir.path().join("walk.xad");
    export(&rig(), &mut AlwaysAnswer(true), &path, &walk_options(), &cfg).unwrap();
    let before = fs::read(&path).unwrap();

    let pose = ExportOptions {
        kind: FileKind::Pose,
        ..walk_options()
    };
    let mut decline = ScriptedConfirm::new([false], true);
    let err = export(&rig(), &mut decline, &path, &pose, &cfg).unwrap_err();
    assert!(matches!(err, XadError::UserCancelled { .. }));
    assert_eq!(decline.prompts(), ["File exists"]);
    assert_eq!(fs::read(&path).unwrap(), before);

    let mut accept = ScriptedConfirm::new([true], false);
    let summary = export(&rig(), &mut accept, &path, &pose, &cfg).unwrap();
    assert_eq!(summary.kind, FileKind::Pose);
    assert_ne!(fs::read(&path).unwrap(), before);
}

#[test]
fn keyed_range_replaces_the_timeline_when_asked() {
    let dir = tempdir().unwrap();
    let opts = ExportOptions {
        use_timeline: false,
        ..Default::default()
    };
    let summary = export(
        &rig(),
        &mut AlwaysAnswer(true),
        dir.path().join("keyed"),
        &opts,
        &Config::default(),
    )
    .unwrap();
    assert_eq!(summary.range, FrameRange::new(10.0, 20.0));

    let summary = export(
        &rig(),
        &mut AlwaysAnswer(true),
        dir.path().join("timeline"),
        &ExportOptions::default(),
        &Config::default(),
    )
    .unwrap();
    assert_eq!(summary.range, FrameRange::new(1.0, 30.0));
}

#[test]
fn pose_fixture_applies_without_touching_auto_key() {
    init_logging();
    let mut scene = target();
    scene.auto_keyframe = true;
    let path = vizij_test_fixtures::documents::path("pose_v1").unwrap();
    let opts = ImportOptions {
        objects: Some(vec!["|char:root|char:arm|char:hand".into()]),
        ..Default::default()
    };

    // The fixture was exported at 30 fps; the target runs at 24.
    let mut confirm = ScriptedConfirm::new([true], false);
    let report = import(&mut scene, &mut confirm, &path, &opts, &Config::default()).unwrap();
    assert_eq!(confirm.prompts(), ["Framerate doesn't match"]);
    assert_eq!(report.values_written, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].attribute, "spread");
    assert_eq!(
        scene
            .attribute("|char:root|char:arm|char:hand", "curl")
            .map(|a| a.value.clone()),
        Some(SceneValue::Int(3))
    );
    assert!(!scene
        .journal()
        .iter()
        .any(|e| matches!(e, SceneEdit::AutoKeyframe { .. })));
}

#[test]
fn unnamespaced_exports_import_with_default_options() {
    init_logging();
    let dir = tempdir().unwrap();
    let cfg = Config::default();

    let mut source = MemoryScene::new();
    source
        .insert_object("|lamp")
        .attributes
        .insert("intensity".into(), MemoryAttribute::new(SceneValue::Float(2.0)));
    source.selection = vec!["|lamp".into()];
    let pose = ExportOptions {
        kind: FileKind::Pose,
        ..Default::default()
    };
    let summary = export(&source, &mut AlwaysAnswer(true), dir.path().join("lamp"), &pose, &cfg)
        .unwrap();
    assert_eq!(summary.namespaces, vec!["none".to_string()]);

    let mut target = MemoryScene::new();
    target
        .insert_object("|set|lamp")
        .attributes
        .insert("intensity".into(), MemoryAttribute::new(SceneValue::Float(0.0)));
    target.selection = vec!["|set|lamp".into()];
    let report = import(
        &mut target,
        &mut AlwaysAnswer(true),
        &summary.path,
        &ImportOptions::default(),
        &cfg,
    )
    .unwrap();
    assert_eq!(report.namespace, "none");
    assert_eq!(report.values_written, 1);
    assert_eq!(
        target.attribute("|set|lamp", "intensity").map(|a| a.value.clone()),
        Some(SceneValue::Float(2.0))
    );
}

#[test]
fn read_only_directories_fail_before_the_overwrite_prompt() {
    init_logging();
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let path = dir.path().join("walk.xad");
    export(&rig(), &mut AlwaysAnswer(true), &path, &walk_options(), &cfg).unwrap();

    let mut perms = fs::metadata(dir.path()).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(dir.path(), perms.clone()).unwrap();

    let mut confirm = ScriptedConfirm::new([], true);
    let result = export(&rig(), &mut confirm, &path, &walk_options(), &cfg);

    perms.set_readonly(false);
    fs::set_permissions(dir.path(), perms).unwrap();

    match result {
        Err(XadError::Io { reason, .. }) => assert!(reason.contains("not writable"), "{reason}"),
        other => panic!("expected an io error, got {other:?}"),
    }
    assert!(confirm.prompts().is_empty());
}

#[test]
fn file_level_failures_are_reported() {
    init_logging();
    let dir = tempdir().unwrap();
    let cfg = Config::default();

    let missing_dir = dir.path().join("nope").join("walk");
    assert!(matches!(
        export(&rig(), &mut AlwaysAnswer(true), &missing_dir, &walk_options(), &cfg),
        Err(XadError::Io { .. })
    ));

    let mut scene = target();
    assert!(matches!(
        import(
            &mut scene,
            &mut AlwaysAnswer(true),
            dir.path().join("absent"),
            &rig_import(),
            &cfg
        ),
        Err(XadError::Io { .. })
    ));

    let future = vizij_test_fixtures::documents::path("future_version").unwrap();
    assert!(matches!(
        import(&mut scene, &mut AlwaysAnswer(true), &future, &ImportOptions::default(), &cfg),
        Err(XadError::VersionMismatch { .. })
    ));
    assert!(scene.journal().is_empty());

    let mut nothing_selected = rig();
    nothing_selected.selection.clear();
    assert_eq!(
        export(
            &nothing_selected,
            &mut AlwaysAnswer(true),
            dir.path().join("empty"),
            &walk_options(),
            &cfg
        )
        .unwrap_err(),
        XadError::EmptySelection
    );
}

#[test]
fn listing_ignores_other_files_and_missing_directories() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    fs::write(dir.path().join("b.xad"), b"{}").unwrap();
    fs::write(dir.path().join("a.xad"), b"{}").unwrap();
    fs::write(dir.path().join("notes.txt"), b"").unwrap();
    fs::create_dir(dir.path().join("sub.xad")).unwrap();

    assert_eq!(list_documents(dir.path(), &cfg).unwrap(), vec!["a", "b"]);
    assert!(list_documents(dir.path().join("missing"), &cfg)
        .unwrap()
        .is_empty());
}
