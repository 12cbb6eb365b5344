//! Integration tests for project save/load with persistent history

use void_editor::core::HistoryConfig;
use void_editor::prelude::*;
use void_editor::{EditorConfig, HistoryError, ProjectError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn persistent_editor() -> Editor {
    init_logging();
    Editor::with_config(EditorConfig {
        history: HistoryConfig {
            persistent: true,
            merge_window_ms: None,
        },
        ..EditorConfig::default()
    })
}

/// Add a box, move it, script it, then put it in a new folder.
fn build_session(editor: &mut Editor) {
    let mesh = Object3D::mesh("Box", Geometry::cube(1.0), Material::standard()).with_uuid("box");
    editor.execute(Box::new(AddObjectCommand::new(mesh)));

    let cmd = SetPositionCommand::new(&editor.state, "box", [1.0, 2.0, 3.0]).unwrap();
    editor.execute(Box::new(cmd));

    let cmd = AddScriptCommand::new(&editor.state, "box", Script::new("spin", "rotate()")).unwrap();
    editor.execute(Box::new(cmd));

    editor.execute(Box::new(AddObjectCommand::new(
        Object3D::group("Folder").with_uuid("folder"),
    )));

    let cmd = MoveObjectCommand::new(&editor.state, "box", "folder", None).unwrap();
    editor.execute(Box::new(cmd));
}

fn parent_of_box(editor: &Editor) -> Option<String> {
    editor
        .state
        .scene
        .index_in_parent("box")
        .map(|(parent, _)| parent)
}

#[test]
fn test_save_and_reload_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let mut editor = persistent_editor();
    build_session(&mut editor);
    assert!(editor.history.is_dirty());
    editor.save(&path).unwrap();
    assert!(!editor.history.is_dirty());

    let mut loaded = persistent_editor();
    let report = loaded.load(&path).unwrap();
    assert!(report.is_clean(), "{:?}", report.diagnostics);
    assert_eq!(report.restored, 5);
    assert_eq!(parent_of_box(&loaded).as_deref(), Some("folder"));
    assert_eq!(loaded.state.scripts_for("box").len(), 1);

    let root = loaded.state.scene_uuid().to_string();

    // Move
    loaded.undo();
    assert_eq!(parent_of_box(&loaded), Some(root.clone()));
    // Folder
    loaded.undo();
    assert!(loaded.state.object_by_uuid("folder").is_none());
    // Script
    loaded.undo();
    assert!(loaded.state.scripts_for("box").is_empty());
    // Position
    loaded.undo();
    assert_eq!(loaded.state.object_by_uuid("box").unwrap().position, [0.0, 0.0, 0.0]);
    // Add
    loaded.undo();
    assert!(loaded.state.object_by_uuid("box").is_none());

    assert!(loaded.go_to_state(5));
    assert_eq!(parent_of_box(&loaded).as_deref(), Some("folder"));
    assert_eq!(loaded.state.object_by_uuid("box").unwrap().position, [1.0, 2.0, 3.0]);
    assert_eq!(loaded.state.scripts_for("box")[0].source, "rotate()");

    let cmd = SetValueCommand::new(&loaded.state, "box", "name", "Crate").unwrap();
    loaded.execute(Box::new(cmd));
    assert_eq!(loaded.history.undos().last().unwrap().id(), 6);
}

#[test]
fn test_history_not_written_unless_persistent() {
    init_logging();
    let mut editor = Editor::new();
    build_session(&mut editor);

    let data = editor.to_json().unwrap();
    assert!(data.history.is_none());
    assert_eq!(data.metadata.kind, "Project");

    let json = serde_json::to_value(&data).unwrap();
    let mut loaded = Editor::new();
    let report = loaded.from_json(&json).unwrap();
    assert_eq!(report.restored, 0);
    assert!(!loaded.history.can_undo());
    assert_eq!(parent_of_box(&loaded).as_deref(), Some("folder"));
}

#[test]
fn test_removed_object_comes_back_from_record() {
    let mut editor = persistent_editor();
    build_session(&mut editor);
    let cmd = RemoveObjectCommand::new(&editor.state, "folder").unwrap();
    editor.execute(Box::new(cmd));
    assert!(editor.state.object_by_uuid("box").is_none());

    let json = serde_json::to_value(editor.to_json().unwrap()).unwrap();
    let mut loaded = persistent_editor();
    let report = loaded.from_json(&json).unwrap();
    assert_eq!(report.restored, 6);
    assert!(!loaded.history.undos().last().unwrap().is_inert());

    loaded.undo();
    assert_eq!(parent_of_box(&loaded).as_deref(), Some("folder"));
    assert_eq!(loaded.state.object_by_uuid("box").unwrap().position, [1.0, 2.0, 3.0]);
}

#[test]
fn test_edit_of_removed_object_undoes_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let mut editor = persistent_editor();
    let mesh = Object3D::mesh("Box", Geometry::cube(1.0), Material::standard()).with_uuid("box");
    editor.execute(Box::new(AddObjectCommand::new(mesh)));
    let cmd = SetValueCommand::new(&editor.state, "box", "name", "Crate").unwrap();
    editor.execute(Box::new(cmd));
    let cmd = RemoveObjectCommand::new(&editor.state, "box").unwrap();
    editor.execute(Box::new(cmd));
    editor.save(&path).unwrap();

    let mut loaded = persistent_editor();
    let report = loaded.load(&path).unwrap();
    assert_eq!(report.restored, 3);

    assert!(loaded.undo());
    assert_eq!(loaded.state.object_by_uuid("box").unwrap().name, "Crate");
    assert!(loaded.undo());
    assert_eq!(loaded.state.object_by_uuid("box").unwrap().name, "Box");
    assert!(loaded.history.redos().all(|cmd| !cmd.is_inert()));

    // Saving again writes the resolved edit, not the stale record.
    loaded.redo();
    let json = serde_json::to_value(loaded.to_json().unwrap()).unwrap();
    assert_eq!(json["history"]["undos"][1]["newValue"], "Crate");
}

#[test]
fn test_dangling_reference_restores_inert() {
    let mut editor = persistent_editor();
    build_session(&mut editor);
    let mut json = serde_json::to_value(editor.to_json().unwrap()).unwrap();

    // Drop the folder (and the box in it) from the saved scene.
    json["scene"]["object"]["children"] = serde_json::json!([]);

    let mut loaded = persistent_editor();
    let report = loaded.from_json(&json).unwrap();
    assert_eq!(report.restored, 5);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, HistoryError::ReferenceResolution { uuid, .. } if uuid == "box")));

    while loaded.undo() {}
    assert!(loaded.state.scene.children.is_empty());
}

#[test]
fn test_unknown_command_is_skipped() {
    let mut editor = persistent_editor();
    build_session(&mut editor);
    let mut json = serde_json::to_value(editor.to_json().unwrap()).unwrap();
    json["history"]["undos"][2]["type"] = serde_json::json!("WarpCommand");

    let mut loaded = persistent_editor();
    let report = loaded.from_json(&json).unwrap();
    assert_eq!(report.restored, 4);
    assert_eq!(
        report.diagnostics,
        vec![HistoryError::SerializationMismatch("WarpCommand".to_string())]
    );
}

#[test]
fn test_structural_errors_abort_load() {
    let mut editor = persistent_editor();
    build_session(&mut editor);
    let good = serde_json::to_value(editor.to_json().unwrap()).unwrap();

    let mut loaded = persistent_editor();
    loaded.execute(Box::new(AddObjectCommand::new(Object3D::group("Keep").with_uuid("keep"))));

    let mut wrong_type = good.clone();
    wrong_type["metadata"]["type"] = serde_json::json!("Geometry");
    assert!(matches!(loaded.from_json(&wrong_type), Err(ProjectError::Structure(_))));

    let mut bad_history = good.clone();
    bad_history["history"] = serde_json::json!({ "undos": 3 });
    assert!(matches!(
        loaded.from_json(&bad_history),
        Err(ProjectError::History(HistoryError::Malformed(_)))
    ));

    assert!(matches!(
        loaded.from_json(&serde_json::json!([1, 2, 3])),
        Err(ProjectError::Json(_))
    ));

    // Nothing was replaced.
    assert!(loaded.state.object_by_uuid("keep").is_some());
    assert_eq!(loaded.history.undo_count(), 1);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = persistent_editor();
    assert!(matches!(
        editor.load(&dir.path().join("nope.json")),
        Err(ProjectError::Io(_))
    ));
}
