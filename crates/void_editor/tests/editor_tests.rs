//! Integration tests for void_editor editing sessions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use void_editor::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor_with_box() -> Editor {
    init_logging();
    let mut editor = Editor::new();
    let mesh = Object3D::mesh("Box", Geometry::cube(1.0), Material::standard()).with_uuid("box");
    editor.execute(Box::new(AddObjectCommand::new(mesh)));
    editor
}

fn root_children(editor: &Editor) -> Vec<&str> {
    editor.state.scene.children.iter().map(|c| c.uuid.as_str()).collect()
}

#[test]
fn test_add_undo_redo_round_trip() {
    let mut editor = editor_with_box();
    assert_eq!(root_children(&editor), vec!["box"]);
    assert_eq!(editor.state.selected.as_deref(), Some("box"));

    assert!(editor.undo());
    assert!(root_children(&editor).is_empty());
    assert_eq!(editor.state.selected, None);

    assert!(editor.redo());
    assert_eq!(root_children(&editor), vec!["box"]);
    assert_eq!(editor.state.geometries.len(), 1);
}

#[test]
fn test_remove_restores_sibling_order() {
    let mut editor = editor_with_box();
    for name in ["a", "b"] {
        editor.execute(Box::new(AddObjectCommand::new(Object3D::group(name).with_uuid(name))));
    }
    assert_eq!(root_children(&editor), vec!["box", "a", "b"]);

    let cmd = RemoveObjectCommand::new(&editor.state, "a").unwrap();
    editor.execute(Box::new(cmd));
    assert_eq!(root_children(&editor), vec!["box", "b"]);

    editor.undo();
    assert_eq!(root_children(&editor), vec!["box", "a", "b"]);
}

#[test]
fn test_move_to_end_of_same_parent() {
    let mut editor = editor_with_box();
    for name in ["b", "c"] {
        editor.execute(Box::new(AddObjectCommand::new(Object3D::group(name).with_uuid(name))));
    }

    let root = editor.state.scene_uuid().to_string();
    let cmd = MoveObjectCommand::new(&editor.state, "box", &root, None).unwrap();
    assert_eq!(cmd.new_index(), 2);
    editor.execute(Box::new(cmd));
    assert_eq!(root_children(&editor), vec!["b", "c", "box"]);

    editor.undo();
    assert_eq!(root_children(&editor), vec!["box", "b", "c"]);
}

#[test]
fn test_batch_is_one_entry_with_one_notification() {
    let mut editor = editor_with_box();
    let changes = Arc::new(AtomicUsize::new(0));
    let seen = changes.clone();
    editor.state.signals.scene_graph_changed.add(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let state = &editor.state;
    let cmds: Vec<Box<dyn Command>> = vec![
        Box::new(SetValueCommand::new(state, "box", "name", "Crate").unwrap()),
        Box::new(SetValueCommand::new(state, "box", "visible", false).unwrap()),
        Box::new(SetValueCommand::new(state, "box", "castShadow", true).unwrap()),
        Box::new(SetValueCommand::new(state, "box", "receiveShadow", true).unwrap()),
        Box::new(SetValueCommand::new(state, "box", "renderOrder", 2).unwrap()),
    ];
    editor.execute(Box::new(MultiCmdsCommand::new(cmds)));

    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_eq!(editor.history.undo_count(), 2);
    assert_eq!(editor.history.undo_description(), Some("Multiple Changes"));

    editor.undo();
    let object = editor.state.object_by_uuid("box").unwrap();
    assert_eq!(object.name, "Box");
    assert!(object.visible);
    assert_eq!(object.render_order, 0);
}

#[test]
fn test_history_events() {
    let mut editor = editor_with_box();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    editor.state.signals.history_changed.add(move |event: &HistoryEvent| {
        sink.lock().push(event.clone());
    });

    for x in [1.0, 2.0] {
        let cmd = SetPositionCommand::new(&editor.state, "box", [x, 0.0, 0.0]).unwrap();
        editor.execute(Box::new(cmd));
    }
    editor.undo();

    let events = events.lock();
    assert!(matches!(events[0], HistoryEvent::Executed { id: 2, .. }));
    assert!(matches!(events[1], HistoryEvent::Merged { id: 2, .. }));
    assert!(matches!(events[2], HistoryEvent::Undone { id: 2, .. }));
}

#[test]
fn test_without_history() {
    let mut editor = editor_with_box();
    editor.without_history(|editor| {
        let cmd = SetValueCommand::new(&editor.state, "box", "name", "Imported").unwrap();
        editor.execute(Box::new(cmd));
    });

    assert_eq!(editor.state.object_by_uuid("box").unwrap().name, "Imported");
    assert_eq!(editor.history.undo_count(), 1);
    assert!(editor.history.is_enabled());
}

#[test]
fn test_set_uuid_follows_object() {
    let mut editor = editor_with_box();
    editor.execute(Box::new(
        AddScriptCommand::new(&editor.state, "box", Script::new("spin", "rotate()")).unwrap(),
    ));
    editor.execute(Box::new(SetUuidCommand::new(&editor.state, "box", "crate").unwrap()));

    assert!(editor.state.object_by_uuid("crate").is_some());
    assert_eq!(editor.state.scripts_for("crate").len(), 1);

    editor.undo();
    assert!(editor.state.object_by_uuid("box").is_some());
    assert_eq!(editor.state.scripts_for("box").len(), 1);
}

#[test]
fn test_remove_game_object_takes_scripts() {
    let mut editor = editor_with_box();
    editor.execute(Box::new(
        AddScriptCommand::new(&editor.state, "box", Script::new("spin", "")).unwrap(),
    ));

    let cmd = RemoveGameObjectCommand::new(&editor.state, "box").unwrap();
    editor.execute(Box::new(cmd));
    assert!(editor.state.scripts.is_empty());
    assert!(editor.state.object_by_uuid("box").is_none());

    editor.undo();
    assert_eq!(editor.state.scripts_for("box")[0].name, "spin");
}

#[test]
fn test_clear_resets_session() {
    let mut editor = editor_with_box();
    editor.clear();
    assert!(root_children(&editor).is_empty());
    assert!(!editor.history.can_undo());
}

#[test]
fn test_helper_keeps_uuid_through_remove_and_undo() {
    let mut editor = editor_with_box();
    let lamp = Object3D::light(ObjectKind::PointLight, "Lamp", Color::WHITE, 1.0).with_uuid("lamp");
    editor.execute(Box::new(AddObjectCommand::new(lamp)));
    let helper = editor.state.helpers["lamp"].uuid.clone();

    let cmd = RemoveObjectCommand::new(&editor.state, "lamp").unwrap();
    editor.execute(Box::new(cmd));
    assert!(!editor.state.helpers.contains_key("lamp"));

    editor.undo();
    assert_eq!(editor.state.helpers["lamp"].uuid, helper);
}

#[test]
fn test_uuid_is_not_a_plain_value() {
    let editor = editor_with_box();
    assert!(SetValueCommand::new(&editor.state, "box", "uuid", "crate").is_err());
    assert!(editor.state.object_by_uuid("box").is_some());
}
