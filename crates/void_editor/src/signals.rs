//! Editor notification channels.
//!
//! Commands dispatch on these after they mutate state so panels, viewports
//! and the history view can refresh.

use void_signal::Signal;

/// Identifies one script slot on an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptEvent {
    pub object: String,
    pub index: usize,
}

/// Change to the history stacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryEvent {
    Executed { id: i64, name: String },
    Merged { id: i64, name: String },
    Undone { id: i64, name: String },
    Redone { id: i64, name: String },
    /// Jumped to the entry with this id (0 for the initial state)
    Moved { id: i64 },
    Restored { count: usize },
    Cleared,
}

/// Every channel the editor dispatches on.
#[derive(Debug)]
pub struct EditorSignals {
    pub object_added: Signal<String>,
    pub object_removed: Signal<String>,
    pub object_changed: Signal<String>,
    pub object_selected: Signal<Option<String>>,
    pub scene_graph_changed: Signal<()>,
    pub geometry_changed: Signal<String>,
    pub material_changed: Signal<String>,
    pub script_added: Signal<ScriptEvent>,
    pub script_changed: Signal<ScriptEvent>,
    pub script_removed: Signal<ScriptEvent>,
    pub helper_added: Signal<String>,
    pub helper_removed: Signal<String>,
    pub history_changed: Signal<HistoryEvent>,
}

impl Default for EditorSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSignals {
    pub fn new() -> Self {
        Self {
            object_added: Signal::new("objectAdded"),
            object_removed: Signal::new("objectRemoved"),
            object_changed: Signal::new("objectChanged"),
            object_selected: Signal::new("objectSelected"),
            scene_graph_changed: Signal::new("sceneGraphChanged"),
            geometry_changed: Signal::new("geometryChanged"),
            material_changed: Signal::new("materialChanged"),
            script_added: Signal::new("scriptAdded"),
            script_changed: Signal::new("scriptChanged"),
            script_removed: Signal::new("scriptRemoved"),
            helper_added: Signal::new("helperAdded"),
            helper_removed: Signal::new("helperRemoved"),
            history_changed: Signal::new("historyChanged"),
        }
    }
}
