//! Undo/Redo history with command pattern and edit coalescing.
//!
//! All editor modifications go through the history system to enable
//! undo/redo. Consecutive edits of the same attribute fold into one entry,
//! and the undo stack can be written into a project and restored later.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::{
    apply, record_of, resolve_pending, Command, CommandError, CommandRecord, CommandRegistry,
    Direction, RestoreContext,
};
use crate::core::EditorState;
use crate::signals::HistoryEvent;

/// History errors. Most are diagnostics: the history logs them and carries on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Undo or redo with nothing to move
    #[error("Invalid history transition: {0}")]
    InvalidStateTransition(&'static str),

    /// Record type tag not known to the registry
    #[error("Unknown command type '{0}'")]
    SerializationMismatch(String),

    /// Record whose object was not in the loaded scene. It is resolved
    /// again on first undo or redo and goes inert if still missing.
    #[error("Command #{index} references missing object {uuid}")]
    ReferenceResolution { index: usize, uuid: String },

    /// Record or history document could not be decoded
    #[error("Malformed history: {0}")]
    Malformed(String),
}

/// Persisted form of the history.
///
/// Only the undo stack is written; redo entries are dropped on save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryJson {
    pub undos: Vec<CommandRecord>,
}

/// Outcome of restoring a history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries now on the undo stack
    pub restored: usize,
    /// Records skipped or restored inert
    pub diagnostics: Vec<HistoryError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Undo/redo history stack.
pub struct History {
    /// Commands that can be undone
    undos: Vec<Box<dyn Command>>,
    /// Commands that can be redone
    redos: Vec<Box<dyn Command>>,
    /// Last id handed out
    id_counter: i64,
    /// When the last command was recorded; cleared by anything that breaks
    /// a run of edits
    last_execute: Option<Instant>,
    merge_window: Option<Duration>,
    enabled: bool,
    /// Whether history has been modified since last save
    dirty: bool,
    /// Factories for resolving deferred records, kept from the last restore
    registry: Option<CommandRegistry>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("undos", &self.undos.len())
            .field("redos", &self.redos.len())
            .field("id_counter", &self.id_counter)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_merge_window(None)
    }

    /// Only coalesce edits that arrive within `window` of each other.
    pub fn with_merge_window(window: Option<Duration>) -> Self {
        Self {
            undos: Vec::new(),
            redos: Vec::new(),
            id_counter: 0,
            last_execute: None,
            merge_window: window,
            enabled: true,
            dirty: false,
            registry: None,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undos.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redos.len()
    }

    /// Name of the next command to undo.
    pub fn undo_description(&self) -> Option<&str> {
        self.undos.last().map(|c| c.name())
    }

    /// Name of the next command to redo.
    pub fn redo_description(&self) -> Option<&str> {
        self.redos.last().map(|c| c.name())
    }

    /// Undo stack, oldest first.
    pub fn undos(&self) -> impl Iterator<Item = &dyn Command> {
        self.undos.iter().map(|c| c.as_ref())
    }

    /// Redo stack, next to redo last.
    pub fn redos(&self) -> impl Iterator<Item = &dyn Command> {
        self.redos.iter().map(|c| c.as_ref())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark as saved (clears dirty flag).
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Suspend or resume recording. While suspended, executed commands
    /// apply but leave both stacks untouched.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.last_execute = None;
    }

    // ========================================================================
    // Execute / undo / redo
    // ========================================================================

    /// Execute a command and record it, or fold it into the previous entry
    /// when both edit the same attribute.
    ///
    /// A command whose execute fails is logged and not recorded.
    pub fn execute(
        &mut self,
        state: &mut EditorState,
        mut cmd: Box<dyn Command>,
        optional_name: Option<&str>,
    ) {
        if let Some(name) = optional_name {
            cmd.meta_mut().name = name.to_string();
        }

        if !self.enabled {
            apply(cmd.as_mut(), state, Direction::Forward);
            return;
        }

        let now = Instant::now();
        let in_run = self.last_execute.is_some();
        let in_window = self.within_window(now);

        let event = match self.undos.last_mut() {
            Some(last) if should_merge(last.as_ref(), cmd.as_ref(), in_run, in_window) => {
                last.update(cmd.as_ref());
                if let Some(name) = optional_name {
                    last.meta_mut().name = name.to_string();
                }
                apply(last.as_mut(), state, Direction::Forward);
                log::trace!("Merged '{}' into #{}", cmd.name(), last.id());
                HistoryEvent::Merged {
                    id: last.id(),
                    name: last.name().to_string(),
                }
            }
            _ => {
                if let Err(e) = cmd.execute(state) {
                    log::warn!("Command '{}' failed, not recorded: {}", cmd.name(), e);
                    return;
                }
                self.id_counter += 1;
                let meta = cmd.meta_mut();
                meta.id = self.id_counter;
                meta.in_memory = true;
                log::debug!("Executed '{}' (#{})", meta.name, meta.id);
                let event = HistoryEvent::Executed {
                    id: meta.id,
                    name: meta.name.clone(),
                };
                self.undos.push(cmd);
                event
            }
        };

        self.last_execute = Some(now);
        self.redos.clear();
        self.dirty = true;
        state.signals.history_changed.dispatch(&event);
    }

    /// Undo the most recent command. Returns false if there was none.
    pub fn undo(&mut self, state: &mut EditorState) -> bool {
        if !self.enabled {
            log::warn!("{}", HistoryError::InvalidStateTransition("undo while history is disabled"));
            return false;
        }
        let Some(mut cmd) = self.undos.pop() else {
            log::warn!("{}", HistoryError::InvalidStateTransition("undo with an empty undo stack"));
            return false;
        };

        self.resolve(cmd.as_mut(), state);
        apply(cmd.as_mut(), state, Direction::Backward);
        let event = HistoryEvent::Undone {
            id: cmd.id(),
            name: cmd.name().to_string(),
        };
        self.redos.push(cmd);
        self.last_execute = None;
        self.dirty = true;
        state.signals.history_changed.dispatch(&event);
        true
    }

    /// Redo the most recently undone command. Returns false if there was none.
    pub fn redo(&mut self, state: &mut EditorState) -> bool {
        if !self.enabled {
            log::warn!("{}", HistoryError::InvalidStateTransition("redo while history is disabled"));
            return false;
        }
        let Some(mut cmd) = self.redos.pop() else {
            log::warn!("{}", HistoryError::InvalidStateTransition("redo with an empty redo stack"));
            return false;
        };

        self.resolve(cmd.as_mut(), state);
        apply(cmd.as_mut(), state, Direction::Forward);
        let event = HistoryEvent::Redone {
            id: cmd.id(),
            name: cmd.name().to_string(),
        };
        self.undos.push(cmd);
        self.last_execute = None;
        self.dirty = true;
        state.signals.history_changed.dispatch(&event);
        true
    }

    /// Undo or redo until the entry with `id` is the most recent applied
    /// command. `0` undoes everything.
    ///
    /// Scene-graph and history notifications are held back and sent once
    /// at the end.
    pub fn go_to_state(&mut self, state: &mut EditorState, id: i64) -> bool {
        if !self.enabled {
            return false;
        }
        let known = id == 0 || self.undos.iter().chain(self.redos.iter()).any(|c| c.id() == id);
        if !known {
            log::warn!("No history entry with id {}", id);
            return false;
        }

        let graph_active = state.signals.scene_graph_changed.is_active();
        let history_active = state.signals.history_changed.is_active();
        state.signals.scene_graph_changed.set_active(false);
        state.signals.history_changed.set_active(false);

        while self.undos.last().map_or(false, |c| c.id() > id) {
            self.undo(state);
        }
        while self.redos.last().map_or(false, |c| c.id() <= id) {
            self.redo(state);
        }

        state.signals.scene_graph_changed.set_active(graph_active);
        state.signals.history_changed.set_active(history_active);
        state.signals.scene_graph_changed.dispatch(&());
        state.signals.history_changed.dispatch(&HistoryEvent::Moved { id });
        true
    }

    /// Drop both stacks and reset the id counter.
    pub fn clear(&mut self, state: &mut EditorState) {
        self.reset();
        state.signals.history_changed.dispatch(&HistoryEvent::Cleared);
    }

    fn reset(&mut self) {
        self.undos.clear();
        self.redos.clear();
        self.id_counter = 0;
        self.last_execute = None;
        self.dirty = false;
        self.registry = None;
    }

    /// Restore a deferred command against the current scene.
    fn resolve(&self, cmd: &mut dyn Command, state: &EditorState) {
        if cmd.meta().in_memory {
            return;
        }
        match &self.registry {
            Some(registry) => resolve_pending(cmd, &RestoreContext::new(state, registry)),
            None => {
                let registry = CommandRegistry::with_defaults();
                resolve_pending(cmd, &RestoreContext::new(state, &registry));
            }
        }
    }

    fn within_window(&self, now: Instant) -> bool {
        match (self.last_execute, self.merge_window) {
            (_, None) => true,
            (Some(last), Some(window)) => now.duration_since(last) < window,
            (None, Some(_)) => false,
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize the undo stack. Commands that fail to serialize are logged
    /// and left out.
    pub fn to_json(&self, state: &EditorState) -> HistoryJson {
        let undos = self
            .undos
            .iter()
            .filter_map(|cmd| match record_of(cmd.as_ref(), state) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Dropping '{}' (#{}) from saved history: {}", cmd.name(), cmd.id(), e);
                    None
                }
            })
            .collect();
        HistoryJson { undos }
    }

    /// Replace the stacks with a saved undo stack. Commands are restored,
    /// not re-executed: `state` must already hold the saved scene.
    ///
    /// Unknown and malformed records are skipped. Records whose objects
    /// are not in the scene yet keep their record and are resolved on first
    /// undo or redo, once earlier entries may have put the object back.
    /// Both cases are reported, not raised.
    pub fn from_json(
        &mut self,
        json: &serde_json::Value,
        state: &mut EditorState,
        registry: &CommandRegistry,
    ) -> Result<LoadReport, HistoryError> {
        let records = json
            .get("undos")
            .and_then(serde_json::Value::as_array)
            .ok_or(HistoryError::Malformed("expected an 'undos' array".to_string()))?;

        self.reset();
        self.registry = Some(registry.clone());
        let mut report = LoadReport::default();
        let ctx = RestoreContext::new(state, registry);

        for (index, raw) in records.iter().enumerate() {
            let record: CommandRecord = match serde_json::from_value(raw.clone()) {
                Ok(record) => record,
                Err(e) => {
                    report.diagnostics.push(HistoryError::Malformed(format!("#{}: {}", index, e)));
                    continue;
                }
            };
            let Some(mut cmd) = registry.create(&record.kind) else {
                report.diagnostics.push(HistoryError::SerializationMismatch(record.kind.clone()));
                continue;
            };

            match cmd.from_json(&record, &ctx) {
                Ok(()) => {}
                Err(CommandError::ReferenceResolution { uuid }) => {
                    cmd.meta_mut().defer(record);
                    report.diagnostics.push(HistoryError::ReferenceResolution { index, uuid });
                }
                Err(e) => {
                    report.diagnostics.push(HistoryError::Malformed(format!("#{}: {}", index, e)));
                    continue;
                }
            }

            self.id_counter = self.id_counter.max(cmd.id());
            self.undos.push(cmd);
        }

        for diagnostic in &report.diagnostics {
            log::warn!("History restore: {}", diagnostic);
        }
        report.restored = self.undos.len();
        log::info!(
            "Restored {} history entries ({} diagnostics)",
            report.restored,
            report.diagnostics.len()
        );

        state.signals.history_changed.dispatch(&HistoryEvent::Restored {
            count: report.restored,
        });
        Ok(report)
    }
}

/// Merge only into the entry recorded just before, with nothing undone,
/// redone or restored in between.
fn should_merge(last: &dyn Command, cmd: &dyn Command, in_run: bool, in_window: bool) -> bool {
    if !in_run || last.is_inert() || last.meta().is_pending() || last.kind() != cmd.kind() {
        return false;
    }
    match (last.merge_target(), cmd.merge_target()) {
        (Some(a), Some(b)) if a == b => in_window || cmd.ignores_merge_window(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::commands::{
        AddObjectCommand, RemoveObjectCommand, SetPositionCommand, SetScriptValueCommand,
        SetValueCommand,
    };
    use crate::core::Script;
    use void_scene::{Geometry, Material, Object3D};

    fn state() -> EditorState {
        let mut state = EditorState::new();
        state.add_object(Object3D::group("Cube").with_uuid("cube"), None, None).unwrap();
        state
    }

    fn position(state: &EditorState) -> [f64; 3] {
        state.object_by_uuid("cube").unwrap().position
    }

    fn name(state: &EditorState) -> &str {
        &state.object_by_uuid("cube").unwrap().name
    }

    fn move_to(history: &mut History, state: &mut EditorState, x: f64) {
        let cmd = SetPositionCommand::new(state, "cube", [x, 0.0, 0.0]).unwrap();
        history.execute(state, Box::new(cmd), None);
    }

    fn rename(history: &mut History, state: &mut EditorState, to: &str) {
        let cmd = SetValueCommand::new(state, "cube", "name", to).unwrap();
        history.execute(state, Box::new(cmd), None);
    }

    fn count_graph_changes(state: &mut EditorState) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        state.signals.scene_graph_changed.add(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_execute_undo_redo() {
        let mut state = state();
        let mut history = History::new();

        rename(&mut history, &mut state, "Crate");
        assert_eq!(name(&state), "Crate");
        assert_eq!(history.undo_description(), Some("Set Value: name"));
        assert_eq!(history.undos().next().unwrap().id(), 1);
        assert!(history.is_dirty());

        assert!(history.undo(&mut state));
        assert_eq!(name(&state), "Cube");
        assert!(history.can_redo());

        assert!(history.redo(&mut state));
        assert_eq!(name(&state), "Crate");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_on_empty_stack() {
        let mut state = state();
        let mut history = History::new();
        assert!(!history.undo(&mut state));
        assert!(!history.redo(&mut state));
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut state = state();
        let mut history = History::new();

        rename(&mut history, &mut state, "A");
        move_to(&mut history, &mut state, 1.0);
        history.undo(&mut state);
        assert_eq!(history.redo_count(), 1);

        rename(&mut history, &mut state, "B");
        assert_eq!(history.redo_count(), 0);
        assert_eq!(history.undo_count(), 2);
    }

    #[test]
    fn test_consecutive_edits_coalesce() {
        let mut state = state();
        let mut history = History::new();

        move_to(&mut history, &mut state, 1.0);
        move_to(&mut history, &mut state, 2.0);
        move_to(&mut history, &mut state, 3.0);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(position(&state), [3.0, 0.0, 0.0]);

        history.undo(&mut state);
        assert_eq!(position(&state), [0.0, 0.0, 0.0]);
        history.redo(&mut state);
        assert_eq!(position(&state), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_different_attribute_breaks_run() {
        let mut state = state();
        let mut history = History::new();

        move_to(&mut history, &mut state, 1.0);
        rename(&mut history, &mut state, "Moved");
        move_to(&mut history, &mut state, 2.0);
        assert_eq!(history.undo_count(), 3);
    }

    #[test]
    fn test_undo_redo_breaks_run() {
        let mut state = state();
        let mut history = History::new();

        rename(&mut history, &mut state, "A");
        move_to(&mut history, &mut state, 1.0);
        history.undo(&mut state);
        history.redo(&mut state);
        move_to(&mut history, &mut state, 2.0);
        assert_eq!(history.undo_count(), 3);

        history.undo(&mut state);
        assert_eq!(position(&state), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_merge_window() {
        let mut state = state();
        state.scripts.insert("cube".into(), vec![Script::new("spin", "")]);
        let mut history = History::with_merge_window(Some(Duration::ZERO));

        move_to(&mut history, &mut state, 1.0);
        move_to(&mut history, &mut state, 2.0);
        assert_eq!(history.undo_count(), 2);

        for source in ["a", "ab", "abc"] {
            let cmd = SetScriptValueCommand::new(&state, "cube", 0, "source", source).unwrap();
            history.execute(&mut state, Box::new(cmd), None);
        }
        assert_eq!(history.undo_count(), 3);
        assert_eq!(state.scripts_for("cube")[0].source, "abc");

        history.undo(&mut state);
        assert_eq!(state.scripts_for("cube")[0].source, "");
    }

    #[test]
    fn test_failed_execute_is_not_recorded() {
        let mut state = state();
        let mut history = History::new();

        let cmd = SetValueCommand::new(&state, "cube", "name", "Gone").unwrap();
        state.remove_object("cube");
        history.execute(&mut state, Box::new(cmd), None);
        assert_eq!(history.undo_count(), 0);

        state.add_object(Object3D::group("Cube").with_uuid("cube"), None, None).unwrap();
        rename(&mut history, &mut state, "Back");
        assert_eq!(history.undos().next().unwrap().id(), 1);
    }

    #[test]
    fn test_optional_name() {
        let mut state = state();
        let mut history = History::new();

        let cmd = SetValueCommand::new(&state, "cube", "name", "Hero").unwrap();
        history.execute(&mut state, Box::new(cmd), Some("Rename Hero"));
        assert_eq!(history.undo_description(), Some("Rename Hero"));
    }

    #[test]
    fn test_disabled_history_applies_without_recording() {
        let mut state = state();
        let mut history = History::new();
        history.set_enabled(false);

        rename(&mut history, &mut state, "Imported");
        assert_eq!(name(&state), "Imported");
        assert_eq!(history.undo_count(), 0);
        assert!(!history.undo(&mut state));

        history.set_enabled(true);
        rename(&mut history, &mut state, "Edited");
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn test_go_to_state() {
        let mut state = state();
        let mut history = History::new();
        rename(&mut history, &mut state, "One");
        move_to(&mut history, &mut state, 2.0);
        rename(&mut history, &mut state, "Three");

        let changes = count_graph_changes(&mut state);

        assert!(history.go_to_state(&mut state, 1));
        assert_eq!(name(&state), "One");
        assert_eq!(position(&state), [0.0, 0.0, 0.0]);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(changes.load(Ordering::SeqCst), 1);

        assert!(history.go_to_state(&mut state, 3));
        assert_eq!(name(&state), "Three");
        assert_eq!(history.redo_count(), 0);
        assert_eq!(changes.load(Ordering::SeqCst), 2);

        assert!(history.go_to_state(&mut state, 0));
        assert_eq!(name(&state), "Cube");
        assert_eq!(history.redo_count(), 3);

        assert!(!history.go_to_state(&mut state, 42));
        assert!(state.signals.scene_graph_changed.is_active());
        assert!(state.signals.history_changed.is_active());
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut state = state();
        let mut history = History::new();
        rename(&mut history, &mut state, "A");
        history.undo(&mut state);

        history.clear(&mut state);
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        rename(&mut history, &mut state, "B");
        assert_eq!(history.undos().next().unwrap().id(), 1);
    }

    #[test]
    fn test_json_round_trip_continues_ids() {
        let mut state = state();
        let mut history = History::new();
        rename(&mut history, &mut state, "A");
        move_to(&mut history, &mut state, 5.0);
        history.undo(&mut state);
        history.redo(&mut state);

        let json = serde_json::to_value(history.to_json(&state)).unwrap();
        assert_eq!(json["undos"].as_array().unwrap().len(), 2);

        let registry = CommandRegistry::with_defaults();
        let mut restored = History::new();
        let report = restored.from_json(&json, &mut state, &registry).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.restored, 2);
        assert!(!restored.can_redo());

        restored.undo(&mut state);
        assert_eq!(position(&state), [0.0, 0.0, 0.0]);
        restored.redo(&mut state);

        rename(&mut restored, &mut state, "B");
        assert_eq!(restored.undos().last().unwrap().id(), 3);
    }

    #[test]
    fn test_restore_tolerates_bad_records() {
        let mut state = state();
        let json = serde_json::json!({
            "undos": [
                { "type": "TeleportCommand", "id": 1, "name": "Teleport" },
                {
                    "type": "SetValueCommand", "id": 2, "name": "Set Value: name",
                    "objectUuid": "ghost", "attributeName": "name",
                    "oldValue": "a", "newValue": "b"
                },
                { "type": "SetValueCommand", "id": 3, "name": "Set Value: name" }
            ]
        });

        let registry = CommandRegistry::with_defaults();
        let mut history = History::new();
        let report = history.from_json(&json, &mut state, &registry).unwrap();

        assert_eq!(report.restored, 1);
        assert_eq!(report.diagnostics.len(), 3);
        assert_eq!(
            report.diagnostics[0],
            HistoryError::SerializationMismatch("TeleportCommand".into())
        );
        assert!(matches!(
            &report.diagnostics[1],
            HistoryError::ReferenceResolution { index: 1, uuid } if uuid == "ghost"
        ));

        let ghost = history.undos().next().unwrap();
        assert!(!ghost.is_inert());
        assert!(!ghost.meta().in_memory);

        assert!(history.undo(&mut state));
        assert_eq!(name(&state), "Cube");
        assert!(history.redos().next().unwrap().is_inert());

        // Still saved as loaded.
        history.redo(&mut state);
        let json = serde_json::to_value(history.to_json(&state)).unwrap();
        assert_eq!(json["undos"][0]["objectUuid"], "ghost");
    }

    #[test]
    fn test_restored_edit_resolves_after_earlier_undo() {
        let mut state = EditorState::new();
        let mut history = History::new();
        let cube = Object3D::mesh("Cube", Geometry::cube(1.0), Material::standard()).with_uuid("cube");
        history.execute(&mut state, Box::new(AddObjectCommand::new(cube)), None);
        rename(&mut history, &mut state, "Crate");
        let cmd = RemoveObjectCommand::new(&state, "cube").unwrap();
        history.execute(&mut state, Box::new(cmd), None);

        let json = serde_json::to_value(history.to_json(&state)).unwrap();
        let registry = CommandRegistry::with_defaults();
        let mut fresh = EditorState::new();
        let mut restored = History::new();
        let report = restored.from_json(&json, &mut fresh, &registry).unwrap();
        assert_eq!(report.restored, 3);
        assert!(matches!(
            &report.diagnostics[..],
            [HistoryError::ReferenceResolution { index: 1, uuid }] if uuid == "cube"
        ));

        restored.undo(&mut fresh);
        assert_eq!(name(&fresh), "Crate");
        restored.undo(&mut fresh);
        assert_eq!(name(&fresh), "Cube");
        assert!(!restored.redos().last().unwrap().is_inert());

        restored.redo(&mut fresh);
        assert_eq!(name(&fresh), "Crate");
    }

    #[test]
    fn test_restored_rename_of_missing_object_is_a_no_op() {
        let mut state = state();
        let json = serde_json::json!({
            "undos": [
                { "type": "SetUuidCommand", "id": 1, "name": "Set UUID", "oldUuid": "ghost", "newUuid": "ghost-2" }
            ]
        });
        let registry = CommandRegistry::with_defaults();
        let mut history = History::new();
        let report = history.from_json(&json, &mut state, &registry).unwrap();
        assert_eq!(report.restored, 1);

        let before = state.scene.descendant_uuids();
        assert!(history.undo(&mut state));
        assert!(history.redo(&mut state));
        assert!(history.undos().next().unwrap().is_inert());
        assert_eq!(state.scene.descendant_uuids(), before);
        assert_eq!(name(&state), "Cube");
    }

    #[test]
    fn test_restore_requires_undo_array() {
        let mut state = state();
        let registry = CommandRegistry::with_defaults();
        let mut history = History::new();
        let result = history.from_json(&serde_json::json!({ "redos": [] }), &mut state, &registry);
        assert!(matches!(result, Err(HistoryError::Malformed(_))));
    }
}
