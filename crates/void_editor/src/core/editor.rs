//! Editor session.
//!
//! Owns the state, its history, the command registry used to restore saved
//! histories, and the configuration.

use std::path::Path;

use super::{EditorConfig, EditorState, History, LoadReport};
use crate::commands::{Command, CommandRegistry};
use crate::scene::{ProjectData, ProjectError, ProjectSerializer};

/// An editing session.
#[derive(Debug)]
pub struct Editor {
    pub state: EditorState,
    pub history: History,
    pub registry: CommandRegistry,
    pub config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            state: EditorState::new(),
            history: History::with_merge_window(config.history.merge_window()),
            registry: CommandRegistry::with_defaults(),
            config,
        }
    }

    /// Execute a command through the history.
    pub fn execute(&mut self, cmd: Box<dyn Command>) {
        self.history.execute(&mut self.state, cmd, None);
    }

    /// Execute a command, overriding its history label.
    pub fn execute_named(&mut self, cmd: Box<dyn Command>, name: &str) {
        self.history.execute(&mut self.state, cmd, Some(name));
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.state)
    }

    pub fn go_to_state(&mut self, id: i64) -> bool {
        self.history.go_to_state(&mut self.state, id)
    }

    /// Run `f` with history recording suspended, e.g. for bulk imports
    /// that should not be undoable.
    pub fn without_history<R>(&mut self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let was_enabled = self.history.is_enabled();
        self.history.set_enabled(false);
        let result = f(self);
        self.history.set_enabled(was_enabled);
        result
    }

    /// Start over with an empty scene and history.
    pub fn clear(&mut self) {
        self.history.clear(&mut self.state);
        self.state.clear();
    }

    pub fn to_json(&self) -> Result<ProjectData, ProjectError> {
        ProjectSerializer::to_project_data(self)
    }

    pub fn from_json(&mut self, json: &serde_json::Value) -> Result<LoadReport, ProjectError> {
        ProjectSerializer::apply_json(self, json)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), ProjectError> {
        ProjectSerializer::save(self, path)?;
        self.history.mark_saved();
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<LoadReport, ProjectError> {
        ProjectSerializer::load(self, path)
    }
}
