//! Core editor types and state management.
//!
//! This module contains the central `EditorState`, the undo `History` and
//! the `Editor` session that ties them to a command registry and config.

pub mod editor_state;
mod config;
mod editor;
mod history;

pub use config::{ConfigError, EditorConfig, HistoryConfig, ProjectConfig};
pub use editor::Editor;
pub use editor_state::{EditorState, Helper, HelperKind, Script, ScriptMap};
pub use history::{History, HistoryError, HistoryJson, LoadReport};
