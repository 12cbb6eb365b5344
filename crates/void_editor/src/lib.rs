//! Void Editor command core
//!
//! Undoable, serializable editing of a Void scene.
//!
//! ## Features
//!
//! - **Commands**: Every scene edit is a command that can execute and undo itself
//! - **History**: Undo/redo stacks with coalescing of repeated attribute edits
//! - **Batches**: Several commands recorded and undone as one entry
//! - **Persistence**: The undo stack is saved with the project and restored on load
//! - **Signals**: Change notifications for panels and viewports
//!
//! ## Architecture
//!
//! ```text
//! Caller → Command → History → EditorState → Signals
//! ```
//!
//! All modifications go through the history so they can be undone.

pub mod commands;
pub mod core;
pub mod scene;
pub mod signals;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, Editor, EditorConfig, EditorState, History, HistoryError, HistoryJson, LoadReport,
    Script,
};

pub use crate::commands::{Command, CommandError, CommandRecord, CommandRegistry, CommandResult};

pub use crate::scene::{ProjectData, ProjectError, ProjectSerializer};

pub use crate::signals::{EditorSignals, HistoryEvent};

/// Editor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Editor name
pub const NAME: &str = "Void Editor";

pub mod prelude {
    pub use crate::commands::*;
    pub use crate::core::{Editor, EditorState, History, Script};
    pub use crate::signals::{EditorSignals, HistoryEvent, ScriptEvent};
    pub use void_scene::{Color, Geometry, Material, Object3D, ObjectKind, Texture, Value};
}
