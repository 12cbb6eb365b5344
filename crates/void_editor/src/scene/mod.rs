//! Project serialization.
//!
//! Handles saving and loading editor projects: scene, scripts and
//! optionally the undo history, as one JSON document.

mod project;

pub use project::{
    ProjectData, ProjectError, ProjectMetadata, ProjectSerializer, ProjectSettings, PROJECT_VERSION,
};
