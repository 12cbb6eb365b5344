//! Project serialization to/from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use void_scene::{ObjectJson, ObjectKind, ObjectLoader, SceneError};

use crate::core::{Editor, HistoryError, LoadReport, ScriptMap};

/// Project format version written into `metadata.version`.
pub const PROJECT_VERSION: f64 = 4.6;

/// Project save/load errors. Any of these aborts the whole load.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Project history error: {0}")]
    History(#[from] HistoryError),

    #[error("Invalid project structure: {0}")]
    Structure(String),
}

/// Project file header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub version: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub generator: String,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            version: PROJECT_VERSION,
            kind: "Project".to_string(),
            generator: format!("{} {}", crate::NAME, crate::VERSION),
        }
    }
}

/// Project-wide settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub title: String,
}

/// Project file data structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub project: ProjectSettings,
    pub scene: ObjectJson,
    #[serde(default)]
    pub scripts: ScriptMap,
    /// Undo stack, present only when history persistence is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<serde_json::Value>,
}

/// Project serializer for save/load operations.
pub struct ProjectSerializer;

impl ProjectSerializer {
    /// Save an editor session to a JSON project file.
    pub fn save(editor: &Editor, path: &Path) -> Result<(), ProjectError> {
        let data = Self::to_project_data(editor)?;
        let json = serde_json::to_string_pretty(&data)?;
        std::fs::write(path, json)?;
        log::info!("Saved project '{}' to {:?}", data.project.title, path);
        Ok(())
    }

    /// Load a JSON project file into an editor session.
    pub fn load(editor: &mut Editor, path: &Path) -> Result<LoadReport, ProjectError> {
        let content = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&content)?;
        let report = Self::apply_json(editor, &json)?;
        log::info!("Loaded project from {:?}", path);
        Ok(report)
    }

    /// Snapshot an editor session.
    pub fn to_project_data(editor: &Editor) -> Result<ProjectData, ProjectError> {
        let history = if editor.config.history.persistent {
            Some(serde_json::to_value(editor.history.to_json(&editor.state))?)
        } else {
            None
        };

        Ok(ProjectData {
            metadata: ProjectMetadata::default(),
            project: ProjectSettings {
                title: editor.config.project.title.clone(),
            },
            scene: editor.state.scene.to_json(),
            scripts: editor.state.scripts.clone(),
            history,
        })
    }

    /// Restore an editor session from a project document.
    ///
    /// The scene goes in first, then scripts, then the history, whose
    /// commands are restored against the loaded scene without being
    /// re-executed. Nothing is changed if the document is structurally
    /// invalid.
    pub fn apply_json(editor: &mut Editor, json: &serde_json::Value) -> Result<LoadReport, ProjectError> {
        let data: ProjectData = serde_json::from_value(json.clone())?;
        if data.metadata.kind != "Project" {
            return Err(ProjectError::Structure(format!(
                "expected a Project document, got '{}'",
                data.metadata.kind
            )));
        }

        let scene = ObjectLoader::new().parse_document(&data.scene)?;
        if scene.kind != ObjectKind::Scene {
            return Err(ProjectError::Structure(format!(
                "scene root is a {}, not a Scene",
                scene.kind.name()
            )));
        }

        if let Some(history) = &data.history {
            if !history.get("undos").map_or(false, serde_json::Value::is_array) {
                return Err(HistoryError::Malformed("expected an 'undos' array".to_string()).into());
            }
        }

        editor.history.clear(&mut editor.state);
        editor.state.scripts = data.scripts;
        editor.state.set_scene(scene);
        if !data.project.title.is_empty() {
            editor.config.project.title = data.project.title;
        }

        let report = match &data.history {
            Some(history) => {
                editor
                    .history
                    .from_json(history, &mut editor.state, &editor.registry)?
            }
            None => LoadReport::default(),
        };
        editor.history.mark_saved();
        Ok(report)
    }
}
