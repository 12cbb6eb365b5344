//! Editor configuration.
//!
//! Persistent settings that survive editor restarts, stored as TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration load/save errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// History settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Write the undo stack into saved projects
    pub persistent: bool,
    /// Only coalesce edits that arrive within this many milliseconds of the
    /// previous one. Unset means any consecutive edit of the same attribute
    /// coalesces.
    pub merge_window_ms: Option<u64>,
}

impl HistoryConfig {
    pub fn merge_window(&self) -> Option<Duration> {
        self.merge_window_ms.map(Duration::from_millis)
    }
}

/// Project settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub title: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
        }
    }
}

/// Editor configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub project: ProjectConfig,
    pub history: HistoryConfig,
}

impl EditorConfig {
    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Load from the default path, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring editor config at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        log::info!("Saved editor config to {:?}", path);
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("void_editor");
            p.push("config.toml");
            p
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert!(!config.history.persistent);
        assert_eq!(config.history.merge_window(), None);
        assert_eq!(config.project.title, "Untitled");
    }

    #[test]
    fn test_partial_toml() {
        let config = EditorConfig::from_toml_str(
            r#"
            [history]
            persistent = true
            merge_window_ms = 500
            "#,
        )
        .unwrap();
        assert!(config.history.persistent);
        assert_eq!(config.history.merge_window(), Some(Duration::from_millis(500)));
        assert_eq!(config.project.title, "Untitled");
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            EditorConfig::from_toml_str("[history]\npersistent = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EditorConfig::default();
        config.project.title = "Dungeon".into();
        config.history.persistent = true;
        config.save(&path).unwrap();

        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}
