//! Error types for the scene graph

use thiserror::Error;

/// Scene graph errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// No object with this uuid in the tree
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Attribute name not known on the target
    #[error("Unknown attribute '{attribute}' on {target}")]
    UnknownAttribute { target: &'static str, attribute: String },

    /// Value has the wrong shape for the attribute
    #[error("Attribute '{attribute}' expects {expected}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },

    /// Object JSON references a resource that is not in its tables
    #[error("Missing {kind} '{uuid}' referenced by object JSON")]
    MissingResource { kind: &'static str, uuid: String },

    /// Object JSON could not be decoded
    #[error("Malformed object JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
