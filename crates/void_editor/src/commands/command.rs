//! Command trait, serialized records and result types.

use std::any::Any;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use void_scene::{ObjectLoader, Object3D, SceneError};

use super::registry::CommandRegistry;
use crate::core::EditorState;

/// Result type for command execution.
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur while applying or restoring a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No object with this uuid in the scene
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// A restored record names an object that exists neither in the scene
    /// nor in the record's embedded snapshot
    #[error("Unresolved reference to object {uuid}")]
    ReferenceResolution { uuid: String },

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Record payload does not match the command type
    #[error("Malformed command record: {0}")]
    MalformedRecord(String),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Command JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bookkeeping shared by every command.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandMeta {
    /// Position in the history; -1 until recorded
    pub id: i64,
    /// Label for the undo/redo menu
    pub name: String,
    /// Whether the command's references have been resolved against the
    /// scene. False while `pending` waits for the first undo or redo.
    pub in_memory: bool,
    /// Reference could not be resolved: execute and undo do nothing
    pub inert: bool,
    /// Record to restore from once the scene holds its object. Kept on
    /// inert commands so they save back unchanged.
    pub pending: Option<CommandRecord>,
}

impl Default for CommandMeta {
    fn default() -> Self {
        Self {
            id: -1,
            name: String::new(),
            in_memory: false,
            inert: false,
            pending: None,
        }
    }
}

impl CommandMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            in_memory: true,
            ..Self::default()
        }
    }

    /// Copy the common record fields back.
    pub fn restore(&mut self, record: &CommandRecord) {
        self.id = record.id;
        self.name = record.name.clone();
        self.in_memory = true;
    }

    /// Hold a record whose object is not in the scene yet, to be restored
    /// when the command is next applied.
    pub fn defer(&mut self, record: CommandRecord) {
        self.id = record.id;
        self.name = record.name.clone();
        self.in_memory = false;
        self.inert = false;
        self.pending = Some(record);
    }

    /// Waiting for its first undo or redo to be resolved.
    pub fn is_pending(&self) -> bool {
        !self.in_memory && self.pending.is_some()
    }
}

/// Identity of an attribute edit, used to coalesce consecutive edits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MergeTarget {
    /// Object (or script owner) uuid
    pub object: String,
    /// Attribute name, map slot or script index
    pub attribute: String,
}

impl MergeTarget {
    pub fn new(object: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            attribute: attribute.into(),
        }
    }
}

/// A command that can be executed, undone, redone and persisted.
///
/// Commands capture whatever they need to invert themselves when they are
/// constructed, so `execute` and `undo` can be replayed any number of times
/// in alternation.
pub trait Command: Send + Sync {
    /// Type tag written into the record's `type` field.
    fn kind(&self) -> &'static str;

    fn meta(&self) -> &CommandMeta;

    fn meta_mut(&mut self) -> &mut CommandMeta;

    /// Apply the change.
    fn execute(&mut self, state: &mut EditorState) -> CommandResult;

    /// Revert the change.
    fn undo(&mut self, state: &mut EditorState) -> CommandResult;

    /// Attribute this command edits, if consecutive edits of it may be
    /// folded into one history entry.
    fn merge_target(&self) -> Option<MergeTarget> {
        None
    }

    /// Whether merges apply regardless of the configured time window.
    fn ignores_merge_window(&self) -> bool {
        false
    }

    /// Absorb the new value of a newer command with the same merge target.
    fn update(&mut self, _newer: &dyn Command) {}

    /// Serialize into a record.
    fn to_json(&self, state: &EditorState) -> Result<CommandRecord, CommandError>;

    /// Restore from a record.
    ///
    /// On `ReferenceResolution` the command must already be marked inert.
    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult;

    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn id(&self) -> i64 {
        self.meta().id
    }

    fn is_inert(&self) -> bool {
        self.meta().inert
    }
}

/// A command type the registry can construct from its type tag.
pub trait CommandType: Command + Default + 'static {
    const TYPE: &'static str;
}

/// Which way to apply a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Apply a command, skipping inert and unresolved ones and logging failures.
///
/// Returns whether the command applied cleanly.
pub(crate) fn apply(command: &mut dyn Command, state: &mut EditorState, direction: Direction) -> bool {
    if command.is_inert() {
        log::debug!("Skipping inert command '{}' ({})", command.name(), command.id());
        return true;
    }
    if command.meta().is_pending() {
        log::warn!("Skipping unresolved command '{}' ({})", command.name(), command.id());
        return false;
    }

    let result = match direction {
        Direction::Forward => command.execute(state),
        Direction::Backward => command.undo(state),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!(
                "{} of '{}' ({}) failed: {}",
                match direction {
                    Direction::Forward => "Execute",
                    Direction::Backward => "Undo",
                },
                command.name(),
                command.id(),
                e
            );
            false
        }
    }
}

/// The persisted form of a command: common fields plus a type-specific
/// payload flattened alongside them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl CommandRecord {
    pub fn new<P: Serialize>(command: &dyn Command, payload: &P) -> Result<Self, CommandError> {
        let fields = match serde_json::to_value(payload)? {
            serde_json::Value::Object(fields) => fields,
            other => {
                return Err(CommandError::MalformedRecord(format!(
                    "{} payload must be an object, got {}",
                    command.kind(),
                    other
                )))
            }
        };

        Ok(Self {
            kind: command.kind().to_string(),
            id: command.id(),
            name: command.name().to_string(),
            fields,
        })
    }

    /// Decode the type-specific payload.
    pub fn payload<P: DeserializeOwned>(&self) -> Result<P, CommandError> {
        serde_json::from_value(serde_json::Value::Object(self.fields.clone()))
            .map_err(|e| CommandError::MalformedRecord(format!("{}: {}", self.kind, e)))
    }

    /// Decode one named payload field.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<T, CommandError> {
        let value = self.fields.get(key).ok_or_else(|| {
            CommandError::MalformedRecord(format!("{}: missing field '{}'", self.kind, key))
        })?;
        serde_json::from_value(value.clone())
            .map_err(|e| CommandError::MalformedRecord(format!("{}.{}: {}", self.kind, key, e)))
    }
}

/// What a command may consult while restoring from a record.
pub struct RestoreContext<'a> {
    pub state: &'a EditorState,
    pub registry: &'a CommandRegistry,
    pub loader: ObjectLoader,
}

impl<'a> RestoreContext<'a> {
    pub fn new(state: &'a EditorState, registry: &'a CommandRegistry) -> Self {
        Self {
            state,
            registry,
            loader: ObjectLoader::new(),
        }
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.state.object_by_uuid(uuid).is_some()
    }

    /// Check that `uuid` names a live object.
    pub fn resolve(&self, uuid: &str) -> CommandResult {
        if self.contains(uuid) {
            Ok(())
        } else {
            Err(CommandError::ReferenceResolution {
                uuid: uuid.to_string(),
            })
        }
    }

    /// Parse an embedded object snapshot, if there is one.
    pub fn parse_snapshot(
        &self,
        snapshot: Option<&void_scene::ObjectJson>,
    ) -> Result<Option<Object3D>, CommandError> {
        snapshot
            .map(|json| self.loader.parse_document(json))
            .transpose()
            .map_err(CommandError::from)
    }
}

/// Restore a deferred record against the scene as it is now.
///
/// A command whose object is still missing becomes inert.
pub(crate) fn resolve_pending(command: &mut dyn Command, ctx: &RestoreContext<'_>) {
    if command.meta().in_memory {
        return;
    }
    let Some(record) = command.meta_mut().pending.take() else {
        return;
    };

    match command.from_json(&record, ctx) {
        Ok(()) => {
            log::debug!("Resolved '{}' ({}) against the live scene", record.name, record.id);
        }
        Err(e) => {
            log::warn!("'{}' ({}) restored inert: {}", record.name, record.id, e);
            let meta = command.meta_mut();
            meta.inert = true;
            meta.in_memory = true;
            meta.pending = Some(record);
        }
    }
}

/// Serialize a command, passing a still-deferred record through unchanged.
pub(crate) fn record_of(command: &dyn Command, state: &EditorState) -> Result<CommandRecord, CommandError> {
    match &command.meta().pending {
        Some(record) => Ok(record.clone()),
        None => command.to_json(state),
    }
}

/// Mark a command inert and report the reference it could not resolve.
pub(crate) fn unresolved(meta: &mut CommandMeta, uuid: &str) -> CommandError {
    meta.inert = true;
    CommandError::ReferenceResolution {
        uuid: uuid.to_string(),
    }
}

/// Restore common fields and require the object to be live.
pub(crate) fn restore_target(
    meta: &mut CommandMeta,
    record: &CommandRecord,
    ctx: &RestoreContext<'_>,
    uuid: &str,
) -> CommandResult {
    meta.restore(record);
    if ctx.contains(uuid) {
        Ok(())
    } else {
        Err(unresolved(meta, uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Nudge {
        meta: CommandMeta,
    }

    impl Command for Nudge {
        fn kind(&self) -> &'static str {
            "Nudge"
        }

        fn meta(&self) -> &CommandMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut CommandMeta {
            &mut self.meta
        }

        fn execute(&mut self, _state: &mut EditorState) -> CommandResult {
            Err(CommandError::InvalidOperation("nudge".into()))
        }

        fn undo(&mut self, _state: &mut EditorState) -> CommandResult {
            Ok(())
        }

        fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
            CommandRecord::new(self, &serde_json::json!({ "objectUuid": "x" }))
        }

        fn from_json(&mut self, record: &CommandRecord, _ctx: &RestoreContext<'_>) -> CommandResult {
            self.meta.restore(record);
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_record_flattens_payload() {
        let mut nudge = Nudge::default();
        nudge.meta = CommandMeta::new("Nudge It");
        nudge.meta.id = 7;

        let record = nudge.to_json(&EditorState::new()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Nudge");
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Nudge It");
        assert_eq!(json["objectUuid"], "x");

        let back: CommandRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_payload_mismatch_is_malformed() {
        #[derive(Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            missing: String,
        }

        let record = CommandRecord {
            kind: "Nudge".into(),
            id: 1,
            name: "Nudge".into(),
            fields: serde_json::Map::new(),
        };
        assert!(matches!(
            record.payload::<Needs>(),
            Err(CommandError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_apply_skips_inert() {
        let mut state = EditorState::new();
        let mut nudge = Nudge::default();
        assert!(!apply(&mut nudge, &mut state, Direction::Forward));

        nudge.meta.inert = true;
        assert!(apply(&mut nudge, &mut state, Direction::Forward));
    }

    #[test]
    fn test_deferred_record_resolves_once() {
        let state = EditorState::new();
        let registry = CommandRegistry::with_defaults();
        let mut nudge = Nudge::default();
        let record = CommandRecord {
            kind: "Nudge".into(),
            id: 3,
            name: "Nudge".into(),
            fields: serde_json::Map::new(),
        };

        nudge.meta.defer(record.clone());
        assert!(nudge.meta.is_pending());
        assert_eq!(nudge.id(), 3);
        assert_eq!(record_of(&nudge, &state).unwrap(), record);

        resolve_pending(&mut nudge, &RestoreContext::new(&state, &registry));
        assert!(!nudge.meta.is_pending());
        assert!(nudge.meta.in_memory);
        assert!(!nudge.is_inert());
        assert_eq!(record_of(&nudge, &state).unwrap().fields["objectUuid"], "x");
    }
}
