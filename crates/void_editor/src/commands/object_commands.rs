//! Object creation, removal and reparenting commands.
//!
//! These change scene-graph membership. An object that is out of the scene
//! is held by the command that took it out, so undo and redo move the same
//! subtree back and forth.

use serde::{Deserialize, Serialize};
use void_scene::{ObjectJson, Object3D};

use crate::core::{EditorState, ScriptMap};
use crate::signals::ScriptEvent;
use super::{
    unresolved, Command, CommandError, CommandMeta, CommandRecord, CommandResult, CommandType,
    RestoreContext,
};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddPayload {
    object: ObjectJson,
    #[serde(default)]
    parent_uuid: Option<String>,
    #[serde(default)]
    index: Option<usize>,
}

/// Command to add an object (with its subtree) to the scene.
#[derive(Default)]
pub struct AddObjectCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    parent_uuid: Option<String>,
    index: Option<usize>,
    /// The object while it is out of the scene
    object: Option<Object3D>,
    /// The object as it was handed in
    snapshot: Option<ObjectJson>,
}

impl AddObjectCommand {
    /// Add under the scene root.
    pub fn new(object: Object3D) -> Self {
        Self {
            meta: CommandMeta::new(format!("Add Object: {}", object.name)),
            object_uuid: object.uuid.clone(),
            parent_uuid: None,
            index: None,
            snapshot: Some(object.to_json()),
            object: Some(object),
        }
    }

    /// Add under `parent` at `index` (appended when `None`).
    pub fn with_parent(mut self, parent_uuid: &str, index: Option<usize>) -> Self {
        self.parent_uuid = Some(parent_uuid.to_string());
        self.index = index;
        self
    }
}

impl CommandType for AddObjectCommand {
    const TYPE: &'static str = "AddObjectCommand";
}

impl Command for AddObjectCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        let object = self.object.take().ok_or_else(|| {
            CommandError::InvalidOperation(format!("object {} is already in the scene", self.object_uuid))
        })?;

        if let Err(object) = state.add_object(object, self.parent_uuid.as_deref(), self.index) {
            self.object = Some(object);
            return Err(CommandError::ObjectNotFound(
                self.parent_uuid.clone().unwrap_or_default(),
            ));
        }
        state.select(Some(self.object_uuid.as_str()));
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        let detached = state
            .remove_object(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        self.object = Some(detached.object);
        state.deselect();
        Ok(())
    }

    fn to_json(&self, state: &EditorState) -> Result<CommandRecord, CommandError> {
        let object = match &self.snapshot {
            Some(snapshot) => snapshot.clone(),
            None => state
                .object_by_uuid(&self.object_uuid)
                .or(self.object.as_ref())
                .map(Object3D::to_json)
                .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?,
        };

        CommandRecord::new(
            self,
            &AddPayload {
                object,
                parent_uuid: self.parent_uuid.clone(),
                index: self.index,
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: AddPayload = record.payload()?;
        self.meta.restore(record);
        self.object_uuid = payload.object.object.uuid.clone();
        self.parent_uuid = payload.parent_uuid;
        self.index = payload.index;

        self.object = if ctx.contains(&self.object_uuid) {
            None
        } else {
            log::debug!("Object {} not in scene, rebuilding from record", self.object_uuid);
            ctx.parse_snapshot(Some(&payload.object))?
        };
        self.snapshot = Some(payload.object);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemovePayload {
    #[serde(default)]
    object: Option<ObjectJson>,
    object_uuid: String,
    parent_uuid: String,
    index: usize,
}

/// Command to remove an object (with its subtree) from the scene.
#[derive(Default)]
pub struct RemoveObjectCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    parent_uuid: String,
    index: usize,
    /// The object while it is out of the scene
    object: Option<Object3D>,
}

impl RemoveObjectCommand {
    pub fn new(state: &EditorState, object_uuid: &str) -> Result<Self, CommandError> {
        if object_uuid == state.scene_uuid() {
            return Err(CommandError::InvalidOperation("the scene root cannot be removed".into()));
        }
        let name = state
            .object_by_uuid(object_uuid)
            .map(|object| object.name.clone())
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;
        let (parent_uuid, index) = state
            .scene
            .index_in_parent(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;

        Ok(Self {
            meta: CommandMeta::new(format!("Remove Object: {}", name)),
            object_uuid: object_uuid.to_string(),
            parent_uuid,
            index,
            object: None,
        })
    }

    fn payload(&self, state: &EditorState) -> RemovePayload {
        RemovePayload {
            object: self
                .object
                .as_ref()
                .or_else(|| state.object_by_uuid(&self.object_uuid))
                .map(Object3D::to_json),
            object_uuid: self.object_uuid.clone(),
            parent_uuid: self.parent_uuid.clone(),
            index: self.index,
        }
    }

    /// Restore from a payload describing an applied removal.
    fn restore_payload(&mut self, payload: RemovePayload, ctx: &RestoreContext<'_>) -> CommandResult {
        self.object_uuid = payload.object_uuid;
        self.index = payload.index;
        self.parent_uuid = if ctx.contains(&payload.parent_uuid) {
            payload.parent_uuid
        } else {
            log::warn!(
                "Parent {} of removed object {} is gone, restoring under the scene root",
                payload.parent_uuid,
                self.object_uuid
            );
            ctx.state.scene_uuid().to_string()
        };

        if ctx.contains(&self.object_uuid) {
            log::warn!("Removed object {} is back in the scene", self.object_uuid);
            self.object = None;
            return Ok(());
        }
        match ctx.parse_snapshot(payload.object.as_ref())? {
            Some(object) => {
                self.object = Some(object);
                Ok(())
            }
            None => Err(unresolved(&mut self.meta, &self.object_uuid)),
        }
    }
}

impl CommandType for RemoveObjectCommand {
    const TYPE: &'static str = "RemoveObjectCommand";
}

impl Command for RemoveObjectCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        let detached = state
            .remove_object(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        self.parent_uuid = detached.parent;
        self.index = detached.index;
        self.object = Some(detached.object);
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        let object = self.object.take().ok_or_else(|| {
            CommandError::InvalidOperation(format!("object {} is not held for restore", self.object_uuid))
        })?;

        if let Err(object) = state.add_object(object, Some(&self.parent_uuid), Some(self.index)) {
            self.object = Some(object);
            return Err(CommandError::ObjectNotFound(self.parent_uuid.clone()));
        }
        state.select(Some(self.object_uuid.as_str()));
        Ok(())
    }

    fn to_json(&self, state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(self, &self.payload(state))
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: RemovePayload = record.payload()?;
        self.meta.restore(record);
        self.restore_payload(payload, ctx)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameObjectPayload {
    #[serde(flatten)]
    remove: RemovePayload,
    #[serde(default)]
    scripts: ScriptMap,
}

/// Command to remove an object subtree together with every script attached
/// to an object inside it. Undo puts both back.
#[derive(Default)]
pub struct RemoveGameObjectCommand {
    meta: CommandMeta,
    remove: RemoveObjectCommand,
    /// Scripts taken out with the subtree, by owner uuid
    scripts: ScriptMap,
}

impl RemoveGameObjectCommand {
    pub fn new(state: &EditorState, object_uuid: &str) -> Result<Self, CommandError> {
        let remove = RemoveObjectCommand::new(state, object_uuid)?;
        let name = state
            .object_by_uuid(object_uuid)
            .map(|object| object.name.clone())
            .unwrap_or_default();

        Ok(Self {
            meta: CommandMeta::new(format!("Remove Game Object: {}", name)),
            remove,
            scripts: ScriptMap::new(),
        })
    }

    pub fn object_uuid(&self) -> &str {
        &self.remove.object_uuid
    }

    /// Scripts attached inside the subtree, for serializing before execute.
    fn attached_scripts(&self, state: &EditorState) -> ScriptMap {
        let Some(object) = state.object_by_uuid(&self.remove.object_uuid) else {
            return self.scripts.clone();
        };
        object
            .descendant_uuids()
            .into_iter()
            .filter_map(|uuid| state.scripts.get(&uuid).map(|scripts| (uuid, scripts.clone())))
            .collect()
    }
}

impl CommandType for RemoveGameObjectCommand {
    const TYPE: &'static str = "RemoveGameObjectCommand";
}

impl Command for RemoveGameObjectCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        let uuids = state
            .object_by_uuid(&self.remove.object_uuid)
            .map(Object3D::descendant_uuids)
            .ok_or_else(|| CommandError::ObjectNotFound(self.remove.object_uuid.clone()))?;

        self.remove.execute(state)?;

        self.scripts.clear();
        for uuid in uuids {
            if let Some(scripts) = state.scripts.remove(&uuid) {
                for index in (0..scripts.len()).rev() {
                    state.signals.script_removed.dispatch(&ScriptEvent {
                        object: uuid.clone(),
                        index,
                    });
                }
                self.scripts.insert(uuid, scripts);
            }
        }
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.remove.undo(state)?;

        for (uuid, scripts) in std::mem::take(&mut self.scripts) {
            let count = scripts.len();
            state.scripts.entry(uuid.clone()).or_default().extend(scripts);
            for index in 0..count {
                state.signals.script_added.dispatch(&ScriptEvent {
                    object: uuid.clone(),
                    index,
                });
            }
        }
        Ok(())
    }

    fn to_json(&self, state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &GameObjectPayload {
                remove: self.remove.payload(state),
                scripts: self.attached_scripts(state),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: GameObjectPayload = record.payload()?;
        self.meta.restore(record);
        self.scripts = payload.scripts;
        match self.remove.restore_payload(payload.remove, ctx) {
            Err(CommandError::ReferenceResolution { uuid }) => Err(unresolved(&mut self.meta, &uuid)),
            other => other,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovePayload {
    object_uuid: String,
    old_parent_uuid: String,
    old_index: usize,
    new_parent_uuid: String,
    new_index: usize,
}

/// Command to move an object to another parent or position.
#[derive(Default)]
pub struct MoveObjectCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    old_parent_uuid: String,
    old_index: usize,
    new_parent_uuid: String,
    new_index: usize,
}

impl MoveObjectCommand {
    /// Move `object_uuid` under `new_parent_uuid`, in front of `before`
    /// (a current child of the new parent) or at the end when `None`.
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        new_parent_uuid: &str,
        before: Option<&str>,
    ) -> Result<Self, CommandError> {
        let object = state
            .object_by_uuid(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;
        if object.contains(new_parent_uuid) {
            return Err(CommandError::InvalidOperation(format!(
                "cannot move {} into its own subtree",
                object_uuid
            )));
        }
        let (old_parent_uuid, old_index) = state.scene.index_in_parent(object_uuid).ok_or_else(|| {
            CommandError::InvalidOperation("the scene root cannot be moved".to_string())
        })?;
        let new_parent = state
            .object_by_uuid(new_parent_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(new_parent_uuid.to_string()))?;

        let mut new_index = match before {
            Some(before) => new_parent
                .children
                .iter()
                .position(|child| child.uuid == before)
                .ok_or_else(|| CommandError::ObjectNotFound(before.to_string()))?,
            None => new_parent.children.len(),
        };
        // Removing the object first shifts later siblings down by one.
        if old_parent_uuid == new_parent_uuid && new_index > old_index {
            new_index -= 1;
        }

        Ok(Self {
            meta: CommandMeta::new(format!("Move Object: {}", object.name)),
            object_uuid: object_uuid.to_string(),
            old_parent_uuid,
            old_index,
            new_parent_uuid: new_parent_uuid.to_string(),
            new_index,
        })
    }

    pub fn new_index(&self) -> usize {
        self.new_index
    }

    fn relocate(&self, state: &mut EditorState, parent_uuid: &str, index: usize) -> CommandResult {
        let object = state
            .object_by_uuid(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        if object.contains(parent_uuid) {
            return Err(CommandError::InvalidOperation(format!(
                "cannot move {} into its own subtree",
                self.object_uuid
            )));
        }
        if state.object_by_uuid(parent_uuid).is_none() {
            return Err(CommandError::ObjectNotFound(parent_uuid.to_string()));
        }

        let detached = state
            .scene
            .detach(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        if let Err(object) = state.scene.insert_child(parent_uuid, Some(index), detached.object) {
            // Unreachable after the checks above; put it back where it was.
            state
                .scene
                .insert_child(&detached.parent, Some(detached.index), object)
                .map_err(|_| CommandError::ObjectNotFound(detached.parent.clone()))?;
            return Err(CommandError::ObjectNotFound(parent_uuid.to_string()));
        }

        state.signals.scene_graph_changed.dispatch(&());
        Ok(())
    }
}

impl CommandType for MoveObjectCommand {
    const TYPE: &'static str = "MoveObjectCommand";
}

impl Command for MoveObjectCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.relocate(state, &self.new_parent_uuid, self.new_index)
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.relocate(state, &self.old_parent_uuid, self.old_index)
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &MovePayload {
                object_uuid: self.object_uuid.clone(),
                old_parent_uuid: self.old_parent_uuid.clone(),
                old_index: self.old_index,
                new_parent_uuid: self.new_parent_uuid.clone(),
                new_index: self.new_index,
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: MovePayload = record.payload()?;
        self.meta.restore(record);
        self.object_uuid = payload.object_uuid;
        self.old_index = payload.old_index;
        self.new_index = payload.new_index;

        let root = ctx.state.scene_uuid();
        let or_root = |uuid: String| if ctx.contains(&uuid) { uuid } else { root.to_string() };
        self.old_parent_uuid = or_root(payload.old_parent_uuid);
        self.new_parent_uuid = or_root(payload.new_parent_uuid);

        if ctx.contains(&self.object_uuid) {
            Ok(())
        } else {
            Err(unresolved(&mut self.meta, &self.object_uuid))
        }
    }
}
