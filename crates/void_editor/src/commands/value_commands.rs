//! Attribute edits on scene objects: generic values, colours and uuids.

use serde::{Deserialize, Serialize};
use void_scene::{Color, Value};

use crate::core::EditorState;
use super::{
    restore_target, unresolved, Command, CommandError, CommandMeta, CommandRecord, CommandResult,
    CommandType, MergeTarget, RestoreContext,
};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValuePayload<T> {
    object_uuid: String,
    attribute_name: String,
    old_value: T,
    new_value: T,
}

/// Renaming an object moves its helper, scripts and selection, so the uuid
/// only changes through `SetUuidCommand`.
fn check_attribute(attribute_name: &str) -> CommandResult {
    if attribute_name == "uuid" {
        return Err(CommandError::InvalidOperation(
            "uuid cannot be set as a plain value, use SetUuidCommand".to_string(),
        ));
    }
    Ok(())
}

/// Command to set a named attribute of an object.
#[derive(Default)]
pub struct SetValueCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub attribute_name: String,
    pub new_value: Value,
    old_value: Value,
}

impl SetValueCommand {
    /// Capture the attribute's current value as the undo target.
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        attribute_name: &str,
        new_value: impl Into<Value>,
    ) -> Result<Self, CommandError> {
        check_attribute(attribute_name)?;
        let object = state
            .object_by_uuid(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;
        let old_value = object.get_attribute(attribute_name)?;

        Ok(Self {
            meta: CommandMeta::new(format!("Set Value: {}", attribute_name)),
            object_uuid: object_uuid.to_string(),
            attribute_name: attribute_name.to_string(),
            new_value: new_value.into(),
            old_value,
        })
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    fn write(&self, state: &mut EditorState, value: &Value) -> CommandResult {
        let object = state
            .object_by_uuid_mut(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        object.set_attribute(&self.attribute_name, value)?;

        state.signals.object_changed.dispatch(&self.object_uuid);
        state.signals.scene_graph_changed.dispatch(&());
        Ok(())
    }
}

impl CommandType for SetValueCommand {
    const TYPE: &'static str = "SetValueCommand";
}

impl Command for SetValueCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, &self.new_value)
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, &self.old_value)
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(&self.object_uuid, &self.attribute_name))
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_value = newer.new_value.clone();
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &ValuePayload {
                object_uuid: self.object_uuid.clone(),
                attribute_name: self.attribute_name.clone(),
                old_value: self.old_value.clone(),
                new_value: self.new_value.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: ValuePayload<Value> = record.payload()?;
        check_attribute(&payload.attribute_name)?;
        self.object_uuid = payload.object_uuid;
        self.attribute_name = payload.attribute_name;
        self.old_value = payload.old_value;
        self.new_value = payload.new_value;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

/// Command to set a colour attribute of an object (a light's `color`).
#[derive(Default)]
pub struct SetColorCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub attribute_name: String,
    pub new_value: Color,
    old_value: Color,
}

impl SetColorCommand {
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        attribute_name: &str,
        new_value: Color,
    ) -> Result<Self, CommandError> {
        let object = state
            .object_by_uuid(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;
        let old_value = object.color_attribute(attribute_name)?;

        Ok(Self {
            meta: CommandMeta::new(format!("Set Color: {}", attribute_name)),
            object_uuid: object_uuid.to_string(),
            attribute_name: attribute_name.to_string(),
            new_value,
            old_value,
        })
    }

    pub fn old_value(&self) -> Color {
        self.old_value
    }

    fn write(&self, state: &mut EditorState, color: Color) -> CommandResult {
        let object = state
            .object_by_uuid_mut(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        object.set_color_attribute(&self.attribute_name, color)?;
        state.signals.object_changed.dispatch(&self.object_uuid);
        Ok(())
    }
}

impl CommandType for SetColorCommand {
    const TYPE: &'static str = "SetColorCommand";
}

impl Command for SetColorCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.new_value)
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.old_value)
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(&self.object_uuid, &self.attribute_name))
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_value = newer.new_value;
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &ValuePayload {
                object_uuid: self.object_uuid.clone(),
                attribute_name: self.attribute_name.clone(),
                old_value: self.old_value,
                new_value: self.new_value,
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: ValuePayload<Color> = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.attribute_name = payload.attribute_name;
        self.old_value = payload.old_value;
        self.new_value = payload.new_value;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UuidPayload {
    old_uuid: String,
    new_uuid: String,
}

/// Command to change an object's uuid.
///
/// The helper and script tables follow the object to its new uuid. The
/// command tracks which uuid the object carries while applied, so a run of
/// renames coalesces into one entry from the first uuid to the last.
#[derive(Default)]
pub struct SetUuidCommand {
    meta: CommandMeta,
    pub old_uuid: String,
    pub new_uuid: String,
    /// Uuid written by the last execute; `None` while not applied
    applied_uuid: Option<String>,
}

impl SetUuidCommand {
    pub fn new(state: &EditorState, object_uuid: &str, new_uuid: &str) -> Result<Self, CommandError> {
        if state.object_by_uuid(object_uuid).is_none() {
            return Err(CommandError::ObjectNotFound(object_uuid.to_string()));
        }
        Ok(Self {
            meta: CommandMeta::new("Set UUID"),
            old_uuid: object_uuid.to_string(),
            new_uuid: new_uuid.to_string(),
            applied_uuid: None,
        })
    }

    /// The uuid the object carries right now, as far as this command knows.
    fn live_uuid(&self) -> &str {
        self.applied_uuid.as_deref().unwrap_or(&self.old_uuid)
    }

    fn rename(state: &mut EditorState, from: &str, to: &str) -> CommandResult {
        if from != to && state.object_by_uuid(to).is_some() {
            return Err(CommandError::InvalidOperation(format!("uuid {} is already in use", to)));
        }
        let object = state
            .object_by_uuid_mut(from)
            .ok_or_else(|| CommandError::ObjectNotFound(from.to_string()))?;
        object.uuid = to.to_string();
        state.rekey_object(from, to);

        state.signals.object_changed.dispatch(&to.to_string());
        state.signals.scene_graph_changed.dispatch(&());
        Ok(())
    }
}

impl CommandType for SetUuidCommand {
    const TYPE: &'static str = "SetUuidCommand";
}

impl Command for SetUuidCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        let from = self.live_uuid().to_string();
        Self::rename(state, &from, &self.new_uuid)?;
        self.applied_uuid = Some(self.new_uuid.clone());
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        let from = self.applied_uuid.clone().unwrap_or_else(|| self.new_uuid.clone());
        Self::rename(state, &from, &self.old_uuid)?;
        self.applied_uuid = None;
        Ok(())
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(self.live_uuid(), "uuid"))
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_uuid = newer.new_uuid.clone();
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &UuidPayload {
                old_uuid: self.old_uuid.clone(),
                new_uuid: self.new_uuid.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: UuidPayload = record.payload()?;
        self.meta.restore(record);
        self.old_uuid = payload.old_uuid;
        self.new_uuid = payload.new_uuid;

        if ctx.contains(&self.new_uuid) {
            self.applied_uuid = Some(self.new_uuid.clone());
            Ok(())
        } else if ctx.contains(&self.old_uuid) {
            log::warn!(
                "SetUuid #{}: scene still holds {}, treating as not applied",
                self.meta.id,
                self.old_uuid
            );
            self.applied_uuid = None;
            Ok(())
        } else {
            Err(unresolved(&mut self.meta, &self.new_uuid))
        }
    }
}
