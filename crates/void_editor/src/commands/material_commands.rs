//! Material replacement, attribute, colour and texture-map edits.

use serde::{Deserialize, Serialize};
use void_scene::{Color, Material, Texture, Value};

use crate::core::EditorState;
use super::{
    restore_target, Command, CommandError, CommandMeta, CommandRecord, CommandResult, CommandType,
    MergeTarget, RestoreContext,
};

fn material_of<'a>(state: &'a EditorState, object_uuid: &str) -> Result<&'a Material, CommandError> {
    state
        .object_by_uuid(object_uuid)
        .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?
        .material
        .as_ref()
        .ok_or_else(|| no_material(object_uuid))
}

fn no_material(object_uuid: &str) -> CommandError {
    CommandError::InvalidOperation(format!("object {} has no material", object_uuid))
}

/// Apply `edit` to an object's material, refresh the catalogue entry and
/// notify observers.
fn edit_material<F>(state: &mut EditorState, object_uuid: &str, edit: F) -> CommandResult
where
    F: FnOnce(&mut Material) -> CommandResult,
{
    let object = state
        .object_by_uuid_mut(object_uuid)
        .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;
    let material = object.material.as_mut().ok_or_else(|| no_material(object_uuid))?;
    edit(material)?;
    let material = material.clone();

    state.add_material(&material);
    state.signals.material_changed.dispatch(&object_uuid.to_string());
    Ok(())
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialPayload {
    object_uuid: String,
    old_material: Option<Material>,
    new_material: Material,
}

/// Command to replace an object's material.
#[derive(Default)]
pub struct SetMaterialCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub new_material: Material,
    old_material: Option<Material>,
}

impl SetMaterialCommand {
    pub fn new(state: &EditorState, object_uuid: &str, new_material: Material) -> Result<Self, CommandError> {
        let object = state
            .object_by_uuid(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;

        Ok(Self {
            meta: CommandMeta::new("New Material"),
            object_uuid: object_uuid.to_string(),
            old_material: object.material.clone(),
            new_material,
        })
    }

    /// Swap in `material`. The displaced one leaves the catalogue unless it
    /// is the original or still used elsewhere.
    fn write(&self, state: &mut EditorState, material: Option<&Material>) -> CommandResult {
        let object = state
            .object_by_uuid_mut(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        let displaced = std::mem::replace(&mut object.material, material.cloned());
        if let Some(material) = material {
            state.add_material(material);
        }

        if let Some(displaced) = displaced {
            let uuid = Some(displaced.uuid.as_str());
            let original = self.old_material.as_ref().map(|m| m.uuid.as_str());
            if uuid != original && uuid != material.map(|m| m.uuid.as_str()) {
                state.release_material(&displaced.uuid);
            }
        }
        state.signals.material_changed.dispatch(&self.object_uuid);
        Ok(())
    }
}

impl CommandType for SetMaterialCommand {
    const TYPE: &'static str = "SetMaterialCommand";
}

impl Command for SetMaterialCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, Some(&self.new_material))
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.old_material.as_ref())
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &MaterialPayload {
                object_uuid: self.object_uuid.clone(),
                old_material: self.old_material.clone(),
                new_material: self.new_material.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: MaterialPayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.old_material = payload.old_material;
        self.new_material = payload.new_material;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributePayload<T> {
    object_uuid: String,
    attribute_name: String,
    old_value: T,
    new_value: T,
}

/// Command to set a scalar attribute of an object's material.
#[derive(Default)]
pub struct SetMaterialValueCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub attribute_name: String,
    pub new_value: Value,
    old_value: Value,
}

impl SetMaterialValueCommand {
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        attribute_name: &str,
        new_value: impl Into<Value>,
    ) -> Result<Self, CommandError> {
        let old_value = material_of(state, object_uuid)?.get_attribute(attribute_name)?;

        Ok(Self {
            meta: CommandMeta::new(format!("Set Material Value: {}", attribute_name)),
            object_uuid: object_uuid.to_string(),
            attribute_name: attribute_name.to_string(),
            new_value: new_value.into(),
            old_value,
        })
    }

    fn write(&self, state: &mut EditorState, value: &Value) -> CommandResult {
        edit_material(state, &self.object_uuid, |material| {
            material.set_attribute(&self.attribute_name, value)?;
            Ok(())
        })?;
        state.signals.object_changed.dispatch(&self.object_uuid);
        Ok(())
    }
}

impl CommandType for SetMaterialValueCommand {
    const TYPE: &'static str = "SetMaterialValueCommand";
}

impl Command for SetMaterialValueCommand {
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
            &AttributePayload {
                object_uuid: self.object_uuid.clone(),
                attribute_name: self.attribute_name.clone(),
                old_value: self.old_value.clone(),
                new_value: self.new_value.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: AttributePayload<Value> = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.attribute_name = payload.attribute_name;
        self.old_value = payload.old_value;
        self.new_value = payload.new_value;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

/// Command to set a colour attribute (`color`, `emissive`) of an object's
/// material.
#[derive(Default)]
pub struct SetMaterialColorCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub attribute_name: String,
    pub new_value: Color,
    old_value: Color,
}

impl SetMaterialColorCommand {
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        attribute_name: &str,
        new_value: Color,
    ) -> Result<Self, CommandError> {
        let old_value = material_of(state, object_uuid)?.color_attribute(attribute_name)?;

        Ok(Self {
            meta: CommandMeta::new(format!("Set Material Color: {}", attribute_name)),
            object_uuid: object_uuid.to_string(),
            attribute_name: attribute_name.to_string(),
            new_value,
            old_value,
        })
    }

    fn write(&self, state: &mut EditorState, color: Color) -> CommandResult {
        edit_material(state, &self.object_uuid, |material| {
            material.set_color_attribute(&self.attribute_name, color)?;
            Ok(())
        })
    }
}

impl CommandType for SetMaterialColorCommand {
    const TYPE: &'static str = "SetMaterialColorCommand";
}

impl Command for SetMaterialColorCommand {
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
            &AttributePayload {
                object_uuid: self.object_uuid.clone(),
                attribute_name: self.attribute_name.clone(),
                old_value: self.old_value,
                new_value: self.new_value,
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: AttributePayload<Color> = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.attribute_name = payload.attribute_name;
        self.old_value = payload.old_value;
        self.new_value = payload.new_value;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapPayload {
    object_uuid: String,
    map_name: String,
    old_map: Option<Texture>,
    new_map: Option<Texture>,
}

/// Command to bind or clear a texture map slot of an object's material.
#[derive(Default)]
pub struct SetMaterialMapCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub map_name: String,
    pub new_map: Option<Texture>,
    old_map: Option<Texture>,
}

impl SetMaterialMapCommand {
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        map_name: &str,
        new_map: Option<Texture>,
    ) -> Result<Self, CommandError> {
        let material = material_of(state, object_uuid)?;
        if !void_scene::MAP_SLOTS.contains(&map_name) {
            return Err(CommandError::InvalidOperation(format!("unknown map slot '{}'", map_name)));
        }

        Ok(Self {
            meta: CommandMeta::new(format!("Set Material Map: {}", map_name)),
            object_uuid: object_uuid.to_string(),
            map_name: map_name.to_string(),
            old_map: material.map(map_name).cloned(),
            new_map,
        })
    }

    fn write(&self, state: &mut EditorState, map: Option<&Texture>) -> CommandResult {
        edit_material(state, &self.object_uuid, |material| {
            material.set_map(&self.map_name, map.cloned())?;
            Ok(())
        })
    }
}

impl CommandType for SetMaterialMapCommand {
    const TYPE: &'static str = "SetMaterialMapCommand";
}

impl Command for SetMaterialMapCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.new_map.as_ref())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.old_map.as_ref())
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(&self.object_uuid, &self.map_name))
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_map = newer.new_map.clone();
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &MapPayload {
                object_uuid: self.object_uuid.clone(),
                map_name: self.map_name.clone(),
                old_map: self.old_map.clone(),
                new_map: self.new_map.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: MapPayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.map_name = payload.map_name;
        self.old_map = payload.old_map;
        self.new_map = payload.new_map;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}
