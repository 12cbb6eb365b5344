//! Geometry replacement and parameter edits.

use serde::{Deserialize, Serialize};
use void_scene::{Geometry, Object3D, Value};

use crate::core::EditorState;
use super::{
    restore_target, Command, CommandError, CommandMeta, CommandRecord, CommandResult, CommandType,
    MergeTarget, RestoreContext,
};

fn geometry_of<'a>(state: &'a EditorState, object_uuid: &str) -> Result<&'a Geometry, CommandError> {
    state
        .object_by_uuid(object_uuid)
        .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?
        .geometry
        .as_ref()
        .ok_or_else(|| no_geometry(object_uuid))
}

fn object_mut<'a>(state: &'a mut EditorState, object_uuid: &str) -> Result<&'a mut Object3D, CommandError> {
    state
        .object_by_uuid_mut(object_uuid)
        .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))
}

fn no_geometry(object_uuid: &str) -> CommandError {
    CommandError::InvalidOperation(format!("object {} has no geometry", object_uuid))
}

fn notify(state: &EditorState, object_uuid: &str) {
    state.signals.geometry_changed.dispatch(&object_uuid.to_string());
    state.signals.scene_graph_changed.dispatch(&());
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeometryPayload {
    object_uuid: String,
    old_geometry: Option<Geometry>,
    new_geometry: Geometry,
}

/// Command to replace an object's geometry.
#[derive(Default)]
pub struct SetGeometryCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub new_geometry: Geometry,
    old_geometry: Option<Geometry>,
}

impl SetGeometryCommand {
    pub fn new(state: &EditorState, object_uuid: &str, new_geometry: Geometry) -> Result<Self, CommandError> {
        let object = state
            .object_by_uuid(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;

        Ok(Self {
            meta: CommandMeta::new("Set Geometry"),
            object_uuid: object_uuid.to_string(),
            old_geometry: object.geometry.clone(),
            new_geometry,
        })
    }

    /// Swap in `geometry`. The displaced one leaves the catalogue unless it
    /// is the original or still used elsewhere.
    fn write(&self, state: &mut EditorState, geometry: Option<&Geometry>) -> CommandResult {
        let object = object_mut(state, &self.object_uuid)?;
        let displaced = std::mem::replace(&mut object.geometry, geometry.cloned());
        if let Some(geometry) = geometry {
            state.add_geometry(geometry);
        }

        if let Some(displaced) = displaced {
            let uuid = Some(displaced.uuid.as_str());
            let original = self.old_geometry.as_ref().map(|g| g.uuid.as_str());
            if uuid != original && uuid != geometry.map(|g| g.uuid.as_str()) {
                state.release_geometry(&displaced.uuid);
            }
        }
        notify(state, &self.object_uuid);
        Ok(())
    }
}

impl CommandType for SetGeometryCommand {
    const TYPE: &'static str = "SetGeometryCommand";
}

impl Command for SetGeometryCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, Some(&self.new_geometry))
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.old_geometry.as_ref())
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(&self.object_uuid, "geometry"))
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_geometry = newer.new_geometry.clone();
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &GeometryPayload {
                object_uuid: self.object_uuid.clone(),
                old_geometry: self.old_geometry.clone(),
                new_geometry: self.new_geometry.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: GeometryPayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.old_geometry = payload.old_geometry;
        self.new_geometry = payload.new_geometry;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeometryValuePayload {
    object_uuid: String,
    attribute_name: String,
    old_value: Value,
    new_value: Value,
}

/// Command to set one parameter (or the name) of an object's geometry.
#[derive(Default)]
pub struct SetGeometryValueCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub attribute_name: String,
    pub new_value: Value,
    old_value: Value,
}

impl SetGeometryValueCommand {
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        attribute_name: &str,
        new_value: impl Into<Value>,
    ) -> Result<Self, CommandError> {
        let old_value = geometry_of(state, object_uuid)?.get_attribute(attribute_name)?;

        Ok(Self {
            meta: CommandMeta::new(format!("Set Geometry Value: {}", attribute_name)),
            object_uuid: object_uuid.to_string(),
            attribute_name: attribute_name.to_string(),
            new_value: new_value.into(),
            old_value,
        })
    }

    fn write(&self, state: &mut EditorState, value: &Value) -> CommandResult {
        let object = object_mut(state, &self.object_uuid)?;
        let geometry = object
            .geometry
            .as_mut()
            .ok_or_else(|| no_geometry(&self.object_uuid))?;
        geometry.set_attribute(&self.attribute_name, value)?;
        let geometry = geometry.clone();

        state.add_geometry(&geometry);
        state.signals.object_changed.dispatch(&self.object_uuid);
        notify(state, &self.object_uuid);
        Ok(())
    }
}

impl CommandType for SetGeometryValueCommand {
    const TYPE: &'static str = "SetGeometryValueCommand";
}

impl Command for SetGeometryValueCommand {
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
            &GeometryValuePayload {
                object_uuid: self.object_uuid.clone(),
                attribute_name: self.attribute_name.clone(),
                old_value: self.old_value.clone(),
                new_value: self.new_value.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: GeometryValuePayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.attribute_name = payload.attribute_name;
        self.old_value = payload.old_value;
        self.new_value = payload.new_value;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::Material;

    fn state() -> EditorState {
        let mut state = EditorState::new();
        let mesh = Object3D::mesh("Ball", Geometry::sphere(1.0), Material::standard()).with_uuid("ball");
        state.add_object(mesh, None, None).unwrap();
        state
    }

    #[test]
    fn test_replace_geometry() {
        let mut state = state();
        let cube = Geometry::cube(2.0);
        let mut cmd = SetGeometryCommand::new(&state, "ball", cube.clone()).unwrap();

        cmd.execute(&mut state).unwrap();
        assert_eq!(state.object_by_uuid("ball").unwrap().geometry.as_ref(), Some(&cube));
        assert!(state.geometries.contains_key(&cube.uuid));

        cmd.undo(&mut state).unwrap();
        assert_eq!(state.object_by_uuid("ball").unwrap().geometry.as_ref().unwrap().kind, "SphereGeometry");
    }

    #[test]
    fn test_replaced_geometry_leaves_no_catalogue_entry() {
        let mut state = state();
        let mut history = crate::core::History::new();
        for size in [2.0, 3.0, 4.0] {
            let cmd = SetGeometryCommand::new(&state, "ball", Geometry::cube(size)).unwrap();
            history.execute(&mut state, Box::new(cmd), None);
        }
        assert_eq!(history.undo_count(), 1);
        assert_eq!(state.geometries.len(), 2);

        history.undo(&mut state);
        assert_eq!(state.geometries.len(), 1);
        let sphere = state.object_by_uuid("ball").unwrap().geometry.clone().unwrap();
        assert!(state.geometries.contains_key(&sphere.uuid));

        history.redo(&mut state);
        assert_eq!(state.geometries.len(), 2);
    }

    #[test]
    fn test_shared_geometry_stays_catalogued() {
        let mut state = state();
        let cube = Geometry::cube(2.0);
        let twin = Object3D::mesh("Twin", cube.clone(), Material::standard()).with_uuid("twin");
        state.add_object(twin, None, None).unwrap();

        let mut cmd = SetGeometryCommand::new(&state, "ball", cube.clone()).unwrap();
        cmd.execute(&mut state).unwrap();
        cmd.undo(&mut state).unwrap();
        assert!(state.geometries.contains_key(&cube.uuid));
    }

    #[test]
    fn test_geometry_parameter() {
        let mut state = state();
        let mut cmd = SetGeometryValueCommand::new(&state, "ball", "radius", 4.0).unwrap();
        cmd.execute(&mut state).unwrap();

        let radius = |state: &EditorState| {
            state.object_by_uuid("ball").unwrap().geometry.as_ref().unwrap().parameters["radius"]
        };
        assert_eq!(radius(&state), 4.0);
        cmd.undo(&mut state).unwrap();
        assert_eq!(radius(&state), 1.0);
    }

    #[test]
    fn test_object_without_geometry() {
        let mut state = EditorState::new();
        state.add_object(Object3D::group("G").with_uuid("g"), None, None).unwrap();
        assert!(matches!(
            SetGeometryValueCommand::new(&state, "g", "radius", 1.0),
            Err(CommandError::InvalidOperation(_))
        ));
    }
}
