//! Transform manipulation commands (position, rotation, scale).

use std::marker::PhantomData;

use crate::core::EditorState;
use super::{
    restore_target, Command, CommandError, CommandMeta, CommandRecord, CommandResult, CommandType,
    MergeTarget, RestoreContext,
};

/// One of the three transform vectors of an object.
pub trait TransformAttribute: Default + Send + Sync + 'static {
    const TYPE: &'static str;
    /// Label used in the history
    const LABEL: &'static str;
    /// Record key suffix: `old<Key>` / `new<Key>`
    const KEY: &'static str;

    fn get(object: &void_scene::Object3D) -> [f64; 3];
    fn set(object: &mut void_scene::Object3D, value: [f64; 3]);
}

#[derive(Default)]
pub struct Position;

impl TransformAttribute for Position {
    const TYPE: &'static str = "SetPositionCommand";
    const LABEL: &'static str = "Set Position";
    const KEY: &'static str = "Position";

    fn get(object: &void_scene::Object3D) -> [f64; 3] {
        object.position
    }

    fn set(object: &mut void_scene::Object3D, value: [f64; 3]) {
        object.position = value;
    }
}

#[derive(Default)]
pub struct Rotation;

impl TransformAttribute for Rotation {
    const TYPE: &'static str = "SetRotationCommand";
    const LABEL: &'static str = "Set Rotation";
    const KEY: &'static str = "Rotation";

    fn get(object: &void_scene::Object3D) -> [f64; 3] {
        object.rotation
    }

    fn set(object: &mut void_scene::Object3D, value: [f64; 3]) {
        object.rotation = value;
    }
}

#[derive(Default)]
pub struct Scale;

impl TransformAttribute for Scale {
    const TYPE: &'static str = "SetScaleCommand";
    const LABEL: &'static str = "Set Scale";
    const KEY: &'static str = "Scale";

    fn get(object: &void_scene::Object3D) -> [f64; 3] {
        object.scale
    }

    fn set(object: &mut void_scene::Object3D, value: [f64; 3]) {
        object.scale = value;
    }
}

/// Command to set one transform vector of an object.
///
/// Consecutive edits of the same vector on the same object coalesce, so a
/// drag produces a single history entry.
#[derive(Default)]
pub struct SetTransformCommand<A: TransformAttribute> {
    meta: CommandMeta,
    pub object_uuid: String,
    pub new_value: [f64; 3],
    old_value: [f64; 3],
    attribute: PhantomData<A>,
}

pub type SetPositionCommand = SetTransformCommand<Position>;
pub type SetRotationCommand = SetTransformCommand<Rotation>;
pub type SetScaleCommand = SetTransformCommand<Scale>;

impl<A: TransformAttribute> SetTransformCommand<A> {
    /// Capture the object's current value as the undo target.
    pub fn new(state: &EditorState, object_uuid: &str, new_value: [f64; 3]) -> Result<Self, CommandError> {
        let object = state
            .object_by_uuid(object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(object_uuid.to_string()))?;
        Ok(Self::with_old_value(object_uuid, new_value, A::get(object)))
    }

    /// Use an explicit undo target, e.g. the value before a drag started.
    pub fn with_old_value(object_uuid: &str, new_value: [f64; 3], old_value: [f64; 3]) -> Self {
        Self {
            meta: CommandMeta::new(A::LABEL),
            object_uuid: object_uuid.to_string(),
            new_value,
            old_value,
            attribute: PhantomData,
        }
    }

    pub fn old_value(&self) -> [f64; 3] {
        self.old_value
    }

    fn write(&self, state: &mut EditorState, value: [f64; 3]) -> CommandResult {
        let object = state
            .object_by_uuid_mut(&self.object_uuid)
            .ok_or_else(|| CommandError::ObjectNotFound(self.object_uuid.clone()))?;
        A::set(object, value);
        state.signals.object_changed.dispatch(&self.object_uuid);
        Ok(())
    }
}

impl<A: TransformAttribute> CommandType for SetTransformCommand<A> {
    const TYPE: &'static str = A::TYPE;
}

impl<A: TransformAttribute> Command for SetTransformCommand<A> {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.new_value)
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, self.old_value)
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(&self.object_uuid, A::KEY))
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_value = newer.new_value;
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        let mut payload = serde_json::Map::new();
        payload.insert("objectUuid".into(), self.object_uuid.clone().into());
        payload.insert(format!("old{}", A::KEY), serde_json::to_value(self.old_value)?);
        payload.insert(format!("new{}", A::KEY), serde_json::to_value(self.new_value)?);
        CommandRecord::new(self, &payload)
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        self.object_uuid = record.field("objectUuid")?;
        self.old_value = record.field(&format!("old{}", A::KEY))?;
        self.new_value = record.field(&format!("new{}", A::KEY))?;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}
