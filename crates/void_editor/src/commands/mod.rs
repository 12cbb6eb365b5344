//! Command pattern implementation for undo/redo support.
//!
//! All editor modifications that should be undoable must go through
//! the command system.

/// Implements the bookkeeping accessors of `Command` for a struct with a
/// `meta: CommandMeta` field and a `CommandType` impl.
macro_rules! command_basics {
    () => {
        fn kind(&self) -> &'static str {
            <Self as $crate::commands::CommandType>::TYPE
        }

        fn meta(&self) -> &$crate::commands::CommandMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut $crate::commands::CommandMeta {
            &mut self.meta
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    };
}

mod command;
mod geometry_commands;
mod material_commands;
mod multi_command;
mod object_commands;
mod registry;
mod script_commands;
mod transform_commands;
mod value_commands;

pub use command::{
    Command, CommandError, CommandMeta, CommandRecord, CommandResult, CommandType, Direction,
    MergeTarget, RestoreContext,
};
pub(crate) use command::{apply, record_of, resolve_pending, restore_target, unresolved};
pub use geometry_commands::{SetGeometryCommand, SetGeometryValueCommand};
pub use material_commands::{
    SetMaterialColorCommand, SetMaterialCommand, SetMaterialMapCommand, SetMaterialValueCommand,
};
pub use multi_command::MultiCmdsCommand;
pub use object_commands::{
    AddObjectCommand, MoveObjectCommand, RemoveGameObjectCommand, RemoveObjectCommand,
};
pub use registry::{CommandFactory, CommandRegistry};
pub use script_commands::{AddScriptCommand, RemoveScriptCommand, SetScriptValueCommand};
pub use transform_commands::{
    Position, Rotation, Scale, SetPositionCommand, SetRotationCommand, SetScaleCommand,
    SetTransformCommand, TransformAttribute,
};
pub use value_commands::{SetColorCommand, SetUuidCommand, SetValueCommand};
