//! Command registry
//!
//! Maps record type tags to constructors so a saved history can be rebuilt
//! without a hard-coded match over every command type.

use std::collections::BTreeMap;
use std::fmt;

use super::command::{Command, CommandType};
use super::geometry_commands::{SetGeometryCommand, SetGeometryValueCommand};
use super::material_commands::{
    SetMaterialColorCommand, SetMaterialCommand, SetMaterialMapCommand, SetMaterialValueCommand,
};
use super::multi_command::MultiCmdsCommand;
use super::object_commands::{
    AddObjectCommand, MoveObjectCommand, RemoveGameObjectCommand, RemoveObjectCommand,
};
use super::script_commands::{AddScriptCommand, RemoveScriptCommand, SetScriptValueCommand};
use super::transform_commands::{SetPositionCommand, SetRotationCommand, SetScaleCommand};
use super::value_commands::{SetColorCommand, SetUuidCommand, SetValueCommand};

/// Constructor for an empty command awaiting `from_json`
pub type CommandFactory = fn() -> Box<dyn Command>;

fn construct<T: CommandType>() -> Box<dyn Command> {
    Box::new(T::default())
}

/// Registry of command types by type tag
#[derive(Clone, Default)]
pub struct CommandRegistry {
    factories: BTreeMap<&'static str, CommandFactory>,
}

impl CommandRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in command type
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<AddObjectCommand>();
        registry.register::<RemoveObjectCommand>();
        registry.register::<MoveObjectCommand>();
        registry.register::<RemoveGameObjectCommand>();
        registry.register::<SetPositionCommand>();
        registry.register::<SetRotationCommand>();
        registry.register::<SetScaleCommand>();
        registry.register::<SetValueCommand>();
        registry.register::<SetColorCommand>();
        registry.register::<SetUuidCommand>();
        registry.register::<SetGeometryCommand>();
        registry.register::<SetGeometryValueCommand>();
        registry.register::<SetMaterialCommand>();
        registry.register::<SetMaterialValueCommand>();
        registry.register::<SetMaterialColorCommand>();
        registry.register::<SetMaterialMapCommand>();
        registry.register::<AddScriptCommand>();
        registry.register::<RemoveScriptCommand>();
        registry.register::<SetScriptValueCommand>();
        registry.register::<MultiCmdsCommand>();
        registry
    }

    /// Register a command type under its tag
    pub fn register<T: CommandType>(&mut self) {
        self.register_factory(T::TYPE, construct::<T>);
    }

    /// Register a constructor under an explicit tag
    pub fn register_factory(&mut self, kind: &'static str, factory: CommandFactory) {
        if self.factories.insert(kind, factory).is_some() {
            log::debug!("Command type '{}' re-registered", kind);
        }
    }

    /// Construct an empty command for a tag
    pub fn create(&self, kind: &str) -> Option<Box<dyn Command>> {
        self.factories.get(kind).map(|factory| factory())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered tags, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
