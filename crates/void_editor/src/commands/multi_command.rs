//! Batch command: several commands applied and undone as one entry.

use serde::{Deserialize, Serialize};

use crate::core::EditorState;
use super::{
    apply, record_of, resolve_pending, Command, CommandError, CommandMeta, CommandRecord,
    CommandRegistry, CommandResult, CommandType, Direction, RestoreContext,
};

#[derive(Serialize, Deserialize)]
struct MultiPayload {
    cmds: Vec<CommandRecord>,
}

/// Command grouping child commands into one history entry.
///
/// Children run in order on execute and in reverse on undo. Scene-graph
/// notifications from the children are collapsed into a single one.
#[derive(Default)]
pub struct MultiCmdsCommand {
    meta: CommandMeta,
    cmds: Vec<Box<dyn Command>>,
    /// Set on restore, for children whose objects were not loaded yet
    registry: Option<CommandRegistry>,
}

impl MultiCmdsCommand {
    pub fn new(cmds: Vec<Box<dyn Command>>) -> Self {
        Self {
            meta: CommandMeta::new("Multiple Changes"),
            cmds,
            registry: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.cmds.iter().map(|c| c.as_ref())
    }

    fn run(&mut self, state: &mut EditorState, direction: Direction) {
        let was_active = state.signals.scene_graph_changed.is_active();
        state.signals.scene_graph_changed.set_active(false);

        let registry = self.registry.as_ref();
        match direction {
            Direction::Forward => {
                for cmd in self.cmds.iter_mut() {
                    step(cmd.as_mut(), state, registry, direction);
                }
            }
            Direction::Backward => {
                for cmd in self.cmds.iter_mut().rev() {
                    step(cmd.as_mut(), state, registry, direction);
                }
            }
        }

        state.signals.scene_graph_changed.set_active(was_active);
        state.signals.scene_graph_changed.dispatch(&());
    }
}

/// Apply one child, restoring it first if it was waiting for its object.
fn step(
    cmd: &mut dyn Command,
    state: &mut EditorState,
    registry: Option<&CommandRegistry>,
    direction: Direction,
) {
    if let Some(registry) = registry {
        resolve_pending(cmd, &RestoreContext::new(state, registry));
    }
    apply(cmd, state, direction);
}

impl CommandType for MultiCmdsCommand {
    const TYPE: &'static str = "MultiCmdsCommand";
}

impl Command for MultiCmdsCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.run(state, Direction::Forward);
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.run(state, Direction::Backward);
        Ok(())
    }

    fn to_json(&self, state: &EditorState) -> Result<CommandRecord, CommandError> {
        let cmds = self
            .cmds
            .iter()
            .map(|cmd| record_of(cmd.as_ref(), state))
            .collect::<Result<Vec<_>, _>>()?;
        CommandRecord::new(self, &MultiPayload { cmds })
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: MultiPayload = record.payload()?;
        self.meta.restore(record);
        self.cmds.clear();
        self.registry = Some(ctx.registry.clone());

        for child in &payload.cmds {
            let Some(mut cmd) = ctx.registry.create(&child.kind) else {
                log::warn!("{}: skipping child of unknown type '{}'", self.meta.name, child.kind);
                continue;
            };
            match cmd.from_json(child, ctx) {
                Ok(()) => {}
                Err(CommandError::ReferenceResolution { uuid }) => {
                    log::debug!("{}: child '{}' waits for object {}", self.meta.name, child.name, uuid);
                    cmd.meta_mut().defer(child.clone());
                }
                Err(e) => {
                    log::warn!("{}: skipping child '{}': {}", self.meta.name, child.name, e);
                    continue;
                }
            }
            self.cmds.push(cmd);
        }
        Ok(())
    }
}
