//! Script attachment and editing commands.
//!
//! Scripts live in the editor's per-object lists and are always addressed by
//! position, so duplicate scripts on one object are handled correctly.

use serde::{Deserialize, Serialize};

use crate::core::{EditorState, Script};
use crate::signals::ScriptEvent;
use super::{
    restore_target, Command, CommandError, CommandMeta, CommandRecord, CommandResult, CommandType,
    MergeTarget, RestoreContext,
};

fn require_object(state: &EditorState, object_uuid: &str) -> CommandResult {
    match state.object_by_uuid(object_uuid) {
        Some(_) => Ok(()),
        None => Err(CommandError::ObjectNotFound(object_uuid.to_string())),
    }
}

fn out_of_range(object_uuid: &str, index: usize) -> CommandError {
    CommandError::InvalidOperation(format!("object {} has no script #{}", object_uuid, index))
}

fn insert_script(state: &mut EditorState, object_uuid: &str, index: usize, script: Script) -> CommandResult {
    if index > state.scripts.get(object_uuid).map_or(0, Vec::len) {
        return Err(out_of_range(object_uuid, index));
    }
    state
        .scripts
        .entry(object_uuid.to_string())
        .or_default()
        .insert(index, script);
    state.signals.script_added.dispatch(&ScriptEvent {
        object: object_uuid.to_string(),
        index,
    });
    Ok(())
}

fn take_script(state: &mut EditorState, object_uuid: &str, index: usize) -> Result<Script, CommandError> {
    let scripts = state
        .scripts
        .get_mut(object_uuid)
        .filter(|scripts| index < scripts.len())
        .ok_or_else(|| out_of_range(object_uuid, index))?;
    let script = scripts.remove(index);
    if scripts.is_empty() {
        state.scripts.remove(object_uuid);
    }
    state.signals.script_removed.dispatch(&ScriptEvent {
        object: object_uuid.to_string(),
        index,
    });
    Ok(script)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptPayload {
    object_uuid: String,
    script: Script,
    #[serde(default)]
    index: Option<usize>,
}

/// Command to append a script to an object.
#[derive(Default)]
pub struct AddScriptCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub script: Script,
    /// Where execute put the script
    index: Option<usize>,
}

impl AddScriptCommand {
    pub fn new(state: &EditorState, object_uuid: &str, script: Script) -> Result<Self, CommandError> {
        require_object(state, object_uuid)?;
        Ok(Self {
            meta: CommandMeta::new("Add Script"),
            object_uuid: object_uuid.to_string(),
            script,
            index: None,
        })
    }
}

impl CommandType for AddScriptCommand {
    const TYPE: &'static str = "AddScriptCommand";
}

impl Command for AddScriptCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        require_object(state, &self.object_uuid)?;
        let index = state.scripts_for(&self.object_uuid).len();
        insert_script(state, &self.object_uuid, index, self.script.clone())?;
        self.index = Some(index);
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        let index = self.index.ok_or_else(|| {
            CommandError::InvalidOperation("script was never added".to_string())
        })?;
        take_script(state, &self.object_uuid, index)?;
        Ok(())
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &ScriptPayload {
                object_uuid: self.object_uuid.clone(),
                script: self.script.clone(),
                index: self.index,
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: ScriptPayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.script = payload.script;
        // Records without an index point at the last script, where execute
        // would have put it.
        self.index = payload
            .index
            .or_else(|| ctx.state.scripts_for(&self.object_uuid).len().checked_sub(1));
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

/// Command to detach the script at a position from an object.
#[derive(Default)]
pub struct RemoveScriptCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub index: usize,
    script: Script,
}

impl RemoveScriptCommand {
    pub fn new(state: &EditorState, object_uuid: &str, index: usize) -> Result<Self, CommandError> {
        require_object(state, object_uuid)?;
        let script = state
            .scripts_for(object_uuid)
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(object_uuid, index))?;

        Ok(Self {
            meta: CommandMeta::new("Remove Script"),
            object_uuid: object_uuid.to_string(),
            index,
            script,
        })
    }

    pub fn script(&self) -> &Script {
        &self.script
    }
}

impl CommandType for RemoveScriptCommand {
    const TYPE: &'static str = "RemoveScriptCommand";
}

impl Command for RemoveScriptCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        take_script(state, &self.object_uuid, self.index)?;
        Ok(())
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        require_object(state, &self.object_uuid)?;
        insert_script(state, &self.object_uuid, self.index, self.script.clone())
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &ScriptPayload {
                object_uuid: self.object_uuid.clone(),
                script: self.script.clone(),
                index: Some(self.index),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: ScriptPayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.script = payload.script;
        self.index = payload
            .index
            .ok_or_else(|| CommandError::MalformedRecord("RemoveScriptCommand: missing index".into()))?;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptValuePayload {
    object_uuid: String,
    index: usize,
    attribute_name: String,
    old_value: String,
    new_value: String,
}

/// Command to edit a script's `name` or `source`.
///
/// Keystrokes in the script editor arrive as a stream of these; they
/// coalesce regardless of any merge window.
#[derive(Default)]
pub struct SetScriptValueCommand {
    meta: CommandMeta,
    pub object_uuid: String,
    pub index: usize,
    pub attribute_name: String,
    pub new_value: String,
    old_value: String,
}

impl SetScriptValueCommand {
    pub fn new(
        state: &EditorState,
        object_uuid: &str,
        index: usize,
        attribute_name: &str,
        new_value: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let script = state
            .scripts_for(object_uuid)
            .get(index)
            .ok_or_else(|| out_of_range(object_uuid, index))?;
        let old_value = script.attribute(attribute_name).ok_or_else(|| {
            CommandError::InvalidOperation(format!("scripts have no '{}' attribute", attribute_name))
        })?;

        Ok(Self {
            meta: CommandMeta::new(format!("Set Script Value: {}", attribute_name)),
            object_uuid: object_uuid.to_string(),
            index,
            attribute_name: attribute_name.to_string(),
            new_value: new_value.into(),
            old_value: old_value.to_string(),
        })
    }

    fn write(&self, state: &mut EditorState, value: &str) -> CommandResult {
        let script = state
            .scripts
            .get_mut(&self.object_uuid)
            .and_then(|scripts| scripts.get_mut(self.index))
            .ok_or_else(|| out_of_range(&self.object_uuid, self.index))?;
        if !script.set_attribute(&self.attribute_name, value.to_string()) {
            return Err(CommandError::InvalidOperation(format!(
                "scripts have no '{}' attribute",
                self.attribute_name
            )));
        }
        state.signals.script_changed.dispatch(&ScriptEvent {
            object: self.object_uuid.clone(),
            index: self.index,
        });
        Ok(())
    }
}

impl CommandType for SetScriptValueCommand {
    const TYPE: &'static str = "SetScriptValueCommand";
}

impl Command for SetScriptValueCommand {
    command_basics!();

    fn execute(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, &self.new_value)
    }

    fn undo(&mut self, state: &mut EditorState) -> CommandResult {
        self.write(state, &self.old_value)
    }

    fn merge_target(&self) -> Option<MergeTarget> {
        Some(MergeTarget::new(
            &self.object_uuid,
            format!("scripts[{}].{}", self.index, self.attribute_name),
        ))
    }

    fn ignores_merge_window(&self) -> bool {
        true
    }

    fn update(&mut self, newer: &dyn Command) {
        if let Some(newer) = newer.as_any().downcast_ref::<Self>() {
            self.new_value = newer.new_value.clone();
        }
    }

    fn to_json(&self, _state: &EditorState) -> Result<CommandRecord, CommandError> {
        CommandRecord::new(
            self,
            &ScriptValuePayload {
                object_uuid: self.object_uuid.clone(),
                index: self.index,
                attribute_name: self.attribute_name.clone(),
                old_value: self.old_value.clone(),
                new_value: self.new_value.clone(),
            },
        )
    }

    fn from_json(&mut self, record: &CommandRecord, ctx: &RestoreContext<'_>) -> CommandResult {
        let payload: ScriptValuePayload = record.payload()?;
        self.object_uuid = payload.object_uuid;
        self.index = payload.index;
        self.attribute_name = payload.attribute_name;
        self.old_value = payload.old_value;
        self.new_value = payload.new_value;
        restore_target(&mut self.meta, record, ctx, &self.object_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::Object3D;

    fn state() -> EditorState {
        let mut state = EditorState::new();
        state.add_object(Object3D::group("Player").with_uuid("player"), None, None).unwrap();
        state
    }

    fn names(state: &EditorState) -> Vec<&str> {
        state.scripts_for("player").iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_add_then_undo_removes_by_index() {
        let mut state = state();
        let mut first = AddScriptCommand::new(&state, "player", Script::new("move", "")).unwrap();
        let mut second = AddScriptCommand::new(&state, "player", Script::new("move", "")).unwrap();
        first.execute(&mut state).unwrap();
        second.execute(&mut state).unwrap();
        assert_eq!(names(&state), vec!["move", "move"]);

        second.undo(&mut state).unwrap();
        first.undo(&mut state).unwrap();
        assert!(state.scripts.is_empty());
    }

    #[test]
    fn test_insert_past_end_leaves_no_entry() {
        let mut state = state();
        let result = insert_script(&mut state, "player", 2, Script::new("late", ""));
        assert!(matches!(result, Err(CommandError::InvalidOperation(_))));
        assert!(!state.scripts.contains_key("player"));

        for name in ["move", "jump"] {
            AddScriptCommand::new(&state, "player", Script::new(name, ""))
                .unwrap()
                .execute(&mut state)
                .unwrap();
        }
        let mut remove = RemoveScriptCommand::new(&state, "player", 1).unwrap();
        remove.execute(&mut state).unwrap();
        take_script(&mut state, "player", 0).unwrap();
        assert!(state.scripts.is_empty());

        assert!(remove.undo(&mut state).is_err());
        assert!(state.scripts.is_empty());
    }

    #[test]
    fn test_remove_restores_position() {
        let mut state = state();
        state.scripts.insert(
            "player".into(),
            vec![Script::new("a", ""), Script::new("b", ""), Script::new("c", "")],
        );

        let mut cmd = RemoveScriptCommand::new(&state, "player", 1).unwrap();
        cmd.execute(&mut state).unwrap();
        assert_eq!(names(&state), vec!["a", "c"]);
        cmd.undo(&mut state).unwrap();
        assert_eq!(names(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_script_value() {
        let mut state = state();
        state.scripts.insert("player".into(), vec![Script::new("a", "old()")]);

        let mut cmd = SetScriptValueCommand::new(&state, "player", 0, "source", "new()").unwrap();
        assert!(cmd.ignores_merge_window());
        cmd.execute(&mut state).unwrap();
        assert_eq!(state.scripts_for("player")[0].source, "new()");
        cmd.undo(&mut state).unwrap();
        assert_eq!(state.scripts_for("player")[0].source, "old()");

        assert!(SetScriptValueCommand::new(&state, "player", 0, "language", "lua").is_err());
        assert!(SetScriptValueCommand::new(&state, "player", 3, "source", "").is_err());
    }
}
