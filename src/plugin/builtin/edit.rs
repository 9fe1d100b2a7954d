//! Vertex editing tool plus commands acting on the selection.

use super::{selected_id, selected_pair};
use crate::action::{Action, polygon_ops};
use crate::editor::EditorCore;
use crate::error::EngineError;
use crate::keybindings::Keybinding;
use crate::plugin::{Plugin, PluginContext};
use crate::tool::{EditTool, RegisteredTool, ToolDescriptor, ToolKind, vertex};

pub const DELETE_VERTEX: &str = "edit.delete_vertex";
pub const MERGE: &str = "edit.merge";
pub const SUBTRACT: &str = "edit.subtract";
pub const INSERT_MIDPOINT: &str = "edit.insert_midpoint";
pub const BRING_TO_FRONT: &str = "edit.bring_to_front";
pub const SEND_TO_BACK: &str = "edit.send_to_back";

pub struct EditPlugin;

impl Plugin for EditPlugin {
    fn name(&self) -> &'static str {
        EditTool::NAME
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        let activate = super::tools::tool_command(EditTool::NAME);
        ctx.register_command(&activate, |core| core.activate_tool(EditTool::NAME));
        ctx.register_tool(
            ToolDescriptor::new(EditTool::NAME, ToolKind::VertexEditing).with_keybinding(Keybinding::press("e", &activate)?),
            RegisteredTool::VertexEditing(Box::new(EditTool::new())),
        );

        let commands: [(&str, &str, fn(&mut EditorCore) -> Result<(), EngineError>); 6] = [
            (DELETE_VERTEX, "shift+delete", delete_vertex),
            (MERGE, "shift+m", merge),
            (SUBTRACT, "shift+s", subtract),
            (INSERT_MIDPOINT, "shift+i", insert_midpoint),
            (BRING_TO_FRONT, "shift+f", bring_to_front),
            (SEND_TO_BACK, "shift+b", send_to_back),
        ];
        for (id, chord, run) in commands {
            ctx.register_command(id, run);
            ctx.register_keybinding(Keybinding::press(chord, id)?);
        }
        Ok(())
    }
}

/// Delete the vertex the active tool has armed for deletion.
fn delete_vertex(core: &mut EditorCore) -> Result<(), EngineError> {
    let context = core.tools().active_edit_context();
    vertex::delete_vertex(core.view_mut()?, context.as_ref())?;
    Ok(())
}

/// Replace the first two selected polygons with their union and select it.
fn merge(core: &mut EditorCore) -> Result<(), EngineError> {
    let view = core.view_mut()?;
    let (first, second) = selected_pair(view)?;
    let action = polygon_ops::merge(view.collection(), &first, &second)?;
    let merged = match &action {
        Action::Replace { added, .. } => added.first().map(|(_, a)| a.id.clone()),
        _ => None,
    };
    view.perform(action)?;
    if let Some(id) = merged {
        view.select(id);
    }
    Ok(())
}

/// Cut the second selected polygon out of the first.
fn subtract(core: &mut EditorCore) -> Result<(), EngineError> {
    let view = core.view_mut()?;
    let (first, second) = selected_pair(view)?;
    let action = polygon_ops::subtract(view.collection(), &first, &second)?;
    view.perform(action)?;
    Ok(())
}

fn insert_midpoint(core: &mut EditorCore) -> Result<(), EngineError> {
    let id = selected_id(core)?;
    vertex::insert_midpoint(core.view_mut()?, &id)
}

fn bring_to_front(core: &mut EditorCore) -> Result<(), EngineError> {
    let top = core.view()?.collection().len().saturating_sub(1);
    move_selected(core, top)
}

fn send_to_back(core: &mut EditorCore) -> Result<(), EngineError> {
    move_selected(core, 0)
}

fn move_selected(core: &mut EditorCore, to: usize) -> Result<(), EngineError> {
    let id = selected_id(core)?;
    let view = core.view_mut()?;
    if view.collection().index_of(&id) == Some(to) {
        return Ok(());
    }
    let action = Action::reorder(view.collection(), &id, to)?;
    view.perform(action)?;
    Ok(())
}
