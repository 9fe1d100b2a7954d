//! Copy, cut and paste of selected annotations.
//!
//! Pasted copies get fresh ids and are appended in one undo step, so the
//! same clipboard can be pasted any number of times.

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::Action;
use crate::editor::EditorCore;
use crate::error::EngineError;
use crate::keybindings::Keybinding;
use crate::model::{Annotation, AnnotationId};
use crate::plugin::{Plugin, PluginContext};

pub const COPY: &str = "clipboard.copy";
pub const CUT: &str = "clipboard.cut";
pub const PASTE: &str = "clipboard.paste";

type Contents = Rc<RefCell<Vec<Annotation>>>;

#[derive(Default)]
pub struct ClipboardPlugin {
    contents: Contents,
}

impl Plugin for ClipboardPlugin {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        let contents = Rc::clone(&self.contents);
        ctx.register_command(COPY, move |core| copy(core, &contents).map(|_| ()));

        let contents = Rc::clone(&self.contents);
        ctx.register_command(CUT, move |core| {
            copy(core, &contents)?;
            core.delete_selected()?;
            Ok(())
        });

        let contents = Rc::clone(&self.contents);
        ctx.register_command(PASTE, move |core| paste(core, &contents.borrow()));

        ctx.register_keybinding(Keybinding::press("ctrl+c", COPY)?);
        ctx.register_keybinding(Keybinding::press("ctrl+x", CUT)?);
        ctx.register_keybinding(Keybinding::press("ctrl+v", PASTE)?);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.contents.borrow_mut().clear();
    }
}

/// Replace the clipboard with the selected annotations, in selection order.
fn copy(core: &EditorCore, contents: &Contents) -> Result<usize, EngineError> {
    let view = core.view()?;
    let copied: Vec<Annotation> = view
        .selection()
        .iter()
        .filter_map(|id| view.collection().get(id).cloned())
        .collect();
    if copied.is_empty() {
        return Err(EngineError::NothingSelected);
    }
    log::debug!("📋 Copied {} annotations", copied.len());
    let count = copied.len();
    *contents.borrow_mut() = copied;
    Ok(count)
}

/// Append copies of the clipboard with fresh ids and select them.
fn paste(core: &mut EditorCore, contents: &[Annotation]) -> Result<(), EngineError> {
    if contents.is_empty() {
        log::debug!("Clipboard is empty, nothing to paste");
        return Ok(());
    }
    let view = core.view_mut()?;
    let start = view.collection().len();
    let pasted: Vec<Annotation> = contents
        .iter()
        .map(|a| Annotation {
            id: AnnotationId::generate(),
            ..a.clone()
        })
        .collect();
    let ids: Vec<AnnotationId> = pasted.iter().map(|a| a.id.clone()).collect();

    let actions = pasted
        .into_iter()
        .enumerate()
        .map(|(offset, annotation)| Action::AddAnnotation {
            index: start + offset,
            annotation,
        })
        .collect();
    view.perform(Action::Batch {
        description: format!("Paste {} annotations", ids.len()),
        actions,
    })?;

    view.clear_selection();
    for id in ids {
        view.toggle_selection(id);
    }
    Ok(())
}
