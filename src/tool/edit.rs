//! Selection and vertex editing.
//!
//! Pressing on an annotation selects it (shift toggles). Hovering a vertex of
//! a polygon or line lets it be dragged, or deleted with alt+press. A drag
//! only mutates the collection on release, as a single update action.

use annotator_geometry::{GeometryError, path};

use super::vertex::{self, EditContext, VertexEditState};
use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext, VertexEditingTool};
use crate::action::Action;
use crate::error::{CreationError, EngineError};
use crate::keybindings::KeyCode;
use crate::model::AnnotationData;

#[derive(Debug, Default)]
pub struct EditTool {
    state: VertexEditState,
}

impl EditTool {
    pub const NAME: &'static str = "edit";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &VertexEditState {
        &self.state
    }

    fn on_move(&mut self, event: &PointerEvent, ctx: &ToolContext<'_>) {
        let radius = ctx.image_radius(ctx.editing.vertex_hit_radius);
        let under = vertex::vertex_at(ctx.view, &event.position, radius);
        match &mut self.state {
            VertexEditState::Dragging { position, .. } => *position = event.position,
            VertexEditState::DeleteArmed(armed) => {
                if under.as_ref() != Some(&*armed) {
                    self.state = VertexEditState::Idle;
                }
            }
            _ => {
                self.state = under.map_or(VertexEditState::Idle, VertexEditState::Hovering);
            }
        }
    }

    fn on_down(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        if let VertexEditState::Hovering(hovered) = &self.state {
            let hovered = hovered.clone();
            if event.modifiers.alt {
                self.state = VertexEditState::DeleteArmed(hovered);
            } else {
                let (_, annotation) = ctx.view.collection().require(&hovered.annotation)?;
                self.state = VertexEditState::Dragging {
                    original: annotation.data.clone(),
                    vertex: hovered,
                    position: event.position,
                };
            }
            return Ok(());
        }

        let radius = ctx.image_radius(ctx.editing.annotation_hit_radius);
        let hit = ctx.view.annotation_at(&event.position, radius).map(|a| a.id.clone());
        match (hit, event.modifiers.shift) {
            (Some(id), true) => ctx.view.toggle_selection(id),
            (Some(id), false) => ctx.view.select(id),
            (None, false) => ctx.view.clear_selection(),
            (None, true) => {}
        }
        Ok(())
    }

    fn on_up(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match std::mem::take(&mut self.state) {
            VertexEditState::Dragging {
                vertex: moved,
                original,
                position,
            } => {
                self.state = VertexEditState::Hovering(moved.clone());
                let Some(next) = vertex::moved_vertex(&original, moved.index, position) else {
                    return Ok(());
                };
                if next == original {
                    return Ok(());
                }
                if let AnnotationData::Polygon(polygon) = &next {
                    if !path::is_weakly_simple(&polygon.path) {
                        return Err(CreationError::Geometry(GeometryError::SelfIntersecting).into());
                    }
                }
                ctx.view.perform(Action::UpdateData {
                    id: moved.annotation,
                    previous: original,
                    next,
                })?;
            }
            armed @ VertexEditState::DeleteArmed(_) => {
                vertex::delete_vertex(ctx.view, armed.context().as_ref())?;
            }
            other => self.state = other,
        }
        Ok(())
    }
}

impl Tool for EditTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset(&mut self) {
        self.state = VertexEditState::Idle;
    }

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match event.kind {
            PointerEventKind::Move => {
                self.on_move(event, ctx);
                Ok(())
            }
            PointerEventKind::Down if event.is_primary() => self.on_down(event, ctx),
            PointerEventKind::Up => self.on_up(ctx),
            PointerEventKind::Down => Ok(()),
        }
    }

    fn on_key(&mut self, event: &KeyEvent, _ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        if event.kind == KeyEventKind::Press && event.chord.key == KeyCode::Escape {
            self.reset();
        }
        Ok(())
    }
}

impl VertexEditingTool for EditTool {
    fn edit_context(&self) -> Option<EditContext> {
        self.state.context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditingConfig;
    use crate::keybindings::Modifiers;
    use crate::model::{Annotation, AnnotationClass, AnnotationType, ClassCatalog, PolygonData};
    use crate::tool::vertex::VertexRef;
    use crate::view::{FrameContext, View};
    use annotator_geometry::Point;
    use std::sync::Arc;

    fn view() -> View {
        let classes = ClassCatalog::new(vec![AnnotationClass::new(1, "c", [0, 0, 0], AnnotationType::Polygon)]);
        let mut view = View::new(Arc::new(classes), 10, FrameContext::image(100, 100));
        let square = vec![
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(30.0, 30.0),
            Point::new(10.0, 30.0),
        ];
        let annotation = Annotation::with_id("p".into(), 1, AnnotationData::Polygon(PolygonData::new(square)));
        let action = Action::append(view.collection(), annotation);
        view.perform(action).unwrap();
        view
    }

    fn path_of(view: &View) -> Vec<Point> {
        view.collection().get(&"p".into()).unwrap().data.path().unwrap().clone()
    }

    #[test]
    fn test_drag_vertex_is_one_action() {
        let mut view = view();
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = EditTool::new();
        tool.on_pointer(&PointerEvent::moved(Point::new(30.5, 30.5)), &mut ctx).unwrap();
        assert_eq!(
            tool.edit_context(),
            Some(EditContext::Hover(VertexRef {
                annotation: "p".into(),
                index: 2
            }))
        );
        tool.on_pointer(&PointerEvent::down(Point::new(30.5, 30.5)), &mut ctx).unwrap();
        tool.on_pointer(&PointerEvent::moved(Point::new(35.0, 32.0)), &mut ctx).unwrap();
        tool.on_pointer(&PointerEvent::moved(Point::new(40.0, 40.0)), &mut ctx).unwrap();
        assert!(matches!(tool.edit_context(), Some(EditContext::Move { .. })));
        tool.on_pointer(&PointerEvent::up(Point::new(40.0, 40.0)), &mut ctx).unwrap();

        assert_eq!(path_of(&view)[2], Point::new(40.0, 40.0));
        assert_eq!(view.actions().undo_count(), 2);
        view.undo().unwrap();
        assert_eq!(path_of(&view)[2], Point::new(30.0, 30.0));
    }

    #[test]
    fn test_alt_press_deletes_vertex() {
        let mut view = view();
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = EditTool::new();
        tool.on_pointer(&PointerEvent::moved(Point::new(10.0, 10.0)), &mut ctx).unwrap();
        tool.on_pointer(
            &PointerEvent::down(Point::new(10.0, 10.0)).with_modifiers(Modifiers::alt()),
            &mut ctx,
        )
        .unwrap();
        assert!(vertex::as_delete_vertex(tool.edit_context().as_ref()).is_some());
        tool.on_pointer(&PointerEvent::up(Point::new(10.0, 10.0)), &mut ctx).unwrap();

        assert_eq!(tool.state(), &VertexEditState::Idle);
        assert_eq!(path_of(&view).len(), 3);
    }

    #[test]
    fn test_moving_away_disarms() {
        let mut view = view();
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = EditTool::new();
        tool.on_pointer(&PointerEvent::moved(Point::new(10.0, 10.0)), &mut ctx).unwrap();
        tool.on_pointer(
            &PointerEvent::down(Point::new(10.0, 10.0)).with_modifiers(Modifiers::alt()),
            &mut ctx,
        )
        .unwrap();
        tool.on_pointer(&PointerEvent::moved(Point::new(20.0, 20.0)), &mut ctx).unwrap();
        tool.on_pointer(&PointerEvent::up(Point::new(20.0, 20.0)), &mut ctx).unwrap();
        assert_eq!(path_of(&view).len(), 4);
    }

    #[test]
    fn test_click_selects() {
        let mut view = view();
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = EditTool::new();
        tool.on_pointer(&PointerEvent::down(Point::new(20.0, 20.0)), &mut ctx).unwrap();
        tool.on_pointer(&PointerEvent::up(Point::new(20.0, 20.0)), &mut ctx).unwrap();
        assert_eq!(ctx.view.selection().len(), 1);
        tool.on_pointer(&PointerEvent::down(Point::new(80.0, 80.0)), &mut ctx).unwrap();
        assert!(ctx.view.selection().is_empty());
    }
}
