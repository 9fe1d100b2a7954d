//! Press-drag-release rectangle drawing.

use annotator_geometry::{Point, Rect};

use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::error::EngineError;
use crate::keybindings::KeyCode;
use crate::model::{AnnotationData, BoundingBoxData};

#[derive(Debug, Default)]
pub struct BoundingBoxTool {
    start: Option<Point>,
    current: Option<Point>,
}

impl BoundingBoxTool {
    pub const NAME: &'static str = "bounding_box";

    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangle being dragged, if any.
    pub fn preview(&self) -> Option<Rect> {
        Some(Rect::from_corners(self.start?, self.current?))
    }
}

impl Tool for BoundingBoxTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset(&mut self) {
        self.start = None;
        self.current = None;
    }

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match event.kind {
            PointerEventKind::Down if event.is_primary() => {
                self.start = Some(event.position);
                self.current = Some(event.position);
            }
            PointerEventKind::Move if self.start.is_some() => self.current = Some(event.position),
            PointerEventKind::Up => {
                let Some(start) = self.start else {
                    return Ok(());
                };
                self.reset();

                let rect = Rect::from_corners(start, event.position);
                let min = ctx.editing.min_bbox_size;
                if rect.width() < min || rect.height() < min {
                    log::debug!("Discarding {}x{} box below minimum size", rect.width(), rect.height());
                    return Ok(());
                }
                ctx.create(AnnotationData::BoundingBox(BoundingBoxData::from_rect(&rect)))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_key(&mut self, event: &KeyEvent, _ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        if event.kind == KeyEventKind::Press && event.chord.key == KeyCode::Escape {
            self.reset();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditingConfig;
    use crate::model::{AnnotationClass, AnnotationType, ClassCatalog};
    use crate::view::{FrameContext, View};
    use std::sync::Arc;

    fn view() -> View {
        let classes = ClassCatalog::new(vec![AnnotationClass::new(4, "car", [255, 0, 0], AnnotationType::BoundingBox)]);
        View::new(Arc::new(classes), 10, FrameContext::image(100, 100))
    }

    #[test]
    fn test_drag_creates_box() {
        let mut view = view();
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: Some(4),
        };
        let mut tool = BoundingBoxTool::new();
        tool.on_pointer(&PointerEvent::down(Point::new(30.0, 40.0)), &mut ctx).unwrap();
        tool.on_pointer(&PointerEvent::moved(Point::new(20.0, 10.0)), &mut ctx).unwrap();
        assert_eq!(tool.preview().unwrap().width(), 10.0);
        tool.on_pointer(&PointerEvent::up(Point::new(10.0, 10.0)), &mut ctx).unwrap();

        assert_eq!(
            view.collection().as_slice()[0].data,
            AnnotationData::BoundingBox(BoundingBoxData { x: 10.0, y: 10.0, w: 20.0, h: 30.0 })
        );
    }

    #[test]
    fn test_tiny_box_is_discarded() {
        let mut view = view();
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: Some(4),
        };
        let mut tool = BoundingBoxTool::new();
        tool.on_pointer(&PointerEvent::down(Point::new(5.0, 5.0)), &mut ctx).unwrap();
        tool.on_pointer(&PointerEvent::up(Point::new(5.5, 9.0)), &mut ctx).unwrap();
        assert!(view.collection().is_empty());
    }
}
