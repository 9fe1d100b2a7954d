//! Two-drag cuboid drawing: the first drag lays out the front face, the
//! second the back face.

use annotator_geometry::{Point, Rect};

use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::error::EngineError;
use crate::keybindings::KeyCode;
use crate::model::{AnnotationData, BoundingBoxData, CuboidData};

#[derive(Debug, Default)]
pub struct CuboidTool {
    /// Front face, once its drag is done
    front: Option<BoundingBoxData>,
    start: Option<Point>,
    current: Option<Point>,
}

impl CuboidTool {
    pub const NAME: &'static str = "cuboid";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn front(&self) -> Option<&BoundingBoxData> {
        self.front.as_ref()
    }

    /// Face being dragged, if any.
    pub fn preview(&self) -> Option<Rect> {
        Some(Rect::from_corners(self.start?, self.current?))
    }
}

impl Tool for CuboidTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset(&mut self) {
        self.front = None;
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
                let Some(start) = self.start.take() else {
                    return Ok(());
                };
                self.current = None;

                let rect = Rect::from_corners(start, event.position);
                let min = ctx.editing.min_bbox_size;
                if rect.width() < min || rect.height() < min {
                    // Only the face being dragged is dropped
                    log::debug!("Discarding {}x{} cuboid face below minimum size", rect.width(), rect.height());
                    return Ok(());
                }
                let face = BoundingBoxData::from_rect(&rect);
                match self.front.take() {
                    None => self.front = Some(face),
                    Some(front) => {
                        ctx.create(AnnotationData::Cuboid(CuboidData(front, face)))?;
                    }
                }
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
