//! Click-to-place polyline drawing.
//!
//! Each primary press adds a vertex. Pressing on the last vertex again, or
//! Enter, finishes the line once it has two vertices. Escape cancels and
//! Backspace removes the last vertex.

use annotator_geometry::{GeometryError, Point, path};

use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::constants::MIN_LINE_VERTICES;
use crate::error::{CreationError, EngineError};
use crate::keybindings::KeyCode;
use crate::model::{AnnotationData, LineData};

#[derive(Debug, Default)]
pub struct LineTool {
    points: Vec<Point>,
    cursor: Option<Point>,
}

impl LineTool {
    pub const NAME: &'static str = "line";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    fn finish(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        let line = path::normalize(&self.points);
        if line.len() < MIN_LINE_VERTICES {
            return Err(CreationError::from(GeometryError::TooFewVertices {
                min: MIN_LINE_VERTICES,
                found: line.len(),
            })
            .into());
        }
        let count = line.len();
        let id = ctx.create(AnnotationData::Line(LineData { path: line }))?;
        log::debug!("📐 Line {} finished with {} vertices", id, count);
        self.reset();
        Ok(())
    }
}

impl Tool for LineTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset(&mut self) {
        self.points.clear();
        self.cursor = None;
    }

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match event.kind {
            PointerEventKind::Move => self.cursor = Some(event.position),
            PointerEventKind::Down if event.is_primary() => {
                let radius = ctx.image_radius(ctx.editing.polygon_close_threshold);
                let on_last = self
                    .points
                    .last()
                    .is_some_and(|last| last.distance_to(&event.position) <= radius);
                if on_last && self.points.len() >= MIN_LINE_VERTICES {
                    return self.finish(ctx);
                }
                self.points.push(event.position);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_key(&mut self, event: &KeyEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        if event.kind != KeyEventKind::Press {
            return Ok(());
        }
        match event.chord.key {
            KeyCode::Escape => self.reset(),
            KeyCode::Enter => return self.finish(ctx),
            KeyCode::Backspace => {
                self.points.pop();
            }
            _ => {}
        }
        Ok(())
    }
}
