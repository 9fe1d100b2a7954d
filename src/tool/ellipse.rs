//! Drag-out ellipse drawing.
//!
//! The press and release points are opposite ends of a diameter. The result
//! is a circle rotated so that its x semi-axis points at the release point.

use annotator_geometry::Point;

use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::error::EngineError;
use crate::keybindings::KeyCode;
use crate::model::{AnnotationData, EllipseData};

/// Ellipse spanning the diameter `start`-`end`.
pub fn ellipse_from_diameter(start: Point, end: Point) -> EllipseData {
    let center = start.midpoint(&end);
    let offset = end - center;
    let r = offset.length();
    EllipseData {
        angle: offset.angle(),
        center,
        radius: Point::new(r, r),
    }
}

#[derive(Debug, Default)]
pub struct EllipseTool {
    start: Option<Point>,
    current: Option<Point>,
}

impl EllipseTool {
    pub const NAME: &'static str = "ellipse";

    pub fn new() -> Self {
        Self::default()
    }

    /// Ellipse being dragged, if any.
    pub fn preview(&self) -> Option<EllipseData> {
        Some(ellipse_from_diameter(self.start?, self.current?))
    }
}

impl Tool for EllipseTool {
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

                let diameter = start.distance_to(&event.position);
                if diameter < ctx.editing.min_bbox_size {
                    log::debug!("Discarding ellipse with diameter {:.2}", diameter);
                    return Ok(());
                }
                ctx.create(AnnotationData::Ellipse(ellipse_from_diameter(start, event.position)))?;
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
