//! Click-to-place polygon drawing.
//!
//! Each primary press adds a vertex. Pressing near the first vertex (or
//! hitting Enter) closes the polygon once it has at least three vertices.
//! Escape cancels, Backspace removes the last vertex.

use annotator_geometry::{GeometryError, Path, Point, path};

use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::constants::MIN_POLYGON_VERTICES;
use crate::error::{CreationError, EngineError};
use crate::keybindings::KeyCode;
use crate::model::{AnnotationData, PolygonData};

/// Clean up a drawn path and check that it can be a polygon ring.
pub fn validate_ring(points: &[Point]) -> Result<Path, GeometryError> {
    let ring = path::normalize(points);
    if ring.len() < MIN_POLYGON_VERTICES {
        return Err(GeometryError::TooFewVertices {
            min: MIN_POLYGON_VERTICES,
            found: ring.len(),
        });
    }
    if !path::is_simple(&ring) {
        return Err(GeometryError::SelfIntersecting);
    }
    if path::area(&ring) <= path::EPSILON {
        return Err(GeometryError::ZeroArea);
    }
    Ok(ring)
}

#[derive(Debug, Default)]
pub struct PolygonTool {
    /// Vertices placed so far
    points: Vec<Point>,
    /// Last pointer position, for the rubber-band preview
    cursor: Option<Point>,
}

impl PolygonTool {
    pub const NAME: &'static str = "polygon";

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
        let ring = validate_ring(&self.points).map_err(CreationError::from)?;
        let id = ctx.create(AnnotationData::Polygon(PolygonData::new(ring)))?;
        log::debug!("📐 Polygon {} closed with {} vertices", id, self.points.len());
        self.reset();
        Ok(())
    }
}

impl Tool for PolygonTool {
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
                let close_radius = ctx.image_radius(ctx.editing.polygon_close_threshold);
                let closes = self.points.len() >= MIN_POLYGON_VERTICES
                    && self.points[0].distance_to(&event.position) <= close_radius;
                if closes {
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
