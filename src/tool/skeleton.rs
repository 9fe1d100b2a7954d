//! Skeleton placement by dragging a box.
//!
//! The active class carries the node layout; each node is placed at its
//! relative position inside the dragged box. Dragging right-to-left or
//! bottom-to-top mirrors the layout.

use annotator_geometry::Point;

use super::{KeyEvent, KeyEventKind, PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::error::{CreationError, EngineError};
use crate::keybindings::KeyCode;
use crate::model::{AnnotationData, AnnotationType, SkeletonData, SkeletonNode, SkeletonTemplateNode};

/// Lay `template` out over the box from `start` to `end`.
pub fn place_skeleton(template: &[SkeletonTemplateNode], start: Point, end: Point) -> SkeletonData {
    let size = end - start;
    let nodes = template
        .iter()
        .map(|node| SkeletonNode {
            name: node.name.clone(),
            x: start.x + node.x * size.x,
            y: start.y + node.y * size.y,
            occluded: false,
        })
        .collect();
    SkeletonData { nodes }
}

#[derive(Debug, Default)]
pub struct SkeletonTool {
    start: Option<Point>,
    current: Option<Point>,
}

impl SkeletonTool {
    pub const NAME: &'static str = "skeleton";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    fn place(&self, start: Point, end: Point, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        let class = ctx.view.classes().require(ctx.active_class, AnnotationType::Skeleton)?;
        if class.skeleton.is_empty() {
            return Err(CreationError::MissingSkeleton(class.name.clone()).into());
        }
        let data = place_skeleton(&class.skeleton, start, end);
        let id = ctx.create(AnnotationData::Skeleton(data))?;
        log::debug!("🦴 Skeleton {} placed", id);
        Ok(())
    }
}

impl Tool for SkeletonTool {
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

                let size = event.position - start;
                let min = ctx.editing.min_bbox_size;
                if size.x.abs() < min || size.y.abs() < min {
                    log::debug!("Discarding skeleton box {:.2}x{:.2}", size.x, size.y);
                    return Ok(());
                }
                self.place(start, event.position, ctx)?;
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
