//! Single-click keypoint placement.

use super::{PointerEvent, PointerEventKind, Tool, ToolContext};
use crate::error::EngineError;
use crate::model::{AnnotationData, KeypointData};

#[derive(Debug, Default)]
pub struct KeypointTool;

impl KeypointTool {
    pub const NAME: &'static str = "keypoint";

    pub fn new() -> Self {
        Self
    }
}

impl Tool for KeypointTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        if event.kind == PointerEventKind::Down && event.is_primary() {
            let p = event.position;
            ctx.create(AnnotationData::Keypoint(KeypointData { x: p.x, y: p.y }))?;
        }
        Ok(())
    }
}
