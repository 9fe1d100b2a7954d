//! Physical size of the selected annotation as a measures sub-annotation.

use annotator_geometry::Point;

use crate::action::Action;
use crate::editor::EditorCore;
use crate::error::{CreationError, EngineError};
use crate::keybindings::Keybinding;
use crate::model::{AnnotationData, AnnotationType, MeasuresData};
use crate::plugin::{Plugin, PluginContext};
use crate::serializer::builtin_serializer;

pub const ATTACH: &str = "measures.attach";

pub struct MeasuresPlugin;

impl Plugin for MeasuresPlugin {
    fn name(&self) -> &'static str {
        "measures"
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        ctx.register_serializer(builtin_serializer(AnnotationType::Measures));
        ctx.register_command(ATTACH, attach);
        ctx.register_keybinding(Keybinding::press("ctrl+m", ATTACH)?);
        Ok(())
    }
}

/// Attach or refresh measures on the selected annotation.
///
/// The delta is the annotation's bounding box scaled by the configured pixel
/// spacing.
fn attach(core: &mut EditorCore) -> Result<(), EngineError> {
    let spacing = core.config().measures.pixel_spacing;
    let unit = core.config().measures.unit.clone();
    let view = core.view_mut()?;
    let annotation = view.selected().ok_or(EngineError::NothingSelected)?;
    view.classes()
        .require(Some(annotation.class_id), AnnotationType::Measures)?;
    let bounds = annotation
        .data
        .bounds()
        .ok_or_else(|| CreationError::NoExtent(annotation.id.clone()))?;

    let measures = AnnotationData::Measures(MeasuresData {
        delta: Point::new(bounds.width() * spacing.x, bounds.height() * spacing.y),
        unit,
    });
    let id = annotation.id.clone();
    log::debug!("📐 Measures for {}: {:?}", id, measures);
    let action = Action::set_sub(view.collection(), &id, AnnotationType::Measures, Some(measures))?;
    view.perform(action)?;
    Ok(())
}
