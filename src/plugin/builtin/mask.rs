//! Mask annotations painted from polygons into the frame's raster layer.

use crate::action::Action;
use crate::editor::EditorCore;
use crate::error::{CreationError, EngineError};
use crate::keybindings::Keybinding;
use crate::model::raster::rasterize_polygon;
use crate::model::{Annotation, AnnotationData, AnnotationType, MaskData, Raster};
use crate::plugin::{Plugin, PluginContext};
use crate::serializer::builtin_serializer;

pub const RASTERIZE_SELECTED: &str = "mask.rasterize_selected";

pub struct MaskPlugin;

impl Plugin for MaskPlugin {
    fn name(&self) -> &'static str {
        "mask"
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        ctx.register_serializer(builtin_serializer(AnnotationType::Mask));
        ctx.register_serializer(builtin_serializer(AnnotationType::RasterLayer));
        ctx.register_command(RASTERIZE_SELECTED, rasterize_selected);
        ctx.register_keybinding(Keybinding::press("shift+r", RASTERIZE_SELECTED)?);
        Ok(())
    }
}

/// Paint the selected polygon as a new mask of the active class.
///
/// Creates the raster layer on first use. Masks whose pixels are all painted
/// over are deleted in the same undo step.
fn rasterize_selected(core: &mut EditorCore) -> Result<(), EngineError> {
    let active_class = core.active_class();
    let view = core.view_mut()?;
    let polygon = view.selected().ok_or(EngineError::NothingSelected)?;
    let AnnotationData::Polygon(data) = &polygon.data else {
        return Err(CreationError::WrongType {
            id: polygon.id.clone(),
            expected: AnnotationType::Polygon,
        }
        .into());
    };
    let rings = data.rings();
    let polygon_id = polygon.id.clone();
    let class_id = view.classes().require(active_class, AnnotationType::Mask)?.id;

    let frame = view.frame();
    let (layer, mut raster) = match view.raster()? {
        Some((annotation, raster)) => (Some(annotation.clone()), raster),
        None => (None, Raster::new(frame.width, frame.height)),
    };

    let mask = Annotation::new(class_id, AnnotationData::Mask(MaskData::default()));
    let label = raster.assign_label(&mask.id)?;
    let pixels = rasterize_polygon(&rings, frame.width, frame.height);
    if pixels.is_empty() {
        return Err(CreationError::NoExtent(polygon_id).into());
    }
    let emptied = raster.paint(&pixels, label);
    log::debug!(
        "🖼️ Rasterized {} into mask {} (label {}, {} px)",
        polygon_id,
        mask.id,
        label,
        raster.pixel_count(label)
    );

    let collection = view.collection();
    let mask_id = mask.id.clone();
    let mut actions = vec![Action::append(collection, mask)];
    let next_layer = AnnotationData::RasterLayer(raster.to_layer());
    match layer {
        Some(layer) => actions.push(Action::UpdateData {
            id: layer.id,
            previous: layer.data,
            next: next_layer,
        }),
        None => actions.push(Action::AddAnnotation {
            index: collection.len() + 1,
            annotation: Annotation::new(class_id, next_layer),
        }),
    }

    let mut deletes: Vec<(usize, Action)> = emptied
        .iter()
        .filter_map(|id| collection.index_of(id))
        .map(|index| {
            let annotation = collection.as_slice()[index].clone();
            (index, Action::DeleteAnnotation { index, annotation })
        })
        .collect();
    deletes.sort_by(|a, b| b.0.cmp(&a.0));
    actions.extend(deletes.into_iter().map(|(_, action)| action));

    view.perform(Action::Batch {
        description: "Rasterize polygon".to_string(),
        actions,
    })?;
    view.select(mask_id);
    Ok(())
}
