//! Plugins shipped with the engine.
//!
//! | plugin               | provides                                         |
//! |----------------------|--------------------------------------------------|
//! | `annotation_types`   | serializers for types without a dedicated plugin |
//! | `polygon`            | polygon tool                                     |
//! | `bounding_box`       | bounding box tool                                |
//! | `keypoint`           | keypoint tool                                    |
//! | `line`               | polyline tool                                    |
//! | `ellipse`            | ellipse tool                                     |
//! | `cuboid`             | two-face cuboid tool                             |
//! | `skeleton`           | skeleton tool using the class node layout        |
//! | `directional_vector` | direction sub-annotation tool                    |
//! | `edit`               | vertex editing tool, polygon and z-order commands|
//! | `measures`           | measures serializer and attach command           |
//! | `mask`               | mask serializers and rasterize command           |
//! | `clipboard`          | copy, cut and paste commands                     |
//! | `video_player`       | playback commands                                |

mod annotation_types;
mod clipboard;
mod edit;
mod mask;
mod measures;
mod tools;
mod video_player;

pub use annotation_types::AnnotationTypesPlugin;
pub use clipboard::ClipboardPlugin;
pub use edit::EditPlugin;
pub use mask::MaskPlugin;
pub use measures::MeasuresPlugin;
pub use tools::ToolPlugin;
pub use video_player::VideoPlayerPlugin;

use super::Plugin;
use crate::editor::EditorCore;
use crate::error::EngineError;
use crate::model::AnnotationId;
use crate::view::View;

/// Every built-in plugin, in activation order.
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(AnnotationTypesPlugin),
        Box::new(ToolPlugin::polygon()),
        Box::new(ToolPlugin::bounding_box()),
        Box::new(ToolPlugin::keypoint()),
        Box::new(ToolPlugin::line()),
        Box::new(ToolPlugin::ellipse()),
        Box::new(ToolPlugin::cuboid()),
        Box::new(ToolPlugin::skeleton()),
        Box::new(ToolPlugin::directional_vector()),
        Box::new(EditPlugin),
        Box::new(MeasuresPlugin),
        Box::new(MaskPlugin),
        Box::new(ClipboardPlugin::default()),
        Box::new(VideoPlayerPlugin),
    ]
}

/// First selected annotation that still exists.
fn selected_id(core: &EditorCore) -> Result<AnnotationId, EngineError> {
    core.view()?
        .selected()
        .map(|a| a.id.clone())
        .ok_or(EngineError::NothingSelected)
}

/// First two selected annotations, in selection order.
fn selected_pair(view: &View) -> Result<(AnnotationId, AnnotationId), EngineError> {
    let collection = view.collection();
    let mut ids = view.selection().iter().filter(|id| collection.get(id).is_some());
    match (ids.next(), ids.next()) {
        (Some(first), Some(second)) => Ok((first.clone(), second.clone())),
        _ => Err(EngineError::NothingSelected),
    }
}
