use crate::error::EngineError;
use crate::model::AnnotationType;
use crate::plugin::{Plugin, PluginContext};
use crate::serializer::builtin_serializer;

/// Types that are read and written but have no drawing tool of their own.
const TYPES: &[AnnotationType] = &[
    AnnotationType::Tag,
    AnnotationType::Attributes,
    AnnotationType::Text,
    AnnotationType::InstanceId,
];

pub struct AnnotationTypesPlugin;

impl Plugin for AnnotationTypesPlugin {
    fn name(&self) -> &'static str {
        "annotation_types"
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        for ty in TYPES {
            ctx.register_serializer(builtin_serializer(*ty));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::editor::Editor;
    use crate::model::ClassCatalog;

    #[test]
    fn test_builtin_plugins_cover_every_type() {
        let editor = Editor::with_builtin_plugins(EngineConfig::default(), ClassCatalog::default()).unwrap();
        for ty in AnnotationType::all() {
            assert!(editor.core().serializers().contains(*ty), "{} has no serializer", ty);
        }
    }
}
