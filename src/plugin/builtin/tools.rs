use crate::error::EngineError;
use crate::keybindings::Keybinding;
use crate::model::AnnotationType;
use crate::plugin::{Plugin, PluginContext};
use crate::serializer::builtin_serializer;
use crate::tool::{
    BoundingBoxTool, CuboidTool, DirectionalVectorTool, EllipseTool, KeypointTool, LineTool, PolygonTool,
    RegisteredTool, SkeletonTool, ToolDescriptor, ToolKind,
};

/// A plugin contributing one drawing tool, a `tool.<name>` command bound to
/// a single key, and serializers for the types the tool produces.
pub struct ToolPlugin {
    name: &'static str,
    key: &'static str,
    kind: ToolKind,
    produces: &'static [AnnotationType],
    make: fn() -> RegisteredTool,
}

impl ToolPlugin {
    pub fn polygon() -> Self {
        Self {
            name: PolygonTool::NAME,
            key: "p",
            kind: ToolKind::Base,
            produces: &[AnnotationType::Polygon],
            make: || RegisteredTool::Base(Box::new(PolygonTool::new())),
        }
    }

    pub fn bounding_box() -> Self {
        Self {
            name: BoundingBoxTool::NAME,
            key: "b",
            kind: ToolKind::Base,
            produces: &[AnnotationType::BoundingBox],
            make: || RegisteredTool::Base(Box::new(BoundingBoxTool::new())),
        }
    }

    pub fn keypoint() -> Self {
        Self {
            name: KeypointTool::NAME,
            key: "k",
            kind: ToolKind::Base,
            produces: &[AnnotationType::Keypoint],
            make: || RegisteredTool::Base(Box::new(KeypointTool::new())),
        }
    }

    pub fn line() -> Self {
        Self {
            name: LineTool::NAME,
            key: "l",
            kind: ToolKind::Base,
            produces: &[AnnotationType::Line],
            make: || RegisteredTool::Base(Box::new(LineTool::new())),
        }
    }

    pub fn ellipse() -> Self {
        Self {
            name: EllipseTool::NAME,
            key: "o",
            kind: ToolKind::Base,
            produces: &[AnnotationType::Ellipse],
            make: || RegisteredTool::Base(Box::new(EllipseTool::new())),
        }
    }

    pub fn cuboid() -> Self {
        Self {
            name: CuboidTool::NAME,
            key: "u",
            kind: ToolKind::Base,
            produces: &[AnnotationType::Cuboid],
            make: || RegisteredTool::Base(Box::new(CuboidTool::new())),
        }
    }

    pub fn skeleton() -> Self {
        Self {
            name: SkeletonTool::NAME,
            key: "j",
            kind: ToolKind::Base,
            produces: &[AnnotationType::Skeleton],
            make: || RegisteredTool::Base(Box::new(SkeletonTool::new())),
        }
    }

    pub fn directional_vector() -> Self {
        Self {
            name: DirectionalVectorTool::NAME,
            key: "v",
            kind: ToolKind::SubAnnotation,
            produces: &[AnnotationType::DirectionalVector],
            make: || RegisteredTool::SubAnnotation(Box::new(DirectionalVectorTool::new())),
        }
    }
}

/// Command id that activates a tool.
pub fn tool_command(name: &str) -> String {
    format!("tool.{}", name)
}

impl Plugin for ToolPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        let command = tool_command(self.name);
        let name = self.name;
        ctx.register_command(&command, move |core| core.activate_tool(name));

        let descriptor = ToolDescriptor::new(self.name, self.kind)
            .produces(self.produces)
            .with_keybinding(Keybinding::press(self.key, &command)?);
        ctx.register_tool(descriptor, (self.make)());

        for ty in self.produces {
            ctx.register_serializer(builtin_serializer(*ty));
        }
        Ok(())
    }
}
