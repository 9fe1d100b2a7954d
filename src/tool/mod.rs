//! Tools and the tool manager.
//!
//! A tool turns pointer and key events into actions on the active view. Tools
//! come in three capability variants, held in [`RegisteredTool`] and
//! dispatched by `match`:
//!
//! - **Base**: plain drawing tools (polygon, bounding box, keypoint, line,
//!   ellipse, cuboid, skeleton)
//! - **SubAnnotation**: tools that attach data to a master annotation
//! - **VertexEditing**: tools that expose a vertex [`EditContext`]
//!
//! At most one tool is active. Events reach only the active tool and are
//! dropped when there is none.

mod bounding_box;
mod cuboid;
mod directional_vector;
mod edit;
mod ellipse;
mod event;
mod keypoint;
mod line;
mod polygon;
mod skeleton;
pub mod vertex;

use std::collections::HashMap;

pub use bounding_box::BoundingBoxTool;
pub use cuboid::CuboidTool;
pub use directional_vector::DirectionalVectorTool;
pub use edit::EditTool;
pub use ellipse::{EllipseTool, ellipse_from_diameter};
pub use event::{KeyEvent, KeyEventKind, MouseButton, PointerEvent, PointerEventKind};
pub use keypoint::KeypointTool;
pub use line::LineTool;
pub use polygon::PolygonTool;
pub use skeleton::{SkeletonTool, place_skeleton};
pub use vertex::{EditContext, VertexEditState};

use crate::action::Action;
use crate::config::EditingConfig;
use crate::error::EngineError;
use crate::keybindings::Keybinding;
use crate::model::{Annotation, AnnotationData, AnnotationId, AnnotationType};
use crate::plugin::HandleId;
use crate::view::View;

// ============================================================================
// Tool traits
// ============================================================================

/// What a tool can touch while handling an event.
pub struct ToolContext<'a> {
    pub view: &'a mut View,
    pub editing: &'a EditingConfig,
    /// Class new annotations are created with
    pub active_class: Option<u32>,
}

impl ToolContext<'_> {
    /// Image-space radius for a threshold given in canvas pixels.
    pub fn image_radius(&self, canvas_radius: f64) -> f64 {
        self.view.image_radius(canvas_radius)
    }

    /// Create an annotation of the active class, append it and select it.
    pub fn create(&mut self, data: AnnotationData) -> Result<AnnotationId, EngineError> {
        let class_id = self.view.classes().require(self.active_class, data.ty())?.id;
        let annotation = Annotation::new(class_id, data);
        let id = annotation.id.clone();
        let action = Action::append(self.view.collection(), annotation);
        self.view.perform(action)?;
        self.view.select(id.clone());
        Ok(id)
    }
}

pub trait Tool {
    fn name(&self) -> &str;

    /// Called when the tool becomes active.
    fn activate(&mut self) {}

    /// Called when the tool stops being active. Drops transient state.
    fn deactivate(&mut self) {
        self.reset();
    }

    /// Discard any in-progress gesture.
    fn reset(&mut self) {}

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError>;

    fn on_key(&mut self, _event: &KeyEvent, _ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        Ok(())
    }
}

/// A tool that edits sub-annotations of a master annotation.
pub trait SubAnnotationTool: Tool {
    /// Sub-annotation type this tool writes
    fn sub_type(&self) -> AnnotationType;

    fn master(&self) -> Option<&AnnotationId>;

    fn set_master(&mut self, master: Option<AnnotationId>);
}

/// A tool that adds, moves or deletes vertices.
pub trait VertexEditingTool: Tool {
    fn edit_context(&self) -> Option<EditContext>;
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Base,
    SubAnnotation,
    VertexEditing,
}

/// Static description of a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub kind: ToolKind,
    /// Annotation types the tool creates
    pub produces: Vec<AnnotationType>,
    /// Default bindings registered alongside the tool
    pub keybindings: Vec<Keybinding>,
}

impl ToolDescriptor {
    pub fn new(name: &str, kind: ToolKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            produces: Vec::new(),
            keybindings: Vec::new(),
        }
    }

    pub fn produces(mut self, types: &[AnnotationType]) -> Self {
        self.produces = types.to_vec();
        self
    }

    pub fn with_keybinding(mut self, binding: Keybinding) -> Self {
        self.keybindings.push(binding);
        self
    }
}

/// A tool instance tagged with its capability.
pub enum RegisteredTool {
    Base(Box<dyn Tool>),
    SubAnnotation(Box<dyn SubAnnotationTool>),
    VertexEditing(Box<dyn VertexEditingTool>),
}

impl RegisteredTool {
    pub fn kind(&self) -> ToolKind {
        match self {
            RegisteredTool::Base(_) => ToolKind::Base,
            RegisteredTool::SubAnnotation(_) => ToolKind::SubAnnotation,
            RegisteredTool::VertexEditing(_) => ToolKind::VertexEditing,
        }
    }

    fn activate(&mut self) {
        match self {
            RegisteredTool::Base(tool) => tool.activate(),
            RegisteredTool::SubAnnotation(tool) => tool.activate(),
            RegisteredTool::VertexEditing(tool) => tool.activate(),
        }
    }

    fn deactivate(&mut self) {
        match self {
            RegisteredTool::Base(tool) => tool.deactivate(),
            RegisteredTool::SubAnnotation(tool) => tool.deactivate(),
            RegisteredTool::VertexEditing(tool) => tool.deactivate(),
        }
    }

    fn reset(&mut self) {
        match self {
            RegisteredTool::Base(tool) => tool.reset(),
            RegisteredTool::SubAnnotation(tool) => tool.reset(),
            RegisteredTool::VertexEditing(tool) => tool.reset(),
        }
    }

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match self {
            RegisteredTool::Base(tool) => tool.on_pointer(event, ctx),
            RegisteredTool::SubAnnotation(tool) => tool.on_pointer(event, ctx),
            RegisteredTool::VertexEditing(tool) => tool.on_pointer(event, ctx),
        }
    }

    fn on_key(&mut self, event: &KeyEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match self {
            RegisteredTool::Base(tool) => tool.on_key(event, ctx),
            RegisteredTool::SubAnnotation(tool) => tool.on_key(event, ctx),
            RegisteredTool::VertexEditing(tool) => tool.on_key(event, ctx),
        }
    }
}

struct ToolEntry {
    owner: HandleId,
    descriptor: ToolDescriptor,
    tool: RegisteredTool,
}

// ============================================================================
// Tool Manager
// ============================================================================

/// Registry of tools plus the currently active one.
#[derive(Default)]
pub struct ToolManager {
    tools: HashMap<String, ToolEntry>,
    active: Option<String>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor's name, replacing any tool of the
    /// same name. A replaced active tool is deactivated first.
    pub fn register(&mut self, owner: HandleId, descriptor: ToolDescriptor, tool: RegisteredTool) {
        let name = descriptor.name.clone();
        if self.active.as_deref() == Some(name.as_str()) {
            self.deactivate_tool();
        }
        if self.tools.contains_key(&name) {
            log::warn!("Tool '{}' replaced", name);
        }
        log::debug!("🔧 Registered tool '{}' ({:?})", name, descriptor.kind);
        self.tools.insert(
            name,
            ToolEntry {
                owner,
                descriptor,
                tool,
            },
        );
    }

    /// Remove every tool owned by `owner`. Returns how many were removed.
    pub fn release(&mut self, owner: HandleId) -> usize {
        if self.active_entry().is_some_and(|e| e.owner == owner) {
            self.deactivate_tool();
        }
        let before = self.tools.len();
        self.tools.retain(|_, e| e.owner != owner);
        before - self.tools.len()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|e| &e.descriptor)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_kind(&self) -> Option<ToolKind> {
        self.active_entry().map(|e| e.tool.kind())
    }

    fn active_entry(&self) -> Option<&ToolEntry> {
        self.active.as_ref().and_then(|name| self.tools.get(name))
    }

    fn active_entry_mut(&mut self) -> Option<&mut ToolEntry> {
        let name = self.active.as_ref()?;
        self.tools.get_mut(name)
    }

    /// Deactivate the current tool and activate `name`.
    ///
    /// Unknown names fail and leave the current tool active.
    pub fn activate_tool(&mut self, name: &str) -> Result<(), EngineError> {
        if !self.tools.contains_key(name) {
            return Err(EngineError::UnknownTool(name.to_string()));
        }
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }
        self.deactivate_tool();
        if let Some(entry) = self.tools.get_mut(name) {
            entry.tool.activate();
        }
        self.active = Some(name.to_string());
        log::info!("🔧 Tool: {}", name);
        Ok(())
    }

    /// Deactivate the current tool, if any.
    pub fn deactivate_tool(&mut self) {
        if let Some(entry) = self.active_entry_mut() {
            entry.tool.deactivate();
        }
        if let Some(name) = self.active.take() {
            log::debug!("🔧 Tool '{}' deactivated", name);
        }
    }

    /// Drop the active tool's in-progress gesture. The tool stays active.
    pub fn reset_active(&mut self) {
        if let Some(entry) = self.active_entry_mut() {
            entry.tool.reset();
        }
    }

    /// Route a pointer event to the active tool.
    ///
    /// Returns `Ok(false)` when no tool is active and the event was dropped.
    /// When the tool fails, its gesture is reset before the error is returned.
    pub fn dispatch_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<bool, EngineError> {
        let Some(entry) = self.active_entry_mut() else {
            return Ok(false);
        };
        if let Err(e) = entry.tool.on_pointer(event, ctx) {
            entry.tool.reset();
            return Err(e);
        }
        Ok(true)
    }

    /// Route a key event to the active tool. Same contract as [`Self::dispatch_pointer`].
    pub fn dispatch_key(&mut self, event: &KeyEvent, ctx: &mut ToolContext<'_>) -> Result<bool, EngineError> {
        let Some(entry) = self.active_entry_mut() else {
            return Ok(false);
        };
        if let Err(e) = entry.tool.on_key(event, ctx) {
            entry.tool.reset();
            return Err(e);
        }
        Ok(true)
    }

    /// Edit context of the active tool, when it edits vertices.
    pub fn active_edit_context(&self) -> Option<EditContext> {
        match &self.active_entry()?.tool {
            RegisteredTool::VertexEditing(tool) => tool.edit_context(),
            _ => None,
        }
    }

    /// The active tool, when it edits sub-annotations.
    pub fn active_sub_annotation_tool(&mut self) -> Option<&mut dyn SubAnnotationTool> {
        match &mut self.active_entry_mut()?.tool {
            RegisteredTool::SubAnnotation(tool) => Some(tool.as_mut()),
            _ => None,
        }
    }
}
