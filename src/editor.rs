//! The editor: view, registries and plugins wired together.
//!
//! [`EditorCore`] holds everything commands and tools act on: configuration,
//! the class catalog, the open view, the tool/serializer/keybinding
//! registries and an optional video session. [`Editor`] adds the command
//! registry and plugin manager on top, so a command can borrow the core
//! mutably while it runs.

use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::keybindings::{Keybinding, KeybindingRegistry};
use crate::model::{AnnotationCollection, AnnotationId, ClassCatalog};
use crate::plugin::{CommandRegistry, HandleAllocator, HandleId, Plugin, PluginManager, builtin};
use crate::serializer::{SerializerRegistry, serialize_annotation, serialize_video_annotation};
use crate::tool::{KeyEvent, PointerEvent, ToolContext, ToolManager};
use crate::video::VideoSession;
use crate::view::{FrameContext, View};

// ============================================================================
// Editor Core
// ============================================================================

pub struct EditorCore {
    config: EngineConfig,
    classes: Arc<ClassCatalog>,
    view: Option<View>,
    tools: ToolManager,
    serializers: SerializerRegistry,
    keybindings: KeybindingRegistry,
    /// Class new annotations are created with
    active_class: Option<u32>,
    video: Option<VideoSession>,
    handles: HandleAllocator,
}

impl EditorCore {
    pub fn new(config: EngineConfig, classes: ClassCatalog) -> Self {
        let keybindings = KeybindingRegistry::with_overrides(config.keybindings.clone());
        Self {
            config,
            classes: Arc::new(classes),
            view: None,
            tools: ToolManager::new(),
            serializers: SerializerRegistry::new(),
            keybindings,
            active_class: None,
            video: None,
            handles: HandleAllocator::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassCatalog {
        &self.classes
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    pub fn serializers_mut(&mut self) -> &mut SerializerRegistry {
        &mut self.serializers
    }

    pub fn keybindings(&self) -> &KeybindingRegistry {
        &self.keybindings
    }

    pub fn keybindings_mut(&mut self) -> &mut KeybindingRegistry {
        &mut self.keybindings
    }

    pub(crate) fn allocate_handle(&mut self) -> HandleId {
        self.handles.allocate()
    }

    pub fn active_class(&self) -> Option<u32> {
        self.active_class
    }

    pub fn set_active_class(&mut self, class_id: Option<u32>) {
        self.active_class = class_id;
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn view(&self) -> Result<&View, EngineError> {
        self.view.as_ref().ok_or(EngineError::NoView)
    }

    pub fn view_mut(&mut self) -> Result<&mut View, EngineError> {
        self.view.as_mut().ok_or(EngineError::NoView)
    }

    /// Open a still image with its annotations. Closes any open video.
    pub fn open_image(&mut self, width: usize, height: usize, annotations: AnnotationCollection) -> &mut View {
        self.video = None;
        self.load_view(FrameContext::image(width, height), annotations)
    }

    /// Open a video session and show its current frame.
    pub fn open_video(&mut self, session: VideoSession) -> Result<&mut View, EngineError> {
        let (width, height) = session.size();
        let frame = FrameContext::video_frame(session.current_frame(), width, height);
        let annotations = session.frame_data()?;
        self.video = Some(session);
        Ok(self.load_view(frame, annotations))
    }

    /// Replace the shown collection. The active tool stays active; only its
    /// in-progress gesture is dropped.
    fn load_view(&mut self, frame: FrameContext, annotations: AnnotationCollection) -> &mut View {
        self.tools.reset_active();
        let view = self
            .view
            .get_or_insert_with(|| View::new(Arc::clone(&self.classes), self.config.history.max_history, frame));
        view.load_frame(frame, annotations);
        view
    }

    pub fn undo(&mut self) -> Result<bool, EngineError> {
        Ok(self.view_mut()?.undo()?)
    }

    pub fn redo(&mut self) -> Result<bool, EngineError> {
        Ok(self.view_mut()?.redo()?)
    }

    /// Delete every selected annotation as one undo step.
    pub fn delete_selected(&mut self) -> Result<usize, EngineError> {
        let view = self.view_mut()?;
        let collection = view.collection();
        let mut targets: Vec<(usize, &AnnotationId)> = view
            .selection()
            .iter()
            .filter_map(|id| Some((collection.index_of(id)?, id)))
            .collect();
        if targets.is_empty() {
            return Err(EngineError::NothingSelected);
        }

        // Highest index first so each recorded position is still valid on undo
        targets.sort_by(|a, b| b.0.cmp(&a.0));
        let mut deletes = targets
            .into_iter()
            .map(|(_, id)| Action::delete(collection, id))
            .collect::<Result<Vec<_>, _>>()?;
        let count = deletes.len();
        let action = if count == 1 {
            deletes.remove(0)
        } else {
            Action::Batch {
                description: format!("Delete {} annotations", count),
                actions: deletes,
            }
        };
        view.perform(action)?;
        view.clear_selection();
        Ok(count)
    }

    /// Serialize the open view's annotations.
    pub fn export_view(&self) -> Result<Vec<Value>, EngineError> {
        let view = self.view()?;
        let annotations = view
            .collection()
            .iter()
            .map(|a| serialize_annotation(&self.serializers, a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(annotations)
    }

    // ========================================================================
    // Video
    // ========================================================================

    pub fn video(&self) -> Option<&VideoSession> {
        self.video.as_ref()
    }

    pub fn video_mut(&mut self) -> Result<&mut VideoSession, EngineError> {
        self.video.as_mut().ok_or(EngineError::NoVideo)
    }

    /// Commit the shown frame and show `frame` instead.
    pub fn set_frame(&mut self, frame: u32) -> Result<u32, EngineError> {
        let view = self.view.as_ref().ok_or(EngineError::NoView)?;
        let video = self.video.as_mut().ok_or(EngineError::NoVideo)?;
        video.commit(view.collection())?;
        let frame = video.seek(frame);
        let (width, height) = video.size();
        let annotations = video.frame_data()?;
        self.load_view(FrameContext::video_frame(frame, width, height), annotations);
        Ok(frame)
    }

    /// Advance one frame while playing. Playback stops on the last frame.
    ///
    /// Returns the frame shown, or `None` when not playing.
    pub fn step_playback(&mut self) -> Result<Option<u32>, EngineError> {
        let video = self.video_mut()?;
        if !video.is_playing() {
            return Ok(None);
        }
        if video.is_at_end() {
            video.pause();
            return Ok(None);
        }
        let next = video.next_frame();
        self.set_frame(next).map(Some)
    }

    /// Serialize every video annotation, including the frame being edited.
    pub fn export_video(&mut self) -> Result<Vec<Value>, EngineError> {
        let view = self.view.as_ref().ok_or(EngineError::NoView)?;
        let video = self.video.as_mut().ok_or(EngineError::NoVideo)?;
        video.commit(view.collection())?;
        let annotations = video
            .annotations()
            .iter()
            .map(|a| serialize_video_annotation(&self.serializers, a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(annotations)
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn activate_tool(&mut self, name: &str) -> Result<(), EngineError> {
        self.tools.activate_tool(name)
    }

    /// Route a pointer event to the active tool. `Ok(false)` if none is active.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Result<bool, EngineError> {
        let view = self.view.as_mut().ok_or(EngineError::NoView)?;
        let mut ctx = ToolContext {
            view,
            editing: &self.config.editing,
            active_class: self.active_class,
        };
        self.tools.dispatch_pointer(event, &mut ctx)
    }

    fn dispatch_key(&mut self, event: &KeyEvent) -> Result<bool, EngineError> {
        let view = self.view.as_mut().ok_or(EngineError::NoView)?;
        let mut ctx = ToolContext {
            view,
            editing: &self.config.editing,
            active_class: self.active_class,
        };
        self.tools.dispatch_key(event, &mut ctx)
    }
}

// ============================================================================
// Editor
// ============================================================================

pub const UNDO_COMMAND: &str = "editor.undo";
pub const REDO_COMMAND: &str = "editor.redo";
pub const DELETE_SELECTED_COMMAND: &str = "editor.delete_selected";

pub struct Editor {
    core: EditorCore,
    commands: CommandRegistry,
    plugins: PluginManager,
}

impl Editor {
    /// Editor with its own commands and no plugins.
    pub fn new(config: EngineConfig, classes: ClassCatalog) -> Result<Self, EngineError> {
        let mut editor = Self {
            core: EditorCore::new(config, classes),
            commands: CommandRegistry::new(),
            plugins: PluginManager::new(),
        };
        editor.register_editor_commands()?;
        Ok(editor)
    }

    /// Editor with every built-in plugin registered and active.
    pub fn with_builtin_plugins(config: EngineConfig, classes: ClassCatalog) -> Result<Self, EngineError> {
        let mut editor = Self::new(config, classes)?;
        for plugin in builtin::plugins() {
            editor.register_plugin(plugin);
        }
        editor.plugins.activate_all(&mut editor.core, &mut editor.commands)?;
        Ok(editor)
    }

    fn register_editor_commands(&mut self) -> Result<(), EngineError> {
        let owner = self.core.allocate_handle();
        self.commands.register(owner, UNDO_COMMAND, |core| core.undo().map(|_| ()));
        self.commands.register(owner, REDO_COMMAND, |core| core.redo().map(|_| ()));
        self.commands
            .register(owner, DELETE_SELECTED_COMMAND, |core| core.delete_selected().map(|_| ()));

        let keybindings = self.core.keybindings_mut();
        keybindings.register(owner, Keybinding::press("ctrl+z", UNDO_COMMAND)?);
        keybindings.register(owner, Keybinding::press("ctrl+shift+z", REDO_COMMAND)?);
        keybindings.register(owner, Keybinding::press("ctrl+y", REDO_COMMAND)?);
        keybindings.register(owner, Keybinding::press("delete", DELETE_SELECTED_COMMAND)?);
        Ok(())
    }

    pub fn core(&self) -> &EditorCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn view(&self) -> Result<&View, EngineError> {
        self.core.view()
    }

    pub fn view_mut(&mut self) -> Result<&mut View, EngineError> {
        self.core.view_mut()
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> bool {
        self.plugins.register(plugin)
    }

    pub fn activate_plugin(&mut self, name: &str) -> Result<(), EngineError> {
        self.plugins.activate(name, &mut self.core, &mut self.commands)
    }

    pub fn deactivate_plugin(&mut self, name: &str) -> Result<(), EngineError> {
        self.plugins.deactivate(name, &mut self.core, &mut self.commands)
    }

    pub fn run_command(&mut self, id: &str) -> Result<(), EngineError> {
        self.commands.run(id, &mut self.core)
    }

    pub fn activate_tool(&mut self, name: &str) -> Result<(), EngineError> {
        self.core.activate_tool(name)
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Result<bool, EngineError> {
        self.core.handle_pointer(event)
    }

    /// Run the command bound to the key, or pass the key to the active tool.
    ///
    /// Returns `Ok(false)` when neither a binding nor a tool took the event.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<bool, EngineError> {
        if let Some(command) = self.core.keybindings().command_for(event).map(str::to_string) {
            self.run_command(&command)?;
            return Ok(true);
        }
        self.core.dispatch_key(event)
    }
}
