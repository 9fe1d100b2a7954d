//! Plugin lifecycle and registration handles.
//!
//! A plugin registers commands, tools, keybindings and serializers through a
//! [`PluginContext`] when it is activated. Every registration is tagged with a
//! fresh [`HandleId`] and recorded as a [`RegistrationHandle`]; deactivating the
//! plugin releases each recorded handle from the registry it came from.
//!
//! ```text
//! inactive --activate--> active (handles recorded)
//!    ^                      |
//!    +------deactivate------+ (handles released, newest first)
//! ```

pub mod builtin;
mod command;

pub use command::{CommandFn, CommandRegistry};

use std::fmt;

use crate::config::EngineConfig;
use crate::editor::EditorCore;
use crate::error::EngineError;
use crate::keybindings::Keybinding;
use crate::model::AnnotationType;
use crate::serializer::Serializer;
use crate::tool::{RegisteredTool, ToolDescriptor};

// ============================================================================
// Handles
// ============================================================================

/// Owner tag attached to every registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u32);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing handle ids.
#[derive(Debug, Clone, Default)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub fn allocate(&mut self) -> HandleId {
        let id = HandleId(self.next);
        self.next += 1;
        id
    }
}

/// What a handle was registered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationKind {
    Command(String),
    /// A tool together with its descriptor keybindings
    Tool(String),
    Keybinding,
    Serializer(AnnotationType),
}

/// Record of one registration, used to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub id: HandleId,
    pub kind: RegistrationKind,
}

/// Undo one registration.
fn release(handle: &RegistrationHandle, core: &mut EditorCore, commands: &mut CommandRegistry) {
    let removed = match &handle.kind {
        RegistrationKind::Command(_) => commands.release(handle.id),
        RegistrationKind::Tool(_) => core.tools_mut().release(handle.id) + core.keybindings_mut().release(handle.id),
        RegistrationKind::Keybinding => core.keybindings_mut().release(handle.id),
        RegistrationKind::Serializer(_) => core.serializers_mut().release(handle.id),
    };
    log::trace!("Released {} {:?} ({} entries)", handle.id, handle.kind, removed);
}

// ============================================================================
// Plugin trait and context
// ============================================================================

pub trait Plugin {
    /// Unique plugin name
    fn name(&self) -> &'static str;

    /// Register everything the plugin provides.
    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError>;

    /// Called before the plugin's registrations are released.
    fn deactivate(&mut self) {}
}

/// Registration surface handed to [`Plugin::activate`].
pub struct PluginContext<'a> {
    core: &'a mut EditorCore,
    commands: &'a mut CommandRegistry,
    handles: &'a mut Vec<RegistrationHandle>,
}

impl PluginContext<'_> {
    pub fn config(&self) -> &EngineConfig {
        self.core.config()
    }

    fn record(&mut self, kind: RegistrationKind) -> HandleId {
        let id = self.core.allocate_handle();
        self.handles.push(RegistrationHandle { id, kind });
        id
    }

    pub fn register_command(
        &mut self,
        id: &str,
        run: impl FnMut(&mut EditorCore) -> Result<(), EngineError> + 'static,
    ) -> HandleId {
        let handle = self.record(RegistrationKind::Command(id.to_string()));
        self.commands.register(handle, id, run);
        handle
    }

    /// Register a tool and the keybindings listed in its descriptor.
    pub fn register_tool(&mut self, descriptor: ToolDescriptor, tool: RegisteredTool) -> HandleId {
        let handle = self.record(RegistrationKind::Tool(descriptor.name.clone()));
        for binding in &descriptor.keybindings {
            self.core.keybindings_mut().register(handle, binding.clone());
        }
        self.core.tools_mut().register(handle, descriptor, tool);
        handle
    }

    pub fn register_keybinding(&mut self, binding: Keybinding) -> HandleId {
        let handle = self.record(RegistrationKind::Keybinding);
        self.core.keybindings_mut().register(handle, binding);
        handle
    }

    pub fn register_serializer(&mut self, serializer: Box<dyn Serializer>) -> HandleId {
        let handle = self.record(RegistrationKind::Serializer(serializer.ty()));
        self.core.serializers_mut().register(handle, serializer);
        handle
    }
}

// ============================================================================
// Plugin Manager
// ============================================================================

struct PluginEntry {
    plugin: Box<dyn Plugin>,
    /// `Some` while active
    handles: Option<Vec<RegistrationHandle>>,
}

/// Known plugins and which of them are active.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<PluginEntry>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin in the inactive state.
    ///
    /// Returns `false` and drops `plugin` if the name is already taken.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> bool {
        if self.entry(plugin.name()).is_some() {
            log::warn!("Plugin '{}' already registered", plugin.name());
            return false;
        }
        self.plugins.push(PluginEntry { plugin, handles: None });
        true
    }

    fn entry(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|e| e.plugin.name() == name)
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|e| e.plugin.name()).collect()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|e| e.handles.is_some())
    }

    /// Registrations held by an active plugin.
    pub fn handles(&self, name: &str) -> Option<&[RegistrationHandle]> {
        self.entry(name)?.handles.as_deref()
    }

    /// Activate `name`. Activating an active plugin does nothing.
    ///
    /// If the plugin fails part-way, whatever it registered so far is
    /// released and the plugin stays inactive.
    pub fn activate(
        &mut self,
        name: &str,
        core: &mut EditorCore,
        commands: &mut CommandRegistry,
    ) -> Result<(), EngineError> {
        let entry = self
            .plugins
            .iter_mut()
            .find(|e| e.plugin.name() == name)
            .ok_or_else(|| EngineError::UnknownPlugin(name.to_string()))?;
        if entry.handles.is_some() {
            return Ok(());
        }

        let mut handles = Vec::new();
        let result = entry.plugin.activate(&mut PluginContext {
            core: &mut *core,
            commands: &mut *commands,
            handles: &mut handles,
        });
        if let Err(e) = result {
            log::warn!("Plugin '{}' failed to activate: {}", name, e);
            for handle in handles.iter().rev() {
                release(handle, core, commands);
            }
            return Err(e);
        }

        log::info!("🔌 Plugin '{}' activated ({} registrations)", name, handles.len());
        entry.handles = Some(handles);
        Ok(())
    }

    /// Deactivate `name`, releasing all its registrations. Deactivating an
    /// inactive plugin does nothing.
    pub fn deactivate(
        &mut self,
        name: &str,
        core: &mut EditorCore,
        commands: &mut CommandRegistry,
    ) -> Result<(), EngineError> {
        let entry = self
            .plugins
            .iter_mut()
            .find(|e| e.plugin.name() == name)
            .ok_or_else(|| EngineError::UnknownPlugin(name.to_string()))?;
        let Some(handles) = entry.handles.take() else {
            return Ok(());
        };

        entry.plugin.deactivate();
        for handle in handles.iter().rev() {
            release(handle, core, commands);
        }
        log::info!("🔌 Plugin '{}' deactivated", name);
        Ok(())
    }

    /// Activate every registered plugin in registration order.
    pub fn activate_all(&mut self, core: &mut EditorCore, commands: &mut CommandRegistry) -> Result<(), EngineError> {
        for name in self.names() {
            self.activate(name, core, commands)?;
        }
        Ok(())
    }

    /// Deactivate every plugin, newest first.
    pub fn deactivate_all(&mut self, core: &mut EditorCore, commands: &mut CommandRegistry) -> Result<(), EngineError> {
        for name in self.names().into_iter().rev() {
            self.deactivate(name, core, commands)?;
        }
        Ok(())
    }
}
