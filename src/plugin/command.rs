//! Named commands.

use std::collections::HashMap;

use super::HandleId;
use crate::editor::EditorCore;
use crate::error::EngineError;

/// A command callback. It receives the editor state it acts on.
pub type CommandFn = Box<dyn FnMut(&mut EditorCore) -> Result<(), EngineError>>;

struct RegisteredCommand {
    owner: HandleId,
    run: CommandFn,
}

/// Registry mapping command ids to callbacks.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. An existing command with the same id is replaced.
    pub fn register(
        &mut self,
        owner: HandleId,
        id: &str,
        run: impl FnMut(&mut EditorCore) -> Result<(), EngineError> + 'static,
    ) {
        let run: CommandFn = Box::new(run);
        if self
            .commands
            .insert(id.to_string(), RegisteredCommand { owner, run })
            .is_some()
        {
            log::warn!("Command '{}' replaced", id);
        }
    }

    /// Remove every command owned by `owner`. Returns how many were removed.
    pub fn release(&mut self, owner: HandleId) -> usize {
        let before = self.commands.len();
        self.commands.retain(|_, c| c.owner != owner);
        before - self.commands.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered command ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Run the command registered under `id`.
    pub fn run(&mut self, id: &str, core: &mut EditorCore) -> Result<(), EngineError> {
        let command = self
            .commands
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownCommand(id.to_string()))?;
        log::debug!("▶️ Command: {}", id);
        (command.run)(core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::ClassCatalog;

    fn core() -> EditorCore {
        EditorCore::new(EngineConfig::default(), ClassCatalog::default())
    }

    #[test]
    fn test_run_and_release() {
        let mut registry = CommandRegistry::new();
        let mut core = core();
        registry.register(HandleId(1), "set_class", |core| {
            core.set_active_class(Some(7));
            Ok(())
        });
        registry.run("set_class", &mut core).unwrap();
        assert_eq!(core.active_class(), Some(7));

        assert_eq!(registry.release(HandleId(1)), 1);
        assert!(matches!(
            registry.run("set_class", &mut core),
            Err(EngineError::UnknownCommand(id)) if id == "set_class"
        ));
    }

    #[test]
    fn test_replace_keeps_one_entry() {
        let mut registry = CommandRegistry::new();
        registry.register(HandleId(1), "a", |_| Ok(()));
        registry.register(HandleId(2), "a", |_| Err(EngineError::NoView));
        registry.register(HandleId(2), "b", |_| Ok(()));
        assert_eq!(registry.ids(), vec!["a", "b"]);
        assert!(registry.run("a", &mut core()).is_err());
        assert_eq!(registry.release(HandleId(1)), 0);
    }
}
