//! Undo/redo history.
//!
//! Maintains two stacks:
//! - `undo_stack`: actions that can be undone (most recent at the end)
//! - `redo_stack`: actions that can be redone (most recent at the end)
//!
//! Performing a new action pushes it to the undo stack and clears the redo
//! stack. A failing apply or revert leaves both stacks untouched and returns
//! the error.
//!
//! Entries may be tagged with a group. Removing a group drops its entries
//! from both stacks without reverting them, for editing sessions whose
//! history should not outlive them.

use super::Action;
use crate::constants::DEFAULT_MAX_HISTORY;
use crate::error::ActionError;
use crate::model::AnnotationCollection;

/// Identifier of an action group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(u32);

#[derive(Debug, Clone)]
struct Entry {
    action: Action,
    group: Option<GroupId>,
}

#[derive(Debug, Clone)]
pub struct ActionManager {
    /// Stack of actions that can be undone
    undo_stack: Vec<Entry>,
    /// Stack of actions that can be redone
    redo_stack: Vec<Entry>,
    /// Oldest entries are dropped beyond this size
    max_history: usize,
    next_group: u32,
}

impl Default for ActionManager {
    fn default() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }
}

impl ActionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
            next_group: 0,
        }
    }

    /// Apply an action and record it.
    pub fn perform(&mut self, action: Action, collection: &mut AnnotationCollection) -> Result<(), ActionError> {
        self.perform_entry(Entry { action, group: None }, collection)
    }

    /// Apply an action and record it under a group.
    pub fn perform_in_group(
        &mut self,
        group: GroupId,
        action: Action,
        collection: &mut AnnotationCollection,
    ) -> Result<(), ActionError> {
        self.perform_entry(
            Entry {
                action,
                group: Some(group),
            },
            collection,
        )
    }

    fn perform_entry(&mut self, entry: Entry, collection: &mut AnnotationCollection) -> Result<(), ActionError> {
        entry.action.apply(collection)?;
        log::debug!("📝 Action: performed '{}'", entry.action.description());
        self.undo_stack.push(entry);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
        Ok(())
    }

    /// Revert the most recent action.
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, collection: &mut AnnotationCollection) -> Result<bool, ActionError> {
        let Some(entry) = self.undo_stack.last() else {
            return Ok(false);
        };
        entry.action.revert(collection)?;
        log::debug!("⏪ Undo: '{}'", entry.action.description());
        if let Some(entry) = self.undo_stack.pop() {
            self.redo_stack.push(entry);
        }
        Ok(true)
    }

    /// Re-apply the most recently undone action.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, collection: &mut AnnotationCollection) -> Result<bool, ActionError> {
        let Some(entry) = self.redo_stack.last() else {
            return Ok(false);
        };
        entry.action.apply(collection)?;
        log::debug!("⏩ Redo: '{}'", entry.action.description());
        if let Some(entry) = self.redo_stack.pop() {
            self.undo_stack.push(entry);
        }
        Ok(true)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|e| e.action.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|e| e.action.description())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Start a new action group.
    pub fn create_group(&mut self) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        id
    }

    /// Drop every entry recorded under `group` from both stacks.
    pub fn remove_group(&mut self, group: GroupId) {
        let before = self.undo_stack.len() + self.redo_stack.len();
        self.undo_stack.retain(|e| e.group != Some(group));
        self.redo_stack.retain(|e| e.group != Some(group));
        let removed = before - self.undo_stack.len() - self.redo_stack.len();
        log::debug!("🗑️ Removed action group {:?} ({} entries)", group, removed);
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ Action history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, AnnotationData, KeypointData};

    fn add(collection: &AnnotationCollection, x: f64) -> Action {
        Action::append(
            collection,
            Annotation::new(1, AnnotationData::Keypoint(KeypointData { x, y: x })),
        )
    }

    #[test]
    fn test_empty_stack_is_noop() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();
        assert_eq!(manager.undo(&mut collection), Ok(false));
        assert_eq!(manager.redo(&mut collection), Ok(false));
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();

        let action = add(&collection, 1.0);
        manager.perform(action, &mut collection).unwrap();
        let after_do = collection.clone();

        assert_eq!(manager.undo(&mut collection), Ok(true));
        assert!(collection.is_empty());
        assert!(manager.can_redo());

        assert_eq!(manager.redo(&mut collection), Ok(true));
        assert_eq!(collection, after_do);
    }

    #[test]
    fn test_new_action_truncates_redo() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();
        manager.perform(add(&collection, 1.0), &mut collection).unwrap();
        manager.undo(&mut collection).unwrap();
        manager.perform(add(&collection, 2.0), &mut collection).unwrap();
        assert!(!manager.can_redo());
        assert_eq!(manager.undo_count(), 1);
    }

    #[test]
    fn test_failed_perform_leaves_stacks_unchanged() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();
        let action = add(&collection, 1.0);
        manager.perform(action.clone(), &mut collection).unwrap();
        manager.undo(&mut collection).unwrap();

        // Bad index: collection is empty
        let bad = Action::AddAnnotation {
            index: 3,
            annotation: Annotation::new(1, AnnotationData::Keypoint(KeypointData { x: 0.0, y: 0.0 })),
        };
        assert!(manager.perform(bad, &mut collection).is_err());
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 1);
    }

    #[test]
    fn test_failed_undo_leaves_stacks_unchanged() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();
        manager.perform(add(&collection, 1.0), &mut collection).unwrap();

        // Collection replaced behind the manager's back
        let mut other = AnnotationCollection::new();
        assert!(manager.undo(&mut other).is_err());
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_max_history() {
        let mut manager = ActionManager::with_max_history(2);
        let mut collection = AnnotationCollection::new();
        for i in 0..4 {
            let action = add(&collection, f64::from(i));
            manager.perform(action, &mut collection).unwrap();
        }
        assert_eq!(manager.undo_count(), 2);
    }

    #[test]
    fn test_groups_share_history() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();
        let group = manager.create_group();

        manager.perform_in_group(group, add(&collection, 1.0), &mut collection).unwrap();
        manager.perform_in_group(group, add(&collection, 2.0), &mut collection).unwrap();
        assert!(manager.undo(&mut collection).unwrap());
        assert!(manager.undo(&mut collection).unwrap());
        assert!(collection.is_empty());
        assert!(manager.redo(&mut collection).unwrap());
        assert!(manager.redo(&mut collection).unwrap());
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_remove_group_drops_entries() {
        let mut manager = ActionManager::new();
        let mut collection = AnnotationCollection::new();
        let group1 = manager.create_group();
        let group2 = manager.create_group();

        manager.perform_in_group(group1, add(&collection, 1.0), &mut collection).unwrap();
        manager.perform_in_group(group2, add(&collection, 2.0), &mut collection).unwrap();
        manager.undo(&mut collection).unwrap();
        assert!(manager.can_redo());
        assert!(manager.can_undo());

        manager.remove_group(group2);
        assert!(!manager.can_redo());
        assert!(manager.can_undo());

        manager.remove_group(group1);
        assert!(!manager.can_undo());
    }
}
