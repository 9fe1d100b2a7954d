//! Reversible operations on an annotation collection.
//!
//! Every mutation of a view's annotations is expressed as an [`Action`] that
//! knows how to apply and revert itself. Each action checks that the
//! collection still matches what it recorded before touching it, so a failed
//! apply or revert leaves the collection as it was.

mod manager;
pub mod polygon_ops;

pub use manager::{ActionManager, GroupId};

use crate::error::ActionError;
use crate::model::{Annotation, AnnotationCollection, AnnotationData, AnnotationId, AnnotationType};

// ============================================================================
// Action Types
// ============================================================================

/// A reversible operation on an [`AnnotationCollection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Insert an annotation at a position
    AddAnnotation {
        /// Position in the collection
        index: usize,
        /// The annotation that is added
        annotation: Annotation,
    },
    /// Remove an annotation
    DeleteAnnotation {
        /// Position it occupied (restored on undo)
        index: usize,
        /// The annotation that is removed
        annotation: Annotation,
    },
    /// Replace an annotation's main payload
    UpdateData {
        /// The annotation ID
        id: AnnotationId,
        /// Payload before the change
        previous: AnnotationData,
        /// Payload after the change
        next: AnnotationData,
    },
    /// Attach, replace or detach a sub-annotation
    SetSubAnnotation {
        /// The annotation ID
        id: AnnotationId,
        /// Sub-annotation type
        ty: AnnotationType,
        /// Sub-annotation before the change
        previous: Option<AnnotationData>,
        /// Sub-annotation after the change
        next: Option<AnnotationData>,
    },
    /// Move an annotation in z-order
    Reorder {
        /// The annotation ID
        id: AnnotationId,
        /// Position before the move
        from: usize,
        /// Position after the move
        to: usize,
    },
    /// Remove some annotations and insert others as one step
    Replace {
        /// Removed annotations with their positions before the step, ascending
        removed: Vec<(usize, Annotation)>,
        /// Added annotations with their positions after the step, ascending
        added: Vec<(usize, Annotation)>,
    },
    /// Several actions undone and redone together
    Batch {
        /// Description of the batch operation
        description: String,
        /// The actions in this batch, in apply order
        actions: Vec<Action>,
    },
}

impl Action {
    /// Create an add action that appends to the end of the collection.
    pub fn append(collection: &AnnotationCollection, annotation: Annotation) -> Self {
        Action::AddAnnotation {
            index: collection.len(),
            annotation,
        }
    }

    /// Create a delete action for the annotation with this id.
    pub fn delete(collection: &AnnotationCollection, id: &AnnotationId) -> Result<Self, ActionError> {
        let (index, annotation) = collection.require(id)?;
        Ok(Action::DeleteAnnotation {
            index,
            annotation: annotation.clone(),
        })
    }

    /// Create an update action from the annotation's current payload.
    pub fn update(
        collection: &AnnotationCollection,
        id: &AnnotationId,
        next: AnnotationData,
    ) -> Result<Self, ActionError> {
        let (_, annotation) = collection.require(id)?;
        Ok(Action::UpdateData {
            id: id.clone(),
            previous: annotation.data.clone(),
            next,
        })
    }

    /// Create a sub-annotation action; `None` detaches.
    pub fn set_sub(
        collection: &AnnotationCollection,
        id: &AnnotationId,
        ty: AnnotationType,
        next: Option<AnnotationData>,
    ) -> Result<Self, ActionError> {
        let (_, annotation) = collection.require(id)?;
        Ok(Action::SetSubAnnotation {
            id: id.clone(),
            ty,
            previous: annotation.sub(ty).cloned(),
            next,
        })
    }

    /// Create a reorder action; `to` is clamped to the last position.
    pub fn reorder(collection: &AnnotationCollection, id: &AnnotationId, to: usize) -> Result<Self, ActionError> {
        let (from, _) = collection.require(id)?;
        Ok(Action::Reorder {
            id: id.clone(),
            from,
            to: to.min(collection.len().saturating_sub(1)),
        })
    }

    /// Get a human-readable description of this action
    pub fn description(&self) -> String {
        match self {
            Action::AddAnnotation { annotation, .. } => format!("Add {}", annotation.ty()),
            Action::DeleteAnnotation { annotation, .. } => format!("Delete {}", annotation.ty()),
            Action::UpdateData { next, .. } => format!("Edit {}", next.ty()),
            Action::SetSubAnnotation { ty, next: Some(_), .. } => format!("Set {}", ty),
            Action::SetSubAnnotation { ty, next: None, .. } => format!("Remove {}", ty),
            Action::Reorder { .. } => "Reorder annotation".to_string(),
            Action::Replace { removed, added } => {
                format!("Replace {} with {} annotations", removed.len(), added.len())
            }
            Action::Batch { description, .. } => description.clone(),
        }
    }

    /// Apply the forward procedure.
    pub fn apply(&self, collection: &mut AnnotationCollection) -> Result<(), ActionError> {
        match self {
            Action::AddAnnotation { index, annotation } => collection.insert(*index, annotation.clone()),
            Action::DeleteAnnotation { annotation, .. } => remove_exact(collection, annotation),
            Action::UpdateData { id, previous, next } => swap_data(collection, id, previous, next),
            Action::SetSubAnnotation {
                id,
                ty,
                previous,
                next,
            } => swap_sub(collection, id, *ty, previous.as_ref(), next.as_ref()),
            Action::Reorder { id, from, to } => move_checked(collection, id, *from, *to),
            Action::Replace { removed, added } => atomically(collection, |c| replace(c, removed, added)),
            Action::Batch { actions, .. } => atomically(collection, |c| {
                actions.iter().try_for_each(|action| action.apply(c))
            }),
        }
    }

    /// Apply the reverse procedure.
    pub fn revert(&self, collection: &mut AnnotationCollection) -> Result<(), ActionError> {
        match self {
            Action::AddAnnotation { annotation, .. } => remove_exact(collection, annotation),
            Action::DeleteAnnotation { index, annotation } => collection.insert(*index, annotation.clone()),
            Action::UpdateData { id, previous, next } => swap_data(collection, id, next, previous),
            Action::SetSubAnnotation {
                id,
                ty,
                previous,
                next,
            } => swap_sub(collection, id, *ty, next.as_ref(), previous.as_ref()),
            Action::Reorder { id, from, to } => move_checked(collection, id, *to, *from),
            Action::Replace { removed, added } => atomically(collection, |c| replace(c, added, removed)),
            Action::Batch { actions, .. } => atomically(collection, |c| {
                actions.iter().rev().try_for_each(|action| action.revert(c))
            }),
        }
    }
}

// ============================================================================
// Procedures
// ============================================================================

/// Run `op` and restore the collection if it fails part-way.
fn atomically(
    collection: &mut AnnotationCollection,
    op: impl FnOnce(&mut AnnotationCollection) -> Result<(), ActionError>,
) -> Result<(), ActionError> {
    let snapshot = collection.clone();
    let result = op(collection);
    if result.is_err() {
        *collection = snapshot;
    }
    result
}

fn remove_exact(collection: &mut AnnotationCollection, expected: &Annotation) -> Result<(), ActionError> {
    let (_, current) = collection.require(&expected.id)?;
    if current != expected {
        return Err(ActionError::StaleState(expected.id.clone()));
    }
    collection.remove(&expected.id).map(|_| ())
}

fn swap_data(
    collection: &mut AnnotationCollection,
    id: &AnnotationId,
    expected: &AnnotationData,
    replacement: &AnnotationData,
) -> Result<(), ActionError> {
    let annotation = collection.get_mut(id)?;
    if &annotation.data != expected {
        return Err(ActionError::StaleState(id.clone()));
    }
    annotation.data = replacement.clone();
    Ok(())
}

fn swap_sub(
    collection: &mut AnnotationCollection,
    id: &AnnotationId,
    ty: AnnotationType,
    expected: Option<&AnnotationData>,
    replacement: Option<&AnnotationData>,
) -> Result<(), ActionError> {
    let annotation = collection.get_mut(id)?;
    if annotation.sub_annotations.get(&ty) != expected {
        return Err(ActionError::StaleState(id.clone()));
    }
    match replacement {
        Some(data) => {
            annotation.sub_annotations.insert(ty, data.clone());
        }
        None => {
            annotation.sub_annotations.remove(&ty);
        }
    }
    Ok(())
}

fn move_checked(
    collection: &mut AnnotationCollection,
    id: &AnnotationId,
    from: usize,
    to: usize,
) -> Result<(), ActionError> {
    let (index, _) = collection.require(id)?;
    if index != from {
        return Err(ActionError::StaleState(id.clone()));
    }
    collection.move_to(id, to).map(|_| ())
}

/// Remove `outgoing` (checked against the recorded values), then insert
/// `incoming` at their recorded positions.
fn replace(
    collection: &mut AnnotationCollection,
    outgoing: &[(usize, Annotation)],
    incoming: &[(usize, Annotation)],
) -> Result<(), ActionError> {
    for (_, annotation) in outgoing {
        remove_exact(collection, annotation)?;
    }
    for (index, annotation) in incoming {
        collection.insert(*index, annotation.clone())?;
    }
    Ok(())
}
