//! Ordered annotation collection of a view.
//!
//! Order is z-order and serialization order. Reads are public; mutation is
//! only available inside the crate so that every change goes through an
//! action.

use super::annotation::{Annotation, AnnotationId};
use crate::error::ActionError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationCollection {
    items: Vec<Annotation>,
}

impl AnnotationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Annotation>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.items.iter().find(|a| &a.id == id)
    }

    pub fn index_of(&self, id: &AnnotationId) -> Option<usize> {
        self.items.iter().position(|a| &a.id == id)
    }

    /// Look up an annotation or fail with [`ActionError::NotFound`].
    pub fn require(&self, id: &AnnotationId) -> Result<(usize, &Annotation), ActionError> {
        let index = self.index_of(id).ok_or_else(|| ActionError::NotFound(id.clone()))?;
        Ok((index, &self.items[index]))
    }

    pub fn ids(&self) -> impl Iterator<Item = &AnnotationId> {
        self.items.iter().map(|a| &a.id)
    }

    pub(crate) fn insert(&mut self, index: usize, annotation: Annotation) -> Result<(), ActionError> {
        if index > self.items.len() {
            return Err(ActionError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        if self.index_of(&annotation.id).is_some() {
            return Err(ActionError::DuplicateId(annotation.id));
        }
        self.items.insert(index, annotation);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &AnnotationId) -> Result<(usize, Annotation), ActionError> {
        let index = self.index_of(id).ok_or_else(|| ActionError::NotFound(id.clone()))?;
        Ok((index, self.items.remove(index)))
    }

    pub(crate) fn get_mut(&mut self, id: &AnnotationId) -> Result<&mut Annotation, ActionError> {
        self.items
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| ActionError::NotFound(id.clone()))
    }

    /// Move an annotation to `to`, clamped to the collection.
    pub(crate) fn move_to(&mut self, id: &AnnotationId, to: usize) -> Result<usize, ActionError> {
        let (from, annotation) = self.remove(id)?;
        let to = to.min(self.items.len());
        self.items.insert(to, annotation);
        Ok(from)
    }
}

impl<'a> IntoIterator for &'a AnnotationCollection {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
