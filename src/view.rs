//! One image or frame context: its annotations, history and selection.
//!
//! The view is the only owner of its [`AnnotationCollection`]. All changes go
//! through [`View::perform`], [`View::undo`] or [`View::redo`], and every
//! successful change bumps the revision, marks the view dirty and tells the
//! registered listeners.

use std::fmt;
use std::sync::Arc;

use annotator_geometry::{Camera, Point};

use crate::action::{Action, ActionManager, GroupId};
use crate::error::{ActionError, RasterError};
use crate::model::{
    Annotation, AnnotationCollection, AnnotationData, AnnotationId, ClassCatalog, Raster, RasterLayerData,
};

/// What the view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContext {
    /// Frame index for video, `None` for a still image
    pub frame: Option<u32>,
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl FrameContext {
    pub fn image(width: usize, height: usize) -> Self {
        Self {
            frame: None,
            width,
            height,
        }
    }

    pub fn video_frame(frame: u32, width: usize, height: usize) -> Self {
        Self {
            frame: Some(frame),
            width,
            height,
        }
    }
}

/// Why the collection changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeReason {
    Performed(String),
    Undone(String),
    Redone(String),
    FrameLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub revision: u64,
    pub reason: ChangeReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u32);

type Listener = Box<dyn FnMut(&ChangeEvent)>;

pub struct View {
    collection: AnnotationCollection,
    actions: ActionManager,
    frame: FrameContext,
    /// Selected annotations, in selection order
    selection: Vec<AnnotationId>,
    classes: Arc<ClassCatalog>,
    camera: Camera,
    dirty: bool,
    revision: u64,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u32,
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("frame", &self.frame)
            .field("annotations", &self.collection.len())
            .field("selection", &self.selection)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl View {
    pub fn new(classes: Arc<ClassCatalog>, max_history: usize, frame: FrameContext) -> Self {
        Self {
            collection: AnnotationCollection::new(),
            actions: ActionManager::with_max_history(max_history),
            frame,
            selection: Vec::new(),
            classes,
            camera: Camera::identity(),
            dirty: false,
            revision: 0,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn collection(&self) -> &AnnotationCollection {
        &self.collection
    }

    pub fn classes(&self) -> &ClassCatalog {
        &self.classes
    }

    pub fn frame(&self) -> FrameContext {
        self.frame
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Convert a radius given in canvas pixels to image space.
    pub fn image_radius(&self, canvas_radius: f64) -> f64 {
        self.camera.canvas_distance_to_image(canvas_radius)
    }

    pub fn actions(&self) -> &ActionManager {
        &self.actions
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Execute an action and record it for undo.
    pub fn perform(&mut self, action: Action) -> Result<(), ActionError> {
        let description = action.description();
        self.actions.perform(action, &mut self.collection)?;
        self.changed(ChangeReason::Performed(description));
        Ok(())
    }

    /// Execute an action recorded under a group.
    pub fn perform_in_group(&mut self, group: GroupId, action: Action) -> Result<(), ActionError> {
        let description = action.description();
        self.actions.perform_in_group(group, action, &mut self.collection)?;
        self.changed(ChangeReason::Performed(description));
        Ok(())
    }

    pub fn create_group(&mut self) -> GroupId {
        self.actions.create_group()
    }

    pub fn remove_group(&mut self, group: GroupId) {
        self.actions.remove_group(group);
    }

    /// Undo the last action. Returns `Ok(false)` when there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, ActionError> {
        let description = self.actions.undo_description();
        let undone = self.actions.undo(&mut self.collection)?;
        if undone {
            self.prune_selection();
            self.changed(ChangeReason::Undone(description.unwrap_or_default()));
        }
        Ok(undone)
    }

    /// Redo the last undone action. Returns `Ok(false)` when there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, ActionError> {
        let description = self.actions.redo_description();
        let redone = self.actions.redo(&mut self.collection)?;
        if redone {
            self.prune_selection();
            self.changed(ChangeReason::Redone(description.unwrap_or_default()));
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.actions.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.actions.can_redo()
    }

    /// Replace the collection wholesale for another frame.
    ///
    /// History and selection belong to the previous frame and are cleared.
    pub fn load_frame(&mut self, frame: FrameContext, annotations: AnnotationCollection) {
        log::debug!(
            "🖼️ Load frame {:?}: {} annotations",
            frame.frame,
            annotations.len()
        );
        self.frame = frame;
        self.collection = annotations;
        self.actions.clear();
        self.selection.clear();
        self.changed(ChangeReason::FrameLoaded);
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn selection(&self) -> &[AnnotationId] {
        &self.selection
    }

    /// First selected annotation that still exists.
    pub fn selected(&self) -> Option<&Annotation> {
        self.selection.iter().find_map(|id| self.collection.get(id))
    }

    /// Make `id` the only selected annotation.
    pub fn select(&mut self, id: AnnotationId) {
        self.selection.clear();
        self.selection.push(id);
    }

    /// Add `id` to the selection, or remove it if already selected.
    pub fn toggle_selection(&mut self, id: AnnotationId) {
        match self.selection.iter().position(|s| *s == id) {
            Some(index) => {
                self.selection.remove(index);
            }
            None => self.selection.push(id),
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn prune_selection(&mut self) {
        let collection = &self.collection;
        self.selection.retain(|id| collection.get(id).is_some());
    }

    /// Topmost annotation under `point`.
    pub fn annotation_at(&self, point: &Point, radius: f64) -> Option<&Annotation> {
        self.collection.iter().rev().find(|a| a.data.hit_test(point, radius))
    }

    // ========================================================================
    // Raster layer
    // ========================================================================

    /// The frame's raster layer annotation and its decoded label buffer.
    pub fn raster(&self) -> Result<Option<(&Annotation, Raster)>, RasterError> {
        let Some((annotation, layer)) = self.raster_layer() else {
            return Ok(None);
        };
        Ok(Some((annotation, Raster::from_layer(layer, self.frame.width)?)))
    }

    fn raster_layer(&self) -> Option<(&Annotation, &RasterLayerData)> {
        self.collection.iter().find_map(|a| match &a.data {
            AnnotationData::RasterLayer(layer) => Some((a, layer)),
            _ => None,
        })
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Call `listener` after every change to the collection.
    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn changed(&mut self, reason: ChangeReason) {
        self.revision += 1;
        self.dirty = true;
        let event = ChangeEvent {
            revision: self.revision,
            reason,
        };
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationClass, AnnotationType, KeypointData};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn view() -> View {
        let classes = ClassCatalog::new(vec![AnnotationClass::new(
            1,
            "eye",
            [0, 255, 0],
            AnnotationType::Keypoint,
        )]);
        View::new(Arc::new(classes), 100, FrameContext::image(64, 64))
    }

    fn keypoint(x: f64) -> Annotation {
        Annotation::new(1, AnnotationData::Keypoint(KeypointData { x, y: x }))
    }

    #[test]
    fn test_listeners_fire_on_success_only() {
        let mut view = view();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        view.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let action = Action::append(view.collection(), keypoint(1.0));
        view.perform(action).unwrap();
        assert_eq!(view.undo(), Ok(true));
        assert_eq!(view.undo(), Ok(false));

        let missing = Action::UpdateData {
            id: "missing".into(),
            previous: AnnotationData::Keypoint(KeypointData { x: 0.0, y: 0.0 }),
            next: AnnotationData::Keypoint(KeypointData { x: 1.0, y: 1.0 }),
        };
        assert!(view.perform(missing).is_err());

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].reason, ChangeReason::Performed(_)));
        assert!(matches!(events[1].reason, ChangeReason::Undone(_)));
        assert_eq!(events[1].revision, 2);
    }

    #[test]
    fn test_dirty_flag() {
        let mut view = view();
        assert!(!view.take_dirty());
        let action = Action::append(view.collection(), keypoint(1.0));
        view.perform(action).unwrap();
        assert!(view.is_dirty());
        assert!(view.take_dirty());
        assert!(!view.is_dirty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut view = view();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = view.subscribe(move |_| *sink.borrow_mut() += 1);
        assert!(view.unsubscribe(id));
        let action = Action::append(view.collection(), keypoint(1.0));
        view.perform(action).unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_load_frame_clears_history_and_selection() {
        let mut view = view();
        let annotation = keypoint(1.0);
        let id = annotation.id.clone();
        let action = Action::append(view.collection(), annotation);
        view.perform(action).unwrap();
        view.select(id);

        view.load_frame(
            FrameContext::video_frame(3, 64, 64),
            AnnotationCollection::from_vec(vec![keypoint(5.0)]),
        );
        assert!(!view.can_undo());
        assert!(view.selection().is_empty());
        assert_eq!(view.frame().frame, Some(3));
        assert_eq!(view.collection().len(), 1);
    }

    #[test]
    fn test_undo_drops_missing_selection() {
        let mut view = view();
        let annotation = keypoint(1.0);
        let id = annotation.id.clone();
        let action = Action::append(view.collection(), annotation);
        view.perform(action).unwrap();
        view.select(id);
        view.undo().unwrap();
        assert!(view.selection().is_empty());
    }

    #[test]
    fn test_annotation_at_prefers_topmost() {
        let mut view = view();
        let below = keypoint(1.0);
        let above = keypoint(1.5);
        let above_id = above.id.clone();
        for annotation in [below, above] {
            let action = Action::append(view.collection(), annotation);
            view.perform(action).unwrap();
        }
        let hit = view.annotation_at(&Point::new(1.2, 1.2), 1.0).unwrap();
        assert_eq!(hit.id, above_id);
    }

    #[test]
    fn test_toggle_selection() {
        let mut view = view();
        view.toggle_selection("a".into());
        view.toggle_selection("b".into());
        assert_eq!(view.selection().len(), 2);
        view.toggle_selection("a".into());
        assert_eq!(view.selection(), &[AnnotationId::from("b")]);
    }
}
