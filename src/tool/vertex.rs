//! Vertex editing state and the delete-vertex gate.

use annotator_geometry::{GeometryError, Point, path};

use crate::action::Action;
use crate::constants::MIN_POLYGON_VERTICES;
use crate::error::{CreationError, EngineError};
use crate::model::{AnnotationData, AnnotationId, AnnotationType};
use crate::view::View;

/// A vertex of one annotation's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexRef {
    pub annotation: AnnotationId,
    pub index: usize,
}

/// What the vertex editor is pointing at, as seen from outside the tool.
#[derive(Debug, Clone, PartialEq)]
pub enum EditContext {
    /// Hovering a vertex
    Hover(VertexRef),
    /// Dragging a vertex to `position`
    Move { vertex: VertexRef, position: Point },
    /// The vertex will be deleted on release
    DeleteVertex(VertexRef),
}

/// The one check deletion goes through: only a `DeleteVertex` context is
/// deletable.
pub fn as_delete_vertex(context: Option<&EditContext>) -> Option<&VertexRef> {
    match context {
        Some(EditContext::DeleteVertex(vertex)) => Some(vertex),
        _ => None,
    }
}

/// Vertex editor state machine.
///
/// ```text
/// Idle --move over vertex--> Hovering --press--> Dragging --release--> Hovering
///                               |  ^
///                     alt+press |  | move away while armed -> Idle
///                               v  |
///                           DeleteArmed --release--> Idle (vertex deleted)
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VertexEditState {
    #[default]
    Idle,
    Hovering(VertexRef),
    Dragging {
        vertex: VertexRef,
        /// Payload when the drag started
        original: AnnotationData,
        position: Point,
    },
    DeleteArmed(VertexRef),
}

impl VertexEditState {
    pub fn context(&self) -> Option<EditContext> {
        match self {
            VertexEditState::Idle => None,
            VertexEditState::Hovering(vertex) => Some(EditContext::Hover(vertex.clone())),
            VertexEditState::Dragging { vertex, position, .. } => Some(EditContext::Move {
                vertex: vertex.clone(),
                position: *position,
            }),
            VertexEditState::DeleteArmed(vertex) => Some(EditContext::DeleteVertex(vertex.clone())),
        }
    }
}

/// Minimum vertices a path of this payload must keep.
fn min_vertices(data: &AnnotationData) -> usize {
    match data {
        AnnotationData::Line(_) => 2,
        _ => MIN_POLYGON_VERTICES,
    }
}

/// Find the vertex under `point`, searching the selection first and then
/// every annotation from the top.
pub fn vertex_at(view: &View, point: &Point, radius: f64) -> Option<VertexRef> {
    let collection = view.collection();
    let selected = view.selection().iter().filter_map(|id| collection.get(id));
    selected
        .chain(collection.iter().rev())
        .find_map(|annotation| {
            let points = annotation.data.path()?;
            let index = path::nearest_vertex(points, point, radius)?;
            Some(VertexRef {
                annotation: annotation.id.clone(),
                index,
            })
        })
}

/// Payload with one vertex moved.
pub fn moved_vertex(data: &AnnotationData, index: usize, position: Point) -> Option<AnnotationData> {
    let mut next = data.clone();
    let vertex = next.path_mut()?.get_mut(index)?;
    *vertex = position;
    Some(next)
}

/// Delete the vertex named by `context`, if the context allows deletion.
///
/// Returns `Ok(false)` when the context is not a delete context.
pub fn delete_vertex(view: &mut View, context: Option<&EditContext>) -> Result<bool, EngineError> {
    let Some(vertex) = as_delete_vertex(context) else {
        return Ok(false);
    };
    let (_, annotation) = view.collection().require(&vertex.annotation)?;
    let mut next = annotation.data.clone();
    let min = min_vertices(&next);
    let Some(points) = next.path_mut() else {
        return Ok(false);
    };
    if vertex.index >= points.len() {
        return Ok(false);
    }
    if points.len() <= min {
        return Err(CreationError::Geometry(GeometryError::TooFewVertices {
            min,
            found: points.len() - 1,
        })
        .into());
    }
    points.remove(vertex.index);

    let action = Action::update(view.collection(), &vertex.annotation, next)?;
    view.perform(action)?;
    log::debug!("🗑️ Deleted vertex {} of {}", vertex.index, vertex.annotation);
    Ok(true)
}

/// Insert the midpoint of the middle segment into a polygon or line.
pub fn insert_midpoint(view: &mut View, id: &AnnotationId) -> Result<(), EngineError> {
    let (_, annotation) = view.collection().require(id)?;
    let mut next = annotation.data.clone();
    let points = next.path_mut().ok_or_else(|| CreationError::WrongType {
        id: id.clone(),
        expected: AnnotationType::Polygon,
    })?;
    let too_short = CreationError::Geometry(GeometryError::TooFewVertices {
        min: 2,
        found: points.len(),
    });
    let (_, after) = path::middle_segment(points).ok_or_else(|| too_short.clone())?;
    let midpoint = path::middle_segment_midpoint(points).ok_or(too_short)?;
    points.insert(after, midpoint);

    let action = Action::update(view.collection(), id, next)?;
    view.perform(action)?;
    Ok(())
}
