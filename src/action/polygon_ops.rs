//! Merge and subtract of polygon annotations as single undoable actions.

use annotator_geometry::boolean;

use super::Action;
use crate::error::{ActionError, CreationError, EngineError};
use crate::model::{Annotation, AnnotationCollection, AnnotationData, AnnotationId, AnnotationType, PolygonData};

fn polygon_at<'a>(
    collection: &'a AnnotationCollection,
    id: &AnnotationId,
) -> Result<(usize, &'a Annotation, &'a PolygonData), EngineError> {
    let (index, annotation) = collection.require(id)?;
    match &annotation.data {
        AnnotationData::Polygon(polygon) => Ok((index, annotation, polygon)),
        _ => Err(CreationError::WrongType {
            id: id.clone(),
            expected: AnnotationType::Polygon,
        }
        .into()),
    }
}

fn distinct(first: &AnnotationId, second: &AnnotationId) -> Result<(), EngineError> {
    if first == second {
        return Err(ActionError::DuplicateId(first.clone()).into());
    }
    Ok(())
}

/// Build an action replacing both polygons with their union.
///
/// The merged annotation gets a new id, takes class and sub-annotations from
/// `first`, and is placed at the lower of the two positions.
pub fn merge(
    collection: &AnnotationCollection,
    first: &AnnotationId,
    second: &AnnotationId,
) -> Result<Action, EngineError> {
    distinct(first, second)?;
    let (ia, a, pa) = polygon_at(collection, first)?;
    let (ib, b, pb) = polygon_at(collection, second)?;

    let rings = boolean::union(&pa.rings(), &pb.rings()).map_err(CreationError::from)?;
    let data = PolygonData::from_rings(rings).ok_or(CreationError::Geometry(
        annotator_geometry::GeometryError::DegenerateResult { operation: "union" },
    ))?;

    let merged = Annotation {
        id: AnnotationId::generate(),
        class_id: a.class_id,
        data: AnnotationData::Polygon(data),
        sub_annotations: a.sub_annotations.clone(),
    };

    let mut removed = vec![(ia, a.clone()), (ib, b.clone())];
    removed.sort_by_key(|(index, _)| *index);

    log::debug!("🔗 Merge {} + {} -> {}", first, second, merged.id);
    Ok(Action::Replace {
        removed,
        added: vec![(ia.min(ib), merged)],
    })
}

/// Build an action cutting `second` out of `first`.
///
/// `first` keeps its id and position; `second` is left untouched.
pub fn subtract(
    collection: &AnnotationCollection,
    first: &AnnotationId,
    second: &AnnotationId,
) -> Result<Action, EngineError> {
    distinct(first, second)?;
    let (_, a, pa) = polygon_at(collection, first)?;
    let (_, _, pb) = polygon_at(collection, second)?;

    let rings = boolean::difference(&pa.rings(), &pb.rings()).map_err(CreationError::from)?;
    let data = PolygonData::from_rings(rings).ok_or(CreationError::Geometry(
        annotator_geometry::GeometryError::DegenerateResult {
            operation: "difference",
        },
    ))?;

    log::debug!("✂️ Subtract {} - {}", first, second);
    Ok(Action::UpdateData {
        id: a.id.clone(),
        previous: a.data.clone(),
        next: AnnotationData::Polygon(data),
    })
}
