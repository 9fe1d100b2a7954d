//! Per-type interpolation of annotation payloads between two keyframes.

use annotator_geometry::{GeometryError, InterpolationParams};

use super::annotation::{
    AnnotationData, AnnotationType, BoundingBoxData, CuboidData, DirectionalVectorData,
    EllipseData, KeypointData, LineData, PolygonData, SkeletonData, SkeletonNode,
};

/// Whether payloads of this type are blended between keyframes.
///
/// Other types hold the previous keyframe's value.
pub fn supports_interpolation(ty: AnnotationType) -> bool {
    matches!(
        ty,
        AnnotationType::BoundingBox
            | AnnotationType::Cuboid
            | AnnotationType::DirectionalVector
            | AnnotationType::Ellipse
            | AnnotationType::Line
            | AnnotationType::Polygon
            | AnnotationType::Skeleton
            | AnnotationType::Keypoint
    )
}

fn lerp_box(a: &BoundingBoxData, b: &BoundingBoxData, params: &InterpolationParams) -> BoundingBoxData {
    BoundingBoxData {
        x: params.scalar(a.x, b.x),
        y: params.scalar(a.y, b.y),
        w: params.scalar(a.w, b.w),
        h: params.scalar(a.h, b.h),
    }
}

fn lerp_polygon(
    a: &PolygonData,
    b: &PolygonData,
    params: &InterpolationParams,
) -> Result<PolygonData, GeometryError> {
    if a.additional_paths.len() != b.additional_paths.len() {
        return Err(GeometryError::PointCountMismatch {
            initial: a.additional_paths.len(),
            target: b.additional_paths.len(),
        });
    }
    let path = params.path(&a.path, &b.path)?;
    let additional_paths = a
        .additional_paths
        .iter()
        .zip(&b.additional_paths)
        .map(|(ra, rb)| params.path(ra, rb))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PolygonData {
        path,
        additional_paths,
    })
}

fn lerp_skeleton(
    a: &SkeletonData,
    b: &SkeletonData,
    params: &InterpolationParams,
) -> Result<SkeletonData, GeometryError> {
    if a.nodes.len() != b.nodes.len() {
        return Err(GeometryError::PointCountMismatch {
            initial: a.nodes.len(),
            target: b.nodes.len(),
        });
    }
    let nodes = a
        .nodes
        .iter()
        .zip(&b.nodes)
        .map(|(na, nb)| SkeletonNode {
            name: na.name.clone(),
            x: params.scalar(na.x, nb.x),
            y: params.scalar(na.y, nb.y),
            occluded: na.occluded,
        })
        .collect();
    Ok(SkeletonData { nodes })
}

/// Blend two payloads of the same type.
///
/// Returns `Ok(None)` when the types differ or the type does not interpolate;
/// callers fall back to the previous keyframe.
pub fn interpolate_data(
    initial: &AnnotationData,
    target: &AnnotationData,
    params: InterpolationParams,
) -> Result<Option<AnnotationData>, GeometryError> {
    let data = match (initial, target) {
        (AnnotationData::BoundingBox(a), AnnotationData::BoundingBox(b)) => {
            AnnotationData::BoundingBox(lerp_box(a, b, &params))
        }
        (AnnotationData::Cuboid(a), AnnotationData::Cuboid(b)) => AnnotationData::Cuboid(CuboidData(
            lerp_box(&a.0, &b.0, &params),
            lerp_box(&a.1, &b.1, &params),
        )),
        (AnnotationData::DirectionalVector(a), AnnotationData::DirectionalVector(b)) => {
            AnnotationData::DirectionalVector(DirectionalVectorData {
                angle: params.angle(a.angle, b.angle),
                length: params.scalar(a.length, b.length),
            })
        }
        (AnnotationData::Ellipse(a), AnnotationData::Ellipse(b)) => AnnotationData::Ellipse(EllipseData {
            angle: params.angle(a.angle, b.angle),
            center: params.point(&a.center, &b.center),
            radius: params.point(&a.radius, &b.radius),
        }),
        (AnnotationData::Line(a), AnnotationData::Line(b)) => AnnotationData::Line(LineData {
            path: params.path(&a.path, &b.path)?,
        }),
        (AnnotationData::Polygon(a), AnnotationData::Polygon(b)) => {
            AnnotationData::Polygon(lerp_polygon(a, b, &params)?)
        }
        (AnnotationData::Skeleton(a), AnnotationData::Skeleton(b)) => {
            AnnotationData::Skeleton(lerp_skeleton(a, b, &params)?)
        }
        (AnnotationData::Keypoint(a), AnnotationData::Keypoint(b)) => {
            let p = params.point(&a.point(), &b.point());
            AnnotationData::Keypoint(KeypointData { x: p.x, y: p.y })
        }
        _ => return Ok(None),
    };
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotator_geometry::{InterpolationAlgorithm, Point};

    fn params(progress: f64) -> InterpolationParams {
        InterpolationParams::new(InterpolationAlgorithm::Linear1_1, progress).unwrap()
    }

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> AnnotationData {
        AnnotationData::BoundingBox(BoundingBoxData { x, y, w, h })
    }

    #[test]
    fn test_bounding_box_endpoints_and_midpoint() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(10.0, 20.0, 30.0, 10.0);
        assert_eq!(interpolate_data(&a, &b, params(0.0)).unwrap(), Some(a.clone()));
        assert_eq!(interpolate_data(&a, &b, params(1.0)).unwrap(), Some(b.clone()));
        assert_eq!(
            interpolate_data(&a, &b, params(0.5)).unwrap(),
            Some(bbox(5.0, 10.0, 20.0, 10.0))
        );
    }

    #[test]
    fn test_polygon_point_count_mismatch() {
        let a = AnnotationData::Polygon(PolygonData::new(vec![Point::new(0.0, 0.0); 3]));
        let b = AnnotationData::Polygon(PolygonData::new(vec![Point::new(1.0, 1.0); 4]));
        assert_eq!(
            interpolate_data(&a, &b, params(0.5)),
            Err(GeometryError::PointCountMismatch {
                initial: 3,
                target: 4
            })
        );
    }

    #[test]
    fn test_non_interpolating_types_return_none() {
        let a = AnnotationData::Tag(Default::default());
        assert_eq!(interpolate_data(&a, &a, params(0.5)).unwrap(), None);
        assert!(!supports_interpolation(AnnotationType::Tag));
    }

    #[test]
    fn test_mismatched_types_return_none() {
        let a = bbox(0.0, 0.0, 1.0, 1.0);
        let b = AnnotationData::Keypoint(KeypointData { x: 0.0, y: 0.0 });
        assert_eq!(interpolate_data(&a, &b, params(0.5)).unwrap(), None);
    }
}
