//! Annotation instances and their type-specific payloads.

use std::collections::BTreeMap;
use std::fmt;

use annotator_geometry::path::{self, Path};
use annotator_geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identity
// ============================================================================

/// Stable unique identifier of an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AnnotationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Type vocabulary
// ============================================================================

/// Whether a type stands on its own or decorates another annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Main,
    Sub,
}

/// Fixed vocabulary of annotation type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    BoundingBox,
    Cuboid,
    DirectionalVector,
    Ellipse,
    Line,
    Polygon,
    Skeleton,
    Tag,
    Keypoint,
    Attributes,
    Text,
    InstanceId,
    Measures,
    Mask,
    RasterLayer,
}

impl AnnotationType {
    /// Transport key for this type.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationType::BoundingBox => "bounding_box",
            AnnotationType::Cuboid => "cuboid",
            AnnotationType::DirectionalVector => "directional_vector",
            AnnotationType::Ellipse => "ellipse",
            AnnotationType::Line => "line",
            AnnotationType::Polygon => "polygon",
            AnnotationType::Skeleton => "skeleton",
            AnnotationType::Tag => "tag",
            AnnotationType::Keypoint => "keypoint",
            AnnotationType::Attributes => "attributes",
            AnnotationType::Text => "text",
            AnnotationType::InstanceId => "instance_id",
            AnnotationType::Measures => "measures",
            AnnotationType::Mask => "mask",
            AnnotationType::RasterLayer => "raster_layer",
        }
    }

    /// Look up a type by its transport key.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.name() == name)
    }

    pub fn all() -> &'static [AnnotationType] {
        &[
            AnnotationType::BoundingBox,
            AnnotationType::Cuboid,
            AnnotationType::DirectionalVector,
            AnnotationType::Ellipse,
            AnnotationType::Line,
            AnnotationType::Polygon,
            AnnotationType::Skeleton,
            AnnotationType::Tag,
            AnnotationType::Keypoint,
            AnnotationType::Attributes,
            AnnotationType::Text,
            AnnotationType::InstanceId,
            AnnotationType::Measures,
            AnnotationType::Mask,
            AnnotationType::RasterLayer,
        ]
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            AnnotationType::Attributes
            | AnnotationType::Text
            | AnnotationType::InstanceId
            | AnnotationType::DirectionalVector
            | AnnotationType::Measures => Granularity::Sub,
            _ => Granularity::Main,
        }
    }

    pub fn is_main(&self) -> bool {
        self.granularity() == Granularity::Main
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Axis-aligned box given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxData {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBoxData {
    /// Normalized box spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let rect = Rect::from_corners(a, b);
        Self::from_rect(&rect)
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            x: rect.min.x,
            y: rect.min.y,
            w: rect.width(),
            h: rect.height(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_corners(Point::new(self.x, self.y), Point::new(self.x + self.w, self.y + self.h))
    }

    /// Corners in clockwise order starting top-left (y down).
    pub fn corners(&self) -> Path {
        vec![
            Point::new(self.x, self.y),
            Point::new(self.x + self.w, self.y),
            Point::new(self.x + self.w, self.y + self.h),
            Point::new(self.x, self.y + self.h),
        ]
    }
}

/// Front and back faces of a cuboid projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuboidData(pub BoundingBoxData, pub BoundingBoxData);

impl CuboidData {
    pub fn front(&self) -> &BoundingBoxData {
        &self.0
    }

    pub fn back(&self) -> &BoundingBoxData {
        &self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalVectorData {
    /// Radians from the positive x axis
    pub angle: f64,
    #[serde(alias = "lenght")]
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseData {
    /// Rotation in radians
    pub angle: f64,
    pub center: Point,
    /// Semi-axes along the rotated x and y directions
    pub radius: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub path: Path,
}

/// Polygon with an outer path and optional extra rings (holes or islands).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonData {
    pub path: Path,
    #[serde(rename = "additionalPaths", alias = "additional_paths", default)]
    pub additional_paths: Vec<Path>,
}

impl PolygonData {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            additional_paths: Vec::new(),
        }
    }

    /// All rings, main path first.
    pub fn rings(&self) -> Vec<Path> {
        std::iter::once(self.path.clone())
            .chain(self.additional_paths.iter().cloned())
            .collect()
    }

    /// Build from boolean-operation output: the first ring becomes the main path.
    pub fn from_rings(mut rings: Vec<Path>) -> Option<Self> {
        if rings.is_empty() {
            return None;
        }
        let path = rings.remove(0);
        Some(Self {
            path,
            additional_paths: rings,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub occluded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonData {
    pub nodes: Vec<SkeletonNode>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagData {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeypointData {
    pub x: f64,
    pub y: f64,
}

impl KeypointData {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributesData {
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceIdData {
    pub value: u64,
}

/// Unit names for each axis of a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureUnit {
    pub x: String,
    pub y: String,
}

/// Physical extent of the annotation it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuresData {
    pub delta: Point,
    pub unit: MeasureUnit,
}

/// Mask annotation; its pixels live in the frame's raster layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse_rle: Option<Vec<u32>>,
}

/// Label buffer shared by all mask annotations of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterLayerData {
    pub dense_rle: Vec<u32>,
    pub mask_annotation_ids_mapping: BTreeMap<AnnotationId, u8>,
    pub total_pixels: usize,
}

/// Type-tagged annotation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationData {
    BoundingBox(BoundingBoxData),
    Cuboid(CuboidData),
    DirectionalVector(DirectionalVectorData),
    Ellipse(EllipseData),
    Line(LineData),
    Polygon(PolygonData),
    Skeleton(SkeletonData),
    Tag(TagData),
    Keypoint(KeypointData),
    Attributes(AttributesData),
    Text(TextData),
    InstanceId(InstanceIdData),
    Measures(MeasuresData),
    Mask(MaskData),
    RasterLayer(RasterLayerData),
}

impl AnnotationData {
    pub fn ty(&self) -> AnnotationType {
        match self {
            AnnotationData::BoundingBox(_) => AnnotationType::BoundingBox,
            AnnotationData::Cuboid(_) => AnnotationType::Cuboid,
            AnnotationData::DirectionalVector(_) => AnnotationType::DirectionalVector,
            AnnotationData::Ellipse(_) => AnnotationType::Ellipse,
            AnnotationData::Line(_) => AnnotationType::Line,
            AnnotationData::Polygon(_) => AnnotationType::Polygon,
            AnnotationData::Skeleton(_) => AnnotationType::Skeleton,
            AnnotationData::Tag(_) => AnnotationType::Tag,
            AnnotationData::Keypoint(_) => AnnotationType::Keypoint,
            AnnotationData::Attributes(_) => AnnotationType::Attributes,
            AnnotationData::Text(_) => AnnotationType::Text,
            AnnotationData::InstanceId(_) => AnnotationType::InstanceId,
            AnnotationData::Measures(_) => AnnotationType::Measures,
            AnnotationData::Mask(_) => AnnotationType::Mask,
            AnnotationData::RasterLayer(_) => AnnotationType::RasterLayer,
        }
    }

    /// The editable vertex path for path-based types.
    pub fn path(&self) -> Option<&Path> {
        match self {
            AnnotationData::Polygon(p) => Some(&p.path),
            AnnotationData::Line(l) => Some(&l.path),
            _ => None,
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut Path> {
        match self {
            AnnotationData::Polygon(p) => Some(&mut p.path),
            AnnotationData::Line(l) => Some(&mut l.path),
            _ => None,
        }
    }

    /// Bounding rectangle of the geometry, for types that have one.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            AnnotationData::BoundingBox(b) => Some(b.rect()),
            AnnotationData::Cuboid(c) => Some(c.front().rect().union(&c.back().rect())),
            AnnotationData::Ellipse(e) => {
                let r = e.radius.x.abs().max(e.radius.y.abs());
                Some(Rect::from_corners(
                    e.center - Point::new(r, r),
                    e.center + Point::new(r, r),
                ))
            }
            AnnotationData::Line(l) => path::bounding_rect(&l.path),
            AnnotationData::Polygon(p) => {
                path::bounding_rect_all(std::iter::once(&p.path).chain(&p.additional_paths))
            }
            AnnotationData::Skeleton(s) => {
                let points: Path = s.nodes.iter().map(|n| Point::new(n.x, n.y)).collect();
                path::bounding_rect(&points)
            }
            AnnotationData::Keypoint(k) => Some(Rect::from_corners(k.point(), k.point())),
            _ => None,
        }
    }

    /// Hit test in image space. `radius` applies to point-like and line types.
    pub fn hit_test(&self, point: &Point, radius: f64) -> bool {
        match self {
            AnnotationData::BoundingBox(b) => b.rect().contains(point),
            AnnotationData::Cuboid(c) => c.front().rect().contains(point) || c.back().rect().contains(point),
            AnnotationData::Ellipse(e) => {
                if e.radius.x == 0.0 || e.radius.y == 0.0 {
                    return false;
                }
                let local = *point - e.center;
                let (sin, cos) = (-e.angle).sin_cos();
                let rotated = Point::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos);
                (rotated.x / e.radius.x).powi(2) + (rotated.y / e.radius.y).powi(2) <= 1.0
            }
            AnnotationData::Line(l) => l
                .path
                .windows(2)
                .any(|w| path::distance_to_segment(point, &w[0], &w[1]) <= radius),
            AnnotationData::Polygon(p) => path::contains_point_in_rings(&p.rings(), point),
            AnnotationData::Skeleton(s) => s
                .nodes
                .iter()
                .any(|n| Point::new(n.x, n.y).distance_to(point) <= radius),
            AnnotationData::Keypoint(k) => k.point().distance_to(point) <= radius,
            _ => false,
        }
    }

    /// Move the geometry by `delta`. Non-spatial payloads are unchanged.
    pub fn translate(&mut self, delta: Point) {
        match self {
            AnnotationData::BoundingBox(b) => {
                b.x += delta.x;
                b.y += delta.y;
            }
            AnnotationData::Cuboid(c) => {
                for face in [&mut c.0, &mut c.1] {
                    face.x += delta.x;
                    face.y += delta.y;
                }
            }
            AnnotationData::Ellipse(e) => e.center += delta,
            AnnotationData::Line(l) => l.path = path::translate(&l.path, delta),
            AnnotationData::Polygon(p) => {
                p.path = path::translate(&p.path, delta);
                for ring in &mut p.additional_paths {
                    *ring = path::translate(ring, delta);
                }
            }
            AnnotationData::Skeleton(s) => {
                for node in &mut s.nodes {
                    node.x += delta.x;
                    node.y += delta.y;
                }
            }
            AnnotationData::Keypoint(k) => {
                k.x += delta.x;
                k.y += delta.y;
            }
            _ => {}
        }
    }
}

// ============================================================================
// Annotation
// ============================================================================

/// A single annotation instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Unique identifier, never reused
    pub id: AnnotationId,
    /// Annotation class this instance belongs to
    pub class_id: u32,
    /// Main payload; its variant is the annotation's type
    pub data: AnnotationData,
    /// Sub-annotations keyed by their type
    pub sub_annotations: BTreeMap<AnnotationType, AnnotationData>,
}

impl Annotation {
    /// Create an annotation with a freshly generated id.
    pub fn new(class_id: u32, data: AnnotationData) -> Self {
        Self::with_id(AnnotationId::generate(), class_id, data)
    }

    pub fn with_id(id: AnnotationId, class_id: u32, data: AnnotationData) -> Self {
        Self {
            id,
            class_id,
            data,
            sub_annotations: BTreeMap::new(),
        }
    }

    /// Builder-style sub-annotation attach.
    pub fn with_sub(mut self, data: AnnotationData) -> Self {
        self.sub_annotations.insert(data.ty(), data);
        self
    }

    pub fn ty(&self) -> AnnotationType {
        self.data.ty()
    }

    pub fn sub(&self, ty: AnnotationType) -> Option<&AnnotationData> {
        self.sub_annotations.get(&ty)
    }
}
