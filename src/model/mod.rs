//! Data models for the annotation engine.

mod annotation;
mod class;
mod collection;
pub mod interpolation;
pub mod raster;
mod video;

pub use annotation::{
    Annotation, AnnotationData, AnnotationId, AnnotationType, AttributesData, BoundingBoxData,
    CuboidData, DirectionalVectorData, EllipseData, Granularity, InstanceIdData, KeypointData,
    LineData, MaskData, MeasureUnit, MeasuresData, PolygonData, RasterLayerData, SkeletonData,
    SkeletonNode, TagData, TextData,
};
pub use class::{AnnotationClass, ClassCatalog, SkeletonTemplateNode};
pub use collection::AnnotationCollection;
pub use raster::Raster;
pub use video::{Keyframe, Segment, VideoAnnotation};
