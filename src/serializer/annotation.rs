//! Whole-annotation JSON documents.
//!
//! An image annotation is a flat object:
//! `{ "id", "annotation_class_id", "<main type>": {...}, "<sub type>": {...} }`.
//! A video annotation keeps one such payload set per keyframe under `frames`.

use std::collections::BTreeMap;

use annotator_geometry::InterpolationAlgorithm;
use serde_json::{Map, Value};

use super::SerializerRegistry;
use crate::error::SerializationError;
use crate::model::{Annotation, AnnotationData, AnnotationId, AnnotationType, Keyframe, Segment, VideoAnnotation};

const ID: &str = "id";
const CLASS_ID: &str = "annotation_class_id";
const FRAMES: &str = "frames";
const SEGMENTS: &str = "segments";
const INTERPOLATED: &str = "interpolated";
const ALGORITHM: &str = "interpolate_algorithm";

// ============================================================================
// Payload sets
// ============================================================================

fn write_payloads(
    registry: &SerializerRegistry,
    data: &AnnotationData,
    subs: &BTreeMap<AnnotationType, AnnotationData>,
    object: &mut Map<String, Value>,
) -> Result<(), SerializationError> {
    object.insert(data.ty().name().to_string(), registry.get(data.ty())?.serialize(data)?);
    for (ty, sub) in subs {
        object.insert(ty.name().to_string(), registry.get(*ty)?.serialize(sub)?);
    }
    Ok(())
}

/// Decode every type key of `object` except `reserved`, splitting main from sub types.
fn read_payloads(
    registry: &SerializerRegistry,
    object: &Map<String, Value>,
    reserved: &[&str],
) -> Result<Keyframe, SerializationError> {
    let mut main = Vec::new();
    let mut subs = BTreeMap::new();
    for (key, value) in object.iter().filter(|(k, _)| !reserved.contains(&k.as_str())) {
        let data = registry.deserialize_typed(key, value)?;
        if data.ty().is_main() {
            main.push(data);
        } else {
            subs.insert(data.ty(), data);
        }
    }
    if main.len() != 1 {
        return Err(SerializationError::MainTypeCount(main.len()));
    }
    let data = main.remove(0);
    Ok(Keyframe {
        data,
        sub_annotations: subs,
    })
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, SerializationError> {
    value
        .as_object()
        .ok_or_else(|| SerializationError::malformed(what, "expected an object"))
}

fn read_header(object: &Map<String, Value>) -> Result<(AnnotationId, u32), SerializationError> {
    let id = object
        .get(ID)
        .ok_or_else(|| SerializationError::missing_field(ID))?
        .as_str()
        .ok_or_else(|| SerializationError::malformed(ID, "expected a string"))?;
    let class_id = object
        .get(CLASS_ID)
        .ok_or_else(|| SerializationError::missing_field(CLASS_ID))?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| SerializationError::malformed(CLASS_ID, "expected an unsigned integer"))?;
    Ok((AnnotationId::from(id), class_id))
}

fn write_header(id: &AnnotationId, class_id: u32) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert(ID.to_string(), Value::String(id.as_str().to_string()));
    object.insert(CLASS_ID.to_string(), Value::from(class_id));
    object
}

// ============================================================================
// Image annotations
// ============================================================================

pub fn serialize_annotation(registry: &SerializerRegistry, annotation: &Annotation) -> Result<Value, SerializationError> {
    let mut object = write_header(&annotation.id, annotation.class_id);
    write_payloads(registry, &annotation.data, &annotation.sub_annotations, &mut object)?;
    Ok(Value::Object(object))
}

pub fn deserialize_annotation(registry: &SerializerRegistry, value: &Value) -> Result<Annotation, SerializationError> {
    let object = as_object(value, "annotation")?;
    let (id, class_id) = read_header(object)?;
    let keyframe = read_payloads(registry, object, &[ID, CLASS_ID])?;
    Ok(Annotation {
        id,
        class_id,
        data: keyframe.data,
        sub_annotations: keyframe.sub_annotations,
    })
}

// ============================================================================
// Video annotations
// ============================================================================

pub fn serialize_video_annotation(
    registry: &SerializerRegistry,
    video: &VideoAnnotation,
) -> Result<Value, SerializationError> {
    let mut object = write_header(&video.id, video.class_id);

    let mut frames = Map::new();
    for (frame, keyframe) in &video.frames {
        let mut payloads = Map::new();
        write_payloads(registry, &keyframe.data, &keyframe.sub_annotations, &mut payloads)?;
        frames.insert(frame.to_string(), Value::Object(payloads));
    }
    object.insert(FRAMES.to_string(), Value::Object(frames));

    let segments = serde_json::to_value(&video.segments).map_err(|e| SerializationError::malformed(SEGMENTS, e))?;
    object.insert(SEGMENTS.to_string(), segments);
    object.insert(INTERPOLATED.to_string(), Value::Bool(video.interpolated));
    object.insert(ALGORITHM.to_string(), Value::String(video.algorithm.as_str().to_string()));
    Ok(Value::Object(object))
}

pub fn deserialize_video_annotation(
    registry: &SerializerRegistry,
    value: &Value,
) -> Result<VideoAnnotation, SerializationError> {
    let object = as_object(value, "video annotation")?;
    let (id, class_id) = read_header(object)?;

    let frames_object = as_object(
        object.get(FRAMES).ok_or_else(|| SerializationError::missing_field(FRAMES))?,
        FRAMES,
    )?;
    let mut frames = BTreeMap::new();
    for (key, payloads) in frames_object {
        let frame: u32 = key
            .parse()
            .map_err(|_| SerializationError::malformed(FRAMES, format!("invalid frame index '{}'", key)))?;
        frames.insert(frame, read_payloads(registry, as_object(payloads, FRAMES)?, &[])?);
    }

    // Global annotations carry no segments
    let segments: Vec<Segment> = match object.get(SEGMENTS) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| SerializationError::malformed(SEGMENTS, e))?,
    };

    let interpolated = match object.get(INTERPOLATED) {
        None => false,
        Some(value) => value
            .as_bool()
            .ok_or_else(|| SerializationError::malformed(INTERPOLATED, "expected a boolean"))?,
    };

    let algorithm = match object.get(ALGORITHM) {
        None => InterpolationAlgorithm::default(),
        Some(value) => value
            .as_str()
            .ok_or_else(|| SerializationError::malformed(ALGORITHM, "expected a string"))?
            .parse()
            .map_err(|e| SerializationError::malformed(ALGORITHM, e))?,
    };

    Ok(VideoAnnotation {
        id,
        class_id,
        frames,
        segments,
        interpolated,
        algorithm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KeypointData, PolygonData, TextData};
    use crate::plugin::HandleId;
    use annotator_geometry::Point;
    use serde_json::json;

    fn registry() -> SerializerRegistry {
        SerializerRegistry::with_builtins(HandleId(0))
    }

    #[test]
    fn test_annotation_document_shape() {
        let annotation = Annotation::with_id(
            "a1".into(),
            3,
            AnnotationData::Keypoint(KeypointData { x: 1.0, y: 2.0 }),
        )
        .with_sub(AnnotationData::Text(TextData { text: "nose".into() }));

        let value = serialize_annotation(&registry(), &annotation).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "annotation_class_id": 3,
                "keypoint": { "x": 1.0, "y": 2.0 },
                "text": { "text": "nose" }
            })
        );
        assert_eq!(deserialize_annotation(&registry(), &value).unwrap(), annotation);
    }

    #[test]
    fn test_annotation_requires_one_main_type() {
        let none = json!({ "id": "a", "annotation_class_id": 1, "text": { "text": "x" } });
        assert_eq!(
            deserialize_annotation(&registry(), &none),
            Err(SerializationError::MainTypeCount(0))
        );

        let two = json!({
            "id": "a",
            "annotation_class_id": 1,
            "keypoint": { "x": 0.0, "y": 0.0 },
            "tag": {}
        });
        assert_eq!(
            deserialize_annotation(&registry(), &two),
            Err(SerializationError::MainTypeCount(2))
        );
    }

    #[test]
    fn test_annotation_missing_fields() {
        let value = json!({ "annotation_class_id": 1, "tag": {} });
        assert_eq!(
            deserialize_annotation(&registry(), &value),
            Err(SerializationError::MissingField("id".into()))
        );
        let value = json!({ "id": "a", "tag": {} });
        assert_eq!(
            deserialize_annotation(&registry(), &value),
            Err(SerializationError::MissingField("annotation_class_id".into()))
        );
    }

    #[test]
    fn test_annotation_unknown_key() {
        let value = json!({ "id": "a", "annotation_class_id": 1, "tag": {}, "brush": {} });
        assert_eq!(
            deserialize_annotation(&registry(), &value),
            Err(SerializationError::UnknownType("brush".into()))
        );
    }

    #[test]
    fn test_video_roundtrip() {
        let square = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let mut video = VideoAnnotation::with_id(
            "v1".into(),
            2,
            0,
            Keyframe::new(AnnotationData::Polygon(PolygonData::new(square.clone()))),
        );
        video.set_keyframe(
            8,
            Keyframe::new(AnnotationData::Polygon(PolygonData::new(
                square.iter().map(|p| *p + Point::new(4.0, 0.0)).collect(),
            ))),
        );
        video.algorithm = InterpolationAlgorithm::Linear1_0;

        let value = serialize_video_annotation(&registry(), &video).unwrap();
        assert_eq!(value["segments"], json!([[0, 9]]));
        assert_eq!(value["interpolate_algorithm"], json!("linear-1.0"));
        assert!(value["frames"]["8"]["polygon"].is_object());

        assert_eq!(deserialize_video_annotation(&registry(), &value).unwrap(), video);
    }

    #[test]
    fn test_video_bad_frame_key() {
        let value = json!({
            "id": "v",
            "annotation_class_id": 1,
            "frames": { "first": { "tag": {} } }
        });
        assert!(matches!(
            deserialize_video_annotation(&registry(), &value),
            Err(SerializationError::Malformed { .. })
        ));
    }
}
