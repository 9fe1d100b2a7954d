//! Per-type conversion between annotation payloads and their JSON form.
//!
//! Every annotation type has at most one [`Serializer`] in the
//! [`SerializerRegistry`]. Plugins register serializers when they activate and
//! release them when they deactivate; a type with no serializer cannot be
//! read or written.

mod annotation;

use std::collections::HashMap;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SerializationError;
use crate::model::{
    AnnotationData, AnnotationType, AttributesData, BoundingBoxData, CuboidData,
    DirectionalVectorData, EllipseData, InstanceIdData, KeypointData, LineData, MaskData,
    MeasuresData, PolygonData, RasterLayerData, SkeletonData, TagData, TextData,
};
use crate::plugin::HandleId;

pub use annotation::{
    deserialize_annotation, deserialize_video_annotation, serialize_annotation,
    serialize_video_annotation,
};

/// Bidirectional mapping for one annotation type.
pub trait Serializer {
    /// The type this serializer handles.
    fn ty(&self) -> AnnotationType;

    fn serialize(&self, data: &AnnotationData) -> Result<Value, SerializationError>;

    fn deserialize(&self, value: &Value) -> Result<AnnotationData, SerializationError>;
}

/// A payload struct that is the data of exactly one [`AnnotationData`] variant.
pub trait Payload: Serialize + DeserializeOwned {
    const TYPE: AnnotationType;

    fn into_data(self) -> AnnotationData;

    fn from_data(data: &AnnotationData) -> Option<&Self>;
}

macro_rules! impl_payload {
    ($($payload:ty => $variant:ident),* $(,)?) => {
        $(
            impl Payload for $payload {
                const TYPE: AnnotationType = AnnotationType::$variant;

                fn into_data(self) -> AnnotationData {
                    AnnotationData::$variant(self)
                }

                fn from_data(data: &AnnotationData) -> Option<&Self> {
                    match data {
                        AnnotationData::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_payload! {
    BoundingBoxData => BoundingBox,
    CuboidData => Cuboid,
    DirectionalVectorData => DirectionalVector,
    EllipseData => Ellipse,
    LineData => Line,
    PolygonData => Polygon,
    SkeletonData => Skeleton,
    TagData => Tag,
    KeypointData => Keypoint,
    AttributesData => Attributes,
    TextData => Text,
    InstanceIdData => InstanceId,
    MeasuresData => Measures,
    MaskData => Mask,
    RasterLayerData => RasterLayer,
}

/// Serializer for any [`Payload`], going through its serde representation.
pub struct PayloadSerializer<T>(PhantomData<fn() -> T>);

impl<T: Payload> PayloadSerializer<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    pub fn boxed() -> Box<dyn Serializer>
    where
        T: 'static,
    {
        Box::new(Self::new())
    }
}

impl<T: Payload> Default for PayloadSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> Serializer for PayloadSerializer<T> {
    fn ty(&self) -> AnnotationType {
        T::TYPE
    }

    fn serialize(&self, data: &AnnotationData) -> Result<Value, SerializationError> {
        let payload = T::from_data(data).ok_or(SerializationError::PayloadMismatch {
            expected: T::TYPE,
            found: data.ty(),
        })?;
        serde_json::to_value(payload).map_err(|e| SerializationError::malformed(T::TYPE.name(), e))
    }

    fn deserialize(&self, value: &Value) -> Result<AnnotationData, SerializationError> {
        T::deserialize(value)
            .map(T::into_data)
            .map_err(|e| SerializationError::malformed(T::TYPE.name(), e))
    }
}

/// Serializer for a type, by type. Covers the whole vocabulary.
pub fn builtin_serializer(ty: AnnotationType) -> Box<dyn Serializer> {
    match ty {
        AnnotationType::BoundingBox => PayloadSerializer::<BoundingBoxData>::boxed(),
        AnnotationType::Cuboid => PayloadSerializer::<CuboidData>::boxed(),
        AnnotationType::DirectionalVector => PayloadSerializer::<DirectionalVectorData>::boxed(),
        AnnotationType::Ellipse => PayloadSerializer::<EllipseData>::boxed(),
        AnnotationType::Line => PayloadSerializer::<LineData>::boxed(),
        AnnotationType::Polygon => PayloadSerializer::<PolygonData>::boxed(),
        AnnotationType::Skeleton => PayloadSerializer::<SkeletonData>::boxed(),
        AnnotationType::Tag => PayloadSerializer::<TagData>::boxed(),
        AnnotationType::Keypoint => PayloadSerializer::<KeypointData>::boxed(),
        AnnotationType::Attributes => PayloadSerializer::<AttributesData>::boxed(),
        AnnotationType::Text => PayloadSerializer::<TextData>::boxed(),
        AnnotationType::InstanceId => PayloadSerializer::<InstanceIdData>::boxed(),
        AnnotationType::Measures => PayloadSerializer::<MeasuresData>::boxed(),
        AnnotationType::Mask => PayloadSerializer::<MaskData>::boxed(),
        AnnotationType::RasterLayer => PayloadSerializer::<RasterLayerData>::boxed(),
    }
}

struct Registered {
    owner: HandleId,
    serializer: Box<dyn Serializer>,
}

/// Registry of serializers, one per annotation type.
#[derive(Default)]
pub struct SerializerRegistry {
    serializers: HashMap<AnnotationType, Registered>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a serializer for every type, owned by `owner`.
    pub fn with_builtins(owner: HandleId) -> Self {
        let mut registry = Self::new();
        for ty in AnnotationType::all() {
            registry.register(owner, builtin_serializer(*ty));
        }
        registry
    }

    /// Register a serializer. An existing serializer for the same type is replaced.
    pub fn register(&mut self, owner: HandleId, serializer: Box<dyn Serializer>) {
        let ty = serializer.ty();
        if self.serializers.insert(ty, Registered { owner, serializer }).is_some() {
            log::warn!("Serializer for '{}' replaced", ty);
        }
    }

    /// Remove every serializer owned by `owner`. Returns how many were removed.
    pub fn release(&mut self, owner: HandleId) -> usize {
        let before = self.serializers.len();
        self.serializers.retain(|_, r| r.owner != owner);
        before - self.serializers.len()
    }

    pub fn get(&self, ty: AnnotationType) -> Result<&dyn Serializer, SerializationError> {
        self.serializers
            .get(&ty)
            .map(|r| r.serializer.as_ref())
            .ok_or(SerializationError::NotRegistered(ty))
    }

    pub fn contains(&self, ty: AnnotationType) -> bool {
        self.serializers.contains_key(&ty)
    }

    pub fn len(&self) -> usize {
        self.serializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty()
    }

    /// Serialize one payload to `{ "<type>": {...} }`.
    pub fn serialize(&self, data: &AnnotationData) -> Result<Value, SerializationError> {
        let ty = data.ty();
        let value = self.get(ty)?.serialize(data)?;
        let mut object = serde_json::Map::new();
        object.insert(ty.name().to_string(), value);
        Ok(Value::Object(object))
    }

    /// Deserialize one payload from `{ "<type>": {...} }`.
    pub fn deserialize(&self, value: &Value) -> Result<AnnotationData, SerializationError> {
        let object = value
            .as_object()
            .ok_or_else(|| SerializationError::malformed("payload", "expected an object"))?;
        let mut entries = object.iter();
        let (Some((key, inner)), None) = (entries.next(), entries.next()) else {
            return Err(SerializationError::malformed(
                "payload",
                format!("expected exactly one type key, found {}", object.len()),
            ));
        };
        self.deserialize_typed(key, inner)
    }

    /// Deserialize the payload stored under a type key.
    pub fn deserialize_typed(&self, key: &str, value: &Value) -> Result<AnnotationData, SerializationError> {
        let ty = AnnotationType::from_name(key).ok_or_else(|| SerializationError::UnknownType(key.to_string()))?;
        self.get(ty)?.deserialize(value)
    }
}
