//! Error types for the annotation engine.
//!
//! Each concern has its own error enum so callers can match on the kind of
//! failure; [`EngineError`] wraps all of them for the editor-level API.

use annotator_geometry::GeometryError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::keybindings::KeyParseError;
use crate::model::{AnnotationId, AnnotationType};

/// Annotation or raster construction failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreationError {
    /// The geometry of the new annotation is invalid or degenerate.
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// No annotation class is selected, or the referenced class does not exist.
    #[error("Annotation class {class_id:?} not found")]
    MissingClass {
        /// Class that was requested, if any
        class_id: Option<u32>,
    },

    /// The class does not permit this annotation type.
    #[error("Class '{class}' does not allow '{ty}' annotations")]
    TypeNotAllowed {
        /// Class name
        class: String,
        /// Rejected annotation type
        ty: AnnotationType,
    },

    /// A raster buffer could not be built or decoded.
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// The operation needs a different kind of annotation.
    #[error("Annotation {id} is not a {expected}")]
    WrongType {
        /// Offending annotation
        id: AnnotationId,
        /// Type the operation needs
        expected: AnnotationType,
    },

    /// The annotation has no spatial extent to measure or paint.
    #[error("Annotation {0} has no spatial extent")]
    NoExtent(AnnotationId),

    /// A skeleton class without a node layout.
    #[error("Class '{0}' has no skeleton layout")]
    MissingSkeleton(String),
}

/// Dense RLE and label buffer failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Encoded data must come in (value, length) pairs.
    #[error("Dense RLE length must be a multiple of 2, got {0}")]
    OddLength(usize),

    /// The runs encode more pixels than the buffer holds.
    #[error("Encoded data exceeds total pixels ({total})")]
    Overflow {
        /// Expected number of pixels
        total: usize,
    },

    /// The runs encode fewer pixels than the buffer holds.
    #[error("Not all pixels filled: {filled} of {total}")]
    Underfilled {
        /// Pixels covered by the runs
        filled: usize,
        /// Expected number of pixels
        total: usize,
    },

    /// The pixel count does not describe a whole number of rows.
    #[error("Total pixels {total} is not a multiple of width {width}")]
    ShapeMismatch {
        /// Expected number of pixels
        total: usize,
        /// Row width
        width: usize,
    },

    /// A run value that does not fit a `u8` label.
    #[error("Label value {0} is out of range")]
    InvalidLabel(u32),

    /// All 255 labels are in use.
    #[error("No free label index on raster")]
    LabelsExhausted,
}

/// Converting between annotation data and its transport form failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializationError {
    /// A type key that is not part of the vocabulary.
    #[error("Unknown annotation type '{0}'")]
    UnknownType(String),

    /// A known type with no serializer registered.
    #[error("No serializer registered for '{0}'")]
    NotRegistered(AnnotationType),

    /// A serializer received data of another type.
    #[error("Serializer for '{expected}' received '{found}' data")]
    PayloadMismatch {
        /// Type the serializer handles
        expected: AnnotationType,
        /// Type of the data it was given
        found: AnnotationType,
    },

    /// The transport form has the wrong shape.
    #[error("Malformed '{ty}' payload: {message}")]
    Malformed {
        /// Type key being decoded
        ty: String,
        /// Underlying decoder message
        message: String,
    },

    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// An annotation object carries zero or several main types.
    #[error("Expected exactly one main annotation type, found {0}")]
    MainTypeCount(usize),
}

impl SerializationError {
    /// Create a malformed payload error.
    pub fn malformed(ty: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            ty: ty.into(),
            message: message.to_string(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
}

/// Applying or reverting an action failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// No annotation with this id in the collection.
    #[error("Annotation {0} not found")]
    NotFound(AnnotationId),

    /// An annotation with this id is already in the collection.
    #[error("Annotation {0} already exists")]
    DuplicateId(AnnotationId),

    /// Insert or remove position outside the collection.
    #[error("Index {index} out of bounds for collection of {len}")]
    IndexOutOfBounds {
        /// Requested position
        index: usize,
        /// Collection length
        len: usize,
    },

    /// The collection no longer matches what the action recorded.
    #[error("Annotation {0} changed since the action was recorded")]
    StaleState(AnnotationId),
}

/// Asynchronous image load failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Reading the source failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The bytes are not a decodable image.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The future was polled after it already produced its result.
    #[error("Load result already consumed")]
    Consumed,

    /// The decoder thread could not be started.
    #[error("Failed to spawn decoder thread: {0}")]
    Spawn(String),

    /// The decoder thread exited without reporting a result.
    #[error("Decoder thread disconnected")]
    Disconnected,
}

/// Top-level engine error.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Creation(#[from] CreationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keybinding(#[from] KeyParseError),

    /// No tool registered under this name.
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    /// No command registered under this id.
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    /// No plugin registered under this name.
    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    /// The operation needs an open view.
    #[error("No view is open")]
    NoView,

    /// The operation needs an open video.
    #[error("No video is open")]
    NoVideo,

    /// The operation needs a selected annotation.
    #[error("Nothing is selected")]
    NothingSelected,
}

impl From<RasterError> for EngineError {
    fn from(err: RasterError) -> Self {
        EngineError::Creation(CreationError::Raster(err))
    }
}
