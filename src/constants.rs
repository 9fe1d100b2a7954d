//! Engine-wide default values.

/// Maximum number of actions kept in an undo history.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Hit radius for grabbing a vertex (in canvas pixels).
pub const DEFAULT_VERTEX_HIT_RADIUS: f64 = 5.5;

/// Distance to the first vertex at which a click closes a polygon (in canvas pixels).
pub const DEFAULT_POLYGON_CLOSE_THRESHOLD: f64 = 10.0;

/// Minimum width and height for a bounding box (in image pixels).
pub const DEFAULT_MIN_BBOX_SIZE: f64 = 1.0;

/// Hit radius for selecting keypoints and lines (in canvas pixels).
pub const DEFAULT_ANNOTATION_HIT_RADIUS: f64 = 8.0;

/// Minimum number of vertices in a polygon path.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum number of vertices in a polyline.
pub const MIN_LINE_VERTICES: usize = 2;

/// Default playback rate for video sessions.
pub const DEFAULT_VIDEO_FPS: f64 = 25.0;

/// Name of the worker thread that decodes images.
pub const IMAGE_DECODER_THREAD_NAME: &str = "image-decoder";
