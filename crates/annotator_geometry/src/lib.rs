//! Geometry primitives for the annotation engine.
//!
//! Everything here is plain data and pure functions: points and paths in
//! image space, the canvas camera, polygon boolean operations and the
//! interpolation primitives used between video keyframes.

pub mod boolean;
pub mod camera;
pub mod error;
pub mod interpolate;
pub mod path;
pub mod point;

pub use boolean::{difference, union, BooleanOp};
pub use camera::Camera;
pub use error::GeometryError;
pub use interpolate::{lerp_angle, lerp_path, lerp_point, lerp_scalar, InterpolationAlgorithm, InterpolationParams};
pub use path::{Path, Rect};
pub use point::{CanvasPoint, Point, Vector};
