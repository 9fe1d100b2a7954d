//! Error types for geometry operations.

use thiserror::Error;

/// Errors produced by path measurements, boolean operations and interpolation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A path has fewer vertices than the operation needs.
    #[error("Path needs at least {min} vertices, found {found}")]
    TooFewVertices {
        /// Minimum number of vertices required
        min: usize,
        /// Number of vertices present
        found: usize,
    },

    /// A path encloses no area.
    #[error("Path encloses zero area")]
    ZeroArea,

    /// A ring crosses itself or another ring of the same polygon.
    #[error("Polygon is self-intersecting")]
    SelfIntersecting,

    /// A boolean operation would produce an empty or zero-area result.
    #[error("{operation} produced a degenerate result")]
    DegenerateResult {
        /// Name of the operation that failed
        operation: &'static str,
    },

    /// The boolean output edges could not be stitched into closed rings.
    #[error("Could not assemble closed rings from {operation} output")]
    OpenRing {
        /// Name of the operation that failed
        operation: &'static str,
    },

    /// Interpolation endpoints have a different number of points.
    #[error("Point count mismatch: initial has {initial}, final has {target}")]
    PointCountMismatch {
        /// Points in the initial snapshot
        initial: usize,
        /// Points in the final snapshot
        target: usize,
    },

    /// Interpolation progress outside `[0, 1]` or not finite.
    #[error("Interpolation progress {0} is outside [0, 1]")]
    InvalidProgress(f64),

    /// A path with no vertices was interpolated by an algorithm that rejects them.
    #[error("Cannot interpolate an empty path with {algorithm}")]
    EmptyPath {
        /// Algorithm tag that rejected the path
        algorithm: &'static str,
    },

    /// Unknown interpolation algorithm tag.
    #[error("Unknown interpolation algorithm '{0}'")]
    UnknownAlgorithm(String),
}
