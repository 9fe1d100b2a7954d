//! Linear interpolation primitives for keyframed annotations.
//!
//! Two algorithm revisions exist and are persisted by tag in saved video
//! annotations:
//!
//! - `linear-1.0`: plain linear blending. Angles are blended numerically,
//!   empty paths are rejected.
//! - `linear-1.1`: like 1.0, but angles take the shortest arc and empty paths
//!   interpolate to an empty path.

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::point::Point;

/// Interpolation algorithm revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationAlgorithm {
    #[serde(rename = "linear-1.0")]
    Linear1_0,
    #[default]
    #[serde(rename = "linear-1.1")]
    Linear1_1,
}

impl InterpolationAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpolationAlgorithm::Linear1_0 => "linear-1.0",
            InterpolationAlgorithm::Linear1_1 => "linear-1.1",
        }
    }
}

impl fmt::Display for InterpolationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationAlgorithm {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear-1.0" => Ok(InterpolationAlgorithm::Linear1_0),
            "linear-1.1" => Ok(InterpolationAlgorithm::Linear1_1),
            other => Err(GeometryError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Validated interpolation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationParams {
    pub algorithm: InterpolationAlgorithm,
    progress: f64,
}

impl InterpolationParams {
    /// Progress must be finite and within `[0, 1]`.
    pub fn new(algorithm: InterpolationAlgorithm, progress: f64) -> Result<Self, GeometryError> {
        if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
            return Err(GeometryError::InvalidProgress(progress));
        }
        Ok(Self { algorithm, progress })
    }

    /// Progress between two keyframes: `(frame - prev) / (next - prev)`.
    pub fn between_frames(
        algorithm: InterpolationAlgorithm,
        previous: u32,
        next: u32,
        frame: u32,
    ) -> Result<Self, GeometryError> {
        if next <= previous {
            return Self::new(algorithm, 0.0);
        }
        let progress = (f64::from(frame) - f64::from(previous)) / (f64::from(next) - f64::from(previous));
        Self::new(algorithm, progress)
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn scalar(&self, a: f64, b: f64) -> f64 {
        lerp_scalar(a, b, self.progress)
    }

    pub fn point(&self, a: &Point, b: &Point) -> Point {
        lerp_point(a, b, self.progress)
    }

    pub fn path(&self, a: &[Point], b: &[Point]) -> Result<Vec<Point>, GeometryError> {
        lerp_path(a, b, *self)
    }

    pub fn angle(&self, a: f64, b: f64) -> f64 {
        lerp_angle(a, b, *self)
    }
}

/// `(1 - p) * a + p * b`, exact at both endpoints.
pub fn lerp_scalar(a: f64, b: f64, progress: f64) -> f64 {
    (1.0 - progress) * a + progress * b
}

pub fn lerp_point(a: &Point, b: &Point, progress: f64) -> Point {
    Point::new(lerp_scalar(a.x, b.x, progress), lerp_scalar(a.y, b.y, progress))
}

/// Interpolate two paths vertex by vertex.
pub fn lerp_path(
    a: &[Point],
    b: &[Point],
    params: InterpolationParams,
) -> Result<Vec<Point>, GeometryError> {
    if a.len() != b.len() {
        return Err(GeometryError::PointCountMismatch {
            initial: a.len(),
            target: b.len(),
        });
    }
    if a.is_empty() {
        return match params.algorithm {
            InterpolationAlgorithm::Linear1_0 => Err(GeometryError::EmptyPath {
                algorithm: params.algorithm.as_str(),
            }),
            InterpolationAlgorithm::Linear1_1 => Ok(Vec::new()),
        };
    }
    Ok(a.iter()
        .zip(b)
        .map(|(p, q)| lerp_point(p, q, params.progress))
        .collect())
}

/// Interpolate an angle in radians.
pub fn lerp_angle(a: f64, b: f64, params: InterpolationParams) -> f64 {
    match params.algorithm {
        InterpolationAlgorithm::Linear1_0 => lerp_scalar(a, b, params.progress),
        InterpolationAlgorithm::Linear1_1 => {
            if params.progress == 0.0 {
                return a;
            }
            if params.progress == 1.0 {
                return b;
            }
            let delta = (b - a + PI).rem_euclid(TAU) - PI;
            a + delta * params.progress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(algorithm: InterpolationAlgorithm, progress: f64) -> InterpolationParams {
        InterpolationParams::new(algorithm, progress).unwrap()
    }

    #[test]
    fn test_progress_validation() {
        let alg = InterpolationAlgorithm::Linear1_1;
        assert!(InterpolationParams::new(alg, 0.0).is_ok());
        assert!(InterpolationParams::new(alg, 1.0).is_ok());
        assert_eq!(
            InterpolationParams::new(alg, 1.5),
            Err(GeometryError::InvalidProgress(1.5))
        );
        assert!(InterpolationParams::new(alg, -0.1).is_err());
        assert!(InterpolationParams::new(alg, f64::NAN).is_err());
    }

    #[test]
    fn test_between_frames() {
        let p = InterpolationParams::between_frames(InterpolationAlgorithm::Linear1_1, 10, 20, 15).unwrap();
        assert_eq!(p.progress(), 0.5);
    }

    #[test]
    fn test_path_endpoints_exact() {
        let a = vec![Point::new(0.1, 0.2), Point::new(3.3, 7.7)];
        let b = vec![Point::new(9.9, 4.4), Point::new(-1.1, 2.2)];
        let alg = InterpolationAlgorithm::Linear1_1;
        assert_eq!(lerp_path(&a, &b, params(alg, 0.0)).unwrap(), a);
        assert_eq!(lerp_path(&a, &b, params(alg, 1.0)).unwrap(), b);
        let mid = lerp_path(&a, &b, params(alg, 0.5)).unwrap();
        let expected = [Point::new(5.0, 2.3), Point::new(1.1, 4.95)];
        for (got, want) in mid.iter().zip(expected) {
            assert!(got.distance_to(&want) < 1e-9, "{:?} != {:?}", got, want);
        }
    }

    #[test]
    fn test_path_count_mismatch() {
        let a = vec![Point::new(0.0, 0.0)];
        let b = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        assert_eq!(
            lerp_path(&a, &b, params(InterpolationAlgorithm::Linear1_0, 0.5)),
            Err(GeometryError::PointCountMismatch {
                initial: 1,
                target: 2
            })
        );
    }

    #[test]
    fn test_empty_path_depends_on_algorithm() {
        assert_eq!(
            lerp_path(&[], &[], params(InterpolationAlgorithm::Linear1_0, 0.5)),
            Err(GeometryError::EmptyPath {
                algorithm: "linear-1.0"
            })
        );
        assert_eq!(
            lerp_path(&[], &[], params(InterpolationAlgorithm::Linear1_1, 0.5)),
            Ok(Vec::new())
        );
    }

    #[test]
    fn test_angle_shortest_arc() {
        let a = 350f64.to_radians();
        let b = 10f64.to_radians();

        let linear = lerp_angle(a, b, params(InterpolationAlgorithm::Linear1_0, 0.5));
        assert!((linear - 180f64.to_radians()).abs() < 1e-9);

        let short = lerp_angle(a, b, params(InterpolationAlgorithm::Linear1_1, 0.5));
        assert!((short - 360f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_algorithm_tags() {
        assert_eq!("linear-1.0".parse(), Ok(InterpolationAlgorithm::Linear1_0));
        assert_eq!(InterpolationAlgorithm::Linear1_1.to_string(), "linear-1.1");
        assert!("cubic".parse::<InterpolationAlgorithm>().is_err());
        assert_eq!(
            serde_json::to_string(&InterpolationAlgorithm::Linear1_0).unwrap(),
            "\"linear-1.0\""
        );
    }
}
