//! Measurements and predicates over vertex paths.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// An ordered list of vertices. Closed paths do not repeat the first vertex.
pub type Path = Vec<Point>;

/// Tolerance used for on-segment and coincidence checks.
pub const EPSILON: f64 = 1e-9;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Create a rectangle from two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Axis-aligned bounding rectangle of a path.
pub fn bounding_rect(path: &[Point]) -> Option<Rect> {
    let first = path.first()?;
    let mut rect = Rect { min: *first, max: *first };
    for p in &path[1..] {
        rect.min.x = rect.min.x.min(p.x);
        rect.min.y = rect.min.y.min(p.y);
        rect.max.x = rect.max.x.max(p.x);
        rect.max.y = rect.max.y.max(p.y);
    }
    Some(rect)
}

/// Bounding rectangle of several paths together.
pub fn bounding_rect_all<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Option<Rect> {
    paths
        .into_iter()
        .filter_map(|p| bounding_rect(p))
        .reduce(|a, b| a.union(&b))
}

/// Center of the path's bounding rectangle.
///
/// This is not the area centroid. Label placement and nudging use the box
/// center so that the result is stable for concave shapes.
pub fn centroid(path: &[Point]) -> Option<Point> {
    bounding_rect(path).map(|r| r.center())
}

/// Indices of the "middle segment": `floor(n/2) - 1` and `floor(n/2)`.
pub fn middle_segment(path: &[Point]) -> Option<(usize, usize)> {
    let half = path.len() / 2;
    if half == 0 {
        return None;
    }
    Some((half - 1, half))
}

/// Midpoint of the middle segment, used as the insertion point for a new
/// mid-edge vertex.
pub fn middle_segment_midpoint(path: &[Point]) -> Option<Point> {
    let (a, b) = middle_segment(path)?;
    Some(path[a].midpoint(&path[b]))
}

/// Signed shoelace area. Positive for counter-clockwise paths in a y-up frame.
pub fn signed_area(path: &[Point]) -> f64 {
    let n = path.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = path[i];
        let b = path[(i + 1) % n];
        sum += a.cross(&b);
    }
    sum / 2.0
}

pub fn area(path: &[Point]) -> f64 {
    signed_area(path).abs()
}

/// Even-odd point-in-polygon test (ray casting).
pub fn contains_point(path: &[Point], point: &Point) -> bool {
    let n = path.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = path[i];
        let vj = path[j];
        if (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Even-odd containment over a set of rings (outer paths and holes).
pub fn contains_point_in_rings(rings: &[Path], point: &Point) -> bool {
    rings
        .iter()
        .filter(|ring| contains_point(ring, point))
        .count()
        % 2
        == 1
}

/// Shortest distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment(point: &Point, a: &Point, b: &Point) -> f64 {
    let ab = *b - *a;
    let len_sq = ab.dot(&ab);
    if len_sq == 0.0 {
        return point.distance_to(a);
    }
    let t = ((*point - *a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    point.distance_to(&(*a + ab * t))
}

/// Whether `point` lies on the boundary of a closed path, within `tolerance`.
pub fn is_point_on_boundary(path: &[Point], point: &Point, tolerance: f64) -> bool {
    edges(path).any(|(a, b)| distance_to_segment(point, &a, &b) <= tolerance)
}

/// Index of the vertex nearest to `point` within `radius`.
pub fn nearest_vertex(path: &[Point], point: &Point, radius: f64) -> Option<usize> {
    path.iter()
        .enumerate()
        .map(|(i, v)| (i, v.distance_to(point)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Iterate the closing edges of a path as `(start, end)` pairs.
pub fn edges(path: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = path.len();
    (0..if n < 2 { 0 } else { n }).map(move |i| (path[i], path[(i + 1) % n]))
}

pub fn translate(path: &[Point], delta: Point) -> Path {
    path.iter().map(|p| *p + delta).collect()
}

/// Remove consecutive duplicate vertices and a trailing copy of the first vertex.
pub fn normalize(path: &[Point]) -> Path {
    let mut out: Path = Vec::with_capacity(path.len());
    for p in path {
        if out.last().is_none_or(|last| last.distance_to(p) > EPSILON) {
            out.push(*p);
        }
    }
    while out.len() > 1 && out[0].distance_to(&out[out.len() - 1]) <= EPSILON {
        out.pop();
    }
    out
}

/// Whether segments `a1`-`a2` and `b1`-`b2` share at least one point.
pub fn segments_intersect(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }

    (d1 == 0.0 && on_segment_bbox(b1, b2, a1))
        || (d2 == 0.0 && on_segment_bbox(b1, b2, a2))
        || (d3 == 0.0 && on_segment_bbox(a1, a2, b1))
        || (d4 == 0.0 && on_segment_bbox(a1, a2, b2))
}

fn orientation(a: &Point, b: &Point, c: &Point) -> f64 {
    let v = (*b - *a).cross(&(*c - *a));
    if v.abs() <= EPSILON { 0.0 } else { v }
}

fn on_segment_bbox(a: &Point, b: &Point, p: &Point) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Whether a closed path is simple (no two non-adjacent edges touch).
pub fn is_simple(path: &[Point]) -> bool {
    let n = path.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a1 = path[i];
        let a2 = path[(i + 1) % n];
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            let b1 = path[j];
            let b2 = path[(j + 1) % n];
            if segments_intersect(&a1, &a2, &b1, &b2) {
                return false;
            }
        }
    }
    true
}

/// Split a closed path at every vertex it visits more than once.
///
/// A path that runs out to a hole and back through the same vertex comes
/// apart into its outer loop and the hole. Loops with fewer than three
/// vertices (spikes) are dropped.
pub fn split_pinches(path: &[Point], tolerance: f64) -> Vec<Path> {
    let mut loops = Vec::new();
    let mut stack: Path = Vec::with_capacity(path.len());
    for &point in path {
        match stack.iter().position(|p| p.distance_to(&point) <= tolerance) {
            Some(k) => {
                let mut tail = stack.split_off(k + 1);
                tail.insert(0, stack[k]);
                loops.push(tail);
            }
            None => stack.push(point),
        }
    }
    loops.push(stack);
    loops.retain(|l| l.len() >= 3);
    loops
}

/// Simple apart from vertices the path passes through more than once.
pub fn is_weakly_simple(path: &[Point]) -> bool {
    let loops = split_pinches(path, EPSILON);
    !loops.is_empty() && loops.iter().all(|l| is_simple(l))
}
