//! Boolean union and difference of polygons with holes.
//!
//! A polygon is a list of rings read with the even-odd rule: the first ring
//! is usually the outer boundary and any further rings are holes or
//! disjoint islands.
//!
//! The algorithm works on edges:
//!
//! 1. Rings are validated and oriented so the interior is always on the left.
//! 2. Every edge of each polygon is split wherever it meets the other polygon.
//! 3. Each piece is classified against the other polygon as inside, outside
//!    or shared (the same piece exists in both, in the same or opposite
//!    direction).
//! 4. The pieces required by the operation are stitched back into rings.
//!
//! Self-intersecting input is rejected with [`GeometryError::SelfIntersecting`]
//! rather than repaired. Rings touching at isolated points are accepted, so
//! every result can be fed back in.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use crate::error::GeometryError;
use crate::path::{self, Path};
use crate::point::Point;

/// Distance below which two computed points are treated as the same vertex.
const MERGE_TOLERANCE: f64 = 1e-7;

/// Rings smaller than this are dropped from results.
const MIN_RING_AREA: f64 = 1e-9;

/// Supported boolean operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
}

impl BooleanOp {
    pub fn name(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
        }
    }
}

/// Union of two polygons.
///
/// Returns outer rings ordered by area (largest first), followed by holes.
pub fn union(a: &[Path], b: &[Path]) -> Result<Vec<Path>, GeometryError> {
    apply(BooleanOp::Union, a, b)
}

/// `a` minus `b`.
///
/// Fails with [`GeometryError::DegenerateResult`] when nothing of `a` remains.
pub fn difference(a: &[Path], b: &[Path]) -> Result<Vec<Path>, GeometryError> {
    apply(BooleanOp::Difference, a, b)
}

/// Run a boolean operation.
pub fn apply(op: BooleanOp, a: &[Path], b: &[Path]) -> Result<Vec<Path>, GeometryError> {
    let a = prepare(a)?;
    let b = prepare(b)?;

    let mut pool = VertexPool::default();
    let (a_pieces, b_pieces) = split_edges(&a, &b, &mut pool);

    let a_set: HashSet<(usize, usize)> = a_pieces.iter().copied().collect();
    let b_set: HashSet<(usize, usize)> = b_pieces.iter().copied().collect();

    let mut kept: Vec<(usize, usize)> = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut keep = |edge: (usize, usize)| {
        if seen.insert(edge) {
            kept.push(edge);
        }
    };

    for &piece in &a_pieces {
        match (op, classify(piece, &b_set, &b, &pool)) {
            (BooleanOp::Union, Side::Outside | Side::SharedSame) => keep(piece),
            (BooleanOp::Difference, Side::Outside | Side::SharedOpposite) => keep(piece),
            _ => {}
        }
    }
    for &piece in &b_pieces {
        match (op, classify(piece, &a_set, &a, &pool)) {
            (BooleanOp::Union, Side::Outside) => keep(piece),
            (BooleanOp::Difference, Side::Inside) => keep((piece.1, piece.0)),
            _ => {}
        }
    }

    log::trace!(
        "Boolean {}: {} + {} pieces, {} kept",
        op.name(),
        a_pieces.len(),
        b_pieces.len(),
        kept.len()
    );

    let rings = assemble(op, &kept, &pool)?;
    finish(op, rings)
}

// ============================================================================
// Input preparation
// ============================================================================

/// Validate rings and orient them by nesting depth.
///
/// Rings may touch themselves or each other at isolated points, which is
/// what [`finish`] produces for holes or islands meeting at a vertex. A ring
/// visiting a vertex twice is split there. Proper crossings and shared edge
/// segments are rejected.
fn prepare(rings: &[Path]) -> Result<Vec<Path>, GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::TooFewVertices { min: 3, found: 0 });
    }

    let mut loops: Vec<Path> = Vec::new();
    for ring in rings {
        let ring = path::normalize(ring);
        if ring.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                min: 3,
                found: ring.len(),
            });
        }
        let parts = path::split_pinches(&ring, MERGE_TOLERANCE);
        if !parts.iter().all(|part| path::is_simple(part)) {
            return Err(GeometryError::SelfIntersecting);
        }
        if path::area(&ring) <= MIN_RING_AREA {
            return Err(GeometryError::ZeroArea);
        }
        loops.extend(parts.into_iter().filter(|part| path::area(part) > MIN_RING_AREA));
    }

    let mut depths = vec![0usize; loops.len()];
    for i in 0..loops.len() {
        for j in 0..loops.len() {
            if i != j && lies_inside(&loops[i], &loops[j])? {
                depths[i] += 1;
            }
        }
    }

    for (ring, depth) in loops.iter_mut().zip(depths) {
        let want_ccw = depth % 2 == 0;
        if (path::signed_area(ring) > 0.0) != want_ccw {
            ring.reverse();
        }
    }

    Ok(loops)
}

/// Whether `ring` lies inside `other`.
///
/// Fails when `ring` has parts on both sides of `other` or runs along one of
/// its edges. Touching at isolated points is fine.
fn lies_inside(ring: &[Point], other: &[Point]) -> Result<bool, GeometryError> {
    let mut side = None;
    for (start, end) in path::edges(ring) {
        let mut points = vec![start, end];
        for (q1, q2) in path::edges(other) {
            points.extend(edge_contacts(start, end, q1, q2));
        }
        let dir = end - start;
        let param = |p: &Point| (*p - start).dot(&dir);
        points.sort_by(|a, b| param(a).total_cmp(&param(b)));

        for pair in points.windows(2) {
            if pair[0].distance_to(&pair[1]) <= MERGE_TOLERANCE {
                continue;
            }
            let mid = pair[0].midpoint(&pair[1]);
            if path::is_point_on_boundary(other, &mid, MERGE_TOLERANCE) {
                return Err(GeometryError::SelfIntersecting);
            }
            let inside = path::contains_point(other, &mid);
            if *side.get_or_insert(inside) != inside {
                return Err(GeometryError::SelfIntersecting);
            }
        }
    }
    side.ok_or(GeometryError::SelfIntersecting)
}

// ============================================================================
// Edge splitting
// ============================================================================

/// Deduplicating store of vertices so that pieces can be compared by index.
#[derive(Default)]
struct VertexPool {
    points: Vec<Point>,
}

impl VertexPool {
    fn intern(&mut self, point: Point) -> usize {
        if let Some(index) = self
            .points
            .iter()
            .position(|p| p.distance_to(&point) <= MERGE_TOLERANCE)
        {
            return index;
        }
        self.points.push(point);
        self.points.len() - 1
    }

    fn get(&self, index: usize) -> Point {
        self.points[index]
    }
}

type Edge = (Point, Point);

fn ring_edges(rings: &[Path]) -> Vec<Edge> {
    rings.iter().flat_map(|r| path::edges(r)).collect()
}

/// Split every edge of both polygons at their mutual contact points.
fn split_edges(
    a: &[Path],
    b: &[Path],
    pool: &mut VertexPool,
) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    let a_edges = ring_edges(a);
    let b_edges = ring_edges(b);
    let mut a_splits = touching_points(a);
    let mut b_splits = touching_points(b);

    for (ia, &(p1, p2)) in a_edges.iter().enumerate() {
        for (ib, &(q1, q2)) in b_edges.iter().enumerate() {
            for contact in edge_contacts(p1, p2, q1, q2) {
                a_splits[ia].push(contact);
                b_splits[ib].push(contact);
            }
        }
    }

    (
        pieces(&a_edges, a_splits, pool),
        pieces(&b_edges, b_splits, pool),
    )
}

/// Per edge, the points where other rings of the same polygon touch it.
fn touching_points(rings: &[Path]) -> Vec<Vec<Point>> {
    let owners: Vec<usize> = rings
        .iter()
        .enumerate()
        .flat_map(|(i, r)| std::iter::repeat_n(i, r.len()))
        .collect();
    let edges = ring_edges(rings);
    let mut splits: Vec<Vec<Point>> = vec![Vec::new(); edges.len()];
    for (i, &(p1, p2)) in edges.iter().enumerate() {
        for (j, &(q1, q2)) in edges.iter().enumerate() {
            if owners[i] != owners[j] {
                splits[i].extend(edge_contacts(p1, p2, q1, q2));
            }
        }
    }
    splits
}

/// Points where segment `p1`-`p2` meets `q1`-`q2`.
///
/// Crossing segments yield one point; collinear overlaps yield the overlap
/// endpoints.
fn edge_contacts(p1: Point, p2: Point, q1: Point, q2: Point) -> Vec<Point> {
    let r = p2 - p1;
    let s = q2 - q1;
    let qp = q1 - p1;
    let r_len = r.length();
    let s_len = s.length();
    if r_len <= MERGE_TOLERANCE || s_len <= MERGE_TOLERANCE {
        return Vec::new();
    }

    let denom = r.cross(&s);
    if denom.abs() > path::EPSILON * r_len * s_len {
        let t = qp.cross(&s) / denom;
        let u = qp.cross(&r) / denom;
        let tol_t = MERGE_TOLERANCE / r_len;
        let tol_u = MERGE_TOLERANCE / s_len;
        if (-tol_t..=1.0 + tol_t).contains(&t) && (-tol_u..=1.0 + tol_u).contains(&u) {
            return vec![snap(p1 + r * t, &[p1, p2, q1, q2])];
        }
        return Vec::new();
    }

    // Parallel: only collinear overlaps matter.
    if qp.cross(&r).abs() / r_len > MERGE_TOLERANCE {
        return Vec::new();
    }

    let mut contacts = Vec::new();
    for q in [q1, q2] {
        if path::distance_to_segment(&q, &p1, &p2) <= MERGE_TOLERANCE {
            contacts.push(q);
        }
    }
    for p in [p1, p2] {
        if path::distance_to_segment(&p, &q1, &q2) <= MERGE_TOLERANCE {
            contacts.push(p);
        }
    }
    contacts
}

fn snap(point: Point, candidates: &[Point]) -> Point {
    candidates
        .iter()
        .copied()
        .find(|c| c.distance_to(&point) <= MERGE_TOLERANCE)
        .unwrap_or(point)
}

/// Turn each edge plus its split points into a chain of indexed pieces.
fn pieces(edges: &[Edge], splits: Vec<Vec<Point>>, pool: &mut VertexPool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (&(start, end), mut points) in edges.iter().zip(splits) {
        let dir = end - start;
        let param = |p: &Point| (*p - start).dot(&dir);
        points.sort_by(|a, b| param(a).total_cmp(&param(b)));

        let mut chain = vec![pool.intern(start)];
        for point in points.into_iter().chain(std::iter::once(end)) {
            let index = pool.intern(point);
            if chain.last() != Some(&index) {
                chain.push(index);
            }
        }
        out.extend(chain.windows(2).map(|w| (w[0], w[1])));
    }
    out
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Inside,
    Outside,
    SharedSame,
    SharedOpposite,
}

fn classify(
    piece: (usize, usize),
    other_pieces: &HashSet<(usize, usize)>,
    other: &[Path],
    pool: &VertexPool,
) -> Side {
    if other_pieces.contains(&piece) {
        return Side::SharedSame;
    }
    if other_pieces.contains(&(piece.1, piece.0)) {
        return Side::SharedOpposite;
    }
    let mid = pool.get(piece.0).midpoint(&pool.get(piece.1));
    if path::contains_point_in_rings(other, &mid) {
        Side::Inside
    } else {
        Side::Outside
    }
}

// ============================================================================
// Ring assembly
// ============================================================================

/// Clockwise angle from the reversed incoming direction to `outgoing`, in `(0, 2π]`.
///
/// The smallest value is the sharpest left turn.
fn clockwise_turn(incoming: Point, outgoing: Point) -> f64 {
    let mut angle = (-incoming).angle() - outgoing.angle();
    while angle <= 0.0 {
        angle += TAU;
    }
    while angle > TAU {
        angle -= TAU;
    }
    angle
}

fn assemble(
    op: BooleanOp,
    edges: &[(usize, usize)],
    pool: &VertexPool,
) -> Result<Vec<Path>, GeometryError> {
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (k, &(from, _)) in edges.iter().enumerate() {
        outgoing.entry(from).or_default().push(k);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let (start, mut current) = edges[first];
        let mut previous = start;
        let mut ring = vec![start];

        while current != start {
            ring.push(current);
            let incoming = pool.get(current) - pool.get(previous);
            let direction = |k: usize| pool.get(edges[k].1) - pool.get(edges[k].0);
            let next = outgoing
                .get(&current)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&k| !used[k])
                .min_by(|&x, &y| {
                    clockwise_turn(incoming, direction(x))
                        .total_cmp(&clockwise_turn(incoming, direction(y)))
                })
                .ok_or(GeometryError::OpenRing {
                    operation: op.name(),
                })?;
            used[next] = true;
            previous = current;
            current = edges[next].1;
        }

        rings.push(ring.into_iter().map(|i| pool.get(i)).collect());
    }

    Ok(rings)
}

/// Drop vertices that lie on the line through their neighbours.
///
/// Vertices the ring passes through more than once are kept so that a
/// pinched ring still splits cleanly when fed back in.
fn remove_collinear(ring: &[Point]) -> Path {
    let mut out: Path = ring.to_vec();
    let mut changed = true;
    while changed && out.len() >= 3 {
        changed = false;
        let n = out.len();
        for i in 0..n {
            let prev = out[(i + n - 1) % n];
            let cur = out[i];
            let next = out[(i + 1) % n];
            let duplicate = cur.distance_to(&next) <= MERGE_TOLERANCE;
            let pinch = out.iter().filter(|p| p.distance_to(&cur) <= MERGE_TOLERANCE).count() > 1;
            let base = next - prev;
            let base_len = base.length();
            let collinear =
                base_len <= MERGE_TOLERANCE || (cur - prev).cross(&base).abs() / base_len <= MERGE_TOLERANCE;
            if duplicate || (collinear && !pinch) {
                out.remove(i);
                changed = true;
                break;
            }
        }
    }
    out
}

fn finish(op: BooleanOp, rings: Vec<Path>) -> Result<Vec<Path>, GeometryError> {
    let mut rings: Vec<Path> = rings
        .iter()
        .map(|r| remove_collinear(r))
        .filter(|r| r.len() >= 3 && path::area(r) > MIN_RING_AREA)
        .collect();

    if !rings.iter().any(|r| path::signed_area(r) > 0.0) {
        return Err(GeometryError::DegenerateResult {
            operation: op.name(),
        });
    }

    rings.sort_by(|a, b| {
        let (sa, sb) = (path::signed_area(a), path::signed_area(b));
        (sb > 0.0)
            .cmp(&(sa > 0.0))
            .then(sb.abs().total_cmp(&sa.abs()))
    });
    Ok(rings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    fn total_area(rings: &[Path]) -> f64 {
        rings.iter().map(|r| path::signed_area(r)).sum()
    }

    #[test]
    fn test_union_of_disjoint_squares_keeps_both() {
        let a = vec![square(0.0, 0.0, 1.0, 1.0)];
        let b = vec![square(5.0, 5.0, 7.0, 7.0)];
        let result = union(&a, &b).unwrap();
        assert_eq!(result.len(), 2);
        // Largest ring first
        assert!((path::area(&result[0]) - 4.0).abs() < 1e-9);
        assert!((path::area(&result[1]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let a = vec![square(0.0, 0.0, 2.0, 2.0)];
        let b = vec![square(1.0, 1.0, 3.0, 3.0)];
        let result = union(&a, &b).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 8);
        assert!((total_area(&result) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_of_adjacent_squares_merges_edge() {
        let a = vec![square(0.0, 0.0, 2.0, 1.0)];
        let b = vec![square(0.0, 1.0, 2.0, 2.0)];
        let result = union(&a, &b).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 4);
        assert!((total_area(&result) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_corner_gives_l_shape() {
        let a = vec![square(0.0, 0.0, 2.0, 2.0)];
        let b = vec![square(1.0, 1.0, 2.0, 2.0)];
        let result = difference(&a, &b).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 6);
        assert!((path::area(&result[0]) - 3.0).abs() < 1e-9);
        for corner in [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 2.0),
            Point::new(0.0, 2.0),
        ] {
            assert!(result[0].contains(&corner), "missing {:?}", corner);
        }
    }

    #[test]
    fn test_difference_inner_square_makes_hole() {
        let a = vec![square(0.0, 0.0, 10.0, 10.0)];
        let b = vec![square(4.0, 4.0, 6.0, 6.0)];
        let result = difference(&a, &b).unwrap();
        assert_eq!(result.len(), 2);
        assert!(path::signed_area(&result[0]) > 0.0);
        assert!(path::signed_area(&result[1]) < 0.0);
        assert!((total_area(&result) - 96.0).abs() < 1e-9);
        assert!(!path::contains_point_in_rings(&result, &Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_difference_full_cover_is_degenerate() {
        let a = vec![square(1.0, 1.0, 2.0, 2.0)];
        let b = vec![square(0.0, 0.0, 3.0, 3.0)];
        assert_eq!(
            difference(&a, &b),
            Err(GeometryError::DegenerateResult {
                operation: "difference"
            })
        );
    }

    #[test]
    fn test_difference_disjoint_returns_original() {
        let a = vec![square(0.0, 0.0, 2.0, 2.0)];
        let b = vec![square(5.0, 5.0, 6.0, 6.0)];
        let result = difference(&a, &b).unwrap();
        assert_eq!(result.len(), 1);
        assert!((path::area(&result[0]) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_intersecting_input_rejected() {
        let bowtie = vec![vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ]];
        let b = vec![square(0.0, 0.0, 1.0, 1.0)];
        assert_eq!(union(&bowtie, &b), Err(GeometryError::SelfIntersecting));
    }

    #[test]
    fn test_corner_touching_union_can_be_merged_again() {
        let a = vec![square(0.0, 0.0, 1.0, 1.0)];
        let b = vec![square(1.0, 1.0, 2.0, 2.0)];
        let touching = union(&a, &b).unwrap();
        assert_eq!(touching.len(), 2);

        let c = vec![square(5.0, 5.0, 6.0, 6.0)];
        let result = union(&touching, &c).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|r| path::signed_area(r) > 0.0));
        assert!((total_area(&result) - 3.0).abs() < 1e-9);
        assert!(difference(&result, &c).is_ok());
    }

    #[test]
    fn test_notch_touching_edge_can_be_reused() {
        let a = vec![square(0.0, 0.0, 4.0, 4.0)];
        let notch = vec![vec![Point::new(0.0, 2.0), Point::new(2.0, 1.0), Point::new(2.0, 3.0)]];
        let notched = difference(&a, &notch).unwrap();
        assert!((total_area(&notched) - 14.0).abs() < 1e-9);
        assert!(!path::contains_point_in_rings(&notched, &Point::new(1.5, 2.0)));

        let c = vec![square(10.0, 10.0, 11.0, 11.0)];
        let result = union(&notched, &c).unwrap();
        assert!((total_area(&result) - 15.0).abs() < 1e-9);
        assert!(!path::contains_point_in_rings(&result, &Point::new(1.5, 2.0)));
        assert!(path::contains_point_in_rings(&result, &Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_crossing_or_edge_sharing_rings_rejected() {
        let crossing = vec![square(0.0, 0.0, 2.0, 2.0), square(1.0, 1.0, 3.0, 3.0)];
        let sharing = vec![square(0.0, 0.0, 1.0, 1.0), square(1.0, 0.0, 2.0, 1.0)];
        let c = vec![square(5.0, 5.0, 6.0, 6.0)];
        assert_eq!(union(&crossing, &c), Err(GeometryError::SelfIntersecting));
        assert_eq!(union(&sharing, &c), Err(GeometryError::SelfIntersecting));
    }

    #[test]
    fn test_too_few_vertices_rejected() {
        let a = vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]];
        let b = vec![square(0.0, 0.0, 1.0, 1.0)];
        assert_eq!(
            union(&a, &b),
            Err(GeometryError::TooFewVertices { min: 3, found: 2 })
        );
    }

    #[test]
    fn test_clockwise_turn_prefers_left() {
        let east = Point::new(1.0, 0.0);
        let north = Point::new(0.0, 1.0);
        let south = Point::new(0.0, -1.0);
        assert!(clockwise_turn(east, north) < clockwise_turn(east, east));
        assert!(clockwise_turn(east, east) < clockwise_turn(east, south));
    }
}
