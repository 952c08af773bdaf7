// 2D geometry primitives shared by the navmesh builder, path queries and
// steering. World space is a plain XY plane; rings are counter-clockwise
// (positive signed area) unless a function says otherwise.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Tolerance for orientation and containment tests, in world units.
pub const GEOMETRY_EPSILON: f32 = 1e-4;

// ============================================================================
// VECTOR2
// ============================================================================

/// A point or direction in world space.
///
/// Plain `Copy` value; in-place arithmetic goes through `+=` / `-=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Exact component-wise equality.
    pub fn equals(&self, other: Vector2) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Angle (radians) of the direction from `self` towards `other`.
    pub fn angle(&self, other: Vector2) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn distance(&self, other: Vector2) -> f32 {
        Vec2::from(*self).distance(Vec2::from(other))
    }

    pub fn distance_squared(&self, other: Vector2) -> f32 {
        Vec2::from(*self).distance_squared(Vec2::from(other))
    }

    pub fn length(&self) -> f32 {
        Vec2::from(*self).length()
    }

    /// Unit vector in the same direction, or zero for zero / non-finite input.
    pub fn normalize_or_zero(&self) -> Vector2 {
        Vec2::from(*self).normalize_or_zero().into()
    }

    pub fn dot(&self, other: Vector2) -> f32 {
        Vec2::from(*self).dot(Vec2::from(other))
    }

    /// 2D cross product: positive when `other` is counter-clockwise of `self`.
    pub fn cross(&self, other: Vector2) -> f32 {
        Vec2::from(*self).perp_dot(Vec2::from(other))
    }

    pub fn lerp(&self, other: Vector2, t: f32) -> Vector2 {
        Vec2::from(*self).lerp(Vec2::from(other), t).into()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Lexicographic `(x, y)` ordering, used for deterministic tie-breaking.
    pub fn lexicographic_cmp(&self, other: &Vector2) -> std::cmp::Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl From<Vec2> for Vector2 {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vector2> for Vec2 {
    fn from(v: Vector2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<(f32, f32)> for Vector2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Vector2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vector2 {
    type Output = Vector2;
    fn div(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

// ============================================================================
// POLYGON HELPERS
// ============================================================================

/// Signed area of a closed ring. Positive for counter-clockwise winding.
pub fn signed_area(ring: &[Vector2]) -> f32 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        twice_area += a.cross(b);
    }
    twice_area * 0.5
}

/// Reverses the ring in place if it is wound clockwise.
pub fn make_counter_clockwise(ring: &mut [Vector2]) {
    if signed_area(ring) < 0.0 {
        ring.reverse();
    }
}

/// Arithmetic mean of the ring's vertices.
pub fn centroid(ring: &[Vector2]) -> Vector2 {
    if ring.is_empty() {
        return Vector2::ZERO;
    }
    let mut sum = Vector2::ZERO;
    for &p in ring {
        sum += p;
    }
    sum / ring.len() as f32
}

/// Even-odd ray casting test. Works for any simple ring, either winding.
pub fn point_in_polygon(point: Vector2, ring: &[Vector2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = ring[i];
        let vj = ring[j];

        // Does the ray going right from `point` cross edge (vj, vi)?
        if ((vi.y > point.y) != (vj.y > point.y))
            && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Containment test for a counter-clockwise convex ring, boundary inclusive
/// within `epsilon`.
pub fn point_in_convex(point: Vector2, ring: &[Vector2], epsilon: f32) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let edge = b - a;
        let len = edge.length();
        if len <= f32::EPSILON {
            continue;
        }
        // Signed distance of `point` to the edge line; negative is outside.
        if edge.cross(point - a) / len < -epsilon {
            return false;
        }
    }
    true
}

/// True if every corner of the ring turns left (collinear corners allowed).
pub fn is_convex(ring: &[Vector2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let c = ring[(i + 2) % n];
        let turn = (b - a).cross(c - b);
        let scale = (b - a).length() * (c - b).length();
        if turn < -GEOMETRY_EPSILON * scale.max(1.0) {
            return false;
        }
    }
    true
}

/// Closest point to `point` on the segment `a`–`b`.
pub fn closest_point_on_segment(point: Vector2, a: Vector2, b: Vector2) -> Vector2 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq < 1e-12 {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Checks if two segments properly cross (shared endpoints and touching do
/// not count).
pub fn segments_intersect(a1: Vector2, a2: Vector2, b1: Vector2, b2: Vector2) -> bool {
    let d1 = (b2 - b1).cross(a1 - b1);
    let d2 = (b2 - b1).cross(a2 - b1);
    let d3 = (a2 - a1).cross(b1 - a1);
    let d4 = (a2 - a1).cross(b2 - a1);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Checks if any two non-adjacent edges of a closed ring cross.
pub fn has_self_intersections(ring: &[Vector2]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = ring[i];
        let a2 = ring[(i + 1) % n];
        for j in (i + 2)..n {
            // Edge j shares a vertex with edge i when it closes the ring.
            if (j + 1) % n == i {
                continue;
            }
            if segments_intersect(a1, a2, ring[j], ring[(j + 1) % n]) {
                return true;
            }
        }
    }
    false
}

/// Convex hull of a point cloud (Andrew's monotone chain).
///
/// Returns a counter-clockwise ring without collinear vertices. Fewer than
/// three distinct, non-collinear points yield fewer than three vertices.
pub fn convex_hull(points: &[Vector2]) -> Vec<Vector2> {
    let mut sorted: Vec<Vector2> = points.iter().copied().filter(Vector2::is_finite).collect();
    sorted.sort_by(Vector2::lexicographic_cmp);
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Vector2> = Vec::with_capacity(sorted.len() * 2);

    // Lower chain.
    for &p in &sorted {
        while hull.len() >= 2 {
            let a = hull[hull.len() - 2];
            let b = hull[hull.len() - 1];
            if (b - a).cross(p - b) <= 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(p);
    }

    // Upper chain.
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len {
            let a = hull[hull.len() - 2];
            let b = hull[hull.len() - 1];
            if (b - a).cross(p - b) <= 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(p);
    }

    // Last point repeats the first.
    hull.pop();
    hull
}
