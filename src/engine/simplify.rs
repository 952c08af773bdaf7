// Ring clean-up ahead of triangulation: grid snapping, near-duplicate
// removal and Douglas-Peucker simplification of closed rings.

use super::geometry::{Vector2, closest_point_on_segment};

/// Rounds a point onto a square grid of `cell_size` world units.
/// Non-positive cell sizes leave the point untouched.
pub fn snap_to_grid(point: Vector2, cell_size: f32) -> Vector2 {
    if cell_size <= 0.0 || !cell_size.is_finite() {
        return point;
    }
    Vector2::new(
        (point.x / cell_size).round() * cell_size,
        (point.y / cell_size).round() * cell_size,
    )
}

/// Drops consecutive vertices closer than `tolerance` to the previously kept
/// one, including across the closing edge.
pub fn dedup_ring(ring: &[Vector2], tolerance: f32) -> Vec<Vector2> {
    let tolerance_sq = tolerance.max(0.0).powi(2);
    let mut out: Vec<Vector2> = Vec::with_capacity(ring.len());
    for &p in ring {
        match out.last() {
            Some(last) if last.distance_squared(p) <= tolerance_sq => {}
            _ => out.push(p),
        }
    }
    while out.len() > 1 {
        let (first, last) = (out[0], out[out.len() - 1]);
        if first.distance_squared(last) <= tolerance_sq {
            out.pop();
        } else {
            break;
        }
    }
    out
}

/// Simplifies a closed ring with Douglas-Peucker.
///
/// The ring is split at its two farthest-apart vertices so the result does
/// not depend on where the ring happens to start. Rings of three or fewer
/// vertices are returned unchanged.
pub fn simplify_ring(ring: &[Vector2], tolerance: f32) -> Vec<Vector2> {
    if ring.len() <= 3 || tolerance <= 0.0 {
        return ring.to_vec();
    }

    let (a, b) = farthest_pair(ring);
    let n = ring.len();

    // Two open chains a..=b and b..=a (wrapping), each sharing both anchors.
    let first: Vec<Vector2> = (a..=b).map(|i| ring[i]).collect();
    let second: Vec<Vector2> = (b..a + n + 1).map(|i| ring[i % n]).collect();

    let mut keep_first = vec![false; first.len()];
    let mut keep_second = vec![false; second.len()];
    mark_open_chain(&first, tolerance, &mut keep_first);
    mark_open_chain(&second, tolerance, &mut keep_second);

    // Each chain's last vertex is the other chain's first; skip it.
    let mut out = Vec::with_capacity(n);
    for (i, &p) in first.iter().enumerate().take(first.len() - 1) {
        if keep_first[i] {
            out.push(p);
        }
    }
    for (i, &p) in second.iter().enumerate().take(second.len() - 1) {
        if keep_second[i] {
            out.push(p);
        }
    }
    out
}

fn farthest_pair(ring: &[Vector2]) -> (usize, usize) {
    let mut best = (0, ring.len() / 2);
    let mut best_dist = -1.0f32;
    for i in 0..ring.len() {
        for j in (i + 1)..ring.len() {
            let d = ring[i].distance_squared(ring[j]);
            if d > best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    best
}

/// Marks the vertices of an open chain that survive simplification. Both
/// endpoints always survive. Iterative to keep deep rings off the stack.
fn mark_open_chain(chain: &[Vector2], tolerance: f32, keep: &mut [bool]) {
    let last = chain.len() - 1;
    keep[0] = true;
    keep[last] = true;

    let tolerance_sq = tolerance * tolerance;
    let mut pending = vec![(0usize, last)];
    while let Some((start, end)) = pending.pop() {
        if end <= start + 1 {
            continue;
        }
        let mut worst = start;
        let mut worst_dist = 0.0f32;
        for i in (start + 1)..end {
            let projected = closest_point_on_segment(chain[i], chain[start], chain[end]);
            let d = chain[i].distance_squared(projected);
            if d > worst_dist {
                worst_dist = d;
                worst = i;
            }
        }
        if worst_dist > tolerance_sq {
            keep[worst] = true;
            pending.push((start, worst));
            pending.push((worst, end));
        }
    }
}
