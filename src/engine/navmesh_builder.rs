// Navmesh construction: world rectangle + obstacles -> convex walkable faces.
//
// Pipeline: clean obstacle rings -> constrained Delaunay triangulation ->
// classify triangles -> Hertel-Mehlhorn merge into convex polygons.
// Never fails; degenerate input is flagged in the mesh diagnostics.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::geometry::{Vector2, centroid, convex_hull, is_convex, point_in_polygon};
use super::navmesh::{BuildIssue, NavMesh};
use super::obstacle::{Obstacle, ObstacleKind};
use super::simplify::{dedup_ring, simplify_ring, snap_to_grid};
use super::triangulate::triangulate_with_constraints;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Side of the default square world.
pub const DEFAULT_WORLD_SIZE: f32 = 2000.0;
/// Default snapping grid for obstacle vertices.
pub const DEFAULT_CELL_SIZE: f32 = 3.0;
/// Default distance under which vertices are merged.
pub const DEFAULT_MERGE_TOLERANCE: f32 = 5.0;

// ============================================================================
// WORLD BOUNDS
// ============================================================================

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vector2,
    pub max: Vector2,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::square(DEFAULT_WORLD_SIZE)
    }
}

impl WorldBounds {
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// `[0, size] x [0, size]`.
    pub fn square(size: f32) -> Self {
        Self::from_size(size, size)
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vector2::ZERO, Vector2::new(width, height))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vector2 {
        self.min.lerp(self.max, 0.5)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    /// Corners, counter-clockwise from `min`.
    pub fn corners(&self) -> [Vector2; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }

    pub fn clamp(&self, point: Vector2) -> Vector2 {
        Vector2::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    pub fn contains(&self, point: Vector2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Navmesh construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NavMeshBuilder {
    pub bounds: WorldBounds,
    /// Obstacle vertices are snapped onto a grid of this size. `0` disables.
    pub cell_size: f32,
    /// Vertices closer than this are welded; also the simplification tolerance.
    pub merge_tolerance: f32,
    pub max_snap_distance: Option<f32>,
}

impl Default for NavMeshBuilder {
    fn default() -> Self {
        Self {
            bounds: WorldBounds::default(),
            cell_size: DEFAULT_CELL_SIZE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            max_snap_distance: None,
        }
    }
}

impl NavMeshBuilder {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_merge_tolerance(mut self, merge_tolerance: f32) -> Self {
        self.merge_tolerance = merge_tolerance;
        self
    }

    pub fn with_max_snap_distance(mut self, max_snap_distance: Option<f32>) -> Self {
        self.max_snap_distance = max_snap_distance;
        self
    }

    pub fn build(&self, obstacles: &[Obstacle]) -> NavMesh {
        NavMesh::build(self.bounds, self.cell_size, obstacles, self.merge_tolerance)
            .with_max_snap_distance(self.max_snap_distance)
    }
}

impl NavMesh {
    /// Builds the walkable mesh for `bounds` minus the obstacles.
    ///
    /// Space covered by an odd number of polyline rings is walkable (all of
    /// `bounds` when there are none); convex hulls are always carved out.
    /// Identical input gives an identical face list.
    pub fn build(
        bounds: WorldBounds,
        cell_size: f32,
        obstacles: &[Obstacle],
        merge_tolerance: f32,
    ) -> NavMesh {
        let mut issues = Vec::new();

        if !bounds.is_valid() {
            warn!("Navmesh world bounds {:?} are empty or non-finite", bounds);
            issues.push(BuildIssue::InvalidBounds);
            issues.push(BuildIssue::DegenerateGeometry);
            return NavMesh::empty().with_diagnostics(issues);
        }
        let merge_tolerance = if merge_tolerance.is_finite() {
            merge_tolerance.max(0.0)
        } else {
            0.0
        };

        // --- 1. Clean obstacle rings ---
        let mut kinds = Vec::with_capacity(obstacles.len());
        let mut rings = Vec::with_capacity(obstacles.len());
        for (index, obstacle) in obstacles.iter().enumerate() {
            if let Some(issue) = obstacle.shape_issue() {
                warn!("Obstacle {index} ({:?}) {issue}", obstacle.kind);
                issues.push(BuildIssue::ObstacleShape { index, issue });
            }
            let ring = clean_ring(obstacle, bounds, cell_size, merge_tolerance);
            if ring.len() < 3 {
                warn!("Obstacle {index} collapsed to {} points, skipping", ring.len());
                issues.push(BuildIssue::ObstacleSkipped { index });
                continue;
            }
            kinds.push(obstacle.kind);
            rings.push(ring);
        }

        // --- 2. Triangulate ---
        let soup = triangulate_with_constraints(&bounds.corners(), &rings, merge_tolerance);
        if soup.skipped_constraints > 0 {
            issues.push(BuildIssue::CrossingConstraints {
                count: soup.skipped_constraints,
            });
        }

        // --- 3. Classify ---
        let mut boundaries = Vec::new();
        let mut holes = Vec::new();
        for (kind, ring) in kinds.iter().zip(&soup.welded_rings) {
            if ring.len() < 3 {
                continue;
            }
            match kind {
                ObstacleKind::Polyline => boundaries.push(ring.as_slice()),
                ObstacleKind::ConvexHull => holes.push(ring.as_slice()),
            }
        }
        let walkable: Vec<[usize; 3]> = soup
            .triangles
            .iter()
            .copied()
            .filter(|tri| {
                let points: Vec<Vector2> = tri.iter().map(|&i| soup.vertices[i]).collect();
                is_walkable(centroid(&points), &boundaries, &holes)
            })
            .collect();
        debug!(
            "Navmesh: {} of {} triangles walkable",
            walkable.len(),
            soup.triangles.len()
        );

        // --- 4. Merge into convex polygons ---
        let polygons = merge_convex(&soup.vertices, &walkable);
        let (vertices, polygons) = compact_vertices(&soup.vertices, polygons);

        let mesh = NavMesh::from_polygons(vertices, polygons);
        if mesh.is_empty() {
            warn!("Navmesh has no walkable faces; every agent will idle");
            issues.push(BuildIssue::DegenerateGeometry);
        }
        info!(
            "Built navmesh: {} faces, {} vertices from {} obstacles ({} issues)",
            mesh.face_count(),
            mesh.vertices().len(),
            obstacles.len(),
            issues.len()
        );
        mesh.with_diagnostics(issues)
    }
}

/// Translates, snaps, clamps and simplifies one obstacle's ring.
fn clean_ring(
    obstacle: &Obstacle,
    bounds: WorldBounds,
    cell_size: f32,
    merge_tolerance: f32,
) -> Vec<Vector2> {
    let snapped: Vec<Vector2> = obstacle
        .world_shape()
        .into_iter()
        .filter(Vector2::is_finite)
        .map(|p| bounds.clamp(snap_to_grid(p, cell_size)))
        .collect();

    let ring = match obstacle.kind {
        ObstacleKind::ConvexHull => convex_hull(&snapped),
        ObstacleKind::Polyline => snapped,
    };
    let ring = dedup_ring(&ring, merge_tolerance);
    let ring = simplify_ring(&ring, merge_tolerance);
    dedup_ring(&ring, merge_tolerance)
}

fn is_walkable(point: Vector2, boundaries: &[&[Vector2]], holes: &[&[Vector2]]) -> bool {
    let inside_boundary = boundaries.is_empty()
        || boundaries
            .iter()
            .filter(|ring| point_in_polygon(point, ring))
            .count()
            % 2
            == 1;
    inside_boundary && !holes.iter().any(|ring| point_in_polygon(point, ring))
}

// ============================================================================
// HERTEL-MEHLHORN MERGE
// ============================================================================

/// Greedily removes shared edges between walkable triangles while the union
/// stays convex. Longest edges go first; ties break on vertex indices.
fn merge_convex(vertices: &[Vector2], triangles: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut polygons: Vec<Option<Vec<usize>>> =
        triangles.iter().map(|t| Some(t.to_vec())).collect();
    let mut parent: Vec<usize> = (0..triangles.len()).collect();

    let mut edge_owner: HashMap<(usize, usize), usize> = HashMap::new();
    for (ti, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            edge_owner.insert((tri[k], tri[(k + 1) % 3]), ti);
        }
    }

    // (length, low vertex, high vertex, triangle a, triangle b)
    let mut candidates: Vec<(f32, usize, usize, usize, usize)> = Vec::new();
    for (ti, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            if a > b {
                continue;
            }
            if let Some(&other) = edge_owner.get(&(b, a)) {
                candidates.push((vertices[a].distance(vertices[b]), a, b, ti, other));
            }
        }
    }
    candidates.sort_by(|x, y| {
        y.0.total_cmp(&x.0)
            .then(x.1.cmp(&y.1))
            .then(x.2.cmp(&y.2))
    });

    let mut merges = 0;
    for (_, u, v, ta, tb) in candidates {
        let pa = find_root(&mut parent, ta);
        let pb = find_root(&mut parent, tb);
        if pa == pb {
            continue;
        }
        let (Some(a), Some(b)) = (&polygons[pa], &polygons[pb]) else {
            continue;
        };
        if let Some(merged) = try_merge(vertices, a, b, u, v) {
            polygons[pa] = Some(merged);
            polygons[pb] = None;
            parent[pb] = pa;
            merges += 1;
        }
    }
    debug!("Merged {merges} triangle pairs into convex polygons");

    polygons.into_iter().flatten().collect()
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Joins two CCW polygons across their shared edge `{u, v}`.
/// Returns `None` if the union is not convex or would repeat a vertex.
fn try_merge(
    vertices: &[Vector2],
    a: &[usize],
    b: &[usize],
    u: usize,
    v: usize,
) -> Option<Vec<usize>> {
    // In `a` the edge runs x -> y; in `b` it runs y -> x.
    let na = a.len();
    let i = (0..na).find(|&i| {
        let (p, q) = (a[i], a[(i + 1) % na]);
        (p == u && q == v) || (p == v && q == u)
    })?;
    let (x, y) = (a[i], a[(i + 1) % na]);

    let nb = b.len();
    let j = (0..nb).find(|&j| b[j] == y && b[(j + 1) % nb] == x)?;

    // a from y round to x, then b's vertices strictly between x and y.
    let mut merged: Vec<usize> = (0..na).map(|k| a[(i + 1 + k) % na]).collect();
    merged.extend((2..nb).map(|k| b[(j + k) % nb]));

    let mut seen = HashSet::with_capacity(merged.len());
    if !merged.iter().all(|idx| seen.insert(*idx)) {
        return None;
    }
    let points: Vec<Vector2> = merged.iter().map(|&idx| vertices[idx]).collect();
    is_convex(&points).then_some(merged)
}

/// Drops vertices no face refers to and renumbers the rest in first-use
/// order.
fn compact_vertices(
    vertices: &[Vector2],
    polygons: Vec<Vec<usize>>,
) -> (Vec<Vector2>, Vec<Vec<usize>>) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut compacted = Vec::new();
    let polygons = polygons
        .into_iter()
        .map(|poly| {
            poly.into_iter()
                .map(|old| {
                    *remap.entry(old).or_insert_with(|| {
                        compacted.push(vertices[old]);
                        compacted.len() - 1
                    })
                })
                .collect()
        })
        .collect();
    (compacted, polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::point_in_convex;

    fn square_mesh(obstacles: &[Obstacle]) -> NavMesh {
        NavMesh::build(WorldBounds::square(100.0), 0.0, obstacles, 0.0)
    }

    #[test]
    fn open_world_is_one_face() {
        let mesh = square_mesh(&[]);
        assert_eq!(mesh.face_count(), 1);
        assert!((mesh.area() - 10_000.0).abs() < 1e-2);
        assert!(mesh.diagnostics().is_empty());
    }

    #[test]
    fn hole_is_carved_out() {
        let mesh = square_mesh(&[Obstacle::rectangle(Vector2::new(50.0, 50.0), 20.0, 20.0)]);
        assert!((mesh.area() - 9_600.0).abs() < 1e-1);
        assert!(mesh.find_face(Vector2::new(50.0, 50.0)).is_none());
        assert!(mesh.find_face(Vector2::new(10.0, 10.0)).is_some());
    }

    #[test]
    fn faces_are_convex() {
        let mesh = square_mesh(&[
            Obstacle::rectangle(Vector2::new(30.0, 30.0), 10.0, 10.0),
            Obstacle::rectangle(Vector2::new(70.0, 60.0), 15.0, 25.0),
        ]);
        for i in 0..mesh.face_count() {
            assert!(is_convex(&mesh.face_points(i)), "face {i} not convex");
        }
    }

    #[test]
    fn merging_reduces_face_count() {
        let obstacles = [Obstacle::rectangle(Vector2::new(50.0, 50.0), 20.0, 20.0)];
        let soup = triangulate_with_constraints(
            &WorldBounds::square(100.0).corners(),
            &[obstacles[0].effective_ring()],
            0.0,
        );
        let mesh = square_mesh(&obstacles);
        // 10 triangles, 2 of them inside the hole.
        assert_eq!(soup.triangles.len(), 10);
        assert!(mesh.face_count() < 8);
    }

    #[test]
    fn boundary_polyline_limits_walkable_area() {
        let border = Obstacle::polyline(vec![
            Vector2::new(10.0, 10.0),
            Vector2::new(90.0, 10.0),
            Vector2::new(90.0, 90.0),
            Vector2::new(10.0, 90.0),
        ]);
        let mesh = square_mesh(&[border]);
        assert!((mesh.area() - 6_400.0).abs() < 1e-1);
        assert!(mesh.find_face(Vector2::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn fully_blocked_world_is_degenerate() {
        let mesh = square_mesh(&[Obstacle::rectangle(Vector2::new(50.0, 50.0), 200.0, 200.0)]);
        assert!(mesh.is_empty());
        assert!(mesh.diagnostics().contains(&BuildIssue::DegenerateGeometry));
    }

    #[test]
    fn invalid_bounds_give_empty_mesh() {
        let mesh = NavMesh::build(WorldBounds::square(0.0), 3.0, &[], 5.0);
        assert!(mesh.is_empty());
        assert_eq!(mesh.diagnostics()[0], BuildIssue::InvalidBounds);
    }

    #[test]
    fn collapsed_obstacle_is_skipped() {
        let sliver = Obstacle::convex_hull(vec![
            Vector2::new(50.0, 50.0),
            Vector2::new(51.0, 50.0),
            Vector2::new(50.0, 51.0),
        ]);
        let mesh = NavMesh::build(WorldBounds::square(100.0), 3.0, &[sliver], 5.0);
        assert!(mesh.diagnostics().contains(&BuildIssue::ObstacleSkipped { index: 0 }));
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn merge_rejects_reflex_union() {
        // Two triangles forming a dart (concave quad).
        let vertices = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(0.0, 10.0),
        ];
        let a = [0, 1, 2];
        let b = [0, 2, 3];
        assert_eq!(try_merge(&vertices, &a, &b, 0, 2), None);

        let square = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(10.0, 10.0),
            Vector2::new(0.0, 10.0),
        ];
        assert_eq!(try_merge(&square, &[0, 1, 2], &[0, 2, 3], 0, 2), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn clean_ring_snaps_and_clamps() {
        let obstacle = Obstacle::convex_hull(vec![
            Vector2::new(-10.0, -10.0),
            Vector2::new(31.0, 1.0),
            Vector2::new(1.0, 31.0),
        ]);
        let ring = clean_ring(&obstacle, WorldBounds::square(100.0), 3.0, 0.0);
        assert!(ring.iter().all(|p| WorldBounds::square(100.0).contains(*p)));
        assert!(ring.contains(&Vector2::new(30.0, 0.0)));
        assert!(point_in_convex(Vector2::new(5.0, 5.0), &ring, 1e-3));
    }
}
