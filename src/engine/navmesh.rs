// Navigation mesh: convex faces over a shared vertex table, with adjacency
// derived from shared edges. Immutable once built; shared read-only by every
// agent in the scene.

use std::collections::HashMap;

use super::geometry::{
    GEOMETRY_EPSILON, Vector2, centroid, closest_point_on_segment, point_in_convex, signed_area,
};
use super::obstacle::ShapeIssue;
use super::pathfinding::{self, Path};
use crate::error::NavError;

// ============================================================================
// FACES
// ============================================================================

/// Connection from one face to a neighbour across a shared edge.
///
/// `edge` is `(a, b)` in this face's counter-clockwise order, so when walking
/// out of this face through the edge `b` is on the left and `a` on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLink {
    pub neighbour: usize,
    pub edge: (usize, usize),
}

/// One convex, counter-clockwise polygon of the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Indices into the mesh's vertex table.
    pub vertices: Vec<usize>,
    pub links: Vec<FaceLink>,
    pub centroid: Vector2,
}

impl Face {
    pub fn link_to(&self, neighbour: usize) -> Option<&FaceLink> {
        self.links.iter().find(|l| l.neighbour == neighbour)
    }
}

/// Problems the builder ran into. The mesh is still usable, just
/// best-effort around the flagged input.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildIssue {
    /// World rectangle is empty or non-finite.
    InvalidBounds,
    /// An obstacle's raw shape is malformed; it was used as well as possible.
    ObstacleShape { index: usize, issue: ShapeIssue },
    /// An obstacle collapsed to fewer than three points after clean-up.
    ObstacleSkipped { index: usize },
    /// Constraint edges dropped because obstacles cross each other.
    CrossingConstraints { count: usize },
    /// No walkable area remains; the mesh is empty.
    DegenerateGeometry,
}

/// Result of snapping a point onto the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub face: usize,
    pub point: Vector2,
}

// ============================================================================
// NAVMESH
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    vertices: Vec<Vector2>,
    faces: Vec<Face>,
    diagnostics: Vec<BuildIssue>,
    max_snap_distance: Option<f32>,
}

impl NavMesh {
    /// A mesh with no walkable faces.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a mesh from convex polygons given as vertex-index rings.
    ///
    /// Rings may be wound either way; they are stored counter-clockwise.
    /// Rings with fewer than three vertices or zero area are dropped.
    /// Adjacency is derived from edges shared between rings.
    pub fn from_polygons(vertices: Vec<Vector2>, polygons: Vec<Vec<usize>>) -> Self {
        let mut faces = Vec::with_capacity(polygons.len());
        for mut ring in polygons {
            if ring.len() < 3 || ring.iter().any(|&i| i >= vertices.len()) {
                continue;
            }
            let points: Vec<Vector2> = ring.iter().map(|&i| vertices[i]).collect();
            let area = signed_area(&points);
            if area.abs() <= f32::EPSILON {
                continue;
            }
            if area < 0.0 {
                ring.reverse();
            }
            faces.push(Face {
                vertices: ring,
                links: Vec::new(),
                centroid: centroid(&points),
            });
        }

        link_faces(&mut faces);

        Self {
            vertices,
            faces,
            diagnostics: Vec::new(),
            max_snap_distance: None,
        }
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: Vec<BuildIssue>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Caps how far `find_closest_point` may move a query point.
    pub fn with_max_snap_distance(mut self, max_snap_distance: Option<f32>) -> Self {
        self.max_snap_distance = max_snap_distance;
        self
    }

    pub fn vertices(&self) -> &[Vector2] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn diagnostics(&self) -> &[BuildIssue] {
        &self.diagnostics
    }

    pub fn max_snap_distance(&self) -> Option<f32> {
        self.max_snap_distance
    }

    /// Vertex positions of face `index`, counter-clockwise.
    pub fn face_points(&self, index: usize) -> Vec<Vector2> {
        self.faces
            .get(index)
            .map(|f| f.vertices.iter().map(|&i| self.vertices[i]).collect())
            .unwrap_or_default()
    }

    /// Every face as a point ring, for debug drawing.
    pub fn polygons(&self) -> Vec<Vec<Vector2>> {
        (0..self.faces.len()).map(|i| self.face_points(i)).collect()
    }

    /// Total walkable area.
    pub fn area(&self) -> f32 {
        (0..self.faces.len())
            .map(|i| signed_area(&self.face_points(i)))
            .sum()
    }

    /// The shared edge between two adjacent faces as `(left, right)` seen
    /// when walking from `from` into `to`.
    pub fn portal(&self, from: usize, to: usize) -> Option<(Vector2, Vector2)> {
        let link = self.faces.get(from)?.link_to(to)?;
        let (a, b) = link.edge;
        Some((self.vertices[b], self.vertices[a]))
    }

    /// Lowest-index face containing `point` (boundary inclusive).
    pub fn find_face(&self, point: Vector2) -> Option<usize> {
        if !point.is_finite() {
            return None;
        }
        (0..self.faces.len()).find(|&i| point_in_convex(point, &self.face_points(i), GEOMETRY_EPSILON))
    }

    /// Snaps `point` onto the mesh using the mesh's snap limit.
    pub fn find_closest_point(&self, point: Vector2) -> Result<ClosestPoint, NavError> {
        self.find_closest_point_within(point, self.max_snap_distance.unwrap_or(f32::INFINITY))
    }

    /// Snaps `point` onto the mesh.
    ///
    /// A point inside a face is returned unchanged. Otherwise the nearest
    /// point on any face boundary is chosen; ties go to the lowest face index,
    /// then to the lexicographically smallest point.
    pub fn find_closest_point_within(
        &self,
        point: Vector2,
        max_distance: f32,
    ) -> Result<ClosestPoint, NavError> {
        if self.is_empty() {
            return Err(NavError::DegenerateGeometry);
        }
        let outside = NavError::PointOutsideMesh {
            x: point.x,
            y: point.y,
        };
        if !point.is_finite() {
            return Err(outside);
        }
        if let Some(face) = self.find_face(point) {
            return Ok(ClosestPoint { face, point });
        }

        let mut best: Option<(f32, ClosestPoint)> = None;
        for (face, f) in self.faces.iter().enumerate() {
            let n = f.vertices.len();
            for k in 0..n {
                let a = self.vertices[f.vertices[k]];
                let b = self.vertices[f.vertices[(k + 1) % n]];
                let candidate = closest_point_on_segment(point, a, b);
                let dist = point.distance_squared(candidate);
                let better = match &best {
                    None => true,
                    Some((best_dist, best_hit)) => {
                        dist < *best_dist
                            || (dist == *best_dist
                                && best_hit.face == face
                                && candidate.lexicographic_cmp(&best_hit.point).is_lt())
                    }
                };
                if better {
                    best = Some((dist, ClosestPoint { face, point: candidate }));
                }
            }
        }

        match best {
            Some((dist, hit)) if dist.sqrt() <= max_distance => Ok(hit),
            _ => Err(outside),
        }
    }

    /// Shortest taut path between two points. See [`pathfinding::find_path`].
    pub fn find_path(&self, from: Vector2, to: Vector2) -> Result<Path, NavError> {
        pathfinding::find_path(self, from, to)
    }
}

/// Fills in `links` for every face from shared (opposite) directed edges.
///
/// Collinear edge runs shared with the same neighbour are merged into one
/// link so the portal spans the whole common boundary.
fn link_faces(faces: &mut [Face]) {
    let mut edge_owner: HashMap<(usize, usize), usize> = HashMap::new();
    for (fi, face) in faces.iter().enumerate() {
        let n = face.vertices.len();
        for k in 0..n {
            edge_owner.insert((face.vertices[k], face.vertices[(k + 1) % n]), fi);
        }
    }

    for fi in 0..faces.len() {
        let n = faces[fi].vertices.len();
        let mut raw: Vec<FaceLink> = Vec::new();
        for k in 0..n {
            let a = faces[fi].vertices[k];
            let b = faces[fi].vertices[(k + 1) % n];
            if let Some(&other) = edge_owner.get(&(b, a)) {
                if other != fi {
                    raw.push(FaceLink {
                        neighbour: other,
                        edge: (a, b),
                    });
                }
            }
        }
        faces[fi].links = merge_link_runs(raw);
    }
}

fn merge_link_runs(raw: Vec<FaceLink>) -> Vec<FaceLink> {
    let mut merged: Vec<FaceLink> = Vec::with_capacity(raw.len());
    for link in raw {
        match merged.last_mut() {
            Some(prev) if prev.neighbour == link.neighbour && prev.edge.1 == link.edge.0 => {
                prev.edge.1 = link.edge.1;
            }
            _ => merged.push(link),
        }
    }
    // The run may wrap around the ring's starting vertex.
    if merged.len() > 1 {
        let first = merged[0];
        let last = merged[merged.len() - 1];
        if first.neighbour == last.neighbour && last.edge.1 == first.edge.0 {
            merged[0].edge.0 = last.edge.0;
            merged.pop();
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit squares side by side: [0,1]x[0,1] and [1,2]x[0,1].
    fn two_squares() -> NavMesh {
        let vertices = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(2.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        NavMesh::from_polygons(vertices, vec![vec![0, 1, 4, 5], vec![1, 2, 3, 4]])
    }

    #[test]
    fn adjacency_is_symmetric() {
        let mesh = two_squares();
        assert_eq!(mesh.faces()[0].links.len(), 1);
        assert_eq!(mesh.faces()[1].links.len(), 1);
        assert_eq!(mesh.faces()[0].links[0].neighbour, 1);
        assert_eq!(mesh.faces()[1].links[0].neighbour, 0);
    }

    #[test]
    fn portal_orientation_left_is_counter_clockwise_end() {
        let mesh = two_squares();
        // Walking +x from the left square: left is the top vertex (1, 1).
        let (left, right) = mesh.portal(0, 1).unwrap_or_default();
        assert_eq!(left, Vector2::new(1.0, 1.0));
        assert_eq!(right, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn clockwise_rings_are_flipped() {
        let vertices = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(1.0, 0.0),
        ];
        let mesh = NavMesh::from_polygons(vertices, vec![vec![0, 1, 2, 3]]);
        assert!(mesh.area() > 0.0);
    }

    #[test]
    fn shared_boundary_lookup_prefers_lowest_face() {
        let mesh = two_squares();
        assert_eq!(mesh.find_face(Vector2::new(1.0, 0.5)), Some(0));
        assert_eq!(mesh.find_face(Vector2::new(1.5, 0.5)), Some(1));
        assert_eq!(mesh.find_face(Vector2::new(3.0, 0.5)), None);
    }

    #[test]
    fn closest_point_projects_onto_boundary() {
        let mesh = two_squares();
        let hit = mesh.find_closest_point(Vector2::new(1.5, 3.0)).ok();
        assert_eq!(
            hit,
            Some(ClosestPoint {
                face: 1,
                point: Vector2::new(1.5, 1.0)
            })
        );
    }

    #[test]
    fn closest_point_ties_go_to_lowest_face() {
        let mesh = two_squares();
        // (1, 2) is equally close to (1, 1) on both squares.
        let hit = mesh.find_closest_point(Vector2::new(1.0, 2.0)).ok();
        assert_eq!(hit.map(|h| h.face), Some(0));
    }

    #[test]
    fn snap_limit_rejects_far_points() {
        let mesh = two_squares().with_max_snap_distance(Some(5.0));
        assert!(mesh.find_closest_point(Vector2::new(1.0, 4.0)).is_ok());
        assert_eq!(
            mesh.find_closest_point(Vector2::new(1.0, 100.0)),
            Err(NavError::PointOutsideMesh { x: 1.0, y: 100.0 })
        );
    }

    #[test]
    fn empty_mesh_reports_degenerate_geometry() {
        assert_eq!(
            NavMesh::empty().find_closest_point(Vector2::ZERO),
            Err(NavError::DegenerateGeometry)
        );
    }

    #[test]
    fn collinear_shared_edges_merge_into_one_portal() {
        // Left face has a vertex at (1, 0.5) that splits the shared boundary.
        let vertices = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 0.5),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(2.0, 1.0),
        ];
        let mesh = NavMesh::from_polygons(vertices, vec![vec![0, 1, 2, 3, 4], vec![1, 5, 6, 3, 2]]);
        assert_eq!(mesh.faces()[0].links.len(), 1);
        assert_eq!(mesh.portal(0, 1), Some((Vector2::new(1.0, 1.0), Vector2::new(1.0, 0.0))));
    }
}
