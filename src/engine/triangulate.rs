// Constrained Delaunay triangulation of the world rectangle with obstacle
// rings as constraint edges (spade CDT).
//
// The output is a plain triangle soup over a shared vertex table; deciding
// which triangles are walkable is the builder's job.

use std::collections::HashMap;

use log::{debug, warn};
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};

use super::geometry::Vector2;

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

/// Triangles over a shared vertex table. Every triangle is counter-clockwise.
#[derive(Debug, Clone, Default)]
pub struct TriangleSoup {
    pub vertices: Vec<Vector2>,
    pub triangles: Vec<[usize; 3]>,
    /// Input rings after vertex welding, in input order.
    pub welded_rings: Vec<Vec<Vector2>>,
    /// Constraint edges dropped because they crossed an earlier constraint.
    pub skipped_constraints: usize,
}

/// Inserts points into the CDT, welding each onto an earlier vertex closer
/// than the tolerance.
struct Welder {
    cdt: Cdt,
    inserted: Vec<(Vector2, FixedVertexHandle)>,
    tolerance_sq: f32,
}

impl Welder {
    fn new(tolerance: f32) -> Self {
        Self {
            cdt: Cdt::new(),
            inserted: Vec::new(),
            tolerance_sq: tolerance.max(0.0).powi(2),
        }
    }

    fn insert(&mut self, point: Vector2) -> Option<(Vector2, FixedVertexHandle)> {
        if let Some(&(existing, handle)) = self
            .inserted
            .iter()
            .find(|(p, _)| p.distance_squared(point) <= self.tolerance_sq)
        {
            return Some((existing, handle));
        }
        match self
            .cdt
            .insert(Point2::new(f64::from(point.x), f64::from(point.y)))
        {
            Ok(handle) => {
                self.inserted.push((point, handle));
                Some((point, handle))
            }
            Err(err) => {
                warn!("Skipping vertex ({}, {}): {:?}", point.x, point.y, err);
                None
            }
        }
    }

    /// Adds a closed ring of constraint edges. Returns the welded ring and
    /// the number of edges that had to be dropped.
    fn add_ring(&mut self, ring: &[Vector2]) -> (Vec<Vector2>, usize) {
        let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(ring.len());
        let mut welded: Vec<Vector2> = Vec::with_capacity(ring.len());
        for &p in ring {
            if let Some((pos, handle)) = self.insert(p) {
                if handles.last() != Some(&handle) {
                    handles.push(handle);
                    welded.push(pos);
                }
            }
        }
        while handles.len() > 1 && handles.first() == handles.last() {
            handles.pop();
            welded.pop();
        }

        let mut skipped = 0;
        let n = handles.len();
        if n < 2 {
            return (welded, skipped);
        }
        for i in 0..n {
            let from = handles[i];
            let to = handles[(i + 1) % n];
            if from == to || self.cdt.exists_constraint(from, to) {
                continue;
            }
            if self.cdt.can_add_constraint(from, to) {
                self.cdt.add_constraint(from, to);
            } else {
                skipped += 1;
            }
        }
        (welded, skipped)
    }

    fn into_soup(self, welded_rings: Vec<Vec<Vector2>>, skipped_constraints: usize) -> TriangleSoup {
        let cdt = self.cdt;

        // Map spade's handles onto our own dense vertex table.
        let mut index_of: HashMap<FixedVertexHandle, usize> = HashMap::new();
        let mut vertices = Vec::with_capacity(cdt.num_vertices());
        for vertex in cdt.vertices() {
            let pos = vertex.position();
            index_of.insert(vertex.fix(), vertices.len());
            vertices.push(Vector2::new(pos.x as f32, pos.y as f32));
        }

        let mut triangles = Vec::with_capacity(cdt.num_inner_faces());
        for face in cdt.inner_faces() {
            let [a, b, c] = face.vertices();
            let (Some(&ia), Some(&ib), Some(&ic)) = (
                index_of.get(&a.fix()),
                index_of.get(&b.fix()),
                index_of.get(&c.fix()),
            ) else {
                continue;
            };

            let turn = (vertices[ib] - vertices[ia]).cross(vertices[ic] - vertices[ia]);
            if turn.abs() <= f32::EPSILON {
                // Sliver collapsed by the f64 -> f32 conversion.
                continue;
            }
            if turn > 0.0 {
                triangles.push([ia, ib, ic]);
            } else {
                triangles.push([ia, ic, ib]);
            }
        }

        TriangleSoup {
            vertices,
            triangles,
            welded_rings,
            skipped_constraints,
        }
    }
}

/// Triangulates the convex `outer` boundary with every ring in `rings` as a
/// closed chain of constraint edges.
///
/// The outer corners are plain vertices; being convex, their hull edges are
/// part of any triangulation.
///
/// Vertices within `weld_tolerance` of an earlier vertex are merged into it.
/// Constraint edges that would cross an earlier constraint (self-intersecting
/// or overlapping rings) are skipped and counted rather than aborting.
pub fn triangulate_with_constraints(
    outer: &[Vector2],
    rings: &[Vec<Vector2>],
    weld_tolerance: f32,
) -> TriangleSoup {
    let mut welder = Welder::new(weld_tolerance);
    for &corner in outer {
        welder.insert(corner);
    }

    let mut skipped = 0;
    let mut welded_rings = Vec::with_capacity(rings.len());
    for ring in rings {
        let (welded, ring_skipped) = welder.add_ring(ring);
        skipped += ring_skipped;
        welded_rings.push(welded);
    }

    if skipped > 0 {
        warn!("Dropped {skipped} constraint edges that crossed earlier constraints");
    }

    let soup = welder.into_soup(welded_rings, skipped);
    debug!(
        "CDT: {} vertices, {} triangles",
        soup.vertices.len(),
        soup.triangles.len()
    );
    soup
}
