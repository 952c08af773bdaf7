// Debug overlay data: navigation stats text and navmesh/path geometry for a
// renderer to draw. Nothing is produced while the overlay is hidden.

use std::collections::BTreeSet;

use super::geometry::Vector2;
use super::navmesh::NavMesh;

pub struct DebugStats {
    pub tick: u64,
    pub entity_count: usize,
    pub agents_idle: usize,
    pub agents_seeking: usize,
    pub agents_moving: usize,
    pub agents_arriving: usize,
    pub navmesh_faces: usize,
    /// Time spent in path queries during the last tick (ms).
    pub pathfinding_ms: f32,
    pub path_queries: u32,
    pub path_failures: u32,
    /// Total path queries since startup.
    pub total_path_queries: u64,
    pub arrivals: u64,
}

impl DebugStats {
    /// Overlay text, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Tick: {}", self.tick),
            format!("Entities: {}", self.entity_count),
            format!(
                "Agents: {} idle | {} seeking | {} moving | {} arriving",
                self.agents_idle, self.agents_seeking, self.agents_moving, self.agents_arriving
            ),
            format!("Navmesh faces: {}", self.navmesh_faces),
            format!(
                "Pathfinding: {:.2} ms  Queries: {} ({} failed)",
                self.pathfinding_ms, self.path_queries, self.path_failures
            ),
            format!(
                "Total queries: {}  Arrivals: {}",
                self.total_path_queries, self.arrivals
            ),
        ]
    }
}

/// One agent's cached path as a polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPathDraw {
    pub position: Vector2,
    pub radius: f32,
    pub path: Vec<Vector2>,
}

/// Navmesh geometry in world coordinates, ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavmeshDebugDraw {
    /// Filled face polygons.
    pub faces: Vec<Vec<Vector2>>,
    /// Each mesh edge once, shared edges included.
    pub outlines: Vec<(Vector2, Vector2)>,
    pub vertices: Vec<Vector2>,
    pub agent_paths: Vec<AgentPathDraw>,
}

impl NavmeshDebugDraw {
    pub fn from_navmesh(mesh: &NavMesh) -> Self {
        let mut edges = BTreeSet::new();
        for face in mesh.faces() {
            let n = face.vertices.len();
            for k in 0..n {
                let (a, b) = (face.vertices[k], face.vertices[(k + 1) % n]);
                edges.insert((a.min(b), a.max(b)));
            }
        }
        let vertices = mesh.vertices();
        Self {
            faces: mesh.polygons(),
            outlines: edges
                .into_iter()
                .map(|(a, b)| (vertices[a], vertices[b]))
                .collect(),
            vertices: vertices.to_vec(),
            agent_paths: Vec::new(),
        }
    }
}

pub struct DebugOverlay {
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Navmesh and agent paths to draw this frame, or `None` when hidden.
    pub fn capture<'a>(
        &self,
        mesh: &NavMesh,
        agents: impl IntoIterator<Item = (Vector2, f32, &'a [Vector2])>,
    ) -> Option<NavmeshDebugDraw> {
        if !self.visible {
            return None;
        }
        let mut draw = NavmeshDebugDraw::from_navmesh(mesh);
        draw.agent_paths = agents
            .into_iter()
            .map(|(position, radius, path)| AgentPathDraw {
                position,
                radius,
                path: path.to_vec(),
            })
            .collect();
        Some(draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> NavMesh {
        let vertices = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(10.0, 10.0),
            Vector2::new(0.0, 10.0),
        ];
        NavMesh::from_polygons(vertices, vec![vec![0, 1, 2], vec![0, 2, 3]])
    }

    #[test]
    fn hidden_overlay_draws_nothing() {
        let overlay = DebugOverlay::new(false);
        assert!(overlay.capture(&two_triangles(), std::iter::empty()).is_none());
    }

    #[test]
    fn shared_edges_are_outlined_once() {
        let draw = NavmeshDebugDraw::from_navmesh(&two_triangles());
        assert_eq!(draw.faces.len(), 2);
        assert_eq!(draw.outlines.len(), 5);
        assert_eq!(draw.vertices.len(), 4);
    }

    #[test]
    fn visible_overlay_includes_agent_paths() {
        let mut overlay = DebugOverlay::new(false);
        overlay.toggle();
        let path = [Vector2::new(1.0, 1.0), Vector2::new(9.0, 9.0)];
        let draw = overlay.capture(&two_triangles(), [(Vector2::new(1.0, 1.0), 9.0, &path[..])]);
        assert_eq!(draw.map(|d| d.agent_paths.len()), Some(1));
    }
}
