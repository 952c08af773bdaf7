// Path queries over the navmesh face graph.
//
// Layer 1: A* over face adjacency, costed by distance between portal midpoints.
// Layer 2: funnel (string pulling) over the corridor's portals -> taut path.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use ordered_float::OrderedFloat;

use super::geometry::{GEOMETRY_EPSILON, Vector2};
use super::navmesh::NavMesh;
use crate::error::NavError;

/// Waypoints from the (snapped) start to the (snapped) goal.
pub type Path = Vec<Vector2>;

/// Shortest taut path between two points on the mesh.
///
/// Both endpoints are snapped with [`NavMesh::find_closest_point`]. Two
/// points in the same face give exactly `[from, to]`. The returned path
/// always has at least two waypoints.
pub fn find_path(mesh: &NavMesh, from: Vector2, to: Vector2) -> Result<Path, NavError> {
    let start = mesh.find_closest_point(from)?;
    let goal = mesh.find_closest_point(to)?;

    if start.face == goal.face {
        return Ok(vec![start.point, goal.point]);
    }

    let corridor = find_corridor(mesh, start.face, start.point, goal.face, goal.point).ok_or(
        NavError::NoPathFound {
            from_face: start.face,
            to_face: goal.face,
        },
    )?;

    let mut portals = Vec::with_capacity(corridor.len() + 1);
    portals.push((start.point, start.point));
    for pair in corridor.windows(2) {
        let portal = mesh.portal(pair[0], pair[1]).ok_or(NavError::NoPathFound {
            from_face: start.face,
            to_face: goal.face,
        })?;
        portals.push(portal);
    }
    portals.push((goal.point, goal.point));

    Ok(string_pull(&portals))
}

/// Sum of segment lengths.
pub fn path_length(path: &[Vector2]) -> f32 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

// ============================================================================
// A* OVER FACES
// ============================================================================

/// Face sequence from `start_face` to `goal_face`, both included.
///
/// Each face is entered at the midpoint of the portal it was reached
/// through; the step cost is the distance between successive entry points.
/// Ties in the open list resolve on the lower face index.
pub fn find_corridor(
    mesh: &NavMesh,
    start_face: usize,
    start: Vector2,
    goal_face: usize,
    goal: Vector2,
) -> Option<Vec<usize>> {
    let faces = mesh.faces();
    if start_face >= faces.len() || goal_face >= faces.len() {
        return None;
    }

    let mut best_cost: HashMap<usize, f32> = HashMap::new();
    let mut entry: HashMap<usize, Vector2> = HashMap::new();
    let mut came_from: HashMap<usize, usize> = HashMap::new();
    let mut open = BinaryHeap::new();

    best_cost.insert(start_face, 0.0);
    entry.insert(start_face, start);
    open.push(Reverse((OrderedFloat(start.distance(goal)), start_face)));

    while let Some(Reverse((_, current))) = open.pop() {
        if current == goal_face {
            let mut corridor = vec![current];
            let mut node = current;
            while let Some(&prev) = came_from.get(&node) {
                corridor.push(prev);
                node = prev;
            }
            corridor.reverse();
            return Some(corridor);
        }

        let cost = best_cost.get(&current).copied().unwrap_or(f32::INFINITY);
        let here = entry.get(&current).copied().unwrap_or(start);

        for link in &faces[current].links {
            let (a, b) = link.edge;
            let midpoint = mesh.vertices()[a].lerp(mesh.vertices()[b], 0.5);
            let tentative = cost + here.distance(midpoint);
            let known = best_cost.get(&link.neighbour).copied().unwrap_or(f32::INFINITY);
            if tentative < known {
                best_cost.insert(link.neighbour, tentative);
                entry.insert(link.neighbour, midpoint);
                came_from.insert(link.neighbour, current);
                let estimate = tentative + midpoint.distance(goal);
                open.push(Reverse((OrderedFloat(estimate), link.neighbour)));
            }
        }
    }
    None
}

// ============================================================================
// FUNNEL
// ============================================================================

/// Reduces a list of `(left, right)` portals to the shortest path through
/// them. The first and last portals are the degenerate start and goal.
pub fn string_pull(portals: &[(Vector2, Vector2)]) -> Path {
    let Some(&(start, _)) = portals.first() else {
        return Vec::new();
    };
    let goal = portals.last().map(|p| p.0).unwrap_or(start);

    let mut path = vec![start];
    let mut apex = start;
    let (mut left, mut right) = portals[0];
    let (mut left_index, mut right_index) = (0usize, 0usize);

    let mut i = 1;
    while i < portals.len() {
        let (l, r) = portals[i];

        // Right edge.
        if (right - apex).cross(r - apex) >= 0.0 {
            if apex.equals(right) || (left - apex).cross(r - apex) < 0.0 {
                right = r;
                right_index = i;
            } else {
                // Right crossed over left: left corner becomes the new apex.
                let apex_index = left_index;
                apex = left;
                push_distinct(&mut path, apex);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        // Left edge.
        if (left - apex).cross(l - apex) <= 0.0 {
            if apex.equals(left) || (right - apex).cross(l - apex) > 0.0 {
                left = l;
                left_index = i;
            } else {
                let apex_index = right_index;
                apex = right;
                push_distinct(&mut path, apex);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    push_distinct(&mut path, goal);
    if path.len() == 1 {
        // Start and goal coincide.
        path.push(goal);
    }
    path
}

fn push_distinct(path: &mut Path, point: Vector2) {
    match path.last() {
        Some(last) if last.distance_squared(point) <= GEOMETRY_EPSILON * GEOMETRY_EPSILON => {}
        _ => path.push(point),
    }
}
