use approx::assert_relative_eq;
use navmesh_agents::NavError;
use navmesh_agents::engine::pathfinding::{find_corridor, path_length};
use navmesh_agents::engine::{NavMesh, NavMeshBuilder, Obstacle, Vector2, WorldBounds};
use rstest::rstest;

fn v(x: f32, y: f32) -> Vector2 {
    Vector2::new(x, y)
}

/// True if any point of the path comes within the square shrunk by `margin`.
fn path_enters_square(path: &[Vector2], center: Vector2, half: f32, margin: f32) -> bool {
    let inner = half - margin;
    path.windows(2).any(|seg| {
        (0..=200).any(|k| {
            let p = seg[0].lerp(seg[1], k as f32 / 200.0);
            (p.x - center.x).abs() < inner && (p.y - center.y).abs() < inner
        })
    })
}

#[rstest]
#[case::exact(0.0, 0.0, 0.01)]
#[case::game_defaults(3.0, 5.0, 3.0)]
fn path_goes_around_central_square(
    #[case] cell_size: f32,
    #[case] merge_tolerance: f32,
    #[case] margin: f32,
) {
    let center = v(1000.0, 1000.0);
    let mesh = NavMeshBuilder::new(WorldBounds::square(2000.0))
        .with_cell_size(cell_size)
        .with_merge_tolerance(merge_tolerance)
        .build(&[Obstacle::rectangle(center, 100.0, 100.0)]);

    let path = mesh.find_path(v(10.0, 10.0), v(1990.0, 1990.0)).unwrap();
    assert!(path.len() >= 3, "expected a bend, got {path:?}");
    assert_eq!(path.first(), Some(&v(10.0, 10.0)));
    assert_eq!(path.last(), Some(&v(1990.0, 1990.0)));
    assert!(!path_enters_square(&path, center, 50.0, margin), "path {path:?} crosses the square");

    // Around a corner of the square is only slightly longer than straight.
    let straight = v(10.0, 10.0).distance(v(1990.0, 1990.0));
    assert!(path_length(&path) >= straight);
    assert!(path_length(&path) < straight + 100.0);
}

#[rstest]
#[case(v(10.0, 10.0), v(1990.0, 1990.0))]
#[case(v(1000.0, 3.0), v(7.0, 1500.0))]
#[case(v(0.0, 0.0), v(2000.0, 0.0))]
fn open_world_paths_are_direct(#[case] from: Vector2, #[case] to: Vector2) {
    let mesh = NavMeshBuilder::default().build(&[]);
    assert_eq!(mesh.find_path(from, to), Ok(vec![from, to]));
}

#[test]
fn same_face_points_give_two_point_path() {
    let mesh = NavMeshBuilder::default().build(&[Obstacle::rectangle(v(1000.0, 1000.0), 100.0, 100.0)]);
    for (i, face) in mesh.faces().iter().enumerate() {
        let c = face.centroid;
        let corner = mesh.face_points(i)[0];
        let p = c.lerp(corner, 0.5);
        assert_eq!(mesh.find_path(c, p), Ok(vec![c, p]), "face {i}");
    }
}

#[test]
fn path_is_no_longer_than_corridor_midpoints() {
    let obstacles = vec![
        Obstacle::rectangle(v(1000.0, 1000.0), 100.0, 100.0),
        Obstacle::rectangle(v(600.0, 400.0), 400.0, 50.0),
        Obstacle::rectangle(v(1400.0, 1500.0), 50.0, 600.0),
    ];
    let mesh = NavMeshBuilder::default().build(&obstacles);
    let (from, to) = (v(50.0, 50.0), v(1900.0, 1900.0));

    let start = mesh.find_closest_point(from).unwrap();
    let goal = mesh.find_closest_point(to).unwrap();
    let corridor = find_corridor(&mesh, start.face, start.point, goal.face, goal.point).unwrap();

    let mut midpoints = vec![start.point];
    for pair in corridor.windows(2) {
        let (left, right) = mesh.portal(pair[0], pair[1]).unwrap();
        midpoints.push(left.lerp(right, 0.5));
    }
    midpoints.push(goal.point);

    let path = mesh.find_path(from, to).unwrap();
    assert!(path_length(&path) <= path_length(&midpoints) + 1e-2);
}

#[test]
fn points_off_mesh_are_snapped() {
    let mesh = NavMeshBuilder::default().build(&[Obstacle::rectangle(v(1000.0, 1000.0), 100.0, 100.0)]);

    // Inside the obstacle: snapped onto its nearest edge.
    let hit = mesh.find_closest_point(v(1000.0, 1040.0)).unwrap();
    assert_relative_eq!(hit.point.y, 1050.0, epsilon = 3.0);
    assert!(mesh.find_face(hit.point).is_some());

    // Outside the world.
    let hit = mesh.find_closest_point(v(-100.0, 500.0)).unwrap();
    assert_relative_eq!(hit.point.x, 0.0);
    assert_relative_eq!(hit.point.y, 500.0);
}

#[test]
fn snap_limit_is_honoured() {
    let mesh = NavMeshBuilder::default()
        .with_max_snap_distance(Some(50.0))
        .build(&[]);
    assert!(mesh.find_closest_point(v(-10.0, 10.0)).is_ok());
    assert_eq!(
        mesh.find_closest_point(v(-500.0, 10.0)),
        Err(NavError::PointOutsideMesh { x: -500.0, y: 10.0 })
    );
    assert!(matches!(
        mesh.find_path(v(10.0, 10.0), v(5000.0, 10.0)),
        Err(NavError::PointOutsideMesh { .. })
    ));
}

#[test]
fn separate_islands_have_no_path() {
    let island = |min: f32, max: f32| {
        Obstacle::polyline(vec![v(min, min), v(max, min), v(max, max), v(min, max)])
    };
    let mesh = NavMesh::build(
        WorldBounds::square(100.0),
        0.0,
        &[island(10.0, 40.0), island(60.0, 90.0)],
        0.0,
    );
    assert!(matches!(
        mesh.find_path(v(20.0, 20.0), v(70.0, 70.0)),
        Err(NavError::NoPathFound { .. })
    ));
    assert!(mesh.find_path(v(20.0, 20.0), v(30.0, 35.0)).is_ok());
}

#[test]
fn empty_mesh_queries_fail_cleanly() {
    let mesh = NavMesh::empty();
    assert_eq!(
        mesh.find_path(v(1.0, 1.0), v(2.0, 2.0)),
        Err(NavError::DegenerateGeometry)
    );
}

#[test]
fn queries_are_deterministic() {
    let mesh = NavMeshBuilder::default().build(&[Obstacle::rectangle(v(1000.0, 1000.0), 100.0, 100.0)]);
    let a = mesh.find_path(v(10.0, 10.0), v(1990.0, 1990.0));
    let b = mesh.find_path(v(10.0, 10.0), v(1990.0, 1990.0));
    assert_eq!(a, b);
}
