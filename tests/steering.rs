use approx::assert_relative_eq;
use navmesh_agents::engine::{ARRIVAL_DEAD_ZONE, Vector2, approach_speed, steer};
use rstest::rstest;

#[rstest]
#[case(1.0, 100.0, 4.6416)]
#[case(1000.0, 100.0, 100.0)]
#[case(10.0, 1000.0, 100.0)]
#[case(0.5, 8.0, 1.0)]
fn final_leg_speed_is_cube_root_damped(
    #[case] distance: f32,
    #[case] max_speed: f32,
    #[case] expected: f32,
) {
    assert_relative_eq!(approach_speed(distance, max_speed, true), expected, epsilon = 1e-3);
}

#[test]
fn intermediate_legs_run_at_full_speed() {
    assert_eq!(approach_speed(0.1, 100.0, false), 100.0);
    assert_eq!(approach_speed(5000.0, 100.0, false), 100.0);
}

#[test]
fn velocity_points_at_next_waypoint() {
    let current = Vector2::new(10.0, 10.0);
    let path = [current, Vector2::new(40.0, 50.0), Vector2::new(400.0, 50.0)];
    let velocity = steer(current, &path, 150.0);
    assert_relative_eq!(velocity.length(), 150.0, epsilon = 1e-3);
    assert_relative_eq!(velocity.x / velocity.length(), 0.6, epsilon = 1e-5);
    assert_relative_eq!(velocity.y / velocity.length(), 0.8, epsilon = 1e-5);
}

#[test]
fn final_waypoint_velocity_is_damped() {
    let current = Vector2::new(0.0, 0.0);
    let path = [current, Vector2::new(3.0, 0.0)];
    let velocity = steer(current, &path, 100.0);
    assert_relative_eq!(velocity.x, 3.0 * 100.0f32.cbrt(), epsilon = 1e-3);
    assert_eq!(velocity.y, 0.0);
}

#[rstest]
#[case(0.5)]
#[case(ARRIVAL_DEAD_ZONE)]
#[case(0.0)]
fn dead_zone_gives_zero_velocity(#[case] distance: f32) {
    let current = Vector2::new(100.0, 100.0);
    let path = [current, Vector2::new(100.0 + distance, 100.0)];
    assert_eq!(steer(current, &path, 250.0), Vector2::ZERO);
}

#[test]
fn steering_is_bit_for_bit_repeatable() {
    let current = Vector2::new(12.345, 67.891);
    let path = [current, Vector2::new(512.25, 1024.5), Vector2::new(1999.0, 3.0)];
    let first = steer(current, &path, 123.4);
    for _ in 0..10 {
        let again = steer(current, &path, 123.4);
        assert_eq!(first.x.to_bits(), again.x.to_bits());
        assert_eq!(first.y.to_bits(), again.y.to_bits());
    }
}

#[rstest]
#[case(0.0)]
#[case(0.67)]
#[case(ARRIVAL_DEAD_ZONE)]
fn corner_in_dead_zone_steers_to_following_waypoint(#[case] gap: f32) {
    let current = Vector2::new(1049.33, 950.9997);
    let corner = Vector2::new(current.x + gap, current.y);
    let path = [current, corner, Vector2::new(1900.0, 1000.0)];
    let velocity = steer(current, &path, 150.0);
    assert_relative_eq!(velocity.length(), 150.0, epsilon = 1e-2);
    assert!(velocity.x > 0.0 && velocity.y > 0.0);
}

#[test]
fn final_waypoint_in_dead_zone_still_stops_after_skipping() {
    let current = Vector2::new(0.0, 0.0);
    let path = [current, Vector2::new(0.4, 0.0), Vector2::new(0.8, 0.0)];
    assert_eq!(steer(current, &path, 100.0), Vector2::ZERO);
}
