// Per-tick steering toward the next waypoint.
//
// Pure functions: same inputs give the same velocity, bit for bit.

use super::geometry::Vector2;

/// Within this distance of the next waypoint the agent stands still.
pub const ARRIVAL_DEAD_ZONE: f32 = 1.0;

/// Speed toward a waypoint `distance` away.
///
/// Intermediate waypoints are approached at full speed. The final waypoint
/// is approached at `min(max_speed, distance * cbrt(max_speed))` so the
/// agent eases in instead of overshooting.
pub fn approach_speed(distance: f32, max_speed: f32, is_final: bool) -> f32 {
    if is_final {
        max_speed.min(distance * max_speed.cbrt())
    } else {
        max_speed
    }
}

/// Velocity that moves `current` along `path` (where `path[0]` is the
/// agent's own snapped position and `path[1]` the next waypoint).
///
/// Intermediate waypoints already inside the dead zone are skipped, so only
/// the final waypoint can bring the agent to a stop.
pub fn steer(current: Vector2, path: &[Vector2], max_speed: f32) -> Vector2 {
    if path.len() < 2 {
        return Vector2::ZERO;
    }
    let last = path.len() - 1;
    let mut next = 1;
    while next < last && current.distance(path[next]) <= ARRIVAL_DEAD_ZONE {
        next += 1;
    }

    let offset = path[next] - current;
    let distance = offset.length();
    if !distance.is_finite() || distance <= ARRIVAL_DEAD_ZONE {
        return Vector2::ZERO;
    }

    let speed = approach_speed(distance, max_speed, next == last);
    offset / distance * speed
}
