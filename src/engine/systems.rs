// ECS systems for the per-tick navigation loop.
// Run in this order: follow target -> path -> steering -> movement.

use std::time::Instant;

use bevy_ecs::prelude::*;
use log::debug;

use super::agent::NavigatingAgent;
use super::components::*;

/// Resets the per-tick counters.
pub fn begin_tick_system(mut stats: ResMut<NavStats>) {
    stats.begin_tick();
}

/// Re-snaps each agent's goal when its follow source has moved.
pub fn follow_target_system(
    navmesh: Res<SceneNavMesh>,
    mut stats: ResMut<NavStats>,
    positions: Query<&Transform>,
    mut followers: Query<(Entity, &mut FollowTarget, &mut NavigatingAgent)>,
) {
    for (entity, mut follow, mut agent) in followers.iter_mut() {
        let source = match follow.source {
            FollowSource::Point(point) => Some(point),
            FollowSource::Entity(target) => positions.get(target).ok().map(|t| t.position),
        };
        let Some(source) = source else {
            // Followed entity is gone.
            continue;
        };
        if follow.last_resolved == Some(source) {
            continue;
        }

        match agent.set_follow(&navmesh.mesh, source) {
            Ok(_) => follow.last_resolved = Some(source),
            Err(err) => {
                stats.last_snap_failures += 1;
                debug!("{entity}: keeping previous goal, {err}");
            }
        }
    }
}

/// Recomputes every active agent's path from its current position.
/// Agents inside the arrival dead zone drop their goal instead.
pub fn path_system(
    navmesh: Res<SceneNavMesh>,
    settings: Res<NavigationSettings>,
    mut stats: ResMut<NavStats>,
    mut agents: Query<(Entity, &Transform, &mut NavigatingAgent)>,
) {
    let start = Instant::now();

    for (entity, transform, mut agent) in agents.iter_mut() {
        if agent.goal().is_none() {
            continue;
        }
        if agent.has_arrived(transform.position) {
            agent.clear_goal();
            stats.arrivals += 1;
            continue;
        }

        stats.last_path_queries += 1;
        stats.total_path_queries += 1;
        let result = agent.recompute_path(
            &navmesh.mesh,
            transform.position,
            settings.stale_path_policy,
            settings.stale_path_ticks,
        );
        if let Err(err) = result {
            stats.last_path_failures += 1;
            stats.total_path_failures += 1;
            debug!(
                "{entity}: path query failed ({err}), {} consecutive",
                agent.failed_queries()
            );
        }
    }

    stats.last_pathfinding_time = start.elapsed();
}

/// Turns each agent's cached path into a velocity request. Agents without a
/// goal are held still.
pub fn steering_system(mut agents: Query<(&Transform, &NavigatingAgent, &mut Velocity)>) {
    for (transform, agent, mut velocity) in agents.iter_mut() {
        velocity.linear = agent.steer(transform.position);
    }
}

/// Update entity positions based on velocity, then apply linear damping.
/// Stands in for the physics step.
pub fn movement_system(
    delta: Res<TickDelta>,
    mut query: Query<(&mut Transform, &mut Velocity, Option<&Damping>)>,
) {
    let dt = delta.seconds;
    for (mut transform, mut velocity, damping) in query.iter_mut() {
        let step = velocity.linear * dt;
        transform.position += step;
        if let Some(damping) = damping {
            velocity.linear = velocity.linear * (1.0 / (1.0 + damping.linear * dt));
        }
    }
}
