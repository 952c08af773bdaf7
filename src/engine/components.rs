// Core ECS components and resources for the navigation simulation

use std::time::Duration;

use bevy_ecs::prelude::*;

use super::agent::StalePathPolicy;
use super::geometry::Vector2;
use super::navmesh::NavMesh;

/// Position of an entity on the 2D world plane
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vector2,
}

impl Transform {
    pub fn from_position(position: Vector2) -> Self {
        Self { position }
    }
}

/// Velocity of an entity (world units per second)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vector2,
}

impl Velocity {
    pub fn new(linear: Vector2) -> Self {
        Self { linear }
    }
}

/// Linear damping applied by the movement integrator.
/// `velocity *= 1 / (1 + linear * dt)` each tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Damping {
    pub linear: f32,
}

/// Which spawn parameters an agent was created from.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Player,
    Enemy,
}

/// Where a follow goal comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowSource {
    /// Fixed world point, e.g. a click.
    Point(Vector2),
    /// Another entity's live position.
    Entity(Entity),
}

/// Goal source polled once per tick. The goal is re-snapped only when the
/// source position differs from `last_resolved`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    pub source: FollowSource,
    pub last_resolved: Option<Vector2>,
}

impl FollowTarget {
    pub fn point(point: Vector2) -> Self {
        Self {
            source: FollowSource::Point(point),
            last_resolved: None,
        }
    }

    pub fn entity(entity: Entity) -> Self {
        Self {
            source: FollowSource::Entity(entity),
            last_resolved: None,
        }
    }
}

// ============================================================================
// RESOURCES
// ============================================================================

/// The scene's navmesh, shared read-only by every agent.
#[derive(Resource, Debug, Clone, Default)]
pub struct SceneNavMesh {
    pub mesh: NavMesh,
}

/// Seconds simulated by the current tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct TickDelta {
    pub seconds: f32,
}

impl Default for TickDelta {
    fn default() -> Self {
        Self { seconds: 1.0 / 60.0 }
    }
}

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct NavigationSettings {
    pub stale_path_policy: StalePathPolicy,
    pub stale_path_ticks: u32,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            stale_path_policy: StalePathPolicy::default(),
            stale_path_ticks: super::agent::DEFAULT_STALE_PATH_TICKS,
        }
    }
}

/// Navigation counters. `last_*` fields cover the most recent tick only.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct NavStats {
    pub last_path_queries: u32,
    pub last_path_failures: u32,
    pub last_snap_failures: u32,
    pub last_pathfinding_time: Duration,
    pub total_path_queries: u64,
    pub total_path_failures: u64,
    pub arrivals: u64,
}

impl NavStats {
    pub fn begin_tick(&mut self) {
        self.last_path_queries = 0;
        self.last_path_failures = 0;
        self.last_snap_failures = 0;
        self.last_pathfinding_time = Duration::ZERO;
    }

    pub fn pathfinding_ms(&self) -> f32 {
        self.last_pathfinding_time.as_secs_f32() * 1000.0
    }
}
