// Navigation state shared by every moving character (player and enemies).
//
// The agent owns its goal and cached path; its position belongs to the
// physics side (`Transform`) and is only ever read here.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use super::geometry::Vector2;
use super::navmesh::NavMesh;
use super::pathfinding::Path;
use super::steering::{ARRIVAL_DEAD_ZONE, steer};
use crate::error::NavError;

/// Default speed of a generic character.
pub const DEFAULT_AGENT_SPEED: f32 = 100.0;
/// Default body size of a generic character.
pub const DEFAULT_AGENT_SIZE: f32 = 18.0;
/// Failed path queries tolerated before a retained path is dropped.
pub const DEFAULT_STALE_PATH_TICKS: u32 = 30;

/// What to do with the cached path when a recompute fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePathPolicy {
    /// Keep following the last good path for a bounded number of failures.
    #[default]
    Retain,
    /// Drop the path on the first failure and wait for a good one.
    Clear,
}

/// Where an agent is in its goal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavStatus {
    /// No goal.
    #[default]
    Idle,
    /// Goal set but no usable path yet.
    Seeking,
    /// Following a path with intermediate waypoints.
    Moving,
    /// On the final leg, speed damped.
    Arriving,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct NavigatingAgent {
    pub speed: f32,
    pub size: f32,
    goal: Option<Vector2>,
    path: Path,
    status: NavStatus,
    failed_queries: u32,
}

impl Default for NavigatingAgent {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_SPEED, DEFAULT_AGENT_SIZE)
    }
}

impl NavigatingAgent {
    pub fn new(speed: f32, size: f32) -> Self {
        Self {
            speed,
            size,
            goal: None,
            path: Vec::new(),
            status: NavStatus::Idle,
            failed_queries: 0,
        }
    }

    pub fn goal(&self) -> Option<Vector2> {
        self.goal
    }

    pub fn path(&self) -> &[Vector2] {
        &self.path
    }

    pub fn status(&self) -> NavStatus {
        self.status
    }

    /// Consecutive failed path recomputes.
    pub fn failed_queries(&self) -> u32 {
        self.failed_queries
    }

    /// Snaps `point` onto the mesh and makes it the goal.
    ///
    /// On failure the previous goal is kept. Calling this every tick with a
    /// moving point is fine; nothing accumulates.
    pub fn set_follow(&mut self, mesh: &NavMesh, point: Vector2) -> Result<Vector2, NavError> {
        let snapped = mesh.find_closest_point(point)?.point;
        self.goal = Some(snapped);
        self.refresh_status();
        Ok(snapped)
    }

    pub fn clear_goal(&mut self) {
        self.goal = None;
        self.path.clear();
        self.failed_queries = 0;
        self.status = NavStatus::Idle;
    }

    /// True once `position` is inside the dead zone around the goal.
    pub fn has_arrived(&self, position: Vector2) -> bool {
        self.goal
            .is_some_and(|goal| position.distance(goal) <= ARRIVAL_DEAD_ZONE)
    }

    /// Replaces the cached path with a fresh one from `position` to the goal.
    ///
    /// When the query fails the cached path is handled per `policy`: under
    /// `Retain` it survives up to `max_stale` consecutive failures.
    pub fn recompute_path(
        &mut self,
        mesh: &NavMesh,
        position: Vector2,
        policy: StalePathPolicy,
        max_stale: u32,
    ) -> Result<(), NavError> {
        let Some(goal) = self.goal else {
            self.path.clear();
            self.refresh_status();
            return Ok(());
        };

        match mesh.find_path(position, goal) {
            Ok(path) => {
                self.path = path;
                self.failed_queries = 0;
                self.refresh_status();
                Ok(())
            }
            Err(err) => {
                self.failed_queries = self.failed_queries.saturating_add(1);
                let drop_path = match policy {
                    StalePathPolicy::Clear => true,
                    StalePathPolicy::Retain => self.failed_queries > max_stale,
                };
                if drop_path {
                    self.path.clear();
                }
                self.refresh_status();
                Err(err)
            }
        }
    }

    /// Velocity request for this tick. Zero without a goal.
    pub fn steer(&self, position: Vector2) -> Vector2 {
        if self.goal.is_none() {
            return Vector2::ZERO;
        }
        steer(position, &self.path, self.speed)
    }

    fn refresh_status(&mut self) {
        self.status = match (self.goal, self.path.len()) {
            (None, _) => NavStatus::Idle,
            (Some(_), 0 | 1) => NavStatus::Seeking,
            (Some(_), 2) => NavStatus::Arriving,
            (Some(_), _) => NavStatus::Moving,
        };
    }
}
