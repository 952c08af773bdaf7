// Engine module - navigation core and the ECS loop around it

pub mod agent;
pub mod components;
pub mod context;
pub mod debug_overlay;
pub mod geometry;
pub mod navmesh;
pub mod navmesh_builder;
pub mod obstacle;
pub mod pathfinding;
pub mod simplify;
pub mod steering;
pub mod systems;
pub mod triangulate;

// Re-export commonly used items
pub use agent::{NavStatus, NavigatingAgent, StalePathPolicy};
pub use components::*;
pub use context::SimulationContext;
pub use geometry::Vector2;
pub use navmesh::{BuildIssue, ClosestPoint, Face, FaceLink, NavMesh};
pub use navmesh_builder::{NavMeshBuilder, WorldBounds};
pub use obstacle::{Obstacle, ObstacleKind};
pub use pathfinding::Path;
pub use steering::{ARRIVAL_DEAD_ZONE, approach_speed, steer};
