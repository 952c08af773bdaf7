//! Scene description: world size, navmesh parameters, obstacles and spawns.
//!
//! Scenes are TOML files. Every section is optional and falls back to the
//! values the game ships with.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::agent::{DEFAULT_STALE_PATH_TICKS, StalePathPolicy};
use crate::engine::geometry::Vector2;
use crate::engine::navmesh_builder::{
    DEFAULT_CELL_SIZE, DEFAULT_MERGE_TOLERANCE, DEFAULT_WORLD_SIZE, NavMeshBuilder, WorldBounds,
};
use crate::engine::obstacle::Obstacle;
use crate::error::ConfigError;

pub const PLAYER_SPEED: f32 = 150.0;
pub const PLAYER_SIZE: f32 = 32.0;
pub const ENEMY_SPEED: f32 = 250.0;
pub const ENEMY_SIZE: f32 = 10.0;
/// Linear damping of every agent body.
pub const DEFAULT_LINEAR_DAMPING: f32 = 10.0;

/// Built-in scene used when no file is given.
pub const DEFAULT_SCENE: &str = include_str!("../scenes/default.toml");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub world: WorldConfig,
    pub navmesh: NavmeshConfig,
    pub navigation: NavigationConfig,
    pub obstacles: Vec<Obstacle>,
    pub player: PlayerConfig,
    pub waves: Vec<WaveConfig>,
    /// Seed for spawn jitter; random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_SIZE,
            height: DEFAULT_WORLD_SIZE,
        }
    }
}

impl WorldConfig {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::from_size(self.width, self.height)
    }

    pub fn center(&self) -> Vector2 {
        self.bounds().center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavmeshConfig {
    pub cell_size: f32,
    pub merge_tolerance: f32,
    pub max_snap_distance: Option<f32>,
    /// Produce debug draw data for the navmesh.
    pub show: bool,
}

impl Default for NavmeshConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            max_snap_distance: None,
            show: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub stale_path_policy: StalePathPolicy,
    pub stale_path_ticks: u32,
    pub linear_damping: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            stale_path_policy: StalePathPolicy::Retain,
            stale_path_ticks: DEFAULT_STALE_PATH_TICKS,
            linear_damping: DEFAULT_LINEAR_DAMPING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Spawn point; the world centre when absent.
    pub spawn: Option<Vector2>,
    pub speed: f32,
    pub size: f32,
    /// Point the player walks to at start.
    pub goal: Option<Vector2>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: None,
            speed: PLAYER_SPEED,
            size: PLAYER_SIZE,
            goal: None,
        }
    }
}

/// A group of enemies spawned together, all chasing the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub count: u32,
    pub spawn: Vector2,
    #[serde(default = "default_enemy_speed")]
    pub speed: f32,
    #[serde(default = "default_enemy_size")]
    pub size: f32,
}

fn default_enemy_speed() -> f32 {
    ENEMY_SPEED
}

fn default_enemy_size() -> f32 {
    ENEMY_SIZE
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The scene shipped with the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_SCENE)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.world.bounds().is_valid() {
            return invalid(format!(
                "world size must be positive, got {} x {}",
                self.world.width, self.world.height
            ));
        }
        if !(self.navmesh.cell_size >= 0.0 && self.navmesh.cell_size.is_finite()) {
            return invalid(format!("navmesh.cell_size must be >= 0, got {}", self.navmesh.cell_size));
        }
        if !(self.navmesh.merge_tolerance >= 0.0 && self.navmesh.merge_tolerance.is_finite()) {
            return invalid(format!(
                "navmesh.merge_tolerance must be >= 0, got {}",
                self.navmesh.merge_tolerance
            ));
        }
        if let Some(max) = self.navmesh.max_snap_distance {
            if max.is_nan() || max < 0.0 {
                return invalid(format!("navmesh.max_snap_distance must be >= 0, got {max}"));
            }
        }
        if !(self.navigation.linear_damping >= 0.0) {
            return invalid(format!(
                "navigation.linear_damping must be >= 0, got {}",
                self.navigation.linear_damping
            ));
        }
        if !(self.player.speed >= 0.0 && self.player.size > 0.0) {
            return invalid("player speed must be >= 0 and size > 0".to_string());
        }
        for (i, wave) in self.waves.iter().enumerate() {
            if !(wave.speed >= 0.0 && wave.size > 0.0) || !wave.spawn.is_finite() {
                return invalid(format!("wave {i} has an invalid spawn, speed or size"));
            }
        }
        Ok(())
    }

    pub fn navmesh_builder(&self) -> NavMeshBuilder {
        NavMeshBuilder::new(self.world.bounds())
            .with_cell_size(self.navmesh.cell_size)
            .with_merge_tolerance(self.navmesh.merge_tolerance)
            .with_max_snap_distance(self.navmesh.max_snap_distance)
    }

    pub fn player_spawn(&self) -> Vector2 {
        self.player.spawn.unwrap_or_else(|| self.world.center())
    }
}
