//! Error types surfaced by navigation queries and scene loading.
//!
//! Navigation failures are local to one agent and always recoverable: the
//! caller keeps its previous goal or path and retries on the next tick.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a navmesh query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    /// The mesh has no walkable faces (fully blocked or degenerate world).
    #[error("navmesh has no walkable faces")]
    DegenerateGeometry,
    /// The point could not be snapped onto any face.
    #[error("point ({x}, {y}) cannot be snapped onto the navmesh")]
    PointOutsideMesh { x: f32, y: f32 },
    /// Both endpoints are on the mesh but in disconnected regions.
    #[error("no path from face {from_face} to face {to_face}")]
    NoPathFound { from_face: usize, to_face: usize },
}

/// Failure while loading or validating a scene description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid scene: {0}")]
    Invalid(String),
}
