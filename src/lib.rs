//! Navmesh generation, path queries and steering for top-down agents.
//!
//! The [`engine`] module holds the navigation core (geometry, navmesh
//! builder, path queries, steering) and the ECS loop that drives agents
//! with it. [`config`] loads scene descriptions from TOML.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use error::{ConfigError, NavError};
