// Headless navigation demo: builds the scene navmesh, spawns the player and
// the enemy waves, and runs the tick loop while enemies chase the player.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use navmesh_agents::config::SceneConfig;
use navmesh_agents::engine::SimulationContext;
use navmesh_agents::logging;

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the navmesh agent simulation headless")]
struct Args {
    /// Scene file (TOML). Uses the built-in scene when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Produce navmesh debug draw data and log its size.
    #[arg(long)]
    show_navmesh: bool,
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneConfig::builtin().context("loading built-in scene")?,
    };
    if args.show_navmesh {
        config.navmesh.show = true;
    }

    let mut ctx = SimulationContext::new(config);
    for issue in ctx.navmesh().diagnostics() {
        warn!("Navmesh build issue: {issue:?}");
    }

    let player = ctx.spawn_player();
    let enemies = ctx.start_waves();
    info!("Spawned player and {} enemies", enemies.len());

    let report_every = (1.0 / args.dt.max(f32::EPSILON)).round().max(1.0) as u64;
    for _ in 0..args.ticks {
        ctx.tick(args.dt);

        if ctx.tick_count() % report_every == 0 {
            for line in ctx.debug_stats().lines() {
                info!("{line}");
            }
            if let Some(pos) = ctx.position(player) {
                debug!("Player at ({:.1}, {:.1})", pos.x, pos.y);
            }
        }
    }

    if let Some(draw) = ctx.debug_draw() {
        info!(
            "Navmesh overlay: {} faces, {} edges, {} vertices, {} agent paths",
            draw.faces.len(),
            draw.outlines.len(),
            draw.vertices.len(),
            draw.agent_paths.len()
        );
    }

    ctx.teardown();
    Ok(())
}
