// Simulation context: owns the ECS world, the scene navmesh and the tick
// schedule. Created at scene load, torn down with the scene.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::{NavStatus, NavigatingAgent};
use super::components::*;
use super::debug_overlay::{DebugOverlay, DebugStats, NavmeshDebugDraw};
use super::geometry::Vector2;
use super::navmesh::NavMesh;
use super::obstacle::Obstacle;
use super::systems::*;
use crate::config::{SceneConfig, WaveConfig};

/// Upper bound of the random offset added to spawn points on each axis.
pub const SPAWN_JITTER: f32 = 0.01;

pub struct SimulationContext {
    pub world: World,
    schedule: Schedule,
    config: SceneConfig,
    rng: StdRng,
    player: Option<Entity>,
    overlay: DebugOverlay,
    tick: u64,
}

impl SimulationContext {
    /// Builds the navmesh for the scene and prepares an empty world.
    pub fn new(config: SceneConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(SceneNavMesh {
            mesh: config.navmesh_builder().build(&config.obstacles),
        });
        world.insert_resource(NavigationSettings {
            stale_path_policy: config.navigation.stale_path_policy,
            stale_path_ticks: config.navigation.stale_path_ticks,
        });
        world.insert_resource(NavStats::default());
        world.insert_resource(TickDelta::default());

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                begin_tick_system,
                follow_target_system,
                path_system,
                steering_system,
                movement_system,
            )
                .chain(),
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            world,
            schedule,
            overlay: DebugOverlay::new(config.navmesh.show),
            config,
            rng,
            player: None,
            tick: 0,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn navmesh(&self) -> &NavMesh {
        &self.world.resource::<SceneNavMesh>().mesh
    }

    /// Replaces the obstacle layout and rebuilds the navmesh. Agents keep
    /// their goals; paths are recomputed on the next tick.
    pub fn rebuild_navmesh(&mut self, obstacles: Vec<Obstacle>) {
        self.config.obstacles = obstacles;
        let mesh = self.config.navmesh_builder().build(&self.config.obstacles);
        self.world.resource_mut::<SceneNavMesh>().mesh = mesh;
    }

    /// Spawns an agent at `spawn` plus a small random offset.
    pub fn spawn_agent(&mut self, kind: AgentKind, spawn: Vector2, speed: f32, size: f32) -> Entity {
        let jitter = Vector2::new(
            self.rng.gen_range(0.0..SPAWN_JITTER),
            self.rng.gen_range(0.0..SPAWN_JITTER),
        );
        self.world
            .spawn((
                kind,
                Transform::from_position(spawn + jitter),
                Velocity::default(),
                Damping {
                    linear: self.config.navigation.linear_damping,
                },
                NavigatingAgent::new(speed, size),
            ))
            .id()
    }

    /// Spawns the player from config, walking to its configured goal if any.
    pub fn spawn_player(&mut self) -> Entity {
        let player = self.config.player;
        let entity = self.spawn_agent(AgentKind::Player, self.config.player_spawn(), player.speed, player.size);
        if let Some(goal) = player.goal {
            self.set_goal(entity, goal);
        }
        self.player = Some(entity);
        entity
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// Spawns one enemy group. Enemies chase the player when there is one.
    pub fn start_wave(&mut self, wave: &WaveConfig) -> Vec<Entity> {
        let enemies: Vec<Entity> = (0..wave.count)
            .map(|_| self.spawn_agent(AgentKind::Enemy, wave.spawn, wave.speed, wave.size))
            .collect();
        if let Some(player) = self.player {
            for &enemy in &enemies {
                self.follow_entity(enemy, player);
            }
        }
        info!(
            "Wave: {} enemies at ({:.0}, {:.0})",
            enemies.len(),
            wave.spawn.x,
            wave.spawn.y
        );
        enemies
    }

    /// Spawns every configured wave.
    pub fn start_waves(&mut self) -> Vec<Entity> {
        let waves = self.config.waves.clone();
        waves.iter().flat_map(|wave| self.start_wave(wave)).collect()
    }

    /// Sends `entity` to a fixed world point.
    pub fn set_goal(&mut self, entity: Entity, point: Vector2) {
        if let Ok(mut e) = self.world.get_entity_mut(entity) {
            e.insert(FollowTarget::point(point));
        }
    }

    /// Makes `entity` chase `target`'s live position.
    pub fn follow_entity(&mut self, entity: Entity, target: Entity) {
        if let Ok(mut e) = self.world.get_entity_mut(entity) {
            e.insert(FollowTarget::entity(target));
        }
    }

    pub fn clear_goal(&mut self, entity: Entity) {
        if let Ok(mut e) = self.world.get_entity_mut(entity) {
            e.remove::<FollowTarget>();
            if let Some(mut agent) = e.get_mut::<NavigatingAgent>() {
                agent.clear_goal();
            }
        }
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.world.resource_mut::<TickDelta>().seconds = dt;
        self.schedule.run(&mut self.world);
        self.tick += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn position(&self, entity: Entity) -> Option<Vector2> {
        self.world.get::<Transform>(entity).map(|t| t.position)
    }

    pub fn agent(&self, entity: Entity) -> Option<&NavigatingAgent> {
        self.world.get::<NavigatingAgent>(entity)
    }

    pub fn stats(&self) -> &NavStats {
        self.world.resource::<NavStats>()
    }

    pub fn debug_stats(&mut self) -> DebugStats {
        let mut stats = DebugStats {
            tick: self.tick,
            entity_count: self.world.entities().len() as usize,
            agents_idle: 0,
            agents_seeking: 0,
            agents_moving: 0,
            agents_arriving: 0,
            navmesh_faces: self.navmesh().face_count(),
            pathfinding_ms: 0.0,
            path_queries: 0,
            path_failures: 0,
            total_path_queries: 0,
            arrivals: 0,
        };
        let mut query = self.world.query::<&NavigatingAgent>();
        for agent in query.iter(&self.world) {
            match agent.status() {
                NavStatus::Idle => stats.agents_idle += 1,
                NavStatus::Seeking => stats.agents_seeking += 1,
                NavStatus::Moving => stats.agents_moving += 1,
                NavStatus::Arriving => stats.agents_arriving += 1,
            }
        }
        let nav = self.stats();
        stats.pathfinding_ms = nav.pathfinding_ms();
        stats.path_queries = nav.last_path_queries;
        stats.path_failures = nav.last_path_failures;
        stats.total_path_queries = nav.total_path_queries;
        stats.arrivals = nav.arrivals;
        stats
    }

    pub fn toggle_navmesh_overlay(&mut self) {
        self.overlay.toggle();
    }

    /// Navmesh and agent paths to draw, or `None` while the overlay is hidden.
    pub fn debug_draw(&mut self) -> Option<NavmeshDebugDraw> {
        if !self.overlay.visible {
            return None;
        }
        let mut query = self.world.query::<(&Transform, &NavigatingAgent)>();
        let agents: Vec<(Vector2, f32, &[Vector2])> = query
            .iter(&self.world)
            .map(|(t, a)| (t.position, a.size * 0.5, a.path()))
            .collect();
        let mesh = &self.world.resource::<SceneNavMesh>().mesh;
        self.overlay.capture(mesh, agents)
    }

    /// Despawns everything and returns the final counters.
    pub fn teardown(mut self) -> NavStats {
        let stats = self.stats().clone();
        self.world.clear_entities();
        info!(
            "Scene torn down after {} ticks: {} path queries, {} failed, {} arrivals",
            self.tick, stats.total_path_queries, stats.total_path_failures, stats.arrivals
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_scene() -> SceneConfig {
        SceneConfig {
            seed: Some(1),
            ..SceneConfig::default()
        }
    }

    #[test]
    fn spawn_applies_small_jitter() {
        let mut ctx = SimulationContext::new(open_scene());
        let e = ctx.spawn_agent(AgentKind::Enemy, Vector2::new(100.0, 100.0), 250.0, 10.0);
        let p = ctx.position(e).unwrap();
        assert!(p.x >= 100.0 && p.x < 100.0 + SPAWN_JITTER);
        assert!(p.y >= 100.0 && p.y < 100.0 + SPAWN_JITTER);
    }

    #[test]
    fn player_reaches_goal_and_idles() {
        let mut ctx = SimulationContext::new(open_scene());
        let player = ctx.spawn_player();
        ctx.set_goal(player, Vector2::new(1100.0, 1000.0));
        for _ in 0..600 {
            ctx.tick(1.0 / 60.0);
        }
        let pos = ctx.position(player).unwrap();
        assert!(pos.distance(Vector2::new(1100.0, 1000.0)) <= 1.0 + 1e-3);
        assert_eq!(ctx.agent(player).map(|a| a.status()), Some(NavStatus::Idle));
        assert_eq!(ctx.stats().arrivals, 1);
    }

    #[test]
    fn waves_chase_the_player() {
        let mut config = open_scene();
        config.waves = vec![WaveConfig {
            count: 3,
            spawn: Vector2::new(500.0, 500.0),
            speed: 250.0,
            size: 10.0,
        }];
        let mut ctx = SimulationContext::new(config);
        let player = ctx.spawn_player();
        let enemies = ctx.start_waves();
        assert_eq!(enemies.len(), 3);

        let before = ctx.position(enemies[0]).unwrap().distance(ctx.position(player).unwrap());
        for _ in 0..30 {
            ctx.tick(1.0 / 60.0);
        }
        let after = ctx.position(enemies[0]).unwrap().distance(ctx.position(player).unwrap());
        assert!(after < before);
    }

    #[test]
    fn debug_draw_follows_overlay_toggle() {
        let mut ctx = SimulationContext::new(open_scene());
        assert!(ctx.debug_draw().is_none());
        ctx.toggle_navmesh_overlay();
        let draw = ctx.debug_draw().unwrap();
        assert_eq!(draw.faces.len(), 1);
    }
}
