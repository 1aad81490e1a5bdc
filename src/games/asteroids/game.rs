//! Asteroids
//!
//! Wires the engine systems and the game's own systems into one pipeline.
//! In priority order a frame runs:
//!
//! | priority | system |
//! |---------:|--------|
//! | 0 | explosionSpawn (message driven) |
//! | 0 | asteroidCollision (flushes on postUpdate) |
//! | 1 | shipControl |
//! | 5 | playerRespawn |
//! | 10 | physics |
//! | 15 | particles |
//! | 20 | projectile |
//! | 50 | collision |
//! | 100 | render |
//! | 110 | emitterRender |
//! | 130 | wave |

use std::rc::Rc;

use macroquad::math::vec2;

use crate::engine::error::EngineError;
use crate::engine::game::GameDefinition;
use crate::engine::input::InputState;
use crate::engine::render::SharedBackend;
use crate::engine::store::SharedStore;
use crate::engine::systems::{CollisionSystem, EmitterRenderSystem, ParticleSystem, PhysicsSystem, RenderSystem};
use crate::engine::world::World;

use super::config::AsteroidsConfig;
use super::entities;
use super::systems::{
    system_rng, CleanupSystem, ExplosionSystem, ProjectileSystem, RespawnSystem, ShipControlSystem, WaveSystem,
};

// RNG streams, one per consumer
const STREAM_EXPLOSION: u64 = 1;
const STREAM_CLEANUP: u64 = 2;
const STREAM_WAVE: u64 = 3;

pub struct AsteroidsGame {
    config: AsteroidsConfig,
    store: SharedStore,
    backend: SharedBackend,
    seed: u64,
    /// Bumped on every restart so each run gets fresh rocks
    run: u64,
}

impl AsteroidsGame {
    pub fn new(config: AsteroidsConfig, store: SharedStore, backend: SharedBackend, seed: u64) -> Self {
        Self {
            config,
            store,
            backend,
            seed,
            run: 0,
        }
    }

    pub fn config(&self) -> &AsteroidsConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn run_seed(&self) -> u64 {
        self.seed.wrapping_add(self.run)
    }
}

impl GameDefinition for AsteroidsGame {
    fn name(&self) -> &str {
        "Asteroids"
    }

    fn description(&self) -> &str {
        "Arcade-style, multidirectional space shooter"
    }

    fn create_systems(&mut self, world: &mut World, input: &InputState) -> Result<(), EngineError> {
        let config = &self.config;
        let seed = self.run_seed();
        self.store.borrow_mut().set_lives(config.ship.lives);

        world.add_system(PhysicsSystem::new(config.width(), config.height()))?;
        world.add_system(ParticleSystem::new())?;
        world.add_system(ExplosionSystem::new(system_rng(seed, STREAM_EXPLOSION)))?;
        world.add_system(EmitterRenderSystem::new(Rc::clone(&self.backend)))?;
        world.add_system(RenderSystem::new(Rc::clone(&self.backend), true, config.background))?;
        world.add_system(ShipControlSystem::new(input.clone()))?;
        world.add_system(ProjectileSystem::new(config.projectile.clone()))?;
        world.add_system(CollisionSystem::new())?;
        world.add_system(CleanupSystem::new(
            Rc::clone(&self.store),
            config.waves.split_asteroids,
            config.scoring.extra_life_every,
            system_rng(seed, STREAM_CLEANUP),
        ))?;
        world.add_system(WaveSystem::new(
            config.waves.clone(),
            vec2(config.width(), config.height()),
            Rc::clone(&self.store),
            system_rng(seed, STREAM_WAVE),
        ))?;
        world.add_system(RespawnSystem::new(config.clone(), Rc::clone(&self.store)))?;
        Ok(())
    }

    fn create_entities(&mut self, world: &mut World) -> Result<(), EngineError> {
        world.add_entity(entities::ship(&self.config));
        Ok(())
    }

    fn reset(&mut self) {
        self.run = self.run.wrapping_add(1);
        self.store.borrow_mut().reset(self.config.ship.lives);
    }
}
