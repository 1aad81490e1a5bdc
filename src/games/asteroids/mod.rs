//! Asteroids on the ECS engine
//!
//! - `components`: ship, asteroid tiers, bullets
//! - `entities`: builders for everything the game spawns
//! - `systems`: the game's own systems
//! - `config`: tunables, loadable from RON

pub mod components;
pub mod config;
pub mod entities;
pub mod game;
pub mod systems;

pub use components::{Asteroid, AsteroidSize, Projectile, Ship};
pub use config::{AsteroidsConfig, CONFIG_PATH, DEFAULT_CANVAS};
pub use game::AsteroidsGame;
