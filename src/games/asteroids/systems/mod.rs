//! Asteroids systems
//!
//! Priorities slot in around the engine's:
//! - 0 cleanup (message driven, removals flush on postUpdate)
//! - 1 ship control
//! - 5 respawn timer
//! - 20 projectile aging
//! - 130 wave progression

pub mod cleanup;
pub mod explosion;
pub mod projectile;
pub mod respawn;
pub mod ship_control;
pub mod wave;

pub use cleanup::CleanupSystem;
pub use explosion::ExplosionSystem;
pub use projectile::ProjectileSystem;
pub use respawn::RespawnSystem;
pub use ship_control::ShipControlSystem;
pub use wave::WaveSystem;

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Independent RNG per system, derived from the game seed.
pub fn system_rng(seed: u64, stream: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
