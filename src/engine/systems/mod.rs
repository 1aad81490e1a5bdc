//! Built-in systems
//!
//! Priorities (lower runs first):
//! - 10 physics
//! - 15 particles
//! - 50 collision
//! - 100 render
//! - 110 particle render

pub mod collision;
pub mod particles;
pub mod physics;
pub mod render;

pub use collision::CollisionSystem;
pub use particles::{EmitterRenderSystem, ParticleSystem};
pub use physics::PhysicsSystem;
pub use render::RenderSystem;

/// Frame rate the per-frame tuning constants were written against
pub const TARGET_FPS: f32 = 60.0;

/// Convert a step in seconds into "frames at TARGET_FPS".
pub fn time_scale(dt: f32) -> f32 {
    dt * TARGET_FPS
}
