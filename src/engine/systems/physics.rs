//! Physics integration
//!
//! Semi-implicit Euler on frame-scaled time: all tuning values (friction,
//! thrust, max speed) are "per frame at 60 fps", and `dt` is converted to a
//! frame count before use. Friction is applied as `friction^frames`, so one
//! long step damps exactly as much as several short ones.

use macroquad::math::Vec2;

use super::time_scale;
use crate::engine::component::ComponentKind;
use crate::engine::components::{normalize_angle, Physics, Transform};
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::Context;
use crate::engine::system::System;

/// Velocity components below this snap to zero
pub const REST_THRESHOLD: f32 = 1e-3;

pub struct PhysicsSystem {
    /// Play-field size used for wrap-around
    bounds: Vec2,
}

impl PhysicsSystem {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Vec2::new(width, height),
        }
    }
}

/// Wrap a coordinate into [0, max).
pub fn wrap_coordinate(value: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return value;
    }
    let wrapped = value.rem_euclid(max);
    if wrapped >= max { 0.0 } else { wrapped }
}

/// Advance one body by `dt` seconds.
pub fn integrate(transform: &mut Transform, physics: &mut Physics, dt: f32, bounds: Vec2) {
    let frames = time_scale(dt);

    physics.velocity += physics.acceleration * frames;
    physics.velocity *= physics.friction.powf(frames);
    physics.limit_speed();

    if physics.velocity.x.abs() < REST_THRESHOLD {
        physics.velocity.x = 0.0;
    }
    if physics.velocity.y.abs() < REST_THRESHOLD {
        physics.velocity.y = 0.0;
    }

    transform.position += physics.velocity * frames;
    transform.rotation = normalize_angle(transform.rotation + physics.angular_velocity * frames);

    if physics.wrap {
        transform.position.x = wrap_coordinate(transform.position.x, bounds.x);
        transform.position.y = wrap_coordinate(transform.position.y, bounds.y);
    }

    // Forces only last one frame
    physics.acceleration = Vec2::ZERO;
}

impl System for PhysicsSystem {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Physics]
    }

    fn priority(&self) -> i32 {
        10
    }

    fn update(&mut self, entities: &[Entity], dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let registry = &mut *ctx.registry;
        for &entity in entities {
            if let (Some(transform), Some(physics)) =
                (registry.transforms.get_mut(entity), registry.physics.get_mut(entity))
            {
                integrate(transform, physics, dt, self.bounds);
            }
        }
        Ok(())
    }
}
