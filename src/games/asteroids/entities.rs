//! Entity factories
//!
//! Each function returns an `EntityBuilder`; callers spawn it through a
//! `Context` or the world so the usual `entityAdded` message goes out.

use std::f32::consts::{PI, TAU};

use macroquad::math::{vec2, Vec2};
use rand::Rng;

use crate::engine::components::{Collider, DrawMode, Physics, Render, Transform, WHITE};
use crate::engine::message::FireEvent;
use crate::engine::particles::{EmitterConfig, ParticleEmitter};
use crate::engine::registry::EntityBuilder;

use super::components::{Asteroid, AsteroidSize, Projectile, Ship};
use super::config::{AsteroidsConfig, ProjectileConfig};

/// Collision layers
pub mod layers {
    pub const SHIP: u32 = 1;
    pub const ASTEROID: u32 = 2;
    pub const PROJECTILE: u32 = 4;
}

/// Ship outline in local space, nose along +y
const SHIP_VERTICES: [f32; 6] = [0.0, 22.5, -7.5, -15.0, 7.5, -15.0];
const SHIP_RADIUS: f32 = 12.0;
const SHIP_MAX_SPEED: f32 = 10.0;
const ASTEROID_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
const ASTEROID_POINTS: usize = 8;
/// How far outside the play field new rocks appear
const SPAWN_MARGIN: f32 = 30.0;

/// Unit vector the ship's nose points along for a given rotation.
pub fn heading(rotation: f32) -> Vec2 {
    vec2(-rotation.sin(), rotation.cos())
}

/// The player's ship, centered and pointing up the screen.
pub fn ship(config: &AsteroidsConfig) -> EntityBuilder {
    ship_with(config, Ship::from_config(&config.ship))
}

/// A ship with its post-respawn grace period already running.
pub fn respawned_ship(config: &AsteroidsConfig) -> EntityBuilder {
    let mut data = Ship::from_config(&config.ship);
    data.set_invincible(config.ship.invincibility_frames);
    ship_with(config, data)
}

fn ship_with(config: &AsteroidsConfig, data: Ship) -> EntityBuilder {
    EntityBuilder::named("Player Ship")
        .with(Transform::new(config.width() / 2.0, config.height() / 2.0, PI))
        .with(Render::new(SHIP_VERTICES.to_vec(), WHITE))
        .with(Physics::new(0.98, true, 1.0, Some(SHIP_MAX_SPEED)))
        .with(Collider::circle(SHIP_RADIUS).with_layer(layers::SHIP, layers::ASTEROID))
        .with(data)
}

/// A rock entering from a random edge of the play field.
pub fn asteroid<R: Rng>(rng: &mut R, bounds: Vec2, size: AsteroidSize) -> EntityBuilder {
    let position = match rng.gen_range(0..4) {
        0 => vec2(rng.gen::<f32>() * bounds.x, -SPAWN_MARGIN),
        1 => vec2(bounds.x + SPAWN_MARGIN, rng.gen::<f32>() * bounds.y),
        2 => vec2(rng.gen::<f32>() * bounds.x, bounds.y + SPAWN_MARGIN),
        _ => vec2(-SPAWN_MARGIN, rng.gen::<f32>() * bounds.y),
    };
    rock(rng, position, size)
}

/// A piece of a broken rock, starting where its parent was.
pub fn fragment<R: Rng>(rng: &mut R, position: Vec2, size: AsteroidSize) -> EntityBuilder {
    rock(rng, position, size)
}

fn rock<R: Rng>(rng: &mut R, position: Vec2, size: AsteroidSize) -> EntityBuilder {
    let radius = size.radius();
    let speed = 0.5 + rng.gen::<f32>();
    let angle = rng.gen::<f32>() * TAU;

    let mut physics = Physics::new(1.0, true, 1.0, Some(speed));
    physics.set_velocity(vec2(angle.cos(), angle.sin()) * speed);
    physics.angular_velocity = (rng.gen::<f32>() - 0.5) * 0.02;

    // Jagged outline: evenly spaced spokes of random length
    let step = TAU / ASTEROID_POINTS as f32;
    let outline = (0..ASTEROID_POINTS)
        .flat_map(|i| {
            let spoke = radius * (0.8 + rng.gen::<f32>() * 0.4);
            let a = i as f32 * step;
            [a.cos() * spoke, a.sin() * spoke]
        })
        .collect();

    EntityBuilder::named(format!("Asteroid ({})", size.as_str()))
        .with(Transform::new(position.x, position.y, rng.gen::<f32>() * TAU))
        .with(physics)
        .with(Collider::circle(radius).with_layer(layers::ASTEROID, layers::SHIP | layers::PROJECTILE))
        .with(Render::new(outline, ASTEROID_COLOR).with_mode(DrawMode::LineLoop))
        .with(Asteroid::new(size))
}

/// A bullet leaving the ship's nose.
pub fn projectile(fire: &FireEvent, config: &ProjectileConfig) -> EntityBuilder {
    let dir = heading(fire.rotation);
    let position = fire.position + dir * config.spawn_offset;

    let mut physics = Physics::new(1.0, true, 0.1, None);
    physics.set_velocity(dir * config.speed + fire.velocity);

    EntityBuilder::named("Projectile")
        .with(Transform::new(position.x, position.y, fire.rotation))
        .with(physics)
        .with(Render::rectangle(config.size, config.size, WHITE))
        .with(
            Collider::circle(config.size)
                .with_layer(layers::PROJECTILE, layers::ASTEROID)
                .as_trigger(),
        )
        .with(Projectile::new(config.lifespan, config.damage, fire.source_entity))
}

/// A one-shot particle burst.
pub fn explosion<R: Rng>(rng: &mut R, position: Vec2) -> EntityBuilder {
    EntityBuilder::named("Explosion")
        .with(Transform::at(position))
        .with(ParticleEmitter::new(&EmitterConfig::EXPLOSION_SMALL, rng))
}
