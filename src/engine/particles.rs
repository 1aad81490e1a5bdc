//! Particle Emitters
//!
//! Burst emitters: every particle is generated up front when the emitter
//! is built, flies outward from the emitter's transform and fades out over
//! its life. Once the emitter's duration has passed and the last particle
//! has died, the particle system removes the whole entity.

use std::f32::consts::TAU;

use macroquad::math::{vec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::component::{Component, ComponentKind, ComponentStorage};
use super::registry::Registry;

/// Per-frame velocity damping applied to every particle
pub const PARTICLE_DRAG: f32 = 0.95;

/// A single particle, positioned relative to its emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub offset: Vec2,
    /// Units per frame
    pub velocity: Vec2,
    pub size: f32,
    /// Seconds lived so far
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    /// 1.0 when fresh, 0.0 when expired.
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (1.0 - self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// Definition of a burst (design-time data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Particles per burst
    pub count: usize,
    /// Initial speed range, units per frame
    pub speed: (f32, f32),
    pub size: (f32, f32),
    /// Seconds
    pub duration: f32,
}

/// Common burst presets
impl EmitterConfig {
    /// Asteroid break-up / ship death
    pub const EXPLOSION_SMALL: EmitterConfig = EmitterConfig {
        count: 80,
        speed: (1.0, 3.0),
        size: (1.0, 2.0),
        duration: 1.0,
    };
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self::EXPLOSION_SMALL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEmitter {
    pub particles: Vec<Particle>,
    /// Seconds since the burst
    pub elapsed: f32,
    pub duration: f32,
}

impl ParticleEmitter {
    /// Roll every particle: random direction, speed and size within the
    /// config's ranges.
    pub fn new<R: Rng>(config: &EmitterConfig, rng: &mut R) -> Self {
        let particles = (0..config.count)
            .map(|_| {
                let angle = rng.gen::<f32>() * TAU;
                let speed = lerp(config.speed.0, config.speed.1, rng.gen::<f32>());
                let size = lerp(config.size.0, config.size.1, rng.gen::<f32>());
                Particle {
                    offset: Vec2::ZERO,
                    velocity: vec2(angle.cos(), angle.sin()) * speed,
                    size,
                    life: 0.0,
                    max_life: config.duration,
                }
            })
            .collect();

        Self {
            particles,
            elapsed: 0.0,
            duration: config.duration,
        }
    }

    /// Advance one frame and drop dead particles.
    pub fn step(&mut self, dt: f32) {
        self.elapsed += dt;
        for p in &mut self.particles {
            p.offset += p.velocity;
            p.velocity *= PARTICLE_DRAG;
            p.life += dt;
        }
        self.particles.retain(|p| p.life < p.max_life);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration && self.particles.is_empty()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl Component for ParticleEmitter {
    const KIND: ComponentKind = ComponentKind::ParticleEmitter;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.emitters
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.emitters
    }
}
