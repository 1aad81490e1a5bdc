//! Particle simulation and drawing
//!
//! `ParticleSystem` ages every emitter and removes spent ones.
//! `EmitterRenderSystem` draws each live particle as a small quad faded by
//! its remaining life; it runs after the main render pass so bursts sit on
//! top of the ships and rocks.

use crate::engine::component::ComponentKind;
use crate::engine::components::DrawMode;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::Context;
use crate::engine::render::{DrawCall, SharedBackend};
use crate::engine::system::System;

use super::render::check_surface;

/// Unit quad as a triangle strip, scaled per particle
const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

#[derive(Default)]
pub struct ParticleSystem;

impl ParticleSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for ParticleSystem {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::ParticleEmitter]
    }

    fn priority(&self) -> i32 {
        15
    }

    fn update(&mut self, entities: &[Entity], dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let mut spent = Vec::new();
        for &entity in entities {
            if let Some(emitter) = ctx.registry.emitters.get_mut(entity) {
                emitter.step(dt);
                if emitter.is_finished() {
                    spent.push(entity);
                }
            }
        }
        for entity in spent {
            ctx.despawn(entity);
        }
        Ok(())
    }
}

pub struct EmitterRenderSystem {
    backend: SharedBackend,
}

impl EmitterRenderSystem {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }
}

impl System for EmitterRenderSystem {
    fn name(&self) -> &'static str {
        "emitterRender"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::ParticleEmitter]
    }

    fn priority(&self) -> i32 {
        110
    }

    fn draws(&self) -> bool {
        true
    }

    fn init(&mut self, _ctx: &mut Context<'_>) -> Result<(), EngineError> {
        check_surface(&self.backend)
    }

    fn update(&mut self, entities: &[Entity], _dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let mut backend = self.backend.borrow_mut();
        let registry = &*ctx.registry;
        for &entity in entities {
            let (Some(transform), Some(emitter)) =
                (registry.transforms.get(entity), registry.emitters.get(entity))
            else {
                continue;
            };
            for particle in &emitter.particles {
                let vertices = QUAD.map(|v| v * particle.size);
                backend.draw(&DrawCall {
                    vertices: &vertices,
                    mode: DrawMode::TriangleStrip,
                    translation: transform.position + particle.offset,
                    rotation: 0.0,
                    color: [1.0, 1.0, 1.0, particle.alpha()],
                });
            }
        }
        Ok(())
    }
}
