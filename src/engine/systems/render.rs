//! Render System
//!
//! Painter's algorithm over visible entities: optional clear, alpha
//! blending on, stable sort by z-index, then one draw call per entity with
//! its own translation, rotation and color.

use crate::engine::component::ComponentKind;
use crate::engine::components::{Render, Rgba, Transform};
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::Context;
use crate::engine::render::{DrawCall, SharedBackend};
use crate::engine::system::System;

pub struct RenderSystem {
    backend: SharedBackend,
    clear_screen: bool,
    background: Rgba,
}

impl RenderSystem {
    pub fn new(backend: SharedBackend, clear_screen: bool, background: Rgba) -> Self {
        Self {
            backend,
            clear_screen,
            background,
        }
    }
}

/// Refuse to run against a surface with nothing to draw on.
pub(crate) fn check_surface(backend: &SharedBackend) -> Result<(), EngineError> {
    let size = backend.borrow().resolution();
    if size.x <= 0.0 || size.y <= 0.0 {
        log::error!("render surface is {}x{}", size.x, size.y);
        return Err(EngineError::MissingRenderContext {
            width: size.x,
            height: size.y,
        });
    }
    Ok(())
}

impl System for RenderSystem {
    fn name(&self) -> &'static str {
        "render"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Render]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn draws(&self) -> bool {
        true
    }

    fn init(&mut self, _ctx: &mut Context<'_>) -> Result<(), EngineError> {
        check_surface(&self.backend)
    }

    fn update(&mut self, entities: &[Entity], _dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let mut backend = self.backend.borrow_mut();
        if self.clear_screen {
            backend.clear(self.background);
        }
        backend.enable_blending();

        let registry = &*ctx.registry;
        let mut visible: Vec<(&Transform, &Render)> = entities
            .iter()
            .filter_map(|&entity| {
                let render = registry.renders.get(entity)?;
                let transform = registry.transforms.get(entity)?;
                render.visible.then_some((transform, render))
            })
            .collect();
        // Stable, so equal z keeps entity order
        visible.sort_by_key(|(_, render)| render.z_index);

        for (transform, render) in visible {
            backend.draw(&DrawCall {
                vertices: &render.vertices,
                mode: render.mode,
                translation: transform.position,
                rotation: transform.rotation,
                color: render.color,
            });
        }
        Ok(())
    }
}
