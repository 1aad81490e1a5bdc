//! Render Backend
//!
//! The render systems never touch the GPU directly. They talk to a
//! `RenderBackend`, which mirrors the small shader contract every draw
//! goes through:
//!
//! - attribute `a_position` (local-space x,y)
//! - uniforms `u_resolution`, `u_translation`, `u_rotation`, `u_color`
//!
//! The window build uses the GL backend in `gpu`; tests use
//! `RecordingBackend`, which just writes the calls down. The backend is one
//! shared resource, only touched from inside render-system updates.

use std::cell::RefCell;
use std::rc::Rc;

use macroquad::math::Vec2;

use super::components::{DrawMode, Rgba};

/// One draw call, with the uniforms it needs.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub vertices: &'a [f32],
    pub mode: DrawMode,
    pub translation: Vec2,
    pub rotation: f32,
    pub color: Rgba,
}

pub trait RenderBackend {
    /// Drawable surface size in pixels (`u_resolution`).
    fn resolution(&self) -> Vec2;

    fn clear(&mut self, color: Rgba);

    /// Standard src-alpha / one-minus-src-alpha.
    fn enable_blending(&mut self);

    fn draw(&mut self, call: &DrawCall<'_>);
}

pub type SharedBackend = Rc<RefCell<dyn RenderBackend>>;

/// A draw call as the recording backend keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub vertices: Vec<f32>,
    pub mode: DrawMode,
    pub translation: Vec2,
    pub rotation: f32,
    pub color: Rgba,
}

impl RecordedDraw {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }
}

/// Headless backend: remembers everything it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub size: Vec2,
    pub clears: Vec<Rgba>,
    pub blending: bool,
    pub draws: Vec<RecordedDraw>,
}

impl RecordingBackend {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Self::default()
        }
    }

    pub fn shared(width: f32, height: f32) -> Rc<RefCell<RecordingBackend>> {
        Rc::new(RefCell::new(Self::new(width, height)))
    }

    pub fn reset(&mut self) {
        self.clears.clear();
        self.draws.clear();
        self.blending = false;
    }
}

impl RenderBackend for RecordingBackend {
    fn resolution(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Rgba) {
        self.clears.push(color);
    }

    fn enable_blending(&mut self) {
        self.blending = true;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            vertices: call.vertices.to_vec(),
            mode: call.mode,
            translation: call.translation,
            rotation: call.rotation,
            color: call.color,
        });
    }
}
