//! Engine Components
//!
//! The generic building blocks every game gets: where an entity is
//! (`Transform`), how it moves (`Physics`), what it can touch (`Collider`)
//! and how it is drawn (`Render`). Game-specific components live with their
//! game.

use std::collections::HashSet;
use std::f32::consts::TAU;

use macroquad::math::{vec2, Vec2};

use super::component::{Component, ComponentKind, ComponentStorage};
use super::entity::Entity;
use super::registry::Registry;

/// RGBA, 0.0-1.0 per channel
pub type Rgba = [f32; 4];

pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

// =============================================================================
// Transform
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    /// Radians
    pub rotation: f32,
    pub scale: Vec2,
}

impl Transform {
    pub fn new(x: f32, y: f32, rotation: f32) -> Self {
        Self {
            position: vec2(x, y),
            rotation,
            scale: Vec2::ONE,
        }
    }

    pub fn at(position: Vec2) -> Self {
        Self::new(position.x, position.y, 0.0)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Rotate and keep the angle in [0, 2π).
    pub fn rotate(&mut self, radians: f32) {
        self.rotation = normalize_angle(self.rotation + radians);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Fold an angle into [0, 2π).
pub fn normalize_angle(radians: f32) -> f32 {
    let r = radians.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU { 0.0 } else { r }
}

impl Component for Transform {
    const KIND: ComponentKind = ComponentKind::Transform;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.transforms
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.transforms
    }
}

// =============================================================================
// Physics
// =============================================================================

/// Euler-integrated motion state.
///
/// Forces accumulate into `acceleration` and are consumed by the physics
/// step every frame. Impulses go straight into `velocity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Physics {
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Radians per frame
    pub angular_velocity: f32,
    /// Fraction of velocity kept per frame, 0.0-1.0
    pub friction: f32,
    /// Wrap position at the play-field edges
    pub wrap: bool,
    pub mass: f32,
    pub max_speed: Option<f32>,
}

impl Physics {
    pub fn new(friction: f32, wrap: bool, mass: f32, max_speed: Option<f32>) -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            angular_velocity: 0.0,
            friction: friction.clamp(0.0, 1.0),
            wrap,
            mass,
            max_speed,
        }
    }

    /// Set velocity, respecting `max_speed`.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.limit_speed();
    }

    /// Accumulate a force for this frame.
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force / self.mass;
    }

    /// Instantaneous change in velocity.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse / self.mass;
        self.limit_speed();
    }

    /// Rescale velocity so its magnitude does not exceed `max_speed`.
    pub fn limit_speed(&mut self) {
        if let Some(max) = self.max_speed {
            let speed = self.velocity.length();
            if speed > max && speed > 0.0 {
                self.velocity *= max / speed;
            }
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(0.99, true, 1.0, None)
    }
}

impl Component for Physics {
    const KIND: ComponentKind = ComponentKind::Physics;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.physics
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.physics
    }
}

// =============================================================================
// Collider
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
    /// Narrow phase treats polygons as circles of their bounding radius
    Polygon { points: Vec<Vec2> },
}

/// Collision volume plus filtering.
///
/// Two colliders interact only if each one's layer is in the other's mask.
/// Triggers report overlaps but never ask for physical resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    /// Offset from the transform position
    pub offset: Vec2,
    pub tags: HashSet<String>,
    pub layer: u32,
    pub mask: u32,
    pub active: bool,
    pub trigger: bool,
    /// Owning entity, maintained by the attach/detach hooks
    entity: Option<Entity>,
}

impl Collider {
    fn with_shape(shape: Shape) -> Self {
        Self {
            shape,
            offset: Vec2::ZERO,
            tags: HashSet::new(),
            layer: 1,
            mask: u32::MAX,
            active: true,
            trigger: false,
            entity: None,
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::with_shape(Shape::Circle { radius })
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Self::with_shape(Shape::Rect { width, height })
    }

    pub fn polygon(points: Vec<Vec2>) -> Self {
        Self::with_shape(Shape::Polygon { points })
    }

    pub fn with_layer(mut self, layer: u32, mask: u32) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// Radius for circle tests. Rects report their half diagonal and
    /// polygons their furthest vertex.
    pub fn radius(&self) -> f32 {
        match &self.shape {
            Shape::Circle { radius } => *radius,
            Shape::Rect { width, height } => vec2(*width, *height).length() / 2.0,
            Shape::Polygon { points } => points.iter().map(|p| p.length()).fold(0.0, f32::max),
        }
    }

    /// Layer/mask gate, checked in both directions.
    pub fn can_collide_with(&self, other: &Collider) -> bool {
        self.active
            && other.active
            && (self.layer & other.mask) != 0
            && (other.layer & self.mask) != 0
    }
}

impl Component for Collider {
    const KIND: ComponentKind = ComponentKind::Collider;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.colliders
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.colliders
    }

    fn on_attach(&mut self, entity: Entity) {
        self.entity = Some(entity);
    }

    fn on_detach(&mut self, _entity: Entity) {
        self.entity = None;
    }
}

// =============================================================================
// Render
// =============================================================================

/// How a vertex list is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    Lines,
    LineLoop,
    Points,
    /// Only used for particle quads
    TriangleStrip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Render {
    /// Flat x,y pairs in local space
    pub vertices: Vec<f32>,
    pub color: Rgba,
    pub visible: bool,
    /// Higher draws later (on top)
    pub z_index: i32,
    pub mode: DrawMode,
}

impl Render {
    pub fn new(vertices: Vec<f32>, color: Rgba) -> Self {
        Self {
            vertices,
            color,
            visible: true,
            z_index: 0,
            mode: DrawMode::Triangles,
        }
    }

    /// Axis-aligned rectangle centered on the origin, as two triangles.
    pub fn rectangle(width: f32, height: f32, color: Rgba) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::new(
            vec![-hw, -hh, hw, -hh, -hw, hh, -hw, hh, hw, -hh, hw, hh],
            color,
        )
    }

    pub fn triangle(a: Vec2, b: Vec2, c: Vec2, color: Rgba) -> Self {
        Self::new(vec![a.x, a.y, b.x, b.y, c.x, c.y], color)
    }

    /// Filled circle as a fan of `segments` triangles.
    pub fn circle(radius: f32, segments: usize, color: Rgba) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(segments * 6);
        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * TAU;
            let a1 = (i + 1) as f32 / segments as f32 * TAU;
            vertices.extend_from_slice(&[
                0.0,
                0.0,
                a0.cos() * radius,
                a0.sin() * radius,
                a1.cos() * radius,
                a1.sin() * radius,
            ]);
        }
        Self::new(vertices, color)
    }

    pub fn with_mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Number of vertices (x,y pairs) submitted per draw.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }
}

impl Component for Render {
    const KIND: ComponentKind = ComponentKind::Render;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.renders
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.renders
    }
}
