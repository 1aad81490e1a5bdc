//! Collision System
//!
//! Brute-force narrow phase: every active collider is tested against every
//! other one (n² pairs, fine for a few dozen bodies). Pairs are gated on
//! layer/mask first, then dispatched on shape:
//!
//! - circle vs circle: center distance < sum of radii
//! - rect vs rect: axis-aligned overlap, edges touching counts
//! - circle vs rect: clamped closest-point distance
//! - polygons: rough circle test on the bounding radius (at least 10); a
//!   rect paired with a polygon counts as radius 10
//!
//! Each hit publishes `collision.detect`. Pairs where neither side is a
//! trigger also publish `collision.resolve`.

use macroquad::math::Vec2;

use crate::engine::component::ComponentKind;
use crate::engine::components::{Collider, Shape};
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::{CollisionEvent, CollisionMessage, Context, Message};
use crate::engine::system::System;

/// Smallest radius a polygon is approximated with
pub const POLYGON_MIN_RADIUS: f32 = 10.0;

/// A collider placed in the world: transform position plus offset.
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub collider: &'a Collider,
    pub center: Vec2,
}

impl<'a> Placed<'a> {
    pub fn new(collider: &'a Collider, position: Vec2) -> Self {
        Self {
            collider,
            center: position + collider.offset,
        }
    }
}

fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

fn rects_overlap(a: Vec2, a_size: Vec2, b: Vec2, b_size: Vec2) -> bool {
    let (ha, hb) = (a_size / 2.0, b_size / 2.0);
    let (left_a, right_a, top_a, bottom_a) = (a.x - ha.x, a.x + ha.x, a.y - ha.y, a.y + ha.y);
    let (left_b, right_b, top_b, bottom_b) = (b.x - hb.x, b.x + hb.x, b.y - hb.y, b.y + hb.y);
    !(right_a < left_b || left_a > right_b || bottom_a < top_b || top_a > bottom_b)
}

fn circle_rect_overlap(circle: Vec2, radius: f32, rect: Vec2, size: Vec2) -> bool {
    let half = size / 2.0;
    let dx = (circle.x - rect.x).abs();
    let dy = (circle.y - rect.y).abs();

    if dx > half.x + radius || dy > half.y + radius {
        return false;
    }
    if dx <= half.x || dy <= half.y {
        return true;
    }

    let corner = Vec2::new(dx - half.x, dy - half.y);
    corner.length_squared() <= radius * radius
}

/// Geometric overlap test, ignoring layers and activity.
pub fn shapes_overlap(a: Placed<'_>, b: Placed<'_>) -> bool {
    match (&a.collider.shape, &b.collider.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circles_overlap(a.center, *ra, b.center, *rb)
        }
        (Shape::Rect { width: wa, height: ha }, Shape::Rect { width: wb, height: hb }) => {
            rects_overlap(a.center, Vec2::new(*wa, *ha), b.center, Vec2::new(*wb, *hb))
        }
        (Shape::Circle { radius }, Shape::Rect { width, height }) => {
            circle_rect_overlap(a.center, *radius, b.center, Vec2::new(*width, *height))
        }
        (Shape::Rect { width, height }, Shape::Circle { radius }) => {
            circle_rect_overlap(b.center, *radius, a.center, Vec2::new(*width, *height))
        }
        _ => circles_overlap(a.center, fallback_radius(a.collider), b.center, fallback_radius(b.collider)),
    }
}

/// Radius a shape brings into the polygon fallback. Rects have no radius of
/// their own there and take the floor.
fn fallback_radius(collider: &Collider) -> f32 {
    match collider.shape {
        Shape::Rect { .. } => POLYGON_MIN_RADIUS,
        _ => collider.radius().max(POLYGON_MIN_RADIUS),
    }
}

/// Full test: layer/mask gate, then geometry.
pub fn check_collision(a: Placed<'_>, b: Placed<'_>) -> bool {
    a.collider.can_collide_with(b.collider) && shapes_overlap(a, b)
}

pub struct CollisionSystem;

impl CollisionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Collider]
    }

    fn priority(&self) -> i32 {
        50
    }

    fn update(&mut self, entities: &[Entity], _dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let registry = &*ctx.registry;
        let bodies: Vec<(Entity, Placed<'_>)> = entities
            .iter()
            .filter_map(|&entity| {
                let transform = registry.transforms.get(entity)?;
                let collider = registry.colliders.get(entity)?;
                collider
                    .active
                    .then(|| (entity, Placed::new(collider, transform.position)))
            })
            .collect();

        let mut hits = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (entity_a, a) = bodies[i];
                let (entity_b, b) = bodies[j];
                if check_collision(a, b) {
                    hits.push(CollisionEvent {
                        entity_a,
                        entity_b,
                        collider_a: a.collider.clone(),
                        collider_b: b.collider.clone(),
                    });
                }
            }
        }

        for hit in hits {
            let resolve = !hit.collider_a.trigger && !hit.collider_b.trigger;
            if resolve {
                ctx.emit(Message::Collision(CollisionMessage::Detect(hit.clone())));
                ctx.emit(Message::Collision(CollisionMessage::Resolve(hit)));
            } else {
                ctx.emit(Message::Collision(CollisionMessage::Detect(hit)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::Transform;
    use crate::engine::message::{MessageBus, MessageKind, Recorder};
    use crate::engine::registry::EntityBuilder;
    use crate::engine::world::World;
    use macroquad::math::vec2;

    fn at(collider: &Collider, x: f32, y: f32) -> Placed<'_> {
        Placed::new(collider, vec2(x, y))
    }

    fn world_with_collision() -> (World, MessageBus) {
        let bus = MessageBus::new();
        let mut world = World::new(bus.clone());
        world.add_system(CollisionSystem::new()).unwrap();
        world.start();
        (world, bus)
    }

    fn body(x: f32, y: f32, collider: Collider) -> EntityBuilder {
        EntityBuilder::new()
            .with(Transform::new(x, y, 0.0))
            .with(collider)
    }

    #[test]
    fn test_circle_circle() {
        let a = Collider::circle(10.0);
        let b = Collider::circle(5.0);
        assert!(check_collision(at(&a, 0.0, 0.0), at(&b, 14.9, 0.0)));
        // Touching is not overlapping for circles
        assert!(!check_collision(at(&a, 0.0, 0.0), at(&b, 15.0, 0.0)));
    }

    #[test]
    fn test_rect_rect_counts_touching_edges() {
        let a = Collider::rect(10.0, 10.0);
        let b = Collider::rect(4.0, 4.0);
        assert!(check_collision(at(&a, 0.0, 0.0), at(&b, 7.0, 0.0)));
        assert!(!check_collision(at(&a, 0.0, 0.0), at(&b, 7.1, 0.0)));
        assert!(!check_collision(at(&a, 0.0, 0.0), at(&b, 0.0, -7.5)));
    }

    #[test]
    fn test_circle_rect_corner_region() {
        let circle = Collider::circle(2.0);
        let rect = Collider::rect(10.0, 10.0);
        // Beside an edge
        assert!(check_collision(at(&circle, 6.5, 0.0), at(&rect, 0.0, 0.0)));
        // Diagonal to the corner (5,5): distance sqrt(2) < 2
        assert!(check_collision(at(&circle, 6.0, 6.0), at(&rect, 0.0, 0.0)));
        // Inside both axis bands but outside the rounded corner
        assert!(!check_collision(at(&circle, 6.8, 6.8), at(&rect, 0.0, 0.0)));
    }

    #[test]
    fn test_collision_is_symmetric() {
        let shapes = [
            Collider::circle(6.0),
            Collider::rect(8.0, 4.0),
            Collider::circle(1.5),
            Collider::rect(3.0, 12.0),
        ];
        let offsets = [
            vec2(0.0, 0.0),
            vec2(5.0, 0.0),
            vec2(7.0, 3.0),
            vec2(-4.0, 6.5),
            vec2(9.9, -9.9),
            vec2(12.0, 0.0),
        ];
        for a in &shapes {
            for b in &shapes {
                for d in offsets {
                    let pa = at(a, 0.0, 0.0);
                    let pb = Placed::new(b, d);
                    assert_eq!(check_collision(pa, pb), check_collision(pb, pa), "{:?} {:?} {:?}", a.shape, b.shape, d);
                }
            }
        }
    }

    #[test]
    fn test_offset_moves_collider() {
        let a = Collider::circle(2.0).with_offset(vec2(20.0, 0.0));
        let b = Collider::circle(2.0);
        assert!(check_collision(at(&a, 0.0, 0.0), at(&b, 21.0, 0.0)));
        assert!(!check_collision(at(&a, 0.0, 0.0), at(&b, 0.0, 0.0)));
    }

    #[test]
    fn test_polygon_falls_back_to_floor_radius() {
        let tiny = Collider::polygon(vec![vec2(0.0, 1.0), vec2(1.0, -1.0), vec2(-1.0, -1.0)]);
        let point = Collider::circle(0.5);
        // Both sides floor to radius 10
        assert!(check_collision(at(&tiny, 0.0, 0.0), at(&point, 19.9, 0.0)));
        assert!(!check_collision(at(&tiny, 0.0, 0.0), at(&point, 20.0, 0.0)));
    }

    #[test]
    fn test_rect_against_polygon_uses_floor_not_half_diagonal() {
        let wide = Collider::rect(40.0, 40.0);
        let tiny = Collider::polygon(vec![vec2(0.0, 1.0), vec2(1.0, -1.0), vec2(-1.0, -1.0)]);
        // Half diagonal would be ~28.3, the floor pair reaches 20
        assert!(check_collision(at(&wide, 0.0, 0.0), at(&tiny, 19.0, 0.0)));
        assert!(!check_collision(at(&wide, 0.0, 0.0), at(&tiny, 25.0, 0.0)));
        assert!(!check_collision(at(&tiny, 25.0, 0.0), at(&wide, 0.0, 0.0)));
    }

    #[test]
    fn test_layer_mask_blocks_overlap() {
        let a = Collider::circle(10.0).with_layer(0b01, 0b01);
        let b = Collider::circle(10.0).with_layer(0b10, 0b01);
        assert!(shapes_overlap(at(&a, 0.0, 0.0), at(&b, 1.0, 0.0)));
        assert!(!check_collision(at(&a, 0.0, 0.0), at(&b, 1.0, 0.0)));
    }

    #[test]
    fn test_overlap_emits_detect_and_resolve() {
        let (mut world, bus) = world_with_collision();
        let recorder = Recorder::new(&bus, &[MessageKind::CollisionDetect, MessageKind::CollisionResolve]);
        let ship = world.add_entity(body(400.0, 300.0, Collider::circle(12.0)));
        let asteroid = world.add_entity(body(405.0, 300.0, Collider::circle(20.0)));

        world.update(1.0 / 60.0).unwrap();

        assert_eq!(recorder.count(MessageKind::CollisionDetect), 1);
        assert_eq!(recorder.count(MessageKind::CollisionResolve), 1);
        for envelope in recorder.envelopes(MessageKind::CollisionResolve) {
            match envelope.message {
                Message::Collision(CollisionMessage::Resolve(event)) => {
                    assert!(event.involves(ship) && event.involves(asteroid));
                    assert_eq!(event.collider_a.entity(), Some(event.entity_a));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_trigger_pairs_never_resolve() {
        let combos = [
            (Collider::circle(5.0).as_trigger(), Collider::circle(5.0)),
            (Collider::rect(5.0, 5.0), Collider::rect(5.0, 5.0).as_trigger()),
            (Collider::circle(5.0).as_trigger(), Collider::rect(5.0, 5.0).as_trigger()),
            (Collider::rect(5.0, 5.0).as_trigger(), Collider::circle(5.0)),
        ];
        for (a, b) in combos {
            let (mut world, bus) = world_with_collision();
            let recorder = Recorder::new(&bus, &[MessageKind::CollisionDetect, MessageKind::CollisionResolve]);
            world.add_entity(body(100.0, 100.0, a));
            world.add_entity(body(101.0, 100.0, b));

            world.update(1.0 / 60.0).unwrap();

            assert_eq!(recorder.count(MessageKind::CollisionDetect), 1);
            assert_eq!(recorder.count(MessageKind::CollisionResolve), 0);
        }
    }

    #[test]
    fn test_inactive_and_masked_pairs_are_silent() {
        let (mut world, bus) = world_with_collision();
        let recorder = Recorder::new(&bus, &[MessageKind::CollisionDetect]);
        let mut inactive = Collider::circle(10.0);
        inactive.active = false;
        world.add_entity(body(0.0, 0.0, inactive));
        world.add_entity(body(1.0, 0.0, Collider::circle(10.0).with_layer(2, 2)));
        world.add_entity(body(2.0, 0.0, Collider::circle(10.0).with_layer(1, 1)));

        world.update(1.0 / 60.0).unwrap();

        assert_eq!(recorder.count(MessageKind::CollisionDetect), 0);
    }
}
