//! Collision outcomes
//!
//! Listens to `collision.detect` and decides what a contact means:
//!
//! - bullet vs rock: both are marked, points are awarded, `projectileHit`
//! - ship vs rock: the ship is marked and `playerDie` goes out, unless the
//!   ship is still invincible
//!
//! Marked entities are removed on `postUpdate`, after every system has run,
//! so nothing disappears in the middle of a frame. Rocks announce
//! `entityDestroyed` before they go and, when splitting is on, leave
//! their fragments behind.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;
use macroquad::math::Vec2;
use rand::rngs::SmallRng;

use crate::engine::component::ComponentKind;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::{
    CollisionEvent, CollisionMessage, Context, EntityMessage, GameMessage, HitEvent, Message, MessageKind,
    PlayerMessage, ProjectileMessage,
};
use crate::engine::registry::Registry;
use crate::engine::store::SharedStore;
use crate::engine::system::System;

use crate::games::asteroids::entities;

pub struct CleanupSystem {
    store: SharedStore,
    split_asteroids: bool,
    /// Points per extra life, 0 for none
    extra_life_every: u32,
    rng: Rc<RefCell<SmallRng>>,
    /// Entities to remove at the end of the frame, in marking order
    pending: Rc<RefCell<Vec<Entity>>>,
}

impl CleanupSystem {
    pub fn new(store: SharedStore, split_asteroids: bool, extra_life_every: u32, rng: SmallRng) -> Self {
        Self {
            store,
            split_asteroids,
            extra_life_every,
            rng: Rc::new(RefCell::new(rng)),
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Entities marked for removal this frame.
    pub fn pending(&self) -> Vec<Entity> {
        self.pending.borrow().clone()
    }
}

/// Order a pair as (has `first`, has `second`), if it matches either way.
fn pair(registry: &Registry, event: &CollisionEvent, first: ComponentKind, second: ComponentKind) -> Option<(Entity, Entity)> {
    let (a, b) = (event.entity_a, event.entity_b);
    if registry.has(a, first) && registry.has(b, second) {
        Some((a, b))
    } else if registry.has(b, first) && registry.has(a, second) {
        Some((b, a))
    } else {
        None
    }
}

fn position_of(registry: &Registry, entity: Entity) -> Vec2 {
    registry.transforms.get(entity).map(|t| t.position).unwrap_or_default()
}

/// Add points, announce the new total and hand out extra lives.
fn award(ctx: &mut Context<'_>, store: &SharedStore, points: u32, extra_life_every: u32) {
    let (before, total) = {
        let mut store = store.borrow_mut();
        let before = store.score();
        (before, store.increment_score(points))
    };
    ctx.emit(Message::Game(GameMessage::ScoreChanged {
        score: total,
        delta: points,
    }));

    if extra_life_every > 0 && total / extra_life_every > before / extra_life_every {
        let lives = store.borrow_mut().add_life();
        info!("extra life at {} points ({} lives)", total, lives);
    }
}

impl System for CleanupSystem {
    fn name(&self) -> &'static str {
        "asteroidCollision"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[]
    }

    fn init(&mut self, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let pending = Rc::clone(&self.pending);
        let store = Rc::clone(&self.store);
        let extra_life_every = self.extra_life_every;
        ctx.on(MessageKind::CollisionDetect, move |envelope, ctx| {
            let Message::Collision(CollisionMessage::Detect(event)) = &envelope.message else {
                return;
            };
            let registry = &*ctx.registry;

            if let Some((projectile, asteroid)) =
                pair(registry, event, ComponentKind::Projectile, ComponentKind::Asteroid)
            {
                {
                    let mut pending = pending.borrow_mut();
                    if pending.contains(&projectile) || pending.contains(&asteroid) {
                        return;
                    }
                    pending.extend([projectile, asteroid]);
                }
                let points = registry.asteroids.get(asteroid).map_or(0, |a| a.points());
                let position = position_of(registry, asteroid);

                award(ctx, &store, points, extra_life_every);
                ctx.emit(Message::Projectile(ProjectileMessage::Hit(HitEvent {
                    position,
                    projectile,
                    asteroid,
                })));
                return;
            }

            if let Some((ship, _)) = pair(registry, event, ComponentKind::Ship, ComponentKind::Asteroid) {
                if registry.ships.get(ship).is_some_and(|s| s.invincible) {
                    return;
                }
                {
                    let mut pending = pending.borrow_mut();
                    if pending.contains(&ship) {
                        return;
                    }
                    pending.push(ship);
                }
                let position = position_of(registry, ship);
                ctx.emit_from(ship, Message::Player(PlayerMessage::Die { position }));
            }
        });

        let pending = Rc::clone(&self.pending);
        let split = self.split_asteroids;
        let rng = Rc::clone(&self.rng);
        ctx.on(MessageKind::PostUpdate, move |_, ctx| {
            let marked = std::mem::take(&mut *pending.borrow_mut());
            for entity in marked {
                if !ctx.registry.is_alive(entity) {
                    continue;
                }
                if let Some(asteroid) = ctx.registry.asteroids.get(entity).copied() {
                    let position = position_of(ctx.registry, entity);
                    ctx.emit_from(entity, Message::Entity(EntityMessage::Destroyed { entity }));

                    if split {
                        if let Ok(size) = asteroid.size.fragment_size() {
                            for _ in 0..asteroid.size.fragment_count() {
                                let builder = entities::fragment(&mut *rng.borrow_mut(), position, size);
                                let piece = ctx.spawn(builder);
                                ctx.emit_from(piece, Message::Entity(EntityMessage::Created { entity: piece }));
                            }
                        }
                    }
                }
                ctx.despawn(entity);
            }
        });
        Ok(())
    }

    fn update(&mut self, _entities: &[Entity], _dt: f32, _ctx: &mut Context<'_>) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::{Collider, Transform};
    use crate::engine::message::{MessageBus, Recorder};
    use crate::engine::registry::EntityBuilder;
    use crate::engine::store::GameStore;
    use crate::engine::systems::CollisionSystem;
    use crate::engine::world::World;
    use crate::games::asteroids::components::{Asteroid, AsteroidSize, Projectile, Ship};
    use crate::games::asteroids::systems::system_rng;
    use macroquad::math::vec2;

    struct Rig {
        world: World,
        store: SharedStore,
        seen: Recorder,
    }

    fn rig(split: bool, extra_life_every: u32) -> Rig {
        let bus = MessageBus::new();
        let seen = Recorder::new(
            &bus,
            &[
                MessageKind::ProjectileHit,
                MessageKind::ScoreChanged,
                MessageKind::PlayerDie,
                MessageKind::EntityDestroyed,
                MessageKind::EntityCreated,
            ],
        );
        let store = GameStore::shared(3);
        let mut world = World::new(bus);
        world.add_system(CollisionSystem::new()).unwrap();
        world
            .add_system(CleanupSystem::new(store.clone(), split, extra_life_every, system_rng(1, 0)))
            .unwrap();
        world.start();
        Rig { world, store, seen }
    }

    fn rock(world: &mut World, x: f32, size: AsteroidSize) -> Entity {
        world.add_entity(
            EntityBuilder::new()
                .with(Transform::new(x, 100.0, 0.0))
                .with(Collider::circle(size.radius()))
                .with(Asteroid::new(size)),
        )
    }

    fn bullet(world: &mut World, x: f32) -> Entity {
        world.add_entity(
            EntityBuilder::new()
                .with(Transform::new(x, 100.0, 0.0))
                .with(Collider::circle(3.0).as_trigger())
                .with(Projectile::new(1.5, 1, None)),
        )
    }

    fn ship(world: &mut World, x: f32, invincible: bool) -> Entity {
        let mut data = Ship::default();
        if invincible {
            data.set_invincible(60);
        }
        world.add_entity(
            EntityBuilder::new()
                .with(Transform::new(x, 100.0, 0.0))
                .with(Collider::circle(12.0))
                .with(data),
        )
    }

    #[test]
    fn test_hit_scores_and_removes_both_at_end_of_frame() {
        let mut rig = rig(false, 10_000);
        let target = rock(&mut rig.world, 100.0, AsteroidSize::Medium);
        let shot = bullet(&mut rig.world, 105.0);

        rig.world.update(1.0 / 60.0).unwrap();

        assert!(!rig.world.contains(target));
        assert!(!rig.world.contains(shot));
        assert_eq!(rig.store.borrow().score(), 50);
        assert_eq!(rig.seen.count(MessageKind::ProjectileHit), 1);
        assert_eq!(rig.seen.count(MessageKind::EntityDestroyed), 1);
        match &rig.seen.envelopes(MessageKind::ScoreChanged)[0].message {
            Message::Game(GameMessage::ScoreChanged { score, delta }) => {
                assert_eq!((*score, *delta), (50, 50));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &rig.seen.envelopes(MessageKind::ProjectileHit)[0].message {
            Message::Projectile(ProjectileMessage::Hit(hit)) => {
                assert_eq!(hit.position, vec2(100.0, 100.0));
                assert_eq!((hit.projectile, hit.asteroid), (shot, target));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_large_rock_splits_into_three() {
        let mut rig = rig(true, 10_000);
        rock(&mut rig.world, 100.0, AsteroidSize::Large);
        bullet(&mut rig.world, 110.0);

        rig.world.update(1.0 / 60.0).unwrap();

        let registry = rig.world.registry();
        let pieces: Vec<&Asteroid> = registry.asteroids.iter().map(|(_, a)| a).collect();
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|a| a.size == AsteroidSize::Medium));
        assert_eq!(rig.seen.count(MessageKind::EntityCreated), 3);
        assert_eq!(
            rig.seen.kinds().last(),
            Some(&MessageKind::EntityCreated),
            "fragments are announced after the parent"
        );
    }

    #[test]
    fn test_small_rock_leaves_nothing() {
        let mut rig = rig(true, 10_000);
        rock(&mut rig.world, 100.0, AsteroidSize::Small);
        bullet(&mut rig.world, 100.0);
        rig.world.update(1.0 / 60.0).unwrap();
        assert!(rig.world.entities().is_empty());
        assert_eq!(rig.store.borrow().score(), 100);
    }

    #[test]
    fn test_two_bullets_one_rock_scores_once() {
        let mut rig = rig(false, 10_000);
        rock(&mut rig.world, 100.0, AsteroidSize::Large);
        let first = bullet(&mut rig.world, 90.0);
        let second = bullet(&mut rig.world, 110.0);

        rig.world.update(1.0 / 60.0).unwrap();

        assert_eq!(rig.seen.count(MessageKind::ProjectileHit), 1);
        assert_eq!(rig.store.borrow().score(), 20);
        // Only one of the bullets was spent
        assert!(rig.world.contains(first) != rig.world.contains(second));
    }

    #[test]
    fn test_extra_life_when_crossing_threshold() {
        let mut rig = rig(false, 100);
        rig.store.borrow_mut().increment_score(90);
        rock(&mut rig.world, 100.0, AsteroidSize::Large);
        bullet(&mut rig.world, 100.0);

        rig.world.update(1.0 / 60.0).unwrap();

        assert_eq!(rig.store.borrow().score(), 110);
        assert_eq!(rig.store.borrow().lives(), 4);
    }

    #[test]
    fn test_ship_dies_once_per_frame() {
        let mut rig = rig(false, 10_000);
        let player = ship(&mut rig.world, 100.0, false);
        rock(&mut rig.world, 90.0, AsteroidSize::Large);
        rock(&mut rig.world, 110.0, AsteroidSize::Large);

        rig.world.update(1.0 / 60.0).unwrap();

        assert_eq!(rig.seen.count(MessageKind::PlayerDie), 1);
        let death = &rig.seen.envelopes(MessageKind::PlayerDie)[0];
        assert_eq!(death.origin_entity(), Some(player));
        assert!(!rig.world.contains(player));
        // Rocks survive a ship collision
        assert_eq!(rig.world.registry().asteroids.count(), 2);
        assert_eq!(rig.seen.count(MessageKind::EntityDestroyed), 0);
    }

    #[test]
    fn test_invincible_ship_ignores_rocks() {
        let mut rig = rig(false, 10_000);
        let player = ship(&mut rig.world, 100.0, true);
        rock(&mut rig.world, 100.0, AsteroidSize::Large);

        rig.world.update(1.0 / 60.0).unwrap();

        assert!(rig.world.contains(player));
        assert_eq!(rig.seen.count(MessageKind::PlayerDie), 0);
    }
}
