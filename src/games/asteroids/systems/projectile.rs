//! Projectiles
//!
//! Turns `playerFire` into bullets and retires them when their lifetime
//! runs out.

use log::debug;

use crate::engine::component::ComponentKind;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::{Context, Message, MessageKind, PlayerMessage, ProjectileMessage};
use crate::engine::system::System;

use crate::games::asteroids::config::ProjectileConfig;
use crate::games::asteroids::entities;

pub struct ProjectileSystem {
    config: ProjectileConfig,
}

impl ProjectileSystem {
    pub fn new(config: ProjectileConfig) -> Self {
        Self { config }
    }
}

impl System for ProjectileSystem {
    fn name(&self) -> &'static str {
        "projectile"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Physics, ComponentKind::Projectile]
    }

    fn priority(&self) -> i32 {
        20
    }

    fn init(&mut self, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let config = self.config.clone();
        ctx.on(MessageKind::PlayerFire, move |envelope, ctx| {
            let Message::Player(PlayerMessage::Fire(fire)) = &envelope.message else {
                return;
            };
            let projectile = ctx.spawn(entities::projectile(fire, &config));
            ctx.emit(Message::Projectile(ProjectileMessage::Fire {
                projectile,
                owner: fire.source_entity,
            }));
        });
        Ok(())
    }

    fn update(&mut self, entities: &[Entity], dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let expired: Vec<Entity> = entities
            .iter()
            .copied()
            .filter(|&entity| {
                ctx.registry
                    .projectiles
                    .get_mut(entity)
                    .is_some_and(|projectile| projectile.age(dt))
            })
            .collect();

        for projectile in expired {
            debug!("projectile {} expired", projectile);
            ctx.emit_from(projectile, Message::Projectile(ProjectileMessage::Expire { projectile }));
            ctx.despawn(projectile);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::{Collider, Physics, Render, Transform};
    use crate::engine::message::{FireEvent, MessageBus, Recorder};
    use crate::engine::world::World;
    use crate::games::asteroids::components::Projectile;
    use macroquad::math::{vec2, Vec2};

    fn fire_at(world: &mut World, position: Vec2, rotation: f32) {
        world.emit(Message::Player(PlayerMessage::Fire(FireEvent {
            position,
            rotation,
            velocity: Vec2::ZERO,
            source_entity: None,
        })));
    }

    #[test]
    fn test_fire_spawns_one_complete_projectile() {
        let bus = MessageBus::new();
        let announced = Recorder::new(&bus, &[MessageKind::ProjectileFire]);
        let mut world = World::new(bus);
        world.add_system(ProjectileSystem::new(ProjectileConfig::default())).unwrap();

        fire_at(&mut world, vec2(100.0, 100.0), 0.0);

        let all = world.entities();
        assert_eq!(all.len(), 1);
        let bullet = all[0];
        let registry = world.registry();
        assert!(registry.get::<Transform>(bullet).is_some());
        assert!(registry.get::<Render>(bullet).is_some());
        assert!(registry.get::<Projectile>(bullet).is_some());
        assert!(registry.get::<Collider>(bullet).unwrap().trigger);
        let speed = registry.get::<Physics>(bullet).unwrap().speed();
        assert!((speed - 7.0).abs() < 1e-4);
        // Spawned just ahead of the nose
        assert!((registry.get::<Transform>(bullet).unwrap().position - vec2(100.0, 120.0)).length() < 1e-4);

        assert_eq!(announced.count(MessageKind::ProjectileFire), 1);
    }

    #[test]
    fn test_projectile_expires_after_lifespan() {
        let bus = MessageBus::new();
        let expired = Recorder::new(&bus, &[MessageKind::ProjectileExpire, MessageKind::EntityRemoved]);
        let mut world = World::new(bus);
        world.add_system(ProjectileSystem::new(ProjectileConfig::default())).unwrap();
        fire_at(&mut world, vec2(100.0, 100.0), 0.0);
        world.start();

        world.update(1.0).unwrap();
        assert_eq!(world.entities().len(), 1);
        world.update(0.5).unwrap();

        assert!(world.entities().is_empty());
        assert_eq!(
            expired.kinds(),
            vec![MessageKind::ProjectileExpire, MessageKind::EntityRemoved]
        );
    }
}
