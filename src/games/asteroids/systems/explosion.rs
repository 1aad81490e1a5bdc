//! Explosions
//!
//! A particle burst wherever a rock is hit or the ship dies. The particle
//! system retires the emitter once it has faded.

use std::cell::RefCell;
use std::rc::Rc;

use macroquad::math::Vec2;
use rand::rngs::SmallRng;

use crate::engine::component::ComponentKind;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::{Context, Message, MessageKind, PlayerMessage, ProjectileMessage};
use crate::engine::system::System;

use crate::games::asteroids::entities;

pub struct ExplosionSystem {
    rng: Rc<RefCell<SmallRng>>,
}

impl ExplosionSystem {
    pub fn new(rng: SmallRng) -> Self {
        Self {
            rng: Rc::new(RefCell::new(rng)),
        }
    }
}

fn blast_site(message: &Message) -> Option<Vec2> {
    match message {
        Message::Projectile(ProjectileMessage::Hit(hit)) => Some(hit.position),
        Message::Player(PlayerMessage::Die { position }) => Some(*position),
        _ => None,
    }
}

impl System for ExplosionSystem {
    fn name(&self) -> &'static str {
        "explosionSpawn"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[]
    }

    fn init(&mut self, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        for kind in [MessageKind::ProjectileHit, MessageKind::PlayerDie] {
            let rng = Rc::clone(&self.rng);
            ctx.on(kind, move |envelope, ctx| {
                if let Some(position) = blast_site(&envelope.message) {
                    let burst = entities::explosion(&mut *rng.borrow_mut(), position);
                    ctx.spawn(burst);
                }
            });
        }
        Ok(())
    }

    fn update(&mut self, _entities: &[Entity], _dt: f32, _ctx: &mut Context<'_>) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::Transform;
    use crate::engine::message::{HitEvent, MessageBus};
    use crate::engine::particles::ParticleEmitter;
    use crate::engine::world::World;
    use crate::games::asteroids::systems::system_rng;
    use macroquad::math::vec2;

    #[test]
    fn test_bursts_at_hits_and_deaths() {
        let mut world = World::new(MessageBus::new());
        world.add_system(ExplosionSystem::new(system_rng(3, 2))).unwrap();
        let placeholder = world.registry_mut().create();

        world.emit(Message::Projectile(ProjectileMessage::Hit(HitEvent {
            position: vec2(10.0, 20.0),
            projectile: placeholder,
            asteroid: placeholder,
        })));
        world.emit(Message::Player(PlayerMessage::Die {
            position: vec2(300.0, 40.0),
        }));

        let bursts = world.entities_with(&[ComponentKind::ParticleEmitter]);
        assert_eq!(bursts.len(), 2);
        let registry = world.registry();
        let mut sites: Vec<Vec2> = bursts
            .iter()
            .map(|&e| registry.get::<Transform>(e).unwrap().position)
            .collect();
        sites.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert_eq!(sites, vec![vec2(10.0, 20.0), vec2(300.0, 40.0)]);
        assert!(registry.get::<ParticleEmitter>(bursts[0]).is_some());
    }
}
