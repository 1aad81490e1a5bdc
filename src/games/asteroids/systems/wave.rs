//! Waves
//!
//! Keeps count of the rocks still in play. Destroyed rocks count down,
//! fragments count up, and once nothing is left the next (bigger) wave
//! comes in from the edges. There is no cap on wave size.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;
use macroquad::math::Vec2;
use rand::rngs::SmallRng;

use crate::engine::component::ComponentKind;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::{Context, EntityMessage, GameMessage, Message, MessageKind};
use crate::engine::store::SharedStore;
use crate::engine::system::System;

use crate::games::asteroids::components::AsteroidSize;
use crate::games::asteroids::config::WaveConfig;
use crate::games::asteroids::entities;

#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    wave: u32,
    remaining: u32,
}

pub struct WaveSystem {
    config: WaveConfig,
    bounds: Vec2,
    store: SharedStore,
    rng: SmallRng,
    progress: Rc<RefCell<Progress>>,
}

impl WaveSystem {
    pub fn new(config: WaveConfig, bounds: Vec2, store: SharedStore, rng: SmallRng) -> Self {
        Self {
            config,
            bounds,
            store,
            rng,
            progress: Rc::new(RefCell::new(Progress::default())),
        }
    }

    pub fn wave(&self) -> u32 {
        self.progress.borrow().wave
    }

    /// Rocks left before the next wave.
    pub fn remaining(&self) -> u32 {
        self.progress.borrow().remaining
    }

    fn start_wave(&mut self, ctx: &mut Context<'_>) {
        let (wave, count) = {
            let mut progress = self.progress.borrow_mut();
            progress.wave += 1;
            progress.remaining = self.config.asteroids_for(progress.wave);
            (progress.wave, progress.remaining)
        };

        for _ in 0..count {
            ctx.spawn(entities::asteroid(&mut self.rng, self.bounds, AsteroidSize::Large));
        }
        self.store.borrow_mut().set_wave(wave);

        info!("wave {} started with {} asteroids", wave, count);
        ctx.emit(Message::Game(GameMessage::LevelChanged { wave, asteroids: count }));
    }
}

impl System for WaveSystem {
    fn name(&self) -> &'static str {
        "wave"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[]
    }

    fn priority(&self) -> i32 {
        130
    }

    fn init(&mut self, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let progress = Rc::clone(&self.progress);
        ctx.on(MessageKind::EntityDestroyed, move |envelope, ctx| {
            let Message::Entity(EntityMessage::Destroyed { entity }) = &envelope.message else {
                return;
            };
            if ctx.registry.has(*entity, ComponentKind::Asteroid) {
                let mut progress = progress.borrow_mut();
                progress.remaining = progress.remaining.saturating_sub(1);
            }
        });

        let progress = Rc::clone(&self.progress);
        ctx.on(MessageKind::EntityCreated, move |envelope, ctx| {
            let Message::Entity(EntityMessage::Created { entity }) = &envelope.message else {
                return;
            };
            if ctx.registry.has(*entity, ComponentKind::Asteroid) {
                progress.borrow_mut().remaining += 1;
            }
        });

        self.start_wave(ctx);
        Ok(())
    }

    fn update(&mut self, _entities: &[Entity], _dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        if self.remaining() == 0 {
            self.start_wave(ctx);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::message::{MessageBus, Recorder};
    use crate::engine::store::GameStore;
    use crate::engine::world::World;
    use crate::games::asteroids::systems::system_rng;
    use macroquad::math::vec2;

    fn rocks(world: &World) -> Vec<Entity> {
        world.entities_with(&[ComponentKind::Asteroid])
    }

    fn destroy(world: &mut World, entity: Entity) {
        world.emit(Message::Entity(EntityMessage::Destroyed { entity }));
        world.remove_entity(entity);
    }

    #[test]
    fn test_waves_escalate_once_cleared() {
        let bus = MessageBus::new();
        let levels = Recorder::new(&bus, &[MessageKind::LevelChanged]);
        let store = GameStore::shared(3);
        let mut world = World::new(bus);
        world
            .add_system(WaveSystem::new(
                WaveConfig::default(),
                vec2(800.0, 600.0),
                store.clone(),
                system_rng(5, 1),
            ))
            .unwrap();
        world.start();

        // First wave comes in at init: 1 + 3
        assert_eq!(rocks(&world).len(), 4);
        assert_eq!(store.borrow().wave(), 1);

        for rock in rocks(&world) {
            world.update(1.0 / 60.0).unwrap();
            destroy(&mut world, rock);
        }
        assert!(rocks(&world).is_empty());
        assert_eq!(levels.count(MessageKind::LevelChanged), 1);

        world.update(1.0 / 60.0).unwrap();

        assert_eq!(rocks(&world).len(), 7);
        assert_eq!(store.borrow().wave(), 2);
        match &levels.envelopes(MessageKind::LevelChanged)[1].message {
            Message::Game(GameMessage::LevelChanged { wave, asteroids }) => {
                assert_eq!((*wave, *asteroids), (2, 7));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_fragments_keep_the_wave_going() {
        let bus = MessageBus::new();
        let store = GameStore::shared(3);
        let mut world = World::new(bus);
        world
            .add_system(WaveSystem::new(
                WaveConfig {
                    base_asteroids: 0,
                    per_wave: 1,
                    split_asteroids: true,
                },
                vec2(800.0, 600.0),
                store.clone(),
                system_rng(5, 1),
            ))
            .unwrap();
        world.start();

        let parent = rocks(&world)[0];
        let piece = world.add_entity(entities::fragment(
            &mut system_rng(9, 9),
            Vec2::ZERO,
            AsteroidSize::Medium,
        ));
        world.emit(Message::Entity(EntityMessage::Created { entity: piece }));
        destroy(&mut world, parent);

        world.update(1.0 / 60.0).unwrap();
        assert_eq!(store.borrow().wave(), 1, "the fragment is still in play");

        destroy(&mut world, piece);
        world.update(1.0 / 60.0).unwrap();
        assert_eq!(store.borrow().wave(), 2);
    }

    #[test]
    fn test_non_asteroid_destruction_is_ignored() {
        let bus = MessageBus::new();
        let mut world = World::new(bus);
        let wave = WaveSystem::new(WaveConfig::default(), vec2(800.0, 600.0), GameStore::shared(3), system_rng(1, 1));
        let progress = Rc::clone(&wave.progress);
        world.add_system(wave).unwrap();

        let other = world.registry_mut().create();
        world.emit(Message::Entity(EntityMessage::Destroyed { entity: other }));

        assert_eq!(progress.borrow().remaining, 4);
    }
}
