//! Lives and respawning
//!
//! A dead ship costs a life. With lives left a new ship arrives after a
//! delay, invincible for a while; without, the game is over.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::engine::component::ComponentKind;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::message::{Context, GameMessage, Message, MessageKind, PlayerMessage};
use crate::engine::store::SharedStore;
use crate::engine::system::System;

use crate::games::asteroids::config::AsteroidsConfig;
use crate::games::asteroids::entities;

pub struct RespawnSystem {
    config: AsteroidsConfig,
    store: SharedStore,
    /// Seconds until the next ship, if one is due
    timer: Rc<RefCell<Option<f32>>>,
}

impl RespawnSystem {
    pub fn new(config: AsteroidsConfig, store: SharedStore) -> Self {
        Self {
            config,
            store,
            timer: Rc::new(RefCell::new(None)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.borrow().is_some()
    }
}

impl System for RespawnSystem {
    fn name(&self) -> &'static str {
        "playerRespawn"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[]
    }

    fn priority(&self) -> i32 {
        5
    }

    fn init(&mut self, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let store = Rc::clone(&self.store);
        let timer = Rc::clone(&self.timer);
        let delay = self.config.ship.respawn_delay;
        ctx.on(MessageKind::PlayerDie, move |_, ctx| {
            let (lives, score) = {
                let mut store = store.borrow_mut();
                let lives = store.lives().saturating_sub(1);
                store.set_lives(lives);
                (lives, store.score())
            };

            if lives == 0 {
                store.borrow_mut().set_game_over(true);
                info!("game over with {} points", score);
                ctx.emit(Message::Game(GameMessage::GameOver { score }));
                return;
            }

            debug!("respawn in {:.1}s, {} lives left", delay, lives);
            *timer.borrow_mut() = Some(delay);
        });
        Ok(())
    }

    fn update(&mut self, _entities: &[Entity], dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let due = {
            let mut timer = self.timer.borrow_mut();
            match timer.as_mut() {
                Some(left) => {
                    *left -= dt;
                    if *left <= 0.0 {
                        *timer = None;
                        true
                    } else {
                        false
                    }
                }
                None => false,
            }
        };

        if due {
            let entity = ctx.spawn(entities::respawned_ship(&self.config));
            ctx.emit(Message::Player(PlayerMessage::Respawn { entity }));
        }
        Ok(())
    }
}
