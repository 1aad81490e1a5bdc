//! Ship control
//!
//! Left/right rotate, up thrusts along the nose, fire shoots once per key
//! press (subject to the ship's cooldown). Shots go out as `playerFire`
//! from the ship entity; the projectile system builds the bullet.

use crate::engine::component::ComponentKind;
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::input::InputState;
use crate::engine::message::{Context, FireEvent, Message, PlayerMessage};
use crate::engine::system::System;
use crate::engine::systems::time_scale;

use crate::games::asteroids::entities::heading;

pub struct ShipControlSystem {
    input: InputState,
    /// Fire key state last frame, for edge detection
    fire_was_down: bool,
}

impl ShipControlSystem {
    pub fn new(input: InputState) -> Self {
        Self {
            input,
            fire_was_down: false,
        }
    }
}

impl System for ShipControlSystem {
    fn name(&self) -> &'static str {
        "shipControl"
    }

    fn required(&self) -> &'static [ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Physics, ComponentKind::Ship]
    }

    fn priority(&self) -> i32 {
        1
    }

    fn update(&mut self, entities: &[Entity], dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError> {
        let frames = time_scale(dt);
        let direction = self.input.direction();
        let fire = self.input.fire();
        let fire_pressed = fire && !self.fire_was_down;
        self.fire_was_down = fire;

        let mut shots = Vec::new();
        let registry = &mut *ctx.registry;
        for &entity in entities {
            let (Some(transform), Some(physics), Some(ship)) = (
                registry.transforms.get_mut(entity),
                registry.physics.get_mut(entity),
                registry.ships.get_mut(entity),
            ) else {
                continue;
            };

            ship.tick();

            if direction.x != 0.0 {
                transform.rotate(ship.rotation_speed * direction.x * frames);
            }

            // Up is negative y
            if direction.y < 0.0 {
                ship.thrusting = true;
                physics.apply_force(heading(transform.rotation) * ship.thrust_power);
                ship.update_trail(transform.position, transform.rotation);
            } else {
                ship.thrusting = false;
            }

            if fire_pressed && ship.can_shoot() {
                ship.shoot();
                shots.push((
                    entity,
                    FireEvent {
                        position: transform.position,
                        rotation: transform.rotation,
                        velocity: physics.velocity,
                        source_entity: Some(entity),
                    },
                ));
            }
        }

        for (entity, shot) in shots {
            ctx.emit_from(entity, Message::Player(PlayerMessage::Fire(shot)));
        }
        Ok(())
    }
}
