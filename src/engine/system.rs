//! System contract
//!
//! A system is a unit of per-frame logic. It declares the component kinds
//! an entity must carry to be handed to `update`; the world recomputes that
//! list every frame. Systems that only react to messages declare no kinds
//! (they are never handed entities) and do their wiring in `init`, with
//! `update` left for timers.

use super::component::ComponentKind;
use super::entity::Entity;
use super::error::EngineError;
use super::message::Context;
use super::registry::Registry;

pub trait System {
    fn name(&self) -> &'static str;

    /// Kinds an entity needs to be eligible. Empty matches nothing.
    fn required(&self) -> &'static [ComponentKind];

    /// Lower runs earlier in a frame.
    fn priority(&self) -> i32 {
        0
    }

    /// Called once when the system is added to a world.
    fn init(&mut self, _ctx: &mut Context<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    /// One frame. `entities` may be empty.
    fn update(&mut self, entities: &[Entity], dt: f32, ctx: &mut Context<'_>) -> Result<(), EngineError>;

    /// Drawing systems are rerun by `World::redraw` while the world is
    /// stopped. Their `update` must not change simulation state.
    fn draws(&self) -> bool {
        false
    }

    fn should_process(&self, registry: &Registry, entity: Entity) -> bool {
        let required = self.required();
        !required.is_empty() && registry.has_all(entity, required)
    }
}
