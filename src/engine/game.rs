//! Game lifecycle
//!
//! A concrete game only describes itself (`GameDefinition`): which systems
//! to register and which entities to start with. `BaseGame` wraps that
//! description with the shared lifecycle:
//!
//! - `initialize` builds the pipeline once and announces `gameInitialized`
//! - `start` / `pause` / `resume` / `stop` flip the world clock
//! - `restart` tears everything down and builds it again
//!
//! Each transition is mirrored on the bus as a `Game*` message.

use log::info;

use super::error::EngineError;
use super::input::InputState;
use super::message::{GameMessage, Message, MessageBus};
use super::world::World;

/// What a particular game contributes.
pub trait GameDefinition {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Register the system pipeline. `input` is the per-frame key snapshot.
    fn create_systems(&mut self, world: &mut World, input: &InputState) -> Result<(), EngineError>;

    /// Spawn the starting entities.
    fn create_entities(&mut self, world: &mut World) -> Result<(), EngineError>;

    /// Forget per-run state before a restart.
    fn reset(&mut self) {}
}

/// Lifecycle as the manager drives it.
pub trait Game {
    fn name(&self) -> &str;
    fn initialize(&mut self) -> Result<(), EngineError>;
    fn start(&mut self) -> Result<(), EngineError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn restart(&mut self) -> Result<(), EngineError>;
    fn is_initialized(&self) -> bool;
    fn is_running(&self) -> bool;
    fn world(&self) -> &World;
    fn world_mut(&mut self) -> &mut World;
    fn input(&self) -> &InputState;
}

pub struct BaseGame<D: GameDefinition> {
    definition: D,
    world: World,
    input: InputState,
    initialized: bool,
    running: bool,
}

impl<D: GameDefinition> BaseGame<D> {
    pub fn new(definition: D, bus: MessageBus) -> Self {
        Self {
            definition,
            world: World::new(bus),
            input: InputState::new(),
            initialized: false,
            running: false,
        }
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn definition_mut(&mut self) -> &mut D {
        &mut self.definition
    }

    fn announce(&mut self, message: GameMessage) {
        self.world.emit(Message::Game(message));
    }
}

impl<D: GameDefinition> Game for BaseGame<D> {
    fn name(&self) -> &str {
        self.definition.name()
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        self.definition.create_systems(&mut self.world, &self.input)?;
        self.definition.create_entities(&mut self.world)?;
        self.initialized = true;

        let name = self.definition.name().to_string();
        info!("game '{}' initialized", name);
        self.announce(GameMessage::Initialized { name });
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized(self.definition.name().to_string()));
        }
        self.world.start();
        self.running = true;
        self.announce(GameMessage::Started);
        Ok(())
    }

    fn pause(&mut self) {
        if self.running {
            self.world.stop();
            self.running = false;
            self.announce(GameMessage::Paused);
        }
    }

    fn resume(&mut self) {
        if !self.running && self.initialized {
            self.world.start();
            self.running = true;
            self.announce(GameMessage::Resumed);
        }
    }

    fn stop(&mut self) {
        if self.initialized {
            self.world.stop();
            self.running = false;
            self.announce(GameMessage::Stopped);
        }
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        info!("restarting '{}'", self.definition.name());
        self.stop();
        self.world.clear();
        self.definition.reset();
        self.initialized = false;
        self.initialize()?;
        self.start()?;
        self.announce(GameMessage::Restarted);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn world(&self) -> &World {
        &self.world
    }

    fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    fn input(&self) -> &InputState {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::Transform;
    use crate::engine::message::{MessageKind, Recorder};
    use crate::engine::registry::EntityBuilder;
    use crate::engine::systems::PhysicsSystem;

    #[derive(Default)]
    struct Sandbox {
        resets: u32,
    }

    impl GameDefinition for Sandbox {
        fn name(&self) -> &str {
            "sandbox"
        }

        fn create_systems(&mut self, world: &mut World, _input: &InputState) -> Result<(), EngineError> {
            world.add_system(PhysicsSystem::new(100.0, 100.0))
        }

        fn create_entities(&mut self, world: &mut World) -> Result<(), EngineError> {
            world.add_entity(EntityBuilder::named("rock").with(Transform::default()));
            Ok(())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    const LIFECYCLE: [MessageKind; 6] = [
        MessageKind::GameInitialized,
        MessageKind::GameStarted,
        MessageKind::GamePaused,
        MessageKind::GameResumed,
        MessageKind::GameStopped,
        MessageKind::GameRestarted,
    ];

    #[test]
    fn test_start_before_initialize_fails() {
        let mut game = BaseGame::new(Sandbox::default(), MessageBus::new());
        assert!(matches!(game.start(), Err(EngineError::NotInitialized(name)) if name == "sandbox"));
        assert!(!game.is_running());
    }

    #[test]
    fn test_lifecycle_messages() {
        let bus = MessageBus::new();
        let recorder = Recorder::new(&bus, &LIFECYCLE);
        let mut game = BaseGame::new(Sandbox::default(), bus);

        game.initialize().unwrap();
        game.initialize().unwrap();
        game.start().unwrap();
        game.pause();
        game.pause();
        game.resume();
        game.stop();

        assert_eq!(
            recorder.kinds(),
            vec![
                MessageKind::GameInitialized,
                MessageKind::GameStarted,
                MessageKind::GamePaused,
                MessageKind::GameResumed,
                MessageKind::GameStopped,
            ]
        );
        assert_eq!(game.world().system_names(), vec!["physics"]);
        assert_eq!(game.world().entities().len(), 1);
        assert!(!game.world().is_running());
    }

    #[test]
    fn test_restart_rebuilds_world() {
        let bus = MessageBus::new();
        let mut game = BaseGame::new(Sandbox::default(), bus.clone());
        game.initialize().unwrap();
        game.start().unwrap();
        game.world_mut().add_entity(EntityBuilder::named("extra"));
        assert_eq!(game.world().entities().len(), 2);

        let recorder = Recorder::new(&bus, &LIFECYCLE);
        game.restart().unwrap();

        assert_eq!(game.definition().resets, 1);
        assert_eq!(game.world().entities().len(), 1);
        assert_eq!(game.world().system_names(), vec!["physics"]);
        assert!(game.is_running() && game.world().is_running());
        assert_eq!(
            recorder.kinds(),
            vec![
                MessageKind::GameStopped,
                MessageKind::GameInitialized,
                MessageKind::GameStarted,
                MessageKind::GameRestarted,
            ]
        );
    }
}
