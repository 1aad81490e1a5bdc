//! Game manager
//!
//! Owns the active game and the keyboard, and turns wall-clock time into
//! simulation steps. The host calls `frame(now)` once per display frame
//! (macroquad's `get_time()` in the binary); the manager polls input and
//! hands `now - last` seconds to the world.

use std::rc::Rc;

use log::{info, warn};

use super::error::EngineError;
use super::game::Game;
use super::input::KeyboardProvider;

/// Longest step handed to the world. Covers window drags and tab switches.
pub const MAX_FRAME_TIME: f64 = 0.25;

#[derive(Default)]
pub struct Manager {
    game: Option<Box<dyn Game>>,
    keyboard: Option<Rc<dyn KeyboardProvider>>,
    /// Seconds, host clock
    last_time: f64,
    looping: bool,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the keyboard at runtime. Takes effect on the next frame.
    pub fn set_keyboard(&mut self, keyboard: Rc<dyn KeyboardProvider>) {
        self.keyboard = Some(keyboard);
    }

    /// Initialize and start `game`, or resume the current one if a game is
    /// already active.
    pub fn start_game(&mut self, mut game: Box<dyn Game>, now: f64) -> Result<(), EngineError> {
        if self.keyboard.is_none() {
            return Err(EngineError::NoInput);
        }

        if self.game.is_some() {
            warn!("a game is already active, resuming it instead");
            self.resume_game(now);
            return Ok(());
        }

        game.initialize()?;
        info!("starting '{}'", game.name());
        self.game = Some(game);
        self.start_loop(now);
        if let Some(game) = self.game.as_mut() {
            game.start()?;
        }
        Ok(())
    }

    /// Advance the active game to `now`. Does nothing while paused.
    pub fn frame(&mut self, now: f64) -> Result<(), EngineError> {
        if !self.looping {
            return Ok(());
        }
        let dt = (now - self.last_time).clamp(0.0, MAX_FRAME_TIME);
        self.last_time = now;

        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };
        if let Some(keyboard) = &self.keyboard {
            game.input().poll(&**keyboard);
        }
        game.world_mut().update(dt as f32)
    }

    /// Draw the active game's current state without advancing it.
    pub fn redraw(&mut self) -> Result<(), EngineError> {
        match self.game.as_mut() {
            Some(game) => game.world_mut().redraw(),
            None => Ok(()),
        }
    }

    pub fn pause_game(&mut self) {
        if let Some(game) = self.game.as_mut() {
            game.pause();
            self.looping = false;
        }
    }

    /// The clock restarts from `now`, so the paused span is never simulated.
    pub fn resume_game(&mut self, now: f64) {
        if let Some(game) = self.game.as_mut() {
            game.resume();
            self.start_loop(now);
        }
    }

    /// Stop and drop the active game, then wipe every bus listener.
    pub fn stop_game(&mut self) {
        self.looping = false;
        if let Some(mut game) = self.game.take() {
            game.stop();
            game.world().bus().clear_all_listeners();
            info!("stopped '{}'", game.name());
        }
    }

    pub fn restart_game(&mut self, now: f64) -> Result<(), EngineError> {
        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };
        game.restart()?;
        self.start_loop(now);
        Ok(())
    }

    pub fn active_game(&self) -> Option<&dyn Game> {
        self.game.as_deref()
    }

    pub fn has_active_game(&self) -> bool {
        self.game.is_some()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    fn start_loop(&mut self, now: f64) {
        if self.looping {
            return;
        }
        self.looping = true;
        self.last_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::game::{BaseGame, GameDefinition};
    use crate::engine::input::{InputState, Key, ScriptedKeyboard};
    use crate::engine::message::{MessageBus, MessageKind};
    use crate::engine::world::World;

    /// Spawns one entity per step, named after the fire key.
    struct Stepper;

    impl GameDefinition for Stepper {
        fn name(&self) -> &str {
            "stepper"
        }

        fn create_systems(&mut self, world: &mut World, input: &InputState) -> Result<(), EngineError> {
            let input = input.clone();
            world.context().on(MessageKind::PreUpdate, move |_, ctx| {
                let name = if input.fire() { "fire" } else { "idle" };
                let entity = ctx.registry.create();
                ctx.registry.set_name(entity, name);
            });
            Ok(())
        }

        fn create_entities(&mut self, _world: &mut World) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn names(manager: &Manager) -> Vec<String> {
        let world = manager.active_game().unwrap().world();
        world
            .entities()
            .into_iter()
            .filter_map(|e| world.registry().name(e).map(str::to_string))
            .collect()
    }

    fn stepper(bus: &MessageBus) -> Box<dyn Game> {
        Box::new(BaseGame::new(Stepper, bus.clone()))
    }

    #[test]
    fn test_start_without_keyboard_fails() {
        let mut manager = Manager::new();
        let result = manager.start_game(stepper(&MessageBus::new()), 0.0);
        assert!(matches!(result, Err(EngineError::NoInput)));
        assert!(!manager.has_active_game());
    }

    #[test]
    fn test_frame_polls_input_then_steps() {
        let keyboard = Rc::new(ScriptedKeyboard::new());
        let mut manager = Manager::new();
        manager.set_keyboard(keyboard.clone());
        manager.start_game(stepper(&MessageBus::new()), 10.0).unwrap();

        manager.frame(10.016).unwrap();
        keyboard.press(Key::Fire);
        manager.frame(10.032).unwrap();

        assert_eq!(names(&manager), vec!["idle", "fire"]);
        let elapsed = manager.active_game().unwrap().world().elapsed();
        assert!((elapsed - 0.032).abs() < 1e-4);
    }

    #[test]
    fn test_resume_does_not_simulate_the_pause() {
        let mut manager = Manager::new();
        manager.set_keyboard(Rc::new(ScriptedKeyboard::new()));
        manager.start_game(stepper(&MessageBus::new()), 0.0).unwrap();
        manager.frame(0.1).unwrap();

        manager.pause_game();
        assert!(!manager.is_looping());
        manager.frame(5.0).unwrap();
        manager.resume_game(100.0);
        manager.frame(100.1).unwrap();

        let game = manager.active_game().unwrap();
        assert!(game.is_running());
        assert!((game.world().elapsed() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut manager = Manager::new();
        manager.set_keyboard(Rc::new(ScriptedKeyboard::new()));
        manager.start_game(stepper(&MessageBus::new()), 0.0).unwrap();
        manager.frame(3.0).unwrap();
        let elapsed = manager.active_game().unwrap().world().elapsed();
        assert!((elapsed - MAX_FRAME_TIME as f32).abs() < 1e-6);
    }

    #[test]
    fn test_stop_game_clears_bus() {
        let bus = MessageBus::new();
        let _hud = bus.on(MessageKind::ScoreChanged, |_, _| {});
        let mut manager = Manager::new();
        manager.set_keyboard(Rc::new(ScriptedKeyboard::new()));
        manager.start_game(stepper(&bus), 0.0).unwrap();
        assert!(bus.has_listeners(MessageKind::PreUpdate));

        manager.stop_game();

        assert!(!manager.has_active_game());
        assert!(!bus.has_listeners(MessageKind::PreUpdate));
        assert!(!bus.has_listeners(MessageKind::ScoreChanged));
    }
}
