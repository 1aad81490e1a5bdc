//! Game store
//!
//! Score, lives, wave and the game-over flag, observable from outside the
//! simulation. The HUD (or any other widget) subscribes here instead of on
//! the message bus, so it keeps working across restarts that rebuild the
//! world.
//!
//! Observers are called synchronously with a copy of the new state after
//! every change. They must not call back into the store.

use std::cell::RefCell;
use std::rc::Rc;

/// Point-in-time copy of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameSnapshot {
    pub score: u32,
    pub lives: u32,
    pub wave: u32,
    pub game_over: bool,
}

pub type Observer = Box<dyn FnMut(&GameSnapshot)>;

pub type SharedStore = Rc<RefCell<GameStore>>;

#[derive(Default)]
pub struct GameStore {
    state: GameSnapshot,
    observers: Vec<(u64, Observer)>,
    next_id: u64,
}

impl GameStore {
    pub fn new(lives: u32) -> Self {
        Self {
            state: GameSnapshot {
                lives,
                ..GameSnapshot::default()
            },
            ..Self::default()
        }
    }

    pub fn shared(lives: u32) -> SharedStore {
        Rc::new(RefCell::new(Self::new(lives)))
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn lives(&self) -> u32 {
        self.state.lives
    }

    pub fn wave(&self) -> u32 {
        self.state.wave
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    /// Register an observer; returns an id for `unsubscribe`.
    pub fn subscribe<F>(&mut self, observer: F) -> u64
    where
        F: FnMut(&GameSnapshot) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    /// Add to the score and return the new total.
    pub fn increment_score(&mut self, by: u32) -> u32 {
        self.state.score = self.state.score.saturating_add(by);
        self.notify();
        self.state.score
    }

    pub fn set_game_over(&mut self, flag: bool) {
        self.state.game_over = flag;
        self.notify();
    }

    pub fn set_lives(&mut self, lives: u32) {
        self.state.lives = lives;
        self.notify();
    }

    pub fn add_life(&mut self) -> u32 {
        self.state.lives += 1;
        self.notify();
        self.state.lives
    }

    pub fn set_wave(&mut self, wave: u32) {
        self.state.wave = wave;
        self.notify();
    }

    /// Back to a fresh game. Observers stay registered.
    pub fn reset(&mut self, lives: u32) {
        self.state = GameSnapshot {
            lives,
            ..GameSnapshot::default()
        };
        self.notify();
    }

    fn notify(&mut self) {
        let state = self.state;
        for (_, observer) in &mut self.observers {
            observer(&state);
        }
    }
}
