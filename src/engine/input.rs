//! Keyboard input
//!
//! The host hands the engine a `KeyboardProvider`: something that can say,
//! right now, which keys are held. The manager polls it once per frame into
//! a shared `InputState` snapshot, and systems read the snapshot. Edge
//! detection (fire on press, not on hold) is the consuming system's job.
//!
//! Arrow keys and WASD both steer; Space fires.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use macroquad::input::{is_key_down, KeyCode};
use macroquad::math::Vec2;

/// Keys the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl Key {
    pub const ALL: [Key; 5] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Fire];
}

/// Pressed/released per key. Missing keys read as released.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyState {
    keys: HashMap<Key, bool>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys.get(&key).copied().unwrap_or(false)
    }

    pub fn set(&mut self, key: Key, down: bool) {
        self.keys.insert(key, down);
    }
}

pub trait KeyboardProvider {
    fn state(&self) -> KeyState;
}

/// Reads the real keyboard through macroquad.
#[derive(Debug, Default)]
pub struct MacroquadKeyboard;

impl MacroquadKeyboard {
    fn bindings(key: Key) -> &'static [KeyCode] {
        match key {
            Key::Up => &[KeyCode::Up, KeyCode::W],
            Key::Down => &[KeyCode::Down, KeyCode::S],
            Key::Left => &[KeyCode::Left, KeyCode::A],
            Key::Right => &[KeyCode::Right, KeyCode::D],
            Key::Fire => &[KeyCode::Space],
        }
    }
}

impl KeyboardProvider for MacroquadKeyboard {
    fn state(&self) -> KeyState {
        let mut state = KeyState::new();
        for key in Key::ALL {
            let down = Self::bindings(key).iter().any(|code| is_key_down(*code));
            state.set(key, down);
        }
        state
    }
}

/// Keyboard driven by code, for tests and demos.
#[derive(Debug, Default)]
pub struct ScriptedKeyboard {
    state: RefCell<KeyState>,
}

impl ScriptedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: Key) {
        self.state.borrow_mut().set(key, true);
    }

    pub fn release(&self, key: Key) {
        self.state.borrow_mut().set(key, false);
    }

    pub fn release_all(&self) {
        *self.state.borrow_mut() = KeyState::new();
    }
}

impl KeyboardProvider for ScriptedKeyboard {
    fn state(&self) -> KeyState {
        self.state.borrow().clone()
    }
}

/// This frame's key snapshot. Clones share the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    current: Rc<RefCell<KeyState>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per frame before the world updates
    pub fn poll(&self, provider: &dyn KeyboardProvider) {
        *self.current.borrow_mut() = provider.state();
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.current.borrow().is_down(key)
    }

    /// x: right is +1, y: down is +1 (screen space)
    pub fn direction(&self) -> Vec2 {
        let keys = self.current.borrow();
        let axis = |neg: Key, pos: Key| keys.is_down(pos) as i32 as f32 - keys.is_down(neg) as i32 as f32;
        Vec2::new(axis(Key::Left, Key::Right), axis(Key::Up, Key::Down))
    }

    pub fn fire(&self) -> bool {
        self.is_down(Key::Fire)
    }
}
