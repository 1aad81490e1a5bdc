//! Asteroids components
//!
//! Game-specific data: the player's ship, asteroid tiers and bullets.
//! Timers on the ship count frames; the projectile's lifetime is seconds.

use macroquad::math::Vec2;

use crate::engine::component::{Component, ComponentKind, ComponentStorage};
use crate::engine::entity::Entity;
use crate::engine::error::EngineError;
use crate::engine::registry::Registry;

use super::config::ShipConfig;

/// Positions kept for the engine trail
pub const MAX_TRAIL_LENGTH: usize = 5;

// =============================================================================
// Ship
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    /// Frames between shots
    pub shoot_cooldown: u32,
    /// Frames until the next shot is allowed
    pub last_shot: u32,
    pub thrust_power: f32,
    /// Radians per frame
    pub rotation_speed: f32,
    pub thrusting: bool,
    pub invincible: bool,
    /// Frames left
    pub invincibility_time: u32,
    /// Recent (position, rotation), newest first
    pub trail: Vec<(Vec2, f32)>,
}

impl Ship {
    pub fn new(shoot_cooldown: u32, thrust_power: f32, rotation_speed: f32) -> Self {
        Self {
            shoot_cooldown,
            last_shot: 0,
            thrust_power,
            rotation_speed,
            thrusting: false,
            invincible: false,
            invincibility_time: 0,
            trail: Vec::with_capacity(MAX_TRAIL_LENGTH + 1),
        }
    }

    pub fn from_config(config: &ShipConfig) -> Self {
        Self::new(config.shoot_cooldown, config.thrust_power, config.rotation_speed)
    }

    /// One frame of cooldown and invincibility.
    pub fn tick(&mut self) {
        self.last_shot = self.last_shot.saturating_sub(1);
        if self.invincible {
            self.invincibility_time = self.invincibility_time.saturating_sub(1);
            if self.invincibility_time == 0 {
                self.invincible = false;
            }
        }
    }

    pub fn can_shoot(&self) -> bool {
        self.last_shot == 0
    }

    pub fn shoot(&mut self) {
        self.last_shot = self.shoot_cooldown;
    }

    pub fn set_invincible(&mut self, frames: u32) {
        self.invincible = frames > 0;
        self.invincibility_time = frames;
    }

    pub fn update_trail(&mut self, position: Vec2, rotation: f32) {
        self.trail.insert(0, (position, rotation));
        self.trail.truncate(MAX_TRAIL_LENGTH);
    }
}

impl Default for Ship {
    fn default() -> Self {
        Self::from_config(&ShipConfig::default())
    }
}

impl Component for Ship {
    const KIND: ComponentKind = ComponentKind::Ship;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.ships
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.ships
    }

    fn on_detach(&mut self, _entity: Entity) {
        self.trail.clear();
        self.thrusting = false;
    }
}

// =============================================================================
// Asteroid
// =============================================================================

/// Size tier. Smaller rocks are worth more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    pub fn points(self) -> u32 {
        match self {
            AsteroidSize::Large => 20,
            AsteroidSize::Medium => 50,
            AsteroidSize::Small => 100,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            AsteroidSize::Large => 40.0,
            AsteroidSize::Medium => 20.0,
            AsteroidSize::Small => 10.0,
        }
    }

    pub fn fragment_count(self) -> usize {
        match self {
            AsteroidSize::Large => 3,
            AsteroidSize::Medium => 2,
            AsteroidSize::Small => 0,
        }
    }

    /// Tier of the pieces this one breaks into.
    pub fn fragment_size(self) -> Result<AsteroidSize, EngineError> {
        match self {
            AsteroidSize::Large => Ok(AsteroidSize::Medium),
            AsteroidSize::Medium => Ok(AsteroidSize::Small),
            AsteroidSize::Small => Err(EngineError::NoFragments(self.as_str())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AsteroidSize::Large => "large",
            AsteroidSize::Medium => "medium",
            AsteroidSize::Small => "small",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Asteroid {
    pub size: AsteroidSize,
}

impl Asteroid {
    pub fn new(size: AsteroidSize) -> Self {
        Self { size }
    }

    pub fn points(&self) -> u32 {
        self.size.points()
    }
}

impl Component for Asteroid {
    const KIND: ComponentKind = ComponentKind::Asteroid;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.asteroids
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.asteroids
    }
}

// =============================================================================
// Projectile
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Seconds left
    pub remaining: f32,
    pub damage: u32,
    /// Ship that fired it
    pub owner: Option<Entity>,
}

impl Projectile {
    pub fn new(lifespan: f32, damage: u32, owner: Option<Entity>) -> Self {
        Self {
            remaining: lifespan,
            damage,
            owner,
        }
    }

    /// Age by `dt` seconds; true once expired.
    pub fn age(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.has_expired()
    }

    pub fn has_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

impl Component for Projectile {
    const KIND: ComponentKind = ComponentKind::Projectile;

    fn storage(registry: &Registry) -> &ComponentStorage<Self> {
        &registry.projectiles
    }

    fn storage_mut(registry: &mut Registry) -> &mut ComponentStorage<Self> {
        &mut registry.projectiles
    }
}
