//! Asteroids configuration
//!
//! Every tuning value lives here and is loaded from RON. Missing fields
//! fall back to the defaults below, so a config file only needs to name
//! what it changes. Per-frame values assume 60 frames per second.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::components::Rgba;
use crate::engine::error::ConfigError;

/// Default location, relative to the working directory
pub const CONFIG_PATH: &str = "assets/config/asteroids.ron";

/// Play-field size when the config names none; the window opens at this size
pub const DEFAULT_CANVAS: (f32, f32) = (800.0, 600.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Radians per frame
    pub rotation_speed: f32,
    pub thrust_power: f32,
    /// Frames between shots
    pub shoot_cooldown: u32,
    /// Frames of invincibility after a respawn
    pub invincibility_frames: u32,
    pub lives: u32,
    /// Seconds between death and respawn
    pub respawn_delay: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.1,
            thrust_power: 0.2,
            shoot_cooldown: 10,
            invincibility_frames: 120,
            lives: 3,
            respawn_delay: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Units per frame, added to the ship's velocity
    pub speed: f32,
    /// Seconds
    pub lifespan: f32,
    pub size: f32,
    /// Distance in front of the ship's center
    pub spawn_offset: f32,
    pub damage: u32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 7.0,
            lifespan: 1.5,
            size: 3.0,
            spawn_offset: 20.0,
            damage: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub base_asteroids: u32,
    /// Extra asteroids per wave number
    pub per_wave: u32,
    /// Large and medium rocks break into smaller ones when shot
    pub split_asteroids: bool,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_asteroids: 1,
            per_wave: 3,
            split_asteroids: true,
        }
    }
}

impl WaveConfig {
    /// Asteroids spawned for wave `wave` (1-based).
    pub fn asteroids_for(&self, wave: u32) -> u32 {
        self.base_asteroids + wave * self.per_wave
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// A life is granted each time the score crosses a multiple of this.
    /// Zero disables extra lives.
    pub extra_life_every: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { extra_life_every: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: "assets/shaders/vertex.glsl".to_string(),
            fragment: "assets/shaders/fragment.glsl".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidsConfig {
    /// Play-field size in pixels
    pub canvas: (f32, f32),
    pub background: Rgba,
    /// Fixed RNG seed; None picks one at startup
    pub seed: Option<u64>,
    pub ship: ShipConfig,
    pub projectile: ProjectileConfig,
    pub waves: WaveConfig,
    pub scoring: ScoringConfig,
    pub shaders: ShaderPaths,
}

impl Default for AsteroidsConfig {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS,
            background: [0.0, 0.0, 0.0, 1.0],
            seed: None,
            ship: ShipConfig::default(),
            projectile: ProjectileConfig::default(),
            waves: WaveConfig::default(),
            scoring: ScoringConfig::default(),
            shaders: ShaderPaths::default(),
        }
    }
}

impl AsteroidsConfig {
    pub fn width(&self) -> f32 {
        self.canvas.0
    }

    pub fn height(&self) -> f32 {
        self.canvas.1
    }

    /// Window size in whole pixels covering the canvas.
    pub fn window_size(&self) -> (i32, i32) {
        (self.canvas.0.ceil() as i32, self.canvas.1.ceil() as i32)
    }

    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("    ".to_string());
        let text = ron::ser::to_string_pretty(self, pretty)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (w, h) = self.canvas;
        if !(w > 0.0 && h > 0.0) {
            return Err(ConfigError::Invalid(format!("canvas must be positive, got {w}x{h}")));
        }
        if self.ship.lives == 0 {
            return Err(ConfigError::Invalid("ship.lives must be at least 1".into()));
        }
        let non_negative = [
            ("ship.rotation_speed", self.ship.rotation_speed),
            ("ship.thrust_power", self.ship.thrust_power),
            ("ship.respawn_delay", self.ship.respawn_delay),
            ("projectile.speed", self.projectile.speed),
            ("projectile.lifespan", self.projectile.lifespan),
            ("projectile.size", self.projectile.size),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }
}
