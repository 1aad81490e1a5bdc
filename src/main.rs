//! Asteroids on a tiny ECS engine
//!
//! The window loop: load config and shaders, build the game, then hand the
//! manager one frame per display refresh and draw the HUD on top.
//!
//! Keys: arrows or WASD to fly, Space to fire, P to pause, R to restart
//! after game over, Escape to quit.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod hud;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{error, info, warn};
use macroquad::prelude::*;

use asteroids_ecs::engine::gpu::{GlBackend, ShaderSources};
use asteroids_ecs::engine::input::MacroquadKeyboard;
use asteroids_ecs::engine::store::GameSnapshot;
use asteroids_ecs::engine::{BaseGame, EngineError, GameStore, Manager, MessageBus, SharedBackend};
use asteroids_ecs::games::asteroids::{AsteroidsConfig, AsteroidsGame, CONFIG_PATH, DEFAULT_CANVAS};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Asteroids v{}", VERSION),
        window_width: DEFAULT_CANVAS.0 as i32,
        window_height: DEFAULT_CANVAS.1 as i32,
        window_resizable: false,
        high_dpi: false,
        ..Default::default()
    }
}

fn load_config() -> AsteroidsConfig {
    match AsteroidsConfig::load(CONFIG_PATH) {
        Ok(config) => {
            info!("loaded {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("could not load {}: {}, using defaults", CONFIG_PATH, e);
            AsteroidsConfig::default()
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Crash logging and the logger before anything else
    #[cfg(not(target_arch = "wasm32"))]
    {
        crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(e) = run().await {
        error!("{}", e);
    }
}

async fn run() -> Result<(), EngineError> {
    let config = load_config();
    let seed = config
        .seed
        .unwrap_or_else(|| (macroquad::miniquad::date::now() * 1000.0) as u64);
    info!("=== Asteroids v{} (seed {}) ===", VERSION, seed);

    // The window opens before the config is read; match it to the canvas
    let (width, height) = config.window_size();
    if (screen_width() as i32, screen_height() as i32) != (width, height) {
        info!("resizing window to {}x{}", width, height);
        request_new_screen_size(width as f32, height as f32);
        next_frame().await;
    }

    // Shaders must be compiled before the first frame
    let sources = ShaderSources::fetch(&config.shaders.vertex, &config.shaders.fragment).await;
    let backend: SharedBackend = Rc::new(RefCell::new(GlBackend::new(
        &sources,
        vec2(config.width(), config.height()),
    )?));

    let store = GameStore::shared(config.ship.lives);
    let latest = Rc::new(Cell::new(store.borrow().snapshot()));
    {
        let latest = Rc::clone(&latest);
        store
            .borrow_mut()
            .subscribe(move |snapshot: &GameSnapshot| latest.set(*snapshot));
    }

    let definition = AsteroidsGame::new(config, Rc::clone(&store), Rc::clone(&backend), seed);
    let game = BaseGame::new(definition, MessageBus::new());

    let mut manager = Manager::new();
    manager.set_keyboard(Rc::new(MacroquadKeyboard));
    manager.start_game(Box::new(game), get_time())?;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            manager.stop_game();
            break;
        }

        let snapshot = latest.get();
        if is_key_pressed(KeyCode::P) && !snapshot.game_over {
            if manager.is_looping() {
                manager.pause_game();
            } else {
                manager.resume_game(get_time());
            }
        }
        if is_key_pressed(KeyCode::R) && snapshot.game_over {
            manager.restart_game(get_time())?;
        }

        if manager.is_looping() {
            manager.frame(get_time())?;
        } else {
            manager.redraw()?;
        }

        if let Some(game) = manager.active_game() {
            hud::draw_trails(game.world(), &backend);
        }
        let snapshot = latest.get();
        hud::draw_stats(&snapshot);
        if snapshot.game_over {
            hud::draw_game_over(&snapshot);
        } else if !manager.is_looping() {
            hud::draw_paused();
        }

        next_frame().await;
    }

    info!("bye");
    Ok(())
}
