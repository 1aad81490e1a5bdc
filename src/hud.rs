//! HUD overlay
//!
//! Drawn after the world each frame: score, lives and wave from the store,
//! the engine trail behind a thrusting ship, and the pause / game-over
//! banners.

use macroquad::prelude::*;

use asteroids_ecs::engine::components::DrawMode;
use asteroids_ecs::engine::render::{DrawCall, SharedBackend};
use asteroids_ecs::engine::store::GameSnapshot;
use asteroids_ecs::engine::World;

const FONT_SIZE: f32 = 24.0;
const MARGIN: f32 = 16.0;
const TRAIL_ALPHA: f32 = 0.6;

/// One dot per recorded position, fading toward the oldest.
pub fn draw_trails(world: &World, backend: &SharedBackend) {
    let mut backend = backend.borrow_mut();
    for (_, ship) in world.registry().ships.iter() {
        if !ship.thrusting {
            continue;
        }
        let len = ship.trail.len() as f32;
        for (i, (position, _)) in ship.trail.iter().enumerate() {
            let alpha = TRAIL_ALPHA * (1.0 - i as f32 / len);
            backend.draw(&DrawCall {
                vertices: &[0.0, 0.0],
                mode: DrawMode::Points,
                translation: *position,
                rotation: 0.0,
                color: [1.0, 0.6, 0.2, alpha],
            });
        }
    }
}

pub fn draw_stats(snapshot: &GameSnapshot) {
    draw_text(&format!("SCORE {}", snapshot.score), MARGIN, MARGIN + FONT_SIZE, FONT_SIZE, WHITE);
    draw_text(&format!("LIVES {}", snapshot.lives), MARGIN, MARGIN + FONT_SIZE * 2.0, FONT_SIZE, WHITE);

    let wave = format!("WAVE {}", snapshot.wave);
    let size = measure_text(&wave, None, FONT_SIZE as u16, 1.0);
    draw_text(&wave, screen_width() - size.width - MARGIN, MARGIN + FONT_SIZE, FONT_SIZE, WHITE);
}

fn draw_centered(line: &str, y: f32, font_size: f32, color: Color) {
    let size = measure_text(line, None, font_size as u16, 1.0);
    draw_text(line, (screen_width() - size.width) / 2.0, y, font_size, color);
}

pub fn draw_game_over(snapshot: &GameSnapshot) {
    let mid = screen_height() / 2.0;
    draw_centered("GAME OVER", mid, FONT_SIZE * 2.5, RED);
    draw_centered(&format!("final score {}", snapshot.score), mid + FONT_SIZE * 1.5, FONT_SIZE, WHITE);
    draw_centered("press R to play again", mid + FONT_SIZE * 3.0, FONT_SIZE, GRAY);
}

pub fn draw_paused() {
    draw_centered("PAUSED", screen_height() / 2.0, FONT_SIZE * 2.0, WHITE);
}
