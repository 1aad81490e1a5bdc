//! Asteroids on a tiny ECS
//!
//! `engine` is game-agnostic; `games` holds the games built on it.

pub mod engine;
pub mod games;
