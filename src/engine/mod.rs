//! Engine Core
//!
//! A small data-oriented simulation substrate:
//! - Entity: generational handle, never reused while alive
//! - Component: typed data attached to an entity, one per kind
//! - System: per-frame logic over entities that carry its required kinds
//! - World: registry + ordered systems + message bus, one step per update
//! - Message: typed publish/subscribe between systems
//!
//! Design philosophy:
//! - Compile-time known components, stored per kind in the registry
//! - Systems never call each other, only exchange messages
//! - No globals: the bus is a handle passed down from whoever builds the world

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod game;
pub mod gpu;
pub mod input;
pub mod manager;
pub mod message;
pub mod particles;
pub mod registry;
pub mod render;
pub mod store;
pub mod system;
pub mod systems;
pub mod world;

pub use component::{Component, ComponentKind};
pub use components::{Collider, DrawMode, Physics, Render, Rgba, Shape, Transform};
pub use entity::Entity;
pub use error::{ConfigError, EngineError};
pub use game::{BaseGame, Game, GameDefinition};
pub use input::{InputState, Key, KeyboardProvider};
pub use manager::Manager;
pub use message::{Context, Envelope, Message, MessageBus, MessageKind};
pub use registry::{EntityBuilder, Registry};
pub use render::{RenderBackend, SharedBackend};
pub use store::{GameStore, SharedStore};
pub use system::System;
pub use world::World;
