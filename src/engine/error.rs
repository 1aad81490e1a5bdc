//! Engine errors
//!
//! Only things that abort a game start or reveal a caller bug are errors.
//! Missing components are `None`, and removing something that is not
//! there is a no-op.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no rendering context: surface is {width}x{height}")]
    MissingRenderContext { width: f32, height: f32 },

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("shader program failed to link: {0}")]
    ShaderLink(String),

    #[error("game '{0}' started before initialize()")]
    NotInitialized(String),

    #[error("no keyboard provider configured")]
    NoInput,

    #[error("{0} asteroids do not break into fragments")]
    NoFragments(&'static str),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid value: {0}")]
    Invalid(String),
}
