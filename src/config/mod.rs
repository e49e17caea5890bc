//! Persistent runtime configuration: where data lives and how the engine behaves.

pub mod manager;
pub mod model;

use std::io;

use thiserror::Error;

pub use manager::ConfigManager;
pub use model::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
