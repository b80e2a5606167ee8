//! Common error types for cinesync

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for cinesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping a run (configuration, logging)
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected schema
    #[error("Failed to parse config file {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A required setting is absent or blank
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
