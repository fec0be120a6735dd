//! Configuration errors
//!
//! The simulation itself has no recoverable errors; only loading a tuning
//! file can fail.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate a [`GameConfig`](crate::GameConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
