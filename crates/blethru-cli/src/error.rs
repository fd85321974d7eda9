//! CLI error types

use blethru_core::CoreError;
use blethru_runtime::RuntimeError;

/// Errors surfaced to the command-line user
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

pub type Result<T> = core::result::Result<T, CliError>;
