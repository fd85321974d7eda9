//! Runtime error types

use blethru_core::CoreError;

/// Errors produced by the runtime engine
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Radio stack closed its event stream")]
    StackClosed,

    #[error("Runtime task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = core::result::Result<T, RuntimeError>;
