//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid frame on line {line}: {message}")]
    InvalidFrame { line: usize, message: String },

    #[error("Engine error: {0}")]
    Engine(#[from] mirror_engine::EngineError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_frame(line: usize, msg: impl Into<String>) -> Self {
        Self::InvalidFrame {
            line,
            message: msg.into(),
        }
    }

    /// Whether the replay should log and carry on past this error.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::InvalidFrame { .. })
    }
}
