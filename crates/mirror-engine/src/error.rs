//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine.
///
/// Frame, tick and report calls never fail; these only come from
/// configuration, context-mode selection and state snapshots.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown context mode: {0}")]
    UnknownContextMode(String),

    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("State snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

impl From<mirror_models::ContextModeParseError> for EngineError {
    fn from(err: mirror_models::ContextModeParseError) -> Self {
        Self::UnknownContextMode(err.0)
    }
}
