//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use mirror_models::ContextMode;

use crate::error::{WorkerError, WorkerResult};

/// Where landmark records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` selects stdin, anything else is a path.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "-" => InputSource::Stdin,
            path => InputSource::File(PathBuf::from(path)),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Landmark JSON-lines source
    pub input: InputSource,
    /// Cross-session state file; nothing is persisted when unset
    pub state_path: Option<PathBuf>,
    pub context_mode: ContextMode,
    /// Run guided calibration at session start instead of skipping it
    pub auto_calibrate: bool,
    /// Wall-clock tick spacing in the replayed stream
    pub tick_interval_ms: i64,
    /// Prometheus listener address
    pub metrics_addr: Option<SocketAddr>,
    /// Identifier stamped on session log lines
    pub session_id: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            input: InputSource::Stdin,
            state_path: None,
            context_mode: ContextMode::default(),
            auto_calibrate: false,
            tick_interval_ms: 1_000,
            metrics_addr: None,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            input: std::env::var("MIRROR_INPUT")
                .map(|v| InputSource::parse(&v))
                .unwrap_or(defaults.input),
            state_path: std::env::var("MIRROR_STATE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            context_mode: std::env::var("MIRROR_CONTEXT_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.context_mode),
            auto_calibrate: std::env::var("MIRROR_AUTO_CALIBRATE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.auto_calibrate),
            tick_interval_ms: std::env::var("MIRROR_TICK_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.tick_interval_ms),
            metrics_addr: std::env::var("MIRROR_METRICS_ADDR")
                .ok()
                .and_then(|s| s.parse().ok()),
            session_id: std::env::var("MIRROR_SESSION_ID").unwrap_or(defaults.session_id),
        }
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.tick_interval_ms <= 0 {
            return Err(WorkerError::config_error(format!(
                "tick interval must be positive, got {}",
                self.tick_interval_ms
            )));
        }
        Ok(())
    }
}
