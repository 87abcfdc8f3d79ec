//! Structured session logging.

use mirror_models::{CalibrationPhase, ContextMode, Report, Scores};
use tracing::{info, warn};

use crate::error::WorkerError;
use crate::replay::ReplayStats;

/// Lifecycle logging for one replayed session.
///
/// Every line carries the session ID and the operation being performed.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    operation: String,
}

impl SessionLogger {
    pub fn new(session_id: &str, operation: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, context_mode: ContextMode, calibration: CalibrationPhase) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            context_mode = context_mode.as_str(),
            calibration = ?calibration,
            "Session started"
        );
    }

    /// Periodic score checkpoint.
    pub fn log_progress(&self, ticks: u64, scores: Scores) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            ticks,
            focus = scores.focus,
            energy = scores.energy,
            confidence = scores.confidence,
            "Session progress"
        );
    }

    pub fn log_calibration_phase(&self, from: CalibrationPhase, to: CalibrationPhase, timestamp_ms: i64) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            from = ?from,
            to = ?to,
            timestamp_ms,
            "Calibration phase changed"
        );
    }

    pub fn log_skipped_line(&self, err: &WorkerError) {
        warn!(
            session_id = %self.session_id,
            operation = %self.operation,
            error = %err,
            "Skipping input line"
        );
    }

    pub fn log_completion(&self, stats: &ReplayStats, report: &Report) {
        info!(
            session_id = %self.session_id,
            operation = %self.operation,
            frames = stats.frames,
            ticks = stats.ticks,
            empty_ticks = stats.empty_ticks,
            skipped_lines = stats.skipped_lines,
            insufficient_data = report.insufficient_data,
            archetype = report.archetype.map(|a| a.label()).unwrap_or("none"),
            "Session completed"
        );
    }
}
