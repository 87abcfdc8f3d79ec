//! Engine metrics through the `metrics` facade.
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge};

use mirror_models::{CalibrationPhase, EventKind};

/// Metric names as constants for consistency.
pub mod names {
    // Tick metrics
    pub const TICKS_TOTAL: &str = "mirror_ticks_total";
    pub const EMPTY_TICKS_TOTAL: &str = "mirror_empty_ticks_total";
    pub const SIGNAL_QUALITY: &str = "mirror_signal_quality";

    // Event metrics
    pub const EVENTS_EMITTED_TOTAL: &str = "mirror_events_emitted_total";
    pub const EVENTS_SUPPRESSED_TOTAL: &str = "mirror_events_suppressed_total";

    // Lifecycle metrics
    pub const CALIBRATIONS_TOTAL: &str = "mirror_calibrations_total";
    pub const REPORTS_GENERATED_TOTAL: &str = "mirror_reports_generated_total";
    pub const AUTO_TUNE_RUNS_TOTAL: &str = "mirror_auto_tune_runs_total";
}

/// Why an event attempt did not produce a new log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Cooldown,
    Merged,
    ToggleSpam,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::Cooldown => "cooldown",
            SuppressReason::Merged => "merged",
            SuppressReason::ToggleSpam => "toggle_spam",
        }
    }
}

/// Record a processed tick and its signal quality.
pub fn record_tick(signal_quality: f64) {
    counter!(names::TICKS_TOTAL).increment(1);
    gauge!(names::SIGNAL_QUALITY).set(signal_quality);
}

/// Record a tick that had no frames.
pub fn record_empty_tick() {
    counter!(names::EMPTY_TICKS_TOTAL).increment(1);
}

pub fn record_event_emitted(kind: EventKind) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::EVENTS_EMITTED_TOTAL, &labels).increment(1);
}

pub fn record_event_suppressed(kind: EventKind, reason: SuppressReason) {
    let labels = [
        ("kind", kind.as_str().to_string()),
        ("reason", reason.as_str().to_string()),
    ];
    counter!(names::EVENTS_SUPPRESSED_TOTAL, &labels).increment(1);
}

/// Record a terminal calibration outcome.
pub fn record_calibration(outcome: CalibrationPhase) {
    let label = match outcome {
        CalibrationPhase::Complete => "complete",
        CalibrationPhase::Incomplete => "incomplete",
        CalibrationPhase::Skipped => "skipped",
        _ => return,
    };
    let labels = [("outcome", label.to_string())];
    counter!(names::CALIBRATIONS_TOTAL, &labels).increment(1);
}

pub fn record_report(insufficient_data: bool) {
    let labels = [("insufficient", insufficient_data.to_string())];
    counter!(names::REPORTS_GENERATED_TOTAL, &labels).increment(1);
}

pub fn record_auto_tune() {
    counter!(names::AUTO_TUNE_RUNS_TOTAL).increment(1);
}
