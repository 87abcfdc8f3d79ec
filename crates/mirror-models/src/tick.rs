//! Per-tick result handed to rendering and persistence collaborators.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationPhase;
use crate::context::ContextModeDescriptor;
use crate::event::Event;
use crate::scores::{MetricsSnapshot, ObservedModeReading, Scores, SignalQuality};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TickResult {
    pub timestamp_ms: i64,
    pub scores: Scores,
    pub observed_mode: ObservedModeReading,
    pub signal_quality: SignalQuality,
    pub context_mode: ContextModeDescriptor,
    pub metrics: MetricsSnapshot,
    pub face_detected: bool,
    pub is_calibrated: bool,
    pub is_calibrating: bool,
    pub calibration_phase: CalibrationPhase,
    /// Most recent slice of the event log
    pub events: Vec<Event>,
}
