//! Calibration status models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::baseline::Baseline;

/// Calibration controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPhase {
    #[default]
    Idle,
    /// Neutral face, looking at the screen
    PhaseA,
    /// Natural look-aways to the sides
    PhaseB,
    /// Optional speaking sample
    PhaseC,
    /// Baseline computed from collected samples
    Complete,
    /// Too few samples; prior baseline kept
    Incomplete,
    /// User opted out; prior baseline kept
    Skipped,
}

impl CalibrationPhase {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CalibrationPhase::PhaseA | CalibrationPhase::PhaseB | CalibrationPhase::PhaseC
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CalibrationPhase::Complete | CalibrationPhase::Incomplete | CalibrationPhase::Skipped
        )
    }

    /// Short phase letter for active phases.
    pub fn letter(&self) -> Option<&'static str> {
        match self {
            CalibrationPhase::PhaseA => Some("A"),
            CalibrationPhase::PhaseB => Some("B"),
            CalibrationPhase::PhaseC => Some("C"),
            _ => None,
        }
    }

    /// What the user should be doing in this phase.
    pub fn instruction(&self) -> Option<&'static str> {
        match self {
            CalibrationPhase::PhaseA => Some("Look at screen normally, neutral face"),
            CalibrationPhase::PhaseB => Some("Look away left/right naturally a few times"),
            CalibrationPhase::PhaseC => Some("Optional: Talk normally for 10 seconds"),
            _ => None,
        }
    }
}

/// One step in the calibration timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PhaseStep {
    pub phase: CalibrationPhase,
    pub duration_ms: u64,
    pub instruction: String,
}

/// Timeline returned when calibration starts, for countdown UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationPlan {
    pub phases: Vec<PhaseStep>,
    pub total_duration_ms: u64,
}

/// Progress through an active calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationProgress {
    /// Percent of the full timeline (0-100)
    pub progress: f64,
    pub phase: CalibrationPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// Calibration state as exposed to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationStatus {
    pub is_calibrated: bool,
    pub is_calibrating: bool,
    pub phase: CalibrationPhase,
    pub baseline: Baseline,
}
