//! Scores, signal quality and per-second metric records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The persisted score triple, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Scores {
    pub focus: u8,
    pub energy: u8,
    pub confidence: u8,
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            focus: 75,
            energy: 75,
            confidence: 75,
        }
    }
}

/// Tracking reliability breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalQuality {
    /// Face-presence ratio this second (0-1)
    pub q_face: f64,
    /// Face-size stability proxy for distance/lighting (0-1)
    pub q_light: f64,
    /// Head-motion stability (0-1)
    pub q_stability: f64,
    /// Weighted total (0-100)
    pub q_total: f64,
}

impl Default for SignalQuality {
    fn default() -> Self {
        Self {
            q_face: 1.0,
            q_light: 1.0,
            q_stability: 1.0,
            q_total: 100.0,
        }
    }
}

/// One aggregated second of session history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SecondMetrics {
    /// Tick timestamp (ms)
    pub t: i64,
    pub focus: u8,
    pub energy: u8,
    pub confidence: u8,
    pub away_ratio: f64,
    pub face_present: bool,
    pub ear: f64,
    pub blink_rate: f64,
    pub yawn_active: bool,
    pub speaking: bool,
    /// Head-motion EMA
    pub head_motion: f64,
    /// Gaze-motion EMA
    pub gaze_motion: f64,
    /// `q_total` for this second
    pub signal_quality: f64,
    /// Away/not-away flips within this second
    pub away_toggle_count: u32,
}

/// Raw measurements reported alongside the scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricsSnapshot {
    pub ear: f64,
    pub blink_rate: f64,
    pub away_ratio: f64,
    pub head_motion: f64,
    pub gaze_motion: f64,
    pub face_size: f64,
    pub iris_available: bool,
}

/// Discrete behavioral label for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObservedMode {
    DeepFocus,
    Thinking,
    Distracted,
    Fatigued,
    HighEnergy,
    Neutral,
    Away,
    LowSignal,
}

impl ObservedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservedMode::DeepFocus => "deep_focus",
            ObservedMode::Thinking => "thinking",
            ObservedMode::Distracted => "distracted",
            ObservedMode::Fatigued => "fatigued",
            ObservedMode::HighEnergy => "high_energy",
            ObservedMode::Neutral => "neutral",
            ObservedMode::Away => "away",
            ObservedMode::LowSignal => "low_signal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ObservedMode::DeepFocus => "Deep Focus",
            ObservedMode::Thinking => "Thinking",
            ObservedMode::Distracted => "Distracted",
            ObservedMode::Fatigued => "Fatigued",
            ObservedMode::HighEnergy => "High Energy",
            ObservedMode::Neutral => "Neutral",
            ObservedMode::Away => "Away",
            ObservedMode::LowSignal => "Low Signal",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ObservedMode::DeepFocus => "Sustained high attention",
            ObservedMode::Thinking => "Processing, productive look-away",
            ObservedMode::Distracted => "Attention fragmented",
            ObservedMode::Fatigued => "Energy indicators low",
            ObservedMode::HighEnergy => "Alert and engaged",
            ObservedMode::Neutral => "Steady state",
            ObservedMode::Away => "Face not in frame",
            ObservedMode::LowSignal => "Tracking quality degraded",
        }
    }
}

/// Observed mode with display text and a 0-100 confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ObservedModeReading {
    pub mode: ObservedMode,
    pub label: String,
    pub description: String,
    pub confidence: u8,
}

impl ObservedModeReading {
    pub fn new(mode: ObservedMode, confidence: u8) -> Self {
        Self {
            mode,
            label: mode.label().to_string(),
            description: mode.description().to_string(),
            confidence,
        }
    }
}
