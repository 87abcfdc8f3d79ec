//! Behavioral event models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::baseline::Baseline;

/// How a look-away was interpreted when it triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookAwayType {
    /// Calm, productive look-away
    Thinking,
    /// Jittery or toggling look-away
    Distracted,
}

impl LookAwayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookAwayType::Thinking => "thinking",
            LookAwayType::Distracted => "distracted",
        }
    }

    pub fn start_kind(&self) -> EventKind {
        match self {
            LookAwayType::Thinking => EventKind::LookAwayThinkingStart,
            LookAwayType::Distracted => EventKind::LookAwayDistractedStart,
        }
    }

    pub fn end_kind(&self) -> EventKind {
        match self {
            LookAwayType::Thinking => EventKind::LookAwayThinkingEnd,
            LookAwayType::Distracted => EventKind::LookAwayDistractedEnd,
        }
    }
}

/// Closed set of event types the engine can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    CalibrationStart,
    CalibrationComplete,
    CalibrationIncomplete,
    CalibrationSkipped,
    FaceLostStart,
    FaceLostEnd,
    LookAwayThinkingStart,
    LookAwayThinkingEnd,
    LookAwayDistractedStart,
    LookAwayDistractedEnd,
    FocusStreakStart,
    FocusStreakEnd,
    DistractionStart,
    DistractionEnd,
    EnergyDipStart,
    EnergyDipEnd,
    Yawn,
    LowSignal,
}

impl EventKind {
    /// Wire identifier (e.g. `FACE_LOST_START`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CalibrationStart => "CALIBRATION_START",
            EventKind::CalibrationComplete => "CALIBRATION_COMPLETE",
            EventKind::CalibrationIncomplete => "CALIBRATION_INCOMPLETE",
            EventKind::CalibrationSkipped => "CALIBRATION_SKIPPED",
            EventKind::FaceLostStart => "FACE_LOST_START",
            EventKind::FaceLostEnd => "FACE_LOST_END",
            EventKind::LookAwayThinkingStart => "LOOK_AWAY_THINKING_START",
            EventKind::LookAwayThinkingEnd => "LOOK_AWAY_THINKING_END",
            EventKind::LookAwayDistractedStart => "LOOK_AWAY_DISTRACTED_START",
            EventKind::LookAwayDistractedEnd => "LOOK_AWAY_DISTRACTED_END",
            EventKind::FocusStreakStart => "FOCUS_STREAK_START",
            EventKind::FocusStreakEnd => "FOCUS_STREAK_END",
            EventKind::DistractionStart => "DISTRACTION_START",
            EventKind::DistractionEnd => "DISTRACTION_END",
            EventKind::EnergyDipStart => "ENERGY_DIP_START",
            EventKind::EnergyDipEnd => "ENERGY_DIP_END",
            EventKind::Yawn => "YAWN",
            EventKind::LowSignal => "LOW_SIGNAL",
        }
    }

    /// Family name with any `_START`/`_END` suffix removed.
    pub fn family(&self) -> &'static str {
        let name = self.as_str();
        name.strip_suffix("_START")
            .or_else(|| name.strip_suffix("_END"))
            .unwrap_or(name)
    }

    pub fn is_start(&self) -> bool {
        self.as_str().ends_with("_START")
    }

    pub fn is_end(&self) -> bool {
        self.as_str().ends_with("_END")
    }

    /// The matching close kind for an open kind.
    pub fn end_kind(&self) -> Option<EventKind> {
        match self {
            EventKind::FaceLostStart => Some(EventKind::FaceLostEnd),
            EventKind::LookAwayThinkingStart => Some(EventKind::LookAwayThinkingEnd),
            EventKind::LookAwayDistractedStart => Some(EventKind::LookAwayDistractedEnd),
            EventKind::FocusStreakStart => Some(EventKind::FocusStreakEnd),
            EventKind::DistractionStart => Some(EventKind::DistractionEnd),
            EventKind::EnergyDipStart => Some(EventKind::EnergyDipEnd),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional payload attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventMeta {
    /// Duration of the closed episode in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,

    /// Look-away interpretation for look-away END events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub look_away_type: Option<LookAwayType>,

    /// Rolling energy median an energy dip was measured against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_baseline: Option<f64>,

    /// Energy at the moment a dip triggered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_current: Option<f64>,

    /// Baseline produced by a completed calibration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
}

impl EventMeta {
    pub fn with_duration(duration_secs: u64) -> Self {
        Self {
            duration_secs: Some(duration_secs),
            ..Default::default()
        }
    }
}

/// A logged behavioral event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Milliseconds on the caller's clock
    pub timestamp_ms: i64,

    /// Set when a near-duplicate occurrence was merged into this entry
    #[serde(default)]
    pub extended: bool,

    #[serde(flatten)]
    pub meta: EventMeta,
}

impl Event {
    pub fn new(kind: EventKind, timestamp_ms: i64, meta: EventMeta) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp_ms,
            extended: false,
            meta,
        }
    }
}
