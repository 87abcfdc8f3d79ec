//! Daily report models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::archetype::SessionArchetype;
use crate::context::ContextMode;
use crate::driver::{Driver, DriverScores};

/// One ~60-second window of session history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MinuteBucket {
    pub start_time_ms: i64,
    pub focus_avg: f64,
    pub energy_avg: f64,
    pub conf_avg: f64,
    pub signal_avg: f64,
    /// Seconds with away-ratio above one half
    pub away_time: u32,
    /// Seconds with no face
    pub face_lost: u32,
}

/// A reconstructed START/END episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventSegment {
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_secs: f64,
}

/// Episodes grouped by family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportSegments {
    pub focus_streaks: Vec<EventSegment>,
    pub distractions: Vec<EventSegment>,
    pub energy_dips: Vec<EventSegment>,
    pub look_away_thinking: Vec<EventSegment>,
    pub look_away_distracted: Vec<EventSegment>,
}

/// Headline numbers for a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportStats {
    pub total_minutes: u32,
    pub avg_focus: u8,
    pub avg_energy: u8,
    pub avg_confidence: u8,
    pub avg_signal_quality: u8,
    pub focus_streaks: u32,
    pub distraction_blocks: u32,
    pub thinking_look_aways: u32,
    pub distracted_look_aways: u32,
    pub yawns: u64,
    pub context_mode: ContextMode,
}

/// A generated report. Reports with `insufficient_data` carry no stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub insufficient_data: bool,
    pub summary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ReportStats>,
    pub segments: ReportSegments,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drivers: Option<DriverScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_driver: Option<Driver>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype: Option<SessionArchetype>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub minutes: Vec<MinuteBucket>,
}

impl Report {
    /// Sentinel report for sessions too short to summarize.
    pub fn insufficient(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            insufficient_data: true,
            summary: vec!["Not enough data for report. Record at least 1 minute.".to_string()],
            stats: None,
            segments: ReportSegments::default(),
            drivers: None,
            highest_driver: None,
            archetype: None,
            driver_explanation: None,
            recommendation: None,
            minutes: Vec::new(),
        }
    }
}
