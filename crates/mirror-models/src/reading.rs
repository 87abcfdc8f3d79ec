//! Externally recorded readings and session summaries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A score reading as recorded by the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reading {
    pub focus: f64,
    pub energy: f64,
    pub confidence: f64,
    #[serde(default)]
    pub face_detected: bool,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// End-of-session summary stored alongside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionSummary {
    pub duration_secs: u64,
    pub total_readings: usize,
    pub avg_confidence: f64,
    pub avg_focus: f64,
    pub avg_energy: f64,
    pub insights: Vec<String>,
}
