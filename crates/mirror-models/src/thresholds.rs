//! Auto-tuned thresholds learned from rolling history.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlinkRateBand {
    pub low: f64,
    pub high: f64,
    pub normal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GazeToleranceBand {
    pub normal: f64,
    pub extended: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HeadJitterBand {
    pub normal: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EarDropBand {
    pub mild: f64,
    pub fatigue: f64,
}

/// Thresholds the score calculator and event detector read.
///
/// Starts at static defaults and is overwritten by each auto-tune pass.
/// Survives session resets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AutoTunedThresholds {
    pub blink_rate: BlinkRateBand,
    pub gaze_tolerance: GazeToleranceBand,
    pub head_jitter: HeadJitterBand,
    pub ear_drop: EarDropBand,
    /// Number of completed auto-tune passes
    #[serde(default)]
    pub passes: u32,
}

impl Default for AutoTunedThresholds {
    fn default() -> Self {
        Self {
            blink_rate: BlinkRateBand {
                low: 10.0,
                high: 25.0,
                normal: 15.0,
            },
            gaze_tolerance: GazeToleranceBand {
                normal: 0.08,
                extended: 0.12,
            },
            head_jitter: HeadJitterBand {
                normal: 0.02,
                high: 0.05,
            },
            ear_drop: EarDropBand {
                mild: 0.08,
                fatigue: 0.20,
            },
            passes: 0,
        }
    }
}
