//! Session driver statistics and driver scores.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-lifetime counters, reset only on explicit session reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DriverStats {
    pub total_seconds: u64,
    pub look_away_distracted_secs: u64,
    pub look_away_thinking_secs: u64,
    pub away_toggle_count: u64,
    pub energy_dip_secs: u64,
    pub yawn_count: u64,
    pub ear_drop_secs: u64,
    pub high_jitter_secs: u64,
    /// Seconds at or above the focus-streak threshold
    pub focus_high_secs: u64,
    /// Seconds at or below the distraction threshold
    pub focus_low_secs: u64,
    pub energy_high_secs: u64,
    pub energy_low_secs: u64,
    pub low_signal_secs: u64,
}

impl DriverStats {
    fn ratio(&self, secs: u64) -> f64 {
        secs as f64 / self.total_seconds.max(1) as f64
    }

    pub fn focus_high_ratio(&self) -> f64 {
        self.ratio(self.focus_high_secs)
    }

    pub fn focus_low_ratio(&self) -> f64 {
        self.ratio(self.focus_low_secs)
    }

    pub fn energy_high_ratio(&self) -> f64 {
        self.ratio(self.energy_high_secs)
    }

    pub fn energy_low_ratio(&self) -> f64 {
        self.ratio(self.energy_low_secs)
    }

    pub fn distraction_ratio(&self) -> f64 {
        self.ratio(self.look_away_distracted_secs)
    }

    pub fn jitter_ratio(&self) -> f64 {
        self.ratio(self.high_jitter_secs)
    }

    pub fn low_signal_ratio(&self) -> f64 {
        self.ratio(self.low_signal_secs)
    }

    pub fn energy_dip_ratio(&self) -> f64 {
        self.ratio(self.energy_dip_secs)
    }

    pub fn ear_drop_ratio(&self) -> f64 {
        self.ratio(self.ear_drop_secs)
    }
}

/// The three aggregate behavioral pressures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    Distraction,
    Fatigue,
    Restlessness,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Distraction => "distraction",
            Driver::Fatigue => "fatigue",
            Driver::Restlessness => "restlessness",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Driver scores, each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DriverScores {
    pub distraction: u8,
    pub fatigue: u8,
    pub restlessness: u8,
}

impl DriverScores {
    /// Blend the session counters into driver scores.
    pub fn from_stats(stats: &DriverStats) -> Self {
        let distraction = 0.5 * stats.distraction_ratio()
            + 0.5 * (stats.away_toggle_count.min(100) as f64 / 100.0);
        let fatigue = 0.4 * stats.energy_dip_ratio()
            + 0.3 * stats.ear_drop_ratio()
            + 0.3 * (stats.yawn_count.min(10) as f64 / 10.0);
        let restlessness = stats.jitter_ratio();

        Self {
            distraction: to_percent(distraction),
            fatigue: to_percent(fatigue),
            restlessness: to_percent(restlessness),
        }
    }

    /// The strongest driver; ties resolve in declaration order.
    pub fn highest(&self) -> (Driver, u8) {
        let mut best = (Driver::Distraction, self.distraction);
        for candidate in [
            (Driver::Fatigue, self.fatigue),
            (Driver::Restlessness, self.restlessness),
        ] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    }
}

fn to_percent(ratio: f64) -> u8 {
    (100.0 * ratio).round().clamp(0.0, 100.0) as u8
}
