//! Context mode definitions.
//!
//! A context mode describes what the user is doing, which changes how the
//! engine weighs its penalties:
//!
//! - `Coding`: stability matters, short look-aways are tolerated
//! - `Reading`: balanced, eyes-on-text weighting
//! - `Meeting`: presence matters most, stricter distraction limits
//! - `Brainstorm`: movement and looking away are expected

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Penalty weights for the focus score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FocusWeights {
    pub face: f64,
    pub away: f64,
    pub head: f64,
    pub gaze: f64,
}

/// Penalty weights for the energy score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnergyWeights {
    pub ear: f64,
    pub blink: f64,
    pub motion: f64,
    pub yawn: f64,
}

/// Penalty weights for the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfidenceWeights {
    pub face: f64,
    pub engage: f64,
    pub down: f64,
    pub far: f64,
    pub voice: f64,
}

/// All weight vectors for one context mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextWeights {
    pub focus: FocusWeights,
    pub energy: EnergyWeights,
    pub confidence: ConfidenceWeights,
}

/// Event-threshold adjustments for one context mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdModifiers {
    /// Seconds of look-away before a "thinking" look-away triggers
    pub look_away_thinking_trigger: u32,
    /// Seconds of low focus before a distraction block triggers
    pub distraction_trigger: u32,
    /// Scales the head-jitter bar used to call a look-away "distracted"
    pub restlessness_multiplier: f64,
}

/// What the user is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    #[default]
    Coding,
    Reading,
    Meeting,
    Brainstorm,
}

impl ContextMode {
    /// All available context modes.
    pub const ALL: &'static [ContextMode] = &[
        ContextMode::Coding,
        ContextMode::Reading,
        ContextMode::Meeting,
        ContextMode::Brainstorm,
    ];

    /// Returns the mode identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Coding => "coding",
            ContextMode::Reading => "reading",
            ContextMode::Meeting => "meeting",
            ContextMode::Brainstorm => "brainstorm",
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            ContextMode::Coding => "Coding",
            ContextMode::Reading => "Reading",
            ContextMode::Meeting => "Meeting",
            ContextMode::Brainstorm => "Brainstorm",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ContextMode::Coding => "💻",
            ContextMode::Reading => "📖",
            ContextMode::Meeting => "🎙️",
            ContextMode::Brainstorm => "🧠",
        }
    }

    /// Penalty weights applied by the score calculator.
    pub fn weights(&self) -> ContextWeights {
        match self {
            ContextMode::Coding => ContextWeights {
                focus: FocusWeights { face: 0.30, away: 0.25, head: 0.25, gaze: 0.20 },
                energy: EnergyWeights { ear: 0.40, blink: 0.25, motion: 0.20, yawn: 0.15 },
                confidence: ConfidenceWeights { face: 0.20, engage: 0.20, down: 0.25, far: 0.20, voice: 0.15 },
            },
            ContextMode::Reading => ContextWeights {
                focus: FocusWeights { face: 0.35, away: 0.35, head: 0.15, gaze: 0.15 },
                energy: EnergyWeights { ear: 0.45, blink: 0.20, motion: 0.20, yawn: 0.15 },
                confidence: ConfidenceWeights { face: 0.25, engage: 0.25, down: 0.20, far: 0.15, voice: 0.15 },
            },
            ContextMode::Meeting => ContextWeights {
                focus: FocusWeights { face: 0.40, away: 0.40, head: 0.10, gaze: 0.10 },
                energy: EnergyWeights { ear: 0.35, blink: 0.25, motion: 0.25, yawn: 0.15 },
                confidence: ConfidenceWeights { face: 0.30, engage: 0.30, down: 0.15, far: 0.10, voice: 0.15 },
            },
            ContextMode::Brainstorm => ContextWeights {
                focus: FocusWeights { face: 0.25, away: 0.20, head: 0.30, gaze: 0.25 },
                energy: EnergyWeights { ear: 0.40, blink: 0.25, motion: 0.15, yawn: 0.20 },
                confidence: ConfidenceWeights { face: 0.20, engage: 0.15, down: 0.25, far: 0.25, voice: 0.15 },
            },
        }
    }

    /// Event-threshold adjustments applied by the event detector.
    pub fn threshold_mods(&self) -> ThresholdModifiers {
        match self {
            ContextMode::Coding => ThresholdModifiers {
                look_away_thinking_trigger: 5,
                distraction_trigger: 45,
                restlessness_multiplier: 0.7,
            },
            ContextMode::Reading => ThresholdModifiers {
                look_away_thinking_trigger: 4,
                distraction_trigger: 30,
                restlessness_multiplier: 1.0,
            },
            ContextMode::Meeting => ThresholdModifiers {
                look_away_thinking_trigger: 2,
                distraction_trigger: 20,
                restlessness_multiplier: 1.2,
            },
            ContextMode::Brainstorm => ThresholdModifiers {
                look_away_thinking_trigger: 8,
                distraction_trigger: 60,
                restlessness_multiplier: 0.5,
            },
        }
    }

    /// Compact descriptor for UI collaborators.
    pub fn descriptor(&self) -> ContextModeDescriptor {
        ContextModeDescriptor {
            mode: *self,
            label: self.label().to_string(),
            emoji: self.emoji().to_string(),
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContextMode {
    type Err = ContextModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coding" => Ok(ContextMode::Coding),
            "reading" => Ok(ContextMode::Reading),
            "meeting" => Ok(ContextMode::Meeting),
            "brainstorm" => Ok(ContextMode::Brainstorm),
            _ => Err(ContextModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown context mode: {0}")]
pub struct ContextModeParseError(pub String);

/// Active context mode as reported in tick results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContextModeDescriptor {
    pub mode: ContextMode,
    pub label: String,
    pub emoji: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_modes() {
        for mode in ContextMode::ALL {
            assert_eq!(mode.as_str().parse::<ContextMode>().unwrap(), *mode);
        }
        assert_eq!("  Meeting ".parse::<ContextMode>().unwrap(), ContextMode::Meeting);
    }

    #[test]
    fn test_parse_unknown_mode() {
        let err = "gaming".parse::<ContextMode>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown context mode: gaming");
    }

    #[test]
    fn test_focus_weights_sum_to_one() {
        for mode in ContextMode::ALL {
            let w = mode.weights().focus;
            assert!((w.face + w.away + w.head + w.gaze - 1.0).abs() < 1e-9, "{}", mode);
        }
    }

    #[test]
    fn test_serde_identifier() {
        let json = serde_json::to_string(&ContextMode::Brainstorm).unwrap();
        assert_eq!(json, "\"brainstorm\"");
    }
}
