//! Session archetype labels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Categorical summary of a whole session's behavioral shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionArchetype {
    LockedIn,
    ChoppyFocus,
    FatigueDrift,
    RestlessSprint,
    DistractedSpiral,
    LowSignal,
    SteadyState,
}

impl SessionArchetype {
    pub fn label(&self) -> &'static str {
        match self {
            SessionArchetype::LockedIn => "Locked In",
            SessionArchetype::ChoppyFocus => "Choppy Focus",
            SessionArchetype::FatigueDrift => "Fatigue Drift",
            SessionArchetype::RestlessSprint => "Restless Sprint",
            SessionArchetype::DistractedSpiral => "Distracted Spiral",
            SessionArchetype::LowSignal => "Low Signal",
            SessionArchetype::SteadyState => "Steady State",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SessionArchetype::LockedIn => "🎯",
            SessionArchetype::ChoppyFocus => "📊",
            SessionArchetype::FatigueDrift => "😴",
            SessionArchetype::RestlessSprint => "⚡",
            SessionArchetype::DistractedSpiral => "🌀",
            SessionArchetype::LowSignal => "📡",
            SessionArchetype::SteadyState => "⚖️",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SessionArchetype::LockedIn => "Deep work achieved",
            SessionArchetype::ChoppyFocus => "Good periods, but fragmented",
            SessionArchetype::FatigueDrift => "Started strong, faded",
            SessionArchetype::RestlessSprint => "High energy but fidgety",
            SessionArchetype::DistractedSpiral => "Attention pulled away",
            SessionArchetype::LowSignal => "Tracking unreliable",
            SessionArchetype::SteadyState => "Consistent baseline",
        }
    }
}
