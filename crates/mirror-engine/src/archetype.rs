//! Session archetype classification.

use mirror_models::{DriverStats, SecondMetrics, SessionArchetype};

use crate::stats::mean;

/// Samples each half of the history needs before fatigue drift is considered.
const DRIFT_MIN_HALF: usize = 30;

/// Classify a session. Pure over the driver stats and per-second history;
/// rules are checked in order and the first match wins.
pub fn classify(stats: &DriverStats, history: &[SecondMetrics]) -> SessionArchetype {
    let focus_high = stats.focus_high_ratio();
    let focus_low = stats.focus_low_ratio();
    let distracted = stats.distraction_ratio();

    if stats.low_signal_ratio() > 0.3 {
        return SessionArchetype::LowSignal;
    }
    if focus_high > 0.6 && distracted < 0.1 {
        return SessionArchetype::LockedIn;
    }
    if distracted > 0.3 || focus_low > 0.4 {
        return SessionArchetype::DistractedSpiral;
    }
    if is_fatigue_drift(history) {
        return SessionArchetype::FatigueDrift;
    }
    if stats.jitter_ratio() > 0.3 && stats.energy_high_ratio() > 0.4 {
        return SessionArchetype::RestlessSprint;
    }
    if focus_high > 0.3 && focus_low > 0.2 {
        return SessionArchetype::ChoppyFocus;
    }
    SessionArchetype::SteadyState
}

fn is_fatigue_drift(history: &[SecondMetrics]) -> bool {
    let (first, second) = history.split_at(history.len() / 2);
    if first.len() < DRIFT_MIN_HALF || second.len() < DRIFT_MIN_HALF {
        return false;
    }
    let avg = |half: &[SecondMetrics]| mean(&half.iter().map(|m| m.energy as f64).collect::<Vec<_>>());
    avg(first) > 70.0 && avg(second) < 55.0
}
