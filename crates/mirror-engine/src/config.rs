//! Engine configuration.
//!
//! Every tunable constant of the pipeline lives here so tests and the replay
//! runner can adjust timing without touching the stages themselves.

use serde::{Deserialize, Serialize};

use mirror_models::EventKind;

use crate::error::{EngineError, EngineResult};

/// Hysteresis thresholds for the event state machines.
///
/// Durations are counted in ticks (seconds), not wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventThresholds {
    pub face_lost_trigger: u32,
    pub face_lost_recover: u32,
    /// Trigger for a distracted look-away
    pub look_away_trigger: u32,
    /// Thinking trigger used when the context mode sets none
    pub look_away_thinking_trigger: u32,
    pub look_away_recover: u32,
    pub look_away_ratio_high: f64,
    pub look_away_ratio_low: f64,
    pub focus_streak_trigger: u32,
    pub focus_streak_threshold: u8,
    pub focus_streak_break_threshold: u8,
    pub focus_streak_break_duration: u32,
    /// Distraction trigger used when the context mode sets none
    pub distraction_trigger: u32,
    pub distraction_threshold: u8,
    pub distraction_recover_threshold: u8,
    pub distraction_recover_duration: u32,
    pub energy_dip_trigger: u32,
    pub energy_dip_delta: f64,
    /// Trailing seconds of history the energy median is taken over
    pub energy_dip_window: usize,
    /// History length required before the median replaces the fallback
    pub energy_dip_min_samples: usize,
    pub energy_dip_fallback: f64,
}

impl Default for EventThresholds {
    fn default() -> Self {
        Self {
            face_lost_trigger: 2,
            face_lost_recover: 1,
            look_away_trigger: 1,
            look_away_thinking_trigger: 3,
            look_away_recover: 1,
            look_away_ratio_high: 0.60,
            look_away_ratio_low: 0.25,
            focus_streak_trigger: 120,
            focus_streak_threshold: 85,
            focus_streak_break_threshold: 70,
            focus_streak_break_duration: 10,
            distraction_trigger: 30,
            distraction_threshold: 55,
            distraction_recover_threshold: 70,
            distraction_recover_duration: 15,
            energy_dip_trigger: 120,
            energy_dip_delta: 15.0,
            energy_dip_window: 600,
            energy_dip_min_samples: 60,
            energy_dip_fallback: 75.0,
        }
    }
}

/// Minimum re-fire interval per event family, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCooldowns {
    pub look_away_thinking: u64,
    pub look_away_distracted: u64,
    pub yawn: u64,
    pub low_signal: u64,
    pub energy_dip: u64,
    pub face_lost: u64,
}

impl Default for EventCooldowns {
    fn default() -> Self {
        Self {
            look_away_thinking: 5,
            look_away_distracted: 5,
            yawn: 20,
            low_signal: 10,
            energy_dip: 60,
            face_lost: 3,
        }
    }
}

impl EventCooldowns {
    /// Cooldown for a kind in milliseconds, looked up by family.
    pub fn for_kind(&self, kind: EventKind) -> Option<i64> {
        let secs = match kind {
            EventKind::LookAwayThinkingStart | EventKind::LookAwayThinkingEnd => {
                self.look_away_thinking
            }
            EventKind::LookAwayDistractedStart | EventKind::LookAwayDistractedEnd => {
                self.look_away_distracted
            }
            EventKind::Yawn => self.yawn,
            EventKind::LowSignal => self.low_signal,
            EventKind::EnergyDipStart | EventKind::EnergyDipEnd => self.energy_dip,
            EventKind::FaceLostStart | EventKind::FaceLostEnd => self.face_lost,
            _ => return None,
        };
        (secs > 0).then(|| secs as i64 * 1000)
    }
}

/// Calibration timeline and sample requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub phase_a_ms: u64,
    pub phase_b_ms: u64,
    pub phase_c_ms: u64,
    /// Phase-A EAR samples required for a full baseline
    pub min_phase_a_samples: usize,
    /// Phase-B samples required (exclusive) to derive off-thresholds
    pub min_phase_b_samples: usize,
    /// Off-threshold multiple of the phase-B spread
    pub off_threshold_sd_multiplier: f64,
    /// Floor applied to calibrated head and gaze jitter
    pub jitter_floor: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            phase_a_ms: 15_000,
            phase_b_ms: 10_000,
            phase_c_ms: 10_000,
            min_phase_a_samples: 100,
            min_phase_b_samples: 50,
            off_threshold_sd_multiplier: 1.5,
            jitter_floor: 0.005,
        }
    }
}

impl CalibrationConfig {
    pub fn total_ms(&self) -> u64 {
        self.phase_a_ms + self.phase_b_ms + self.phase_c_ms
    }
}

/// Analysis engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consecutive low-EAR frames that make a blink
    pub blink_min_frames: u32,
    /// Trailing window for blink rate, in ms
    pub blink_window_ms: i64,
    /// Sustained high-MAR time before a yawn fires, in ms
    pub yawn_duration_ms: i64,
    pub ema_alpha_normal: f64,
    pub ema_alpha_low_signal: f64,
    pub drift_alpha: f64,
    /// Signal quality below this slows score smoothing and counts as low signal
    pub signal_quality_min: f64,
    /// Signal quality required before drift correction may run
    pub drift_quality_min: f64,
    /// Merge window for same-kind events, in ms
    pub event_merge_window_ms: i64,
    /// Recent log entries inspected for a merge candidate
    pub event_merge_lookback: usize,
    pub toggle_spam_threshold: usize,
    pub toggle_spam_window_ms: i64,
    /// Landmark sequences shorter than this are treated as no face
    pub min_face_points: usize,
    pub event_log_capacity: usize,
    pub second_metrics_capacity: usize,
    pub history_capacity: usize,
    pub report_memory_capacity: usize,
    /// Ticks between auto-tune passes
    pub auto_tune_interval: u64,
    pub auto_tune_min_samples: usize,
    /// Recent events attached to each tick result
    pub tick_event_slice: usize,
    pub events: EventThresholds,
    pub cooldowns: EventCooldowns,
    pub calibration: CalibrationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blink_min_frames: 2,
            blink_window_ms: 60_000,
            yawn_duration_ms: 1_000,
            ema_alpha_normal: 0.2,
            ema_alpha_low_signal: 0.05,
            drift_alpha: 0.005,
            signal_quality_min: 50.0,
            drift_quality_min: 70.0,
            event_merge_window_ms: 1_500,
            event_merge_lookback: 5,
            toggle_spam_threshold: 3,
            toggle_spam_window_ms: 30_000,
            min_face_points: 400,
            event_log_capacity: 200,
            second_metrics_capacity: 600,
            history_capacity: 3_600,
            report_memory_capacity: 10,
            auto_tune_interval: 300,
            auto_tune_min_samples: 300,
            tick_event_slice: 10,
            events: EventThresholds::default(),
            cooldowns: EventCooldowns::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            blink_min_frames: env_or("MIRROR_BLINK_MIN_FRAMES", defaults.blink_min_frames),
            yawn_duration_ms: env_or("MIRROR_YAWN_DURATION_MS", defaults.yawn_duration_ms),
            ema_alpha_normal: env_or("MIRROR_EMA_ALPHA", defaults.ema_alpha_normal),
            ema_alpha_low_signal: env_or(
                "MIRROR_EMA_ALPHA_LOW_SIGNAL",
                defaults.ema_alpha_low_signal,
            ),
            drift_alpha: env_or("MIRROR_DRIFT_ALPHA", defaults.drift_alpha),
            signal_quality_min: env_or("MIRROR_SIGNAL_QUALITY_MIN", defaults.signal_quality_min),
            second_metrics_capacity: env_or(
                "MIRROR_SECOND_METRICS_CAPACITY",
                defaults.second_metrics_capacity,
            ),
            history_capacity: env_or("MIRROR_HISTORY_CAPACITY", defaults.history_capacity),
            auto_tune_interval: env_or("MIRROR_AUTO_TUNE_INTERVAL", defaults.auto_tune_interval),
            ..defaults
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        for (name, alpha) in [
            ("ema_alpha_normal", self.ema_alpha_normal),
            ("ema_alpha_low_signal", self.ema_alpha_low_signal),
            ("drift_alpha", self.drift_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(EngineError::invalid_config(format!(
                    "{} must be in (0, 1], got {}",
                    name, alpha
                )));
            }
        }
        if self.blink_min_frames == 0 {
            return Err(EngineError::invalid_config("blink_min_frames must be positive"));
        }
        if self.auto_tune_interval == 0 {
            return Err(EngineError::invalid_config("auto_tune_interval must be positive"));
        }
        for (name, capacity) in [
            ("event_log_capacity", self.event_log_capacity),
            ("second_metrics_capacity", self.second_metrics_capacity),
            ("history_capacity", self.history_capacity),
            ("report_memory_capacity", self.report_memory_capacity),
        ] {
            if capacity == 0 {
                return Err(EngineError::invalid_config(format!("{} must be positive", name)));
            }
        }
        if self.events.look_away_ratio_low >= self.events.look_away_ratio_high {
            return Err(EngineError::invalid_config(
                "look_away_ratio_low must be below look_away_ratio_high",
            ));
        }
        if self.min_face_points < 400 {
            return Err(EngineError::invalid_config("min_face_points must be at least 400"));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
