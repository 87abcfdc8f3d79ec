//! The per-session analysis engine.
//!
//! One [`AnalysisEngine`] owns every piece of state for a session. It is
//! advanced by two calls driven by the caller's clock: [`AnalysisEngine::process_frame`]
//! for each captured frame and [`AnalysisEngine::process_second`] once per
//! wall-clock second. There is no internal locking; callers keep a single
//! writer.

use std::collections::VecDeque;

use chrono::Utc;
use mirror_models::{
    AutoTunedThresholds, Baseline, CalibrationPhase, CalibrationPlan, CalibrationProgress, CalibrationStatus,
    ContextMode, DriverStats, Event, EventKind, EventMeta, MetricsSnapshot, Report, Scores, SecondMetrics,
    SignalQuality, TickResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accumulator::{FrameAccumulator, SecondAggregate};
use crate::auto_tune::{self, HistoryBuffer};
use crate::calibration::{CalibrationController, CalibrationOutcome, CalibrationSample};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::events::{energy_reference, DetectionContext, EventDetector, EventLog};
use crate::features::FrameFeatures;
use crate::landmarks::LandmarkFrame;
use crate::metrics;
use crate::observed::{self, ObservedInputs};
use crate::report::{self, ReportInput, ReportMemory};
use crate::scoring::{self, ConfidenceInputs, EnergyInputs, FocusInputs};
use crate::signal_quality;
use crate::smoothing::{BlinkDetector, MotionTracker, YawnDetector};
use crate::stats::{clamp, ema};

/// State that outlives a session: learning history, tuned thresholds and
/// past reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentState {
    pub history: HistoryBuffer,
    pub auto_tuned: AutoTunedThresholds,
    pub report_memory: ReportMemory,
}

impl PersistentState {
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Face-landmark behavioral analysis for a single session.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: EngineConfig,
    context_mode: ContextMode,
    baseline: Baseline,
    calibration: CalibrationController,

    blink: BlinkDetector,
    yawn: YawnDetector,
    motion: MotionTracker,
    accumulator: FrameAccumulator,

    scores: Scores,
    head_motion_ema: f64,
    gaze_motion_ema: f64,
    signal_quality: SignalQuality,

    detector: EventDetector,
    events: EventLog,
    second_metrics: VecDeque<SecondMetrics>,

    history: HistoryBuffer,
    auto_tuned: AutoTunedThresholds,
    report_memory: ReportMemory,

    /// Latest timestamp seen from either call
    clock_ms: i64,
    last_tick_ms: Option<i64>,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl AnalysisEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an engine from `MIRROR_*` environment overrides.
    pub fn from_env() -> EngineResult<Self> {
        Self::new(EngineConfig::from_env())
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            context_mode: ContextMode::default(),
            baseline: Baseline::default(),
            calibration: CalibrationController::new(config.calibration.clone()),
            blink: BlinkDetector::new(config.blink_min_frames, config.blink_window_ms),
            yawn: YawnDetector::new(config.yawn_duration_ms),
            motion: MotionTracker::default(),
            accumulator: FrameAccumulator::default(),
            scores: Scores::default(),
            head_motion_ema: 0.0,
            gaze_motion_ema: 0.0,
            signal_quality: SignalQuality::default(),
            detector: EventDetector::new(config.events.clone()),
            events: EventLog::new(&config),
            second_metrics: VecDeque::with_capacity(config.second_metrics_capacity),
            history: HistoryBuffer::default(),
            auto_tuned: AutoTunedThresholds::default(),
            report_memory: ReportMemory::default(),
            clock_ms: 0,
            last_tick_ms: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ============================================================================
    // Frame and tick processing
    // ============================================================================

    /// Feed one captured frame. `None` and short landmark sequences count as
    /// a frame without a face.
    pub fn process_frame(&mut self, frame: Option<&LandmarkFrame>, timestamp_ms: i64) {
        self.clock_ms = timestamp_ms;

        let Some(frame) = frame.filter(|f| f.len() >= self.config.min_face_points) else {
            self.accumulator.record_absent();
            let blink_rate = self.blink.rate();
            if let Some(outcome) = self.calibration.observe(None, timestamp_ms, blink_rate) {
                self.apply_calibration_outcome(outcome, timestamp_ms);
            }
            return;
        };

        let features = FrameFeatures::extract(frame);
        let motion = self.motion.update(features.nose_tip, features.gaze.gaze, timestamp_ms);

        let b = &self.baseline;
        let away = (features.gaze.gaze - b.gaze_center).abs() > b.gaze_off_threshold
            || (features.head_yaw - b.head_yaw_base).abs() > b.head_yaw_off_threshold;
        if self.accumulator.record_face(&features, motion, away) {
            self.detector.record_toggle(timestamp_ms);
        }

        self.blink.update(features.ear, self.baseline.ear_thresh, timestamp_ms);
        if self.yawn.update(features.mar, self.baseline.mar_thresh, timestamp_ms) {
            self.accumulator.record_yawn();
        }

        let sample = CalibrationSample {
            ear: features.ear,
            head_motion: motion.head,
            gaze_motion: motion.gaze,
            face_size: features.face_size,
            head_down: features.head_down,
            gaze: features.gaze.gaze,
            head_yaw: features.head_yaw,
        };
        let blink_rate = self.blink.rate();
        if let Some(outcome) = self.calibration.observe(Some(&sample), timestamp_ms, blink_rate) {
            self.apply_calibration_outcome(outcome, timestamp_ms);
        }
    }

    /// Close the current second. Returns `None` when no frames arrived since
    /// the previous tick; callers skip their update for that second.
    pub fn process_second(&mut self, timestamp_ms: i64, speaking: bool, filler_rate: f64) -> Option<TickResult> {
        self.clock_ms = timestamp_ms;

        if self.accumulator.is_empty() {
            debug!(timestamp_ms, "Tick without frames");
            metrics::record_empty_tick();
            return None;
        }

        let frames = self.accumulator.take();
        let agg = frames.aggregate(&self.baseline);
        let blink_rate = self.blink.rate();

        let alpha = self.config.ema_alpha_normal;
        self.head_motion_ema = ema(self.head_motion_ema, agg.head_motion, alpha);
        self.gaze_motion_ema = ema(self.gaze_motion_ema, agg.gaze_motion, alpha);

        self.signal_quality =
            signal_quality::compute(agg.face_ratio, agg.face_size, self.head_motion_ema, &self.baseline);
        let q_total = self.signal_quality.q_total;

        if !self.calibration.is_calibrating() {
            self.update_scores(&agg, blink_rate, speaking, filler_rate, q_total);
            if q_total >= self.config.drift_quality_min {
                self.apply_drift(&agg);
            }
        }

        self.history.push(
            blink_rate,
            self.gaze_motion_ema,
            self.head_motion_ema,
            agg.ear,
            self.config.history_capacity,
        );
        if self.detector.stats().total_seconds % self.config.auto_tune_interval == 0 {
            self.run_auto_tune();
        }

        let current = SecondMetrics {
            t: timestamp_ms,
            focus: self.scores.focus,
            energy: self.scores.energy,
            confidence: self.scores.confidence,
            away_ratio: agg.away_ratio,
            face_present: agg.face_present,
            ear: agg.ear,
            blink_rate,
            yawn_active: agg.yawn_active,
            speaking,
            head_motion: self.head_motion_ema,
            gaze_motion: self.gaze_motion_ema,
            signal_quality: q_total,
            away_toggle_count: agg.away_toggles,
        };
        self.second_metrics.push_back(current);
        while self.second_metrics.len() > self.config.second_metrics_capacity {
            self.second_metrics.pop_front();
        }

        let ctx = DetectionContext {
            baseline: &self.baseline,
            tuned: &self.auto_tuned,
            mods: self.context_mode.threshold_mods(),
            energy_reference: energy_reference(self.second_metrics.iter(), &self.config.events),
            signal_quality_min: self.config.signal_quality_min,
            toggle_spam_window_ms: self.config.toggle_spam_window_ms,
            toggle_spam_threshold: self.config.toggle_spam_threshold,
        };
        self.detector.detect(&current, &ctx, &mut self.events);

        let observed_mode = observed::classify(&ObservedInputs {
            scores: self.scores,
            quality: self.signal_quality,
            face_present: agg.face_present,
            focus_streak_active: self.detector.focus_streak_active(),
            look_away: self.detector.active_look_away(),
            distraction_active: self.detector.distraction_active(),
            energy_dip_active: self.detector.energy_dip_active(),
        });

        metrics::record_tick(q_total);

        Some(TickResult {
            timestamp_ms,
            scores: self.scores,
            observed_mode,
            signal_quality: self.signal_quality,
            context_mode: self.context_mode.descriptor(),
            metrics: MetricsSnapshot {
                ear: agg.ear,
                blink_rate,
                away_ratio: agg.away_ratio,
                head_motion: self.head_motion_ema,
                gaze_motion: self.gaze_motion_ema,
                face_size: agg.face_size,
                iris_available: frames.iris_available,
            },
            face_detected: agg.face_present,
            is_calibrated: self.calibration.is_calibrated(),
            is_calibrating: self.calibration.is_calibrating(),
            calibration_phase: self.calibration.phase(),
            events: self.events.recent(self.config.tick_event_slice),
        })
    }

    /// Single-call driver: process a frame and tick once at least a second
    /// has passed since the previous tick.
    pub fn analyze(&mut self, frame: Option<&LandmarkFrame>, timestamp_ms: i64) -> Option<TickResult> {
        self.process_frame(frame, timestamp_ms);

        let due = self.last_tick_ms.map_or(true, |last| timestamp_ms - last >= 1_000);
        if !due {
            return None;
        }
        self.last_tick_ms = Some(timestamp_ms);
        self.process_second(timestamp_ms, false, 0.0)
    }

    fn update_scores(&mut self, agg: &SecondAggregate, blink_rate: f64, speaking: bool, filler_rate: f64, q_total: f64) {
        let weights = self.context_mode.weights();
        let alpha = if q_total >= self.config.signal_quality_min {
            self.config.ema_alpha_normal
        } else {
            self.config.ema_alpha_low_signal
        };

        let focus = scoring::focus_raw(
            &FocusInputs {
                face_present: agg.face_present,
                away_ratio: agg.away_ratio,
                head_motion_ema: self.head_motion_ema,
                gaze_motion_ema: self.gaze_motion_ema,
            },
            &self.baseline,
            &self.auto_tuned,
            &weights.focus,
        );
        let energy = scoring::energy_raw(
            &EnergyInputs {
                ear: agg.ear,
                blink_rate,
                yawn_active: agg.yawn_active,
                head_motion_ema: self.head_motion_ema,
            },
            &self.baseline,
            &self.auto_tuned,
            &weights.energy,
        );
        let confidence = scoring::confidence_raw(
            &ConfidenceInputs {
                face_present: agg.face_present,
                away_ratio: agg.away_ratio,
                head_down: agg.head_down,
                face_size: agg.face_size,
                speaking,
                filler_rate,
            },
            &self.baseline,
            &weights.confidence,
        );

        let smooth = |prev: u8, raw: f64| clamp(ema(prev as f64, raw, alpha).round(), 0.0, 100.0) as u8;
        self.scores = Scores {
            focus: smooth(self.scores.focus, focus),
            energy: smooth(self.scores.energy, energy),
            confidence: smooth(self.scores.confidence, confidence),
        };
    }

    /// Nudge the baseline toward the current second when it looks stable.
    fn apply_drift(&mut self, agg: &SecondAggregate) {
        let b = &mut self.baseline;
        let stable = agg.face_present
            && agg.away_ratio < 0.20
            && self.scores.focus > 80
            && self.head_motion_ema < b.head_jitter_base * 1.5;
        if !stable {
            return;
        }

        let alpha = self.config.drift_alpha;
        b.ear_base = ema(b.ear_base, agg.ear, alpha);
        b.gaze_center = ema(b.gaze_center, agg.gaze, alpha);
        b.head_jitter_base = ema(b.head_jitter_base, self.head_motion_ema, alpha);
        b.face_size_base = ema(b.face_size_base, agg.face_size, alpha);
        b.ear_thresh = Baseline::derived_ear_thresh(b.ear_base, b.ear_sd);
    }

    fn run_auto_tune(&mut self) {
        if let Some(tuned) =
            auto_tune::recompute(&self.history, self.config.auto_tune_min_samples, self.auto_tuned.passes)
        {
            self.auto_tuned = tuned;
            metrics::record_auto_tune();
        }
    }

    // ============================================================================
    // Context mode
    // ============================================================================

    pub fn context_mode(&self) -> ContextMode {
        self.context_mode
    }

    /// Takes effect on the next tick.
    pub fn set_context_mode(&mut self, mode: ContextMode) {
        if mode != self.context_mode {
            info!(from = self.context_mode.as_str(), to = mode.as_str(), "Context mode changed");
        }
        self.context_mode = mode;
    }

    /// Select a mode by identifier. Unknown identifiers leave the mode unchanged.
    pub fn set_context_mode_by_name(&mut self, name: &str) -> EngineResult<()> {
        let mode: ContextMode = name.parse()?;
        self.set_context_mode(mode);
        Ok(())
    }

    // ============================================================================
    // Calibration
    // ============================================================================

    /// Begin guided calibration. The phase clock starts at the next frame.
    pub fn start_calibration(&mut self) -> CalibrationPlan {
        let plan = self.calibration.start();
        self.events
            .append(EventKind::CalibrationStart, self.clock_ms, EventMeta::default());
        plan
    }

    /// Opt out of calibration and keep the current baseline. No-op once
    /// calibration has already finished.
    pub fn skip_calibration(&mut self) {
        if self.calibration.skip() {
            self.events
                .append(EventKind::CalibrationSkipped, self.clock_ms, EventMeta::default());
            metrics::record_calibration(CalibrationPhase::Skipped);
        }
    }

    pub fn calibration_progress(&self) -> CalibrationProgress {
        self.calibration.progress(self.clock_ms)
    }

    pub fn calibration_status(&self) -> CalibrationStatus {
        CalibrationStatus {
            is_calibrated: self.calibration.is_calibrated(),
            is_calibrating: self.calibration.is_calibrating(),
            phase: self.calibration.phase(),
            baseline: self.baseline,
        }
    }

    fn apply_calibration_outcome(&mut self, outcome: CalibrationOutcome, timestamp_ms: i64) {
        match outcome {
            CalibrationOutcome::PhaseChanged(phase) => {
                debug!(phase = ?phase, timestamp_ms, "Calibration advanced");
            }
            CalibrationOutcome::Completed(baseline) => {
                self.baseline = baseline;
                let meta = EventMeta {
                    baseline: Some(baseline),
                    ..Default::default()
                };
                self.events.append(EventKind::CalibrationComplete, timestamp_ms, meta);
                metrics::record_calibration(CalibrationPhase::Complete);
            }
            CalibrationOutcome::Incomplete => {
                self.events
                    .append(EventKind::CalibrationIncomplete, timestamp_ms, EventMeta::default());
                metrics::record_calibration(CalibrationPhase::Incomplete);
            }
        }
    }

    // ============================================================================
    // Reports
    // ============================================================================

    /// Build a report over the current session and remember it for repeat
    /// detection. Low-data reports are returned but not remembered.
    pub fn generate_daily_report(&mut self) -> Report {
        let history: Vec<SecondMetrics> = self.second_metrics.iter().copied().collect();
        let events = self.events.to_vec();
        let input = ReportInput {
            history: &history,
            events: &events,
            stats: self.detector.stats(),
            context_mode: self.context_mode,
            generated_at: Utc::now(),
        };
        let report = report::generate(&input, self.report_memory.last());

        metrics::record_report(report.insufficient_data);
        if !report.insufficient_data {
            self.report_memory
                .push(report.clone(), self.config.report_memory_capacity);
        }
        report
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.to_vec()
    }

    pub fn second_metrics(&self) -> Vec<SecondMetrics> {
        self.second_metrics.iter().copied().collect()
    }

    pub fn signal_quality(&self) -> SignalQuality {
        self.signal_quality
    }

    pub fn driver_stats(&self) -> DriverStats {
        self.detector.stats().clone()
    }

    pub fn auto_tuned_thresholds(&self) -> AutoTunedThresholds {
        self.auto_tuned
    }

    pub fn report_memory(&self) -> &ReportMemory {
        &self.report_memory
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Start a new session. History, tuned thresholds, report memory,
    /// calibration and context mode carry over.
    pub fn reset(&mut self) {
        self.blink = BlinkDetector::new(self.config.blink_min_frames, self.config.blink_window_ms);
        self.yawn = YawnDetector::new(self.config.yawn_duration_ms);
        self.motion = MotionTracker::default();
        self.accumulator = FrameAccumulator::default();
        self.scores = Scores::default();
        self.head_motion_ema = 0.0;
        self.gaze_motion_ema = 0.0;
        self.signal_quality = SignalQuality::default();
        self.detector = EventDetector::new(self.config.events.clone());
        self.events.clear();
        self.second_metrics.clear();
        self.last_tick_ms = None;

        info!(
            history_samples = self.history.len(),
            reports_remembered = self.report_memory.len(),
            "Analysis session reset"
        );
    }

    pub fn persistent_state(&self) -> PersistentState {
        PersistentState {
            history: self.history.clone(),
            auto_tuned: self.auto_tuned,
            report_memory: self.report_memory.clone(),
        }
    }

    pub fn restore_persistent_state(&mut self, state: PersistentState) {
        info!(
            history_samples = state.history.len(),
            reports_remembered = state.report_memory.len(),
            auto_tune_passes = state.auto_tuned.passes,
            "Persistent state restored"
        );
        self.history = state.history;
        self.auto_tuned = state.auto_tuned;
        self.report_memory = state.report_memory;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::SyntheticFace;

    fn feed_second(engine: &mut AnalysisEngine, frame: Option<&LandmarkFrame>, second: i64) -> Option<TickResult> {
        for i in 0..10 {
            engine.process_frame(frame, second * 1_000 + i * 100);
        }
        engine.process_second(second * 1_000 + 999, false, 0.0)
    }

    #[test]
    fn test_zero_frame_tick_returns_none() {
        let mut engine = AnalysisEngine::default();
        assert!(engine.process_second(1_000, false, 0.0).is_none());
        assert!(engine.second_metrics().is_empty());
        assert_eq!(engine.driver_stats().total_seconds, 0);
    }

    #[test]
    fn test_steady_face_raises_focus() {
        let mut engine = AnalysisEngine::default();
        let frame = SyntheticFace::new().build();
        let mut last = None;
        for s in 1..=20 {
            last = feed_second(&mut engine, Some(&frame), s);
        }
        let tick = last.expect("tick");
        assert!(tick.face_detected);
        assert!(tick.scores.focus > 90);
        assert!(tick.metrics.iris_available);
        assert_eq!(engine.second_metrics().len(), 20);
    }

    #[test]
    fn test_absent_face_tick() {
        let mut engine = AnalysisEngine::default();
        let tick = feed_second(&mut engine, None, 1).expect("tick");
        assert!(!tick.face_detected);
        assert_eq!(tick.metrics.away_ratio, 1.0);
    }

    #[test]
    fn test_short_landmark_sequence_is_no_face() {
        let mut engine = AnalysisEngine::default();
        let frame = LandmarkFrame::new(SyntheticFace::new().build().points()[..399].to_vec());
        let tick = feed_second(&mut engine, Some(&frame), 1).expect("tick");
        assert!(!tick.face_detected);
    }

    #[test]
    fn test_context_mode_by_name() {
        let mut engine = AnalysisEngine::default();
        assert!(engine.set_context_mode_by_name("meeting").is_ok());
        assert_eq!(engine.context_mode(), ContextMode::Meeting);
        assert!(engine.set_context_mode_by_name("gaming").is_err());
        assert_eq!(engine.context_mode(), ContextMode::Meeting);
    }

    #[test]
    fn test_skip_calibration_is_idempotent() {
        let mut engine = AnalysisEngine::default();
        engine.skip_calibration();
        engine.skip_calibration();
        let skipped = engine
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::CalibrationSkipped)
            .count();
        assert_eq!(skipped, 1);
        assert!(engine.calibration_status().is_calibrated);
        assert_eq!(*engine.baseline(), Baseline::default());
    }

    #[test]
    fn test_analyze_ticks_once_per_second() {
        let mut engine = AnalysisEngine::default();
        let frame = SyntheticFace::new().build();
        assert!(engine.analyze(Some(&frame), 0).is_some());
        assert!(engine.analyze(Some(&frame), 500).is_none());
        assert!(engine.analyze(Some(&frame), 1_000).is_some());
    }

    #[test]
    fn test_persistent_state_json() {
        let mut engine = AnalysisEngine::default();
        let frame = SyntheticFace::new().build();
        for s in 1..=5 {
            feed_second(&mut engine, Some(&frame), s);
        }
        let json = engine.persistent_state().to_json().expect("serialize");
        let restored = PersistentState::from_json(&json).expect("deserialize");
        assert_eq!(restored.history.len(), 5);
        assert!(PersistentState::from_json("not json").is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            ema_alpha_normal: 0.0,
            ..Default::default()
        };
        assert!(AnalysisEngine::new(config).is_err());
    }
}
