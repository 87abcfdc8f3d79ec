//! Per-second hysteresis machines for each event family.
//!
//! Every family counts consecutive qualifying seconds toward a trigger and
//! consecutive recovering seconds toward an exit. Driver statistics are
//! accumulated on the same pass.

use std::collections::VecDeque;

use mirror_models::{
    AutoTunedThresholds, Baseline, DriverStats, EventKind, EventMeta, LookAwayType, SecondMetrics,
    ThresholdModifiers,
};
use tracing::debug;

use super::log::EventLog;
use crate::config::EventThresholds;
use crate::metrics::{self, SuppressReason};
use crate::scoring::ear_drop;
use crate::stats::median;

/// One inactive/active machine.
#[derive(Debug, Clone, Copy, Default)]
struct Episode {
    /// Consecutive qualifying seconds
    count: u32,
    active: bool,
    /// Consecutive recovering seconds while active
    recover: u32,
    started_ms: Option<i64>,
}

impl Episode {
    fn activate(&mut self, timestamp_ms: i64) {
        self.active = true;
        self.started_ms = Some(timestamp_ms);
    }

    fn close(&mut self) {
        self.active = false;
        self.started_ms = None;
        self.recover = 0;
    }

    fn elapsed_secs(&self, timestamp_ms: i64) -> u64 {
        self.started_ms
            .map(|start| ((timestamp_ms - start) as f64 / 1000.0).round().max(0.0) as u64)
            .unwrap_or(0)
    }
}

/// Away/not-away flips inside a trailing window.
#[derive(Debug, Clone, Default)]
pub struct ToggleWindow {
    timestamps: VecDeque<i64>,
}

impl ToggleWindow {
    pub fn push(&mut self, timestamp_ms: i64) {
        self.timestamps.push_back(timestamp_ms);
    }

    /// Prune to the window ending at `now_ms` and test against `threshold`.
    pub fn is_spam(&mut self, now_ms: i64, window_ms: i64, threshold: usize) -> bool {
        let cutoff = now_ms - window_ms;
        while self.timestamps.front().is_some_and(|&t| t <= cutoff) {
            self.timestamps.pop_front();
        }
        self.timestamps.len() >= threshold
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Read-only inputs for one detection pass.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub baseline: &'a Baseline,
    pub tuned: &'a AutoTunedThresholds,
    pub mods: ThresholdModifiers,
    /// Rolling energy median dips are measured against
    pub energy_reference: f64,
    pub signal_quality_min: f64,
    pub toggle_spam_window_ms: i64,
    pub toggle_spam_threshold: usize,
}

/// Rolling energy reference: median of the trailing window, or the fallback
/// until enough history exists.
pub fn energy_reference<'a>(
    energies: impl DoubleEndedIterator<Item = &'a SecondMetrics>,
    thresholds: &EventThresholds,
) -> f64 {
    let window: Vec<f64> = energies
        .rev()
        .take(thresholds.energy_dip_window)
        .map(|m| m.energy as f64)
        .collect();
    if window.len() > thresholds.energy_dip_min_samples {
        median(&window)
    } else {
        thresholds.energy_dip_fallback
    }
}

/// Interpret a look-away at trigger time.
pub fn classify_look_away(
    current: &SecondMetrics,
    baseline: &Baseline,
    tuned: &AutoTunedThresholds,
    mods: &ThresholdModifiers,
) -> LookAwayType {
    let high_jitter = current.head_motion > baseline.head_jitter_base * 2.0 * mods.restlessness_multiplier
        || current.gaze_motion > baseline.gaze_jitter_base * 2.0;
    let frequent_toggles = current.away_toggle_count > 3;
    let blink_normal = tuned.blink_rate.normal;
    let abnormal_blinks = (current.blink_rate - blink_normal).abs() > blink_normal * 0.7;
    let low_energy = current.energy < 60;

    if high_jitter || frequent_toggles || (abnormal_blinks && low_energy) {
        LookAwayType::Distracted
    } else {
        LookAwayType::Thinking
    }
}

/// Bank of event state machines plus session driver statistics.
#[derive(Debug, Clone)]
pub struct EventDetector {
    thresholds: EventThresholds,
    face_lost: Episode,
    look_away: Episode,
    look_away_type: Option<LookAwayType>,
    focus_streak: Episode,
    distraction: Episode,
    energy_dip: Episode,
    low_signal: bool,
    toggles: ToggleWindow,
    stats: DriverStats,
}

impl EventDetector {
    pub fn new(thresholds: EventThresholds) -> Self {
        Self {
            thresholds,
            face_lost: Episode::default(),
            look_away: Episode::default(),
            look_away_type: None,
            focus_streak: Episode::default(),
            distraction: Episode::default(),
            energy_dip: Episode::default(),
            low_signal: false,
            toggles: ToggleWindow::default(),
            stats: DriverStats::default(),
        }
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn focus_streak_active(&self) -> bool {
        self.focus_streak.active
    }

    pub fn distraction_active(&self) -> bool {
        self.distraction.active
    }

    pub fn energy_dip_active(&self) -> bool {
        self.energy_dip.active
    }

    pub fn face_lost_active(&self) -> bool {
        self.face_lost.active
    }

    /// Type of the active look-away, if any.
    pub fn active_look_away(&self) -> Option<LookAwayType> {
        if self.look_away.active {
            self.look_away_type
        } else {
            None
        }
    }

    /// Count one away-state flip from the frame stream.
    pub fn record_toggle(&mut self, timestamp_ms: i64) {
        self.stats.away_toggle_count += 1;
        self.toggles.push(timestamp_ms);
    }

    /// Run every machine over one aggregated second.
    pub fn detect(&mut self, current: &SecondMetrics, ctx: &DetectionContext<'_>, log: &mut EventLog) {
        let ts = current.t;

        self.detect_face_lost(current, log);
        self.detect_look_away(current, ctx, log);
        self.detect_focus_streak(current, log);
        self.detect_distraction(current, ctx, log);
        self.detect_energy_dip(current, ctx, log);

        if current.energy >= 70 {
            self.stats.energy_high_secs += 1;
        }
        if current.energy < 50 {
            self.stats.energy_low_secs += 1;
        }

        if current.yawn_active {
            log.append(EventKind::Yawn, ts, EventMeta::default());
            self.stats.yawn_count += 1;
        }

        let low_signal = current.signal_quality < ctx.signal_quality_min;
        if low_signal {
            self.stats.low_signal_secs += 1;
            if !self.low_signal {
                log.append(EventKind::LowSignal, ts, EventMeta::default());
            }
        }
        self.low_signal = low_signal;

        let b = ctx.baseline;
        if current.head_motion > b.head_jitter_base * 2.5 || current.gaze_motion > b.gaze_jitter_base * 2.5 {
            self.stats.high_jitter_secs += 1;
        }
        if ear_drop(current.ear, b) > 0.15 {
            self.stats.ear_drop_secs += 1;
        }

        self.stats.total_seconds += 1;
    }

    fn detect_face_lost(&mut self, current: &SecondMetrics, log: &mut EventLog) {
        let t = &self.thresholds;
        let st = &mut self.face_lost;

        if !current.face_present {
            st.count += 1;
            st.recover = 0;
            if !st.active && st.count >= t.face_lost_trigger {
                log.append(EventKind::FaceLostStart, current.t, EventMeta::default());
                st.activate(current.t);
            }
            return;
        }

        if st.active {
            st.recover += 1;
            if st.recover >= t.face_lost_recover {
                log.append(
                    EventKind::FaceLostEnd,
                    current.t,
                    EventMeta::with_duration(st.count as u64),
                );
                st.close();
            }
        }
        st.count = 0;
    }

    fn detect_look_away(&mut self, current: &SecondMetrics, ctx: &DetectionContext<'_>, log: &mut EventLog) {
        let t = &self.thresholds;

        if current.away_ratio > t.look_away_ratio_high {
            self.look_away.count += 1;
            self.look_away.recover = 0;

            let counted = if self.look_away.active {
                self.look_away_type
            } else {
                let kind = classify_look_away(current, ctx.baseline, ctx.tuned, &ctx.mods);
                let trigger = match kind {
                    LookAwayType::Thinking if ctx.mods.look_away_thinking_trigger > 0 => {
                        ctx.mods.look_away_thinking_trigger
                    }
                    LookAwayType::Thinking => t.look_away_thinking_trigger,
                    LookAwayType::Distracted => t.look_away_trigger,
                };

                if self.look_away.count >= trigger {
                    let spam = self.toggles.is_spam(
                        current.t,
                        ctx.toggle_spam_window_ms,
                        ctx.toggle_spam_threshold,
                    );
                    if kind == LookAwayType::Distracted && !spam {
                        debug!("Distracted look-away without toggle spam, not logged");
                        metrics::record_event_suppressed(kind.start_kind(), SuppressReason::ToggleSpam);
                    } else {
                        self.look_away_type = Some(kind);
                        log.append(kind.start_kind(), current.t, EventMeta::default());
                        self.look_away.activate(current.t);
                    }
                    Some(kind)
                } else {
                    None
                }
            };

            match counted {
                Some(LookAwayType::Distracted) => self.stats.look_away_distracted_secs += 1,
                Some(LookAwayType::Thinking) => self.stats.look_away_thinking_secs += 1,
                None => {}
            }
        } else if current.away_ratio < t.look_away_ratio_low {
            if self.look_away.active {
                self.look_away.recover += 1;
                if self.look_away.recover >= t.look_away_recover {
                    if let Some(kind) = self.look_away_type {
                        let meta = EventMeta {
                            duration_secs: Some(self.look_away.count as u64),
                            look_away_type: Some(kind),
                            ..Default::default()
                        };
                        log.append(kind.end_kind(), current.t, meta);
                    }
                    self.look_away.close();
                    self.look_away_type = None;
                }
            }
            self.look_away.count = 0;
        }
    }

    fn detect_focus_streak(&mut self, current: &SecondMetrics, log: &mut EventLog) {
        let t = &self.thresholds;
        let st = &mut self.focus_streak;

        if current.focus >= t.focus_streak_threshold {
            st.count += 1;
            st.recover = 0;
            self.stats.focus_high_secs += 1;
            if !st.active && st.count >= t.focus_streak_trigger {
                log.append(EventKind::FocusStreakStart, current.t, EventMeta::default());
                st.activate(current.t);
            }
        } else {
            st.count = 0;
        }

        if st.active && current.focus < t.focus_streak_break_threshold {
            st.recover += 1;
            if st.recover >= t.focus_streak_break_duration {
                let duration = st.elapsed_secs(current.t);
                log.append(
                    EventKind::FocusStreakEnd,
                    current.t,
                    EventMeta::with_duration(duration),
                );
                st.close();
            }
        } else if st.active {
            st.recover = 0;
        }
    }

    fn detect_distraction(&mut self, current: &SecondMetrics, ctx: &DetectionContext<'_>, log: &mut EventLog) {
        let t = &self.thresholds;
        let st = &mut self.distraction;
        let trigger = if ctx.mods.distraction_trigger > 0 {
            ctx.mods.distraction_trigger
        } else {
            t.distraction_trigger
        };

        if current.focus <= t.distraction_threshold {
            st.count += 1;
            st.recover = 0;
            self.stats.focus_low_secs += 1;
            if !st.active && st.count >= trigger {
                log.append(EventKind::DistractionStart, current.t, EventMeta::default());
                st.activate(current.t);
            }
        } else {
            st.count = 0;
        }

        if st.active && current.focus >= t.distraction_recover_threshold {
            st.recover += 1;
            if st.recover >= t.distraction_recover_duration {
                let duration = st.elapsed_secs(current.t);
                log.append(
                    EventKind::DistractionEnd,
                    current.t,
                    EventMeta::with_duration(duration),
                );
                st.close();
            }
        } else if st.active {
            st.recover = 0;
        }
    }

    fn detect_energy_dip(&mut self, current: &SecondMetrics, ctx: &DetectionContext<'_>, log: &mut EventLog) {
        let t = &self.thresholds;
        let st = &mut self.energy_dip;
        let energy = current.energy as f64;

        if energy < ctx.energy_reference - t.energy_dip_delta {
            st.count += 1;
            self.stats.energy_dip_secs += 1;
            if !st.active && st.count >= t.energy_dip_trigger {
                let meta = EventMeta {
                    energy_baseline: Some(ctx.energy_reference),
                    energy_current: Some(energy),
                    ..Default::default()
                };
                log.append(EventKind::EnergyDipStart, current.t, meta);
                st.activate(current.t);
            }
            return;
        }

        if st.active {
            let duration = st.elapsed_secs(current.t);
            log.append(
                EventKind::EnergyDipEnd,
                current.t,
                EventMeta::with_duration(duration),
            );
            st.close();
        }
        st.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use mirror_models::ContextMode;

    fn second(t: i64) -> SecondMetrics {
        SecondMetrics {
            t,
            focus: 75,
            energy: 75,
            confidence: 75,
            away_ratio: 0.0,
            face_present: true,
            ear: 0.25,
            blink_rate: 15.0,
            yawn_active: false,
            speaking: false,
            head_motion: 0.0,
            gaze_motion: 0.0,
            signal_quality: 100.0,
            away_toggle_count: 0,
        }
    }

    struct Harness {
        detector: EventDetector,
        log: EventLog,
        baseline: Baseline,
        tuned: AutoTunedThresholds,
        mode: ContextMode,
    }

    impl Harness {
        fn new(mode: ContextMode) -> Self {
            let config = EngineConfig::default();
            Self {
                detector: EventDetector::new(config.events.clone()),
                log: EventLog::new(&config),
                baseline: Baseline::default(),
                tuned: AutoTunedThresholds::default(),
                mode,
            }
        }

        fn tick(&mut self, current: SecondMetrics) {
            let ctx = DetectionContext {
                baseline: &self.baseline,
                tuned: &self.tuned,
                mods: self.mode.threshold_mods(),
                energy_reference: 75.0,
                signal_quality_min: 50.0,
                toggle_spam_window_ms: 30_000,
                toggle_spam_threshold: 3,
            };
            self.detector.detect(&current, &ctx, &mut self.log);
        }

        fn kinds(&self) -> Vec<EventKind> {
            self.log.iter().map(|e| e.kind).collect()
        }
    }

    #[test]
    fn test_face_lost_start_and_end() {
        let mut h = Harness::new(ContextMode::Coding);
        for t in 1..=3 {
            h.tick(SecondMetrics {
                face_present: false,
                away_ratio: 1.0,
                ..second(t * 1_000)
            });
        }
        h.tick(second(4_000));
        assert_eq!(h.kinds(), vec![EventKind::FaceLostStart, EventKind::FaceLostEnd]);
        let end = h.log.recent(1);
        assert_eq!(end[0].meta.duration_secs, Some(3));
        assert!(!h.detector.face_lost_active());
    }

    #[test]
    fn test_thinking_look_away_uses_context_trigger() {
        let mut h = Harness::new(ContextMode::Meeting);
        let away = |t| SecondMetrics {
            away_ratio: 0.9,
            ..second(t)
        };
        h.tick(away(1_000));
        assert!(h.kinds().is_empty());
        h.tick(away(2_000));
        assert_eq!(h.kinds(), vec![EventKind::LookAwayThinkingStart]);
        assert_eq!(h.detector.active_look_away(), Some(LookAwayType::Thinking));

        h.tick(second(3_000));
        assert_eq!(h.kinds().last(), Some(&EventKind::LookAwayThinkingEnd));
        assert_eq!(h.detector.stats().look_away_thinking_secs, 1);
    }

    #[test]
    fn test_distracted_without_spam_is_counted_not_logged() {
        let mut h = Harness::new(ContextMode::Coding);
        let jittery = |t| SecondMetrics {
            away_ratio: 0.9,
            head_motion: 1.0,
            ..second(t)
        };
        h.tick(jittery(1_000));
        h.tick(jittery(2_000));
        assert!(h.kinds().is_empty());
        assert_eq!(h.detector.stats().look_away_distracted_secs, 2);
        assert_eq!(h.detector.active_look_away(), None);
    }

    #[test]
    fn test_distracted_with_spam_is_logged() {
        let mut h = Harness::new(ContextMode::Coding);
        for t in [100, 300, 500] {
            h.detector.record_toggle(t);
        }
        h.tick(SecondMetrics {
            away_ratio: 0.9,
            head_motion: 1.0,
            ..second(1_000)
        });
        assert_eq!(h.kinds(), vec![EventKind::LookAwayDistractedStart]);
        assert_eq!(h.detector.stats().away_toggle_count, 3);
    }

    #[test]
    fn test_focus_streak_lifecycle() {
        let mut h = Harness::new(ContextMode::Coding);
        for i in 1..=120 {
            h.tick(SecondMetrics {
                focus: 90,
                ..second(i * 1_000)
            });
        }
        assert!(h.detector.focus_streak_active());
        for i in 121..=130 {
            h.tick(SecondMetrics {
                focus: 60,
                ..second(i * 1_000)
            });
        }
        assert!(!h.detector.focus_streak_active());
        let end = h.log.recent(1);
        assert_eq!(end[0].kind, EventKind::FocusStreakEnd);
        assert_eq!(end[0].meta.duration_secs, Some(10));
        assert_eq!(h.detector.stats().focus_high_secs, 120);
    }

    #[test]
    fn test_energy_dip_ends_immediately() {
        let mut h = Harness::new(ContextMode::Coding);
        h.detector.thresholds.energy_dip_trigger = 2;
        h.tick(SecondMetrics { energy: 40, ..second(1_000) });
        h.tick(SecondMetrics { energy: 40, ..second(2_000) });
        assert!(h.detector.energy_dip_active());
        h.tick(second(3_000));
        assert!(!h.detector.energy_dip_active());
        assert_eq!(h.kinds(), vec![EventKind::EnergyDipStart, EventKind::EnergyDipEnd]);
        assert_eq!(h.detector.stats().energy_dip_secs, 2);
    }

    #[test]
    fn test_low_signal_rising_edge() {
        let mut h = Harness::new(ContextMode::Coding);
        for t in 1..=3 {
            h.tick(SecondMetrics {
                signal_quality: 30.0,
                ..second(t * 1_000)
            });
        }
        assert_eq!(h.kinds(), vec![EventKind::LowSignal]);
        assert_eq!(h.detector.stats().low_signal_secs, 3);
    }

    #[test]
    fn test_energy_reference_fallback_until_history() {
        let thresholds = EventThresholds::default();
        let history: Vec<SecondMetrics> = (0..60).map(|i| SecondMetrics { energy: 40, ..second(i) }).collect();
        assert_eq!(energy_reference(history.iter(), &thresholds), 75.0);

        let history: Vec<SecondMetrics> = (0..61).map(|i| SecondMetrics { energy: 40, ..second(i) }).collect();
        assert_eq!(energy_reference(history.iter(), &thresholds), 40.0);
    }

    #[test]
    fn test_toggle_window_prunes() {
        let mut window = ToggleWindow::default();
        window.push(0);
        window.push(10_000);
        window.push(20_000);
        assert!(window.is_spam(29_999, 30_000, 3));
        assert!(!window.is_spam(30_000, 30_000, 3));
        assert_eq!(window.len(), 2);
    }
}
