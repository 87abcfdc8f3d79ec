//! Three-phase guided baseline capture.
//!
//! Phase A collects a neutral reference, phase B measures natural look-away
//! spread, phase C is an optional speaking sample. The phase clock starts at
//! the first frame observed after [`CalibrationController::start`].

use mirror_models::baseline::{GAZE_OFF_THRESH_DEFAULT, HEAD_YAW_OFF_THRESH_DEFAULT, MAR_THRESH_DEFAULT};
use mirror_models::{Baseline, CalibrationPhase, CalibrationPlan, CalibrationProgress, PhaseStep};
use tracing::{info, warn};

use crate::config::CalibrationConfig;
use crate::stats::{median, std_dev};

/// Features captured from one face frame during calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub ear: f64,
    pub head_motion: f64,
    pub gaze_motion: f64,
    pub face_size: f64,
    pub head_down: f64,
    pub gaze: f64,
    pub head_yaw: f64,
}

/// Result of advancing the controller by one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationOutcome {
    PhaseChanged(CalibrationPhase),
    Completed(Baseline),
    /// Too few phase-A samples; caller keeps its baseline
    Incomplete,
}

#[derive(Debug, Clone, Default)]
struct PhaseASamples {
    ear: Vec<f64>,
    head_motion: Vec<f64>,
    gaze_motion: Vec<f64>,
    face_size: Vec<f64>,
    head_down: Vec<f64>,
    gaze: Vec<f64>,
    head_yaw: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
struct PhaseBSamples {
    gaze: Vec<f64>,
    head_yaw: Vec<f64>,
}

/// Calibration state machine.
#[derive(Debug, Clone)]
pub struct CalibrationController {
    config: CalibrationConfig,
    phase: CalibrationPhase,
    phase_started_ms: Option<i64>,
    phase_a: PhaseASamples,
    phase_b: PhaseBSamples,
}

impl CalibrationController {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            phase: CalibrationPhase::Idle,
            phase_started_ms: None,
            phase_a: PhaseASamples::default(),
            phase_b: PhaseBSamples::default(),
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_calibrating(&self) -> bool {
        self.phase.is_active()
    }

    pub fn is_calibrated(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Begin phase A with empty sample sets. Restarts an active run.
    pub fn start(&mut self) -> CalibrationPlan {
        self.phase = CalibrationPhase::PhaseA;
        self.phase_started_ms = None;
        self.phase_a = PhaseASamples::default();
        self.phase_b = PhaseBSamples::default();
        info!("Calibration started");
        self.plan()
    }

    /// The fixed phase timeline.
    pub fn plan(&self) -> CalibrationPlan {
        let step = |phase: CalibrationPhase, duration_ms: u64| PhaseStep {
            phase,
            duration_ms,
            instruction: phase.instruction().unwrap_or_default().to_string(),
        };
        CalibrationPlan {
            phases: vec![
                step(CalibrationPhase::PhaseA, self.config.phase_a_ms),
                step(CalibrationPhase::PhaseB, self.config.phase_b_ms),
                step(CalibrationPhase::PhaseC, self.config.phase_c_ms),
            ],
            total_duration_ms: self.config.total_ms(),
        }
    }

    /// Opt out. Returns false when nothing changed (already terminal).
    ///
    /// Collected samples are discarded; the caller's baseline is untouched.
    pub fn skip(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = CalibrationPhase::Skipped;
        self.phase_started_ms = None;
        info!("Calibration skipped");
        true
    }

    /// Advance by one frame. `sample` is `None` for frames without a face.
    pub fn observe(
        &mut self,
        sample: Option<&CalibrationSample>,
        timestamp_ms: i64,
        blink_rate: f64,
    ) -> Option<CalibrationOutcome> {
        if !self.phase.is_active() {
            return None;
        }
        let started = *self.phase_started_ms.get_or_insert(timestamp_ms);
        let elapsed = (timestamp_ms - started).max(0) as u64;

        match self.phase {
            CalibrationPhase::PhaseA => {
                if let Some(s) = sample {
                    let a = &mut self.phase_a;
                    a.ear.push(s.ear);
                    a.head_motion.push(s.head_motion);
                    a.gaze_motion.push(s.gaze_motion);
                    a.face_size.push(s.face_size);
                    a.head_down.push(s.head_down);
                    a.gaze.push(s.gaze);
                    a.head_yaw.push(s.head_yaw);
                }
                (elapsed >= self.config.phase_a_ms)
                    .then(|| self.enter(CalibrationPhase::PhaseB, timestamp_ms))
            }
            CalibrationPhase::PhaseB => {
                if let Some(s) = sample {
                    self.phase_b.gaze.push(s.gaze);
                    self.phase_b.head_yaw.push(s.head_yaw);
                }
                (elapsed >= self.config.phase_b_ms)
                    .then(|| self.enter(CalibrationPhase::PhaseC, timestamp_ms))
            }
            CalibrationPhase::PhaseC => {
                (elapsed >= self.config.phase_c_ms).then(|| self.finish(blink_rate))
            }
            _ => None,
        }
    }

    /// Percent of the full timeline plus the current instruction.
    pub fn progress(&self, now_ms: i64) -> CalibrationProgress {
        if !self.phase.is_active() {
            return CalibrationProgress {
                progress: 0.0,
                phase: self.phase,
                instruction: None,
            };
        }

        let elapsed = self
            .phase_started_ms
            .map(|started| (now_ms - started).max(0) as u64)
            .unwrap_or(0);
        let offset = match self.phase {
            CalibrationPhase::PhaseB => self.config.phase_a_ms,
            CalibrationPhase::PhaseC => self.config.phase_a_ms + self.config.phase_b_ms,
            _ => 0,
        };
        let total = self.config.total_ms().max(1) as f64;

        CalibrationProgress {
            progress: ((elapsed + offset) as f64 / total * 100.0).min(100.0),
            phase: self.phase,
            instruction: self.phase.instruction().map(str::to_string),
        }
    }

    fn enter(&mut self, phase: CalibrationPhase, timestamp_ms: i64) -> CalibrationOutcome {
        info!(phase = ?phase, "Calibration phase changed");
        self.phase = phase;
        self.phase_started_ms = Some(timestamp_ms);
        CalibrationOutcome::PhaseChanged(phase)
    }

    fn finish(&mut self, blink_rate: f64) -> CalibrationOutcome {
        self.phase_started_ms = None;

        let a = &self.phase_a;
        if a.ear.len() < self.config.min_phase_a_samples {
            warn!(
                samples = a.ear.len(),
                required = self.config.min_phase_a_samples,
                "Not enough calibration data, keeping current baseline"
            );
            self.phase = CalibrationPhase::Incomplete;
            return CalibrationOutcome::Incomplete;
        }

        let ear_base = median(&a.ear);
        let ear_sd = std_dev(&a.ear);
        let b = &self.phase_b;
        let off_threshold = |samples: &[f64], default: f64| {
            if samples.len() >= self.config.min_phase_b_samples {
                std_dev(samples) * self.config.off_threshold_sd_multiplier
            } else {
                default
            }
        };

        let baseline = Baseline {
            ear_base,
            ear_sd,
            ear_thresh: Baseline::derived_ear_thresh(ear_base, ear_sd),
            blink_rate_base: if blink_rate > 0.0 { blink_rate } else { 15.0 },
            head_jitter_base: median(&a.head_motion).max(self.config.jitter_floor),
            gaze_jitter_base: median(&a.gaze_motion).max(self.config.jitter_floor),
            gaze_center: median(&a.gaze),
            face_size_base: median(&a.face_size),
            down_head_base: median(&a.head_down),
            head_yaw_base: median(&a.head_yaw),
            head_yaw_off_threshold: off_threshold(&b.head_yaw, HEAD_YAW_OFF_THRESH_DEFAULT),
            gaze_off_threshold: off_threshold(&b.gaze, GAZE_OFF_THRESH_DEFAULT),
            mar_thresh: MAR_THRESH_DEFAULT,
            filler_rate_base: 0.0,
        };

        info!(
            ear_base = baseline.ear_base,
            ear_thresh = baseline.ear_thresh,
            phase_a_samples = a.ear.len(),
            phase_b_samples = b.gaze.len(),
            "Calibration complete"
        );
        self.phase = CalibrationPhase::Complete;
        CalibrationOutcome::Completed(baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ear: f64, gaze: f64) -> CalibrationSample {
        CalibrationSample {
            ear,
            head_motion: 0.0,
            gaze_motion: 0.0,
            face_size: 0.25,
            head_down: 0.1,
            gaze,
            head_yaw: 0.0,
        }
    }

    fn run(controller: &mut CalibrationController, from: i64, to: i64, step: i64, s: Option<CalibrationSample>) -> Vec<CalibrationOutcome> {
        let mut outcomes = Vec::new();
        let mut t = from;
        while t <= to {
            if let Some(outcome) = controller.observe(s.as_ref(), t, 12.0) {
                outcomes.push(outcome);
            }
            t += step;
        }
        outcomes
    }

    #[test]
    fn test_full_run_completes() {
        let mut controller = CalibrationController::new(CalibrationConfig::default());
        let plan = controller.start();
        assert_eq!(plan.total_duration_ms, 35_000);
        assert_eq!(plan.phases.len(), 3);

        let outcomes = run(&mut controller, 1_000, 36_000, 100, Some(sample(0.3, 0.0)));
        assert_eq!(outcomes[0], CalibrationOutcome::PhaseChanged(CalibrationPhase::PhaseB));
        assert_eq!(outcomes[1], CalibrationOutcome::PhaseChanged(CalibrationPhase::PhaseC));
        let Some(CalibrationOutcome::Completed(baseline)) = outcomes.get(2) else {
            panic!("expected completion, got {:?}", outcomes);
        };
        assert!((baseline.ear_base - 0.3).abs() < 1e-12);
        assert_eq!(baseline.blink_rate_base, 12.0);
        assert_eq!(baseline.head_jitter_base, 0.005);
        // constant phase-B gaze has zero spread
        assert_eq!(baseline.gaze_off_threshold, 0.0);
        assert!(controller.is_calibrated());
        assert!(!controller.is_calibrating());
    }

    #[test]
    fn test_too_few_samples_is_incomplete() {
        let mut controller = CalibrationController::new(CalibrationConfig::default());
        controller.start();
        let outcomes = run(&mut controller, 0, 36_000, 1_000, None);
        assert_eq!(outcomes.last(), Some(&CalibrationOutcome::Incomplete));
        assert_eq!(controller.phase(), CalibrationPhase::Incomplete);
        assert!(controller.is_calibrated());
    }

    fn finished_with_phase_b(count: usize) -> Baseline {
        let mut controller = CalibrationController::new(CalibrationConfig::default());
        controller.start();
        controller.phase_a.ear = vec![0.3; 100];
        for i in 0..count {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            controller.phase_b.gaze.push(0.1 * sign);
            controller.phase_b.head_yaw.push(0.3 * sign);
        }
        match controller.finish(12.0) {
            CalibrationOutcome::Completed(baseline) => baseline,
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_phase_b_minimum_is_inclusive() {
        let at_minimum = finished_with_phase_b(50);
        assert!(at_minimum.gaze_off_threshold > 0.0);
        assert_ne!(at_minimum.gaze_off_threshold, GAZE_OFF_THRESH_DEFAULT);
        assert_ne!(at_minimum.head_yaw_off_threshold, HEAD_YAW_OFF_THRESH_DEFAULT);

        let below = finished_with_phase_b(49);
        assert_eq!(below.gaze_off_threshold, GAZE_OFF_THRESH_DEFAULT);
        assert_eq!(below.head_yaw_off_threshold, HEAD_YAW_OFF_THRESH_DEFAULT);
    }

    #[test]
    fn test_skip_is_noop_when_terminal() {
        let mut controller = CalibrationController::new(CalibrationConfig::default());
        controller.start();
        assert!(controller.skip());
        assert_eq!(controller.phase(), CalibrationPhase::Skipped);
        assert!(!controller.skip());
    }

    #[test]
    fn test_progress_offsets_by_phase() {
        let mut controller = CalibrationController::new(CalibrationConfig::default());
        controller.start();
        controller.observe(None, 0, 0.0);
        let p = controller.progress(7_000);
        assert!((p.progress - 20.0).abs() < 1e-9);
        assert_eq!(p.phase, CalibrationPhase::PhaseA);

        controller.observe(None, 15_000, 0.0);
        let p = controller.progress(20_000);
        assert!((p.progress - (20_000.0 / 35_000.0 * 100.0)).abs() < 1e-9);
        assert!(p.instruction.is_some());
    }
}
