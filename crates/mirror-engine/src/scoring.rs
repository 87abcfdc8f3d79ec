//! Focus, energy and confidence from per-second aggregates.
//!
//! Each score is `100 * (1 - weighted penalty sum)`, clamped to [0, 100].
//! Weights come from the context mode active when the tick is evaluated.

use mirror_models::{AutoTunedThresholds, Baseline, ConfidenceWeights, EnergyWeights, FocusWeights};

use crate::stats::{clamp, nonzero_or, penalty};

fn to_score(weighted_penalty: f64) -> f64 {
    clamp(100.0 * (1.0 - weighted_penalty), 0.0, 100.0)
}

/// Inputs to the focus score.
#[derive(Debug, Clone, Copy)]
pub struct FocusInputs {
    pub face_present: bool,
    pub away_ratio: f64,
    pub head_motion_ema: f64,
    pub gaze_motion_ema: f64,
}

pub fn focus_raw(
    inputs: &FocusInputs,
    baseline: &Baseline,
    tuned: &AutoTunedThresholds,
    w: &FocusWeights,
) -> f64 {
    let p_face = if inputs.face_present { 0.0 } else { 1.0 };
    let p_away = inputs.away_ratio;

    let head_high = nonzero_or(tuned.head_jitter.high, baseline.head_jitter_base * 3.0);
    let gaze_high = nonzero_or(tuned.gaze_tolerance.extended, baseline.gaze_jitter_base * 3.0);
    let p_head = penalty(inputs.head_motion_ema, baseline.head_jitter_base * 1.2, head_high);
    let p_gaze = penalty(inputs.gaze_motion_ema, baseline.gaze_jitter_base * 1.2, gaze_high);

    to_score(w.face * p_face + w.away * p_away + w.head * p_head + w.gaze * p_gaze)
}

/// Inputs to the energy score.
#[derive(Debug, Clone, Copy)]
pub struct EnergyInputs {
    pub ear: f64,
    pub blink_rate: f64,
    pub yawn_active: bool,
    pub head_motion_ema: f64,
}

/// Relative EAR drop from the baseline.
pub fn ear_drop(ear: f64, baseline: &Baseline) -> f64 {
    (baseline.ear_base - ear) / baseline.ear_base.max(0.01)
}

pub fn energy_raw(
    inputs: &EnergyInputs,
    baseline: &Baseline,
    tuned: &AutoTunedThresholds,
    w: &EnergyWeights,
) -> f64 {
    let blink_normal = nonzero_or(tuned.blink_rate.normal, baseline.blink_rate_base);

    let p_ear = penalty(ear_drop(inputs.ear, baseline), 0.08, 0.25);

    let blink_dev = (inputs.blink_rate - blink_normal).abs() / blink_normal.max(1.0);
    let p_blink = penalty(blink_dev, 0.5, 1.5);

    // Stillness below this fraction of baseline jitter reads as low energy.
    let motion_floor = baseline.head_jitter_base * 0.7;
    let p_motion = penalty(motion_floor - inputs.head_motion_ema, 0.0, motion_floor);

    let p_yawn = if inputs.yawn_active { 1.0 } else { 0.0 };

    to_score(w.ear * p_ear + w.blink * p_blink + w.motion * p_motion + w.yawn * p_yawn)
}

/// Inputs to the confidence score.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    pub face_present: bool,
    pub away_ratio: f64,
    pub head_down: f64,
    pub face_size: f64,
    pub speaking: bool,
    pub filler_rate: f64,
}

pub fn confidence_raw(inputs: &ConfidenceInputs, baseline: &Baseline, w: &ConfidenceWeights) -> f64 {
    let p_face = if inputs.face_present { 0.0 } else { 1.0 };
    let p_engage = penalty(inputs.away_ratio, 0.15, 0.60);
    let p_down = penalty(inputs.head_down - baseline.down_head_base, 0.02, 0.10);
    let p_far = penalty(baseline.face_size_base - inputs.face_size, 0.02, 0.10);

    let p_voice = if inputs.speaking && baseline.filler_rate_base > 0.0 {
        let dev = (inputs.filler_rate - baseline.filler_rate_base) / baseline.filler_rate_base.max(1.0);
        penalty(dev, 0.5, 2.0)
    } else {
        0.0
    };

    to_score(
        w.face * p_face + w.engage * p_engage + w.down * p_down + w.far * p_far + w.voice * p_voice,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_models::ContextMode;

    fn focus_under(mode: ContextMode, inputs: &FocusInputs) -> f64 {
        focus_raw(
            inputs,
            &Baseline::default(),
            &AutoTunedThresholds::default(),
            &mode.weights().focus,
        )
    }

    #[test]
    fn test_scores_clamped_for_extreme_input() {
        let baseline = Baseline::default();
        let tuned = AutoTunedThresholds::default();
        let weights = ContextMode::Meeting.weights();

        let focus = focus_raw(
            &FocusInputs {
                face_present: false,
                away_ratio: 50.0,
                head_motion_ema: 1e9,
                gaze_motion_ema: f64::MAX,
            },
            &baseline,
            &tuned,
            &weights.focus,
        );
        assert_eq!(focus, 0.0);

        let energy = energy_raw(
            &EnergyInputs {
                ear: -10.0,
                blink_rate: 1e6,
                yawn_active: true,
                head_motion_ema: -5.0,
            },
            &baseline,
            &tuned,
            &weights.energy,
        );
        assert!((0.0..=100.0).contains(&energy));

        let confidence = confidence_raw(
            &ConfidenceInputs {
                face_present: true,
                away_ratio: -3.0,
                head_down: -1.0,
                face_size: 10.0,
                speaking: false,
                filler_rate: 0.0,
            },
            &baseline,
            &weights.confidence,
        );
        assert_eq!(confidence, 100.0);
    }

    #[test]
    fn test_context_changes_focus_when_away() {
        let inputs = FocusInputs {
            face_present: true,
            away_ratio: 0.5,
            head_motion_ema: 0.0,
            gaze_motion_ema: 0.0,
        };
        let coding = focus_under(ContextMode::Coding, &inputs);
        let meeting = focus_under(ContextMode::Meeting, &inputs);
        assert!((coding - 87.5).abs() < 1e-9);
        assert!((meeting - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_context_identical_when_no_penalty_active() {
        let inputs = FocusInputs {
            face_present: true,
            away_ratio: 0.0,
            head_motion_ema: 0.0,
            gaze_motion_ema: 0.0,
        };
        assert_eq!(
            focus_under(ContextMode::Coding, &inputs),
            focus_under(ContextMode::Meeting, &inputs)
        );

        // Face absence, head and gaze weights also differ between modes,
        // so any of those terms being non-zero separates the scores too.
        let absent = FocusInputs {
            face_present: false,
            ..inputs
        };
        assert_ne!(
            focus_under(ContextMode::Coding, &absent),
            focus_under(ContextMode::Meeting, &absent)
        );
    }

    #[test]
    fn test_voice_penalty_needs_filler_baseline() {
        let baseline = Baseline::default();
        let weights = ContextMode::Meeting.weights().confidence;
        let inputs = ConfidenceInputs {
            face_present: true,
            away_ratio: 0.0,
            head_down: 0.0,
            face_size: baseline.face_size_base,
            speaking: true,
            filler_rate: 50.0,
        };
        assert_eq!(confidence_raw(&inputs, &baseline, &weights), 100.0);

        let with_filler = Baseline {
            filler_rate_base: 2.0,
            ..baseline
        };
        assert!(confidence_raw(&inputs, &with_filler, &weights) < 100.0);
    }
}
