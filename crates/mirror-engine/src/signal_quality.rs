//! Tracking reliability rating.

use mirror_models::{Baseline, SignalQuality};

use crate::stats::{clamp, penalty};

/// Rate this second's tracking from face presence, face-size stability
/// (a distance/lighting proxy) and head-motion stability.
pub fn compute(face_ratio: f64, face_size: f64, head_motion_ema: f64, baseline: &Baseline) -> SignalQuality {
    let q_face = clamp(face_ratio, 0.0, 1.0);
    let size_delta = (face_size - baseline.face_size_base).abs();
    let q_light = 1.0 - penalty(size_delta, 0.03, 0.12);
    let q_stability = 1.0
        - penalty(
            head_motion_ema,
            baseline.head_jitter_base * 1.2,
            baseline.head_jitter_base * 4.0,
        );
    let q_total = 100.0 * (0.5 * q_face + 0.3 * q_stability + 0.2 * q_light);

    SignalQuality {
        q_face,
        q_light,
        q_stability,
        q_total: clamp(q_total, 0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_face_is_full_quality() {
        let baseline = Baseline::default();
        let q = compute(1.0, baseline.face_size_base, 0.0, &baseline);
        assert_eq!(q.q_total, 100.0);
    }

    #[test]
    fn test_no_face_halves_quality() {
        let baseline = Baseline::default();
        let q = compute(0.0, baseline.face_size_base, 0.0, &baseline);
        assert!((q.q_total - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_shaky_far_face_is_low_signal() {
        let baseline = Baseline::default();
        let q = compute(0.5, baseline.face_size_base - 0.2, 1.0, &baseline);
        assert_eq!(q.q_light, 0.0);
        assert_eq!(q.q_stability, 0.0);
        assert!(q.q_total < 50.0);
    }
}
