//! Per-second frame scratch state.

use mirror_models::Baseline;

use crate::features::FrameFeatures;
use crate::smoothing::MotionSample;
use crate::stats::{median, nonzero_or};

/// Samples collected between two ticks.
///
/// Swapped for a fresh accumulator at every tick so no sample leaks across
/// seconds. Only the iris flag and the last away state carry over.
#[derive(Debug, Clone, Default)]
pub struct FrameAccumulator {
    pub total_frames: u32,
    pub away_frames: u32,
    pub face_frames: u32,
    pub yawn_frames: u32,
    pub away_toggles: u32,
    pub ear: Vec<f64>,
    pub mar: Vec<f64>,
    pub face_size: Vec<f64>,
    pub head_down: Vec<f64>,
    pub gaze: Vec<f64>,
    pub head_yaw: Vec<f64>,
    pub head_motion: Vec<f64>,
    pub gaze_motion: Vec<f64>,
    pub iris_available: bool,
    pub last_away: bool,
}

/// Per-second aggregates handed to scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondAggregate {
    pub face_present: bool,
    pub face_ratio: f64,
    pub away_ratio: f64,
    pub ear: f64,
    pub face_size: f64,
    pub head_down: f64,
    pub gaze: f64,
    pub head_motion: f64,
    pub gaze_motion: f64,
    pub yawn_active: bool,
    pub away_toggles: u32,
}

impl FrameAccumulator {
    /// Record a frame with no usable face.
    pub fn record_absent(&mut self) {
        self.total_frames += 1;
        self.away_frames += 1;
    }

    /// Record a face frame. Returns true when the away state flipped.
    pub fn record_face(&mut self, features: &FrameFeatures, motion: MotionSample, away: bool) -> bool {
        self.total_frames += 1;
        self.face_frames += 1;
        self.ear.push(features.ear);
        self.mar.push(features.mar);
        self.face_size.push(features.face_size);
        self.head_down.push(features.head_down);
        self.gaze.push(features.gaze.gaze);
        self.head_yaw.push(features.head_yaw);
        self.head_motion.push(motion.head);
        self.gaze_motion.push(motion.gaze);
        self.iris_available = features.gaze.iris_available;

        if away {
            self.away_frames += 1;
        }
        let toggled = away != self.last_away;
        if toggled {
            self.away_toggles += 1;
        }
        self.last_away = away;
        toggled
    }

    pub fn record_yawn(&mut self) {
        self.yawn_frames += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.total_frames == 0
    }

    /// Take the collected samples, leaving a fresh accumulator behind.
    pub fn take(&mut self) -> FrameAccumulator {
        let fresh = FrameAccumulator {
            iris_available: self.iris_available,
            last_away: self.last_away,
            ..Default::default()
        };
        std::mem::replace(self, fresh)
    }

    /// Reduce to medians; zero medians fall back to the baseline.
    pub fn aggregate(&self, baseline: &Baseline) -> SecondAggregate {
        let total = self.total_frames.max(1) as f64;
        SecondAggregate {
            face_present: self.face_frames > 0,
            face_ratio: self.face_frames as f64 / total,
            away_ratio: self.away_frames as f64 / total,
            ear: nonzero_or(median(&self.ear), baseline.ear_base),
            face_size: nonzero_or(median(&self.face_size), baseline.face_size_base),
            head_down: nonzero_or(median(&self.head_down), baseline.down_head_base),
            gaze: nonzero_or(median(&self.gaze), baseline.gaze_center),
            head_motion: median(&self.head_motion),
            gaze_motion: median(&self.gaze_motion),
            yawn_active: self.yawn_frames > 0,
            away_toggles: self.away_toggles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::SyntheticFace;

    #[test]
    fn test_take_carries_flags_only() {
        let mut acc = FrameAccumulator::default();
        let features = FrameFeatures::extract(&SyntheticFace::new().build());
        acc.record_face(&features, MotionSample::default(), true);
        acc.record_absent();

        let taken = acc.take();
        assert_eq!(taken.total_frames, 2);
        assert!(acc.is_empty());
        assert!(acc.iris_available);
        assert!(acc.last_away);
        assert!(acc.ear.is_empty());
    }

    #[test]
    fn test_toggles_count_flips() {
        let mut acc = FrameAccumulator::default();
        let features = FrameFeatures::extract(&SyntheticFace::new().build());
        let flips: Vec<bool> = [false, true, true, false]
            .iter()
            .map(|&away| acc.record_face(&features, MotionSample::default(), away))
            .collect();
        assert_eq!(flips, vec![false, true, false, true]);
        assert_eq!(acc.away_toggles, 2);
        assert_eq!(acc.away_frames, 2);
    }

    #[test]
    fn test_absent_second_falls_back_to_baseline() {
        let mut acc = FrameAccumulator::default();
        acc.record_absent();
        let baseline = Baseline::default();
        let agg = acc.aggregate(&baseline);
        assert!(!agg.face_present);
        assert_eq!(agg.away_ratio, 1.0);
        assert_eq!(agg.ear, baseline.ear_base);
        assert_eq!(agg.face_size, baseline.face_size_base);
        assert_eq!(agg.head_motion, 0.0);
    }
}
