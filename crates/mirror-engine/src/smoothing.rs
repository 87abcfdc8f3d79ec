//! Frame-to-frame temporal state: blinks, yawns and motion rates.

use std::collections::VecDeque;

use crate::landmarks::Point;

/// Counts blinks over a trailing window.
///
/// A blink is a run of at least `min_frames` low-EAR frames closed by a
/// recovery frame.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    min_frames: u32,
    window_ms: i64,
    low_frames: u32,
    timestamps: VecDeque<i64>,
}

impl BlinkDetector {
    pub fn new(min_frames: u32, window_ms: i64) -> Self {
        Self {
            min_frames,
            window_ms,
            low_frames: 0,
            timestamps: VecDeque::new(),
        }
    }

    /// Feed one frame. Returns true when a blink was registered.
    pub fn update(&mut self, ear: f64, threshold: f64, timestamp_ms: i64) -> bool {
        let mut registered = false;
        if ear < threshold {
            self.low_frames += 1;
        } else {
            if self.low_frames >= self.min_frames {
                self.timestamps.push_back(timestamp_ms);
                registered = true;
            }
            self.low_frames = 0;
        }

        let cutoff = timestamp_ms - self.window_ms;
        while self.timestamps.front().is_some_and(|&t| t <= cutoff) {
            self.timestamps.pop_front();
        }
        registered
    }

    /// Blinks inside the trailing window (per-minute with the default window).
    pub fn rate(&self) -> f64 {
        self.timestamps.len() as f64
    }
}

/// Rising-edge yawn detector over sustained high MAR.
#[derive(Debug, Clone)]
pub struct YawnDetector {
    duration_ms: i64,
    high_since: Option<i64>,
    yawning: bool,
}

impl YawnDetector {
    pub fn new(duration_ms: i64) -> Self {
        Self {
            duration_ms,
            high_since: None,
            yawning: false,
        }
    }

    /// Feed one frame. Returns true once per sustained episode.
    pub fn update(&mut self, mar: f64, threshold: f64, timestamp_ms: i64) -> bool {
        if mar <= threshold {
            self.high_since = None;
            self.yawning = false;
            return false;
        }

        match self.high_since {
            None => {
                self.high_since = Some(timestamp_ms);
                false
            }
            Some(start) if timestamp_ms - start >= self.duration_ms && !self.yawning => {
                self.yawning = true;
                true
            }
            Some(_) => false,
        }
    }

    pub fn is_yawning(&self) -> bool {
        self.yawning
    }
}

/// Per-frame motion rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionSample {
    /// Nose-tip displacement per second
    pub head: f64,
    /// Gaze-proxy change per second
    pub gaze: f64,
}

/// Tracks the previous valid frame to derive motion rates.
#[derive(Debug, Clone, Default)]
pub struct MotionTracker {
    prev_nose: Option<Point>,
    prev_gaze: Option<f64>,
    prev_timestamp: Option<i64>,
}

impl MotionTracker {
    /// Samples more than a second apart are stale and yield no motion.
    const MAX_GAP_SECS: f64 = 1.0;

    pub fn update(&mut self, nose: Option<Point>, gaze: f64, timestamp_ms: i64) -> MotionSample {
        let mut sample = MotionSample::default();

        if let Some(prev_ts) = self.prev_timestamp {
            let dt = (timestamp_ms - prev_ts) as f64 / 1000.0;
            if dt > 0.0 && dt < Self::MAX_GAP_SECS {
                if let (Some(now), Some(prev)) = (nose.as_ref(), self.prev_nose.as_ref()) {
                    sample.head = now.distance(prev) / dt;
                }
                if let Some(prev) = self.prev_gaze {
                    sample.gaze = (gaze - prev).abs() / dt;
                }
            }
        }

        self.prev_nose = nose;
        self.prev_gaze = Some(gaze);
        self.prev_timestamp = Some(timestamp_ms);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESH: f64 = 0.18;

    fn feed_ears(detector: &mut BlinkDetector, ears: &[f64]) -> usize {
        let mut blinks = 0;
        for (i, ear) in ears.iter().enumerate() {
            if detector.update(*ear, THRESH, i as i64 * 33) {
                blinks += 1;
            }
        }
        blinks
    }

    #[test]
    fn test_three_low_frames_make_one_blink() {
        let mut detector = BlinkDetector::new(2, 60_000);
        let blinks = feed_ears(&mut detector, &[0.3, 0.1, 0.1, 0.1, 0.3, 0.3]);
        assert_eq!(blinks, 1);
        assert_eq!(detector.rate(), 1.0);
    }

    #[test]
    fn test_single_low_frame_is_not_a_blink() {
        let mut detector = BlinkDetector::new(2, 60_000);
        let blinks = feed_ears(&mut detector, &[0.3, 0.1, 0.3, 0.3]);
        assert_eq!(blinks, 0);
        assert_eq!(detector.rate(), 0.0);
    }

    #[test]
    fn test_blink_window_expires() {
        let mut detector = BlinkDetector::new(2, 60_000);
        detector.update(0.1, THRESH, 0);
        detector.update(0.1, THRESH, 33);
        assert!(detector.update(0.3, THRESH, 66));
        detector.update(0.3, THRESH, 60_065);
        assert_eq!(detector.rate(), 1.0);
        detector.update(0.3, THRESH, 60_066);
        assert_eq!(detector.rate(), 0.0);
    }

    #[test]
    fn test_yawn_under_duration_never_fires() {
        let mut detector = YawnDetector::new(1_000);
        let fired = (0..=999).step_by(333).any(|t| detector.update(0.6, 0.4, t))
            || detector.update(0.6, 0.4, 999);
        assert!(!fired);
        assert!(!detector.update(0.2, 0.4, 1_100));
    }

    #[test]
    fn test_yawn_fires_once_per_episode() {
        let mut detector = YawnDetector::new(1_000);
        assert!(!detector.update(0.6, 0.4, 0));
        assert!(detector.update(0.6, 0.4, 1_001));
        assert!(!detector.update(0.6, 0.4, 1_500));
        assert!(!detector.update(0.6, 0.4, 3_000));

        assert!(!detector.update(0.2, 0.4, 3_100));
        assert!(!detector.update(0.6, 0.4, 3_200));
        assert!(detector.update(0.6, 0.4, 4_201));
    }

    #[test]
    fn test_motion_ignores_stale_frames() {
        let mut tracker = MotionTracker::default();
        let first = tracker.update(Some(Point::new(0.5, 0.5)), 0.0, 0);
        assert_eq!(first, MotionSample::default());

        let moved = tracker.update(Some(Point::new(0.51, 0.5)), 0.02, 100);
        assert!((moved.head - 0.1).abs() < 1e-9);
        assert!((moved.gaze - 0.2).abs() < 1e-9);

        let stale = tracker.update(Some(Point::new(0.6, 0.5)), 0.5, 1_100);
        assert_eq!(stale, MotionSample::default());
    }
}
