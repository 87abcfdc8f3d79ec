//! Personal threshold learning from rolling cross-session history.

use std::collections::VecDeque;

use mirror_models::{AutoTunedThresholds, BlinkRateBand, EarDropBand, GazeToleranceBand, HeadJitterBand};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::stats::{median, percentile};

/// Rolling per-second samples used for auto-tuning. Survives session resets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryBuffer {
    pub blink_rates: VecDeque<f64>,
    pub gaze_motions: VecDeque<f64>,
    pub head_motions: VecDeque<f64>,
    pub ear_values: VecDeque<f64>,
}

impl HistoryBuffer {
    pub fn push(&mut self, blink_rate: f64, gaze_motion: f64, head_motion: f64, ear: f64, capacity: usize) {
        for (buf, value) in [
            (&mut self.blink_rates, blink_rate),
            (&mut self.gaze_motions, gaze_motion),
            (&mut self.head_motions, head_motion),
            (&mut self.ear_values, ear),
        ] {
            buf.push_back(value);
            while buf.len() > capacity {
                buf.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.blink_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blink_rates.is_empty()
    }
}

fn contiguous(values: &VecDeque<f64>) -> Vec<f64> {
    values.iter().copied().collect()
}

/// Recompute thresholds from history, or `None` below `min_samples`.
pub fn recompute(history: &HistoryBuffer, min_samples: usize, passes: u32) -> Option<AutoTunedThresholds> {
    if history.len() < min_samples {
        return None;
    }

    let blinks = contiguous(&history.blink_rates);
    let gaze = contiguous(&history.gaze_motions);
    let head = contiguous(&history.head_motions);
    let ear_median = median(&contiguous(&history.ear_values));

    let tuned = AutoTunedThresholds {
        blink_rate: BlinkRateBand {
            low: percentile(&blinks, 10.0),
            high: percentile(&blinks, 90.0),
            normal: median(&blinks),
        },
        gaze_tolerance: GazeToleranceBand {
            normal: percentile(&gaze, 50.0).max(0.04),
            extended: percentile(&gaze, 80.0),
        },
        head_jitter: HeadJitterBand {
            normal: percentile(&head, 50.0).max(0.01),
            high: percentile(&head, 85.0),
        },
        ear_drop: EarDropBand {
            mild: ear_median * 0.92,
            fatigue: ear_median * 0.80,
        },
        passes: passes + 1,
    };

    info!(
        samples = history.len(),
        blink_normal = tuned.blink_rate.normal,
        head_jitter_high = tuned.head_jitter.high,
        "Auto-tuned thresholds recomputed"
    );
    Some(tuned)
}
