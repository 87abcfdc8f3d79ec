//! Personal calibration baseline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default eye-aspect-ratio blink threshold before calibration.
pub const EAR_THRESH_DEFAULT: f64 = 0.18;

/// Default mouth-aspect-ratio yawn threshold.
pub const MAR_THRESH_DEFAULT: f64 = 0.40;

/// Default gaze off-center threshold before calibration.
pub const GAZE_OFF_THRESH_DEFAULT: f64 = 0.08;

/// Default head-yaw off-center threshold before calibration.
pub const HEAD_YAW_OFF_THRESH_DEFAULT: f64 = 0.15;

/// The calibration record every downstream component reads.
///
/// Created with defaults at startup, replaced wholesale when calibration
/// completes and nudged by drift correction during stable periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Baseline {
    /// Median eye-aspect-ratio while looking at the screen
    pub ear_base: f64,
    /// Standard deviation of the calibration EAR samples
    pub ear_sd: f64,
    /// EAR below which a frame counts as "eyes closing"
    pub ear_thresh: f64,
    /// Blinks per minute at rest
    pub blink_rate_base: f64,
    /// Typical nose-tip speed (normalized units per second)
    pub head_jitter_base: f64,
    /// Typical gaze-proxy speed (units per second)
    pub gaze_jitter_base: f64,
    /// Gaze proxy value when looking at the screen
    pub gaze_center: f64,
    /// Forehead-to-chin distance
    pub face_size_base: f64,
    /// Nose-to-forehead vertical offset at rest
    pub down_head_base: f64,
    /// Head yaw at rest
    pub head_yaw_base: f64,
    /// Yaw deviation that counts as looking away
    pub head_yaw_off_threshold: f64,
    /// Gaze deviation that counts as looking away
    pub gaze_off_threshold: f64,
    /// MAR above which the mouth counts as open wide
    pub mar_thresh: f64,
    /// Filler words per minute while speaking (0 = unknown)
    pub filler_rate_base: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            ear_base: 0.25,
            ear_sd: 0.03,
            ear_thresh: EAR_THRESH_DEFAULT,
            blink_rate_base: 15.0,
            head_jitter_base: 0.02,
            gaze_jitter_base: 0.02,
            gaze_center: 0.0,
            face_size_base: 0.25,
            down_head_base: 0.0,
            head_yaw_base: 0.0,
            head_yaw_off_threshold: HEAD_YAW_OFF_THRESH_DEFAULT,
            gaze_off_threshold: GAZE_OFF_THRESH_DEFAULT,
            mar_thresh: MAR_THRESH_DEFAULT,
            filler_rate_base: 0.0,
        }
    }
}

impl Baseline {
    /// Blink threshold derived from the EAR distribution, floored at 0.12.
    pub fn derived_ear_thresh(ear_base: f64, ear_sd: f64) -> f64 {
        (ear_base - 2.0 * ear_sd).max(0.12)
    }
}
