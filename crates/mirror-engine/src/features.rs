//! Geometric feature extraction from a single landmark frame.
//!
//! All functions are pure. Degenerate geometry falls back to a neutral value
//! instead of dividing by a near-zero width.

use crate::landmarks::{index, LandmarkFrame, Point};

/// Widths below this are treated as degenerate.
const MIN_WIDTH: f64 = 0.001;

const NEUTRAL_EAR: f64 = 0.25;
const NEUTRAL_MAR: f64 = 0.2;

/// Gaze proxy and which measure produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeProxy {
    pub gaze: f64,
    /// Iris-based measure when true, eye-cluster-vs-nose otherwise
    pub iris_available: bool,
}

/// Every scalar the pipeline derives from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFeatures {
    pub ear: f64,
    pub mar: f64,
    pub face_size: f64,
    pub head_down: f64,
    pub head_yaw: f64,
    pub gaze: GazeProxy,
    pub nose_tip: Option<Point>,
}

impl FrameFeatures {
    pub fn extract(frame: &LandmarkFrame) -> Self {
        Self {
            ear: eye_aspect_ratio(frame),
            mar: mouth_aspect_ratio(frame),
            face_size: face_size(frame),
            head_down: head_down(frame),
            head_yaw: head_yaw(frame),
            gaze: gaze_proxy(frame),
            nose_tip: frame.point(index::NOSE_TIP).copied(),
        }
    }
}

fn single_eye_ratio(frame: &LandmarkFrame, upper: usize, lower: usize, inner: usize, outer: usize) -> f64 {
    let h = frame.distance(upper, lower);
    let w = frame.distance(inner, outer);
    if w > MIN_WIDTH {
        h / w
    } else {
        NEUTRAL_EAR
    }
}

/// Mean of left and right eye aspect ratios.
pub fn eye_aspect_ratio(frame: &LandmarkFrame) -> f64 {
    let left = single_eye_ratio(
        frame,
        index::LEFT_EYE_UPPER,
        index::LEFT_EYE_LOWER,
        index::LEFT_EYE_INNER,
        index::LEFT_EYE_OUTER,
    );
    let right = single_eye_ratio(
        frame,
        index::RIGHT_EYE_UPPER,
        index::RIGHT_EYE_LOWER,
        index::RIGHT_EYE_INNER,
        index::RIGHT_EYE_OUTER,
    );
    (left + right) / 2.0
}

pub fn mouth_aspect_ratio(frame: &LandmarkFrame) -> f64 {
    let h = frame.distance(index::MOUTH_UPPER, index::MOUTH_LOWER);
    let w = frame.distance(index::MOUTH_LEFT, index::MOUTH_RIGHT);
    if w > MIN_WIDTH {
        h / w
    } else {
        NEUTRAL_MAR
    }
}

/// Forehead-to-chin distance.
pub fn face_size(frame: &LandmarkFrame) -> f64 {
    frame.distance(index::FOREHEAD, index::CHIN)
}

/// Vertical nose-tip offset below the forehead.
pub fn head_down(frame: &LandmarkFrame) -> f64 {
    match (frame.point(index::NOSE_TIP), frame.point(index::FOREHEAD)) {
        (Some(nose), Some(forehead)) => nose.y - forehead.y,
        _ => 0.0,
    }
}

/// Signed nose-to-cheek asymmetry in [-1, 1]; 0 faces forward.
pub fn head_yaw(frame: &LandmarkFrame) -> f64 {
    let (Some(nose), Some(left), Some(right)) = (
        frame.point(index::NOSE_TIP),
        frame.point(index::LEFT_CHEEK),
        frame.point(index::RIGHT_CHEEK),
    ) else {
        return 0.0;
    };

    let left_dist = nose.distance(left);
    let right_dist = nose.distance(right);
    let total = left_dist + right_dist;
    if total < MIN_WIDTH {
        return 0.0;
    }
    (right_dist - left_dist) / total
}

/// Horizontal gaze proxy.
///
/// With iris landmarks: mean per-eye iris offset from the eye center,
/// normalized by eye width. Without: eye-cluster center minus nose x. The two
/// measures are on different scales.
pub fn gaze_proxy(frame: &LandmarkFrame) -> GazeProxy {
    let Some(nose) = frame.point(index::NOSE_TIP) else {
        return GazeProxy {
            gaze: 0.0,
            iris_available: false,
        };
    };

    let x = |idx: usize| frame.point(idx).map(|p| p.x).unwrap_or(0.0);

    if frame.has_iris() {
        let iris_offset = |inner: usize, outer: usize, iris: usize| {
            let width = frame.distance(inner, outer);
            if width > MIN_WIDTH {
                let center_x = (x(inner) + x(outer)) / 2.0;
                (x(iris) - center_x) / width
            } else {
                0.0
            }
        };
        let left = iris_offset(index::LEFT_EYE_INNER, index::LEFT_EYE_OUTER, index::LEFT_IRIS_CENTER);
        let right = iris_offset(index::RIGHT_EYE_INNER, index::RIGHT_EYE_OUTER, index::RIGHT_IRIS_CENTER);
        return GazeProxy {
            gaze: (left + right) / 2.0,
            iris_available: true,
        };
    }

    let cluster = |a: usize, b: usize, c: usize, d: usize| (x(a) + x(b) + x(c) + x(d)) / 4.0;
    let left_center = cluster(
        index::LEFT_EYE_INNER,
        index::LEFT_EYE_OUTER,
        index::LEFT_EYE_UPPER,
        index::LEFT_EYE_LOWER,
    );
    let right_center = cluster(
        index::RIGHT_EYE_INNER,
        index::RIGHT_EYE_OUTER,
        index::RIGHT_EYE_UPPER,
        index::RIGHT_EYE_LOWER,
    );

    GazeProxy {
        gaze: (left_center + right_center) / 2.0 - nose.x,
        iris_available: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::SyntheticFace;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_synthetic_ratios_roundtrip() {
        let frame = SyntheticFace::new().ear(0.31).mar(0.55).face_size(0.3).build();
        assert!((eye_aspect_ratio(&frame) - 0.31).abs() < EPS);
        assert!((mouth_aspect_ratio(&frame) - 0.55).abs() < EPS);
        assert!((face_size(&frame) - 0.3).abs() < EPS);
    }

    #[test]
    fn test_degenerate_eye_width_falls_back() {
        let frame = LandmarkFrame::new(vec![Point::new(0.5, 0.5); 468]);
        assert_eq!(eye_aspect_ratio(&frame), NEUTRAL_EAR);
        assert_eq!(mouth_aspect_ratio(&frame), NEUTRAL_MAR);
        assert_eq!(head_yaw(&frame), 0.0);
    }

    #[test]
    fn test_gaze_uses_iris_when_present() {
        let frame = SyntheticFace::new().gaze(0.2).build();
        let gaze = gaze_proxy(&frame);
        assert!(gaze.iris_available);
        assert!((gaze.gaze - 0.2).abs() < EPS);
    }

    #[test]
    fn test_gaze_falls_back_without_iris() {
        let frame = SyntheticFace::new().nose_offset(0.02, 0.0).without_iris().build();
        let gaze = gaze_proxy(&frame);
        assert!(!gaze.iris_available);
        assert!((gaze.gaze + 0.02).abs() < EPS);
    }

    #[test]
    fn test_head_yaw_sign() {
        let centered = SyntheticFace::new().build();
        assert!(head_yaw(&centered).abs() < EPS);

        let turned = SyntheticFace::new().nose_offset(0.05, 0.0).build();
        assert!(head_yaw(&turned) < 0.0);
    }
}
