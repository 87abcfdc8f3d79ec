//! Landmark frames as produced by the external face-mesh model.
//!
//! # Layout (468-point mesh, 478 with iris refinement)
//!
//! - 33 / 133 / 159 / 145: left eye outer, inner, upper, lower
//! - 263 / 362 / 386 / 374: right eye outer, inner, upper, lower
//! - 468 / 473: left and right iris centers (refined meshes only)
//! - 13 / 14 / 78 / 308: mouth upper, lower, left, right
//! - 1: nose tip, 10: forehead, 152: chin, 234 / 454: left and right cheek

use serde::{Deserialize, Serialize};

/// Positional landmark indices.
pub mod index {
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_UPPER: usize = 159;
    pub const LEFT_EYE_LOWER: usize = 145;

    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_UPPER: usize = 386;
    pub const RIGHT_EYE_LOWER: usize = 374;

    pub const LEFT_IRIS_CENTER: usize = 468;
    pub const RIGHT_IRIS_CENTER: usize = 473;

    pub const MOUTH_UPPER: usize = 13;
    pub const MOUTH_LOWER: usize = 14;
    pub const MOUTH_LEFT: usize = 78;
    pub const MOUTH_RIGHT: usize = 308;

    pub const NOSE_TIP: usize = 1;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 152;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
}

/// Points in a standard mesh.
pub const MESH_POINTS: usize = 468;

/// Points in a mesh with iris refinement.
pub const MESH_WITH_IRIS_POINTS: usize = 478;

/// A normalized landmark point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Planar distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// One frame of ordered landmarks. Serializes as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Point>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, idx: usize) -> Option<&Point> {
        self.points.get(idx)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Distance between two indexed points; 0 when either is missing.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        match (self.point(a), self.point(b)) {
            (Some(p), Some(q)) => p.distance(q),
            _ => 0.0,
        }
    }

    pub fn has_iris(&self) -> bool {
        self.point(index::LEFT_IRIS_CENTER).is_some() && self.point(index::RIGHT_IRIS_CENTER).is_some()
    }
}

impl From<Vec<Point>> for LandmarkFrame {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

/// Builder for geometrically consistent synthetic faces.
///
/// Places only the anatomically indexed points; everything else sits at the
/// frame center. Feature extraction on the result reproduces the requested
/// EAR, MAR, gaze and face size.
#[derive(Debug, Clone)]
pub struct SyntheticFace {
    ear: f64,
    mar: f64,
    gaze: f64,
    face_size: f64,
    nose_dx: f64,
    nose_dy: f64,
    iris: bool,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            ear: 0.25,
            mar: 0.3,
            gaze: 0.0,
            face_size: 0.25,
            nose_dx: 0.0,
            nose_dy: 0.0,
            iris: true,
        }
    }
}

impl SyntheticFace {
    const EYE_WIDTH: f64 = 0.06;
    const EYE_Y: f64 = 0.45;
    const LEFT_EYE_CENTER_X: f64 = 0.43;
    const RIGHT_EYE_CENTER_X: f64 = 0.57;
    const MOUTH_WIDTH: f64 = 0.08;
    const MOUTH_Y: f64 = 0.62;
    const NOSE_Y: f64 = 0.52;

    pub fn new() -> Self {
        Self::default()
    }

    /// Eye aspect ratio for both eyes.
    pub fn ear(mut self, ear: f64) -> Self {
        self.ear = ear;
        self
    }

    /// Mouth aspect ratio.
    pub fn mar(mut self, mar: f64) -> Self {
        self.mar = mar;
        self
    }

    /// Horizontal iris offset as a fraction of eye width.
    pub fn gaze(mut self, gaze: f64) -> Self {
        self.gaze = gaze;
        self
    }

    /// Forehead-to-chin distance.
    pub fn face_size(mut self, face_size: f64) -> Self {
        self.face_size = face_size;
        self
    }

    /// Nose-tip displacement from the neutral position.
    pub fn nose_offset(mut self, dx: f64, dy: f64) -> Self {
        self.nose_dx = dx;
        self.nose_dy = dy;
        self
    }

    /// Emit a 468-point mesh without iris centers.
    pub fn without_iris(mut self) -> Self {
        self.iris = false;
        self
    }

    pub fn build(&self) -> LandmarkFrame {
        let len = if self.iris { MESH_WITH_IRIS_POINTS } else { MESH_POINTS };
        let mut points = vec![Point::new(0.5, 0.5); len];
        let half_eye = Self::EYE_WIDTH / 2.0;
        let eye_open = self.ear * Self::EYE_WIDTH / 2.0;

        let mut place = |idx: usize, x: f64, y: f64| {
            if let Some(p) = points.get_mut(idx) {
                *p = Point::new(x, y);
            }
        };

        for (center, outer, inner, upper, lower, iris) in [
            (
                Self::LEFT_EYE_CENTER_X,
                index::LEFT_EYE_OUTER,
                index::LEFT_EYE_INNER,
                index::LEFT_EYE_UPPER,
                index::LEFT_EYE_LOWER,
                index::LEFT_IRIS_CENTER,
            ),
            (
                Self::RIGHT_EYE_CENTER_X,
                index::RIGHT_EYE_OUTER,
                index::RIGHT_EYE_INNER,
                index::RIGHT_EYE_UPPER,
                index::RIGHT_EYE_LOWER,
                index::RIGHT_IRIS_CENTER,
            ),
        ] {
            let (left_corner, right_corner) = if center < 0.5 {
                (outer, inner)
            } else {
                (inner, outer)
            };
            place(left_corner, center - half_eye, Self::EYE_Y);
            place(right_corner, center + half_eye, Self::EYE_Y);
            place(upper, center, Self::EYE_Y - eye_open);
            place(lower, center, Self::EYE_Y + eye_open);
            if self.iris {
                place(iris, center + self.gaze * Self::EYE_WIDTH, Self::EYE_Y);
            }
        }

        let mouth_open = self.mar * Self::MOUTH_WIDTH / 2.0;
        place(index::MOUTH_UPPER, 0.5, Self::MOUTH_Y - mouth_open);
        place(index::MOUTH_LOWER, 0.5, Self::MOUTH_Y + mouth_open);
        place(index::MOUTH_LEFT, 0.5 - Self::MOUTH_WIDTH / 2.0, Self::MOUTH_Y);
        place(index::MOUTH_RIGHT, 0.5 + Self::MOUTH_WIDTH / 2.0, Self::MOUTH_Y);

        place(index::NOSE_TIP, 0.5 + self.nose_dx, Self::NOSE_Y + self.nose_dy);
        place(index::FOREHEAD, 0.5, 0.5 - self.face_size / 2.0);
        place(index::CHIN, 0.5, 0.5 + self.face_size / 2.0);
        place(index::LEFT_CHEEK, 0.30, Self::NOSE_Y);
        place(index::RIGHT_CHEEK, 0.70, Self::NOSE_Y);

        LandmarkFrame::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_face_sizes() {
        assert_eq!(SyntheticFace::new().build().len(), MESH_WITH_IRIS_POINTS);
        let bare = SyntheticFace::new().without_iris().build();
        assert_eq!(bare.len(), MESH_POINTS);
        assert!(!bare.has_iris());
    }

    #[test]
    fn test_missing_point_distance_is_zero() {
        let frame = LandmarkFrame::new(vec![Point::new(0.0, 0.0)]);
        assert_eq!(frame.distance(0, 5), 0.0);
    }

    #[test]
    fn test_frame_deserializes_from_array() {
        let frame: LandmarkFrame =
            serde_json::from_str(r#"[{"x":0.1,"y":0.2},{"x":0.3,"y":0.4,"z":-0.01}]"#).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.point(1).and_then(|p| p.z), Some(-0.01));
    }
}
