// src/landmarks.rs - Hand keypoints and wrist-relative feature vectors
use nalgebra::Vector2;
use thiserror::Error;

// MediaPipe hand landmark indices
pub const JOINT_COUNT: usize = 21;
pub const FEATURE_LEN: usize = JOINT_COUNT * 2;
pub const WRIST: usize = 0;
pub const INDEX_TIP: usize = 8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("expected 21 hand joints, got {0}")]
    JointCount(usize),
    #[error("expected 42 coordinates, got {0}")]
    CoordinateCount(usize),
    #[error("joint {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// One detected hand: 21 joints in normalized image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HandKeypoints {
    joints: [Vector2<f64>; JOINT_COUNT],
}

impl HandKeypoints {
    pub fn from_points(points: &[Vector2<f64>]) -> Result<Self, LandmarkError> {
        if points.len() != JOINT_COUNT {
            return Err(LandmarkError::JointCount(points.len()));
        }
        if let Some(i) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(LandmarkError::NonFinite(i));
        }
        Ok(Self {
            joints: std::array::from_fn(|i| points[i]),
        })
    }

    /// Flat `x0, y0, x1, y1, ...` layout, as written by the recorder.
    pub fn from_flat(coords: &[f64]) -> Result<Self, LandmarkError> {
        if coords.len() != FEATURE_LEN {
            return Err(LandmarkError::CoordinateCount(coords.len()));
        }
        let points: Vec<Vector2<f64>> = coords
            .chunks_exact(2)
            .map(|xy| Vector2::new(xy[0], xy[1]))
            .collect();
        Self::from_points(&points)
    }

    pub fn joints(&self) -> &[Vector2<f64>] {
        &self.joints
    }

    pub fn wrist(&self) -> Vector2<f64> {
        self.joints[WRIST]
    }

    pub fn index_tip(&self) -> Vector2<f64> {
        self.joints[INDEX_TIP]
    }

    /// Translates every joint so the wrist sits at the origin. Training data
    /// must go through the same transform or predictions silently degrade.
    pub fn normalize(&self) -> FeatureVector {
        let wrist = self.wrist();
        let mut values = [0.0; FEATURE_LEN];
        for (i, joint) in self.joints.iter().enumerate() {
            let rel = joint - wrist;
            values[2 * i] = rel.x;
            values[2 * i + 1] = rel.y;
        }
        FeatureVector(values)
    }
}

/// Wrist-relative features fed to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Re-anchors the features at `wrist`, recovering absolute keypoints.
    pub fn denormalize(&self, wrist: Vector2<f64>) -> HandKeypoints {
        HandKeypoints {
            joints: std::array::from_fn(|i| Vector2::new(self.0[2 * i], self.0[2 * i + 1]) + wrist),
        }
    }
}
