//! Scalar posture metrics extracted from one frame of landmarks.

use crate::{
    constants::{
        AVERAGE_IPD_CM, DEFAULT_FACE_BBOX_PADDING, DEFAULT_MIN_SHOULDER_VISIBILITY, EPSILON, LEFT_EYE_OUTER,
        LEFT_PUPIL, LEFT_SHOULDER, MIN_POSE_LANDMARKS, RIGHT_EYE_OUTER, RIGHT_PUPIL, RIGHT_SHOULDER,
    },
    landmarks::{FrameInput, Landmark, LandmarkSet},
    pose_estimation::PoseEstimator,
    solver::CameraIntrinsics,
    utils::{face_bounding_box, BoundingBox},
};
use serde::{Deserialize, Serialize};

/// Per-frame posture metrics, `None` when undeterminable this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Head pitch in degrees, negative = looking down
    pub pitch: Option<f64>,
    /// Head yaw in degrees
    pub yaw: Option<f64>,
    /// Head roll in degrees, eye-line estimate when available
    pub roll: Option<f64>,
    /// Estimated camera distance in centimeters
    pub distance: Option<f64>,
    /// Shoulder line angle in degrees
    pub shoulder_tilt: Option<f64>,
}

/// Everything extracted from a frame with a detected face
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures {
    pub metrics: Metrics,
    /// Roll from the PnP rotation, degrades under yaw
    pub euler_roll: Option<f64>,
    /// Roll from the outer eye corners
    pub eye_line_roll: Option<f64>,
    pub face_bbox: Option<BoundingBox>,
    pub shoulder_detection_active: bool,
}

/// Converts raw landmark sets into [`Metrics`]
pub struct FeatureExtractor {
    pose_estimator: PoseEstimator,
    min_shoulder_visibility: f64,
    face_bbox_padding: f64,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(PoseEstimator::default(), DEFAULT_MIN_SHOULDER_VISIBILITY, DEFAULT_FACE_BBOX_PADDING)
    }
}

impl FeatureExtractor {
    pub fn new(pose_estimator: PoseEstimator, min_shoulder_visibility: f64, face_bbox_padding: f64) -> Self {
        Self {
            pose_estimator,
            min_shoulder_visibility,
            face_bbox_padding,
        }
    }

    pub fn pose_estimator(&self) -> &PoseEstimator {
        &self.pose_estimator
    }

    /// Extract metrics from a frame; `None` when no face was detected
    pub fn extract(&self, frame: &FrameInput) -> Option<FrameFeatures> {
        let face = frame.face.as_ref().filter(|face| !face.is_empty())?;
        let (width, height) = (frame.width, frame.height);

        let angles = self.pose_estimator.estimate(face, width, height);
        let eye_line_roll = eye_line_roll(face, width, height);
        let euler_roll = angles.map(|a| a.roll);
        let shoulder_tilt = frame
            .pose
            .as_ref()
            .and_then(|pose| shoulder_tilt(pose, width, height, self.min_shoulder_visibility));

        let metrics = Metrics {
            pitch: angles.map(|a| a.pitch),
            yaw: angles.map(|a| a.yaw),
            roll: eye_line_roll.or(euler_roll),
            distance: estimate_distance(face, width, height),
            shoulder_tilt,
        };

        Some(FrameFeatures {
            metrics,
            euler_roll,
            eye_line_roll,
            face_bbox: face_bounding_box(face, width, height, self.face_bbox_padding),
            shoulder_detection_active: shoulder_tilt.is_some(),
        })
    }
}

/// Angle of the line through two points relative to horizontal, folded into [-90, 90]
fn line_angle(a: &Landmark, b: &Landmark, width: u32, height: u32) -> Option<f64> {
    let (ax, ay) = a.to_pixels(width, height);
    let (bx, by) = b.to_pixels(width, height);
    let (dx, dy) = (bx - ax, by - ay);
    if dx.hypot(dy) < EPSILON {
        return None;
    }
    Some(crate::pose_estimation::normalize_tilt(dy.atan2(dx).to_degrees()))
}

/// Head roll from the outer eye corners; stays reliable when the head is turned
pub fn eye_line_roll(face: &LandmarkSet, width: u32, height: u32) -> Option<f64> {
    line_angle(face.get(RIGHT_EYE_OUTER)?, face.get(LEFT_EYE_OUTER)?, width, height)
}

/// Camera distance in centimeters from the pupil separation (similar triangles)
pub fn estimate_distance(face: &LandmarkSet, width: u32, height: u32) -> Option<f64> {
    let (rx, ry) = face.get(RIGHT_PUPIL)?.to_pixels(width, height);
    let (lx, ly) = face.get(LEFT_PUPIL)?.to_pixels(width, height);
    let pixel_distance = (lx - rx).hypot(ly - ry);
    if pixel_distance < EPSILON {
        return None;
    }
    let focal_length = CameraIntrinsics::from_frame(width, height).focal_length;
    Some(focal_length * AVERAGE_IPD_CM / pixel_distance)
}

/// Shoulder line angle, `None` if shoulders are missing or not visible enough
pub fn shoulder_tilt(pose: &LandmarkSet, width: u32, height: u32, min_visibility: f64) -> Option<f64> {
    if pose.len() < MIN_POSE_LANDMARKS {
        return None;
    }
    let left = pose.get(LEFT_SHOULDER)?;
    let right = pose.get(RIGHT_SHOULDER)?;
    let visible = |p: &Landmark| p.visibility.map_or(true, |v| v >= min_visibility);
    if !visible(left) || !visible(right) {
        return None;
    }
    line_angle(right, left, width, height)
}
