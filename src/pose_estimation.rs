use crate::{
    constants::{CHIN, GIMBAL_LOCK_EPSILON, LEFT_EYE_OUTER, LEFT_MOUTH_CORNER, NOSE_TIP, RIGHT_EYE_OUTER, RIGHT_MOUTH_CORNER},
    landmarks::LandmarkSet,
    solver::{CameraIntrinsics, PerspectiveSolver, PositSolver},
};
use nalgebra::{Matrix3, Point2, Point3};

/// Face mesh indices paired with [`FACE_MODEL_POINTS`], in the same order
pub const FACE_MODEL_INDICES: [usize; 6] = [
    NOSE_TIP,
    CHIN,
    RIGHT_EYE_OUTER,
    LEFT_EYE_OUTER,
    RIGHT_MOUTH_CORNER,
    LEFT_MOUTH_CORNER,
];

/// Generic 3D face model in millimeters, nose tip at the origin, y up
pub const FACE_MODEL_POINTS: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [0.0, -330.0, -65.0],
    [-225.0, 170.0, -135.0],
    [225.0, 170.0, -135.0],
    [-150.0, -150.0, -125.0],
    [150.0, -150.0, -125.0],
];

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Head pose estimator using a `PnP` solve against a fixed face model
pub struct PoseEstimator {
    solver: Box<dyn PerspectiveSolver>,
    model_points: Vec<Point3<f64>>,
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new(Box::new(PositSolver::default()))
    }
}

impl PoseEstimator {
    /// Create a new pose estimator around the given solver
    pub fn new(solver: Box<dyn PerspectiveSolver>) -> Self {
        log::info!("Initializing PoseEstimator with {}", solver.name());
        let model_points = FACE_MODEL_POINTS
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect();
        Self { solver, model_points }
    }

    /// Name of the underlying solver
    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Estimate head pitch/yaw/roll from face mesh landmarks.
    ///
    /// Pitch is negative when looking down, roll is folded into [-90, 90].
    /// Returns `None` if a model landmark is missing or the solver fails.
    pub fn estimate(&self, face: &LandmarkSet, width: u32, height: u32) -> Option<EulerAngles> {
        let image_points = FACE_MODEL_INDICES
            .iter()
            .map(|&index| {
                face.get(index).map(|p| {
                    let (x, y) = p.to_pixels(width, height);
                    Point2::new(x, y)
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let camera = CameraIntrinsics::from_frame(width, height);
        let Some(solution) = self.solver.solve(&self.model_points, &image_points, &camera) else {
            log::debug!("{} failed to solve head pose", self.solver.name());
            return None;
        };

        let raw = rotation_matrix_to_euler(&solution.rotation);
        Some(EulerAngles {
            pitch: remap_pitch(raw.pitch),
            yaw: raw.yaw,
            roll: normalize_tilt(raw.roll),
        })
    }
}

/// Convert rotation matrix to Euler angles in degrees (x-y-z decomposition)
pub fn rotation_matrix_to_euler(r: &Matrix3<f64>) -> EulerAngles {
    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();

    let (pitch, yaw, roll) = if sy < GIMBAL_LOCK_EPSILON {
        ((-r[(1, 2)]).atan2(r[(1, 1)]), (-r[(2, 0)]).atan2(sy), 0.0)
    } else {
        (
            r[(2, 1)].atan2(r[(2, 2)]),
            (-r[(2, 0)]).atan2(sy),
            r[(1, 0)].atan2(r[(0, 0)]),
        )
    };

    EulerAngles {
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// The y-up face model seen by a y-down camera sits near ±180° pitch;
/// fold that so a level head is 0 and looking down is negative.
pub fn remap_pitch(pitch: f64) -> f64 {
    if pitch > 0.0 {
        180.0 - pitch
    } else {
        -180.0 - pitch
    }
}

/// Fold an angle from (-180, 180] into [-90, 90] (deviation from level)
pub fn normalize_tilt(angle: f64) -> f64 {
    if angle > 90.0 {
        angle - 180.0
    } else if angle < -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn rotation(x_deg: f64, y_deg: f64, z_deg: f64) -> Matrix3<f64> {
        *Rotation3::from_euler_angles(x_deg.to_radians(), y_deg.to_radians(), z_deg.to_radians()).matrix()
    }

    #[test]
    fn test_euler_angle_conversion() {
        let angles = rotation_matrix_to_euler(&Matrix3::identity());
        assert!(angles.pitch.abs() < 1e-9);
        assert!(angles.yaw.abs() < 1e-9);
        assert!(angles.roll.abs() < 1e-9);
    }

    #[test]
    fn test_euler_roll_rotation() {
        let angles = rotation_matrix_to_euler(&rotation(0.0, 0.0, 15.0));
        assert!((angles.roll - 15.0).abs() < 1e-9);
        assert!(angles.pitch.abs() < 1e-9);
        assert!(angles.yaw.abs() < 1e-9);
    }

    #[test]
    fn test_euler_combined_rotation() {
        let angles = rotation_matrix_to_euler(&rotation(10.0, -20.0, 5.0));
        assert!((angles.pitch - 10.0).abs() < 1e-9);
        assert!((angles.yaw + 20.0).abs() < 1e-9);
        assert!((angles.roll - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_euler_gimbal_lock() {
        // 90° about y: R00 = R10 = 0
        let angles = rotation_matrix_to_euler(&rotation(0.0, 90.0, 0.0));
        assert!((angles.yaw - 90.0).abs() < 1e-6);
        assert_eq!(angles.roll, 0.0);
    }

    #[test]
    fn test_remap_pitch() {
        assert_eq!(remap_pitch(180.0), 0.0);
        assert_eq!(remap_pitch(170.0), 10.0);
        assert_eq!(remap_pitch(-170.0), -10.0);
        assert_eq!(remap_pitch(-180.0), 0.0);
    }

    #[test]
    fn test_normalize_tilt() {
        assert_eq!(normalize_tilt(10.0), 10.0);
        assert_eq!(normalize_tilt(-90.0), -90.0);
        assert_eq!(normalize_tilt(175.0), -5.0);
        assert_eq!(normalize_tilt(-170.0), 10.0);
    }

    #[test]
    fn test_estimate_missing_landmarks() {
        let estimator = PoseEstimator::default();
        let face = LandmarkSet::default();
        assert!(estimator.estimate(&face, 640, 480).is_none());
    }
}
