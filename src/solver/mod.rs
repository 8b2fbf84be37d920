//! Perspective-n-Point solving.
//!
//! The feature extractor only needs a rotation (and translation) for a fixed
//! 3D face model given its 2D projections. Anything that can answer that
//! question implements [`PerspectiveSolver`]; the crate ships a pure Rust
//! POSIT solver and, behind the `opencv` feature, OpenCV's iterative `solvePnP`.

/// Iterative POSIT solver built on nalgebra
pub mod posit;

/// OpenCV `solvePnP` backed solver
#[cfg(feature = "opencv")]
pub mod opencv;

use crate::constants::CAMERA_CENTER_FACTOR;
use nalgebra::{Matrix3, Point2, Point3, Vector3};

pub use posit::PositSolver;

/// Pinhole camera intrinsics, lens distortion assumed to be zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub focal_length: f64,
    pub center: Point2<f64>,
}

impl CameraIntrinsics {
    /// Typical webcam approximation: focal length equals frame width,
    /// principal point at the frame center
    pub fn from_frame(width: u32, height: u32) -> Self {
        Self {
            focal_length: f64::from(width),
            center: Point2::new(
                f64::from(width) / CAMERA_CENTER_FACTOR,
                f64::from(height) / CAMERA_CENTER_FACTOR,
            ),
        }
    }

    /// Row-major 3x3 camera matrix
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focal_length, 0.0, self.center.x,
            0.0, self.focal_length, self.center.y,
            0.0, 0.0, 1.0,
        )
    }
}

/// Model-to-camera transform: `camera = rotation * model + translation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSolution {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// Trait for all perspective pose solvers
pub trait PerspectiveSolver: Send + Sync {
    /// Solve for the pose of `model_points` given their projections.
    /// Returns `None` when the solver fails to produce a pose.
    fn solve(
        &self,
        model_points: &[Point3<f64>],
        image_points: &[Point2<f64>],
        camera: &CameraIntrinsics,
    ) -> Option<PoseSolution>;

    /// Get solver name
    fn name(&self) -> &str;
}
