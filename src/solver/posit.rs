use super::{CameraIntrinsics, PerspectiveSolver, PoseSolution};
use crate::constants::EPSILON;
use nalgebra::{Matrix3, Point2, Point3, Vector3};

/// POSIT (Pose from Orthography and Scaling with ITerations)
///
/// Starts from a scaled orthographic projection and refines the per-point
/// perspective corrections until they stop changing. Needs at least four
/// non-coplanar model points; the first model point is the reference point.
pub struct PositSolver {
    max_iterations: usize,
    tolerance: f64,
}

impl PositSolver {
    /// Create a new POSIT solver
    ///
    /// # Panics
    ///
    /// Panics if `max_iterations` is zero or `tolerance` is not positive
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        assert!(max_iterations > 0, "Iteration count must be greater than 0");
        assert!(tolerance > 0.0, "Tolerance must be positive, got {}", tolerance);
        Self { max_iterations, tolerance }
    }
}

impl Default for PositSolver {
    fn default() -> Self {
        Self::new(100, 1e-9)
    }
}

impl PerspectiveSolver for PositSolver {
    fn solve(
        &self,
        model_points: &[Point3<f64>],
        image_points: &[Point2<f64>],
        camera: &CameraIntrinsics,
    ) -> Option<PoseSolution> {
        if model_points.len() != image_points.len() || model_points.len() < 4 {
            return None;
        }
        let focal = camera.focal_length;
        if focal <= EPSILON {
            return None;
        }

        let origin = model_points[0];
        let offsets: Vec<Vector3<f64>> = model_points[1..].iter().map(|p| p - origin).collect();

        // Least squares object matrix (A^T A)^-1, singular for coplanar models
        let ata = offsets
            .iter()
            .fold(Matrix3::zeros(), |acc, a| acc + a * a.transpose());
        let ata_inv = ata.try_inverse()?;

        let centered: Vec<(f64, f64)> = image_points
            .iter()
            .map(|p| (p.x - camera.center.x, p.y - camera.center.y))
            .collect();
        let (x0, y0) = centered[0];

        let mut corrections = vec![0.0; offsets.len()];

        for iteration in 0..self.max_iterations {
            let mut sum_x = Vector3::zeros();
            let mut sum_y = Vector3::zeros();
            for ((offset, &(x, y)), eps) in offsets.iter().zip(&centered[1..]).zip(&corrections) {
                sum_x += offset * (x * (1.0 + eps) - x0);
                sum_y += offset * (y * (1.0 + eps) - y0);
            }

            let i_vec = ata_inv * sum_x;
            let j_vec = ata_inv * sum_y;
            let (i_norm, j_norm) = (i_vec.norm(), j_vec.norm());
            if i_norm < EPSILON || j_norm < EPSILON {
                return None;
            }

            let scale = (i_norm + j_norm) / 2.0;
            let row_i = i_vec / i_norm;
            let row_k = row_i.cross(&(j_vec / j_norm));
            let k_norm = row_k.norm();
            if k_norm < EPSILON {
                return None;
            }
            let row_k = row_k / k_norm;
            let row_j = row_k.cross(&row_i);
            let z0 = focal / scale;

            let mut max_change: f64 = 0.0;
            for (offset, eps) in offsets.iter().zip(corrections.iter_mut()) {
                let next = offset.dot(&row_k) / z0;
                max_change = max_change.max((next - *eps).abs());
                *eps = next;
            }

            if max_change < self.tolerance {
                let rotation = Matrix3::from_rows(&[row_i.transpose(), row_j.transpose(), row_k.transpose()]);
                let reference = Vector3::new(x0 * z0 / focal, y0 * z0 / focal, z0);
                log::trace!("POSIT converged after {} iterations", iteration + 1);
                return Some(PoseSolution {
                    rotation,
                    translation: reference - rotation * origin.coords,
                });
            }
        }

        log::debug!("POSIT did not converge within {} iterations", self.max_iterations);
        None
    }

    fn name(&self) -> &str {
        "PositSolver"
    }
}
