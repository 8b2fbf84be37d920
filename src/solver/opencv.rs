use super::{CameraIntrinsics, PerspectiveSolver, PoseSolution};
use crate::Result;
use nalgebra::{Matrix3, Point2, Point3, Vector3};
use opencv::{
    calib3d,
    core::{Mat, Point2f, Point3f, Vector},
    prelude::*,
};

/// Solver backed by OpenCV's iterative `solvePnP`, zero lens distortion
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvSolver;

impl OpenCvSolver {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::cast_possible_truncation)] // solvePnP takes f32 point lists
    fn try_solve(
        &self,
        model_points: &[Point3<f64>],
        image_points: &[Point2<f64>],
        camera: &CameraIntrinsics,
    ) -> Result<Option<PoseSolution>> {
        let object: Vector<Point3f> = model_points
            .iter()
            .map(|p| Point3f::new(p.x as f32, p.y as f32, p.z as f32))
            .collect();
        let image: Vector<Point2f> = image_points
            .iter()
            .map(|p| Point2f::new(p.x as f32, p.y as f32))
            .collect();

        let intrinsics = camera.matrix();
        let mut camera_matrix = Mat::zeros(3, 3, opencv::core::CV_64F)?.to_mat()?;
        for i in 0..3 {
            for j in 0..3 {
                *camera_matrix.at_2d_mut::<f64>(i, j)? = intrinsics[(i as usize, j as usize)];
            }
        }

        // Assume no lens distortion
        let dist_coeffs = Mat::zeros(4, 1, opencv::core::CV_64F)?.to_mat()?;

        let mut rvec = Mat::default();
        let mut tvec = Mat::default();
        let solved = calib3d::solve_pnp(
            &object,
            &image,
            &camera_matrix,
            &dist_coeffs,
            &mut rvec,
            &mut tvec,
            false,
            calib3d::SOLVEPNP_ITERATIVE,
        )?;
        if !solved {
            return Ok(None);
        }

        let mut rotation_matrix = Mat::default();
        calib3d::rodrigues(&rvec, &mut rotation_matrix, &mut Mat::default())?;

        let mut rotation = Matrix3::zeros();
        for i in 0..3 {
            for j in 0..3 {
                rotation[(i as usize, j as usize)] = *rotation_matrix.at_2d::<f64>(i, j)?;
            }
        }
        let translation = Vector3::new(
            *tvec.at_2d::<f64>(0, 0)?,
            *tvec.at_2d::<f64>(1, 0)?,
            *tvec.at_2d::<f64>(2, 0)?,
        );

        Ok(Some(PoseSolution { rotation, translation }))
    }
}

impl PerspectiveSolver for OpenCvSolver {
    fn solve(
        &self,
        model_points: &[Point3<f64>],
        image_points: &[Point2<f64>],
        camera: &CameraIntrinsics,
    ) -> Option<PoseSolution> {
        match self.try_solve(model_points, image_points, camera) {
            Ok(solution) => solution,
            Err(e) => {
                log::debug!("solvePnP failed: {}", e);
                None
            }
        }
    }

    fn name(&self) -> &str {
        "OpenCvSolver"
    }
}
