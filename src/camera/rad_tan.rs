//! Implements the Radial-Tangential (RadTan) camera model.
//!
//! This module provides [`RadTanModel`], a pinhole model extended with the
//! Brown-Conrady lens distortion: three radial coefficients (`k1`, `k2`, `k3`)
//! and two tangential coefficients (`p1`, `p2`). The parameter layout follows
//! the OpenCV convention `[fx, fy, cx, cy, k1, k2, p1, p2, k3]`.
//!
//! Projection applies the distortion in closed form. Back-projection inverts it
//! with a Newton iteration on the normalized image plane.

use crate::camera::CameraModel;
use nalgebra::{Matrix2, RealField, Vector2, Vector3};

/// Tolerance on the distortion residual and on the Newton step.
const UNDISTORT_EPS: f64 = 1e-10;
const UNDISTORT_MAX_ITERATIONS: usize = 100;

/// Radial-tangential camera model with parameters
/// `[fx, fy, cx, cy, k1, k2, p1, p2, k3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadTanModel;

impl RadTanModel {
    /// Applies the distortion to an undistorted normalized point.
    fn distort<T: RealField>(params: &[T], x: T, y: T) -> (T, T) {
        let k1 = params[4].clone();
        let k2 = params[5].clone();
        let p1 = params[6].clone();
        let p2 = params[7].clone();
        let k3 = params[8].clone();
        let two: T = nalgebra::convert(2.0);

        let r2 = x.clone() * x.clone() + y.clone() * y.clone();
        let r4 = r2.clone() * r2.clone();
        let r6 = r4.clone() * r2.clone();
        let radial = T::one() + k1 * r2.clone() + k2 * r4 + k3 * r6;
        let xy = x.clone() * y.clone();

        let x_distorted = x.clone() * radial.clone()
            + two.clone() * p1.clone() * xy.clone()
            + p2.clone() * (r2.clone() + two.clone() * x.clone() * x);
        let y_distorted = y.clone() * radial
            + p1 * (r2 + two.clone() * y.clone() * y)
            + two * p2 * xy;
        (x_distorted, y_distorted)
    }

    /// Jacobian of [`RadTanModel::distort`] with respect to the undistorted point.
    fn distortion_jacobian(params: &[f64], x: f64, y: f64) -> Matrix2<f64> {
        let (k1, k2, p1, p2, k3) = (params[4], params[5], params[6], params[7], params[8]);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let radial = 1.0 + k1 * r2 + k2 * r4 + k3 * r4 * r2;
        // d(radial)/d(r2)
        let d_radial = k1 + 2.0 * k2 * r2 + 3.0 * k3 * r4;
        let d_radial_dx = d_radial * 2.0 * x;
        let d_radial_dy = d_radial * 2.0 * y;

        let j00 = radial + x * d_radial_dx + 2.0 * p1 * y + 6.0 * p2 * x;
        let j01 = x * d_radial_dy + 2.0 * p1 * x + 2.0 * p2 * y;
        let j10 = y * d_radial_dx + 2.0 * p1 * x + 2.0 * p2 * y;
        let j11 = radial + y * d_radial_dy + 6.0 * p1 * y + 2.0 * p2 * x;
        Matrix2::new(j00, j01, j10, j11)
    }
}

impl CameraModel for RadTanModel {
    const NAME: &'static str = "rad_tan";
    const NUM_PARAMS: usize = 9;
    const FOCAL_LENGTH_IDXS: &'static [usize] = &[0, 1];
    const PRINCIPAL_POINT_IDXS: &'static [usize] = &[2, 3];
    const EXTRA_PARAMS_IDXS: &'static [usize] = &[4, 5, 6, 7, 8];

    fn img_from_cam<T: RealField>(params: &[T], point: &Vector3<T>) -> Option<Vector2<T>> {
        let eps: T = nalgebra::convert(f64::EPSILON);
        if point.z <= eps {
            return None;
        }
        let x = point.x.clone() / point.z.clone();
        let y = point.y.clone() / point.z.clone();
        let (x_distorted, y_distorted) = Self::distort(params, x, y);
        Some(Vector2::new(
            params[0].clone() * x_distorted + params[2].clone(),
            params[1].clone() * y_distorted + params[3].clone(),
        ))
    }

    /// Removes the distortion from a pixel with Newton's method.
    ///
    /// The iteration starts at the distorted normalized point. `None` is returned
    /// when the distortion Jacobian becomes singular or the iteration fails to
    /// converge, which marks the pixel as outside the invertible domain.
    fn cam_from_img(params: &[f64], pixel: &Vector2<f64>) -> Option<Vector2<f64>> {
        if params[0] == 0.0 || params[1] == 0.0 {
            return None;
        }
        let target = Vector2::new(
            (pixel.x - params[2]) / params[0],
            (pixel.y - params[3]) / params[1],
        );
        let mut point = target;

        for _ in 0..UNDISTORT_MAX_ITERATIONS {
            let (xd, yd) = Self::distort(params, point.x, point.y);
            let error = Vector2::new(xd, yd) - target;
            if error.norm() < UNDISTORT_EPS {
                return Some(point);
            }

            let delta = Self::distortion_jacobian(params, point.x, point.y).try_inverse()? * error;
            point -= delta;
            if !point.x.is_finite() || !point.y.is_finite() {
                return None;
            }
            if delta.norm() < UNDISTORT_EPS {
                return Some(point);
            }
        }
        None
    }
}
