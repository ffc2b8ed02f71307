//! Implements the Pinhole camera model.
//!
//! This module provides [`PinholeModel`], the simplest camera model supported by
//! the crate. It assumes no lens distortion and is parameterized by focal lengths
//! and the principal point only. It adheres to the [`CameraModel`] trait defined
//! in the parent `camera` module ([`crate::camera`]).

use crate::camera::CameraModel;
use nalgebra::{RealField, Vector2, Vector3};

/// Pinhole camera model with parameters `[fx, fy, cx, cy]`.
///
/// # Examples
///
/// ```rust
/// use nalgebra::{Vector2, Vector3};
/// use rig_pose::camera::{pinhole::PinholeModel, CameraModel};
///
/// let params = [500.0, 500.0, 320.0, 240.0];
/// let pixel = PinholeModel::img_from_cam(&params, &Vector3::new(0.0, 0.0, 2.0)).unwrap();
/// assert_eq!(pixel, Vector2::new(320.0, 240.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinholeModel;

impl CameraModel for PinholeModel {
    const NAME: &'static str = "pinhole";
    const NUM_PARAMS: usize = 4;
    const FOCAL_LENGTH_IDXS: &'static [usize] = &[0, 1];
    const PRINCIPAL_POINT_IDXS: &'static [usize] = &[2, 3];
    const EXTRA_PARAMS_IDXS: &'static [usize] = &[];

    /// Projects a camera-frame point to pixel coordinates.
    ///
    /// # Arguments
    ///
    /// * `params` - `[fx, fy, cx, cy]`.
    /// * `point` - Point in the camera frame.
    ///
    /// # Return Value
    ///
    /// `None` if the point lies at or behind the camera plane.
    fn img_from_cam<T: RealField>(params: &[T], point: &Vector3<T>) -> Option<Vector2<T>> {
        let eps: T = nalgebra::convert(f64::EPSILON);
        if point.z <= eps {
            return None;
        }
        let x = point.x.clone() / point.z.clone();
        let y = point.y.clone() / point.z.clone();
        Some(Vector2::new(
            params[0].clone() * x + params[2].clone(),
            params[1].clone() * y + params[3].clone(),
        ))
    }

    /// Maps a pixel to the normalized image plane.
    ///
    /// Every pixel has a pre-image, so this only yields `None` for degenerate
    /// focal lengths.
    fn cam_from_img(params: &[f64], pixel: &Vector2<f64>) -> Option<Vector2<f64>> {
        if params[0] == 0.0 || params[1] == 0.0 {
            return None;
        }
        Some(Vector2::new(
            (pixel.x - params[2]) / params[0],
            (pixel.y - params[3]) / params[1],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Tests that projecting and back-projecting recovers the normalized coordinates.
    #[test]
    fn test_pinhole_project_unproject() {
        let params = [461.629, 460.152, 362.680, 246.049];
        let point_3d = Vector3::new(1.0, 1.0, 5.0);

        let pixel = PinholeModel::img_from_cam(&params, &point_3d).unwrap();
        let normalized = PinholeModel::cam_from_img(&params, &pixel).unwrap();

        assert_relative_eq!(normalized.x, 0.2, epsilon = 1e-12);
        assert_relative_eq!(normalized.y, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_pinhole_rejects_points_behind_camera() {
        let params = [500.0, 500.0, 320.0, 240.0];
        assert!(PinholeModel::img_from_cam(&params, &Vector3::new(0.1, 0.2, -1.0)).is_none());
        assert!(PinholeModel::img_from_cam(&params, &Vector3::new(0.1, 0.2, 0.0)).is_none());
    }

    #[test]
    fn test_pinhole_threshold_uses_mean_focal_length() {
        let params = [400.0, 600.0, 320.0, 240.0];
        assert_relative_eq!(PinholeModel::cam_from_img_threshold(&params, 5.0), 0.01);
    }
}
