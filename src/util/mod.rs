use crate::camera::Camera;
use crate::error::{check_len, PoseError};
use crate::geometry::{check_cameras, Rigid3};
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod synthetic;

#[derive(thiserror::Error, Debug)]
pub enum UtilError {
    #[error("Zero projection points")]
    ZeroProjectionPoints,
    #[error(transparent)]
    Pose(#[from] PoseError),
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProjectionError {
    pub rmse: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
}

impl fmt::Debug for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Projection Error [ rmse: {}, min: {}, max: {}, mean: {}, stddev: {}, median: {} ]",
            self.rmse, self.min, self.max, self.mean, self.stddev, self.median
        )
    }
}

impl ProjectionError {
    fn from_errors(mut errors: Vec<f64>) -> Result<Self, UtilError> {
        if errors.is_empty() {
            return Err(UtilError::ZeroProjectionPoints);
        }

        let n = errors.len() as f64;
        let mean = errors.iter().sum::<f64>() / n;
        let variance = errors.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let rmse = (errors.iter().map(|x| x.powi(2)).sum::<f64>() / n).sqrt();

        errors.sort_by(|a, b| a.total_cmp(b));
        let mid = errors.len() / 2;
        let median = if errors.len() % 2 == 0 {
            (errors[mid - 1] + errors[mid]) / 2.0
        } else {
            errors[mid]
        };

        Ok(ProjectionError {
            rmse,
            min: errors[0],
            max: errors[errors.len() - 1],
            mean,
            stddev: variance.sqrt(),
            median,
        })
    }
}

/// Pixel reprojection error statistics of a rig pose.
///
/// Only correspondences flagged in `inlier_mask` take part, all of them when
/// the mask is `None`. Points that do not project are skipped.
///
/// # Errors
///
/// Structural [`PoseError`]s for inconsistent inputs, and
/// [`UtilError::ZeroProjectionPoints`] if no correspondence could be evaluated.
pub fn compute_reprojection_error(
    points2d: &[Vector2<f64>],
    points3d: &[Vector3<f64>],
    camera_idxs: &[usize],
    cams_from_rig: &[Rigid3],
    rig_from_world: &Rigid3,
    cameras: &[Camera],
    inlier_mask: Option<&[bool]>,
) -> Result<ProjectionError, UtilError> {
    check_len("points3d", points2d.len(), points3d.len())?;
    check_len("camera_idxs", points2d.len(), camera_idxs.len())?;
    if let Some(mask) = inlier_mask {
        check_len("inlier_mask", points2d.len(), mask.len())?;
    }
    check_cameras(camera_idxs, cams_from_rig, cameras)?;

    let errors = (0..points2d.len())
        .filter(|&i| inlier_mask.map_or(true, |mask| mask[i]))
        .filter_map(|i| {
            let camera_idx = camera_idxs[i];
            let point_in_cam =
                (cams_from_rig[camera_idx] * rig_from_world).transform_point(&Point3::from(points3d[i]));
            let projected = cameras[camera_idx].img_from_cam(&point_in_cam.coords)?;
            Some((projected - points2d[i]).norm())
        })
        .collect();

    ProjectionError::from_errors(errors)
}
