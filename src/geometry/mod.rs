//! Rig geometry helpers shared by the estimators and the refiner.
//!
//! Everything here is a pure function of its inputs: precondition checks on
//! correspondence sets, unique 3D point ids, panoramic rig detection and the
//! averaging of per-camera error thresholds.

use crate::camera::Camera;
use crate::error::PoseError;
use nalgebra::{Isometry3, Vector2, Vector3};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Rigid body transform: unit quaternion rotation followed by a translation.
pub type Rigid3 = Isometry3<f64>;

/// Per-axis tolerance under which two 3D points count as the same point.
pub const UNIQUE_POINT_TOLERANCE: f64 = 1e-5;

/// Per-axis tolerance under which two camera centers coincide.
pub const PANORAMIC_CENTER_TOLERANCE: f64 = 1e-6;

/// A back-projected observation paired with the extrinsic of its camera.
///
/// `ray_in_cam` is a unit vector in the camera frame, or `None` when the
/// pixel could not be back-projected. Kernels never count such observations
/// as inliers.
#[derive(Debug, Clone, PartialEq)]
pub struct RigRay {
    pub ray_in_cam: Option<Vector3<f64>>,
    pub cam_from_rig: Rigid3,
}

impl RigRay {
    /// Ray direction rotated into the rig frame.
    pub fn ray_in_rig(&self) -> Option<Vector3<f64>> {
        self.ray_in_cam
            .map(|ray| self.cam_from_rig.rotation.inverse_transform_vector(&ray))
    }

    /// Optical center of the camera in the rig frame.
    pub fn center_in_rig(&self) -> Vector3<f64> {
        camera_center_in_rig(&self.cam_from_rig)
    }

    /// Plücker coordinates `(direction, moment)` of the viewing line in the rig frame.
    pub fn plucker_in_rig(&self) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let direction = self.ray_in_rig()?;
        Some((direction, self.center_in_rig().cross(&direction)))
    }
}

/// Optical center `rotation⁻¹ · (−translation)` of a camera in rig coordinates.
pub fn camera_center_in_rig(cam_from_rig: &Rigid3) -> Vector3<f64> {
    cam_from_rig
        .rotation
        .inverse_transform_vector(&(-cam_from_rig.translation.vector))
}

fn approx_equal_per_axis(a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> bool {
    (a - b).iter().all(|d| d.abs() <= tolerance)
}

/// Checks the rig description and the camera indices of one correspondence set.
///
/// # Errors
///
/// * [`PoseError::NoCameras`] if `cameras` is empty.
/// * [`PoseError::RigSizeMismatch`] if the extrinsics and cameras differ in length.
/// * [`PoseError::CameraIndexOutOfRange`] for the first index outside `[0, cameras.len())`.
/// * [`PoseError::Camera`] if a camera has the wrong number of parameters or
///   an invalid focal length or principal point.
pub fn check_cameras(
    camera_idxs: &[usize],
    cams_from_rig: &[Rigid3],
    cameras: &[Camera],
) -> Result<(), PoseError> {
    if cameras.is_empty() {
        return Err(PoseError::NoCameras);
    }
    if cams_from_rig.len() != cameras.len() {
        return Err(PoseError::RigSizeMismatch {
            cams_from_rig: cams_from_rig.len(),
            cameras: cameras.len(),
        });
    }
    if let Some(&index) = camera_idxs.iter().find(|&&idx| idx >= cameras.len()) {
        return Err(PoseError::CameraIndexOutOfRange {
            index,
            num_cameras: cameras.len(),
        });
    }
    for camera in cameras {
        camera.validate_params()?;
    }
    Ok(())
}

/// Returns whether all cameras referenced by `camera_idxs` share one optical center.
///
/// Only referenced cameras take part. The camera with the smallest index is the
/// reference, so the answer does not depend on the order of `camera_idxs`. An
/// empty reference set is not panoramic.
pub fn is_panoramic_rig(camera_idxs: &[usize], cams_from_rig: &[Rigid3]) -> bool {
    let referenced: BTreeSet<usize> = camera_idxs.iter().copied().collect();
    let mut referenced = referenced.into_iter();
    let Some(reference_idx) = referenced.next() else {
        return false;
    };
    let reference_center = camera_center_in_rig(&cams_from_rig[reference_idx]);
    referenced.all(|idx| {
        approx_equal_per_axis(
            &camera_center_in_rig(&cams_from_rig[idx]),
            &reference_center,
            PANORAMIC_CENTER_TOLERANCE,
        )
    })
}

fn lexicographic_order(a: &Vector3<f64>, b: &Vector3<f64>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.z.total_cmp(&b.z))
}

/// Assigns ids to 3D points such that nearby points share an id.
///
/// Points are visited in lexicographic `(x, y, z)` order while tracking a
/// representative. The representative moves to the current point whenever the
/// two differ by more than [`UNIQUE_POINT_TOLERANCE`] on some axis, and every
/// point receives the sorted position of its representative as id. Grouping is
/// therefore relative to the representative, not to the previous point. All ids
/// lie in `[0, points3d.len())`.
pub fn compute_unique_point_ids(points3d: &[Vector3<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points3d.len()).collect();
    order.sort_by(|&a, &b| lexicographic_order(&points3d[a], &points3d[b]));

    let mut ids = vec![0; points3d.len()];
    let mut representative = 0;
    for (position, &point_idx) in order.iter().enumerate() {
        if !approx_equal_per_axis(
            &points3d[point_idx],
            &points3d[order[representative]],
            UNIQUE_POINT_TOLERANCE,
        ) {
            representative = position;
        }
        ids[point_idx] = representative;
    }
    ids
}

/// Averages the pixel threshold converted into each correspondence's camera units.
///
/// The mean is taken once per correspondence, so cameras with more
/// correspondences weigh more. A running mean keeps the result exact when all
/// correspondences share one camera.
pub fn compute_max_error_in_camera(camera_idxs: &[usize], cameras: &[Camera], max_error_px: f64) -> f64 {
    let mut mean = 0.0;
    for (count, &camera_idx) in camera_idxs.iter().enumerate() {
        let error = cameras[camera_idx].cam_from_img_threshold(max_error_px);
        mean += (error - mean) / (count + 1) as f64;
    }
    mean
}

/// Back-projects every pixel through its camera and pairs it with the camera extrinsic.
pub fn compute_rig_rays(
    points2d: &[Vector2<f64>],
    camera_idxs: &[usize],
    cams_from_rig: &[Rigid3],
    cameras: &[Camera],
) -> Vec<RigRay> {
    points2d
        .iter()
        .zip(camera_idxs)
        .map(|(point2d, &camera_idx)| RigRay {
            ray_in_cam: cameras[camera_idx].ray_from_img(point2d),
            cam_from_rig: cams_from_rig[camera_idx],
        })
        .collect()
}
