use crate::camera::Camera;
use crate::error::{check_len, PoseError};
use crate::geometry::{check_cameras, compute_rig_rays, is_panoramic_rig, Rigid3};
use crate::ransac::{InlierSupportMeasurer, LoRansac, RansacOptions};
use crate::solvers::essential::pose_from_essential;
use crate::solvers::{EssentialEightPointEstimator, EssentialFivePointEstimator, Gr6pEstimator, Gr8pEstimator};
use log::debug;
use nalgebra::{Vector2, Vector3};

/// Relative pose between two placements of a rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelativePose {
    /// Full metric motion of the rig frame.
    Rig(Rigid3),
    /// Motion of the shared optical center of a panoramic rig, with unit
    /// translation. The frame is the rig frame moved to the common center.
    Panoramic(Rigid3),
}

#[derive(Debug, Clone)]
pub struct RelativePoseEstimate {
    pub pose: RelativePose,
    pub num_inliers: usize,
    pub inlier_mask: Vec<bool>,
}

impl RelativePoseEstimate {
    pub fn rig2_from_rig1(&self) -> Option<Rigid3> {
        match self.pose {
            RelativePose::Rig(pose) => Some(pose),
            RelativePose::Panoramic(_) => None,
        }
    }

    pub fn pano2_from_pano1(&self) -> Option<Rigid3> {
        match self.pose {
            RelativePose::Panoramic(pose) => Some(pose),
            RelativePose::Rig(_) => None,
        }
    }
}

/// Estimates the relative pose of a rig from 2D-2D correspondences between two
/// of its placements.
///
/// `options.max_error` is in normalized ray units. When the cameras referenced
/// by both views share one optical center, translation scale is unobservable
/// and the problem reduces to a central two-view estimate, reported as
/// [`RelativePose::Panoramic`]. Otherwise the generalized epipolar constraint
/// is solved with LO-RANSAC and the result is [`RelativePose::Rig`].
///
/// # Errors
///
/// The structural checks of the absolute case, applied to both views, plus
/// views of different lengths.
pub fn estimate_generalized_relative_pose(
    options: &RansacOptions,
    points2d1: &[Vector2<f64>],
    points2d2: &[Vector2<f64>],
    camera_idxs1: &[usize],
    camera_idxs2: &[usize],
    cams_from_rig: &[Rigid3],
    cameras: &[Camera],
) -> Result<Option<RelativePoseEstimate>, PoseError> {
    check_len("points2d2", points2d1.len(), points2d2.len())?;
    check_len("camera_idxs1", points2d1.len(), camera_idxs1.len())?;
    check_len("camera_idxs2", points2d1.len(), camera_idxs2.len())?;
    check_cameras(camera_idxs1, cams_from_rig, cameras)?;
    check_cameras(camera_idxs2, cams_from_rig, cameras)?;
    options.check()?;

    if points2d1.is_empty() {
        debug!("No correspondences for relative pose estimation");
        return Ok(None);
    }

    let rig_rays1 = compute_rig_rays(points2d1, camera_idxs1, cams_from_rig, cameras);
    let rig_rays2 = compute_rig_rays(points2d2, camera_idxs2, cams_from_rig, cameras);

    if is_panoramic_rig(camera_idxs1, cams_from_rig) && is_panoramic_rig(camera_idxs2, cams_from_rig) {
        debug!("Cameras share one optical center, estimating panoramic relative pose");
        let rays1: Vec<Option<Vector3<f64>>> = rig_rays1.iter().map(|ray| ray.ray_in_rig()).collect();
        let rays2: Vec<Option<Vector3<f64>>> = rig_rays2.iter().map(|ray| ray.ray_in_rig()).collect();

        let report = LoRansac::new(
            options.clone(),
            EssentialFivePointEstimator,
            EssentialEightPointEstimator,
            InlierSupportMeasurer,
        )
        .estimate(&rays1, &rays2);
        let Some(e) = report.model.filter(|_| report.success) else {
            debug!("Panoramic relative pose estimation failed after {} trials", report.num_trials);
            return Ok(None);
        };
        let Some(pano2_from_pano1) = pose_from_essential(&e, &rays1, &rays2, &report.inlier_mask) else {
            debug!("No essential matrix decomposition has inliers in front of both views");
            return Ok(None);
        };
        return Ok(Some(RelativePoseEstimate {
            pose: RelativePose::Panoramic(pano2_from_pano1),
            num_inliers: report.support.num_inliers,
            inlier_mask: report.inlier_mask,
        }));
    }

    let report = LoRansac::new(options.clone(), Gr6pEstimator, Gr8pEstimator, InlierSupportMeasurer)
        .estimate(&rig_rays1, &rig_rays2);
    let Some(rig2_from_rig1) = report.model.filter(|_| report.success) else {
        debug!("Generalized relative pose estimation failed after {} trials", report.num_trials);
        return Ok(None);
    };
    Ok(Some(RelativePoseEstimate {
        pose: RelativePose::Rig(rig2_from_rig1),
        num_inliers: report.support.num_inliers,
        inlier_mask: report.inlier_mask,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::synthetic::{relative_scene, SyntheticRig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options() -> RansacOptions {
        RansacOptions {
            max_error: 4e-3,
            random_seed: Some(23),
            ..Default::default()
        }
    }

    #[test]
    fn test_preconditions() {
        let rig = SyntheticRig::generalized();
        let points = vec![Vector2::new(100.0, 100.0); 4];

        let result = estimate_generalized_relative_pose(
            &options(),
            &points,
            &points[..3],
            &[0; 4],
            &[0; 4],
            &rig.cams_from_rig,
            &rig.cameras,
        );
        assert!(matches!(result, Err(PoseError::MismatchedLengths { what: "points2d2", .. })));

        let result = estimate_generalized_relative_pose(
            &options(),
            &points,
            &points,
            &[0; 4],
            &[0, 1, 7, 0],
            &rig.cams_from_rig,
            &rig.cameras,
        );
        assert!(matches!(result, Err(PoseError::CameraIndexOutOfRange { index: 7, .. })));

        let empty = estimate_generalized_relative_pose(
            &options(),
            &[],
            &[],
            &[],
            &[],
            &rig.cams_from_rig,
            &rig.cameras,
        );
        assert!(matches!(empty, Ok(None)));
    }

    #[test]
    fn test_separated_centers_yield_rig_pose() {
        let rig = SyntheticRig::generalized();
        let rig2_from_world = Rigid3::new(Vector3::new(0.4, -0.05, -0.3), Vector3::new(0.0, 0.15, 0.02));
        let mut rng = StdRng::seed_from_u64(31);
        let scene = relative_scene(&rig, Rigid3::identity(), rig2_from_world, 80, 0.2, 0.2, &mut rng);

        let estimate = estimate_generalized_relative_pose(
            &options(),
            &scene.points2d1,
            &scene.points2d2,
            &scene.camera_idxs1,
            &scene.camera_idxs2,
            &rig.cams_from_rig,
            &rig.cameras,
        )
        .unwrap()
        .unwrap();

        assert!(estimate.pano2_from_pano1().is_none());
        let rig2_from_rig1 = estimate.rig2_from_rig1().unwrap();
        assert!(rig2_from_rig1.rotation.angle_to(&scene.rig2_from_rig1.rotation) < 0.02);
        assert!((rig2_from_rig1.translation.vector - scene.rig2_from_rig1.translation.vector).norm() < 0.15);
        assert_eq!(estimate.inlier_mask.len(), 80);
        assert_eq!(estimate.inlier_mask.iter().filter(|&&m| m).count(), estimate.num_inliers);
    }

    #[test]
    fn test_shared_center_yields_panoramic_pose() {
        let rig = SyntheticRig::panoramic();
        let rig2_from_world = Rigid3::new(Vector3::new(0.5, 0.1, 0.2), Vector3::new(0.05, -0.2, 0.0));
        let mut rng = StdRng::seed_from_u64(4);
        let scene = relative_scene(&rig, Rigid3::identity(), rig2_from_world, 80, 0.2, 0.2, &mut rng);

        let estimate = estimate_generalized_relative_pose(
            &options(),
            &scene.points2d1,
            &scene.points2d2,
            &scene.camera_idxs1,
            &scene.camera_idxs2,
            &rig.cams_from_rig,
            &rig.cameras,
        )
        .unwrap()
        .unwrap();

        assert!(estimate.rig2_from_rig1().is_none());
        let pano2_from_pano1 = estimate.pano2_from_pano1().unwrap();
        assert!(pano2_from_pano1.rotation.angle_to(&scene.rig2_from_rig1.rotation) < 0.02);
        let direction = scene.rig2_from_rig1.translation.vector.normalize();
        assert!((pano2_from_pano1.translation.vector.norm() - 1.0).abs() < 1e-9);
        assert!(pano2_from_pano1.translation.vector.dot(&direction) > 0.98);
    }
}
