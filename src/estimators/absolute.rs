use crate::camera::Camera;
use crate::error::{check_len, PoseError};
use crate::geometry::{
    check_cameras, compute_max_error_in_camera, compute_rig_rays, compute_unique_point_ids, Rigid3,
};
use crate::ransac::{Ransac, RansacOptions, UniqueInlierSupportMeasurer};
use crate::solvers::Gp3pEstimator;
use log::debug;
use nalgebra::{Vector2, Vector3};

/// Result of a successful absolute pose estimation.
#[derive(Debug, Clone)]
pub struct AbsolutePoseEstimate {
    pub rig_from_world: Rigid3,
    /// Inliers counted once per distinct 3D point.
    pub num_inliers: usize,
    /// Per-correspondence inlier flags, duplicates included.
    pub inlier_mask: Vec<bool>,
}

/// Estimates the pose of a camera rig from 2D-3D correspondences.
///
/// `options.max_error` is a pixel threshold. It is converted into normalized
/// image plane units per correspondence and averaged over all of them, which
/// makes the threshold exact when every correspondence comes from one camera.
/// Correspondences that observe the same 3D point (within a small tolerance)
/// count once when ranking hypotheses.
///
/// # Errors
///
/// Inputs of unequal length, an empty or inconsistent rig, camera indices out
/// of range and invalid options are rejected before any computation.
pub fn estimate_generalized_absolute_pose(
    options: &RansacOptions,
    points2d: &[Vector2<f64>],
    points3d: &[Vector3<f64>],
    camera_idxs: &[usize],
    cams_from_rig: &[Rigid3],
    cameras: &[Camera],
) -> Result<Option<AbsolutePoseEstimate>, PoseError> {
    check_len("points3d", points2d.len(), points3d.len())?;
    check_len("camera_idxs", points2d.len(), camera_idxs.len())?;
    check_cameras(camera_idxs, cams_from_rig, cameras)?;
    options.check()?;

    if points2d.is_empty() {
        debug!("No correspondences for absolute pose estimation");
        return Ok(None);
    }

    let rig_rays = compute_rig_rays(points2d, camera_idxs, cams_from_rig, cameras);
    let unique_point_ids = compute_unique_point_ids(points3d);

    let mut ransac_options = options.clone();
    ransac_options.max_error = compute_max_error_in_camera(camera_idxs, cameras, options.max_error);

    let ransac = Ransac::new(
        ransac_options,
        Gp3pEstimator,
        UniqueInlierSupportMeasurer::new(unique_point_ids),
    );
    let report = ransac.estimate(&rig_rays, points3d);

    match report.model {
        Some(rig_from_world) if report.success => Ok(Some(AbsolutePoseEstimate {
            rig_from_world,
            num_inliers: report.support.num_unique_inliers,
            inlier_mask: report.inlier_mask,
        })),
        _ => {
            debug!(
                "Absolute pose estimation failed after {} trials ({} unique inliers)",
                report.num_trials, report.support.num_unique_inliers
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraModelError, CameraModelId};
    use crate::util::synthetic::{absolute_scene, SyntheticRig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options() -> RansacOptions {
        RansacOptions {
            max_error: 2.0,
            random_seed: Some(17),
            ..Default::default()
        }
    }

    fn rotation_error(a: &Rigid3, b: &Rigid3) -> f64 {
        a.rotation.angle_to(&b.rotation)
    }

    #[test]
    fn test_empty_input_returns_none() {
        let rig = SyntheticRig::generalized();
        let result =
            estimate_generalized_absolute_pose(&options(), &[], &[], &[], &rig.cams_from_rig, &rig.cameras);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_preconditions_are_checked_first() {
        let rig = SyntheticRig::generalized();
        let points2d = vec![Vector2::new(1.0, 2.0); 3];
        let points3d = vec![Vector3::new(0.0, 0.0, 1.0); 3];
        let estimate = |options: &RansacOptions, points3d: &[Vector3<f64>], camera_idxs: &[usize], num_cameras: usize| {
            estimate_generalized_absolute_pose(
                options,
                &points2d,
                points3d,
                camera_idxs,
                &rig.cams_from_rig[..num_cameras],
                &rig.cameras,
            )
        };

        let mismatched = estimate(&options(), &points3d[..2], &[0, 0, 0], 3);
        assert!(matches!(mismatched, Err(PoseError::MismatchedLengths { what: "points3d", .. })));

        let bad_index = estimate(&options(), &points3d, &[0, 3, 0], 3);
        assert!(matches!(bad_index, Err(PoseError::CameraIndexOutOfRange { index: 3, .. })));

        let rig_mismatch = estimate(&options(), &points3d, &[0, 0, 0], 2);
        assert!(matches!(rig_mismatch, Err(PoseError::RigSizeMismatch { .. })));

        let no_cameras = estimate_generalized_absolute_pose(&options(), &[], &[], &[], &[], &[]);
        assert!(matches!(no_cameras, Err(PoseError::NoCameras)));

        let bad_threshold = RansacOptions {
            max_error: -1.0,
            ..options()
        };
        let result = estimate(&bad_threshold, &points3d, &[0, 0, 0], 3);
        assert!(matches!(result, Err(PoseError::NonPositiveMaxError(_))));
    }

    #[test]
    fn test_malformed_camera_is_rejected() {
        let rig = SyntheticRig::generalized();
        let mut cameras = rig.cameras.clone();
        cameras[1] = Camera {
            model: CameraModelId::RadTan,
            params: vec![400.0, 400.0, 320.0, 240.0],
            resolution: cameras[1].resolution,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let scene = absolute_scene(&rig, Rigid3::identity(), 30, 0.0, 0.0, &mut rng);

        let result = estimate_generalized_absolute_pose(
            &options(),
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &cameras,
        );

        assert!(matches!(
            result,
            Err(PoseError::Camera(CameraModelError::InvalidParams(_)))
        ));
    }

    #[test]
    fn test_recovers_pose_with_outliers() {
        let rig = SyntheticRig::generalized();
        let rig_from_world = Rigid3::new(Vector3::new(0.3, -0.2, 1.5), Vector3::new(0.1, -0.4, 0.05));
        let mut rng = StdRng::seed_from_u64(3);
        let scene = absolute_scene(&rig, rig_from_world, 90, 0.3, 0.5, &mut rng);

        let estimate = estimate_generalized_absolute_pose(
            &options(),
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &rig.cameras,
        )
        .unwrap()
        .unwrap();

        assert!(rotation_error(&estimate.rig_from_world, &rig_from_world) < 0.02);
        assert!((estimate.rig_from_world.translation.vector - rig_from_world.translation.vector).norm() < 0.2);
        assert_eq!(estimate.inlier_mask.len(), scene.points2d.len());

        let num_clean = scene.is_outlier.iter().filter(|&&o| !o).count();
        let num_clean_inliers = estimate
            .inlier_mask
            .iter()
            .zip(&scene.is_outlier)
            .filter(|&(&inlier, &outlier)| inlier && !outlier)
            .count();
        assert!(num_clean_inliers as f64 >= 0.8 * num_clean as f64);
        assert!(estimate.num_inliers <= estimate.inlier_mask.iter().filter(|&&m| m).count());
    }

    #[test]
    fn test_duplicate_points_count_once() {
        let rig = SyntheticRig::generalized();
        let rig_from_world = Rigid3::new(Vector3::new(0.0, 0.1, 0.5), Vector3::new(0.0, 0.2, 0.0));
        let mut rng = StdRng::seed_from_u64(8);
        let scene = absolute_scene(&rig, rig_from_world, 40, 0.0, 0.0, &mut rng);

        let points2d = [scene.points2d.clone(), scene.points2d.clone()].concat();
        let points3d = [scene.points3d.clone(), scene.points3d.clone()].concat();
        let camera_idxs = [scene.camera_idxs.clone(), scene.camera_idxs.clone()].concat();

        let estimate = estimate_generalized_absolute_pose(
            &options(),
            &points2d,
            &points3d,
            &camera_idxs,
            &rig.cams_from_rig,
            &rig.cameras,
        )
        .unwrap()
        .unwrap();

        let num_raw_inliers = estimate.inlier_mask.iter().filter(|&&m| m).count();
        assert_eq!(num_raw_inliers, 80);
        assert_eq!(estimate.num_inliers, 40);
    }

    #[test]
    fn test_too_few_correspondences_fail() {
        let rig = SyntheticRig::generalized();
        let mut rng = StdRng::seed_from_u64(1);
        let scene = absolute_scene(&rig, Rigid3::identity(), 2, 0.0, 0.0, &mut rng);

        let result = estimate_generalized_absolute_pose(
            &options(),
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &rig.cameras,
        );

        assert!(matches!(result, Ok(None)));
    }
}
