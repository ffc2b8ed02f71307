//! Reprojection refinement of a generalized absolute pose.

use crate::camera::{Camera, CameraModelId};
use crate::error::{check_len, PoseError};
use crate::geometry::{check_cameras, Rigid3};
use crate::optimization::solver::{ParameterBlock, RobustProblem, SolverSummary};
use crate::optimization::RefinementOptions;

use log::{info, log_enabled, warn, Level};
use nalgebra::{DVector, Matrix6, Quaternion, RealField, Translation3, UnitQuaternion, Vector2, Vector3};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tiny_solver::factors::Factor;

/// Residual of an observation that cannot be projected into its camera.
const INVALID_PROJECTION_RESIDUAL: f64 = 1e6;

const ROTATION_BLOCK: &str = "rig_from_world_rotation";
const TRANSLATION_BLOCK: &str = "rig_from_world_translation";

/// Result of a usable refinement.
#[derive(Debug, Clone)]
pub struct PoseRefinement {
    pub summary: SolverSummary,
    /// Covariance of the refined pose in tangent coordinates: the left rotation
    /// increment `R ← exp(δω) R` first, then the translation.
    pub rig_from_world_cov: Option<Matrix6<f64>>,
}

/// Reprojection error of one world point seen by one camera of the rig.
///
/// Parameter blocks are `[qx, qy, qz, qw]` and `[tx, ty, tz]` of
/// `rig_from_world`, followed by the camera intrinsics unless they are fixed,
/// in which case they are stored in the factor.
#[derive(Debug, Clone)]
struct RigReprojectionFactor {
    model: CameraModelId,
    point2d: Vector2<f64>,
    point3d: Vector3<f64>,
    cam_from_rig: Rigid3,
    fixed_intrinsics: Option<Vec<f64>>,
}

impl<T: RealField> Factor<T> for RigReprojectionFactor {
    fn residual_func(&self, params: &[DVector<T>]) -> DVector<T> {
        let q = &params[0];
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
            q[3].clone(),
            q[0].clone(),
            q[1].clone(),
            q[2].clone(),
        ));
        let t = &params[1];
        let translation = Vector3::new(t[0].clone(), t[1].clone(), t[2].clone());

        let point_world: Vector3<T> = self.point3d.map(nalgebra::convert::<f64, T>);
        let point_rig = rotation * point_world + translation;

        let cam_rotation = self
            .cam_from_rig
            .rotation
            .to_rotation_matrix()
            .into_inner()
            .map(nalgebra::convert::<f64, T>);
        let cam_translation = self.cam_from_rig.translation.vector.map(nalgebra::convert::<f64, T>);
        let point_cam = cam_rotation * point_rig + cam_translation;

        let intrinsics: Vec<T> = match &self.fixed_intrinsics {
            Some(fixed) => fixed.iter().map(|&v| nalgebra::convert::<f64, T>(v)).collect(),
            None => params[2].iter().cloned().collect(),
        };

        match self.model.img_from_cam(&intrinsics, &point_cam) {
            Some(projected) => DVector::from_vec(vec![
                projected.x.clone() - nalgebra::convert::<f64, T>(self.point2d.x),
                projected.y.clone() - nalgebra::convert::<f64, T>(self.point2d.y),
            ]),
            None => DVector::from_element(2, nalgebra::convert::<f64, T>(INVALID_PROJECTION_RESIDUAL)),
        }
    }
}

/// Intrinsic indices held constant for `camera`.
fn fixed_intrinsic_idxs(camera: &Camera, options: &RefinementOptions) -> Vec<usize> {
    let mut fixed = camera.principal_point_idxs().to_vec();
    if !options.refine_focal_length {
        fixed.extend_from_slice(camera.focal_length_idxs());
    }
    if !options.refine_extra_params {
        fixed.extend_from_slice(camera.extra_params_idxs());
    }
    fixed.sort_unstable();
    fixed.dedup();
    fixed
}

struct CameraBlock {
    block: ParameterBlock,
    fixed: Vec<usize>,
}

/// Refines `rig_from_world`, and optionally the intrinsics of the cameras
/// observing inliers, by minimizing the Cauchy-robustified reprojection error
/// of the inlier correspondences.
///
/// Rig extrinsics and 3D points stay constant. Principal points are never
/// refined, and cameras without inliers are left untouched. The refined values
/// are written back before the covariance is computed and are not rolled back
/// if it fails.
///
/// Returns `Ok(None)` when the solver fails or the requested covariance cannot
/// be computed.
///
/// # Errors
///
/// Inputs of unequal length (the inlier mask included), an inconsistent rig,
/// camera indices out of range and invalid options.
#[allow(clippy::too_many_arguments)]
pub fn refine_generalized_absolute_pose(
    options: &RefinementOptions,
    inlier_mask: &[bool],
    points2d: &[Vector2<f64>],
    points3d: &[Vector3<f64>],
    camera_idxs: &[usize],
    cams_from_rig: &[Rigid3],
    rig_from_world: &mut Rigid3,
    cameras: &mut [Camera],
    compute_covariance: bool,
) -> Result<Option<PoseRefinement>, PoseError> {
    check_len("points3d", points2d.len(), points3d.len())?;
    check_len("camera_idxs", points2d.len(), camera_idxs.len())?;
    check_len("inlier_mask", points2d.len(), inlier_mask.len())?;
    check_cameras(camera_idxs, cams_from_rig, cameras)?;
    options.check()?;

    let inliers: Vec<usize> = (0..points2d.len()).filter(|&i| inlier_mask[i]).collect();

    let rotation_block = ParameterBlock::new(ROTATION_BLOCK, 4);
    let translation_block = ParameterBlock::new(TRANSLATION_BLOCK, 3);
    let mut camera_blocks: BTreeMap<usize, CameraBlock> = BTreeMap::new();
    if options.refines_intrinsics() {
        let touched: BTreeSet<usize> = inliers.iter().map(|&i| camera_idxs[i]).collect();
        for camera_idx in touched {
            let camera = &cameras[camera_idx];
            let fixed = fixed_intrinsic_idxs(camera, options);
            if fixed.len() < camera.num_params() {
                camera_blocks.insert(
                    camera_idx,
                    CameraBlock {
                        block: ParameterBlock::new(format!("camera_{camera_idx}"), camera.num_params()),
                        fixed,
                    },
                );
            }
        }
    }

    let mut problem = RobustProblem::new();
    let mut initial = HashMap::new();
    if !inliers.is_empty() {
        problem.add_quaternion_variable(&rotation_block);
        problem.add_euclidean_variable(&translation_block, Vec::new());
        initial.insert(
            rotation_block.name.clone(),
            DVector::from_column_slice(rig_from_world.rotation.coords.as_slice()),
        );
        initial.insert(
            translation_block.name.clone(),
            DVector::from_column_slice(rig_from_world.translation.vector.as_slice()),
        );
        for (&camera_idx, camera_block) in &camera_blocks {
            problem.add_euclidean_variable(&camera_block.block, camera_block.fixed.clone());
            initial.insert(
                camera_block.block.name.clone(),
                DVector::from_vec(cameras[camera_idx].params.clone()),
            );
        }
    }

    for &i in &inliers {
        let camera_idx = camera_idxs[i];
        let camera_block = camera_blocks.get(&camera_idx);
        let factor = RigReprojectionFactor {
            model: cameras[camera_idx].model,
            point2d: points2d[i],
            point3d: points3d[i],
            cam_from_rig: cams_from_rig[camera_idx],
            fixed_intrinsics: camera_block.is_none().then(|| cameras[camera_idx].params.clone()),
        };
        match camera_block {
            Some(camera_block) => problem.add_residual_block(
                2,
                &[&rotation_block, &translation_block, &camera_block.block],
                factor,
                options.loss_function_scale,
            ),
            None => problem.add_residual_block(
                2,
                &[&rotation_block, &translation_block],
                factor,
                options.loss_function_scale,
            ),
        }
    }

    let (solution, summary) = problem.solve(&initial, &options.solver_options());
    if options.print_summary || log_enabled!(Level::Debug) {
        info!("Rig pose refinement\n{summary}");
    }
    if !summary.is_solution_usable() {
        warn!("Rig pose refinement failed with termination {:?}", summary.termination);
        return Ok(None);
    }
    if inliers.is_empty() {
        return Ok(Some(PoseRefinement {
            summary,
            rig_from_world_cov: None,
        }));
    }

    let (Some(rotation), Some(translation)) = (
        solution.get(&rotation_block.name),
        solution.get(&translation_block.name),
    ) else {
        warn!("Rig pose refinement returned no pose");
        return Ok(None);
    };
    *rig_from_world = Rigid3::from_parts(
        Translation3::new(translation[0], translation[1], translation[2]),
        UnitQuaternion::from_quaternion(Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2])),
    );
    for (&camera_idx, camera_block) in &camera_blocks {
        let Some(values) = solution.get(&camera_block.block.name) else {
            continue;
        };
        let camera = &mut cameras[camera_idx];
        for idx in (0..camera.num_params()).filter(|idx| !camera_block.fixed.contains(idx)) {
            camera.params[idx] = values[idx];
        }
    }

    let rig_from_world_cov = if compute_covariance {
        match problem.covariance(&solution, &[&rotation_block, &translation_block]) {
            Some(cov) => Some(Matrix6::from_iterator(cov.iter().copied())),
            None => {
                warn!("Rig pose covariance is unavailable, the normal equations are not positive definite");
                return Ok(None);
            }
        }
    } else {
        None
    };

    Ok(Some(PoseRefinement {
        summary,
        rig_from_world_cov,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::TerminationType;
    use crate::util::synthetic::{absolute_scene, AbsoluteScene, SyntheticRig};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(noise_px: f64) -> (SyntheticRig, AbsoluteScene) {
        let rig = SyntheticRig::generalized();
        let rig_from_world = Rigid3::new(Vector3::new(0.1, -0.3, 0.8), Vector3::new(0.05, 0.3, -0.1));
        let mut rng = StdRng::seed_from_u64(12);
        let scene = absolute_scene(&rig, rig_from_world, 60, 0.0, noise_px, &mut rng);
        (rig, scene)
    }

    fn perturbed(pose: &Rigid3) -> Rigid3 {
        Rigid3::new(Vector3::new(0.02, -0.03, 0.05), Vector3::new(0.01, 0.005, -0.01)) * pose
    }

    fn intrinsics_fixed() -> RefinementOptions {
        RefinementOptions {
            refine_focal_length: false,
            refine_extra_params: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_noiseless_refinement_recovers_pose() {
        let (rig, scene) = scene(0.0);
        let mut cameras = rig.cameras.clone();
        let mut rig_from_world = perturbed(&scene.rig_from_world);
        let inlier_mask = vec![true; scene.points2d.len()];

        let refinement = refine_generalized_absolute_pose(
            &intrinsics_fixed(),
            &inlier_mask,
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &mut rig_from_world,
            &mut cameras,
            true,
        )
        .unwrap()
        .unwrap();

        assert!(refinement.summary.is_solution_usable());
        assert_eq!(refinement.summary.termination, TerminationType::Converged);
        assert_eq!(refinement.summary.num_residual_blocks, 60);
        assert_eq!(refinement.summary.num_effective_parameters, 6);
        assert!(refinement.summary.final_cost < refinement.summary.initial_cost);
        assert!(rig_from_world.rotation.angle_to(&scene.rig_from_world.rotation) < 1e-6);
        assert!((rig_from_world.translation.vector - scene.rig_from_world.translation.vector).norm() < 1e-6);

        let cov = refinement.rig_from_world_cov.unwrap();
        assert_relative_eq!(cov, cov.transpose(), epsilon = 1e-12);
        let eigenvalues = cov.symmetric_eigen().eigenvalues;
        assert!(eigenvalues.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_fixed_intrinsics_stay_bit_identical() {
        let (rig, scene) = scene(0.5);
        let mut cameras = rig.cameras.clone();
        let mut rig_from_world = perturbed(&scene.rig_from_world);
        let inlier_mask = vec![true; scene.points2d.len()];

        let refinement = refine_generalized_absolute_pose(
            &intrinsics_fixed(),
            &inlier_mask,
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &mut rig_from_world,
            &mut cameras,
            false,
        )
        .unwrap()
        .unwrap();

        assert!(refinement.rig_from_world_cov.is_none());
        assert_eq!(cameras, rig.cameras);
        assert!(rig_from_world.rotation.angle_to(&scene.rig_from_world.rotation) < 1e-2);
    }

    #[test]
    fn test_principal_point_is_never_refined() {
        let (rig, scene) = scene(0.5);
        let inlier_mask = vec![true; scene.points2d.len()];

        for (refine_focal_length, refine_extra_params) in [(true, false), (false, true), (true, true)] {
            let options = RefinementOptions {
                refine_focal_length,
                refine_extra_params,
                num_threads: 2,
                ..Default::default()
            };
            let mut cameras = rig.cameras.clone();
            let mut rig_from_world = scene.rig_from_world;

            let refinement = refine_generalized_absolute_pose(
                &options,
                &inlier_mask,
                &scene.points2d,
                &scene.points3d,
                &scene.camera_idxs,
                &rig.cams_from_rig,
                &mut rig_from_world,
                &mut cameras,
                false,
            )
            .unwrap();
            assert!(refinement.is_some());

            for (refined, original) in cameras.iter().zip(&rig.cameras) {
                for &idx in original.principal_point_idxs() {
                    assert_eq!(refined.params[idx].to_bits(), original.params[idx].to_bits());
                }
                if !refine_focal_length {
                    for &idx in original.focal_length_idxs() {
                        assert_eq!(refined.params[idx].to_bits(), original.params[idx].to_bits());
                    }
                }
                if !refine_extra_params {
                    for &idx in original.extra_params_idxs() {
                        assert_eq!(refined.params[idx].to_bits(), original.params[idx].to_bits());
                    }
                }
            }
        }
    }

    #[test]
    fn test_cameras_without_inliers_are_untouched() {
        let (rig, scene) = scene(0.5);
        let inlier_mask: Vec<bool> = scene.camera_idxs.iter().map(|&idx| idx != 2).collect();
        let num_inliers = inlier_mask.iter().filter(|&&m| m).count();
        let mut cameras = rig.cameras.clone();
        let mut rig_from_world = scene.rig_from_world;

        let refinement = refine_generalized_absolute_pose(
            &RefinementOptions::default(),
            &inlier_mask,
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &mut rig_from_world,
            &mut cameras,
            false,
        )
        .unwrap()
        .unwrap();

        assert_eq!(refinement.summary.num_residual_blocks, num_inliers);
        assert_eq!(cameras[2], rig.cameras[2]);
    }

    #[test]
    fn test_zero_inliers_converge_trivially() {
        let (rig, scene) = scene(0.0);
        let inlier_mask = vec![false; scene.points2d.len()];
        let mut cameras = rig.cameras.clone();
        let start = perturbed(&scene.rig_from_world);
        let mut rig_from_world = start;

        let refinement = refine_generalized_absolute_pose(
            &RefinementOptions::default(),
            &inlier_mask,
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &mut rig_from_world,
            &mut cameras,
            true,
        )
        .unwrap()
        .unwrap();

        assert_eq!(refinement.summary.num_residual_blocks, 0);
        assert_eq!(refinement.summary.termination, TerminationType::Converged);
        assert_eq!(refinement.summary.final_cost, 0.0);
        assert!(refinement.rig_from_world_cov.is_none());
        assert_eq!(rig_from_world, start);
        assert_eq!(cameras, rig.cameras);
    }

    #[test]
    fn test_preconditions() {
        let (rig, scene) = scene(0.0);
        let mut cameras = rig.cameras.clone();
        let mut rig_from_world = scene.rig_from_world;

        let result = refine_generalized_absolute_pose(
            &RefinementOptions::default(),
            &[true; 3],
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &mut rig_from_world,
            &mut cameras,
            false,
        );
        assert!(matches!(result, Err(PoseError::MismatchedLengths { what: "inlier_mask", .. })));

        let options = RefinementOptions {
            loss_function_scale: -1.0,
            ..Default::default()
        };
        let inlier_mask = vec![true; scene.points2d.len()];
        let result = refine_generalized_absolute_pose(
            &options,
            &inlier_mask,
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig,
            &mut rig_from_world,
            &mut cameras,
            false,
        );
        assert!(matches!(result, Err(PoseError::InvalidOptions(_))));

        let result = refine_generalized_absolute_pose(
            &RefinementOptions::default(),
            &inlier_mask,
            &scene.points2d,
            &scene.points3d,
            &scene.camera_idxs,
            &rig.cams_from_rig[..1],
            &mut rig_from_world,
            &mut cameras,
            false,
        );
        assert!(matches!(result, Err(PoseError::RigSizeMismatch { .. })));
        assert_eq!(rig_from_world, scene.rig_from_world);
    }
}
