//! Rig Pose Estimation Example
//!
//! Generates a synthetic scene for a camera rig, estimates the rig pose with
//! RANSAC, refines it and reports reprojection errors. The same rig is then
//! moved to estimate a relative pose.
//!
//! Usage:
//! ```bash
//! cargo run --example rig_pose_demo -- --rig samples/stereo_rig.yaml --outlier-ratio 0.3
//! ```

use clap::Parser;
use log::info;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rig_pose::util::synthetic::{absolute_scene, relative_scene, SyntheticRig};
use rig_pose::util::compute_reprojection_error;
use rig_pose::{
    estimate_generalized_absolute_pose, estimate_generalized_relative_pose, refine_generalized_absolute_pose,
    RansacOptions, RefinementOptions, RelativePose, Rig, Rigid3,
};
use std::path::PathBuf;

/// Rig pose estimation and refinement on synthetic correspondences
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Rig description in YAML. A built-in three camera rig is used when absent
    #[arg(short = 'r', long)]
    rig: Option<PathBuf>,

    /// Number of correspondences to generate
    #[arg(short = 'n', long, default_value_t = 200)]
    num_points: usize,

    /// Fraction of correspondences replaced by random pixels
    #[arg(long, default_value_t = 0.3)]
    outlier_ratio: f64,

    /// Uniform pixel noise added to the inliers
    #[arg(long, default_value_t = 0.5)]
    noise_px: f64,

    /// RANSAC inlier threshold in pixels
    #[arg(long, default_value_t = 2.0)]
    max_error: f64,

    /// Also refine focal lengths and distortion
    #[arg(long)]
    refine_intrinsics: bool,

    /// Solver worker threads
    #[arg(long, default_value_t = 1)]
    num_threads: usize,

    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn load_rig(path: Option<&PathBuf>) -> Result<SyntheticRig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let path_str = path.to_str().ok_or("Invalid rig path string")?;
            info!("Loading rig from: {path_str}");
            let Rig {
                cameras,
                cams_from_rig,
            } = Rig::load_from_yaml(path_str)?;
            Ok(SyntheticRig {
                cameras,
                cams_from_rig,
            })
        }
        None => Ok(SyntheticRig::generalized()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let rig = load_rig(cli.rig.as_ref())?;
    println!("RIG POSE DEMO");
    println!("=============");
    for (idx, camera) in rig.cameras.iter().enumerate() {
        println!("cam{idx}: {camera:?}");
    }

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let rig_from_world = Rigid3::new(Vector3::new(0.2, -0.1, 0.5), Vector3::new(0.05, 0.25, -0.05));
    let scene = absolute_scene(&rig, rig_from_world, cli.num_points, cli.outlier_ratio, cli.noise_px, &mut rng);
    println!(
        "\nGenerated {} correspondences ({} outliers)",
        scene.points2d.len(),
        scene.is_outlier.iter().filter(|&&o| o).count()
    );

    let ransac_options = RansacOptions {
        max_error: cli.max_error,
        random_seed: Some(cli.seed),
        ..Default::default()
    };
    let Some(estimate) = estimate_generalized_absolute_pose(
        &ransac_options,
        &scene.points2d,
        &scene.points3d,
        &scene.camera_idxs,
        &rig.cams_from_rig,
        &rig.cameras,
    )?
    else {
        println!("Absolute pose estimation failed");
        return Ok(());
    };
    println!("\nAbsolute pose: {} unique inliers", estimate.num_inliers);
    let before = compute_reprojection_error(
        &scene.points2d,
        &scene.points3d,
        &scene.camera_idxs,
        &rig.cams_from_rig,
        &estimate.rig_from_world,
        &rig.cameras,
        Some(estimate.inlier_mask.as_slice()),
    )?;
    println!("Inlier reprojection error (RANSAC): {before:?}");

    let refinement_options = RefinementOptions {
        refine_focal_length: cli.refine_intrinsics,
        refine_extra_params: cli.refine_intrinsics,
        num_threads: cli.num_threads,
        print_summary: true,
        ..Default::default()
    };
    let mut refined_pose = estimate.rig_from_world;
    let mut cameras = rig.cameras.clone();
    let Some(refinement) = refine_generalized_absolute_pose(
        &refinement_options,
        &estimate.inlier_mask,
        &scene.points2d,
        &scene.points3d,
        &scene.camera_idxs,
        &rig.cams_from_rig,
        &mut refined_pose,
        &mut cameras,
        true,
    )?
    else {
        println!("Refinement failed");
        return Ok(());
    };
    println!("\n{}", refinement.summary);
    let after = compute_reprojection_error(
        &scene.points2d,
        &scene.points3d,
        &scene.camera_idxs,
        &rig.cams_from_rig,
        &refined_pose,
        &cameras,
        Some(estimate.inlier_mask.as_slice()),
    )?;
    println!("Inlier reprojection error (refined): {after:?}");
    println!(
        "Rotation error: {:.6} rad, translation error: {:.6}",
        refined_pose.rotation.angle_to(&rig_from_world.rotation),
        (refined_pose.translation.vector - rig_from_world.translation.vector).norm()
    );
    if let Some(cov) = refinement.rig_from_world_cov {
        let stddevs: Vec<String> = cov.diagonal().iter().map(|v| format!("{:.3e}", v.sqrt())).collect();
        println!("Pose standard deviations: [{}]", stddevs.join(", "));
    }

    let rig2_from_world = Rigid3::new(Vector3::new(0.4, 0.0, -0.2), Vector3::new(0.0, 0.12, 0.03)) * rig_from_world;
    let relative = relative_scene(
        &rig,
        rig_from_world,
        rig2_from_world,
        cli.num_points,
        cli.outlier_ratio,
        cli.noise_px,
        &mut rng,
    );
    let relative_options = RansacOptions {
        max_error: cli.max_error / 400.0,
        random_seed: Some(cli.seed),
        ..Default::default()
    };
    match estimate_generalized_relative_pose(
        &relative_options,
        &relative.points2d1,
        &relative.points2d2,
        &relative.camera_idxs1,
        &relative.camera_idxs2,
        &rig.cams_from_rig,
        &rig.cameras,
    )? {
        Some(estimate) => {
            let (kind, pose) = match estimate.pose {
                RelativePose::Rig(pose) => ("rig2_from_rig1", pose),
                RelativePose::Panoramic(pose) => ("pano2_from_pano1", pose),
            };
            println!(
                "\nRelative pose {kind}: {} inliers, rotation error {:.6} rad",
                estimate.num_inliers,
                pose.rotation.angle_to(&relative.rig2_from_rig1.rotation)
            );
        }
        None => println!("\nRelative pose estimation failed"),
    }

    Ok(())
}
