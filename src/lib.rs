//! Rig Pose Library
//!
//! Robust pose estimation and refinement for rigs of calibrated cameras with
//! known extrinsics:
//! - generalized absolute pose from 2D-3D correspondences (GP3P in RANSAC)
//! - generalized relative pose from 2D-2D correspondences (GR6P/GR8P in
//!   LO-RANSAC), with a central essential matrix path for panoramic rigs
//! - nonlinear refinement of the absolute pose and the observing cameras'
//!   intrinsics with tiny-solver, including the pose covariance
//!
//! Camera models (pinhole and radial-tangential) and rig descriptions are
//! loaded from Kalibr-like YAML files.

pub mod camera;
pub mod error;
pub mod estimators;
pub mod geometry;
pub mod optimization;
pub mod ransac;
pub mod solvers;
pub mod util;

// Re-export commonly used types
pub use camera::{Camera, CameraModel, CameraModelError, CameraModelId, PinholeModel, RadTanModel, Resolution, Rig};
pub use error::PoseError;
pub use estimators::{
    estimate_generalized_absolute_pose, estimate_generalized_relative_pose, AbsolutePoseEstimate, RelativePose,
    RelativePoseEstimate,
};
pub use geometry::Rigid3;
pub use optimization::{refine_generalized_absolute_pose, PoseRefinement, RefinementOptions, SolverSummary};
pub use ransac::RansacOptions;
