//! Nonlinear refinement of rig poses.
//!
//! [`solver`] wraps tiny-solver's Levenberg-Marquardt optimizer in a robust
//! least-squares problem that can also report its gradient and covariance.
//! [`rig_pose`] builds the reprojection problem of a generalized absolute pose
//! on top of it.

use crate::error::PoseError;
use serde::{Deserialize, Serialize};

pub mod rig_pose;
pub mod solver;

pub use rig_pose::{refine_generalized_absolute_pose, PoseRefinement};
pub use solver::{ParameterBlock, SolverOptions, SolverSummary, TerminationType};

/// Options of [`refine_generalized_absolute_pose`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementOptions {
    /// Refine the focal lengths of cameras observing inliers.
    pub refine_focal_length: bool,
    /// Refine the distortion parameters of cameras observing inliers.
    pub refine_extra_params: bool,
    /// Scale of the Cauchy loss, in pixels.
    pub loss_function_scale: f64,
    pub gradient_tolerance: f64,
    pub max_num_iterations: usize,
    pub print_summary: bool,
    pub num_threads: usize,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        RefinementOptions {
            refine_focal_length: true,
            refine_extra_params: true,
            loss_function_scale: 1.0,
            gradient_tolerance: 1.0,
            max_num_iterations: 100,
            print_summary: false,
            num_threads: 1,
        }
    }
}

impl RefinementOptions {
    /// # Errors
    ///
    /// [`PoseError::InvalidOptions`] for a non-positive loss scale, a negative
    /// gradient tolerance or zero threads.
    pub fn check(&self) -> Result<(), PoseError> {
        if !(self.loss_function_scale > 0.0) {
            return Err(PoseError::InvalidOptions(format!(
                "loss_function_scale must be positive, got {}",
                self.loss_function_scale
            )));
        }
        if !(self.gradient_tolerance >= 0.0) {
            return Err(PoseError::InvalidOptions(format!(
                "gradient_tolerance must be non-negative, got {}",
                self.gradient_tolerance
            )));
        }
        if self.num_threads == 0 {
            return Err(PoseError::InvalidOptions(
                "num_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refines_intrinsics(&self) -> bool {
        self.refine_focal_length || self.refine_extra_params
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            max_num_iterations: self.max_num_iterations,
            gradient_tolerance: self.gradient_tolerance,
            num_threads: self.num_threads,
        }
    }
}
