//! Robust rig pose estimation from correspondences.
//!
//! Both entry points validate their inputs first and return
//! `Err(PoseError)` on malformed input. A run that finds no acceptable model
//! returns `Ok(None)`.

pub mod absolute;
pub mod relative;

pub use absolute::{estimate_generalized_absolute_pose, AbsolutePoseEstimate};
pub use relative::{estimate_generalized_relative_pose, RelativePose, RelativePoseEstimate};
