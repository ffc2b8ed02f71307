//! Error type shared by the estimators and the refiner.
//!
//! Every variant describes malformed input detected before any computation.
//! Estimation and refinement failures are not errors: they surface as
//! `Ok(None)` from the public entry points.

use crate::camera::CameraModelError;

#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    #[error("{what} has length {actual}, expected {expected}")]
    MismatchedLengths {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Camera list is empty")]
    NoCameras,
    #[error("Rig has {cams_from_rig} extrinsics but {cameras} cameras")]
    RigSizeMismatch { cams_from_rig: usize, cameras: usize },
    #[error("Camera index {index} out of range for {num_cameras} cameras")]
    CameraIndexOutOfRange { index: usize, num_cameras: usize },
    #[error("Maximum error must be positive, got {0}")]
    NonPositiveMaxError(f64),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error(transparent)]
    Camera(#[from] CameraModelError),
}

/// Checks that `actual` matches `expected`, naming the offending input.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), PoseError> {
    if expected != actual {
        return Err(PoseError::MismatchedLengths {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
