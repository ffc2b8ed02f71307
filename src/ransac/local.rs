//! Locally optimized RANSAC.

use super::{run_consensus, Estimator, RansacOptions, RansacReport, SupportMeasurer};

/// RANSAC whose best hypotheses are polished by a second, non-minimal estimator.
///
/// Whenever the minimal estimator `E` produces a new best model with enough
/// inliers, the local estimator `L` is re-run on the inliers of the current best
/// model, seeded with it, for up to ten rounds or until the support stops
/// improving.
pub struct LoRansac<E, L, S> {
    pub options: RansacOptions,
    pub estimator: E,
    pub local_estimator: L,
    pub support_measurer: S,
}

impl<E, L, S> LoRansac<E, L, S>
where
    E: Estimator,
    L: Estimator<X = E::X, Y = E::Y, Model = E::Model>,
    S: SupportMeasurer,
{
    pub fn new(options: RansacOptions, estimator: E, local_estimator: L, support_measurer: S) -> Self {
        LoRansac {
            options,
            estimator,
            local_estimator,
            support_measurer,
        }
    }

    pub fn estimate(&self, x: &[E::X], y: &[E::Y]) -> RansacReport<E::Model, S::Support> {
        run_consensus(
            &self.options,
            &self.estimator,
            Some(&self.local_estimator),
            &self.support_measurer,
            x,
            y,
        )
    }
}
