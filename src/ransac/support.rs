//! Support measurers ranking consensus models.

use super::{Support, SupportMeasurer};
use std::collections::HashSet;

/// Number of inliers and the sum of their residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct InlierSupport {
    pub num_inliers: usize,
    pub residual_sum: f64,
}

impl Default for InlierSupport {
    fn default() -> Self {
        InlierSupport {
            num_inliers: 0,
            residual_sum: f64::MAX,
        }
    }
}

impl Support for InlierSupport {
    fn num_inliers(&self) -> usize {
        self.num_inliers
    }
}

/// Prefers more inliers, then a lower residual sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlierSupportMeasurer;

impl SupportMeasurer for InlierSupportMeasurer {
    type Support = InlierSupport;

    fn evaluate(&self, residuals: &[f64], max_residual: f64) -> InlierSupport {
        let mut support = InlierSupport {
            num_inliers: 0,
            residual_sum: 0.0,
        };
        for &residual in residuals.iter().filter(|&&r| r <= max_residual) {
            support.num_inliers += 1;
            support.residual_sum += residual;
        }
        support
    }

    fn is_left_better(&self, left: &InlierSupport, right: &InlierSupport) -> bool {
        if left.num_inliers != right.num_inliers {
            return left.num_inliers > right.num_inliers;
        }
        left.residual_sum < right.residual_sum
    }
}

/// Inlier support that also counts distinct observed points.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueInlierSupport {
    pub num_inliers: usize,
    pub num_unique_inliers: usize,
    pub residual_sum: f64,
}

impl Default for UniqueInlierSupport {
    fn default() -> Self {
        UniqueInlierSupport {
            num_inliers: 0,
            num_unique_inliers: 0,
            residual_sum: f64::MAX,
        }
    }
}

impl Support for UniqueInlierSupport {
    fn num_inliers(&self) -> usize {
        self.num_inliers
    }
}

/// Ranks models by the number of distinct point ids among their inliers.
///
/// Several observations of one physical point (e.g. seen by two cameras with
/// overlapping views) only count once, which keeps a model from winning by
/// fitting redundant observations.
#[derive(Debug, Clone)]
pub struct UniqueInlierSupportMeasurer {
    unique_sample_ids: Vec<usize>,
}

impl UniqueInlierSupportMeasurer {
    /// `unique_sample_ids[i]` is the point id of observation `i`.
    pub fn new(unique_sample_ids: Vec<usize>) -> Self {
        UniqueInlierSupportMeasurer { unique_sample_ids }
    }
}

impl SupportMeasurer for UniqueInlierSupportMeasurer {
    type Support = UniqueInlierSupport;

    fn evaluate(&self, residuals: &[f64], max_residual: f64) -> UniqueInlierSupport {
        let mut support = UniqueInlierSupport {
            num_inliers: 0,
            num_unique_inliers: 0,
            residual_sum: 0.0,
        };
        let mut inlier_point_ids = HashSet::new();
        for (&residual, &point_id) in residuals.iter().zip(&self.unique_sample_ids) {
            if residual <= max_residual {
                support.num_inliers += 1;
                support.residual_sum += residual;
                inlier_point_ids.insert(point_id);
            }
        }
        support.num_unique_inliers = inlier_point_ids.len();
        support
    }

    fn is_left_better(&self, left: &UniqueInlierSupport, right: &UniqueInlierSupport) -> bool {
        if left.num_unique_inliers != right.num_unique_inliers {
            return left.num_unique_inliers > right.num_unique_inliers;
        }
        left.residual_sum < right.residual_sum
    }
}
