//! Generic consensus estimation.
//!
//! [`Ransac`] and [`LoRansac`] are generic over an [`Estimator`] kernel, which
//! turns a minimal sample into candidate models and scores models with
//! per-observation residuals, and a [`SupportMeasurer`], which ranks models by
//! the residuals that fall below the squared error threshold.
//!
//! The trial budget adapts to the best inlier ratio seen so far, see
//! [`compute_num_trials`]. A run succeeds when the best model is supported by
//! at least [`Estimator::MIN_NUM_SAMPLES`] inliers.

use crate::error::PoseError;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub mod local;
pub mod support;

pub use local::LoRansac;
pub use support::{InlierSupport, InlierSupportMeasurer, UniqueInlierSupport, UniqueInlierSupportMeasurer};

/// Number of virtual samples used to cap `max_num_trials` by `min_inlier_ratio`.
const NUM_CAP_SAMPLES: usize = 100_000;

/// Configuration of a consensus run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacOptions {
    /// Maximum residual of an inlier, in the units of the estimator's
    /// residuals before squaring.
    pub max_error: f64,
    /// Lowest inlier ratio the trial budget is sized for.
    pub min_inlier_ratio: f64,
    /// Probability of drawing at least one outlier-free sample.
    pub confidence: f64,
    /// Safety factor applied to the dynamic number of trials.
    pub dyn_num_trials_multiplier: f64,
    pub min_num_trials: usize,
    pub max_num_trials: usize,
    /// Seed of the sampler. `None` draws a seed from the operating system.
    pub random_seed: Option<u64>,
}

impl Default for RansacOptions {
    fn default() -> Self {
        RansacOptions {
            max_error: 4.0,
            min_inlier_ratio: 0.1,
            confidence: 0.99,
            dyn_num_trials_multiplier: 3.0,
            min_num_trials: 0,
            max_num_trials: 10_000,
            random_seed: None,
        }
    }
}

impl RansacOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// [`PoseError::NonPositiveMaxError`] for a non-positive `max_error`, and
    /// [`PoseError::InvalidOptions`] for ratios outside `[0, 1]`, a non-positive
    /// multiplier or `min_num_trials > max_num_trials`.
    pub fn check(&self) -> Result<(), PoseError> {
        if self.max_error.is_nan() || self.max_error <= 0.0 {
            return Err(PoseError::NonPositiveMaxError(self.max_error));
        }
        if !(0.0..=1.0).contains(&self.min_inlier_ratio) {
            return Err(PoseError::InvalidOptions(format!(
                "min_inlier_ratio must be in [0, 1], got {}",
                self.min_inlier_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(PoseError::InvalidOptions(format!(
                "confidence must be in [0, 1], got {}",
                self.confidence
            )));
        }
        if self.dyn_num_trials_multiplier.is_nan() || self.dyn_num_trials_multiplier <= 0.0 {
            return Err(PoseError::InvalidOptions(format!(
                "dyn_num_trials_multiplier must be positive, got {}",
                self.dyn_num_trials_multiplier
            )));
        }
        if self.min_num_trials > self.max_num_trials {
            return Err(PoseError::InvalidOptions(format!(
                "min_num_trials {} exceeds max_num_trials {}",
                self.min_num_trials, self.max_num_trials
            )));
        }
        Ok(())
    }

    /// `max_num_trials` capped by the budget needed at `min_inlier_ratio`.
    pub(crate) fn capped_max_num_trials(&self, min_num_samples: usize) -> usize {
        let num_inliers = (self.min_inlier_ratio * NUM_CAP_SAMPLES as f64) as usize;
        self.max_num_trials.min(compute_num_trials(
            num_inliers,
            NUM_CAP_SAMPLES,
            self.confidence,
            self.dyn_num_trials_multiplier,
            min_num_samples,
        ))
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => {
                let mut tr = rand::rng();
                StdRng::from_rng(&mut tr)
            }
        }
    }
}

/// A minimal-sample model estimator.
///
/// Observations come in two parallel slices `x` and `y`. Estimation works on a
/// subset of them given by `sample`, residuals are computed for all of them.
pub trait Estimator {
    type X;
    type Y;
    type Model: Clone;

    /// Number of observations in a minimal sample.
    const MIN_NUM_SAMPLES: usize;

    /// Estimates all models consistent with the sampled observations.
    fn estimate(&self, x: &[Self::X], y: &[Self::Y], sample: &[usize]) -> Vec<Self::Model>;

    /// Estimates models starting from an initial guess. Kernels without an
    /// iterative formulation ignore the guess.
    fn estimate_from(
        &self,
        x: &[Self::X],
        y: &[Self::Y],
        sample: &[usize],
        _initial: &Self::Model,
    ) -> Vec<Self::Model> {
        self.estimate(x, y, sample)
    }

    /// Writes one residual per observation into `residuals`, in the squared
    /// units of [`RansacOptions::max_error`].
    fn residuals(&self, x: &[Self::X], y: &[Self::Y], model: &Self::Model, residuals: &mut Vec<f64>);
}

/// Support of a model: how well the observations agree with it.
pub trait Support: Clone + Default + std::fmt::Debug {
    fn num_inliers(&self) -> usize;
}

/// Evaluates and ranks the support of models.
pub trait SupportMeasurer {
    type Support: Support;

    fn evaluate(&self, residuals: &[f64], max_residual: f64) -> Self::Support;

    fn is_left_better(&self, left: &Self::Support, right: &Self::Support) -> bool;
}

/// Outcome of a consensus run.
#[derive(Debug, Clone)]
pub struct RansacReport<M, S> {
    pub success: bool,
    pub num_trials: usize,
    pub support: S,
    /// Per-observation inlier flags of the best model. Empty on failure.
    pub inlier_mask: Vec<bool>,
    pub model: Option<M>,
}

impl<M, S: Default> Default for RansacReport<M, S> {
    fn default() -> Self {
        RansacReport {
            success: false,
            num_trials: 0,
            support: S::default(),
            inlier_mask: Vec::new(),
            model: None,
        }
    }
}

/// Number of trials needed to draw an all-inlier sample with `confidence`.
///
/// The result is scaled by `multiplier`. It saturates to `usize::MAX` when the
/// confidence is 1 or no observation is an inlier, and drops to one trial when
/// every observation is an inlier.
pub fn compute_num_trials(
    num_inliers: usize,
    num_samples: usize,
    confidence: f64,
    multiplier: f64,
    min_num_samples: usize,
) -> usize {
    let inlier_ratio = num_inliers as f64 / num_samples as f64;

    let nom = 1.0 - confidence;
    if nom <= 0.0 {
        return usize::MAX;
    }

    let denom = 1.0 - inlier_ratio.powi(min_num_samples as i32);
    if denom <= 0.0 {
        return 1;
    }
    if denom >= 1.0 {
        return usize::MAX;
    }

    let num_trials = (nom.ln() / denom.ln() * multiplier).ceil();
    if num_trials >= usize::MAX as f64 {
        usize::MAX
    } else {
        num_trials as usize
    }
}

/// Plain RANSAC over an [`Estimator`] and a [`SupportMeasurer`].
pub struct Ransac<E, S> {
    pub options: RansacOptions,
    pub estimator: E,
    pub support_measurer: S,
}

impl<E, S> Ransac<E, S>
where
    E: Estimator,
    S: SupportMeasurer,
{
    pub fn new(options: RansacOptions, estimator: E, support_measurer: S) -> Self {
        Ransac {
            options,
            estimator,
            support_measurer,
        }
    }

    /// Runs the consensus loop on the parallel observations `x` and `y`.
    ///
    /// Both slices must have the same length.
    pub fn estimate(&self, x: &[E::X], y: &[E::Y]) -> RansacReport<E::Model, S::Support> {
        run_consensus::<E, E, S>(
            &self.options,
            &self.estimator,
            None,
            &self.support_measurer,
            x,
            y,
        )
    }
}

/// Shared loop of [`Ransac`] and [`LoRansac`]. With a local estimator, every new
/// best model is polished by iterated re-estimation on its inliers.
pub(crate) fn run_consensus<E, L, S>(
    options: &RansacOptions,
    estimator: &E,
    local_estimator: Option<&L>,
    support_measurer: &S,
    x: &[E::X],
    y: &[E::Y],
) -> RansacReport<E::Model, S::Support>
where
    E: Estimator,
    L: Estimator<X = E::X, Y = E::Y, Model = E::Model>,
    S: SupportMeasurer,
{
    let mut report = RansacReport::default();
    let num_samples = x.len();
    if num_samples < E::MIN_NUM_SAMPLES {
        return report;
    }

    let max_residual = options.max_error * options.max_error;
    let max_num_trials = options.capped_max_num_trials(E::MIN_NUM_SAMPLES);
    let mut dyn_max_num_trials = max_num_trials;
    let mut rng = options.rng();

    let mut best_support = S::Support::default();
    let mut best_model: Option<E::Model> = None;
    let mut best_model_is_local = false;
    let mut residuals = Vec::with_capacity(num_samples);

    let mut abort = false;
    while report.num_trials < max_num_trials {
        if abort {
            report.num_trials += 1;
            break;
        }

        let sample = rand::seq::index::sample(&mut rng, num_samples, E::MIN_NUM_SAMPLES).into_vec();
        for model in estimator.estimate(x, y, &sample) {
            estimator.residuals(x, y, &model, &mut residuals);
            let support = support_measurer.evaluate(&residuals, max_residual);

            if support_measurer.is_left_better(&support, &best_support) {
                best_support = support;
                best_model = Some(model);
                best_model_is_local = false;

                if let Some(local_estimator) = local_estimator {
                    if best_support.num_inliers() > E::MIN_NUM_SAMPLES
                        && best_support.num_inliers() >= L::MIN_NUM_SAMPLES
                    {
                        if let Some(initial) = best_model.clone() {
                            if let Some((model, support)) = local_optimize(
                                local_estimator,
                                support_measurer,
                                x,
                                y,
                                initial,
                                best_support.clone(),
                                &residuals,
                                max_residual,
                            ) {
                                best_model = Some(model);
                                best_support = support;
                                best_model_is_local = true;
                            }
                        }
                    }
                }

                dyn_max_num_trials = compute_num_trials(
                    best_support.num_inliers(),
                    num_samples,
                    options.confidence,
                    options.dyn_num_trials_multiplier,
                    E::MIN_NUM_SAMPLES,
                );
            }

            if report.num_trials >= dyn_max_num_trials && report.num_trials >= options.min_num_trials {
                abort = true;
                break;
            }
        }
        report.num_trials += 1;
    }

    report.support = best_support;
    let Some(best_model) = best_model else {
        debug!("Consensus found no model after {} trials", report.num_trials);
        return report;
    };
    if report.support.num_inliers() < E::MIN_NUM_SAMPLES {
        debug!(
            "Consensus failed: {} inliers after {} trials",
            report.support.num_inliers(),
            report.num_trials
        );
        return report;
    }

    match (best_model_is_local, local_estimator) {
        (true, Some(local_estimator)) => local_estimator.residuals(x, y, &best_model, &mut residuals),
        _ => estimator.residuals(x, y, &best_model, &mut residuals),
    }
    report.inlier_mask = residuals.iter().map(|&r| r <= max_residual).collect();
    report.success = true;
    report.model = Some(best_model);
    debug!(
        "Consensus succeeded: {} inliers of {} after {} trials",
        report.support.num_inliers(),
        num_samples,
        report.num_trials
    );
    report
}

/// Maximum number of re-estimations in one local optimization.
const MAX_NUM_LOCAL_TRIALS: usize = 10;

/// Iteratively re-estimates a model from its own inliers.
///
/// Returns the improved model and its support, or `None` if no local model
/// beat `best_support`.
#[allow(clippy::too_many_arguments)]
fn local_optimize<L, S>(
    local_estimator: &L,
    support_measurer: &S,
    x: &[L::X],
    y: &[L::Y],
    initial: L::Model,
    mut best_support: S::Support,
    residuals: &[f64],
    max_residual: f64,
) -> Option<(L::Model, S::Support)>
where
    L: Estimator,
    S: SupportMeasurer,
{
    let mut best_model = initial;
    let mut improved = false;
    let mut inliers: Vec<usize> = inlier_indices(residuals, max_residual);
    let mut local_residuals = Vec::with_capacity(residuals.len());

    for _ in 0..MAX_NUM_LOCAL_TRIALS {
        if inliers.len() < L::MIN_NUM_SAMPLES {
            break;
        }
        let prev_best_num_inliers = best_support.num_inliers();
        let mut iteration_improved = false;
        for model in local_estimator.estimate_from(x, y, &inliers, &best_model) {
            local_estimator.residuals(x, y, &model, &mut local_residuals);
            let support = support_measurer.evaluate(&local_residuals, max_residual);
            if support_measurer.is_left_better(&support, &best_support) {
                best_support = support;
                best_model = model;
                iteration_improved = true;
            }
        }
        improved |= iteration_improved;
        if !iteration_improved || best_support.num_inliers() <= prev_best_num_inliers {
            break;
        }
        local_estimator.residuals(x, y, &best_model, &mut local_residuals);
        inliers = inlier_indices(&local_residuals, max_residual);
    }

    improved.then_some((best_model, best_support))
}

fn inlier_indices(residuals: &[f64], max_residual: f64) -> Vec<usize> {
    residuals
        .iter()
        .enumerate()
        .filter(|&(_, &r)| r <= max_residual)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Fits `y = a * x + b` through two samples.
    struct LineEstimator;

    impl Estimator for LineEstimator {
        type X = f64;
        type Y = f64;
        type Model = (f64, f64);
        const MIN_NUM_SAMPLES: usize = 2;

        fn estimate(&self, x: &[f64], y: &[f64], sample: &[usize]) -> Vec<(f64, f64)> {
            let (i, j) = (sample[0], sample[1]);
            if (x[i] - x[j]).abs() < 1e-12 {
                return Vec::new();
            }
            let a = (y[j] - y[i]) / (x[j] - x[i]);
            vec![(a, y[i] - a * x[i])]
        }

        fn residuals(&self, x: &[f64], y: &[f64], model: &(f64, f64), residuals: &mut Vec<f64>) {
            residuals.clear();
            residuals.extend(x.iter().zip(y).map(|(x, y)| (model.0 * x + model.1 - y).powi(2)));
        }
    }

    /// Least-squares line over all given samples.
    struct LeastSquaresLineEstimator;

    impl Estimator for LeastSquaresLineEstimator {
        type X = f64;
        type Y = f64;
        type Model = (f64, f64);
        const MIN_NUM_SAMPLES: usize = 3;

        fn estimate(&self, x: &[f64], y: &[f64], sample: &[usize]) -> Vec<(f64, f64)> {
            let n = sample.len() as f64;
            let mean_x = sample.iter().map(|&i| x[i]).sum::<f64>() / n;
            let mean_y = sample.iter().map(|&i| y[i]).sum::<f64>() / n;
            let sxx: f64 = sample.iter().map(|&i| (x[i] - mean_x).powi(2)).sum();
            let sxy: f64 = sample.iter().map(|&i| (x[i] - mean_x) * (y[i] - mean_y)).sum();
            if sxx < 1e-12 {
                return Vec::new();
            }
            let a = sxy / sxx;
            vec![(a, mean_y - a * mean_x)]
        }

        fn residuals(&self, x: &[f64], y: &[f64], model: &(f64, f64), residuals: &mut Vec<f64>) {
            LineEstimator.residuals(x, y, model, residuals)
        }
    }

    fn noisy_line(num_inliers: usize, num_outliers: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..num_inliers {
            let xi = i as f64 * 0.1;
            x.push(xi);
            y.push(2.0 * xi - 1.0 + rng.random_range(-0.002..0.002));
        }
        for _ in 0..num_outliers {
            x.push(rng.random_range(0.0..10.0));
            y.push(rng.random_range(-50.0..50.0));
        }
        (x, y)
    }

    fn options() -> RansacOptions {
        RansacOptions {
            max_error: 0.05,
            min_num_trials: 50,
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_compute_num_trials() {
        assert_eq!(compute_num_trials(1, 100, 0.99, 1.0, 1), 459);
        assert_eq!(compute_num_trials(100, 100, 0.99, 1.0, 3), 1);
        assert_eq!(compute_num_trials(50, 100, 1.0, 1.0, 3), usize::MAX);
        assert_eq!(compute_num_trials(0, 100, 0.99, 3.0, 3), usize::MAX);
        // ln(0.01) / ln(0.75) = 16.008, times three.
        assert_eq!(compute_num_trials(50, 100, 0.99, 3.0, 2), 49);
    }

    #[test]
    fn test_options_check() {
        assert!(RansacOptions::default().check().is_ok());
        assert!(matches!(
            RansacOptions { max_error: 0.0, ..Default::default() }.check(),
            Err(PoseError::NonPositiveMaxError(_))
        ));
        assert!(matches!(
            RansacOptions { confidence: 1.5, ..Default::default() }.check(),
            Err(PoseError::InvalidOptions(_))
        ));
        assert!(matches!(
            RansacOptions { min_num_trials: 5, max_num_trials: 4, ..Default::default() }.check(),
            Err(PoseError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_max_num_trials_capped_by_min_inlier_ratio() {
        let options = RansacOptions {
            max_num_trials: usize::MAX,
            min_inlier_ratio: 0.5,
            ..Default::default()
        };
        let capped = options.capped_max_num_trials(2);
        assert_eq!(capped, compute_num_trials(50_000, 100_000, 0.99, 3.0, 2));
    }

    #[test]
    fn test_ransac_recovers_line_with_outliers() {
        let (x, y) = noisy_line(60, 40, 7);
        let ransac = Ransac::new(options(), LineEstimator, InlierSupportMeasurer);

        let report = ransac.estimate(&x, &y);

        assert!(report.success);
        let (a, b) = report.model.unwrap();
        assert!((a - 2.0).abs() < 0.05);
        assert!((b + 1.0).abs() < 0.05);
        assert_eq!(report.inlier_mask.len(), 100);
        assert!(report.inlier_mask[..60].iter().filter(|&&m| m).count() >= 55);
        assert_eq!(
            report.inlier_mask.iter().filter(|&&m| m).count(),
            report.support.num_inliers
        );
    }

    #[test]
    fn test_ransac_fails_with_too_few_samples() {
        let ransac = Ransac::new(options(), LineEstimator, InlierSupportMeasurer);
        let report = ransac.estimate(&[1.0], &[2.0]);
        assert!(!report.success);
        assert!(report.model.is_none());
        assert!(report.inlier_mask.is_empty());
        assert_eq!(report.num_trials, 0);
    }

    #[test]
    fn test_ransac_is_deterministic_with_seed() {
        let (x, y) = noisy_line(30, 30, 3);
        let ransac = Ransac::new(options(), LineEstimator, InlierSupportMeasurer);

        let first = ransac.estimate(&x, &y);
        let second = ransac.estimate(&x, &y);

        assert_eq!(first.model, second.model);
        assert_eq!(first.num_trials, second.num_trials);
        assert_eq!(first.inlier_mask, second.inlier_mask);
    }

    #[test]
    fn test_lo_ransac_does_not_lose_support() {
        let (x, y) = noisy_line(60, 40, 11);
        let plain = Ransac::new(options(), LineEstimator, InlierSupportMeasurer).estimate(&x, &y);
        let local = LoRansac::new(options(), LineEstimator, LeastSquaresLineEstimator, InlierSupportMeasurer)
            .estimate(&x, &y);

        assert!(local.success);
        assert!(local.support.num_inliers >= 58);
        assert!(local.support.num_inliers >= plain.support.num_inliers);
        let (a, b) = local.model.unwrap();
        assert!((a - 2.0).abs() < 0.02);
        assert!((b + 1.0).abs() < 0.05);
    }
}
