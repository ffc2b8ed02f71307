//! Generalized relative pose between two observations of a multi-camera rig.
//!
//! Every correspondence is a pair of viewing lines in Plücker coordinates
//! `(d, m)`, one per rig frame. For `rig2_from_rig1 = (R, t)` the lines meet
//! iff
//!
//! ```text
//! r = (R d1)·m2 + d2·(R m1) + t·((R d1) × d2) = 0
//! ```
//!
//! which is linear in `t` for a fixed `R`. The minimal kernel finds every real
//! solution of six constraints by homotopy continuation and polishes each one
//! with damped Gauss-Newton on `SO(3) × R³`. The non-minimal kernel runs the same
//! refinement from a few starting poses and keeps the least-squares optimum.

use crate::geometry::{RigRay, Rigid3};
use crate::ransac::Estimator;
use crate::solvers::essential::{decompose_essential, essential_from_rays};
use crate::solvers::homotopy::six_line_solutions;
use crate::solvers::{align_directions_from_covariance, rotation_from_matrix, skew, squared_spherical_sampson_error};
use nalgebra::{Matrix3, Matrix6, Translation3, UnitQuaternion, Vector3, Vector6};

const MAX_NUM_ITERATIONS: usize = 60;
/// Mean squared residual below which a minimal sample counts as solved.
const MAX_MINIMAL_COST: f64 = 1e-18;
const MIN_STEP_NORM: f64 = 1e-14;
/// Below this translation norm two cameras are treated as purely rotated.
const MIN_BASELINE: f64 = 1e-12;

/// Pair of corresponding viewing lines, each `(direction, moment)` in its rig frame.
#[derive(Debug, Clone, Copy)]
struct LinePair {
    d1: Vector3<f64>,
    m1: Vector3<f64>,
    d2: Vector3<f64>,
    m2: Vector3<f64>,
}

impl LinePair {
    /// Residual of the line intersection constraint and its gradient with
    /// respect to `(δω, δt)` where `R ← exp(δω) R` and `t ← t + δt`.
    fn linearize(&self, rotation: &Matrix3<f64>, t: &Vector3<f64>) -> (f64, Vector6<f64>) {
        let u = rotation * self.d1;
        let v = rotation * self.m1;
        let a = u.cross(&self.d2);
        let r = u.dot(&self.m2) + self.d2.dot(&v) + t.dot(&a);
        let d_rotation = u.cross(&self.m2) + v.cross(&self.d2) + u.cross(&self.d2.cross(t));
        let jacobian = Vector6::new(d_rotation.x, d_rotation.y, d_rotation.z, a.x, a.y, a.z);
        (r, jacobian)
    }

    fn residual(&self, rotation: &Matrix3<f64>, t: &Vector3<f64>) -> f64 {
        let u = rotation * self.d1;
        u.dot(&self.m2) + self.d2.dot(&(rotation * self.m1)) + t.dot(&u.cross(&self.d2))
    }
}

fn collect_line_pairs(x: &[RigRay], y: &[RigRay], sample: &[usize]) -> Option<Vec<LinePair>> {
    sample
        .iter()
        .map(|&idx| {
            let (d1, m1) = x[idx].plucker_in_rig()?;
            let (d2, m2) = y[idx].plucker_in_rig()?;
            Some(LinePair { d1, m1, d2, m2 })
        })
        .collect()
}

fn cost(pairs: &[LinePair], rotation: &UnitQuaternion<f64>, t: &Vector3<f64>) -> f64 {
    let rotation = rotation.to_rotation_matrix().into_inner();
    pairs.iter().map(|pair| pair.residual(&rotation, t).powi(2)).sum()
}

/// Least-squares translation for a fixed rotation.
fn translation_given_rotation(pairs: &[LinePair], rotation: &UnitQuaternion<f64>) -> Option<Vector3<f64>> {
    let rotation = rotation.to_rotation_matrix().into_inner();
    let mut normal = Matrix3::zeros();
    let mut rhs = Vector3::zeros();
    for pair in pairs {
        let u = rotation * pair.d1;
        let a = u.cross(&pair.d2);
        let b = u.dot(&pair.m2) + pair.d2.dot(&(rotation * pair.m1));
        normal += a * a.transpose();
        rhs -= a * b;
    }
    normal.cholesky().map(|cholesky| cholesky.solve(&rhs))
}

/// Levenberg-Marquardt on the line intersection residuals.
///
/// Returns the refined pose with its summed squared residual.
fn refine(pairs: &[LinePair], initial: &Rigid3) -> Option<(Rigid3, f64)> {
    let mut rotation = initial.rotation;
    let mut t = initial.translation.vector;
    let mut current_cost = cost(pairs, &rotation, &t);
    if !current_cost.is_finite() {
        return None;
    }
    let min_cost = MAX_MINIMAL_COST * 1e-6 * pairs.len() as f64;
    let mut lambda = 1e-4;

    for _ in 0..MAX_NUM_ITERATIONS {
        if current_cost <= min_cost {
            break;
        }
        let rotation_matrix = rotation.to_rotation_matrix().into_inner();
        let mut hessian = Matrix6::zeros();
        let mut gradient = Vector6::zeros();
        for pair in pairs {
            let (r, jacobian) = pair.linearize(&rotation_matrix, &t);
            hessian += jacobian * jacobian.transpose();
            gradient += jacobian * r;
        }

        let mut damped = hessian;
        for i in 0..6 {
            damped[(i, i)] += lambda * hessian[(i, i)].max(1e-9);
        }
        let Some(cholesky) = damped.cholesky() else {
            lambda *= 10.0;
            continue;
        };
        let step = cholesky.solve(&(-gradient));
        let candidate_rotation = UnitQuaternion::from_scaled_axis(step.fixed_rows::<3>(0).into_owned()) * rotation;
        let candidate_t = t + step.fixed_rows::<3>(3);
        let candidate_cost = cost(pairs, &candidate_rotation, &candidate_t);

        if candidate_cost < current_cost {
            rotation = candidate_rotation;
            t = candidate_t;
            current_cost = candidate_cost;
            lambda = (lambda * 0.1).max(1e-12);
            if step.norm() < MIN_STEP_NORM {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
        }
    }

    Some((Rigid3::from_parts(Translation3::from(t), rotation), current_cost))
}

/// Rotation aligning the rig-frame directions of both views, exact when the
/// baseline is negligible against the scene depth.
fn direction_alignment(pairs: &[LinePair]) -> Option<UnitQuaternion<f64>> {
    let covariance = pairs
        .iter()
        .fold(Matrix3::zeros(), |acc, pair| acc + pair.d1 * pair.d2.transpose());
    align_directions_from_covariance(&covariance).map(|r| rotation_from_matrix(&r))
}

fn seed_pose(pairs: &[LinePair], rotation: UnitQuaternion<f64>) -> Rigid3 {
    let t = translation_given_rotation(pairs, &rotation).unwrap_or_else(Vector3::zeros);
    Rigid3::from_parts(Translation3::from(t), rotation)
}

fn is_same_pose(a: &Rigid3, b: &Rigid3) -> bool {
    (a.to_homogeneous() - b.to_homogeneous()).amax() < 1e-8
}

/// Squared spherical Sampson error of each correspondence under the camera
/// pair motion `cam2_from_rig2 · rig2_from_rig1 · rig1_from_cam1`.
fn relative_residuals(x: &[RigRay], y: &[RigRay], rig2_from_rig1: &Rigid3, residuals: &mut Vec<f64>) {
    residuals.clear();
    residuals.extend(x.iter().zip(y).map(|(ray1, ray2)| {
        let (Some(r1), Some(r2)) = (ray1.ray_in_cam, ray2.ray_in_cam) else {
            return f64::MAX;
        };
        let cam2_from_cam1 = ray2.cam_from_rig * rig2_from_rig1 * ray1.cam_from_rig.inverse();
        let rotation = cam2_from_cam1.rotation.to_rotation_matrix().into_inner();
        let t = cam2_from_cam1.translation.vector;
        if t.norm() < MIN_BASELINE {
            return r2.cross(&(rotation * r1)).norm_squared();
        }
        squared_spherical_sampson_error(&r1, &r2, &(skew(&t) * rotation))
    }));
}

/// Minimal six-correspondence generalized relative pose.
///
/// `x` holds the rays of the first rig frame, `y` those of the second. Models
/// are `rig2_from_rig1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gr6pEstimator;

impl Estimator for Gr6pEstimator {
    type X = RigRay;
    type Y = RigRay;
    type Model = Rigid3;

    const MIN_NUM_SAMPLES: usize = 6;

    fn estimate(&self, x: &[RigRay], y: &[RigRay], sample: &[usize]) -> Vec<Rigid3> {
        let Some(pairs) = collect_line_pairs(x, y, sample) else {
            return Vec::new();
        };
        let Ok(lines) = <[[Vector3<f64>; 4]; 6]>::try_from(
            pairs
                .iter()
                .map(|pair| [pair.d1, pair.m1, pair.d2, pair.m2])
                .collect::<Vec<_>>(),
        ) else {
            return Vec::new();
        };

        let mut poses: Vec<Rigid3> = Vec::new();
        for candidate in six_line_solutions(&lines) {
            let Some((pose, final_cost)) = refine(&pairs, &candidate) else {
                continue;
            };
            if final_cost / pairs.len() as f64 <= MAX_MINIMAL_COST
                && !poses.iter().any(|known| is_same_pose(known, &pose))
            {
                poses.push(pose);
            }
        }
        poses
    }

    fn residuals(&self, x: &[RigRay], y: &[RigRay], rig2_from_rig1: &Rigid3, residuals: &mut Vec<f64>) {
        relative_residuals(x, y, rig2_from_rig1, residuals)
    }
}

/// Non-minimal generalized relative pose from eight or more correspondences.
///
/// Used for local optimization. Starting from the current best model, or from
/// direction alignment and the central essential matrix when there is none,
/// it returns the single least-squares solution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gr8pEstimator;

impl Gr8pEstimator {
    fn best_of(pairs: &[LinePair], starts: impl IntoIterator<Item = Rigid3>) -> Vec<Rigid3> {
        starts
            .into_iter()
            .filter_map(|start| refine(pairs, &start))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(pose, _)| vec![pose])
            .unwrap_or_default()
    }

    fn central_starts(pairs: &[LinePair]) -> Vec<Rigid3> {
        let mut rotations = vec![UnitQuaternion::identity()];
        if let Some(rotation) = direction_alignment(pairs) {
            rotations.push(rotation);
        }
        let rays1: Vec<Vector3<f64>> = pairs.iter().map(|pair| pair.d1).collect();
        let rays2: Vec<Vector3<f64>> = pairs.iter().map(|pair| pair.d2).collect();
        if let Some(candidates) = essential_from_rays(&rays1, &rays2).and_then(|e| decompose_essential(&e)) {
            // Candidates come in pairs sharing a rotation.
            rotations.extend(candidates.iter().step_by(2).map(|(r, _)| rotation_from_matrix(r)));
        }
        rotations.into_iter().map(|rotation| seed_pose(pairs, rotation)).collect()
    }
}

impl Estimator for Gr8pEstimator {
    type X = RigRay;
    type Y = RigRay;
    type Model = Rigid3;

    const MIN_NUM_SAMPLES: usize = 8;

    fn estimate(&self, x: &[RigRay], y: &[RigRay], sample: &[usize]) -> Vec<Rigid3> {
        let Some(pairs) = collect_line_pairs(x, y, sample) else {
            return Vec::new();
        };
        Self::best_of(&pairs, Self::central_starts(&pairs))
    }

    fn estimate_from(&self, x: &[RigRay], y: &[RigRay], sample: &[usize], initial: &Rigid3) -> Vec<Rigid3> {
        let Some(pairs) = collect_line_pairs(x, y, sample) else {
            return Vec::new();
        };
        Self::best_of(&pairs, [*initial])
    }

    fn residuals(&self, x: &[RigRay], y: &[RigRay], rig2_from_rig1: &Rigid3, residuals: &mut Vec<f64>) {
        relative_residuals(x, y, rig2_from_rig1, residuals)
    }
}
