//! Generalized three-point absolute pose (GP3P).
//!
//! Each observation is a viewing line of the rig: camera center `c_i` and unit
//! direction `d_i`, both in the rig frame. The unknown depths `λ_i` place the
//! world points on their lines at `c_i + λ_i d_i`, and the pairwise distances
//! between those points must equal the world distances.
//!
//! The constraints for the pairs (1, 2) and (1, 3) are quadratic in `λ_2` and
//! `λ_3` once `λ_1` is fixed, giving two branches each. The remaining pair
//! (2, 3) becomes a scalar function of `λ_1` per branch combination whose roots
//! are bracketed on a grid and refined by bisection. The pose then follows from
//! aligning the three rig-frame points with the world points.

use crate::geometry::{RigRay, Rigid3};
use crate::ransac::Estimator;
use crate::solvers::align_points;
use nalgebra::{Point3, Vector3};

/// Grid resolution used to bracket the roots in `λ_1`.
const NUM_BRACKETS: usize = 500;
const NUM_BISECTIONS: usize = 100;
/// Smallest depth and world distance considered non-degenerate.
const MIN_DEPTH: f64 = 1e-9;

/// Estimates `rig_from_world` from rig rays (`x`) and world points (`y`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Gp3pEstimator;

/// Quadratic constraint `|c_1 + λ_1 d_1 - c_j - λ_j d_j| = distance` solved for `λ_j`.
struct PairConstraint {
    c1j: Vector3<f64>,
    dj: Vector3<f64>,
    distance2: f64,
}

impl PairConstraint {
    /// Interval of `λ_1` on which `λ_j` is real, i.e. the discriminant is non-negative.
    fn feasible_interval(&self, d1: &Vector3<f64>) -> Option<(f64, f64)> {
        let a = self.dj.dot(&self.c1j);
        let b = self.dj.dot(d1);
        let e = d1.dot(&self.c1j);
        let g = self.c1j.norm_squared() - self.distance2;

        let qa = b * b - 1.0;
        let qb = 2.0 * (a * b - e);
        let qc = a * a - g;
        if qa > -1e-12 {
            // Parallel rays.
            return None;
        }
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let r1 = (-qb + sqrt_disc) / (2.0 * qa);
        let r2 = (-qb - sqrt_disc) / (2.0 * qa);
        Some((r1.min(r2), r1.max(r2)))
    }

    /// Both solutions `λ_j` for a given `λ_1`, lower branch first.
    fn depths(&self, d1: &Vector3<f64>, lambda1: f64) -> [f64; 2] {
        let w = self.c1j + d1 * lambda1;
        let p = self.dj.dot(&w);
        let disc = (p * p - (w.norm_squared() - self.distance2)).max(0.0);
        let sqrt_disc = disc.sqrt();
        [p - sqrt_disc, p + sqrt_disc]
    }
}

/// Solves for all rig poses consistent with three viewing lines.
///
/// `centers` and `directions` describe the lines in the rig frame, `points` are
/// the world points. Directions must be unit length.
pub fn solve_gp3p(
    centers: &[Vector3<f64>; 3],
    directions: &[Vector3<f64>; 3],
    points: &[Vector3<f64>; 3],
) -> Vec<Rigid3> {
    let distance12 = (points[0] - points[1]).norm_squared();
    let distance13 = (points[0] - points[2]).norm_squared();
    let distance23 = (points[1] - points[2]).norm_squared();
    if distance12.min(distance13).min(distance23) < MIN_DEPTH * MIN_DEPTH {
        return Vec::new();
    }

    let d1 = directions[0];
    let pair12 = PairConstraint {
        c1j: centers[0] - centers[1],
        dj: directions[1],
        distance2: distance12,
    };
    let pair13 = PairConstraint {
        c1j: centers[0] - centers[2],
        dj: directions[2],
        distance2: distance13,
    };
    let c23 = centers[1] - centers[2];

    let (Some(interval12), Some(interval13)) =
        (pair12.feasible_interval(&d1), pair13.feasible_interval(&d1))
    else {
        return Vec::new();
    };
    let lower = interval12.0.max(interval13.0).max(0.0);
    let upper = interval12.1.min(interval13.1);
    if !(lower < upper) {
        return Vec::new();
    }

    let mut poses = Vec::new();
    for branch2 in 0..2 {
        for branch3 in 0..2 {
            let depths = |lambda1: f64| {
                (
                    pair12.depths(&d1, lambda1)[branch2],
                    pair13.depths(&d1, lambda1)[branch3],
                )
            };
            let residual = |lambda1: f64| {
                let (lambda2, lambda3) = depths(lambda1);
                (c23 + directions[1] * lambda2 - directions[2] * lambda3).norm_squared() - distance23
            };

            for lambda1 in bracket_roots(residual, lower, upper) {
                let (lambda2, lambda3) = depths(lambda1);
                if lambda1 < MIN_DEPTH || lambda2 < MIN_DEPTH || lambda3 < MIN_DEPTH {
                    continue;
                }
                let points_in_rig = [
                    centers[0] + directions[0] * lambda1,
                    centers[1] + directions[1] * lambda2,
                    centers[2] + directions[2] * lambda3,
                ];
                if let Some(rig_from_world) = align_points(points, &points_in_rig) {
                    poses.push(rig_from_world);
                }
            }
        }
    }
    poses
}

/// Roots of `f` on `[lower, upper]` located by sign changes on a uniform grid.
fn bracket_roots(f: impl Fn(f64) -> f64, lower: f64, upper: f64) -> Vec<f64> {
    let step = (upper - lower) / NUM_BRACKETS as f64;
    let mut roots = Vec::new();
    let mut a = lower;
    let mut fa = f(a);
    for k in 1..=NUM_BRACKETS {
        let b = if k == NUM_BRACKETS { upper } else { lower + step * k as f64 };
        let fb = f(b);
        if fa == 0.0 {
            roots.push(a);
        } else if fa.is_finite() && fb.is_finite() && fa * fb < 0.0 {
            roots.push(bisect(&f, a, b, fa));
        }
        a = b;
        fa = fb;
    }
    if fa == 0.0 {
        roots.push(a);
    }
    roots
}

fn bisect(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
    for _ in 0..NUM_BISECTIONS {
        let mid = 0.5 * (a + b);
        if mid <= a || mid >= b {
            break;
        }
        let fm = f(mid);
        if fm == 0.0 {
            return mid;
        }
        if fa * fm < 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
    }
    0.5 * (a + b)
}

impl Estimator for Gp3pEstimator {
    type X = RigRay;
    type Y = Vector3<f64>;
    type Model = Rigid3;

    const MIN_NUM_SAMPLES: usize = 3;

    fn estimate(&self, x: &[RigRay], y: &[Vector3<f64>], sample: &[usize]) -> Vec<Rigid3> {
        let mut centers = [Vector3::zeros(); 3];
        let mut directions = [Vector3::zeros(); 3];
        let mut points = [Vector3::zeros(); 3];
        for (k, &idx) in sample.iter().take(3).enumerate() {
            let Some(direction) = x[idx].ray_in_rig() else {
                return Vec::new();
            };
            centers[k] = x[idx].center_in_rig();
            directions[k] = direction;
            points[k] = y[idx];
        }
        solve_gp3p(&centers, &directions, &points)
    }

    /// Squared reprojection error on the normalized image plane of each camera.
    fn residuals(&self, x: &[RigRay], y: &[Vector3<f64>], rig_from_world: &Rigid3, residuals: &mut Vec<f64>) {
        residuals.clear();
        residuals.extend(x.iter().zip(y).map(|(rig_ray, point)| {
            let Some(ray) = rig_ray.ray_in_cam else {
                return f64::MAX;
            };
            let point_in_cam = (rig_ray.cam_from_rig * rig_from_world).transform_point(&Point3::from(*point));
            if point_in_cam.z <= f64::EPSILON || ray.z <= f64::EPSILON {
                return f64::MAX;
            }
            (point_in_cam.coords.xy() / point_in_cam.z - ray.xy() / ray.z).norm_squared()
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn sample_rig() -> Vec<Rigid3> {
        vec![
            Rigid3::identity(),
            Rigid3::from_parts(
                Translation3::new(-0.3, 0.05, 0.0),
                UnitQuaternion::from_euler_angles(0.0, 0.4, 0.0),
            ),
            Rigid3::from_parts(
                Translation3::new(0.2, 0.0, -0.1),
                UnitQuaternion::from_euler_angles(0.1, -0.5, 0.05),
            ),
        ]
    }

    fn observe(cam_from_rig: &Rigid3, rig_from_world: &Rigid3, point: &Vector3<f64>) -> RigRay {
        let point_in_cam = (cam_from_rig * rig_from_world).transform_point(&Point3::from(*point));
        RigRay {
            ray_in_cam: Some(point_in_cam.coords.normalize()),
            cam_from_rig: *cam_from_rig,
        }
    }

    #[test]
    fn test_gp3p_recovers_pose_from_minimal_sample() {
        let rig = sample_rig();
        let rig_from_world = Rigid3::new(Vector3::new(0.1, -0.2, 0.3), Vector3::new(0.05, 0.3, -0.1));
        let world_from_rig = rig_from_world.inverse();
        // Points placed in front of each camera.
        let points: Vec<Vector3<f64>> = [
            Vector3::new(0.2, -0.1, 4.0),
            Vector3::new(-0.5, 0.3, 5.0),
            Vector3::new(0.4, 0.2, 3.0),
        ]
        .iter()
        .zip(&rig)
        .map(|(p_cam, cam_from_rig)| {
            let p_rig = cam_from_rig.inverse_transform_point(&Point3::from(*p_cam));
            world_from_rig.transform_point(&p_rig).coords
        })
        .collect();
        let rays: Vec<RigRay> = points
            .iter()
            .zip(&rig)
            .map(|(p, cam_from_rig)| observe(cam_from_rig, &rig_from_world, p))
            .collect();

        let poses = Gp3pEstimator.estimate(&rays, &points, &[0, 1, 2]);

        assert!(!poses.is_empty());
        let best = poses
            .iter()
            .min_by(|a, b| {
                let da = (a.to_homogeneous() - rig_from_world.to_homogeneous()).norm();
                let db = (b.to_homogeneous() - rig_from_world.to_homogeneous()).norm();
                da.total_cmp(&db)
            })
            .unwrap();
        assert_relative_eq!(best.to_homogeneous(), rig_from_world.to_homogeneous(), epsilon = 1e-6);

        let mut residuals = Vec::new();
        Gp3pEstimator.residuals(&rays, &points, best, &mut residuals);
        assert!(residuals.iter().all(|&r| r < 1e-12));
    }

    #[test]
    fn test_gp3p_central_camera() {
        let cam_from_rig = Rigid3::identity();
        let rig_from_world = Rigid3::new(Vector3::new(-0.4, 0.1, 1.0), Vector3::new(-0.2, 0.1, 0.25));
        let world_from_rig = rig_from_world.inverse();
        let points: Vec<Vector3<f64>> = [
            Vector3::new(-1.0, 0.5, 6.0),
            Vector3::new(1.2, 0.8, 4.0),
            Vector3::new(0.1, -1.1, 5.0),
        ]
        .iter()
        .map(|p| world_from_rig.transform_point(&Point3::from(*p)).coords)
        .collect();
        let rays: Vec<RigRay> = points
            .iter()
            .map(|p| observe(&cam_from_rig, &rig_from_world, p))
            .collect();

        let poses = Gp3pEstimator.estimate(&rays, &points, &[0, 1, 2]);

        assert!(poses.iter().any(|pose| {
            (pose.to_homogeneous() - rig_from_world.to_homogeneous()).norm() < 1e-6
        }));
    }

    #[test]
    fn test_gp3p_missing_ray() {
        let rays = vec![
            RigRay { ray_in_cam: None, cam_from_rig: Rigid3::identity() },
            RigRay { ray_in_cam: Some(Vector3::z()), cam_from_rig: Rigid3::identity() },
            RigRay { ray_in_cam: Some(Vector3::new(0.1, 0.0, 1.0).normalize()), cam_from_rig: Rigid3::identity() },
        ];
        let points = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.2, 0.0, 2.0)];

        assert!(Gp3pEstimator.estimate(&rays, &points, &[0, 1, 2]).is_empty());

        let mut residuals = Vec::new();
        Gp3pEstimator.residuals(&rays, &points, &Rigid3::identity(), &mut residuals);
        assert_eq!(residuals[0], f64::MAX);
        assert!(residuals[1] < 1e-12);
    }
}
