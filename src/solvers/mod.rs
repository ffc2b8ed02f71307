//! Minimal and non-minimal pose solvers plugged into the consensus engine.
//!
//! * [`gp3p`]: rig pose from three rig rays and their world points.
//! * [`generalized_relative`]: relative rig pose from six or more pairs of rig
//!   rays (generalized epipolar constraint). Its minimal kernel tracks the
//!   solutions of a start system by homotopy continuation.
//! * [`essential`]: five-point and eight-point essential matrices for central
//!   (panoramic) rigs.
//!
//! The shared helpers below are small dense linear algebra routines on 3x3
//! matrices.

use crate::geometry::Rigid3;
use nalgebra::{Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

pub mod essential;
pub mod generalized_relative;
pub mod gp3p;
mod homotopy;

pub use essential::{EssentialEightPointEstimator, EssentialFivePointEstimator};
pub use generalized_relative::{Gr6pEstimator, Gr8pEstimator};
pub use gp3p::Gp3pEstimator;

/// Cross product matrix: `skew(a) * b == a.cross(&b)`.
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// SVD `m = u * diag(s) * vᵀ` with singular values in decreasing order.
pub fn svd3_sorted(m: &Matrix3<f64>) -> Option<(Matrix3<f64>, Vector3<f64>, Matrix3<f64>)> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v = svd.v_t?.transpose();
    let s = svd.singular_values;

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| s[b].total_cmp(&s[a]));

    let mut u_sorted = Matrix3::zeros();
    let mut v_sorted = Matrix3::zeros();
    let mut s_sorted = Vector3::zeros();
    for (dst, &src) in order.iter().enumerate() {
        u_sorted.set_column(dst, &u.column(src));
        v_sorted.set_column(dst, &v.column(src));
        s_sorted[dst] = s[src];
    }
    Some((u_sorted, s_sorted, v_sorted))
}

/// Unit quaternion of a matrix that is already a rotation up to round-off.
pub fn rotation_from_matrix(m: &Matrix3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*m))
}

/// Rigid transform `dst ≈ R * src + t` minimizing the squared point distances.
///
/// Kabsch alignment. Returns `None` for fewer than three points or a failed SVD.
pub fn align_points(src: &[Vector3<f64>], dst: &[Vector3<f64>]) -> Option<Rigid3> {
    if src.len() < 3 || src.len() != dst.len() {
        return None;
    }
    let n = src.len() as f64;
    let src_centroid = src.iter().sum::<Vector3<f64>>() / n;
    let dst_centroid = dst.iter().sum::<Vector3<f64>>() / n;

    let mut covariance = Matrix3::zeros();
    for (s, d) in src.iter().zip(dst) {
        covariance += (s - src_centroid) * (d - dst_centroid).transpose();
    }

    let rotation = align_directions_from_covariance(&covariance)?;
    let translation = dst_centroid - rotation * src_centroid;
    Some(Rigid3::from_parts(
        Translation3::from(translation),
        rotation_from_matrix(&rotation),
    ))
}

/// Rotation `R` maximizing `Σ dstᵀ R src` given `Σ src dstᵀ`.
pub(crate) fn align_directions_from_covariance(covariance: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let (u, _, v) = svd3_sorted(covariance)?;
    let mut correction = Matrix3::identity();
    if (v * u.transpose()).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    Some(v * correction * u.transpose())
}

/// First-order geometric error of the epipolar constraint `r2ᵀ E r1 = 0` on
/// unit rays.
///
/// The algebraic error is normalized by its gradient restricted to the tangent
/// planes of both rays, so the result is an angle squared and does not depend
/// on where the rays point.
pub fn squared_spherical_sampson_error(ray1: &Vector3<f64>, ray2: &Vector3<f64>, e: &Matrix3<f64>) -> f64 {
    let e_ray1 = e * ray1;
    let et_ray2 = e.transpose() * ray2;
    let num = ray2.dot(&e_ray1);
    let num2 = num * num;
    let denom = (e_ray1.norm_squared() - num2) + (et_ray2.norm_squared() - num2);
    if denom <= f64::EPSILON * f64::EPSILON {
        return if num2 <= f64::EPSILON * f64::EPSILON { 0.0 } else { f64::MAX };
    }
    num2 / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_skew_matches_cross_product() {
        let a = Vector3::new(0.3, -1.2, 2.0);
        let b = Vector3::new(-0.7, 0.4, 1.1);
        assert_relative_eq!(skew(&a) * b, a.cross(&b), epsilon = 1e-15);
    }

    #[test]
    fn test_svd3_sorted_reconstructs() {
        let m = Matrix3::new(0.1, 2.0, -0.3, 0.4, -0.1, 0.2, -0.2, 0.5, 3.0);
        let (u, s, v) = svd3_sorted(&m).unwrap();
        assert!(s[0] >= s[1] && s[1] >= s[2]);
        assert_relative_eq!(u * Matrix3::from_diagonal(&s) * v.transpose(), m, epsilon = 1e-12);
    }

    #[test]
    fn test_align_points_recovers_transform() {
        let truth = Rigid3::new(Vector3::new(0.5, -1.0, 2.0), Vector3::new(0.2, -0.4, 1.1));
        let src = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.5),
            Vector3::new(-1.0, 0.3, 4.0),
        ];
        let dst: Vec<Vector3<f64>> = src
            .iter()
            .map(|p| truth.transform_point(&(*p).into()).coords)
            .collect();

        let estimate = align_points(&src, &dst).unwrap();

        assert_relative_eq!(estimate.to_homogeneous(), truth.to_homogeneous(), epsilon = 1e-12);
    }

    #[test]
    fn test_spherical_sampson_error_is_zero_on_epipolar_pair() {
        let pose = Rigid3::new(Vector3::new(1.0, 0.1, 0.0), Vector3::new(0.0, 0.2, 0.0));
        let e = skew(&pose.translation.vector) * pose.rotation.to_rotation_matrix().into_inner();
        let point = Vector3::new(0.3, -0.2, 5.0);
        let ray1 = point.normalize();
        let ray2 = pose.transform_point(&point.into()).coords.normalize();

        assert!(squared_spherical_sampson_error(&ray1, &ray2, &e) < 1e-20);

        // A small angular perturbation yields an error of the same order.
        let perturbed = (ray2 + Vector3::new(0.0, 1e-3, 0.0)).normalize();
        let error = squared_spherical_sampson_error(&ray1, &perturbed, &e).sqrt();
        assert!(error > 1e-5 && error < 2e-3);
    }
}
