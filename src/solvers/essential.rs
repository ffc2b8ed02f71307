//! Essential matrix estimation for rigs whose cameras share one optical center.
//!
//! Rays are unit bearing vectors around the common center, so the epipolar
//! constraint `r2ᵀ E r1 = 0` holds with `E = [t]× R` for `pano2_from_pano1 = (R, t)`.

use crate::geometry::Rigid3;
use crate::ransac::Estimator;
use crate::solvers::{rotation_from_matrix, svd3_sorted, squared_spherical_sampson_error};
use nalgebra::linalg::Schur;
use nalgebra::{DMatrix, Matrix3, SMatrix, SymmetricEigen, Translation3, Vector3};
use std::ops::{Add, Mul, Sub};

/// Five-point essential matrix estimator on unit rays, the minimal kernel.
///
/// Returns up to ten essential matrices per sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct EssentialFivePointEstimator;

/// Eight-point essential matrix estimator on unit rays.
///
/// The minimal and the non-minimal case share one linear least-squares
/// formulation, so the same kernel also serves as the local estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EssentialEightPointEstimator;

/// Coefficients of `r2ᵀ E r1` on the row-major entries of `E`.
fn epipolar_row(r1: &Vector3<f64>, r2: &Vector3<f64>) -> SMatrix<f64, 9, 1> {
    SMatrix::<f64, 9, 1>::from_fn(|k, _| r2[k / 3] * r1[k % 3])
}

/// Linear eight-point essential matrix from two sets of corresponding rays.
///
/// Solves `r2ᵀ E r1 = 0` in the least-squares sense and projects the result onto
/// the essential manifold with singular values `(1, 1, 0)`. Needs at least eight
/// correspondences.
pub fn essential_from_rays(rays1: &[Vector3<f64>], rays2: &[Vector3<f64>]) -> Option<Matrix3<f64>> {
    if rays1.len() < 8 || rays1.len() != rays2.len() {
        return None;
    }

    let mut normal = SMatrix::<f64, 9, 9>::zeros();
    for (r1, r2) in rays1.iter().zip(rays2) {
        let row = epipolar_row(r1, r2);
        normal += row * row.transpose();
    }

    let eigen = SymmetricEigen::new(normal);
    let (min_idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let e = eigen.eigenvectors.column(min_idx);
    let e = Matrix3::new(e[0], e[1], e[2], e[3], e[4], e[5], e[6], e[7], e[8]);

    let (u, _, v) = svd3_sorted(&e)?;
    Some(u * Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 0.0)) * v.transpose())
}

/// Monomials in `(x, y, z)` up to degree three: the ten cubic ones first, then
/// the basis `[x², xy, xz, y², yz, z², x, y, z, 1]` of the quotient ring.
const MONOMIALS: [(u8, u8, u8); 20] = [
    (3, 0, 0),
    (2, 1, 0),
    (2, 0, 1),
    (1, 2, 0),
    (1, 1, 1),
    (1, 0, 2),
    (0, 3, 0),
    (0, 2, 1),
    (0, 1, 2),
    (0, 0, 3),
    (2, 0, 0),
    (1, 1, 0),
    (1, 0, 1),
    (0, 2, 0),
    (0, 1, 1),
    (0, 0, 2),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (0, 0, 0),
];

/// Cubic monomials `z·b` for the first six basis monomials `b`.
const TIMES_Z_CUBIC: [usize; 6] = [2, 4, 5, 7, 8, 9];

fn monomial_index(degrees: (u8, u8, u8)) -> Option<usize> {
    MONOMIALS.iter().position(|&m| m == degrees)
}

/// Polynomial of degree at most three in `(x, y, z)`, coefficients in [`MONOMIALS`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cubic([f64; 20]);

impl Cubic {
    fn zero() -> Self {
        Cubic([0.0; 20])
    }

    /// `c + cx·x + cy·y + cz·z`
    fn linear(c: f64, cx: f64, cy: f64, cz: f64) -> Self {
        let mut p = Cubic::zero();
        p.0[16] = cx;
        p.0[17] = cy;
        p.0[18] = cz;
        p.0[19] = c;
        p
    }
}

impl Add for Cubic {
    type Output = Cubic;

    fn add(mut self, rhs: Cubic) -> Cubic {
        self.0.iter_mut().zip(rhs.0).for_each(|(a, b)| *a += b);
        self
    }
}

impl Sub for Cubic {
    type Output = Cubic;

    fn sub(mut self, rhs: Cubic) -> Cubic {
        self.0.iter_mut().zip(rhs.0).for_each(|(a, b)| *a -= b);
        self
    }
}

impl Mul<f64> for Cubic {
    type Output = Cubic;

    fn mul(mut self, rhs: f64) -> Cubic {
        self.0.iter_mut().for_each(|a| *a *= rhs);
        self
    }
}

/// Product truncated to degree three.
impl Mul for Cubic {
    type Output = Cubic;

    fn mul(self, rhs: Cubic) -> Cubic {
        let mut out = Cubic::zero();
        for (i, &a) in self.0.iter().enumerate().filter(|(_, a)| **a != 0.0) {
            for (j, &b) in rhs.0.iter().enumerate().filter(|(_, b)| **b != 0.0) {
                let (ax, ay, az) = MONOMIALS[i];
                let (bx, by, bz) = MONOMIALS[j];
                if let Some(k) = monomial_index((ax + bx, ay + by, az + bz)) {
                    out.0[k] += a * b;
                }
            }
        }
        out
    }
}

type CubicMatrix = [[Cubic; 3]; 3];

fn cubic_mat_mul(a: &CubicMatrix, b: &CubicMatrix) -> CubicMatrix {
    let mut out = [[Cubic::zero(); 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, entry) in row.iter_mut().enumerate() {
            *entry = (0..3).fold(Cubic::zero(), |acc, k| acc + a[r][k] * b[k][c]);
        }
    }
    out
}

/// The ten cubic constraints `det(E) = 0` and `2 E Eᵀ E − tr(E Eᵀ) E = 0` on
/// `E = x·E1 + y·E2 + z·E3 + E4`.
fn essential_constraints(basis: &[Matrix3<f64>; 4]) -> [Cubic; 10] {
    let mut e = [[Cubic::zero(); 3]; 3];
    let mut e_t = [[Cubic::zero(); 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            let entry = Cubic::linear(basis[3][(r, c)], basis[0][(r, c)], basis[1][(r, c)], basis[2][(r, c)]);
            e[r][c] = entry;
            e_t[c][r] = entry;
        }
    }

    let det = e[0][0] * (e[1][1] * e[2][2] - e[1][2] * e[2][1]) - e[0][1] * (e[1][0] * e[2][2] - e[1][2] * e[2][0])
        + e[0][2] * (e[1][0] * e[2][1] - e[1][1] * e[2][0]);
    let eet = cubic_mat_mul(&e, &e_t);
    let trace = eet[0][0] + eet[1][1] + eet[2][2];
    let eet_e = cubic_mat_mul(&eet, &e);

    let mut constraints = [Cubic::zero(); 10];
    constraints[0] = det;
    for r in 0..3 {
        for c in 0..3 {
            constraints[1 + 3 * r + c] = eet_e[r][c] * 2.0 - trace * e[r][c];
        }
    }
    constraints
}

/// Five-point essential matrices from five pairs of corresponding rays.
///
/// The four-dimensional null space of the linear constraints `r2ᵀ E r1 = 0` is
/// intersected with the essential matrix variety. Eliminating the cubic
/// monomials leaves the action of `z` on the ten-dimensional quotient basis,
/// whose real eigenvectors give the candidate `(x, y, z)`. Returns up to ten
/// matrices, each scaled to unit Frobenius norm.
pub fn essential_five_point(rays1: &[Vector3<f64>], rays2: &[Vector3<f64>]) -> Vec<Matrix3<f64>> {
    if rays1.len() != 5 || rays2.len() != 5 {
        return Vec::new();
    }

    let mut normal = SMatrix::<f64, 9, 9>::zeros();
    for (r1, r2) in rays1.iter().zip(rays2) {
        let row = epipolar_row(r1, r2);
        normal += row * row.transpose();
    }
    let eigen = SymmetricEigen::new(normal);
    let mut order: Vec<usize> = (0..9).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    let basis: [Matrix3<f64>; 4] = std::array::from_fn(|k| {
        let e = eigen.eigenvectors.column(order[k]);
        Matrix3::new(e[0], e[1], e[2], e[3], e[4], e[5], e[6], e[7], e[8])
    });

    let constraints = essential_constraints(&basis);
    let cubic = DMatrix::from_fn(10, 10, |r, c| constraints[r].0[c]);
    let rest = DMatrix::from_fn(10, 10, |r, c| -constraints[r].0[10 + c]);
    let Some(reduced) = cubic.lu().solve(&rest) else {
        return Vec::new();
    };

    // action * b = z * b for the basis vector b evaluated at any solution.
    let mut action = DMatrix::<f64>::zeros(10, 10);
    for (basis_idx, &cubic_idx) in TIMES_Z_CUBIC.iter().enumerate() {
        action.row_mut(basis_idx).copy_from(&reduced.row(cubic_idx));
    }
    action[(6, 2)] = 1.0;
    action[(7, 4)] = 1.0;
    action[(8, 5)] = 1.0;
    action[(9, 8)] = 1.0;

    let mut solutions = Vec::new();
    for eigenvalue in Schur::new(action.clone()).complex_eigenvalues().iter() {
        if eigenvalue.im.abs() > 1e-8 * eigenvalue.re.abs().max(1.0) {
            continue;
        }
        let shifted = &action - DMatrix::<f64>::identity(10, 10) * eigenvalue.re;
        let svd = shifted.svd(false, true);
        let Some(v_t) = svd.v_t else {
            continue;
        };
        let Some((min_idx, _)) = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
        else {
            continue;
        };
        let b = v_t.row(min_idx);
        if b[9].abs() < 1e-12 {
            continue;
        }
        let e = basis[0] * (b[6] / b[9]) + basis[1] * (b[7] / b[9]) + basis[2] * (b[8] / b[9]) + basis[3];
        let norm = e.norm();
        if norm.is_finite() && norm > 0.0 {
            solutions.push(e / norm);
        }
    }
    solutions
}

/// The four `(R, t)` factorizations of an essential matrix, with unit `t`.
///
/// Candidates are ordered `(R1, t), (R1, -t), (R2, t), (R2, -t)`.
pub fn decompose_essential(e: &Matrix3<f64>) -> Option<[(Matrix3<f64>, Vector3<f64>); 4]> {
    let (mut u, _, mut v) = svd3_sorted(e)?;
    if u.determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    if v.determinant() < 0.0 {
        v.column_mut(2).neg_mut();
    }

    let w = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
    let r1 = u * w * v.transpose();
    let r2 = u * w.transpose() * v.transpose();
    let t: Vector3<f64> = u.column(2).into_owned();

    Some([(r1, t), (r1, -t), (r2, t), (r2, -t)])
}

/// Depths `(λ, μ)` of the midpoint triangulation `μ r2 ≈ λ R r1 + t`.
fn triangulate_depths(
    rotation: &Matrix3<f64>,
    t: &Vector3<f64>,
    r1: &Vector3<f64>,
    r2: &Vector3<f64>,
) -> Option<(f64, f64)> {
    let a = rotation * r1;
    let ab = a.dot(r2);
    let det = a.norm_squared() * r2.norm_squared() - ab * ab;
    if det < 1e-12 {
        return None;
    }
    let at = a.dot(t);
    let bt = r2.dot(t);
    let lambda = (ab * bt - r2.norm_squared() * at) / det;
    let mu = (a.norm_squared() * bt - ab * at) / det;
    Some((lambda, mu))
}

/// Selects the factorization of `e` that puts the most masked correspondences
/// in front of both views.
///
/// Returns `pano2_from_pano1` with unit translation, or `None` if no candidate
/// triangulates a single correspondence with positive depths.
pub fn pose_from_essential(
    e: &Matrix3<f64>,
    rays1: &[Option<Vector3<f64>>],
    rays2: &[Option<Vector3<f64>>],
    inlier_mask: &[bool],
) -> Option<Rigid3> {
    let candidates = decompose_essential(e)?;

    let mut best: Option<(usize, &(Matrix3<f64>, Vector3<f64>))> = None;
    for candidate in &candidates {
        let (rotation, t) = candidate;
        let num_in_front = rays1
            .iter()
            .zip(rays2)
            .zip(inlier_mask)
            .filter(|&(_, &inlier)| inlier)
            .filter_map(|((r1, r2), _)| triangulate_depths(rotation, t, r1.as_ref()?, r2.as_ref()?))
            .filter(|&(lambda, mu)| lambda > 0.0 && mu > 0.0)
            .count();
        if num_in_front > best.map_or(0, |(count, _)| count) {
            best = Some((num_in_front, candidate));
        }
    }

    let (_, (rotation, t)) = best?;
    Some(Rigid3::from_parts(Translation3::from(*t), rotation_from_matrix(rotation)))
}

/// Rays of the sampled correspondences, `None` if one of them is missing.
fn sampled_rays(
    x: &[Option<Vector3<f64>>],
    y: &[Option<Vector3<f64>>],
    sample: &[usize],
) -> Option<(Vec<Vector3<f64>>, Vec<Vector3<f64>>)> {
    let pairs: Vec<(Vector3<f64>, Vector3<f64>)> =
        sample.iter().map(|&idx| Some((x[idx]?, y[idx]?))).collect::<Option<_>>()?;
    Some(pairs.into_iter().unzip())
}

fn sampson_residuals(
    x: &[Option<Vector3<f64>>],
    y: &[Option<Vector3<f64>>],
    e: &Matrix3<f64>,
    residuals: &mut Vec<f64>,
) {
    residuals.clear();
    residuals.extend(x.iter().zip(y).map(|pair| match pair {
        (Some(r1), Some(r2)) => squared_spherical_sampson_error(r1, r2, e),
        _ => f64::MAX,
    }));
}

impl Estimator for EssentialFivePointEstimator {
    type X = Option<Vector3<f64>>;
    type Y = Option<Vector3<f64>>;
    type Model = Matrix3<f64>;

    const MIN_NUM_SAMPLES: usize = 5;

    fn estimate(
        &self,
        x: &[Option<Vector3<f64>>],
        y: &[Option<Vector3<f64>>],
        sample: &[usize],
    ) -> Vec<Matrix3<f64>> {
        match sampled_rays(x, y, sample) {
            Some((rays1, rays2)) => essential_five_point(&rays1, &rays2),
            None => Vec::new(),
        }
    }

    fn residuals(
        &self,
        x: &[Option<Vector3<f64>>],
        y: &[Option<Vector3<f64>>],
        e: &Matrix3<f64>,
        residuals: &mut Vec<f64>,
    ) {
        sampson_residuals(x, y, e, residuals);
    }
}

impl Estimator for EssentialEightPointEstimator {
    type X = Option<Vector3<f64>>;
    type Y = Option<Vector3<f64>>;
    type Model = Matrix3<f64>;

    const MIN_NUM_SAMPLES: usize = 8;

    fn estimate(
        &self,
        x: &[Option<Vector3<f64>>],
        y: &[Option<Vector3<f64>>],
        sample: &[usize],
    ) -> Vec<Matrix3<f64>> {
        sampled_rays(x, y, sample)
            .and_then(|(rays1, rays2)| essential_from_rays(&rays1, &rays2))
            .into_iter()
            .collect()
    }

    fn residuals(
        &self,
        x: &[Option<Vector3<f64>>],
        y: &[Option<Vector3<f64>>],
        e: &Matrix3<f64>,
        residuals: &mut Vec<f64>,
    ) {
        sampson_residuals(x, y, e, residuals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::skew;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn scene(pano2_from_pano1: &Rigid3, n: usize) -> (Vec<Option<Vector3<f64>>>, Vec<Option<Vector3<f64>>>) {
        (0..n)
            .map(|i| {
                let a = i as f64 * 1.3;
                // Points all around the center, not only in front of one camera.
                let point = Vector3::new(4.0 * a.cos(), 1.0 + (0.7 * a).sin(), 4.0 * a.sin() + 0.5);
                let in_second = pano2_from_pano1.transform_point(&Point3::from(point)).coords;
                (Some(point.normalize()), Some(in_second.normalize()))
            })
            .unzip()
    }

    #[test]
    fn test_eight_point_recovers_essential_matrix() {
        let pose = Rigid3::new(Vector3::new(0.6, 0.1, -0.3), Vector3::new(0.1, -0.4, 0.05));
        let (x, y) = scene(&pose, 8);

        let models = EssentialEightPointEstimator.estimate(&x, &y, &(0..8).collect::<Vec<_>>());

        assert_eq!(models.len(), 1);
        let t = pose.translation.vector.normalize();
        let expected = skew(&t) * pose.rotation.to_rotation_matrix().into_inner();
        let e = models[0];
        let sign = if (e - expected).norm() < (e + expected).norm() { 1.0 } else { -1.0 };
        assert_relative_eq!(e * sign, expected, epsilon = 1e-8);

        let mut residuals = Vec::new();
        EssentialEightPointEstimator.residuals(&x, &y, &e, &mut residuals);
        assert!(residuals.iter().all(|&r| r < 1e-16));
    }

    #[test]
    fn test_five_point_contains_true_essential_matrix() {
        let pose = Rigid3::new(Vector3::new(0.3, -0.2, 0.5), Vector3::new(-0.1, 0.25, 0.1));
        let (x, y) = scene(&pose, 5);

        let models = EssentialFivePointEstimator.estimate(&x, &y, &[0, 1, 2, 3, 4]);

        assert!(!models.is_empty() && models.len() <= 10);
        let expected = skew(&pose.translation.vector) * pose.rotation.to_rotation_matrix().into_inner();
        let expected = expected / expected.norm();
        assert!(models
            .iter()
            .any(|e| (e - expected).norm() < 1e-6 || (e + expected).norm() < 1e-6));

        let mut residuals = Vec::new();
        for e in &models {
            assert_relative_eq!(e.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(e.determinant(), 0.0, epsilon = 1e-6);
            EssentialFivePointEstimator.residuals(&x, &y, e, &mut residuals);
            assert!(residuals.iter().all(|&r| r < 1e-12));
        }
    }

    #[test]
    fn test_five_point_needs_exactly_five_pairs() {
        let pose = Rigid3::new(Vector3::new(0.3, -0.2, 0.5), Vector3::zeros());
        let (x, y) = scene(&pose, 6);
        let rays1: Vec<Vector3<f64>> = x.iter().flatten().copied().collect();
        let rays2: Vec<Vector3<f64>> = y.iter().flatten().copied().collect();

        assert!(essential_five_point(&rays1, &rays2).is_empty());
        assert!(essential_five_point(&rays1[..4], &rays2[..4]).is_empty());
    }

    #[test]
    fn test_decompose_essential_candidates_are_rotations() {
        let pose = Rigid3::new(Vector3::new(1.0, 0.0, 0.2), Vector3::new(0.0, 0.3, 0.0));
        let e = skew(&pose.translation.vector) * pose.rotation.to_rotation_matrix().into_inner();

        let candidates = decompose_essential(&e).unwrap();

        for (rotation, t) in &candidates {
            assert_relative_eq!(rotation.determinant(), 1.0, epsilon = 1e-10);
            assert_relative_eq!(rotation * rotation.transpose(), Matrix3::identity(), epsilon = 1e-10);
            assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(candidates[0].0, candidates[1].0);
        assert_relative_eq!(candidates[0].1, -candidates[1].1);
    }

    #[test]
    fn test_pose_from_essential_selects_cheiral_candidate() {
        let pose = Rigid3::new(Vector3::new(-0.5, 0.2, 0.4), Vector3::new(0.05, 0.2, -0.1));
        let (x, y) = scene(&pose, 20);
        let e = skew(&pose.translation.vector) * pose.rotation.to_rotation_matrix().into_inner();

        let recovered = pose_from_essential(&e, &x, &y, &[true; 20]).unwrap();

        assert_relative_eq!(
            recovered.rotation.to_rotation_matrix().into_inner(),
            pose.rotation.to_rotation_matrix().into_inner(),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            recovered.translation.vector,
            pose.translation.vector.normalize(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_pose_from_essential_without_inliers() {
        let pose = Rigid3::new(Vector3::new(0.5, 0.0, 0.0), Vector3::zeros());
        let (x, y) = scene(&pose, 10);
        let e = skew(&pose.translation.vector) * pose.rotation.to_rotation_matrix().into_inner();

        assert!(pose_from_essential(&e, &x, &y, &[false; 10]).is_none());
    }

    #[test]
    fn test_missing_rays() {
        let pose = Rigid3::new(Vector3::new(0.6, 0.1, -0.3), Vector3::zeros());
        let (mut x, y) = scene(&pose, 9);
        x[2] = None;

        assert!(EssentialEightPointEstimator
            .estimate(&x, &y, &[0, 1, 2, 3, 4, 5, 6, 7])
            .is_empty());
        assert!(EssentialFivePointEstimator.estimate(&x, &y, &[0, 1, 2, 3, 4]).is_empty());

        let mut residuals = Vec::new();
        EssentialEightPointEstimator.residuals(&x, &y, &Matrix3::identity(), &mut residuals);
        assert_eq!(residuals[2], f64::MAX);
    }
}
