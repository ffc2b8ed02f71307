//! All solutions of the six-line generalized epipolar system by parameter homotopy.
//!
//! Rotations use Cayley parameters `s`, with `R = R̃(s) / (1 + sᵀs)` and
//! `R̃(s) = (1 − sᵀs) I + 2 [s]× + 2 s sᵀ`. Scaling each line constraint by
//! `1 + sᵀs` leaves one cubic per correspondence in the unknowns `(s, t)`:
//!
//! ```text
//! (R̃ d1)·m2 + d2·(R̃ m1) + t·((R̃ d1) × d2) = 0,    m = p × d
//! ```
//!
//! Six generic correspondences have 64 complex solutions. [`start`] holds a
//! generic complex instance together with all of them. Each start solution is
//! continued along the straight segment from the start lines to the observed
//! lines, and the real endpoints are the candidate poses. The complex start
//! keeps every path clear of singular systems with probability one, so no
//! solution is missed.

use crate::geometry::Rigid3;
use crate::solvers::{rotation_from_matrix, skew};
use nalgebra::{Complex, Matrix3, Matrix6, Translation3, Vector3, Vector6};
use rayon::prelude::*;

mod start;

type C = Complex<f64>;

const MAX_NUM_STEPS: usize = 2000;
const INITIAL_STEP: f64 = 0.05;
const MAX_STEP: f64 = 0.2;
const MIN_STEP: f64 = 1e-10;
/// Accepted steps in a row before the step size doubles.
const NUM_STEPS_BEFORE_GROWTH: usize = 3;
const NUM_CORRECTIONS: usize = 3;
const CORRECTOR_TOLERANCE: f64 = 1e-10;
/// Paths growing past this norm head to a solution at infinity.
const MAX_SOLUTION_NORM: f64 = 1e7;
/// Relative size of the imaginary part below which an endpoint is real.
const MAX_IMAGINARY_PART: f64 = 1e-6;

fn c(re: f64) -> C {
    C::new(re, 0.0)
}

/// `R̃(s) v`
fn cayley_apply(s: &Vector3<C>, v: &Vector3<C>) -> Vector3<C> {
    v * (c(1.0) - s.dot(s)) + s.cross(v) * c(2.0) + s * (s.dot(v) * c(2.0))
}

/// `∂(R̃(s) v) / ∂s_k`
fn cayley_apply_derivative(s: &Vector3<C>, v: &Vector3<C>, k: usize) -> Vector3<C> {
    let e = Vector3::<C>::from_fn(|i, _| if i == k { c(1.0) } else { c(0.0) });
    v * (s[k] * c(-2.0)) + e.cross(v) * c(2.0) + e * (s.dot(v) * c(2.0)) + s * (v[k] * c(2.0))
}

/// One correspondence as two lines, each through `p` with direction `d`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Lines {
    d1: Vector3<C>,
    p1: Vector3<C>,
    d2: Vector3<C>,
    p2: Vector3<C>,
}

impl Lines {
    fn from_parts(parts: &[[[f64; 2]; 3]; 4]) -> Self {
        let vector = |part: &[[f64; 2]; 3]| Vector3::<C>::from_fn(|i, _| C::new(part[i][0], part[i][1]));
        Lines {
            d1: vector(&parts[0]),
            p1: vector(&parts[1]),
            d2: vector(&parts[2]),
            p2: vector(&parts[3]),
        }
    }

    /// Lines of a real Plücker pair `(d1, m1, d2, m2)`.
    fn from_plucker(d1: &Vector3<f64>, m1: &Vector3<f64>, d2: &Vector3<f64>, m2: &Vector3<f64>) -> Self {
        let complex = |v: Vector3<f64>| v.map(c);
        Lines {
            d1: complex(*d1),
            p1: complex(d1.cross(m1) / d1.norm_squared()),
            d2: complex(*d2),
            p2: complex(d2.cross(m2) / d2.norm_squared()),
        }
    }

    fn lerp(&self, other: &Lines, tau: f64) -> Lines {
        let (a, b) = (c(1.0 - tau), c(tau));
        Lines {
            d1: self.d1 * a + other.d1 * b,
            p1: self.p1 * a + other.p1 * b,
            d2: self.d2 * a + other.d2 * b,
            p2: self.p2 * a + other.p2 * b,
        }
    }

    fn difference(&self, other: &Lines) -> Lines {
        Lines {
            d1: other.d1 - self.d1,
            p1: other.p1 - self.p1,
            d2: other.d2 - self.d2,
            p2: other.p2 - self.p2,
        }
    }

    fn residual(&self, x: &Vector6<C>) -> C {
        let (s, t) = split(x);
        let u = cayley_apply(&s, &self.d1);
        let w = cayley_apply(&s, &self.p1.cross(&self.d1));
        u.dot(&self.p2.cross(&self.d2)) + self.d2.dot(&w) + t.dot(&u.cross(&self.d2))
    }

    /// Row of the Jacobian with respect to `(s, t)`.
    fn gradient(&self, x: &Vector6<C>) -> Vector6<C> {
        let (s, t) = split(x);
        let m1 = self.p1.cross(&self.d1);
        let m2 = self.p2.cross(&self.d2);
        // t·(u × d2) = u·(d2 × t)
        let d2_cross_t = self.d2.cross(&t);
        let mut gradient = Vector6::zeros();
        for k in 0..3 {
            let du = cayley_apply_derivative(&s, &self.d1, k);
            let dw = cayley_apply_derivative(&s, &m1, k);
            gradient[k] = du.dot(&m2) + self.d2.dot(&dw) + du.dot(&d2_cross_t);
        }
        gradient
            .fixed_rows_mut::<3>(3)
            .copy_from(&cayley_apply(&s, &self.d1).cross(&self.d2));
        gradient
    }

    /// Derivative of the residual along the parameter direction `delta`.
    fn parameter_derivative(&self, delta: &Lines, x: &Vector6<C>) -> C {
        let (s, t) = split(x);
        let m1 = self.p1.cross(&self.d1);
        let m2 = self.p2.cross(&self.d2);
        let dm1 = delta.p1.cross(&self.d1) + self.p1.cross(&delta.d1);
        let dm2 = delta.p2.cross(&self.d2) + self.p2.cross(&delta.d2);
        let u = cayley_apply(&s, &self.d1);
        let du = cayley_apply(&s, &delta.d1);
        let w = cayley_apply(&s, &m1);
        let dw = cayley_apply(&s, &dm1);
        du.dot(&m2)
            + u.dot(&dm2)
            + delta.d2.dot(&w)
            + self.d2.dot(&dw)
            + t.dot(&du.cross(&self.d2))
            + t.dot(&u.cross(&delta.d2))
    }
}

fn split(x: &Vector6<C>) -> (Vector3<C>, Vector3<C>) {
    (x.fixed_rows::<3>(0).into_owned(), x.fixed_rows::<3>(3).into_owned())
}

fn residuals(lines: &[Lines; 6], x: &Vector6<C>) -> Vector6<C> {
    Vector6::from_fn(|i, _| lines[i].residual(x))
}

fn jacobian(lines: &[Lines; 6], x: &Vector6<C>) -> Matrix6<C> {
    let mut jacobian = Matrix6::zeros();
    for (i, line) in lines.iter().enumerate() {
        jacobian.set_row(i, &line.gradient(x).transpose());
    }
    jacobian
}

/// Newton iterations back onto the solution set. Fails unless every step at
/// least halves the previous one.
fn correct(lines: &[Lines; 6], mut x: Vector6<C>) -> Option<Vector6<C>> {
    let mut previous = f64::INFINITY;
    for _ in 0..NUM_CORRECTIONS {
        let dx = jacobian(lines, &x).lu().solve(&(-residuals(lines, &x)))?;
        let norm = dx.norm();
        x += dx;
        if norm > 0.5 * previous {
            return None;
        }
        if norm < CORRECTOR_TOLERANCE * (1.0 + x.norm()) {
            return Some(x);
        }
        previous = norm;
    }
    None
}

/// A straight segment in parameter space from `from` to `to`.
struct Segment<'a> {
    from: &'a [Lines; 6],
    to: &'a [Lines; 6],
    delta: [Lines; 6],
}

impl<'a> Segment<'a> {
    fn new(from: &'a [Lines; 6], to: &'a [Lines; 6]) -> Self {
        Segment {
            from,
            to,
            delta: std::array::from_fn(|i| from[i].difference(&to[i])),
        }
    }

    fn at(&self, tau: f64) -> [Lines; 6] {
        std::array::from_fn(|i| self.from[i].lerp(&self.to[i], tau))
    }

    /// `dx/dτ` keeping all residuals at zero.
    fn tangent(&self, x: &Vector6<C>, tau: f64) -> Option<Vector6<C>> {
        let lines = self.at(tau);
        let rhs = Vector6::from_fn(|i, _| -lines[i].parameter_derivative(&self.delta[i], x));
        jacobian(&lines, x).lu().solve(&rhs)
    }

    /// Runge-Kutta prediction from `tau` to `tau + h`, then Newton correction.
    fn step(&self, x: &Vector6<C>, tau: f64, h: f64) -> Option<Vector6<C>> {
        let k1 = self.tangent(x, tau)?;
        let k2 = self.tangent(&(x + k1 * c(h / 2.0)), tau + h / 2.0)?;
        let k3 = self.tangent(&(x + k2 * c(h / 2.0)), tau + h / 2.0)?;
        let k4 = self.tangent(&(x + k3 * c(h)), tau + h)?;
        let predicted = x + (k1 + k2 * c(2.0) + k3 * c(2.0) + k4) * c(h / 6.0);
        correct(&self.at(tau + h), predicted)
    }

    /// Follows the solution `start` of the `from` system to the `to` system.
    fn track(&self, start: &Vector6<C>) -> Option<Vector6<C>> {
        let mut x = *start;
        let mut tau = 0.0;
        let mut h = INITIAL_STEP;
        let mut num_accepted = 0;
        for _ in 0..MAX_NUM_STEPS {
            if tau >= 1.0 {
                return Some(x);
            }
            let end = if tau + h >= 1.0 { 1.0 } else { tau + h };
            match self.step(&x, tau, end - tau) {
                Some(next) => {
                    x = next;
                    tau = end;
                    num_accepted += 1;
                    if num_accepted == NUM_STEPS_BEFORE_GROWTH {
                        h = (2.0 * h).min(MAX_STEP);
                        num_accepted = 0;
                    }
                }
                None => {
                    h = 0.5 * (end - tau);
                    num_accepted = 0;
                    if h < MIN_STEP {
                        return None;
                    }
                }
            }
            if x.norm() > MAX_SOLUTION_NORM {
                return None;
            }
        }
        (tau >= 1.0).then_some(x)
    }
}

/// Pose of a real endpoint `(s, t)`.
fn pose_from_solution(x: &Vector6<C>) -> Option<Rigid3> {
    let scale = 1.0 + x.norm();
    if x.iter().any(|v| v.im.abs() > MAX_IMAGINARY_PART * scale) {
        return None;
    }
    let s = Vector3::new(x[0].re, x[1].re, x[2].re);
    let t = Vector3::new(x[3].re, x[4].re, x[5].re);
    let q = s.norm_squared();
    let rotation = (Matrix3::identity() * (1.0 - q) + skew(&s) * 2.0 + s * s.transpose() * 2.0) / (1.0 + q);
    Some(Rigid3::from_parts(
        Translation3::from(t),
        rotation_from_matrix(&rotation),
    ))
}

/// Every real `rig2_from_rig1` satisfying the constraints of six Plücker line
/// pairs `(d1, m1, d2, m2)`, apart from half turns, whose Cayley parameters
/// are at infinity.
///
/// The poses are accurate to the tracking tolerance and worth a final
/// polish on the original constraints.
pub(super) fn six_line_solutions(pairs: &[[Vector3<f64>; 4]; 6]) -> Vec<Rigid3> {
    let start_lines: [Lines; 6] = std::array::from_fn(|i| Lines::from_parts(&start::LINES[i]));
    let target_lines: [Lines; 6] =
        std::array::from_fn(|i| Lines::from_plucker(&pairs[i][0], &pairs[i][1], &pairs[i][2], &pairs[i][3]));
    let segment = Segment::new(&start_lines, &target_lines);

    start::SOLUTIONS
        .par_iter()
        .filter_map(|solution| {
            let start = Vector6::<C>::from_fn(|i, _| C::new(solution[i][0], solution[i][1]));
            segment.track(&start)
        })
        .filter_map(|x| pose_from_solution(&x))
        .collect()
}
