//! Robust least-squares problems solved with tiny-solver.
//!
//! [`RobustProblem`] mirrors every residual block it hands to
//! [`tiny_solver::problem::Problem`] so the cost, the tangent-space gradient
//! and the Jacobian used for covariance estimation can be evaluated outside
//! the solver at any parameter values. All blocks use a Cauchy loss.
//!
//! Tangent coordinates are the free entries of Euclidean blocks and a left
//! rotation increment `q ← exp(δω) q` for quaternion blocks, which are stored
//! as `[qx, qy, qz, qw]`.

use log::warn;
use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tiny_solver::factors::{Factor, FactorImpl};
use tiny_solver::linear::sparse::LinearSolverType;
use tiny_solver::loss_functions::CauchyLoss;
use tiny_solver::manifold::so3::QuaternionManifold;
use tiny_solver::optimizer::{Optimizer, OptimizerOptions};
use tiny_solver::problem::Problem;
use tiny_solver::LevenbergMarquardtOptimizer;

/// Relative step of the central differences.
const NUMERIC_DIFF_STEP: f64 = 1e-6;

/// Named parameter block of a problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterBlock {
    pub name: String,
    pub len: usize,
}

impl ParameterBlock {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        ParameterBlock {
            name: name.into(),
            len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub max_num_iterations: usize,
    /// Threshold on the max-norm of the tangent-space gradient.
    pub gradient_tolerance: f64,
    /// Size of the worker pool the solver runs in.
    pub num_threads: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_num_iterations: 100,
            gradient_tolerance: 1.0,
            num_threads: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationType {
    /// The gradient tolerance is met.
    Converged,
    /// The solver stopped with a finite solution above the gradient tolerance.
    NoConvergence,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSummary {
    pub num_residual_blocks: usize,
    pub num_parameters: usize,
    pub num_effective_parameters: usize,
    /// `0.5 * Σ ρ(‖r‖²)` at the initial values.
    pub initial_cost: f64,
    pub final_cost: f64,
    pub gradient_max_norm: f64,
    pub termination: TerminationType,
}

impl SolverSummary {
    /// Whether the solver produced a finite solution worth using.
    pub fn is_solution_usable(&self) -> bool {
        self.termination != TerminationType::Failure
    }
}

impl fmt::Display for SolverSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solver Summary")?;
        writeln!(f, "  Residual blocks      {}", self.num_residual_blocks)?;
        writeln!(
            f,
            "  Parameters           {} ({} effective)",
            self.num_parameters, self.num_effective_parameters
        )?;
        writeln!(f, "  Initial cost         {:.6e}", self.initial_cost)?;
        writeln!(f, "  Final cost           {:.6e}", self.final_cost)?;
        writeln!(f, "  Gradient max norm    {:.6e}", self.gradient_max_norm)?;
        write!(f, "  Termination          {:?}", self.termination)
    }
}

enum VariableKind {
    Euclidean { fixed: Vec<usize> },
    Quaternion,
}

struct Variable {
    block: ParameterBlock,
    kind: VariableKind,
}

struct ResidualBlock<F> {
    factor: F,
    variables: Vec<String>,
    loss_scale: f64,
}

/// One free direction of the tangent space.
#[derive(Debug, Clone, Copy)]
struct TangentCoordinate {
    variable: usize,
    dim: usize,
}

/// Robustified residuals and their Jacobian with respect to the tangent coordinates.
struct Linearization {
    jacobian: DMatrix<f64>,
    residuals: DVector<f64>,
    cost: f64,
}

impl Linearization {
    fn gradient_max_norm(&self) -> f64 {
        (self.jacobian.transpose() * &self.residuals).amax()
    }
}

/// `(ρ(s), ρ'(s))` of the Cauchy loss with scale `b`: `ρ(s) = b² ln(1 + s / b²)`.
fn cauchy(squared_norm: f64, scale: f64) -> (f64, f64) {
    let scale2 = scale * scale;
    let t = 1.0 + squared_norm / scale2;
    (scale2 * t.ln(), 1.0 / t)
}

fn quaternion_from_block(v: &DVector<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(v[3], v[0], v[1], v[2]))
}

/// A robust least-squares problem over named parameter blocks.
pub struct RobustProblem<F> {
    problem: Problem,
    variables: Vec<Variable>,
    residual_blocks: Vec<ResidualBlock<F>>,
}

impl<F> Default for RobustProblem<F>
where
    F: FactorImpl + Factor<f64> + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F> RobustProblem<F>
where
    F: FactorImpl + Factor<f64> + Clone + Send + 'static,
{
    pub fn new() -> Self {
        RobustProblem {
            problem: Problem::new(),
            variables: Vec::new(),
            residual_blocks: Vec::new(),
        }
    }

    /// Registers a Euclidean block whose entries at `fixed` stay constant.
    pub fn add_euclidean_variable(&mut self, block: &ParameterBlock, fixed: Vec<usize>) {
        for &idx in &fixed {
            self.problem.fix_variable(&block.name, idx);
        }
        self.variables.push(Variable {
            block: block.clone(),
            kind: VariableKind::Euclidean { fixed },
        });
    }

    /// Registers a unit quaternion block `[qx, qy, qz, qw]`.
    pub fn add_quaternion_variable(&mut self, block: &ParameterBlock) {
        self.problem
            .set_variable_manifold(&block.name, Arc::new(QuaternionManifold));
        self.variables.push(Variable {
            block: block.clone(),
            kind: VariableKind::Quaternion,
        });
    }

    pub fn add_residual_block(&mut self, dim: usize, blocks: &[&ParameterBlock], factor: F, loss_scale: f64) {
        let names: Vec<&str> = blocks.iter().map(|block| block.name.as_str()).collect();
        self.problem.add_residual_block(
            dim,
            &names,
            Box::new(factor.clone()),
            Some(Box::new(CauchyLoss::new(loss_scale))),
        );
        self.residual_blocks.push(ResidualBlock {
            factor,
            variables: blocks.iter().map(|block| block.name.clone()).collect(),
            loss_scale,
        });
    }

    pub fn num_residual_blocks(&self) -> usize {
        self.residual_blocks.len()
    }

    fn num_parameters(&self) -> usize {
        self.variables.iter().map(|variable| variable.block.len).sum()
    }

    fn tangent_coordinates(&self) -> Vec<TangentCoordinate> {
        let mut coordinates = Vec::new();
        for (variable_idx, variable) in self.variables.iter().enumerate() {
            match &variable.kind {
                VariableKind::Euclidean { fixed } => coordinates.extend(
                    (0..variable.block.len)
                        .filter(|idx| !fixed.contains(idx))
                        .map(|dim| TangentCoordinate {
                            variable: variable_idx,
                            dim,
                        }),
                ),
                VariableKind::Quaternion => coordinates.extend((0..3).map(|dim| TangentCoordinate {
                    variable: variable_idx,
                    dim,
                })),
            }
        }
        coordinates
    }

    /// Moves `values` by `step` along one tangent coordinate.
    fn retract(&self, values: &mut HashMap<String, DVector<f64>>, coordinate: TangentCoordinate, step: f64) {
        let variable = &self.variables[coordinate.variable];
        let Some(value) = values.get_mut(&variable.block.name) else {
            return;
        };
        match variable.kind {
            VariableKind::Euclidean { .. } => value[coordinate.dim] += step,
            VariableKind::Quaternion => {
                let mut delta = Vector3::zeros();
                delta[coordinate.dim] = step;
                let rotated = UnitQuaternion::from_scaled_axis(delta) * quaternion_from_block(value);
                value.copy_from_slice(rotated.coords.as_slice());
            }
        }
    }

    fn step_size(&self, values: &HashMap<String, DVector<f64>>, coordinate: TangentCoordinate) -> f64 {
        let variable = &self.variables[coordinate.variable];
        match variable.kind {
            VariableKind::Quaternion => NUMERIC_DIFF_STEP,
            VariableKind::Euclidean { .. } => values
                .get(&variable.block.name)
                .map_or(NUMERIC_DIFF_STEP, |value| NUMERIC_DIFF_STEP * value[coordinate.dim].abs().max(1.0)),
        }
    }

    /// Raw residuals of every block, `None` if a block misses its values.
    fn residuals(&self, values: &HashMap<String, DVector<f64>>) -> Option<Vec<DVector<f64>>> {
        self.residual_blocks
            .iter()
            .map(|block| {
                let params = block
                    .variables
                    .iter()
                    .map(|name| values.get(name).cloned())
                    .collect::<Option<Vec<_>>>()?;
                Some(Factor::<f64>::residual_func(&block.factor, &params))
            })
            .collect()
    }

    /// Cost and the Cauchy-weighted Jacobian by central differences.
    fn linearize(&self, values: &HashMap<String, DVector<f64>>) -> Option<Linearization> {
        let residuals = self.residuals(values)?;
        let mut weights = Vec::with_capacity(residuals.len());
        let mut cost = 0.0;
        for (block, residual) in self.residual_blocks.iter().zip(&residuals) {
            let (rho, rho_prime) = cauchy(residual.norm_squared(), block.loss_scale);
            cost += 0.5 * rho;
            weights.push(rho_prime.sqrt());
        }
        if !cost.is_finite() {
            return None;
        }

        let num_rows: usize = residuals.iter().map(|r| r.len()).sum();
        let weighted = |blocks: &[DVector<f64>]| {
            let mut stacked = DVector::zeros(num_rows);
            let mut row = 0;
            for (residual, &weight) in blocks.iter().zip(&weights) {
                stacked.rows_mut(row, residual.len()).copy_from(&(residual * weight));
                row += residual.len();
            }
            stacked
        };

        let coordinates = self.tangent_coordinates();
        let mut jacobian = DMatrix::zeros(num_rows, coordinates.len());
        for (col, &coordinate) in coordinates.iter().enumerate() {
            let h = self.step_size(values, coordinate);
            let mut forward = values.clone();
            self.retract(&mut forward, coordinate, h);
            let mut backward = values.clone();
            self.retract(&mut backward, coordinate, -h);
            let derivative = (weighted(&self.residuals(&forward)?) - weighted(&self.residuals(&backward)?)) / (2.0 * h);
            jacobian.set_column(col, &derivative);
        }

        Some(Linearization {
            jacobian,
            residuals: weighted(&residuals),
            cost,
        })
    }

    /// Solves the problem with Levenberg-Marquardt inside a dedicated worker pool.
    ///
    /// Without residual blocks the initial values are returned with a converged
    /// summary. The solver is skipped as well when the initial gradient already
    /// meets the tolerance.
    pub fn solve(
        &self,
        initial: &HashMap<String, DVector<f64>>,
        options: &SolverOptions,
    ) -> (HashMap<String, DVector<f64>>, SolverSummary) {
        let mut summary = SolverSummary {
            num_residual_blocks: self.num_residual_blocks(),
            num_parameters: self.num_parameters(),
            num_effective_parameters: self.tangent_coordinates().len(),
            initial_cost: 0.0,
            final_cost: 0.0,
            gradient_max_norm: 0.0,
            termination: TerminationType::Converged,
        };
        if self.residual_blocks.is_empty() {
            return (initial.clone(), summary);
        }

        let Some(initial_linearization) = self.linearize(initial) else {
            summary.termination = TerminationType::Failure;
            return (initial.clone(), summary);
        };
        summary.initial_cost = initial_linearization.cost;
        summary.final_cost = initial_linearization.cost;
        summary.gradient_max_norm = initial_linearization.gradient_max_norm();
        if summary.gradient_max_norm <= options.gradient_tolerance {
            return (initial.clone(), summary);
        }

        let pool = match ThreadPoolBuilder::new().num_threads(options.num_threads).build() {
            Ok(pool) => pool,
            Err(err) => {
                warn!("Failed to build solver thread pool: {err}");
                summary.termination = TerminationType::Failure;
                return (initial.clone(), summary);
            }
        };
        let optimizer_options = OptimizerOptions {
            max_iteration: options.max_num_iterations,
            linear_solver_type: LinearSolverType::SparseCholesky,
            verbosity_level: 0,
            min_abs_error_decrease_threshold: 1e-12,
            min_rel_error_decrease_threshold: 1e-10,
            min_error_threshold: 1e-14,
            ..Default::default()
        };
        let problem = &self.problem;
        let solution = pool.install(|| {
            LevenbergMarquardtOptimizer::default().optimize(problem, initial, Some(optimizer_options))
        });

        let Some(solution) = solution.filter(|values| values.values().all(|v| v.iter().all(|x| x.is_finite())))
        else {
            summary.termination = TerminationType::Failure;
            return (initial.clone(), summary);
        };
        let Some(final_linearization) = self.linearize(&solution) else {
            summary.termination = TerminationType::Failure;
            return (solution, summary);
        };
        summary.final_cost = final_linearization.cost;
        summary.gradient_max_norm = final_linearization.gradient_max_norm();
        summary.termination = if summary.gradient_max_norm <= options.gradient_tolerance {
            TerminationType::Converged
        } else {
            TerminationType::NoConvergence
        };
        (solution, summary)
    }

    /// Covariance of the given blocks in tangent coordinates, from the inverse
    /// of the Gauss-Newton Hessian `JᵀJ` over all free coordinates.
    ///
    /// Rows follow the order of `blocks`. Returns `None` when `JᵀJ` is not
    /// positive definite or a block has no free coordinate.
    pub fn covariance(
        &self,
        values: &HashMap<String, DVector<f64>>,
        blocks: &[&ParameterBlock],
    ) -> Option<DMatrix<f64>> {
        let linearization = self.linearize(values)?;
        let hessian = linearization.jacobian.transpose() * &linearization.jacobian;
        let inverse = hessian.cholesky()?.inverse();

        let coordinates = self.tangent_coordinates();
        let mut selected = Vec::new();
        for block in blocks {
            let variable_idx = self.variables.iter().position(|v| v.block.name == block.name)?;
            let before = selected.len();
            selected.extend(
                coordinates
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.variable == variable_idx)
                    .map(|(idx, _)| idx),
            );
            if selected.len() == before {
                return None;
            }
        }

        Some(DMatrix::from_fn(selected.len(), selected.len(), |row, col| {
            inverse[(selected[row], selected[col])]
        }))
    }
}
