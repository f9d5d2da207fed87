//! IRWLS core loop
//!
//! Trains the hinge-loss SVM over a fixed basis by repeatedly linearizing the
//! loss into a weighted least-squares subproblem: reweight from the newest
//! decision values, assemble the weighted regularized normal equations, solve,
//! and check the relative change of the iterate. Kernel evaluation and the
//! assembly reduction run on the rayon pool; the phases themselves are
//! strictly sequential.
//!
//! The reweighting follows the Perez-Cruz majorization of the L1 hinge: a
//! point with margin beyond 1 gets weight 0, a margin violator gets weight
//! C / max(residual, floor), so the weighted solve descends the surrogate
//! objective lambda*||alpha||^2 + C * sum(max(0, 1 - y*f)).

use crate::core::{IrwlsResult, Result, SVMError, Sample, TrainConfig};
use crate::kernel::{Kernel, KernelEvaluator};
use crate::parallel::assemble_weighted_system;
use crate::solver::linear_system::{CholeskySolver, LinearSystemSolver};
use log::debug;

/// Residual floor preventing zero-weight singularities; weights cap at C/FLOOR
const RESIDUAL_FLOOR: f64 = 1e-4;

/// Ridge scale for the single retry after a singular solve
const RIDGE_SCALE: f64 = 1e-8;

/// IRWLS solver bound to a sample set
///
/// One instance serves many solves over different bases (the budgeted
/// selector re-solves after every basis change), reusing the precomputed
/// kernel norms.
pub struct IrwlsSolver<'a, K: Kernel> {
    samples: &'a [Sample],
    labels: Vec<f64>,
    evaluator: KernelEvaluator<'a, K>,
    config: TrainConfig,
    linear: CholeskySolver,
}

impl<'a, K: Kernel> IrwlsSolver<'a, K> {
    /// Create a solver over the given samples
    pub fn new(samples: &'a [Sample], kernel: &'a K, config: TrainConfig) -> Self {
        let labels = samples.iter().map(|s| s.label).collect();
        Self {
            samples,
            labels,
            evaluator: KernelEvaluator::new(samples, kernel),
            config,
            linear: CholeskySolver::new(),
        }
    }

    /// Label of training point `i`
    pub(crate) fn label(&self, i: usize) -> f64 {
        self.labels[i]
    }

    /// Decision values f(x_i) for every training point, given the basis and
    /// the current (alpha, bias)
    pub(crate) fn decision_values(
        &self,
        basis: &[usize],
        alpha: &[f64],
        bias: f64,
    ) -> Result<Vec<f64>> {
        let n = self.samples.len();
        let all: Vec<usize> = (0..n).collect();
        let k = self.evaluator.block(&all, basis)?;

        let m = basis.len();
        Ok((0..n)
            .map(|i| {
                let row = &k[i * m..(i + 1) * m];
                row.iter().zip(alpha.iter()).map(|(&kv, &a)| kv * a).sum::<f64>() + bias
            })
            .collect())
    }

    /// Surrogate objective: lambda*||alpha||^2 + C * sum of hinge residuals
    pub(crate) fn objective(&self, alpha: &[f64], decisions: &[f64]) -> f64 {
        let lambda = 1.0 / self.config.c;
        let reg: f64 = alpha.iter().map(|&a| a * a).sum::<f64>() * lambda;
        let loss: f64 = self
            .labels
            .iter()
            .zip(decisions.iter())
            .map(|(&y, &f)| (1.0 - y * f).max(0.0))
            .sum();
        reg + self.config.c * loss
    }

    /// Run the IRWLS loop restricted to the given basis
    ///
    /// Returns the best iterate found; `converged` is false when the
    /// iteration cap was reached first. A system that stays singular after
    /// the ridge retry is fatal.
    pub fn solve(&self, basis: &[usize]) -> Result<IrwlsResult> {
        if basis.is_empty() {
            return Err(SVMError::InvalidParameter(
                "basis must not be empty".to_string(),
            ));
        }
        for &i in basis {
            if i >= self.samples.len() {
                return Err(SVMError::IndexOutOfBounds {
                    index: i,
                    len: self.samples.len(),
                });
            }
        }

        let n = self.samples.len();
        let m = basis.len();
        let lambda = 1.0 / self.config.c;

        let mut alpha = vec![0.0; m];
        let mut bias = 0.0;
        let mut decisions = vec![0.0; n];

        let mut best_alpha = alpha.clone();
        let mut best_bias = bias;
        let mut best_objective = self.objective(&alpha, &decisions);

        let mut objective_trace = Vec::new();
        let mut converged = false;
        let mut iterations = 0;

        for iter in 1..=self.config.max_iterations {
            iterations = iter;

            // Reweight: weights derive strictly from the newest decisions
            let weights: Vec<f64> = self
                .labels
                .iter()
                .zip(decisions.iter())
                .map(|(&y, &f)| {
                    let residual = 1.0 - y * f;
                    if residual <= 0.0 {
                        0.0
                    } else {
                        self.config.c / residual.max(RESIDUAL_FLOOR)
                    }
                })
                .collect();

            let active: Vec<usize> = (0..n).filter(|&i| weights[i] > 0.0).collect();
            if active.is_empty() {
                // No margin violators left
                converged = true;
                break;
            }

            // Assemble: design matrix [K(active, basis) | 1], one row per
            // active point, reduced into the normal equations in parallel
            let k_ab = self.evaluator.block(&active, basis)?;
            let cols = m + 1;
            let mut phi = vec![0.0; active.len() * cols];
            for (r, chunk) in phi.chunks_mut(cols).enumerate() {
                chunk[..m].copy_from_slice(&k_ab[r * m..(r + 1) * m]);
                chunk[m] = 1.0;
            }
            let w_act: Vec<f64> = active.iter().map(|&i| weights[i]).collect();
            let y_act: Vec<f64> = active.iter().map(|&i| self.labels[i]).collect();

            let (mut a, b) = assemble_weighted_system(&phi, cols, &w_act, &y_act);
            for d in 0..m {
                a[(d, d)] += lambda;
            }

            // Solve, with a single ridge retry on singularity
            let theta = match self.linear.solve(a.clone(), b.clone(), iter) {
                Ok(theta) => theta,
                Err(SVMError::SingularSystem { .. }) => {
                    let ridge = RIDGE_SCALE * a.trace() / cols as f64;
                    debug!("singular system at iteration {iter}, retrying with ridge {ridge:e}");
                    for d in 0..cols {
                        a[(d, d)] += ridge;
                    }
                    self.linear.solve(a, b, iter)?
                }
                Err(e) => return Err(e),
            };

            let new_alpha: Vec<f64> = theta.iter().take(m).copied().collect();
            let new_bias = theta[m];

            // Relative change of the full iterate (alpha and bias)
            let delta: f64 = new_alpha
                .iter()
                .zip(alpha.iter())
                .map(|(&a1, &a0)| (a1 - a0) * (a1 - a0))
                .sum::<f64>()
                + (new_bias - bias) * (new_bias - bias);
            let norm: f64 =
                alpha.iter().map(|&a| a * a).sum::<f64>() + bias * bias;

            alpha = new_alpha;
            bias = new_bias;
            decisions = self.decision_values(basis, &alpha, bias)?;

            let objective = self.objective(&alpha, &decisions);
            objective_trace.push(objective);
            debug!(
                "irwls iteration {iter}: objective {objective:.6}, relative change {:.3e}",
                delta / norm.max(f64::MIN_POSITIVE)
            );

            if objective < best_objective {
                best_objective = objective;
                best_alpha.clone_from(&alpha);
                best_bias = bias;
            }

            if delta < self.config.tolerance * norm.max(f64::MIN_POSITIVE) && iter > 1 {
                converged = true;
                break;
            }
        }

        Ok(IrwlsResult {
            alpha: best_alpha,
            bias: best_bias,
            iterations,
            converged,
            objective: best_objective,
            objective_trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use crate::kernel::RBFKernel;

    fn separable_samples() -> Vec<Sample> {
        vec![
            Sample::new(SparseVector::from_dense(&[2.0, 2.1]), 1.0),
            Sample::new(SparseVector::from_dense(&[1.8, 2.3]), 1.0),
            Sample::new(SparseVector::from_dense(&[2.4, 1.9]), 1.0),
            Sample::new(SparseVector::from_dense(&[2.1, 1.7]), 1.0),
            Sample::new(SparseVector::from_dense(&[-2.0, -2.2]), -1.0),
            Sample::new(SparseVector::from_dense(&[-1.7, -1.9]), -1.0),
            Sample::new(SparseVector::from_dense(&[-2.3, -2.0]), -1.0),
            Sample::new(SparseVector::from_dense(&[-1.9, -2.4]), -1.0),
        ]
    }

    #[test]
    fn test_full_basis_separates_training_points() {
        let samples = separable_samples();
        let kernel = RBFKernel::new(0.5);
        let config = TrainConfig {
            c: 10.0,
            ..TrainConfig::default()
        };
        let solver = IrwlsSolver::new(&samples, &kernel, config);

        let basis: Vec<usize> = (0..samples.len()).collect();
        let result = solver.solve(&basis).unwrap();

        assert!(result.converged);
        let decisions = solver
            .decision_values(&basis, &result.alpha, result.bias)
            .unwrap();
        for (sample, &f) in samples.iter().zip(decisions.iter()) {
            assert_eq!(sample.label, f.signum(), "decision {f} for {sample:?}");
        }
    }

    #[test]
    fn test_objective_is_non_increasing() {
        let samples = separable_samples();
        let kernel = RBFKernel::new(0.5);
        let solver = IrwlsSolver::new(&samples, &kernel, TrainConfig::default());

        let basis: Vec<usize> = (0..samples.len()).collect();
        let result = solver.solve(&basis).unwrap();

        assert!(!result.objective_trace.is_empty());
        let slack = 1e-6 * result.objective_trace[0].abs().max(1.0);
        for pair in result.objective_trace.windows(2) {
            assert!(
                pair[1] <= pair[0] + slack,
                "objective increased: {} -> {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_restricted_basis() {
        let samples = separable_samples();
        let kernel = RBFKernel::new(0.5);
        let config = TrainConfig {
            c: 10.0,
            ..TrainConfig::default()
        };
        let solver = IrwlsSolver::new(&samples, &kernel, config);

        // One basis point per class is enough here
        let basis = vec![0, 4];
        let result = solver.solve(&basis).unwrap();
        assert_eq!(result.alpha.len(), 2);

        let decisions = solver
            .decision_values(&basis, &result.alpha, result.bias)
            .unwrap();
        for (sample, &f) in samples.iter().zip(decisions.iter()) {
            assert_eq!(sample.label, f.signum());
        }
    }

    #[test]
    fn test_empty_basis_rejected() {
        let samples = separable_samples();
        let kernel = RBFKernel::new(0.5);
        let solver = IrwlsSolver::new(&samples, &kernel, TrainConfig::default());

        assert!(matches!(
            solver.solve(&[]),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_basis_index_out_of_bounds() {
        let samples = separable_samples();
        let kernel = RBFKernel::new(0.5);
        let solver = IrwlsSolver::new(&samples, &kernel, TrainConfig::default());

        assert!(matches!(
            solver.solve(&[0, 99]),
            Err(SVMError::IndexOutOfBounds { index: 99, .. })
        ));
    }

    #[test]
    fn test_iteration_cap_returns_best_iterate() {
        let samples = separable_samples();
        let kernel = RBFKernel::new(0.5);
        let config = TrainConfig {
            max_iterations: 1,
            tolerance: 0.0,
            ..TrainConfig::default()
        };
        let solver = IrwlsSolver::new(&samples, &kernel, config);

        let basis: Vec<usize> = (0..samples.len()).collect();
        let result = solver.solve(&basis).unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.alpha.len(), samples.len());
    }
}
