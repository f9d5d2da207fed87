//! Training facade and trained-model predictor
//!
//! Integrates the kernel evaluator, the IRWLS core loop, and the budgeted
//! selector into the training entry points, and holds the trained artifact.

use crate::core::{
    BudgetConfig, Dataset, IrwlsResult, Prediction, Result, SVMError, SVMModel, Sample,
    TrainConfig,
};
use crate::kernel::Kernel;
use crate::parallel::run_in_pool;
use crate::solver::{BudgetedSolver, IrwlsSolver};
use log::{info, warn};
use rayon::prelude::*;
use std::sync::Arc;

/// Coefficients at or below this magnitude do not make a support vector
const ALPHA_CUTOFF: f64 = 1e-12;

/// IRWLS trainer for full and budgeted modes
pub struct IrwlsOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: TrainConfig,
    budget: Option<BudgetConfig>,
}

impl<K: Kernel> IrwlsOptimizer<K> {
    /// Create a trainer with the given kernel and configuration
    pub fn new(kernel: K, config: TrainConfig) -> Self {
        Self {
            kernel: Arc::new(kernel),
            config,
            budget: None,
        }
    }

    /// Create a trainer with default configuration
    pub fn with_kernel(kernel: K) -> Self {
        Self::new(kernel, TrainConfig::default())
    }

    /// Enable budgeted (semiparametric) training
    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Get the trainer configuration
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train on a dataset
    pub fn train<D: Dataset>(&self, dataset: &D) -> Result<TrainedSVM<K>> {
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.train_samples(&samples)
    }

    /// Train on a slice of samples
    ///
    /// The whole call runs inside a worker pool sized from the configuration;
    /// kernel evaluation and system assembly parallelize within it.
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedSVM<K>> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if self.config.c <= 0.0 {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive, got {}",
                self.config.c
            )));
        }
        if self.config.tolerance <= 0.0 {
            return Err(SVMError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.config.tolerance
            )));
        }
        for sample in samples {
            if sample.label != 1.0 && sample.label != -1.0 {
                return Err(SVMError::InvalidLabel(sample.label));
            }
        }

        let kernel = Arc::clone(&self.kernel);
        let config = self.config.clone();
        let budget = self.budget.clone();

        run_in_pool(self.config.threads, move || {
            let (basis, result) = match budget {
                Some(budget) => {
                    let solver = BudgetedSolver::new(samples, &*kernel, config, budget)?;
                    let outcome = solver.solve()?;
                    (outcome.basis, outcome.result)
                }
                None => {
                    let solver = IrwlsSolver::new(samples, &*kernel, config);
                    let basis: Vec<usize> = (0..samples.len()).collect();
                    let result = solver.solve(&basis)?;
                    (basis, result)
                }
            };

            if result.converged {
                info!(
                    "training converged in {} iterations, objective {:.6}",
                    result.iterations, result.objective
                );
            } else {
                warn!(
                    "training did not converge within {} iterations; returning best iterate",
                    result.iterations
                );
            }

            Ok(TrainedSVM::new(kernel, samples, &basis, result))
        })?
    }
}

/// A trained SVM model that can make predictions
///
/// Holds copies of the selected support-vector samples, so the training
/// dataset can be released independently of the model.
pub struct TrainedSVM<K: Kernel> {
    kernel: Arc<K>,
    support_vectors: Vec<Sample>,
    coefficients: Vec<f64>,
    bias: f64,
    support_indices: Vec<usize>,
    converged: bool,
    iterations: usize,
}

impl<K: Kernel> TrainedSVM<K> {
    /// Build the model from a basis and the IRWLS iterate over it
    fn new(kernel: Arc<K>, samples: &[Sample], basis: &[usize], result: IrwlsResult) -> Self {
        let mut support_vectors = Vec::new();
        let mut coefficients = Vec::new();
        let mut support_indices = Vec::new();

        for (&idx, &alpha) in basis.iter().zip(result.alpha.iter()) {
            if alpha.abs() > ALPHA_CUTOFF {
                support_vectors.push(samples[idx].clone());
                coefficients.push(alpha);
                support_indices.push(idx);
            }
        }

        Self {
            kernel,
            support_vectors,
            coefficients,
            bias: result.bias,
            support_indices,
            converged: result.converged,
            iterations: result.iterations,
        }
    }

    /// Reassemble a model from persisted parts
    pub(crate) fn from_parts(
        kernel: Arc<K>,
        support_vectors: Vec<Sample>,
        coefficients: Vec<f64>,
        bias: f64,
    ) -> Self {
        let support_indices = (0..support_vectors.len()).collect();
        Self {
            kernel,
            support_vectors,
            coefficients,
            bias,
            support_indices,
            converged: true,
            iterations: 0,
        }
    }

    /// Decision function value for a sample
    pub fn decision_function(&self, sample: &Sample) -> f64 {
        let mut result = 0.0;
        for (sv, &coeff) in self.support_vectors.iter().zip(self.coefficients.iter()) {
            result += coeff * self.kernel.compute(&sample.features, &sv.features);
        }
        result + self.bias
    }

    /// Get the support vectors
    pub fn support_vectors(&self) -> &[Sample] {
        &self.support_vectors
    }

    /// Get the signed coefficient per support vector
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Get the indices of support vectors in the original training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }

    /// Whether training met the tolerance before the iteration cap
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// IRWLS iterations of the final solve
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Get the kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: Kernel> SVMModel for TrainedSVM<K> {
    fn predict(&self, sample: &Sample) -> Prediction {
        let decision_value = self.decision_function(sample);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        samples.par_iter().map(|s| self.predict(s)).collect()
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
