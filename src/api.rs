//! High-level builder API for training and evaluation
//!
//! Wraps the optimizer and trained model behind a fluent configuration
//! surface, so common workflows stay a few lines long.

use crate::core::{BudgetConfig, Dataset, Prediction, Result, SVMModel, Sample, TrainConfig};
use crate::kernel::{Kernel, RBFKernel};
use crate::optimizer::{IrwlsOptimizer, TrainedSVM};

/// Builder for configuring and training an SVM
pub struct SVM<K: Kernel = RBFKernel> {
    kernel: K,
    config: TrainConfig,
    budget: Option<BudgetConfig>,
}

impl SVM<RBFKernel> {
    /// Create a new SVM with a default Gaussian kernel
    pub fn new() -> Self {
        Self {
            kernel: RBFKernel::default(),
            config: TrainConfig::default(),
            budget: None,
        }
    }
}

impl Default for SVM<RBFKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> SVM<K> {
    /// Use a specific kernel
    pub fn with_kernel<K2: Kernel>(self, kernel: K2) -> SVM<K2> {
        SVM {
            kernel,
            config: self.config,
            budget: self.budget,
        }
    }

    /// Set the regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the maximum number of IRWLS iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the worker thread count (0 = all available cores)
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Set the seed for budgeted candidate sampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Cap the model at `budget` support vectors (semiparametric mode)
    pub fn with_budget(mut self, budget: usize) -> Self {
        let mut cfg = self.budget.unwrap_or_default();
        cfg.budget = budget;
        self.budget = Some(cfg);
        self
    }

    /// Candidate indices examined per budgeted selection round
    pub fn with_candidates_per_round(mut self, candidates: usize) -> Self {
        let mut cfg = self.budget.unwrap_or_default();
        cfg.candidates_per_round = candidates;
        self.budget = Some(cfg);
        self
    }

    /// Train on a dataset
    pub fn train<D: Dataset>(self, dataset: &D) -> Result<TrainedModel<K>> {
        let mut optimizer = IrwlsOptimizer::new(self.kernel, self.config);
        if let Some(budget) = self.budget {
            optimizer = optimizer.with_budget(budget);
        }
        let inner = optimizer.train(dataset)?;
        Ok(TrainedModel { inner })
    }

    /// Train on a slice of samples
    pub fn train_samples(self, samples: &[Sample]) -> Result<TrainedModel<K>> {
        let mut optimizer = IrwlsOptimizer::new(self.kernel, self.config);
        if let Some(budget) = self.budget {
            optimizer = optimizer.with_budget(budget);
        }
        let inner = optimizer.train_samples(samples)?;
        Ok(TrainedModel { inner })
    }
}

/// A trained model ready for prediction and evaluation
pub struct TrainedModel<K: Kernel> {
    inner: TrainedSVM<K>,
}

impl<K: Kernel> TrainedModel<K> {
    /// Predict the label for a single sample
    pub fn predict(&self, sample: &Sample) -> Prediction {
        self.inner.predict(sample)
    }

    /// Predict labels for multiple samples in parallel
    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        self.inner.predict_batch(samples)
    }

    /// Predict labels for every sample in a dataset
    pub fn predict_dataset<D: Dataset>(&self, dataset: &D) -> Vec<Prediction> {
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.predict_batch(&samples)
    }

    /// Fraction of correctly labeled samples
    pub fn evaluate(&self, samples: &[Sample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let predictions = self.predict_batch(samples);
        let correct = predictions
            .iter()
            .zip(samples.iter())
            .filter(|(pred, sample)| pred.label == sample.label)
            .count();
        correct as f64 / samples.len() as f64
    }

    /// Detailed binary-classification metrics
    pub fn evaluate_detailed(&self, samples: &[Sample]) -> EvaluationMetrics {
        let predictions = self.predict_batch(samples);
        let mut tp = 0usize;
        let mut tn = 0usize;
        let mut fp = 0usize;
        let mut fne = 0usize;

        for (pred, sample) in predictions.iter().zip(samples.iter()) {
            match (pred.label > 0.0, sample.label > 0.0) {
                (true, true) => tp += 1,
                (false, false) => tn += 1,
                (true, false) => fp += 1,
                (false, true) => fne += 1,
            }
        }

        EvaluationMetrics {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fne,
        }
    }

    /// Summary of the trained model
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            n_support_vectors: self.inner.n_support_vectors(),
            bias: self.inner.bias(),
            converged: self.inner.converged(),
            iterations: self.inner.iterations(),
        }
    }

    /// Access the underlying model
    pub fn inner(&self) -> &TrainedSVM<K> {
        &self.inner
    }
}

impl<K: Kernel> From<TrainedSVM<K>> for TrainedModel<K> {
    fn from(inner: TrainedSVM<K>) -> Self {
        Self { inner }
    }
}

/// Confusion-matrix counts with derived metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / total as f64
    }

    pub fn precision(&self) -> f64 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    pub fn recall(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }

    pub fn specificity(&self) -> f64 {
        let denom = self.true_negatives + self.false_positives;
        if denom == 0 {
            return 0.0;
        }
        self.true_negatives as f64 / denom as f64
    }

    fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }
}

/// Key facts about a trained model
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub n_support_vectors: usize,
    pub bias: f64,
    pub converged: bool,
    pub iterations: usize,
}
