//! Core type definitions for the IRWLS SVM

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a dense feature vector as a sparse one (all indices populated)
    pub fn from_dense(values: &[f64]) -> Self {
        Self {
            indices: (0..values.len()).collect(),
            values: values.to_vec(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Training sample with features and label
#[derive(Clone, Debug)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1 for binary classification)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }
}

/// Result of an IRWLS training run over a fixed basis
#[derive(Debug, Clone)]
pub struct IrwlsResult {
    /// Signed coefficient per basis element
    pub alpha: Vec<f64>,
    /// Bias term
    pub bias: f64,
    /// Number of IRWLS iterations performed
    pub iterations: usize,
    /// Whether the relative change fell below tolerance before the cap
    pub converged: bool,
    /// Surrogate objective at the returned iterate
    pub objective: f64,
    /// Surrogate objective recorded after each iteration
    pub objective_trace: Vec<f64>,
}

/// Configuration shared by the full and budgeted IRWLS trainers
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// SVM box constant C (regularization is lambda = 1/C)
    pub c: f64,
    /// Relative-change tolerance for convergence
    pub tolerance: f64,
    /// Cap on IRWLS iterations per solve
    pub max_iterations: usize,
    /// Worker threads for kernel evaluation and assembly (0 = rayon default)
    pub threads: usize,
    /// Seed for candidate sampling and basis initialization
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-6,
            max_iterations: 100,
            threads: 0,
            seed: 0,
        }
    }
}

/// Extra configuration for budgeted (semiparametric) training
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    /// Maximum basis size B
    pub budget: usize,
    /// Candidate indices sampled per selection round
    pub candidates_per_round: usize,
    /// Selection stops after this many rounds without objective improvement
    pub patience: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            budget: 500,
            candidates_per_round: 10,
            patience: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let indices = vec![2, 0, 4];
        let values = vec![2.0, 1.0, 3.0];
        let sv = SparseVector::new(indices, values);

        // Check that indices are sorted
        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sparse_vector_get() {
        let sv = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);

        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(1), 1.0);
        assert_eq!(sv.get(3), 2.0);
        assert_eq!(sv.get(5), 3.0);
        assert_eq!(sv.get(6), 0.0);
    }

    #[test]
    fn test_sparse_vector_from_dense() {
        let sv = SparseVector::from_dense(&[2.0, 0.0, 1.0]);
        assert_eq!(sv.indices, vec![0, 1, 2]);
        assert_eq!(sv.get(1), 0.0);
        assert_eq!(sv.get(2), 1.0);
    }

    #[test]
    fn test_sparse_vector_norm() {
        let sv = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_eq!(sv.norm_squared(), 25.0);
    }

    #[test]
    fn test_prediction() {
        let pred = Prediction::new(1.0, 2.5);
        assert_eq!(pred.label, 1.0);
        assert_eq!(pred.decision_value, 2.5);
        assert_eq!(pred.confidence(), 2.5);

        let neg_pred = Prediction::new(-1.0, -1.8);
        assert_eq!(neg_pred.confidence(), 1.8);
    }

    #[test]
    fn test_sample() {
        let features = SparseVector::new(vec![0, 2], vec![1.0, 3.0]);
        let sample = Sample::new(features.clone(), 1.0);
        assert_eq!(sample.label, 1.0);
        assert_eq!(sample.features, features);
    }

    #[test]
    fn test_train_config_default() {
        let config = TrainConfig::default();
        assert_eq!(config.c, 1.0);
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.threads, 0);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_budget_config_default() {
        let config = BudgetConfig::default();
        assert_eq!(config.budget, 500);
        assert_eq!(config.candidates_per_round, 10);
        assert_eq!(config.patience, 5);
    }

    #[test]
    fn test_sparse_vector_utilities() {
        let sv = SparseVector::new(vec![1, 3], vec![2.0, 4.0]);
        assert_eq!(sv.nnz(), 2);
        assert!(!sv.is_empty());

        let empty = SparseVector::empty();
        assert_eq!(empty.nnz(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }
}
