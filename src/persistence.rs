//! Model serialization and deserialization
//!
//! Trained models persist as JSON: the kernel specification, the bias, and
//! the support vectors with their signed coefficients. A loaded model
//! reproduces the saved model's predictions exactly.

use crate::api::TrainedModel;
use crate::core::{Result, SVMError, SVMModel, Sample, SparseVector};
use crate::kernel::{Kernel, KernelSpec, LinearKernel, RBFKernel};
use crate::optimizer::TrainedSVM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Serializable form of a trained model
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Kernel kind and parameters
    pub kernel: KernelSpec,
    /// Bias term
    pub bias: f64,
    /// Support vectors
    pub support_vectors: Vec<SerializableSample>,
    /// Signed coefficient per support vector
    pub coefficients: Vec<f64>,
    /// Provenance metadata
    pub metadata: ModelMetadata,
}

/// Serializable sparse sample
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableSample {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    pub label: f64,
}

/// Metadata recorded at save time
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub library_version: String,
    pub n_support_vectors: usize,
    pub training_params: TrainingParams,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Training parameters recorded for reference
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingParams {
    pub c: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl SerializableModel {
    /// Capture a trained model for persistence
    pub fn from_trained_model<K: Kernel>(
        model: &TrainedSVM<K>,
        params: TrainingParams,
    ) -> Self {
        let support_vectors = model
            .support_vectors()
            .iter()
            .map(|sample| SerializableSample {
                indices: sample.features.indices.clone(),
                values: sample.features.values.clone(),
                label: sample.label,
            })
            .collect();

        Self {
            kernel: model.kernel().spec(),
            bias: model.bias(),
            support_vectors,
            coefficients: model.coefficients().to_vec(),
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                n_support_vectors: model.coefficients().len(),
                training_params: params,
                created_at: chrono::Utc::now(),
            },
        }
    }

    /// Save the model as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a model from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| SVMError::SerializationError(e.to_string()))
    }

    /// Print a human-readable summary to stdout
    pub fn print_summary(&self) {
        println!("Model Summary:");
        match self.kernel {
            KernelSpec::Linear => println!("  Kernel: linear"),
            KernelSpec::Gaussian { gamma } => println!("  Kernel: gaussian (gamma = {})", gamma),
        }
        println!("  Support vectors: {}", self.metadata.n_support_vectors);
        println!("  Bias: {:.6}", self.bias);
        println!("  Library version: {}", self.metadata.library_version);
        println!("  Created: {}", self.metadata.created_at.to_rfc3339());
        println!(
            "  Training: C={}, tolerance={}, max_iterations={}",
            self.metadata.training_params.c,
            self.metadata.training_params.tolerance,
            self.metadata.training_params.max_iterations
        );
    }

    /// Rebuild a predictor from the persisted parts
    pub fn to_trained_model(&self) -> Result<LoadedModel> {
        if self.coefficients.len() != self.support_vectors.len() {
            return Err(SVMError::SerializationError(format!(
                "coefficient count {} does not match support vector count {}",
                self.coefficients.len(),
                self.support_vectors.len()
            )));
        }

        let support_vectors: Vec<Sample> = self
            .support_vectors
            .iter()
            .map(|sv| {
                Sample::new(
                    SparseVector::new(sv.indices.clone(), sv.values.clone()),
                    sv.label,
                )
            })
            .collect();

        let model = match self.kernel {
            KernelSpec::Linear => LoadedModel::Linear(
                TrainedSVM::from_parts(
                    Arc::new(LinearKernel::new()),
                    support_vectors,
                    self.coefficients.clone(),
                    self.bias,
                )
                .into(),
            ),
            KernelSpec::Gaussian { gamma } => {
                if gamma <= 0.0 {
                    return Err(SVMError::SerializationError(format!(
                        "gamma must be positive, got {}",
                        gamma
                    )));
                }
                LoadedModel::Gaussian(
                    TrainedSVM::from_parts(
                        Arc::new(RBFKernel::new(gamma)),
                        support_vectors,
                        self.coefficients.clone(),
                        self.bias,
                    )
                    .into(),
                )
            }
        };

        Ok(model)
    }
}

/// A model restored from disk, dispatching on the saved kernel kind
pub enum LoadedModel {
    Linear(TrainedModel<LinearKernel>),
    Gaussian(TrainedModel<RBFKernel>),
}

impl LoadedModel {
    /// Predict a single sample
    pub fn predict(&self, sample: &Sample) -> crate::core::Prediction {
        match self {
            LoadedModel::Linear(model) => model.predict(sample),
            LoadedModel::Gaussian(model) => model.predict(sample),
        }
    }

    /// Predict multiple samples in parallel
    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<crate::core::Prediction> {
        match self {
            LoadedModel::Linear(model) => model.predict_batch(samples),
            LoadedModel::Gaussian(model) => model.predict_batch(samples),
        }
    }

    /// Fraction of correctly labeled samples
    pub fn evaluate(&self, samples: &[Sample]) -> f64 {
        match self {
            LoadedModel::Linear(model) => model.evaluate(samples),
            LoadedModel::Gaussian(model) => model.evaluate(samples),
        }
    }

    /// Number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        match self {
            LoadedModel::Linear(model) => model.info().n_support_vectors,
            LoadedModel::Gaussian(model) => model.info().n_support_vectors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SVM;
    use tempfile::NamedTempFile;

    fn training_samples() -> Vec<Sample> {
        vec![
            Sample::new(SparseVector::from_dense(&[2.0, 1.5]), 1.0),
            Sample::new(SparseVector::from_dense(&[1.8, 2.1]), 1.0),
            Sample::new(SparseVector::from_dense(&[2.4, 1.9]), 1.0),
            Sample::new(SparseVector::from_dense(&[-2.0, -1.5]), -1.0),
            Sample::new(SparseVector::from_dense(&[-1.8, -2.1]), -1.0),
            Sample::new(SparseVector::from_dense(&[-2.4, -1.9]), -1.0),
        ]
    }

    fn default_params() -> TrainingParams {
        TrainingParams {
            c: 10.0,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }

    #[test]
    fn test_round_trip_reproduces_predictions() {
        let samples = training_samples();
        let model = SVM::new()
            .with_kernel(RBFKernel::new(0.5))
            .with_c(10.0)
            .train_samples(&samples)
            .unwrap();

        let serializable = SerializableModel::from_trained_model(model.inner(), default_params());
        let file = NamedTempFile::new().unwrap();
        serializable.save(file.path()).unwrap();

        let loaded = SerializableModel::load(file.path()).unwrap();
        let restored = loaded.to_trained_model().unwrap();

        for sample in &samples {
            let original = model.predict(sample);
            let reloaded = restored.predict(sample);
            assert_eq!(original.label, reloaded.label);
            assert!((original.decision_value - reloaded.decision_value).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_kernel_round_trip() {
        let samples = training_samples();
        let model = SVM::new()
            .with_kernel(LinearKernel::new())
            .with_c(100.0)
            .train_samples(&samples)
            .unwrap();

        let serializable = SerializableModel::from_trained_model(model.inner(), default_params());
        let file = NamedTempFile::new().unwrap();
        serializable.save(file.path()).unwrap();

        let restored = SerializableModel::load(file.path())
            .unwrap()
            .to_trained_model()
            .unwrap();
        assert!(matches!(restored, LoadedModel::Linear(_)));

        for sample in &samples {
            assert_eq!(model.predict(sample).label, restored.predict(sample).label);
        }
    }

    #[test]
    fn test_metadata_recorded() {
        let samples = training_samples();
        let model = SVM::new()
            .with_kernel(RBFKernel::new(0.5))
            .train_samples(&samples)
            .unwrap();

        let serializable = SerializableModel::from_trained_model(model.inner(), default_params());
        assert_eq!(serializable.metadata.library_version, crate::VERSION);
        assert_eq!(
            serializable.metadata.n_support_vectors,
            serializable.coefficients.len()
        );
        assert_eq!(serializable.metadata.training_params.c, 10.0);
    }

    #[test]
    fn test_mismatched_coefficients_rejected() {
        let samples = training_samples();
        let model = SVM::new().train_samples(&samples).unwrap();
        let mut serializable =
            SerializableModel::from_trained_model(model.inner(), default_params());
        serializable.coefficients.pop();

        assert!(matches!(
            serializable.to_trained_model(),
            Err(SVMError::SerializationError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            SerializableModel::load("/nonexistent/model.json"),
            Err(SVMError::IoError(_))
        ));
    }

    #[test]
    fn test_invalid_gamma_rejected_on_load() {
        let json = r#"{
            "kernel": {"kind": "gaussian", "gamma": -1.0},
            "bias": 0.0,
            "support_vectors": [],
            "coefficients": [],
            "metadata": {
                "library_version": "0.1.0",
                "n_support_vectors": 0,
                "training_params": {"c": 1.0, "tolerance": 1e-6, "max_iterations": 100},
                "created_at": "2026-01-01T00:00:00Z"
            }
        }"#;
        let model: SerializableModel = serde_json::from_str(json).unwrap();
        assert!(matches!(
            model.to_trained_model(),
            Err(SVMError::SerializationError(_))
        ));
    }
}
