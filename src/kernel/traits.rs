//! Kernel trait definition

use crate::core::SparseVector;
use serde::{Deserialize, Serialize};

/// Kernel kind plus its scalar parameters
///
/// Immutable once a training run starts; persisted with the model so that
/// training and inference are guaranteed identical kernel semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KernelSpec {
    Linear,
    Gaussian { gamma: f64 },
}

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid
/// for SVM training.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Compute kernel value using precomputed squared norms
    ///
    /// More efficient for distance-based kernels (e.g. Gaussian), where
    /// the squared distance expands to ||x||^2 + ||y||^2 - 2 x.y.
    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }

    /// Kind and parameters of this kernel, for model persistence
    fn spec(&self) -> KernelSpec;
}
