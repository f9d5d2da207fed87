//! Support Vector Machine training by parallel Iteratively Reweighted
//! Least Squares (IRWLS)
//!
//! Based on "An IRWLS procedure for SVM" by Pérez-Cruz et al., with an
//! optional budgeted (semiparametric) mode that caps the support vector
//! count.

pub mod api;
pub mod core;
pub mod data;
pub mod kernel;
pub mod optimizer;
pub mod parallel;
pub mod persistence;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, ModelInfo, TrainedModel, SVM};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::{CsvDataset, LibSVMDataset};
pub use crate::kernel::{Kernel, KernelSpec, LinearKernel, RBFKernel};
pub use crate::optimizer::{IrwlsOptimizer, TrainedSVM};
pub use crate::persistence::{LoadedModel, SerializableModel};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
