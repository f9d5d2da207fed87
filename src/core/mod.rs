//! Core types, traits, and errors

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, SVMError};
pub use traits::{Dataset, SVMModel};
pub use types::{BudgetConfig, IrwlsResult, Prediction, Sample, SparseVector, TrainConfig};
