//! Kernel functions and block evaluation

pub mod linear;
pub mod matrix;
pub mod rbf;
pub mod traits;

pub use linear::LinearKernel;
pub use matrix::KernelEvaluator;
pub use rbf::RBFKernel;
pub use traits::{Kernel, KernelSpec};
