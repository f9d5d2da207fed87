//! Linear kernel implementation

use crate::core::SparseVector;
use crate::kernel::{Kernel, KernelSpec};

/// Linear kernel: K(x, y) = x^T * y
///
/// The simplest kernel function, computing the dot product between two
/// vectors. For sparse vectors this is a merge over the sorted index lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        dot_product_sparse(x, y)
    }

    fn spec(&self) -> KernelSpec {
        KernelSpec::Linear
    }
}

/// Compute dot product between two sparse vectors
///
/// Both vectors have sorted indices, so a merge-like scan computes the
/// product in O(nnz(x) + nnz(y)) time.
pub(crate) fn dot_product_sparse(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut result = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            result += x.values[i] * y.values[j];
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}
