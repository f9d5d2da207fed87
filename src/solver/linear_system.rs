//! Solve boundary for the weighted normal equations
//!
//! The IRWLS loop treats the solve as a pluggable capability: solve a
//! symmetric system, report singularity. Alternative factorizations can be
//! substituted without touching the core loop.

use crate::core::{Result, SVMError};
use nalgebra::{DMatrix, DVector};

/// Solve a symmetric linear system, reporting singularity instead of
/// returning garbage
pub trait LinearSystemSolver: Send + Sync {
    /// Solve `a * x = b` for x
    ///
    /// The `iteration` is carried into the singularity error so the caller
    /// can report where training failed.
    fn solve(&self, a: DMatrix<f64>, b: DVector<f64>, iteration: usize) -> Result<DVector<f64>>;
}

/// Cholesky factorization with a pivoted fallback
///
/// The regularized normal equations are positive definite in the usual case,
/// so an LLᵀ factorization is attempted first. If the matrix turns out
/// indefinite, a full-pivot LU handles it; if even that cannot solve, the
/// system is reported singular.
#[derive(Debug, Clone, Copy, Default)]
pub struct CholeskySolver;

impl CholeskySolver {
    /// Create a new solver
    pub fn new() -> Self {
        Self
    }
}

impl LinearSystemSolver for CholeskySolver {
    fn solve(&self, a: DMatrix<f64>, b: DVector<f64>, iteration: usize) -> Result<DVector<f64>> {
        if a.nrows() != a.ncols() || a.nrows() != b.len() {
            return Err(SVMError::DimensionMismatch {
                expected: a.nrows(),
                actual: b.len(),
            });
        }

        if let Some(chol) = a.clone().cholesky() {
            return Ok(chol.solve(&b));
        }

        let lu = a.full_piv_lu();
        lu.solve(&b)
            .ok_or(SVMError::SingularSystem { iteration })
    }
}
