//! Shared-memory parallel execution layer
//!
//! Work partitioning and reduction used by kernel-block evaluation and by the
//! normal-equation assembly step. Assembly follows a reduction discipline:
//! each worker folds its partition of rows into a private partial accumulator
//! and partials are merged pairwise before the sequential solve phase, so no
//! shared accumulator is ever locked.

use crate::core::{Result, SVMError};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// Run a closure inside a rayon pool with the requested number of threads
///
/// A thread count of 0 runs in the global (default-sized) pool, mirroring
/// the behavior of leaving the thread option unset.
pub fn run_in_pool<F, R>(threads: usize, f: F) -> Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    if threads == 0 {
        return Ok(f());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SVMError::InvalidParameter(format!("thread pool: {e}")))?;
    Ok(pool.install(f))
}

/// Per-worker partial accumulator for the weighted normal equations
struct PartialSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
}

impl PartialSystem {
    fn zeros(m: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(m, m),
            rhs: DVector::zeros(m),
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.matrix += other.matrix;
        self.rhs += other.rhs;
        self
    }
}

/// Accumulate the weighted normal equations A = Φᵀ W Φ, b = Φᵀ W y
///
/// `phi` holds the design matrix row-major with `m` columns; `weights` and
/// `targets` have one entry per row. Rows are folded into per-worker partial
/// sums and reduced; the returned pair is ready for the solve phase.
pub fn assemble_weighted_system(
    phi: &[f64],
    m: usize,
    weights: &[f64],
    targets: &[f64],
) -> (DMatrix<f64>, DVector<f64>) {
    debug_assert_eq!(phi.len(), weights.len() * m);
    debug_assert_eq!(weights.len(), targets.len());

    let partial = phi
        .par_chunks(m.max(1))
        .zip(weights.par_iter().zip(targets.par_iter()))
        .fold(
            || PartialSystem::zeros(m),
            |mut acc, (row, (&w, &y))| {
                if w != 0.0 {
                    for (a, &ra) in row.iter().enumerate() {
                        let wra = w * ra;
                        acc.rhs[a] += wra * y;
                        // Upper triangle only; mirrored after the reduction
                        for (b, &rb) in row.iter().enumerate().skip(a) {
                            acc.matrix[(a, b)] += wra * rb;
                        }
                    }
                }
                acc
            },
        )
        .reduce(|| PartialSystem::zeros(m), PartialSystem::merge);

    let mut matrix = partial.matrix;
    for a in 1..m {
        for b in 0..a {
            matrix[(a, b)] = matrix[(b, a)];
        }
    }
    (matrix, partial.rhs)
}
