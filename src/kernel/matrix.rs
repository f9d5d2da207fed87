//! On-demand kernel matrix evaluation
//!
//! The evaluator computes arbitrary blocks K(i, j) for i in a row index set
//! and j in a column index set, without ever materializing the full N×N
//! matrix. Rows are distributed across the rayon pool; every worker writes a
//! disjoint region of the output, so no locking is needed.

use crate::core::{Result, SVMError, Sample, SparseVector};
use crate::kernel::Kernel;
use rayon::prelude::*;

/// Stateless kernel-block evaluator over a fixed set of samples
///
/// Squared norms are precomputed once so that distance-based kernels can use
/// the expansion ||x||² + ||y||² - 2x·y per entry.
pub struct KernelEvaluator<'a, K: Kernel> {
    samples: &'a [Sample],
    kernel: &'a K,
    norms_sq: Vec<f64>,
}

impl<'a, K: Kernel> KernelEvaluator<'a, K> {
    /// Create an evaluator over the given samples
    pub fn new(samples: &'a [Sample], kernel: &'a K) -> Self {
        let norms_sq = samples.iter().map(|s| s.features.norm_squared()).collect();
        Self {
            samples,
            kernel,
            norms_sq,
        }
    }

    /// Number of samples the evaluator indexes into
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the underlying sample set is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        for &i in indices {
            if i >= self.samples.len() {
                return Err(SVMError::IndexOutOfBounds {
                    index: i,
                    len: self.samples.len(),
                });
            }
        }
        Ok(())
    }

    /// Evaluate the partial block K(rows, cols), row-major
    ///
    /// Output length is rows.len() * cols.len(). Each row is computed by one
    /// worker into its own chunk of the output buffer.
    pub fn block(&self, rows: &[usize], cols: &[usize]) -> Result<Vec<f64>> {
        self.check_indices(rows)?;
        self.check_indices(cols)?;

        let mut out = vec![0.0; rows.len() * cols.len()];
        out.par_chunks_mut(cols.len().max(1))
            .zip(rows.par_iter())
            .for_each(|(chunk, &i)| {
                let xi = &self.samples[i].features;
                let ni = self.norms_sq[i];
                for (slot, &j) in chunk.iter_mut().zip(cols.iter()) {
                    *slot = self.kernel.compute_with_norms(
                        xi,
                        &self.samples[j].features,
                        ni,
                        self.norms_sq[j],
                    );
                }
            });
        Ok(out)
    }

    /// Evaluate the symmetric block K(indices, indices), row-major
    ///
    /// Only the upper triangle is computed in parallel; the lower triangle is
    /// mirrored afterwards.
    pub fn symmetric_block(&self, indices: &[usize]) -> Result<Vec<f64>> {
        self.check_indices(indices)?;

        let m = indices.len();
        let mut out = vec![0.0; m * m];
        out.par_chunks_mut(m.max(1))
            .enumerate()
            .for_each(|(r, chunk)| {
                let i = indices[r];
                let xi = &self.samples[i].features;
                let ni = self.norms_sq[i];
                for (c, slot) in chunk.iter_mut().enumerate().skip(r) {
                    let j = indices[c];
                    *slot = self.kernel.compute_with_norms(
                        xi,
                        &self.samples[j].features,
                        ni,
                        self.norms_sq[j],
                    );
                }
            });

        for r in 1..m {
            for c in 0..r {
                out[r * m + c] = out[c * m + r];
            }
        }
        Ok(out)
    }

    /// Evaluate a single row K(i, cols)
    pub fn row(&self, i: usize, cols: &[usize]) -> Result<Vec<f64>> {
        self.check_indices(&[i])?;
        self.check_indices(cols)?;

        let xi = &self.samples[i].features;
        let ni = self.norms_sq[i];
        Ok(cols
            .iter()
            .map(|&j| {
                self.kernel
                    .compute_with_norms(xi, &self.samples[j].features, ni, self.norms_sq[j])
            })
            .collect())
    }

    /// Evaluate K(query, cols) for a point outside the sample set
    pub fn query_row(&self, query: &SparseVector, cols: &[usize]) -> Result<Vec<f64>> {
        self.check_indices(cols)?;

        let q_norm = query.norm_squared();
        Ok(cols
            .iter()
            .map(|&j| {
                self.kernel.compute_with_norms(
                    query,
                    &self.samples[j].features,
                    q_norm,
                    self.norms_sq[j],
                )
            })
            .collect())
    }
}
