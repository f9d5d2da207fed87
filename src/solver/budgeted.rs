//! Budgeted (semiparametric) training
//!
//! Keeps the model basis capped at a configured budget B while approximating
//! the full-data solution. The selection loop wraps the IRWLS core: sample
//! candidate points outside the basis, admit the one with the largest hinge
//! residual under the current model, evict the weakest basis member once at
//! capacity, and re-solve after every basis change. The basis is a set of
//! dataset indices, so growth and eviction are index swaps, never data moves.

use crate::core::{BudgetConfig, IrwlsResult, Result, SVMError, Sample, TrainConfig};
use crate::kernel::Kernel;
use crate::solver::irwls::IrwlsSolver;
use log::debug;

/// Candidates whose hinge residual falls below this are not worth admitting
const SELECTION_THRESHOLD: f64 = 1e-3;

/// Minimal LCG for reproducible candidate sampling
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn next_below(&mut self, n: usize) -> usize {
        (self.next_u32() as usize) % n.max(1)
    }
}

/// Basis selection outcome: the frozen basis and the final IRWLS iterate
#[derive(Debug, Clone)]
pub struct BudgetedOutcome {
    /// Dataset indices forming the model basis, length <= budget
    pub basis: Vec<usize>,
    /// IRWLS result over that basis
    pub result: IrwlsResult,
}

/// Budgeted trainer wrapping the IRWLS core loop
pub struct BudgetedSolver<'a, K: Kernel> {
    solver: IrwlsSolver<'a, K>,
    n: usize,
    budget: BudgetConfig,
    seed: u64,
}

impl<'a, K: Kernel> BudgetedSolver<'a, K> {
    /// Create a budgeted solver; parameter problems are rejected upfront,
    /// before any expensive phase starts
    pub fn new(
        samples: &'a [Sample],
        kernel: &'a K,
        config: TrainConfig,
        budget: BudgetConfig,
    ) -> Result<Self> {
        if budget.budget == 0 {
            return Err(SVMError::InvalidParameter(
                "basis budget must be positive".to_string(),
            ));
        }
        if budget.budget > samples.len() {
            return Err(SVMError::InvalidParameter(format!(
                "basis budget {} exceeds dataset size {}",
                budget.budget,
                samples.len()
            )));
        }
        if budget.candidates_per_round == 0 {
            return Err(SVMError::InvalidParameter(
                "candidate pool size must be positive".to_string(),
            ));
        }

        let seed = config.seed;
        Ok(Self {
            solver: IrwlsSolver::new(samples, kernel, config),
            n: samples.len(),
            budget,
            seed,
        })
    }

    /// Sample up to `count` distinct indices for which `taken` is false
    fn sample_candidates(&self, rng: &mut SimpleRng, taken: &[bool], count: usize) -> Vec<usize> {
        let free = taken.iter().filter(|&&t| !t).count();
        let count = count.min(free);
        let mut picked = vec![false; self.n];
        let mut out = Vec::with_capacity(count);

        let mut attempts = 0;
        while out.len() < count && attempts < 16 * self.n.max(1) {
            attempts += 1;
            let i = rng.next_below(self.n);
            if !taken[i] && !picked[i] {
                picked[i] = true;
                out.push(i);
            }
        }
        // Sparse leftovers: finish with a scan
        if out.len() < count {
            for i in 0..self.n {
                if out.len() == count {
                    break;
                }
                if !taken[i] && !picked[i] {
                    picked[i] = true;
                    out.push(i);
                }
            }
        }
        out
    }

    /// Run budgeted training: grow/swap the basis until no candidate helps,
    /// the objective stalls, or the round budget runs out
    pub fn solve(&self) -> Result<BudgetedOutcome> {
        let mut rng = SimpleRng::new(self.seed);

        // Initial basis: a small seeded sample, roughly one in ten points,
        // capped by the budget
        let initial_size = self.budget.budget.min((self.n / 10).max(2)).max(1);
        let mut taken = vec![false; self.n];
        let mut basis = self.sample_candidates(&mut rng, &taken, initial_size);
        for &i in &basis {
            taken[i] = true;
        }

        let mut result = self.solver.solve(&basis)?;
        let mut stale_rounds = 0;
        let max_rounds = 2 * self.budget.budget + self.budget.patience;

        for round in 0..max_rounds {
            if stale_rounds >= self.budget.patience {
                break;
            }

            let decisions = self
                .solver
                .decision_values(&basis, &result.alpha, result.bias)?;
            let candidates =
                self.sample_candidates(&mut rng, &taken, self.budget.candidates_per_round);
            if candidates.is_empty() {
                break;
            }

            // Greedy residual-based selection: the strongest margin violator
            let best = candidates
                .iter()
                .map(|&i| (i, 1.0 - self.solver.label(i) * decisions[i]))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((candidate, violation)) = best else {
                break;
            };
            if violation <= SELECTION_THRESHOLD {
                debug!("selection stop at round {round}: best residual {violation:.3e}");
                break;
            }

            // At capacity the weakest member is swapped out, never grown past
            let mut trial_basis = basis.clone();
            let mut evicted = None;
            if trial_basis.len() < self.budget.budget {
                trial_basis.push(candidate);
            } else {
                let weakest = result
                    .alpha
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                    .map(|(pos, _)| pos)
                    .unwrap_or(0);
                evicted = Some(trial_basis[weakest]);
                trial_basis[weakest] = candidate;
            }

            match self.solver.solve(&trial_basis) {
                Ok(trial) => {
                    if trial.objective < result.objective {
                        debug!(
                            "round {round}: admitted {candidate} (residual {violation:.3e}), \
                             objective {:.6} -> {:.6}",
                            result.objective, trial.objective
                        );
                        if let Some(out) = evicted {
                            taken[out] = false;
                        }
                        taken[candidate] = true;
                        basis = trial_basis;
                        result = trial;
                        stale_rounds = 0;
                    } else {
                        stale_rounds += 1;
                    }
                }
                // A failed candidate evaluation rejects the candidate, it
                // does not abort the run
                Err(SVMError::SingularSystem { .. }) => {
                    debug!("round {round}: candidate {candidate} rejected (singular system)");
                    stale_rounds += 1;
                }
                Err(e) => return Err(e),
            }
        }

        debug_assert!(basis.len() <= self.budget.budget);
        Ok(BudgetedOutcome { basis, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use crate::kernel::RBFKernel;

    fn two_cluster_samples(per_class: usize) -> Vec<Sample> {
        // Deterministic jitter around (2,2) and (-2,-2)
        let mut rng = SimpleRng::new(7);
        let mut samples = Vec::new();
        for _ in 0..per_class {
            let dx = (rng.next_below(1000) as f64 / 1000.0 - 0.5) * 0.8;
            let dy = (rng.next_below(1000) as f64 / 1000.0 - 0.5) * 0.8;
            samples.push(Sample::new(
                SparseVector::from_dense(&[2.0 + dx, 2.0 + dy]),
                1.0,
            ));
            samples.push(Sample::new(
                SparseVector::from_dense(&[-2.0 + dx, -2.0 + dy]),
                -1.0,
            ));
        }
        samples
    }

    #[test]
    fn test_basis_never_exceeds_budget() {
        let samples = two_cluster_samples(30);
        let kernel = RBFKernel::new(0.5);
        let config = TrainConfig {
            c: 100.0,
            ..TrainConfig::default()
        };
        let budget = BudgetConfig {
            budget: 6,
            candidates_per_round: 8,
            patience: 3,
        };

        let solver = BudgetedSolver::new(&samples, &kernel, config, budget).unwrap();
        let outcome = solver.solve().unwrap();

        assert!(outcome.basis.len() <= 6);
        assert_eq!(outcome.result.alpha.len(), outcome.basis.len());

        // Basis indices are distinct and in range
        let mut seen = vec![false; samples.len()];
        for &i in &outcome.basis {
            assert!(i < samples.len());
            assert!(!seen[i], "duplicate basis index {i}");
            seen[i] = true;
        }
    }

    #[test]
    fn test_budgeted_classifies_clusters() {
        let samples = two_cluster_samples(30);
        let kernel = RBFKernel::new(0.5);
        let config = TrainConfig {
            c: 100.0,
            ..TrainConfig::default()
        };
        let budget = BudgetConfig {
            budget: 8,
            candidates_per_round: 10,
            patience: 4,
        };

        let solver = BudgetedSolver::new(&samples, &kernel, config, budget).unwrap();
        let outcome = solver.solve().unwrap();

        let irwls = IrwlsSolver::new(&samples, &kernel, TrainConfig::default());
        let decisions = irwls
            .decision_values(&outcome.basis, &outcome.result.alpha, outcome.result.bias)
            .unwrap();
        let correct = samples
            .iter()
            .zip(decisions.iter())
            .filter(|(s, &f)| s.label == f.signum())
            .count();
        assert!(
            correct as f64 / samples.len() as f64 >= 0.95,
            "only {correct}/{} correct",
            samples.len()
        );
    }

    #[test]
    fn test_budget_zero_rejected() {
        let samples = two_cluster_samples(5);
        let kernel = RBFKernel::new(0.5);
        let budget = BudgetConfig {
            budget: 0,
            ..BudgetConfig::default()
        };

        assert!(matches!(
            BudgetedSolver::new(&samples, &kernel, TrainConfig::default(), budget),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_budget_larger_than_dataset_rejected() {
        let samples = two_cluster_samples(3);
        let kernel = RBFKernel::new(0.5);
        let budget = BudgetConfig {
            budget: samples.len() + 1,
            ..BudgetConfig::default()
        };

        assert!(matches!(
            BudgetedSolver::new(&samples, &kernel, TrainConfig::default(), budget),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_candidate_pool_rejected() {
        let samples = two_cluster_samples(5);
        let kernel = RBFKernel::new(0.5);
        let budget = BudgetConfig {
            budget: 4,
            candidates_per_round: 0,
            patience: 3,
        };

        assert!(matches!(
            BudgetedSolver::new(&samples, &kernel, TrainConfig::default(), budget),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sampling_is_seeded_and_distinct() {
        let samples = two_cluster_samples(10);
        let kernel = RBFKernel::new(0.5);
        let budget = BudgetConfig {
            budget: 5,
            candidates_per_round: 4,
            patience: 2,
        };

        let solver =
            BudgetedSolver::new(&samples, &kernel, TrainConfig::default(), budget).unwrap();

        let mut rng = SimpleRng::new(3);
        let taken = vec![false; samples.len()];
        let picked = solver.sample_candidates(&mut rng, &taken, 8);
        assert_eq!(picked.len(), 8);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 8, "candidates must be distinct");

        // Same seed, same draw
        let mut rng2 = SimpleRng::new(3);
        let picked2 = solver.sample_candidates(&mut rng2, &taken, 8);
        assert_eq!(picked, picked2);
    }
}
