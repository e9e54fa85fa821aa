//! Data parallelism within a backward step.
//!
//! The backward recursion is inherently sequential in time; only the work
//! across paths at a single period (profit rows, design-matrix rows) is
//! split over the rayon pool. Small workloads fall back to a plain loop.

use rayon::prelude::*;

use super::config::LsmConfig;

/// Decides whether per-row work is spread across threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelPolicy {
    enabled: bool,
    threshold: usize,
}

impl ParallelPolicy {
    /// Creates a policy that parallelises workloads of at least `threshold` rows.
    #[inline]
    pub fn new(enabled: bool, threshold: usize) -> Self {
        Self { enabled, threshold }
    }

    /// Always runs sequentially.
    #[inline]
    pub fn sequential() -> Self {
        Self::new(false, usize::MAX)
    }

    /// Policy taken from a valuation configuration.
    #[inline]
    pub fn from_config(config: &LsmConfig) -> Self {
        Self::new(config.parallel(), config.parallel_threshold())
    }

    /// Returns `true` if `n_rows` rows should be processed in parallel.
    #[inline]
    pub fn should_parallelise(&self, n_rows: usize) -> bool {
        self.enabled && n_rows >= self.threshold
    }

    /// Applies `f(row_index, row)` to each `width`-sized row of `data`.
    ///
    /// Rows are disjoint, so the result does not depend on the policy.
    pub fn for_each_row<F>(&self, data: &mut [f64], width: usize, f: F)
    where
        F: Fn(usize, &mut [f64]) + Send + Sync,
    {
        if width == 0 {
            return;
        }
        let n_rows = data.len() / width;
        if self.should_parallelise(n_rows) {
            data.par_chunks_mut(width)
                .enumerate()
                .for_each(|(i, row)| f(i, row));
        } else {
            data.chunks_mut(width)
                .enumerate()
                .for_each(|(i, row)| f(i, row));
        }
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self::sequential()
    }
}
