//! Regression design matrix.
//!
//! Each observation (a path's state variables at one period) becomes one
//! row with the following columns, in order:
//!
//! 1. intercept
//! 2. for each variable `x_j`: `P_1(x_j), ..., P_d(x_j)`
//! 3. the raw variables `x_1, ..., x_k`
//! 4. with cross products and `k > 1`: `x_i x_j` for `i < j`
//!
//! With the power family the raw variables duplicate `P_1`; the solver's
//! minimum-norm handling absorbs the resulting rank deficiency.

use lsm_core::types::LsmError;

use super::config::BasisConfig;
use super::parallel::ParallelPolicy;

/// Dense row-major design matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DesignMatrix {
    /// Number of observations.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of regressors.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Builds design matrices for a fixed basis configuration.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::{BasisBuilder, BasisConfig};
/// use lsm_core::math::BasisFamily;
///
/// let builder = BasisBuilder::new(BasisConfig::new(BasisFamily::Power, 2, true));
/// let design = builder.build(&[2.0, 3.0], 2).unwrap();
///
/// // 1 | x, x² | y, y² | x, y | xy
/// assert_eq!(design.row(0), &[1.0, 2.0, 4.0, 3.0, 9.0, 2.0, 3.0, 6.0]);
/// ```
#[derive(Clone, Debug)]
pub struct BasisBuilder {
    config: BasisConfig,
    policy: ParallelPolicy,
}

impl BasisBuilder {
    /// Creates a sequential builder.
    #[inline]
    pub fn new(config: BasisConfig) -> Self {
        Self {
            config,
            policy: ParallelPolicy::sequential(),
        }
    }

    /// Sets the parallel policy for large cross-sections.
    #[inline]
    pub fn with_policy(mut self, policy: ParallelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Basis configuration.
    #[inline]
    pub fn config(&self) -> BasisConfig {
        self.config
    }

    /// Number of columns for `n_variables` state variables.
    #[inline]
    pub fn n_columns(&self, n_variables: usize) -> usize {
        self.config.n_columns(n_variables)
    }

    /// Builds the design matrix of row-major `observations` with
    /// `n_variables` columns.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if `n_variables` is zero or does not
    /// divide the observation count.
    pub fn build(&self, observations: &[f64], n_variables: usize) -> Result<DesignMatrix, LsmError> {
        if n_variables == 0 || observations.len() % n_variables != 0 {
            return Err(LsmError::InvalidInput(format!(
                "{} observations cannot be split into rows of {} variables",
                observations.len(),
                n_variables
            )));
        }

        let rows = observations.len() / n_variables;
        let cols = self.n_columns(n_variables);
        let mut data = vec![0.0; rows * cols];

        self.policy.for_each_row(&mut data, cols, |i, out| {
            self.fill_row(&observations[i * n_variables..(i + 1) * n_variables], out);
        });

        Ok(DesignMatrix { rows, cols, data })
    }

    fn fill_row(&self, x: &[f64], out: &mut [f64]) {
        let degree = self.config.degree() as usize;
        let family = self.config.family();

        out[0] = 1.0;
        let mut offset = 1;
        for &xj in x {
            family.evaluate_into(xj, &mut out[offset..offset + degree]);
            offset += degree;
        }

        out[offset..offset + x.len()].copy_from_slice(x);
        offset += x.len();

        if self.config.cross_product() && x.len() > 1 {
            for i in 0..x.len() {
                for j in i + 1..x.len() {
                    out[offset] = x[i] * x[j];
                    offset += 1;
                }
            }
        }
    }
}
