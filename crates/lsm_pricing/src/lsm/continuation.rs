//! Continuation value estimation.
//!
//! At a period `t`, the discounted option value carried back from `t + 1`
//! is the naive continuation value of every path. For in-the-money paths
//! it is replaced by the least-squares projection onto the basis of the
//! state variables; out-of-the-money paths keep the naive value.

use lsm_core::math::least_squares::solve_min_norm;
use lsm_core::types::LsmError;
use serde::Serialize;
use tracing::trace;

use super::basis::BasisBuilder;

/// Shape and rank of the regression solved at one period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RegressionDiagnostics {
    /// Number of in-the-money paths used as observations.
    pub paths: usize,
    /// Number of basis columns.
    pub columns: usize,
    /// Numerical rank of the design matrix.
    pub rank: usize,
}

impl RegressionDiagnostics {
    /// Returns `true` if the design matrix lost rank.
    #[inline]
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.columns
    }
}

/// Continuation values at one period.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuationEstimate {
    /// Estimated continuation value per path.
    pub values: Vec<f64>,
    /// Regression details; `None` when no path was in the money.
    pub regression: Option<RegressionDiagnostics>,
}

/// Regresses discounted future values on a basis of the state variables.
#[derive(Clone, Debug)]
pub struct ContinuationValueEstimator {
    basis: BasisBuilder,
}

impl ContinuationValueEstimator {
    /// Creates an estimator using `basis`.
    #[inline]
    pub fn new(basis: BasisBuilder) -> Self {
        Self { basis }
    }

    /// Basis builder.
    #[inline]
    pub fn basis(&self) -> &BasisBuilder {
        &self.basis
    }

    /// Estimates continuation values at `period`.
    ///
    /// # Arguments
    ///
    /// * `discounted` - Option value from `period + 1`, already discounted
    /// * `cross_section` - Row-major state variables, one row per path
    /// * `n_variables` - Number of state variables
    /// * `in_the_money` - Mask of paths with strictly positive profit
    /// * `period` - Period index, used in error reports
    ///
    /// # Errors
    ///
    /// Returns `LsmError::ShapeMismatch` if the inputs disagree on the path
    /// count and `LsmError::Regression` if the solve fails.
    pub fn estimate(
        &self,
        discounted: Vec<f64>,
        cross_section: &[f64],
        n_variables: usize,
        in_the_money: &[bool],
        period: usize,
    ) -> Result<ContinuationEstimate, LsmError> {
        let n_paths = discounted.len();
        if in_the_money.len() != n_paths || cross_section.len() != n_paths * n_variables {
            return Err(LsmError::ShapeMismatch {
                what: "continuation cross-section",
                expected: (n_paths, n_variables),
                actual: (in_the_money.len(), cross_section.len() / n_variables.max(1)),
            });
        }

        let itm: Vec<usize> = (0..n_paths).filter(|&s| in_the_money[s]).collect();
        if itm.is_empty() {
            return Ok(ContinuationEstimate {
                values: discounted,
                regression: None,
            });
        }

        let mut observations = Vec::with_capacity(itm.len() * n_variables);
        let mut target = Vec::with_capacity(itm.len());
        for &s in &itm {
            observations.extend_from_slice(&cross_section[s * n_variables..(s + 1) * n_variables]);
            target.push(discounted[s]);
        }

        let design = self.basis.build(&observations, n_variables)?;
        let fit = solve_min_norm(design.as_slice(), design.rows(), design.cols(), &target)
            .map_err(|e| LsmError::Regression {
                period,
                reason: e.to_string(),
            })?;
        if !fit.is_full_rank() {
            trace!(
                period,
                rank = fit.rank,
                columns = design.cols(),
                "rank-deficient regression"
            );
        }

        let mut values = discounted;
        for (&s, &fitted) in itm.iter().zip(&fit.fitted) {
            values[s] = fitted;
        }

        Ok(ContinuationEstimate {
            values,
            regression: Some(RegressionDiagnostics {
                paths: design.rows(),
                columns: design.cols(),
                rank: fit.rank,
            }),
        })
    }
}
