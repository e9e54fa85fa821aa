//! Minimum-norm linear least squares.
//!
//! Solves `min_β ||X β - y||²` through a singular value decomposition of the
//! design matrix. Singular values below `σ_max · max(m, n) · ε` are treated as
//! zero, which yields the pseudo-inverse (minimum-norm) solution whenever the
//! design matrix is singular or rank deficient. Rank deficiency is therefore
//! reported through [`LeastSquaresFit::rank`] rather than as an error.
//!
//! Non-finite entries are rejected before the decomposition and the SVD
//! sweep count is capped, so a degenerate system fails instead of spinning.

use nalgebra::{DMatrix, DVector};

use crate::types::SolverError;

/// Cap on implicit-shift QR sweeps in the SVD.
pub const MAX_SVD_ITERATIONS: usize = 10_000;

/// Result of a least-squares fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresFit {
    /// Regression coefficients `β` (one per design column).
    pub coefficients: Vec<f64>,
    /// Fitted values `X β` (one per observation).
    pub fitted: Vec<f64>,
    /// Numerical rank of the design matrix.
    pub rank: usize,
}

impl LeastSquaresFit {
    /// Returns `true` if the design matrix had full column rank.
    #[inline]
    pub fn is_full_rank(&self) -> bool {
        self.rank == self.coefficients.len()
    }
}

/// Solves a dense least-squares problem with a row-major design matrix.
///
/// # Arguments
///
/// * `design` - Row-major `rows x cols` design matrix
/// * `rows` - Number of observations
/// * `cols` - Number of regressors
/// * `target` - Dependent variable (length `rows`)
///
/// # Errors
///
/// Returns `SolverError` if the slices disagree with the stated shape, the
/// system is empty, an entry is NaN or infinite, or the decomposition does
/// not converge.
///
/// # Examples
///
/// ```
/// use lsm_core::math::least_squares::solve_min_norm;
///
/// // Two identical columns: minimum-norm solution splits the weight evenly
/// let design = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
/// let fit = solve_min_norm(&design, 3, 2, &[2.0, 4.0, 6.0]).unwrap();
/// assert_eq!(fit.rank, 1);
/// assert!((fit.coefficients[0] - 1.0).abs() < 1e-10);
/// assert!((fit.coefficients[1] - 1.0).abs() < 1e-10);
/// ```
pub fn solve_min_norm(
    design: &[f64],
    rows: usize,
    cols: usize,
    target: &[f64],
) -> Result<LeastSquaresFit, SolverError> {
    if rows == 0 || cols == 0 {
        return Err(SolverError::EmptySystem { rows, cols });
    }
    if design.len() != rows * cols {
        return Err(SolverError::DimensionMismatch {
            rows,
            cols,
            len: design.len(),
        });
    }
    if target.len() != rows {
        return Err(SolverError::DimensionMismatch {
            rows,
            cols,
            len: target.len(),
        });
    }

    if let Some(index) = design.iter().position(|v| !v.is_finite()) {
        return Err(SolverError::NonFinite {
            what: "design",
            index,
        });
    }
    if let Some(index) = target.iter().position(|v| !v.is_finite()) {
        return Err(SolverError::NonFinite {
            what: "target",
            index,
        });
    }

    let x = DMatrix::from_row_slice(rows, cols, design);
    let y = DVector::from_column_slice(target);

    let svd = x
        .clone()
        .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or(SolverError::NoConvergence {
            iterations: MAX_SVD_ITERATIONS,
        })?;
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let tolerance = sigma_max * rows.max(cols) as f64 * f64::EPSILON;
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&s| s > tolerance)
        .count();

    let beta = svd
        .solve(&y, tolerance)
        .map_err(|e| SolverError::Decomposition(e.to_string()))?;
    let fitted = &x * &beta;
    if let Some(index) = fitted.iter().position(|v| !v.is_finite()) {
        return Err(SolverError::NonFinite {
            what: "fitted",
            index,
        });
    }

    Ok(LeastSquaresFit {
        coefficients: beta.iter().copied().collect(),
        fitted: fitted.iter().copied().collect(),
        rank,
    })
}
