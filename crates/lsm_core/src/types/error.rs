//! Error types for structured error handling.
//!
//! This module provides:
//! - `ConfigError`: Errors from configuration and basis selection
//! - `LsmError`: Errors from a valuation run (input validation, regression, cancellation)
//! - `SolverError`: Errors from the dense least-squares solver
//!
//! Validation failures abort the whole valuation; no partial result is
//! produced. Rank-deficient regressions are not errors: they are absorbed by
//! the minimum-norm solver.

use thiserror::Error;

/// Configuration errors.
///
/// Raised while building an engine configuration, before any simulation
/// data is touched.
///
/// # Examples
/// ```
/// use lsm_core::types::ConfigError;
///
/// let err = ConfigError::UnknownBasisFamily("Bessel".to_string());
/// assert!(format!("{}", err).contains("Bessel"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Basis family name not recognised.
    #[error(
        "Unknown basis family '{0}': expected one of POWER, LAGUERRE, LEGENDRE, CHEBYSHEV, HERMITE, JACOBI"
    )]
    UnknownBasisFamily(String),

    /// Polynomial degree negative or not finite.
    #[error("Invalid polynomial degree {0}: must be a finite, non-negative number")]
    InvalidDegree(f64),

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },

    /// Settings file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),
}

/// Valuation errors.
///
/// Each variant names the invariant that was violated together with the
/// dimension or step at which it was detected.
///
/// # Examples
/// ```
/// use lsm_core::types::LsmError;
///
/// let err = LsmError::ShapeMismatch {
///     what: "payoff",
///     expected: (10, 500),
///     actual: (10, 499),
/// };
/// assert!(format!("{}", err).contains("payoff"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LsmError {
    /// Missing (NaN) or infinite value in an input tensor.
    #[error(
        "Missing or non-finite value in {tensor} at period {period}, simulation {simulation}, variable {variable}"
    )]
    MissingValue {
        /// Which input carried the missing value.
        tensor: &'static str,
        /// Period (time) index.
        period: usize,
        /// Simulation index.
        simulation: usize,
        /// State-variable index (0 for two-dimensional inputs).
        variable: usize,
    },

    /// Leading dimensions of two inputs disagree.
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Which input has the wrong shape.
        what: &'static str,
        /// Expected (periods, simulations) or (length, 1).
        expected: (usize, usize),
        /// Actual shape.
        actual: (usize, usize),
    },

    /// Invalid scalar input or empty dimension.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Regression could not be solved at a period.
    #[error("Regression failed at period {period}: {reason}")]
    Regression {
        /// Period index of the failed step.
        period: usize,
        /// Solver message.
        reason: String,
    },

    /// Valuation cancelled between two backward steps.
    #[error("Valuation cancelled before period {period}")]
    Cancelled {
        /// Next period that would have been processed.
        period: usize,
    },
}

/// Least-squares solver errors.
///
/// # Examples
/// ```
/// use lsm_core::types::SolverError;
///
/// let err = SolverError::DimensionMismatch { rows: 4, cols: 2, len: 6 };
/// assert!(format!("{}", err).contains("4x2"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Design matrix storage or target length disagrees with the stated shape.
    #[error("Dimension mismatch: {rows}x{cols} system with {len} entries")]
    DimensionMismatch {
        /// Number of observations.
        rows: usize,
        /// Number of regressors.
        cols: usize,
        /// Offending slice length.
        len: usize,
    },

    /// Empty system (no observations or no regressors).
    #[error("Empty system: {rows}x{cols}")]
    EmptySystem {
        /// Number of observations.
        rows: usize,
        /// Number of regressors.
        cols: usize,
    },

    /// Design matrix or target holds a NaN or infinite entry.
    #[error("Non-finite entry in {what} at index {index}")]
    NonFinite {
        /// `"design"` or `"target"`.
        what: &'static str,
        /// Position in the row-major storage.
        index: usize,
    },

    /// Singular value decomposition did not converge.
    #[error("SVD did not converge within {iterations} iterations")]
    NoConvergence {
        /// Iteration cap that was reached.
        iterations: usize,
    },

    /// Decomposition failed.
    #[error("Decomposition failed: {0}")]
    Decomposition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidDegree(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = ConfigError::InvalidParameter {
            name: "time_step",
            value: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("time_step"));
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_missing_value_reports_coordinates() {
        let err = LsmError::MissingValue {
            tensor: "state_variables",
            period: 3,
            simulation: 17,
            variable: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("state_variables"));
        assert!(msg.contains("period 3"));
        assert!(msg.contains("simulation 17"));
    }

    #[test]
    fn test_solver_error_display() {
        let err = SolverError::NonFinite {
            what: "design",
            index: 5,
        };
        assert!(err.to_string().contains("design"));
        assert!(err.to_string().contains("index 5"));

        let err = SolverError::NoConvergence { iterations: 100 };
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_config_error_converts_transparently() {
        let err: LsmError = ConfigError::UnknownBasisFamily("spline".to_string()).into();
        assert!(matches!(err, LsmError::Config(_)));
        assert!(err.to_string().contains("spline"));
    }
}
