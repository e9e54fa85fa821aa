//! Integration tests for module exports.
//!
//! Verify that all public modules and types are reachable through their
//! absolute paths and the `math` re-exports.

/// Polynomial bases via absolute path and re-export.
#[test]
fn test_polynomial_exports() {
    use lsm_core::math::polynomials::{resolve_degree, BasisFamily, DegreeRounding};
    use lsm_core::math::BasisFamily as ReExported;

    let family: BasisFamily = "hermite".parse().unwrap();
    assert_eq!(family, ReExported::Hermite);
    assert_eq!(family.evaluate(1.0_f64, 2), 2.0);

    let (degree, rounding): (u32, Option<DegreeRounding>) = resolve_degree(1.5).unwrap();
    assert_eq!(degree, 1);
    assert!(rounding.is_some());
}

/// Least squares via absolute path.
#[test]
fn test_least_squares_exports() {
    use lsm_core::math::least_squares::{solve_min_norm, LeastSquaresFit};

    let fit: LeastSquaresFit = solve_min_norm(&[1.0, 1.0], 2, 1, &[1.0, 3.0]).unwrap();
    assert!((fit.coefficients[0] - 2.0).abs() < 1e-12);
}

/// Statistics via re-export.
#[test]
fn test_statistics_exports() {
    use lsm_core::math::{mean, mean_and_standard_error, sample_variance, standard_error};

    let xs = [2.0, 4.0];
    assert_eq!(mean(&xs), 3.0);
    assert_eq!(sample_variance(&xs), 2.0);
    assert_eq!(standard_error(&xs), 1.0);
    assert_eq!(mean_and_standard_error(&xs), (3.0, 1.0));
}

/// Error types via `types` re-export.
#[test]
fn test_error_exports() {
    use lsm_core::types::{ConfigError, LsmError, SolverError};

    let err: LsmError = ConfigError::InvalidDegree(-1.0).into();
    assert!(matches!(err, LsmError::Config(ConfigError::InvalidDegree(_))));

    let solver = SolverError::EmptySystem { rows: 0, cols: 3 };
    assert!(!solver.to_string().is_empty());
}
