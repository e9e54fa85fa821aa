//! # lsm_core: Numerical Foundation for Least-Squares Monte Carlo
//!
//! ## Layer 1 (Foundation) Role
//!
//! lsm_core is the bottom layer of the workspace, providing:
//! - Orthogonal polynomial families for regression bases (`math::polynomials`)
//! - Minimum-norm linear least squares via SVD (`math::least_squares`)
//! - Sample statistics used by the result aggregation (`math::statistics`)
//! - Error types: `LsmError`, `ConfigError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other lsm_* crates, with minimal external dependencies:
//! - num-traits: Generic floating-point evaluation of the polynomial recurrences
//! - nalgebra: Dense SVD for the regression solve
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use lsm_core::math::polynomials::BasisFamily;
//! use lsm_core::math::least_squares::solve_min_norm;
//!
//! // Legendre P_2(0.5) = (3 * 0.25 - 1) / 2
//! let mut out = [0.0_f64; 2];
//! BasisFamily::Legendre.evaluate_into(0.5, &mut out);
//! assert!((out[1] + 0.125).abs() < 1e-12);
//!
//! // Fit y = 1 + 2x exactly
//! let design = [1.0, 0.0, 1.0, 1.0, 1.0, 2.0];
//! let fit = solve_min_norm(&design, 3, 2, &[1.0, 3.0, 5.0]).unwrap();
//! assert!((fit.coefficients[1] - 2.0).abs() < 1e-10);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for `BasisFamily` and `DegreeRounding`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;
