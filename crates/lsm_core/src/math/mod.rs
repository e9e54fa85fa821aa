//! Numerical building blocks for regression-based Monte Carlo.
//!
//! ## Modules
//!
//! - [`polynomials`]: Basis families (Power, Laguerre, Legendre, Chebyshev,
//!   Hermite, Jacobi) evaluated by recurrence, and degree resolution
//! - [`least_squares`]: SVD-based minimum-norm least squares
//! - [`statistics`]: Mean, sample variance and standard error

pub mod least_squares;
pub mod polynomials;
pub mod statistics;

pub use least_squares::{solve_min_norm, LeastSquaresFit};
pub use polynomials::{resolve_degree, BasisFamily, DegreeRounding};
pub use statistics::{mean, mean_and_standard_error, sample_variance, standard_error};
