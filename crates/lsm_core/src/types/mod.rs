//! Core error types.
//!
//! This module provides:
//! - `error`: Structured error types for configuration, input validation and
//!   numerical failures of the valuation engine and its least-squares solver
//!
//! # Re-exports
//!
//! - [`LsmError`], [`ConfigError`], [`SolverError`] from `error`

pub mod error;

pub use error::{ConfigError, LsmError, SolverError};
