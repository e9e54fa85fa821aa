//! # lsm_pricing: Least-Squares Monte Carlo Engine
//!
//! ## Layer 3 Role
//!
//! lsm_pricing values options with early exercise on simulated paths using
//! the least-squares Monte Carlo method:
//! - American calls and puts with constant or per-period strikes
//! - Real options to invest in a project with a construction lag
//! - Exercise timing, value-of-waiting and payback statistics
//!
//! Numerical primitives (polynomial bases, SVD least squares, statistics,
//! error types) come from `lsm_core`. Path generation is outside the crate:
//! callers supply simulated arrays or implement [`lsm::PathSimulator`].
//!
//! ## Usage Example
//!
//! ```rust
//! use lsm_pricing::lsm::{AmericanOption, LsmConfig, LsmPricer, PathTensor, SimulationMatrix};
//!
//! let underlying = SimulationMatrix::from_rows(vec![
//!     vec![36.0, 36.0, 36.0, 36.0],
//!     vec![33.0, 38.0, 35.0, 40.0],
//!     vec![31.0, 41.0, 37.0, 34.0],
//! ]).unwrap();
//! let paths = PathTensor::from_matrix(&underlying);
//!
//! let config = LsmConfig::builder()
//!     .risk_free_rate(0.06)
//!     .time_step(0.5)
//!     .basis_name("laguerre")
//!     .degree(2)
//!     .build()
//!     .unwrap();
//!
//! let pricer = LsmPricer::new(config).unwrap();
//! let result = pricer.price_american(&paths, &underlying, &AmericanOption::put(40.0)).unwrap();
//! assert!(result.price >= 4.0);
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber:
//! `info` at the start and end of a valuation, `debug` for every backward
//! step, `warn` when a fractional polynomial degree is rounded down.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod lsm;
pub mod settings;

pub use lsm_core::types::{ConfigError, LsmError};
