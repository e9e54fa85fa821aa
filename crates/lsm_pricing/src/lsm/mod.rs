//! Least-squares Monte Carlo valuation of American and real options.
//!
//! # Architecture
//!
//! ```text
//! LsmPricer
//! ├── LsmConfig                 (rate, grid, basis, exercise policy)
//! ├── ProfitMatrix              (exercise profit per period and path)
//! ├── BackwardInductionEngine   (exercise/continue decisions)
//! │   └── ContinuationValueEstimator
//! │       └── BasisBuilder      (design matrix)
//! └── ResultAggregator          (price, errors, exercise and payback statistics)
//! ```
//!
//! Paths are supplied by the caller, either directly as a [`PathTensor`]
//! with its matching [`SimulationMatrix`], or through a [`PathSimulator`].
//!
//! # Example
//!
//! ```rust
//! use lsm_pricing::lsm::{AmericanOption, LsmConfig, LsmPricer, PathTensor, SimulationMatrix};
//!
//! let underlying = SimulationMatrix::from_fn(3, 4, |t, s| 100.0 - (t * (s + 1)) as f64);
//! let paths = PathTensor::from_matrix(&underlying);
//!
//! let pricer = LsmPricer::new(
//!     LsmConfig::builder().risk_free_rate(0.03).time_step(0.5).build().unwrap(),
//! ).unwrap();
//!
//! let result = pricer.price_american(&paths, &underlying, &AmericanOption::put(100.0)).unwrap();
//! println!("{}", result);
//! assert!(result.price >= 0.0);
//! ```

pub mod basis;
pub mod config;
pub mod continuation;
pub mod induction;
pub mod parallel;
pub mod paths;
pub mod payoff;
pub mod pricer;
pub mod result;

pub use basis::{BasisBuilder, DesignMatrix};
pub use config::{BasisConfig, LsmConfig, LsmConfigBuilder, DEFAULT_PARALLEL_THRESHOLD};
pub use continuation::{ContinuationEstimate, ContinuationValueEstimator, RegressionDiagnostics};
pub use induction::{
    BackwardInductionEngine, CancellationToken, InductionOutcome, InductionState, StepSummary,
    Steps,
};
pub use parallel::ParallelPolicy;
pub use paths::{PathSimulator, PathTensor, SimulatedPaths, SimulationMatrix};
pub use payoff::{
    remaining_present_value, AmericanOption, OptionDirection, ProfitMatrix, RealOption, Strike,
};
pub use pricer::LsmPricer;
pub use result::{
    AmericanOptionResult, EuropeanEstimate, ExerciseStatistics, PaybackStatistics,
    RealOptionResult, ResultAggregator,
};
