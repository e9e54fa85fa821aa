//! Least-squares Monte Carlo pricer.
//!
//! [`LsmPricer`] ties the pieces together for a full valuation:
//!
//! 1. validate inputs and build the profit matrix
//! 2. run the backward induction
//! 3. aggregate per-path values into a result record
//!
//! # Examples
//!
//! ```rust
//! use lsm_pricing::lsm::{AmericanOption, LsmConfig, LsmPricer, PathTensor, SimulationMatrix};
//!
//! // Longstaff-Schwartz eight-path example, three exercise dates
//! let underlying = SimulationMatrix::from_rows(vec![
//!     vec![1.00, 1.00, 1.00, 1.00, 1.00, 1.00, 1.00, 1.00],
//!     vec![1.09, 1.16, 1.22, 0.93, 1.11, 0.76, 0.92, 0.88],
//!     vec![1.08, 1.26, 1.07, 0.97, 1.56, 0.77, 0.84, 1.22],
//!     vec![1.34, 1.54, 1.03, 0.92, 1.52, 0.90, 1.01, 1.34],
//! ]).unwrap();
//! let paths = PathTensor::from_matrix(&underlying);
//!
//! let config = LsmConfig::builder()
//!     .risk_free_rate(0.06)
//!     .time_step(1.0)
//!     .degree(2)
//!     .exercise_at_inception(false)
//!     .build()
//!     .unwrap();
//!
//! let pricer = LsmPricer::new(config).unwrap();
//! let result = pricer
//!     .price_american(&paths, &underlying, &AmericanOption::put(1.10))
//!     .unwrap();
//!
//! assert!(result.price > 0.1);
//! assert!(result.price < 0.2);
//! ```

use lsm_core::types::{ConfigError, LsmError};
use tracing::info;

use super::config::LsmConfig;
use super::induction::{BackwardInductionEngine, CancellationToken, InductionOutcome};
use super::parallel::ParallelPolicy;
use super::paths::{PathSimulator, PathTensor, SimulationMatrix};
use super::payoff::{AmericanOption, ProfitMatrix, RealOption};
use super::result::{AmericanOptionResult, EuropeanEstimate, RealOptionResult, ResultAggregator};

/// Valuation entry point holding a validated configuration.
///
/// The pricer keeps no state between calls; identical inputs give
/// bit-identical results.
#[derive(Clone, Debug)]
pub struct LsmPricer {
    config: LsmConfig,
    cancellation: Option<CancellationToken>,
}

impl LsmPricer {
    /// Creates a pricer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(config: LsmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            cancellation: None,
        })
    }

    /// Polls `token` between backward steps of every valuation.
    #[inline]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &LsmConfig {
        &self.config
    }

    /// Values an American option.
    ///
    /// # Arguments
    ///
    /// * `paths` - State variables used as regressors
    /// * `underlying` - Payoff-driving underlying, same leading shape as `paths`
    /// * `option` - Contract terms
    ///
    /// # Errors
    ///
    /// Returns `LsmError` if an input is not finite, the shapes disagree,
    /// the strike schedule is invalid, or the run is cancelled.
    pub fn price_american(
        &self,
        paths: &PathTensor,
        underlying: &SimulationMatrix,
        option: &AmericanOption,
    ) -> Result<AmericanOptionResult, LsmError> {
        paths.ensure_complete()?;
        underlying.ensure_matches(paths, "payoff")?;
        let profit = ProfitMatrix::vanilla(underlying, option, self.policy())?;

        info!(
            direction = %option.direction,
            periods = paths.n_periods(),
            paths = paths.n_simulations(),
            variables = paths.n_variables(),
            basis = %self.config.basis().family(),
            degree = self.config.basis().degree(),
            "pricing American option"
        );

        let outcome = self.induce(paths, &profit)?;
        let result = self.aggregator(paths).american(
            option.direction,
            outcome,
            self.config.degree_rounding(),
        )?;

        info!(
            price = result.price,
            standard_error = result.standard_error,
            exercise_probability = result.exercise.exercise_probability,
            "American option priced"
        );
        Ok(result)
    }

    /// Values an option to invest in a project.
    ///
    /// # Arguments
    ///
    /// * `paths` - State variables used as regressors
    /// * `net_cash_flow` - Project net cash flows, same leading shape as `paths`
    /// * `option` - Investment terms
    ///
    /// # Errors
    ///
    /// Returns `LsmError` if an input is not finite, the shapes disagree,
    /// the expenditure schedule is invalid, or the run is cancelled.
    pub fn price_real_option(
        &self,
        paths: &PathTensor,
        net_cash_flow: &SimulationMatrix,
        option: &RealOption,
    ) -> Result<RealOptionResult, LsmError> {
        paths.ensure_complete()?;
        net_cash_flow.ensure_matches(paths, "net_cash_flow")?;
        let profit = ProfitMatrix::real_option(
            net_cash_flow,
            option,
            self.config.discount_factor(),
            self.policy(),
        )?;

        info!(
            periods = paths.n_periods(),
            paths = paths.n_simulations(),
            variables = paths.n_variables(),
            construction_periods = option.construction_periods,
            "pricing real option"
        );

        let outcome = self.induce(paths, &profit)?;
        let result = self.aggregator(paths).real_option(
            outcome,
            &profit,
            net_cash_flow,
            option,
            self.config.degree_rounding(),
        )?;

        info!(
            rov = result.rov,
            npv = result.npv,
            wov = result.wov,
            "real option priced"
        );
        Ok(result)
    }

    /// Draws a batch from `simulator` and values an American option on it.
    ///
    /// # Errors
    ///
    /// Returns `LsmError` from the simulator or the valuation.
    pub fn price_simulated<S>(
        &self,
        simulator: &mut S,
        option: &AmericanOption,
    ) -> Result<AmericanOptionResult, LsmError>
    where
        S: PathSimulator + ?Sized,
    {
        let batch = simulator.simulate()?;
        self.price_american(&batch.state_variables, &batch.underlying, option)
    }

    /// Values the European counterpart on the same paths: terminal profit
    /// discounted to period 0.
    ///
    /// # Errors
    ///
    /// Returns `LsmError` if the underlying is not finite or the strike
    /// schedule is invalid.
    pub fn european_benchmark(
        &self,
        underlying: &SimulationMatrix,
        option: &AmericanOption,
    ) -> Result<EuropeanEstimate, LsmError> {
        let profit = ProfitMatrix::vanilla(underlying, option, self.policy())?;
        let aggregator = ResultAggregator::new(underlying.n_periods(), self.config.time_step());
        Ok(aggregator.european(&profit, self.config.discount_factor()))
    }

    fn induce(
        &self,
        paths: &PathTensor,
        profit: &ProfitMatrix,
    ) -> Result<InductionOutcome, LsmError> {
        let mut engine = BackwardInductionEngine::new(paths, profit, &self.config)?;
        if let Some(token) = &self.cancellation {
            engine = engine.with_cancellation(token.clone());
        }
        engine.run()
    }

    fn aggregator(&self, paths: &PathTensor) -> ResultAggregator {
        ResultAggregator::new(paths.n_periods(), self.config.time_step())
    }

    fn policy(&self) -> ParallelPolicy {
        ParallelPolicy::from_config(&self.config)
    }
}
