//! Backward induction over exercise dates.
//!
//! The engine walks the period grid from the last period towards the
//! valuation date. At each decision period it compares the profit of
//! immediate exercise with the estimated continuation value and records
//! the decision in an [`InductionState`]:
//!
//! - terminal period `T`: exercise wherever profit is strictly positive
//! - period `t < T`: continuation is the carried value times `δ = exp(-r Δt)`,
//!   refined by regression on in-the-money paths; exercise where profit
//!   strictly exceeds continuation (ties continue)
//!
//! Each step produces a fresh state. A path's exercise time can only move
//! to an earlier period, so after the last step it holds the first period,
//! in forward time, at which the estimated stopping rule triggers.
//!
//! # Examples
//!
//! ```rust
//! use lsm_pricing::lsm::{
//!     AmericanOption, BackwardInductionEngine, LsmConfig, ParallelPolicy, PathTensor,
//!     ProfitMatrix, SimulationMatrix,
//! };
//!
//! let underlying = SimulationMatrix::from_rows(vec![
//!     vec![1.0, 1.0],
//!     vec![0.8, 1.2],
//! ]).unwrap();
//! let paths = PathTensor::from_matrix(&underlying);
//! let profit = ProfitMatrix::vanilla(
//!     &underlying,
//!     &AmericanOption::put(1.1),
//!     ParallelPolicy::sequential(),
//! ).unwrap();
//! let config = LsmConfig::builder().risk_free_rate(0.0).time_step(1.0).build().unwrap();
//!
//! let engine = BackwardInductionEngine::new(&paths, &profit, &config).unwrap();
//! let outcome = engine.run().unwrap();
//!
//! assert_eq!(outcome.steps.len(), 2);
//! assert!(outcome.option_value.iter().all(|&v| v >= 0.0));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lsm_core::types::LsmError;
use serde::Serialize;
use tracing::debug;

use super::basis::BasisBuilder;
use super::config::LsmConfig;
use super::continuation::{ContinuationValueEstimator, RegressionDiagnostics};
use super::parallel::ParallelPolicy;
use super::paths::PathTensor;
use super::payoff::ProfitMatrix;

/// Cooperative cancellation flag shared between threads.
///
/// The engine polls the token between backward steps.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an unset token.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Per-path option values and exercise times after processing `period`.
#[derive(Clone, Debug, PartialEq)]
pub struct InductionState {
    period: usize,
    option_value: Vec<f64>,
    exercise_time: Vec<Option<usize>>,
}

impl InductionState {
    /// Last period processed.
    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Option value per path, expressed at [`period`](Self::period).
    #[inline]
    pub fn option_value(&self) -> &[f64] {
        &self.option_value
    }

    /// Exercise period per path; `None` if never exercised so far.
    #[inline]
    pub fn exercise_time(&self) -> &[Option<usize>] {
        &self.exercise_time
    }

    /// Number of paths with a recorded exercise.
    pub fn exercised_count(&self) -> usize {
        self.exercise_time.iter().filter(|e| e.is_some()).count()
    }
}

/// Diagnostics of one backward step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    /// Period processed.
    pub period: usize,
    /// Paths with strictly positive profit.
    pub in_the_money: usize,
    /// Paths exercised at this period.
    pub exercised: usize,
    /// Regression details; `None` at the terminal period or with no ITM path.
    pub regression: Option<RegressionDiagnostics>,
}

/// Final state of a completed backward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct InductionOutcome {
    /// Option value per path, discounted to period 0.
    pub option_value: Vec<f64>,
    /// Exercise period per path.
    pub exercise_time: Vec<Option<usize>>,
    /// Step diagnostics in chronological order.
    pub steps: Vec<StepSummary>,
}

/// Least-squares backward induction over a path tensor and profit matrix.
#[derive(Debug)]
pub struct BackwardInductionEngine<'a> {
    paths: &'a PathTensor,
    profit: &'a ProfitMatrix,
    estimator: ContinuationValueEstimator,
    discount_factor: f64,
    first_period: usize,
    cancellation: Option<CancellationToken>,
}

impl<'a> BackwardInductionEngine<'a> {
    /// Validates the inputs and prepares an engine.
    ///
    /// # Errors
    ///
    /// Returns `LsmError` if:
    /// - the configuration is invalid
    /// - the path tensor holds a NaN or infinite value
    /// - the profit matrix shape differs from the path tensor's leading dimensions
    /// - period 0 is excluded but there is only one period
    pub fn new(
        paths: &'a PathTensor,
        profit: &'a ProfitMatrix,
        config: &LsmConfig,
    ) -> Result<Self, LsmError> {
        config.validate()?;
        paths.ensure_complete()?;
        profit.as_matrix().ensure_complete("profit")?;
        profit.as_matrix().ensure_matches(paths, "profit")?;

        let first_period = if config.exercise_at_inception() { 0 } else { 1 };
        if first_period >= paths.n_periods() {
            return Err(LsmError::InvalidInput(
                "at least two periods are required when period 0 is not a decision point"
                    .to_string(),
            ));
        }

        let basis = BasisBuilder::new(config.basis()).with_policy(ParallelPolicy::from_config(config));

        Ok(Self {
            paths,
            profit,
            estimator: ContinuationValueEstimator::new(basis),
            discount_factor: config.discount_factor(),
            first_period,
            cancellation: None,
        })
    }

    /// Polls `token` between steps.
    #[inline]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Earliest decision period (0 or 1).
    #[inline]
    pub fn first_period(&self) -> usize {
        self.first_period
    }

    /// Last period.
    #[inline]
    pub fn terminal_period(&self) -> usize {
        self.paths.n_periods() - 1
    }

    /// State after the terminal decision.
    pub fn terminal_state(&self) -> (InductionState, StepSummary) {
        let period = self.terminal_period();
        let profit = self.profit.row(period);

        let mut option_value = vec![0.0; profit.len()];
        let mut exercise_time = vec![None; profit.len()];
        let mut exercised = 0;
        for (s, &p) in profit.iter().enumerate() {
            if p > 0.0 {
                option_value[s] = p;
                exercise_time[s] = Some(period);
                exercised += 1;
            }
        }

        let summary = StepSummary {
            period,
            in_the_money: exercised,
            exercised,
            regression: None,
        };
        debug!(period, in_the_money = exercised, exercised, "terminal exercise");

        (
            InductionState {
                period,
                option_value,
                exercise_time,
            },
            summary,
        )
    }

    /// Processes the period before `state.period()`.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if `state` is already at the first
    /// decision period and `LsmError::Regression` if the solve fails.
    pub fn step(&self, state: &InductionState) -> Result<(InductionState, StepSummary), LsmError> {
        if state.period <= self.first_period {
            return Err(LsmError::InvalidInput(format!(
                "no decision period before {}",
                state.period
            )));
        }
        let t = state.period - 1;
        let profit = self.profit.row(t);
        let delta = self.discount_factor;

        let discounted: Vec<f64> = state.option_value.iter().map(|v| v * delta).collect();
        let in_the_money: Vec<bool> = profit.iter().map(|&p| p > 0.0).collect();
        let itm_count = in_the_money.iter().filter(|&&m| m).count();

        let estimate = self.estimator.estimate(
            discounted.clone(),
            self.paths.cross_section(t),
            self.paths.n_variables(),
            &in_the_money,
            t,
        )?;

        let mut option_value = discounted;
        let mut exercise_time = state.exercise_time.clone();
        let mut exercised = 0;
        for s in 0..option_value.len() {
            if in_the_money[s] && profit[s] > estimate.values[s] {
                option_value[s] = profit[s];
                exercise_time[s] = Some(t);
                exercised += 1;
            }
        }

        let summary = StepSummary {
            period: t,
            in_the_money: itm_count,
            exercised,
            regression: estimate.regression,
        };
        debug!(
            period = t,
            in_the_money = itm_count,
            exercised,
            rank = estimate.regression.map(|r| r.rank),
            "backward step"
        );

        Ok((
            InductionState {
                period: t,
                option_value,
                exercise_time,
            },
            summary,
        ))
    }

    /// Iterator over the states from the terminal period down to the first
    /// decision period.
    pub fn steps(&self) -> Steps<'_, 'a> {
        Steps {
            engine: self,
            state: None,
            done: false,
        }
    }

    /// Runs the full backward pass.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::Cancelled` if the token is set between steps, or
    /// any error raised by a step.
    pub fn run(&self) -> Result<InductionOutcome, LsmError> {
        let mut steps = Vec::with_capacity(self.paths.n_periods());
        let mut last = None;
        for item in self.steps() {
            let (state, summary) = item?;
            steps.push(summary);
            last = Some(state);
        }

        let state = last.ok_or_else(|| {
            LsmError::InvalidInput("backward induction produced no state".to_string())
        })?;

        let mut option_value = state.option_value;
        if state.period > 0 {
            let factor = self.discount_factor.powi(state.period as i32);
            option_value.iter_mut().for_each(|v| *v *= factor);
        }
        steps.reverse();

        Ok(InductionOutcome {
            option_value,
            exercise_time: state.exercise_time,
            steps,
        })
    }
}

/// Iterator returned by [`BackwardInductionEngine::steps`].
///
/// Yields the terminal state first, then one state per earlier decision
/// period. Stops after the first error.
#[derive(Debug)]
pub struct Steps<'e, 'a> {
    engine: &'e BackwardInductionEngine<'a>,
    state: Option<InductionState>,
    done: bool,
}

impl Iterator for Steps<'_, '_> {
    type Item = Result<(InductionState, StepSummary), LsmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(state) = &self.state else {
            let (state, summary) = self.engine.terminal_state();
            if state.period <= self.engine.first_period {
                self.done = true;
            }
            self.state = Some(state.clone());
            return Some(Ok((state, summary)));
        };

        if state.period <= self.engine.first_period {
            self.done = true;
            return None;
        }

        if let Some(token) = &self.engine.cancellation {
            if token.is_cancelled() {
                self.done = true;
                return Some(Err(LsmError::Cancelled {
                    period: state.period - 1,
                }));
            }
        }

        match self.engine.step(state) {
            Ok((next, summary)) => {
                if next.period <= self.engine.first_period {
                    self.done = true;
                }
                self.state = Some(next.clone());
                Some(Ok((next, summary)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsm::paths::SimulationMatrix;
    use crate::lsm::payoff::AmericanOption;
    use approx::assert_relative_eq;

    fn config(rate: f64, at_inception: bool) -> LsmConfig {
        LsmConfig::builder()
            .risk_free_rate(rate)
            .time_step(1.0)
            .exercise_at_inception(at_inception)
            .build()
            .unwrap()
    }

    fn put_setup(rows: Vec<Vec<f64>>, strike: f64) -> (PathTensor, ProfitMatrix) {
        let underlying = SimulationMatrix::from_rows(rows).unwrap();
        let paths = PathTensor::from_matrix(&underlying);
        let profit = ProfitMatrix::vanilla(
            &underlying,
            &AmericanOption::put(strike),
            ParallelPolicy::sequential(),
        )
        .unwrap();
        (paths, profit)
    }

    #[test]
    fn test_terminal_state() {
        let (paths, profit) = put_setup(vec![vec![1.0, 1.0], vec![0.5, 2.0]], 1.0);
        let cfg = config(0.0, true);
        let engine = BackwardInductionEngine::new(&paths, &profit, &cfg).unwrap();

        let (state, summary) = engine.terminal_state();
        assert_eq!(state.period(), 1);
        assert_eq!(state.option_value(), &[0.5, 0.0]);
        assert_eq!(state.exercise_time(), &[Some(1), None]);
        assert_eq!(summary.exercised, 1);
    }

    #[test]
    fn test_continuation_beats_exercise() {
        // Identical states at t = 0, so continuation is the mean of the
        // carried values: mean(3, 1) = 2 exceeds the immediate profit of 1
        let (paths, profit) = put_setup(vec![vec![1.0, 1.0], vec![-1.0, 1.0]], 2.0);
        let cfg = config(0.0, true);
        let engine = BackwardInductionEngine::new(&paths, &profit, &cfg).unwrap();

        let outcome = engine.run().unwrap();
        assert_eq!(outcome.steps[0].exercised, 0);
        assert_eq!(outcome.exercise_time, vec![Some(1), Some(1)]);
        assert_relative_eq!(outcome.option_value[0], 3.0);
        assert_relative_eq!(outcome.option_value[1], 1.0);
    }

    #[test]
    fn test_steps_iterator_sequence() {
        let (paths, profit) = put_setup(
            vec![vec![1.0, 0.9, 1.1], vec![0.95, 1.05, 0.8], vec![0.7, 1.2, 0.9]],
            1.0,
        );
        let cfg = config(0.05, true);
        let engine = BackwardInductionEngine::new(&paths, &profit, &cfg).unwrap();

        let periods: Vec<usize> = engine
            .steps()
            .map(|item| item.unwrap().0.period())
            .collect();
        assert_eq!(periods, vec![2, 1, 0]);
    }

    #[test]
    fn test_skip_inception_discounts_once_more() {
        let (paths, profit) = put_setup(vec![vec![0.0], vec![0.5]], 1.0);
        let cfg = config(0.1, false);
        let engine = BackwardInductionEngine::new(&paths, &profit, &cfg).unwrap();

        assert_eq!(engine.first_period(), 1);
        let outcome = engine.run().unwrap();
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.exercise_time, vec![Some(1)]);
        assert_relative_eq!(outcome.option_value[0], 0.5 * (-0.1_f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn test_inception_decision_exercises_immediately() {
        // Deep ITM at t = 0 with no upside later
        let (paths, profit) = put_setup(vec![vec![0.0], vec![0.5]], 1.0);
        let cfg = config(0.1, true);
        let outcome = BackwardInductionEngine::new(&paths, &profit, &cfg)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(outcome.exercise_time, vec![Some(0)]);
        assert_eq!(outcome.option_value, vec![1.0]);
    }

    #[test]
    fn test_single_period_requires_inception_decision() {
        let (paths, profit) = put_setup(vec![vec![0.5, 1.5]], 1.0);

        let outcome = BackwardInductionEngine::new(&paths, &profit, &config(0.0, true))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(outcome.option_value, vec![0.5, 0.0]);

        let result = BackwardInductionEngine::new(&paths, &profit, &config(0.0, false));
        assert!(matches!(result, Err(LsmError::InvalidInput(_))));
    }

    #[test]
    fn test_cancellation() {
        let (paths, profit) = put_setup(vec![vec![1.0], vec![0.9], vec![0.8]], 1.0);
        let cfg = config(0.0, true);
        let token = CancellationToken::new();
        token.cancel();

        let engine = BackwardInductionEngine::new(&paths, &profit, &cfg)
            .unwrap()
            .with_cancellation(token);
        assert_eq!(engine.run(), Err(LsmError::Cancelled { period: 1 }));
    }

    #[test]
    fn test_step_at_first_period_fails() {
        let (paths, profit) = put_setup(vec![vec![1.0], vec![0.9]], 1.0);
        let cfg = config(0.0, true);
        let engine = BackwardInductionEngine::new(&paths, &profit, &cfg).unwrap();

        let (terminal, _) = engine.terminal_state();
        let (first, _) = engine.step(&terminal).unwrap();
        assert!(matches!(engine.step(&first), Err(LsmError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_state_variable() {
        let underlying = SimulationMatrix::from_rows(vec![vec![1.0, 1.0], vec![0.9, 1.1]]).unwrap();
        let paths = PathTensor::from_fn(2, 2, 1, |t, s, _| if t == 1 && s == 1 { f64::NAN } else { 1.0 });
        let profit = ProfitMatrix::vanilla(
            &underlying,
            &AmericanOption::put(1.0),
            ParallelPolicy::sequential(),
        )
        .unwrap();

        let result = BackwardInductionEngine::new(&paths, &profit, &config(0.0, true));
        assert!(matches!(
            result,
            Err(LsmError::MissingValue {
                tensor: "state_variables",
                period: 1,
                simulation: 1,
                variable: 0,
            })
        ));
    }

    #[test]
    fn test_profit_shape_mismatch() {
        let (_, profit) = put_setup(vec![vec![1.0, 1.0], vec![0.9, 1.1]], 1.0);
        let paths = PathTensor::from_fn(3, 2, 1, |_, _, _| 1.0);

        let result = BackwardInductionEngine::new(&paths, &profit, &config(0.0, true));
        assert!(matches!(
            result,
            Err(LsmError::ShapeMismatch {
                expected: (3, 2),
                actual: (2, 2),
                ..
            })
        ));
    }
}
