//! Valuation results and their aggregation from per-path outcomes.
//!
//! Undefined statistics are reported as `NaN`:
//! - standard errors from fewer than two observations
//! - exercise-time moments when no path was exercised
//! - payback moments when no exercised path paid back
//! - payback probability when no path was exercised

use std::fmt;

use lsm_core::math::polynomials::DegreeRounding;
use lsm_core::math::statistics::{mean, mean_and_standard_error, standard_error};
use lsm_core::types::LsmError;
use serde::Serialize;

use super::induction::{InductionOutcome, StepSummary};
use super::paths::SimulationMatrix;
use super::payoff::{OptionDirection, ProfitMatrix, RealOption};

/// Distribution of exercise decisions across paths.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExerciseStatistics {
    /// Fraction of paths exercised at some period.
    pub exercise_probability: f64,
    /// Mean exercise time in years over exercised paths.
    pub expected_exercise_time: f64,
    /// Standard error of the mean exercise time.
    pub expected_exercise_time_se: f64,
    /// Number of exercises per period.
    pub exercise_counts: Vec<usize>,
    /// `(t Δt, fraction exercised at or before t)` for every period.
    pub cumulative_exercise_probability: Vec<(f64, f64)>,
}

/// Payback of exercised real options.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaybackStatistics {
    /// Mean payback duration in years over paths that paid back.
    pub expected_payback: f64,
    /// Standard error of the mean payback duration.
    pub expected_payback_se: f64,
    /// Paths paid back divided by paths exercised.
    pub payback_probability: f64,
    /// Number of exercised paths that paid back within the horizon.
    pub paid_back: usize,
}

/// Result of valuing an American option.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AmericanOptionResult {
    /// Call or put.
    pub direction: OptionDirection,
    /// Present value.
    pub price: f64,
    /// Standard error of the price estimate.
    pub standard_error: f64,
    /// Number of simulated paths.
    pub number_simulations: usize,
    /// Exercise timing.
    pub exercise: ExerciseStatistics,
    /// Backward step diagnostics in chronological order.
    pub steps: Vec<StepSummary>,
    /// Degree rounding applied to the basis, if any.
    pub degree_rounding: Option<DegreeRounding>,
}

impl AmericanOptionResult {
    /// Returns the 95% confidence interval half-width.
    #[inline]
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.standard_error
    }

    /// Returns the 99% confidence interval half-width.
    #[inline]
    pub fn confidence_99(&self) -> f64 {
        2.576 * self.standard_error
    }
}

impl fmt::Display for AmericanOptionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "American {} option: {:.4} (SE {:.4})",
            self.direction, self.price, self.standard_error
        )
    }
}

/// Result of valuing a real option.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RealOptionResult {
    /// Real option value.
    pub rov: f64,
    /// Standard error of the real option value.
    pub rov_se: f64,
    /// Net present value of investing immediately.
    pub npv: f64,
    /// Standard error of the net present value.
    pub npv_se: f64,
    /// Value of waiting, `rov - npv`.
    pub wov: f64,
    /// Standard error of the value of waiting.
    pub wov_se: f64,
    /// Number of simulated paths.
    pub number_simulations: usize,
    /// Investment timing.
    pub exercise: ExerciseStatistics,
    /// Payback after investment.
    pub payback: PaybackStatistics,
    /// Backward step diagnostics in chronological order.
    pub steps: Vec<StepSummary>,
    /// Degree rounding applied to the basis, if any.
    pub degree_rounding: Option<DegreeRounding>,
}

impl fmt::Display for RealOptionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Real option: ROV {:.4} NPV {:.4} WOV {:.4}",
            self.rov, self.npv, self.wov
        )
    }
}

/// Discounted terminal payoff on the same paths, for comparison with the
/// American value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EuropeanEstimate {
    /// Present value.
    pub price: f64,
    /// Standard error of the price estimate.
    pub standard_error: f64,
}

impl fmt::Display for EuropeanEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "European: {:.4} (SE {:.4})", self.price, self.standard_error)
    }
}

/// Turns per-path induction outcomes into result records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResultAggregator {
    number_periods: usize,
    time_step: f64,
}

impl ResultAggregator {
    /// Creates an aggregator for a grid of `number_periods` periods.
    #[inline]
    pub fn new(number_periods: usize, time_step: f64) -> Self {
        Self {
            number_periods,
            time_step,
        }
    }

    /// Exercise timing statistics.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if an exercise time lies outside
    /// the period grid.
    pub fn exercise_statistics(
        &self,
        exercise_time: &[Option<usize>],
    ) -> Result<ExerciseStatistics, LsmError> {
        let n = exercise_time.len();
        let mut exercise_counts = vec![0usize; self.number_periods];
        let mut times = Vec::new();
        for (s, &t) in exercise_time.iter().enumerate() {
            let Some(t) = t else { continue };
            let count = exercise_counts
                .get_mut(t)
                .ok_or_else(|| self.out_of_grid(s, t))?;
            *count += 1;
            times.push(t as f64 * self.time_step);
        }

        let mut cumulative = 0usize;
        let cumulative_exercise_probability = exercise_counts
            .iter()
            .enumerate()
            .map(|(t, &count)| {
                cumulative += count;
                (t as f64 * self.time_step, cumulative as f64 / n as f64)
            })
            .collect();

        let (expected_exercise_time, expected_exercise_time_se) = mean_and_standard_error(&times);

        Ok(ExerciseStatistics {
            exercise_probability: times.len() as f64 / n as f64,
            expected_exercise_time,
            expected_exercise_time_se,
            exercise_counts,
            cumulative_exercise_probability,
        })
    }

    fn out_of_grid(&self, simulation: usize, period: usize) -> LsmError {
        LsmError::InvalidInput(format!(
            "exercise time {} of simulation {} outside a grid of {} periods",
            period, simulation, self.number_periods
        ))
    }

    /// Result of an American option valuation.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if an exercise time lies outside
    /// the period grid.
    pub fn american(
        &self,
        direction: OptionDirection,
        outcome: InductionOutcome,
        degree_rounding: Option<DegreeRounding>,
    ) -> Result<AmericanOptionResult, LsmError> {
        let (price, standard_error) = mean_and_standard_error(&outcome.option_value);
        let exercise = self.exercise_statistics(&outcome.exercise_time)?;
        Ok(AmericanOptionResult {
            direction,
            price,
            standard_error,
            number_simulations: outcome.option_value.len(),
            exercise,
            steps: outcome.steps,
            degree_rounding,
        })
    }

    /// Result of a real option valuation.
    ///
    /// The NPV is the profit of investing at period 0 on every path.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if an exercise time lies outside
    /// the period grid or the cash flows cover fewer paths than the outcome.
    pub fn real_option(
        &self,
        outcome: InductionOutcome,
        profit: &ProfitMatrix,
        net_cash_flow: &SimulationMatrix,
        option: &RealOption,
        degree_rounding: Option<DegreeRounding>,
    ) -> Result<RealOptionResult, LsmError> {
        let immediate = profit.row(0);
        let (rov, rov_se) = mean_and_standard_error(&outcome.option_value);
        let (npv, npv_se) = mean_and_standard_error(immediate);
        let waiting: Vec<f64> = outcome
            .option_value
            .iter()
            .zip(immediate)
            .map(|(v, p)| v - p)
            .collect();
        let exercise = self.exercise_statistics(&outcome.exercise_time)?;
        let payback = self.payback(&outcome.exercise_time, net_cash_flow, option)?;

        Ok(RealOptionResult {
            rov,
            rov_se,
            npv,
            npv_se,
            wov: rov - npv,
            wov_se: standard_error(&waiting),
            number_simulations: outcome.option_value.len(),
            exercise,
            payback,
            steps: outcome.steps,
            degree_rounding,
        })
    }

    /// Payback statistics of exercised paths.
    ///
    /// Benefits accrue from `e + construction_periods` for a path invested
    /// at period `e`. The path pays back at the first period where the
    /// undiscounted cumulative cash flow since then strictly exceeds the
    /// expenditure paid at `e`; the duration is measured from `e`.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if an exercise time lies outside
    /// the cash-flow grid or the paths disagree with the cash flows.
    pub fn payback(
        &self,
        exercise_time: &[Option<usize>],
        net_cash_flow: &SimulationMatrix,
        option: &RealOption,
    ) -> Result<PaybackStatistics, LsmError> {
        let n_periods = net_cash_flow.n_periods();
        if exercise_time.len() != net_cash_flow.n_simulations() {
            return Err(LsmError::ShapeMismatch {
                what: "exercise_time",
                expected: (net_cash_flow.n_simulations(), 1),
                actual: (exercise_time.len(), 1),
            });
        }
        let mut exercised = 0usize;
        let mut durations = Vec::new();

        for (s, e) in exercise_time.iter().enumerate() {
            let Some(e) = *e else { continue };
            if e >= n_periods {
                return Err(self.out_of_grid(s, e));
            }
            exercised += 1;

            let capex = option.capital_expenditure.at(e);
            let start = e.saturating_add(option.construction_periods);
            let mut cumulative = 0.0;
            for p in start..n_periods {
                cumulative += net_cash_flow.value(p, s);
                if cumulative > capex {
                    durations.push((p - e) as f64 * self.time_step);
                    break;
                }
            }
        }

        let payback_probability = if exercised == 0 {
            f64::NAN
        } else {
            durations.len() as f64 / exercised as f64
        };

        Ok(PaybackStatistics {
            expected_payback: mean(&durations),
            expected_payback_se: standard_error(&durations),
            payback_probability,
            paid_back: durations.len(),
        })
    }

    /// Discounted terminal profit.
    pub fn european(&self, profit: &ProfitMatrix, discount_factor: f64) -> EuropeanEstimate {
        let terminal = self.number_periods - 1;
        let factor = discount_factor.powi(terminal as i32);
        let discounted: Vec<f64> = profit.row(terminal).iter().map(|p| p * factor).collect();
        let (price, standard_error) = mean_and_standard_error(&discounted);
        EuropeanEstimate {
            price,
            standard_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn outcome(option_value: Vec<f64>, exercise_time: Vec<Option<usize>>) -> InductionOutcome {
        InductionOutcome {
            option_value,
            exercise_time,
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_exercise_statistics() {
        let agg = ResultAggregator::new(4, 0.5);
        let stats = agg
            .exercise_statistics(&[Some(1), None, Some(3), Some(1)])
            .unwrap();

        assert_relative_eq!(stats.exercise_probability, 0.75);
        // Times 0.5, 1.5, 0.5
        assert_relative_eq!(stats.expected_exercise_time, 2.5 / 3.0, epsilon = 1e-12);
        assert_eq!(stats.exercise_counts, vec![0, 2, 0, 1]);
        assert_eq!(
            stats.cumulative_exercise_probability,
            vec![(0.0, 0.0), (0.5, 0.5), (1.0, 0.5), (1.5, 0.75)]
        );
    }

    #[test]
    fn test_no_exercise_gives_nan_moments() {
        let agg = ResultAggregator::new(3, 1.0);
        let stats = agg.exercise_statistics(&[None, None]).unwrap();

        assert_eq!(stats.exercise_probability, 0.0);
        assert!(stats.expected_exercise_time.is_nan());
        assert!(stats.expected_exercise_time_se.is_nan());
        assert!(stats
            .cumulative_exercise_probability
            .iter()
            .all(|&(_, p)| p == 0.0));
    }

    #[test]
    fn test_single_exercise_has_nan_se() {
        let stats = ResultAggregator::new(3, 1.0)
            .exercise_statistics(&[Some(2), None])
            .unwrap();
        assert_eq!(stats.expected_exercise_time, 2.0);
        assert!(stats.expected_exercise_time_se.is_nan());
    }

    #[test]
    fn test_exercise_time_outside_grid() {
        let agg = ResultAggregator::new(3, 1.0);
        let result = agg.exercise_statistics(&[Some(1), Some(3)]);
        assert!(matches!(result, Err(LsmError::InvalidInput(msg)) if msg.contains("simulation 1")));

        let result = agg.american(OptionDirection::Put, outcome(vec![1.0], vec![Some(7)]), None);
        assert!(matches!(result, Err(LsmError::InvalidInput(_))));
    }

    #[test]
    fn test_payback_rejects_inconsistent_exercise_times() {
        let ncf = SimulationMatrix::from_rows(vec![vec![5.0], vec![5.0]]).unwrap();
        let option = RealOption::new(1.0, 0);
        let agg = ResultAggregator::new(2, 1.0);

        assert!(matches!(
            agg.payback(&[Some(2)], &ncf, &option),
            Err(LsmError::InvalidInput(_))
        ));
        assert!(matches!(
            agg.payback(&[Some(0), None], &ncf, &option),
            Err(LsmError::ShapeMismatch {
                what: "exercise_time",
                ..
            })
        ));
    }

    #[test]
    fn test_american_result_and_display() {
        let agg = ResultAggregator::new(2, 1.0);
        let result = agg.american(
            OptionDirection::Put,
            outcome(vec![4.0, 0.0, 2.0, 0.0], vec![Some(1), None, Some(1), None]),
            None,
        )
        .unwrap();

        assert_relative_eq!(result.price, 1.5);
        // s² = (6.25 + 2.25 + 0.25 + 2.25) / 3 = 11 / 3
        assert_relative_eq!(result.standard_error, (11.0_f64 / 12.0).sqrt(), epsilon = 1e-12);
        assert_eq!(result.number_simulations, 4);
        assert_relative_eq!(result.confidence_95(), 1.96 * result.standard_error);
        assert_eq!(
            format!("{}", result),
            format!("American put option: 1.5000 (SE {:.4})", result.standard_error)
        );
    }

    #[test]
    fn test_single_path_standard_error_is_nan() {
        let result = ResultAggregator::new(1, 1.0).american(
            OptionDirection::Call,
            outcome(vec![1.0], vec![Some(0)]),
            None,
        )
        .unwrap();
        assert_eq!(result.price, 1.0);
        assert!(result.standard_error.is_nan());
    }

    #[test]
    fn test_payback_hand_case() {
        // Path 0 invests at 0 with one construction period:
        // cash flows from period 1 are 4, 4, 4 against CAPEX 7 -> paid back at 2
        // Path 1 invests at 1: flows 1, 1 never exceed 7
        // Path 2 never invests
        let ncf = SimulationMatrix::from_rows(vec![
            vec![0.0, 0.0, 0.0],
            vec![4.0, 0.0, 0.0],
            vec![4.0, 1.0, 0.0],
            vec![4.0, 1.0, 0.0],
        ])
        .unwrap();
        let option = RealOption::new(7.0, 1);
        let agg = ResultAggregator::new(4, 0.5);

        let payback = agg
            .payback(&[Some(0), Some(1), None], &ncf, &option)
            .unwrap();

        assert_eq!(payback.paid_back, 1);
        assert_relative_eq!(payback.expected_payback, 1.0);
        assert!(payback.expected_payback_se.is_nan());
        assert_relative_eq!(payback.payback_probability, 0.5);
    }

    #[test]
    fn test_payback_exact_capex_is_not_enough() {
        let ncf = SimulationMatrix::from_rows(vec![vec![5.0], vec![5.0]]).unwrap();
        let option = RealOption::new(10.0, 0);
        let payback = ResultAggregator::new(2, 1.0)
            .payback(&[Some(0)], &ncf, &option)
            .unwrap();
        assert_eq!(payback.paid_back, 0);
        assert_eq!(payback.payback_probability, 0.0);
        assert!(payback.expected_payback.is_nan());
    }

    #[test]
    fn test_payback_without_exercise() {
        let ncf = SimulationMatrix::from_rows(vec![vec![5.0], vec![5.0]]).unwrap();
        let option = RealOption::new(1.0, 0);
        let payback = ResultAggregator::new(2, 1.0)
            .payback(&[None], &ncf, &option)
            .unwrap();
        assert!(payback.payback_probability.is_nan());
    }

    #[test]
    fn test_american_result_serialises() {
        let result = ResultAggregator::new(2, 0.5)
            .american(
                OptionDirection::Put,
                outcome(vec![2.0], vec![Some(1)]),
                Some(DegreeRounding {
                    requested: 2.5,
                    used: 2,
                }),
            )
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["direction"], "put");
        assert_eq!(json["price"], 2.0);
        // Undefined statistics become null
        assert!(json["standard_error"].is_null());
        assert_eq!(json["exercise"]["exercise_counts"], serde_json::json!([0, 1]));
        assert_eq!(json["degree_rounding"]["used"], 2);
    }

    #[test]
    fn test_real_option_value_of_waiting() {
        let ncf = SimulationMatrix::from_rows(vec![vec![0.0, 0.0], vec![10.0, 2.0]]).unwrap();
        let profit = ProfitMatrix::from_matrix(
            SimulationMatrix::from_rows(vec![vec![4.0, -4.0], vec![5.0, -3.0]]).unwrap(),
        )
        .unwrap();
        let option = RealOption::new(5.0, 0);
        let agg = ResultAggregator::new(2, 1.0);

        let result = agg.real_option(
            outcome(vec![5.0, 0.0], vec![Some(1), None]),
            &profit,
            &ncf,
            &option,
            None,
        )
        .unwrap();

        assert_relative_eq!(result.npv, 0.0);
        assert_relative_eq!(result.rov, 2.5);
        assert_relative_eq!(result.wov, 2.5);
        // Differences 1 and 4
        assert_relative_eq!(result.wov_se, 1.5, epsilon = 1e-12);
        assert_eq!(result.payback.paid_back, 1);
        assert_eq!(
            format!("{}", result),
            "Real option: ROV 2.5000 NPV 0.0000 WOV 2.5000"
        );
    }

    #[test]
    fn test_european_discounts_terminal_profit() {
        let profit = ProfitMatrix::from_matrix(
            SimulationMatrix::from_rows(vec![vec![9.0, 9.0], vec![0.0, 0.0], vec![2.0, 4.0]])
                .unwrap(),
        )
        .unwrap();
        let estimate = ResultAggregator::new(3, 1.0).european(&profit, 0.5);
        assert_relative_eq!(estimate.price, 0.75);
        assert_relative_eq!(estimate.standard_error, 0.25, epsilon = 1e-12);
    }
}
