//! Option contracts and exercise profit.
//!
//! The backward induction only sees a profit matrix: the value received on
//! each path if the option were exercised at each period. This module turns
//! contract terms into that matrix.
//!
//! ## Vanilla options
//!
//! - Call: `max(S_t - K_t, 0)`
//! - Put: `max(K_t - S_t, 0)`
//!
//! ## Real options
//!
//! For a project with net cash flows `NCF_t`, the remaining present value
//! is `RPV_t = NCF_t + δ RPV_{t+1}` (with `RPV_T = NCF_T`). Investing at
//! period `t` costs `CAPEX_t` and, after `c` construction periods, earns
//! the remaining value from `t + c`:
//!
//! ```text
//! profit_t = δ^c RPV_{t+c} - CAPEX_t   if t + c <= T
//!          = -CAPEX_t                  otherwise
//! ```

use std::fmt;

use lsm_core::types::LsmError;
use serde::Serialize;

use super::parallel::ParallelPolicy;
use super::paths::SimulationMatrix;

/// Call or put.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionDirection {
    /// Right to buy at the strike.
    Call,
    /// Right to sell at the strike.
    Put,
}

impl OptionDirection {
    /// Intrinsic value of exercising at `strike` with underlying `spot`.
    #[inline]
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionDirection::Call => (spot - strike).max(0.0),
            OptionDirection::Put => (strike - spot).max(0.0),
        }
    }
}

impl fmt::Display for OptionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionDirection::Call => write!(f, "call"),
            OptionDirection::Put => write!(f, "put"),
        }
    }
}

/// Strike or capital expenditure, constant or per period.
#[derive(Clone, Debug, PartialEq)]
pub enum Strike {
    /// Same amount at every period.
    Scalar(f64),
    /// One amount per period.
    PerPeriod(Vec<f64>),
}

impl Strike {
    /// Amount applicable at period `t`.
    #[inline]
    pub fn at(&self, t: usize) -> f64 {
        match self {
            Strike::Scalar(k) => *k,
            Strike::PerPeriod(ks) => ks[t],
        }
    }

    /// Checks the schedule length and that all amounts are finite.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::ShapeMismatch` if a per-period schedule does not
    /// have `n_periods` entries and `LsmError::InvalidInput` for a
    /// non-finite amount.
    pub fn validate(&self, n_periods: usize, what: &'static str) -> Result<(), LsmError> {
        let amounts: &[f64] = match self {
            Strike::Scalar(k) => std::slice::from_ref(k),
            Strike::PerPeriod(ks) => {
                if ks.len() != n_periods {
                    return Err(LsmError::ShapeMismatch {
                        what,
                        expected: (n_periods, 1),
                        actual: (ks.len(), 1),
                    });
                }
                ks
            }
        };
        if let Some(k) = amounts.iter().find(|k| !k.is_finite()) {
            return Err(LsmError::InvalidInput(format!(
                "{} must be finite, got {}",
                what, k
            )));
        }
        Ok(())
    }
}

impl From<f64> for Strike {
    fn from(k: f64) -> Self {
        Strike::Scalar(k)
    }
}

impl From<Vec<f64>> for Strike {
    fn from(ks: Vec<f64>) -> Self {
        Strike::PerPeriod(ks)
    }
}

/// American-style vanilla option on a simulated underlying.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::{AmericanOption, OptionDirection};
///
/// let put = AmericanOption::put(40.0);
/// assert_eq!(put.direction, OptionDirection::Put);
/// assert_eq!(put.strike.at(7), 40.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AmericanOption {
    /// Call or put.
    pub direction: OptionDirection,
    /// Exercise price.
    pub strike: Strike,
}

impl AmericanOption {
    /// Creates an option.
    #[inline]
    pub fn new(direction: OptionDirection, strike: impl Into<Strike>) -> Self {
        Self {
            direction,
            strike: strike.into(),
        }
    }

    /// American call.
    #[inline]
    pub fn call(strike: impl Into<Strike>) -> Self {
        Self::new(OptionDirection::Call, strike)
    }

    /// American put.
    #[inline]
    pub fn put(strike: impl Into<Strike>) -> Self {
        Self::new(OptionDirection::Put, strike)
    }
}

/// Option to invest in a project.
#[derive(Clone, Debug, PartialEq)]
pub struct RealOption {
    /// Investment cost, paid at the exercise period.
    pub capital_expenditure: Strike,
    /// Periods between investment and the first cash flow earned.
    pub construction_periods: usize,
}

impl RealOption {
    /// Creates a real option.
    #[inline]
    pub fn new(capital_expenditure: impl Into<Strike>, construction_periods: usize) -> Self {
        Self {
            capital_expenditure: capital_expenditure.into(),
            construction_periods,
        }
    }
}

/// Exercise profit for every period and path.
///
/// A path is in the money at a period when its profit is strictly positive.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfitMatrix {
    values: SimulationMatrix,
}

impl ProfitMatrix {
    /// Profit of a vanilla option.
    ///
    /// # Errors
    ///
    /// Returns `LsmError` if the underlying is not finite or the strike
    /// schedule is invalid.
    pub fn vanilla(
        underlying: &SimulationMatrix,
        option: &AmericanOption,
        policy: ParallelPolicy,
    ) -> Result<Self, LsmError> {
        underlying.ensure_complete("payoff")?;
        option.strike.validate(underlying.n_periods(), "strike")?;

        let n_simulations = underlying.n_simulations();
        let mut values = underlying.clone();
        policy.for_each_row(values.as_mut_slice(), n_simulations, |t, row| {
            let strike = option.strike.at(t);
            for x in row.iter_mut() {
                *x = option.direction.intrinsic(*x, strike);
            }
        });

        Ok(Self { values })
    }

    /// Profit of a real option, given the single-period discount factor.
    ///
    /// # Errors
    ///
    /// Returns `LsmError` if the cash flows are not finite or the expenditure
    /// schedule is invalid.
    pub fn real_option(
        net_cash_flow: &SimulationMatrix,
        option: &RealOption,
        discount_factor: f64,
        policy: ParallelPolicy,
    ) -> Result<Self, LsmError> {
        net_cash_flow.ensure_complete("net_cash_flow")?;
        option
            .capital_expenditure
            .validate(net_cash_flow.n_periods(), "capital_expenditure")?;

        let remaining = remaining_present_value(net_cash_flow, discount_factor);
        let (n_periods, n_simulations) = net_cash_flow.shape();
        let c = option.construction_periods;
        let lag_discount = discount_factor.powi(c.min(i32::MAX as usize) as i32);

        let mut values = net_cash_flow.clone();
        policy.for_each_row(values.as_mut_slice(), n_simulations, |t, row| {
            let capex = option.capital_expenditure.at(t);
            if let Some(start) = t.checked_add(c).filter(|&e| e < n_periods) {
                let rpv = remaining.row(start);
                for (x, r) in row.iter_mut().zip(rpv) {
                    *x = lag_discount * r - capex;
                }
            } else {
                row.fill(-capex);
            }
        });

        Ok(Self { values })
    }

    /// Wraps a precomputed profit matrix.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::MissingValue` if the matrix holds a non-finite value.
    pub fn from_matrix(values: SimulationMatrix) -> Result<Self, LsmError> {
        values.ensure_complete("profit")?;
        Ok(Self { values })
    }

    /// Returns `(n_periods, n_simulations)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Profit on all paths at period `t`.
    #[inline]
    pub fn row(&self, t: usize) -> &[f64] {
        self.values.row(t)
    }

    /// Underlying matrix.
    #[inline]
    pub fn as_matrix(&self) -> &SimulationMatrix {
        &self.values
    }
}

/// `RPV_t = NCF_t + δ RPV_{t+1}` computed backwards from the last period.
pub fn remaining_present_value(
    net_cash_flow: &SimulationMatrix,
    discount_factor: f64,
) -> SimulationMatrix {
    let (n_periods, n_simulations) = net_cash_flow.shape();
    let mut rpv = net_cash_flow.clone();
    let data = rpv.as_mut_slice();
    for t in (0..n_periods - 1).rev() {
        let (head, tail) = data.split_at_mut((t + 1) * n_simulations);
        let current = &mut head[t * n_simulations..];
        for (x, next) in current.iter_mut().zip(&tail[..n_simulations]) {
            *x += discount_factor * next;
        }
    }
    rpv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: Vec<Vec<f64>>) -> SimulationMatrix {
        SimulationMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_intrinsic() {
        assert_eq!(OptionDirection::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionDirection::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionDirection::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionDirection::Put.intrinsic(110.0, 100.0), 0.0);
    }

    #[test]
    fn test_vanilla_put_profit() {
        let underlying = matrix(vec![vec![1.0, 1.2], vec![0.9, 1.3]]);
        let profit =
            ProfitMatrix::vanilla(&underlying, &AmericanOption::put(1.1), ParallelPolicy::sequential())
                .unwrap();

        assert_relative_eq!(profit.row(0)[0], 0.1, epsilon = 1e-12);
        assert_eq!(profit.row(0)[1], 0.0);
        assert_relative_eq!(profit.row(1)[0], 0.2, epsilon = 1e-12);
        assert_eq!(profit.row(1)[1], 0.0);
    }

    #[test]
    fn test_vanilla_strike_schedule() {
        let underlying = matrix(vec![vec![10.0], vec![10.0], vec![10.0]]);
        let option = AmericanOption::call(vec![8.0, 9.0, 11.0]);
        let profit =
            ProfitMatrix::vanilla(&underlying, &option, ParallelPolicy::sequential()).unwrap();

        assert_eq!(profit.row(0), &[2.0]);
        assert_eq!(profit.row(1), &[1.0]);
        assert_eq!(profit.row(2), &[0.0]);
    }

    #[test]
    fn test_vanilla_rejects_short_schedule() {
        let underlying = matrix(vec![vec![10.0], vec![10.0]]);
        let result = ProfitMatrix::vanilla(
            &underlying,
            &AmericanOption::call(vec![8.0]),
            ParallelPolicy::sequential(),
        );
        assert!(matches!(
            result,
            Err(LsmError::ShapeMismatch {
                what: "strike",
                expected: (2, 1),
                actual: (1, 1),
            })
        ));
    }

    #[test]
    fn test_vanilla_rejects_missing_underlying() {
        let underlying = matrix(vec![vec![10.0, f64::NAN]]);
        let result =
            ProfitMatrix::vanilla(&underlying, &AmericanOption::put(1.0), ParallelPolicy::sequential());
        assert!(matches!(
            result,
            Err(LsmError::MissingValue {
                tensor: "payoff",
                simulation: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_remaining_present_value() {
        let ncf = matrix(vec![vec![1.0], vec![2.0], vec![4.0]]);
        let rpv = remaining_present_value(&ncf, 0.5);

        assert_relative_eq!(rpv.value(2, 0), 4.0);
        assert_relative_eq!(rpv.value(1, 0), 2.0 + 0.5 * 4.0);
        assert_relative_eq!(rpv.value(0, 0), 1.0 + 0.5 * 4.0);
    }

    #[test]
    fn test_real_option_profit_with_construction_lag() {
        let ncf = matrix(vec![vec![0.0], vec![10.0], vec![10.0], vec![10.0]]);
        let option = RealOption::new(15.0, 1);
        let d = 0.9;
        let profit =
            ProfitMatrix::real_option(&ncf, &option, d, ParallelPolicy::sequential()).unwrap();

        let rpv3 = 10.0;
        let rpv2 = 10.0 + d * rpv3;
        let rpv1 = 10.0 + d * rpv2;
        assert_relative_eq!(profit.row(0)[0], d * rpv1 - 15.0, epsilon = 1e-12);
        assert_relative_eq!(profit.row(1)[0], d * rpv2 - 15.0, epsilon = 1e-12);
        assert_relative_eq!(profit.row(2)[0], d * rpv3 - 15.0, epsilon = 1e-12);
        // Construction would finish after the horizon
        assert_relative_eq!(profit.row(3)[0], -15.0);
    }

    #[test]
    fn test_real_option_lag_beyond_any_horizon() {
        let ncf = matrix(vec![vec![3.0, 4.0], vec![3.0, 4.0]]);
        let option = RealOption::new(5.0, usize::MAX);
        let profit =
            ProfitMatrix::real_option(&ncf, &option, 0.95, ParallelPolicy::sequential()).unwrap();

        for t in 0..2 {
            assert_eq!(profit.row(t), &[-5.0, -5.0]);
        }
    }

    #[test]
    fn test_real_option_capex_schedule() {
        let ncf = matrix(vec![vec![5.0], vec![5.0]]);
        let option = RealOption::new(vec![1.0, 2.0], 0);
        let profit =
            ProfitMatrix::real_option(&ncf, &option, 1.0, ParallelPolicy::sequential()).unwrap();

        assert_relative_eq!(profit.row(0)[0], 10.0 - 1.0);
        assert_relative_eq!(profit.row(1)[0], 5.0 - 2.0);
    }

    #[test]
    fn test_non_finite_strike() {
        let strike = Strike::Scalar(f64::INFINITY);
        assert!(matches!(
            strike.validate(3, "strike"),
            Err(LsmError::InvalidInput(_))
        ));
    }
}
