//! Simulated path containers.
//!
//! Path generation is the caller's responsibility. This module only holds
//! already-simulated data in the layouts the backward induction consumes:
//!
//! - [`PathTensor`]: state variables, shape `(periods, simulations, variables)`
//! - [`SimulationMatrix`]: one scalar per period and path, shape `(periods, simulations)`
//!
//! Both are stored period-major so that the cross-section at a period is a
//! contiguous slice.

use lsm_core::types::LsmError;

fn check_dimensions(dims: &[(&str, usize)]) -> Result<(), LsmError> {
    for (name, value) in dims {
        if *value == 0 {
            return Err(LsmError::InvalidInput(format!("{} must be positive", name)));
        }
    }
    Ok(())
}

/// State-variable tensor of shape `(n_periods, n_simulations, n_variables)`.
///
/// Index 0 of the period axis is the valuation date.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::PathTensor;
///
/// let paths = PathTensor::from_fn(3, 2, 2, |t, s, v| (t * 100 + s * 10 + v) as f64);
///
/// assert_eq!(paths.shape(), (3, 2, 2));
/// assert_eq!(paths.value(2, 1, 0), 210.0);
/// assert_eq!(paths.cross_section(1), &[100.0, 101.0, 110.0, 111.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PathTensor {
    n_periods: usize,
    n_simulations: usize,
    n_variables: usize,
    data: Vec<f64>,
}

impl PathTensor {
    /// Wraps a period-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if a dimension is zero and
    /// `LsmError::ShapeMismatch` if the buffer length disagrees with the shape.
    pub fn new(
        n_periods: usize,
        n_simulations: usize,
        n_variables: usize,
        data: Vec<f64>,
    ) -> Result<Self, LsmError> {
        check_dimensions(&[
            ("n_periods", n_periods),
            ("n_simulations", n_simulations),
            ("n_variables", n_variables),
        ])?;
        let expected = n_periods * n_simulations * n_variables;
        if data.len() != expected {
            return Err(LsmError::ShapeMismatch {
                what: "state_variables",
                expected: (expected, 1),
                actual: (data.len(), 1),
            });
        }
        Ok(Self {
            n_periods,
            n_simulations,
            n_variables,
            data,
        })
    }

    /// Builds a tensor by evaluating `f(period, simulation, variable)`.
    ///
    /// # Panics
    ///
    /// Panics if any dimension is zero.
    pub fn from_fn<F>(n_periods: usize, n_simulations: usize, n_variables: usize, f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> f64,
    {
        assert!(
            n_periods > 0 && n_simulations > 0 && n_variables > 0,
            "path tensor dimensions must be positive"
        );
        let mut data = Vec::with_capacity(n_periods * n_simulations * n_variables);
        for t in 0..n_periods {
            for s in 0..n_simulations {
                for v in 0..n_variables {
                    data.push(f(t, s, v));
                }
            }
        }
        Self {
            n_periods,
            n_simulations,
            n_variables,
            data,
        }
    }

    /// Single-variable tensor taking its state from a simulation matrix.
    ///
    /// This is the usual set-up for vanilla options, where the regression
    /// state is the underlying price itself.
    pub fn from_matrix(matrix: &SimulationMatrix) -> Self {
        Self {
            n_periods: matrix.n_periods(),
            n_simulations: matrix.n_simulations(),
            n_variables: 1,
            data: matrix.as_slice().to_vec(),
        }
    }

    /// Returns `(n_periods, n_simulations, n_variables)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_periods, self.n_simulations, self.n_variables)
    }

    /// Number of periods.
    #[inline]
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    /// Number of simulated paths.
    #[inline]
    pub fn n_simulations(&self) -> usize {
        self.n_simulations
    }

    /// Number of state variables.
    #[inline]
    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// State variable `v` on path `s` at period `t`.
    #[inline]
    pub fn value(&self, t: usize, s: usize, v: usize) -> f64 {
        self.data[(t * self.n_simulations + s) * self.n_variables + v]
    }

    /// Cross-section at period `t`, row-major `(n_simulations, n_variables)`.
    #[inline]
    pub fn cross_section(&self, t: usize) -> &[f64] {
        let width = self.n_simulations * self.n_variables;
        &self.data[t * width..(t + 1) * width]
    }

    /// Location `(period, simulation, variable)` of the first NaN or
    /// infinite value, if any.
    pub fn find_missing(&self) -> Option<(usize, usize, usize)> {
        self.data.iter().position(|x| !x.is_finite()).map(|i| {
            let v = i % self.n_variables;
            let s = (i / self.n_variables) % self.n_simulations;
            let t = i / (self.n_variables * self.n_simulations);
            (t, s, v)
        })
    }

    /// Fails with `LsmError::MissingValue` on the first non-finite value.
    pub fn ensure_complete(&self) -> Result<(), LsmError> {
        match self.find_missing() {
            Some((period, simulation, variable)) => Err(LsmError::MissingValue {
                tensor: "state_variables",
                period,
                simulation,
                variable,
            }),
            None => Ok(()),
        }
    }
}

/// Matrix of shape `(n_periods, n_simulations)`.
///
/// Holds the payoff-driving underlying of a vanilla option, the net cash
/// flows of a project, or a profit matrix derived from either.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::SimulationMatrix;
///
/// let m = SimulationMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// assert_eq!(m.shape(), (2, 2));
/// assert_eq!(m.row(1), &[3.0, 4.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationMatrix {
    n_periods: usize,
    n_simulations: usize,
    data: Vec<f64>,
}

impl SimulationMatrix {
    /// Wraps a period-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::InvalidInput` if a dimension is zero and
    /// `LsmError::ShapeMismatch` if the buffer length disagrees with the shape.
    pub fn new(n_periods: usize, n_simulations: usize, data: Vec<f64>) -> Result<Self, LsmError> {
        check_dimensions(&[("n_periods", n_periods), ("n_simulations", n_simulations)])?;
        if data.len() != n_periods * n_simulations {
            return Err(LsmError::ShapeMismatch {
                what: "simulation_matrix",
                expected: (n_periods * n_simulations, 1),
                actual: (data.len(), 1),
            });
        }
        Ok(Self {
            n_periods,
            n_simulations,
            data,
        })
    }

    /// Builds a matrix from one row per period.
    ///
    /// # Errors
    ///
    /// Returns `LsmError::ShapeMismatch` for ragged rows and
    /// `LsmError::InvalidInput` for an empty input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, LsmError> {
        let n_periods = rows.len();
        let n_simulations = rows.first().map_or(0, Vec::len);
        check_dimensions(&[("n_periods", n_periods), ("n_simulations", n_simulations)])?;

        let mut data = Vec::with_capacity(n_periods * n_simulations);
        for row in rows {
            if row.len() != n_simulations {
                return Err(LsmError::ShapeMismatch {
                    what: "simulation_matrix row",
                    expected: (1, n_simulations),
                    actual: (1, row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            n_periods,
            n_simulations,
            data,
        })
    }

    /// Builds a matrix by evaluating `f(period, simulation)`.
    ///
    /// # Panics
    ///
    /// Panics if any dimension is zero.
    pub fn from_fn<F>(n_periods: usize, n_simulations: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        assert!(
            n_periods > 0 && n_simulations > 0,
            "simulation matrix dimensions must be positive"
        );
        let mut data = Vec::with_capacity(n_periods * n_simulations);
        for t in 0..n_periods {
            for s in 0..n_simulations {
                data.push(f(t, s));
            }
        }
        Self {
            n_periods,
            n_simulations,
            data,
        }
    }

    /// Returns `(n_periods, n_simulations)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_periods, self.n_simulations)
    }

    /// Number of periods.
    #[inline]
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    /// Number of simulated paths.
    #[inline]
    pub fn n_simulations(&self) -> usize {
        self.n_simulations
    }

    /// Value on path `s` at period `t`.
    #[inline]
    pub fn value(&self, t: usize, s: usize) -> f64 {
        self.data[t * self.n_simulations + s]
    }

    /// All paths at period `t`.
    #[inline]
    pub fn row(&self, t: usize) -> &[f64] {
        &self.data[t * self.n_simulations..(t + 1) * self.n_simulations]
    }

    /// Underlying period-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Location `(period, simulation)` of the first NaN or infinite value,
    /// if any.
    pub fn find_missing(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|x| !x.is_finite())
            .map(|i| (i / self.n_simulations, i % self.n_simulations))
    }

    /// Fails with `LsmError::MissingValue` naming `tensor` on the first
    /// non-finite value.
    pub fn ensure_complete(&self, tensor: &'static str) -> Result<(), LsmError> {
        match self.find_missing() {
            Some((period, simulation)) => Err(LsmError::MissingValue {
                tensor,
                period,
                simulation,
                variable: 0,
            }),
            None => Ok(()),
        }
    }

    /// Fails with `LsmError::ShapeMismatch` unless the shape matches the
    /// leading dimensions of `paths`.
    pub fn ensure_matches(&self, paths: &PathTensor, what: &'static str) -> Result<(), LsmError> {
        let expected = (paths.n_periods(), paths.n_simulations());
        if self.shape() != expected {
            return Err(LsmError::ShapeMismatch {
                what,
                expected,
                actual: self.shape(),
            });
        }
        Ok(())
    }
}

/// Output of a [`PathSimulator`]: regression state and the matching
/// payoff-driving matrix for the same paths.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedPaths {
    /// State variables used as regressors.
    pub state_variables: PathTensor,
    /// Underlying (vanilla) or net cash flows (real option).
    pub underlying: SimulationMatrix,
}

/// Source of simulated paths.
///
/// Implementations own their random number generation; the engine only
/// consumes the finished arrays.
pub trait PathSimulator {
    /// Produces one batch of paths.
    ///
    /// # Errors
    ///
    /// Implementations report failures as `LsmError`.
    fn simulate(&mut self) -> Result<SimulatedPaths, LsmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_layout() {
        let data: Vec<f64> = (0..12).map(f64::from).collect();
        let paths = PathTensor::new(2, 3, 2, data).unwrap();

        assert_eq!(paths.value(0, 0, 0), 0.0);
        assert_eq!(paths.value(0, 2, 1), 5.0);
        assert_eq!(paths.value(1, 0, 0), 6.0);
        assert_eq!(paths.cross_section(1), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_tensor_rejects_wrong_length() {
        let result = PathTensor::new(2, 3, 2, vec![0.0; 11]);
        assert!(matches!(
            result,
            Err(LsmError::ShapeMismatch {
                expected: (12, 1),
                actual: (11, 1),
                ..
            })
        ));
    }

    #[test]
    fn test_tensor_rejects_zero_dimension() {
        assert!(matches!(
            PathTensor::new(0, 3, 1, vec![]),
            Err(LsmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tensor_find_missing() {
        let paths = PathTensor::from_fn(3, 4, 2, |t, s, v| {
            if (t, s, v) == (2, 1, 1) {
                f64::NAN
            } else {
                1.0
            }
        });

        assert_eq!(paths.find_missing(), Some((2, 1, 1)));
        assert!(matches!(
            paths.ensure_complete(),
            Err(LsmError::MissingValue {
                period: 2,
                simulation: 1,
                variable: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_infinite_values_are_missing() {
        let paths = PathTensor::from_fn(2, 3, 1, |t, s, _| {
            if (t, s) == (1, 2) {
                f64::INFINITY
            } else {
                1.0
            }
        });
        assert_eq!(paths.find_missing(), Some((1, 2, 0)));

        let m = SimulationMatrix::from_rows(vec![vec![1.0, f64::NEG_INFINITY]]).unwrap();
        assert!(matches!(
            m.ensure_complete("net_cash_flow"),
            Err(LsmError::MissingValue {
                tensor: "net_cash_flow",
                period: 0,
                simulation: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_tensor_from_matrix() {
        let m = SimulationMatrix::from_fn(2, 3, |t, s| (t * 3 + s) as f64);
        let paths = PathTensor::from_matrix(&m);
        assert_eq!(paths.shape(), (2, 3, 1));
        assert_eq!(paths.cross_section(1), m.row(1));
    }

    #[test]
    fn test_matrix_from_rows_ragged() {
        let result = SimulationMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(LsmError::ShapeMismatch { .. })));
        assert!(matches!(
            SimulationMatrix::from_rows(vec![]),
            Err(LsmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_matrix_missing_and_shape_checks() {
        let m = SimulationMatrix::from_rows(vec![vec![1.0, 2.0], vec![f64::NAN, 4.0]]).unwrap();
        assert_eq!(m.find_missing(), Some((1, 0)));
        assert!(matches!(
            m.ensure_complete("payoff"),
            Err(LsmError::MissingValue {
                tensor: "payoff",
                period: 1,
                simulation: 0,
                variable: 0,
            })
        ));

        let paths = PathTensor::from_fn(2, 3, 1, |_, _, _| 1.0);
        assert!(matches!(
            m.ensure_matches(&paths, "payoff"),
            Err(LsmError::ShapeMismatch {
                expected: (2, 3),
                actual: (2, 2),
                ..
            })
        ));
    }
}
