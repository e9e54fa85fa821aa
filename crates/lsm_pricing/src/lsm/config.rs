//! Valuation configuration.
//!
//! This module provides configuration types and builders for least-squares
//! Monte Carlo valuation. All engine parameters travel in an explicit
//! [`LsmConfig`]; there is no process-wide default state.

use lsm_core::math::polynomials::{resolve_degree, BasisFamily, DegreeRounding};
use lsm_core::types::ConfigError;
use serde::Serialize;

/// Default number of in-the-money paths above which a backward step builds
/// its design matrix and profit rows in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4_096;

/// Regression basis configuration.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::BasisConfig;
/// use lsm_core::math::BasisFamily;
///
/// let basis = BasisConfig::new(BasisFamily::Laguerre, 3, true);
///
/// // intercept + 2 * 3 polynomial terms + 2 raw variables + 1 cross product
/// assert_eq!(basis.n_columns(2), 10);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BasisConfig {
    family: BasisFamily,
    degree: u32,
    cross_product: bool,
}

impl BasisConfig {
    /// Creates a basis configuration.
    #[inline]
    pub fn new(family: BasisFamily, degree: u32, cross_product: bool) -> Self {
        Self {
            family,
            degree,
            cross_product,
        }
    }

    /// Returns the polynomial family.
    #[inline]
    pub fn family(&self) -> BasisFamily {
        self.family
    }

    /// Returns the polynomial degree.
    #[inline]
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Returns whether pairwise cross products are included.
    #[inline]
    pub fn cross_product(&self) -> bool {
        self.cross_product
    }

    /// Number of design-matrix columns for `n_variables` state variables.
    pub fn n_columns(&self, n_variables: usize) -> usize {
        let cross = if self.cross_product && n_variables > 1 {
            n_variables * (n_variables - 1) / 2
        } else {
            0
        };
        1 + n_variables * self.degree as usize + n_variables + cross
    }

    /// Validates the family parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the Jacobi shape parameters are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.family.validate()
    }
}

impl Default for BasisConfig {
    /// Power basis of degree 2 with cross products.
    fn default() -> Self {
        Self::new(BasisFamily::Power, 2, true)
    }
}

/// Least-squares Monte Carlo configuration.
///
/// Immutable configuration specifying the discounting grid, the regression
/// basis and the exercise boundary policy. Use [`LsmConfigBuilder`] to
/// construct instances.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::LsmConfig;
///
/// let config = LsmConfig::builder()
///     .risk_free_rate(0.06)
///     .time_step(1.0 / 50.0)
///     .basis_name("Laguerre")
///     .degree(3)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.basis().degree(), 3);
/// assert!((config.discount_factor() - (-0.06_f64 / 50.0).exp()).abs() < 1e-15);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LsmConfig {
    /// Continuously compounded risk-free rate.
    risk_free_rate: f64,
    /// Length of one period in years.
    time_step: f64,
    /// Regression basis.
    basis: BasisConfig,
    /// Whether period 0 is itself an exercise decision point.
    exercise_at_inception: bool,
    /// Whether per-step work may use the rayon pool.
    parallel: bool,
    /// Row count above which per-step work is split across threads.
    parallel_threshold: usize,
    /// Set when the requested degree was rounded down.
    degree_rounding: Option<DegreeRounding>,
}

impl LsmConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> LsmConfigBuilder {
        LsmConfigBuilder::default()
    }

    /// Returns the risk-free rate.
    #[inline]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Returns the period length.
    #[inline]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Returns the regression basis.
    #[inline]
    pub fn basis(&self) -> BasisConfig {
        self.basis
    }

    /// Returns whether period 0 is an exercise decision point.
    #[inline]
    pub fn exercise_at_inception(&self) -> bool {
        self.exercise_at_inception
    }

    /// Returns whether parallel per-step work is enabled.
    #[inline]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Returns the parallel row threshold.
    #[inline]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Returns the degree rounding applied at build time, if any.
    #[inline]
    pub fn degree_rounding(&self) -> Option<DegreeRounding> {
        self.degree_rounding
    }

    /// Single-period discount factor `exp(-r Δt)`.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.time_step).exp()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `time_step` is not finite and positive
    /// - `risk_free_rate` is not finite
    /// - the basis family parameters are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "time_step",
                value: format!("{} must be finite and positive", self.time_step),
            });
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "risk_free_rate",
                value: format!("{} must be finite", self.risk_free_rate),
            });
        }
        self.basis.validate()
    }
}

/// Builder for [`LsmConfig`].
///
/// Provides a fluent API with validation at build time. The basis family
/// can be given either as a [`BasisFamily`] value or by name; a name is
/// parsed in [`build`](Self::build) so that an unknown family surfaces as a
/// configuration error.
///
/// # Examples
///
/// ```rust
/// use lsm_pricing::lsm::LsmConfig;
///
/// let config = LsmConfig::builder()
///     .risk_free_rate(0.05)
///     .time_step(0.5)
///     .degree(2.5) // rounded down to 2, reported as a warning
///     .build()
///     .unwrap();
///
/// assert_eq!(config.basis().degree(), 2);
/// assert!(config.degree_rounding().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct LsmConfigBuilder {
    risk_free_rate: Option<f64>,
    time_step: Option<f64>,
    family: BasisFamily,
    family_name: Option<String>,
    degree: f64,
    cross_product: bool,
    exercise_at_inception: bool,
    parallel: bool,
    parallel_threshold: usize,
}

impl Default for LsmConfigBuilder {
    fn default() -> Self {
        let basis = BasisConfig::default();
        Self {
            risk_free_rate: None,
            time_step: None,
            family: basis.family(),
            family_name: None,
            degree: f64::from(basis.degree()),
            cross_product: basis.cross_product(),
            exercise_at_inception: true,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl LsmConfigBuilder {
    /// Sets the continuously compounded risk-free rate.
    #[inline]
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }

    /// Sets the period length in years.
    #[inline]
    pub fn time_step(mut self, time_step: f64) -> Self {
        self.time_step = Some(time_step);
        self
    }

    /// Sets the basis family.
    #[inline]
    pub fn basis(mut self, family: BasisFamily) -> Self {
        self.family = family;
        self.family_name = None;
        self
    }

    /// Sets the basis family by (case-insensitive) name.
    #[inline]
    pub fn basis_name(mut self, name: impl Into<String>) -> Self {
        self.family_name = Some(name.into());
        self
    }

    /// Sets the requested polynomial degree.
    ///
    /// Non-integer values are rounded down at build time.
    #[inline]
    pub fn degree(mut self, degree: impl Into<f64>) -> Self {
        self.degree = degree.into();
        self
    }

    /// Sets whether pairwise cross products of state variables are included.
    #[inline]
    pub fn cross_product(mut self, cross_product: bool) -> Self {
        self.cross_product = cross_product;
        self
    }

    /// Sets whether period 0 is an exercise decision point.
    #[inline]
    pub fn exercise_at_inception(mut self, enabled: bool) -> Self {
        self.exercise_at_inception = enabled;
        self
    }

    /// Enables or disables parallel per-step work.
    #[inline]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the row count above which per-step work runs in parallel.
    #[inline]
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `risk_free_rate` or `time_step` is not set or invalid
    /// - the basis family name is unknown
    /// - the degree is negative or not finite
    /// - Jacobi shape parameters are out of range
    pub fn build(self) -> Result<LsmConfig, ConfigError> {
        let risk_free_rate = self.risk_free_rate.ok_or(ConfigError::InvalidParameter {
            name: "risk_free_rate",
            value: "must be specified".to_string(),
        })?;

        let time_step = self.time_step.ok_or(ConfigError::InvalidParameter {
            name: "time_step",
            value: "must be specified".to_string(),
        })?;

        let family = match &self.family_name {
            Some(name) => name.parse::<BasisFamily>()?,
            None => self.family,
        };

        let (degree, degree_rounding) = resolve_degree(self.degree)?;
        if let Some(rounding) = degree_rounding {
            tracing::warn!(
                requested = rounding.requested,
                used = rounding.used,
                family = family.name(),
                "polynomial degree rounded down"
            );
        }

        let config = LsmConfig {
            risk_free_rate,
            time_step,
            basis: BasisConfig::new(family, degree, self.cross_product),
            exercise_at_inception: self.exercise_at_inception,
            parallel: self.parallel,
            parallel_threshold: self.parallel_threshold,
            degree_rounding,
        };

        config.validate()?;
        Ok(config)
    }
}
