//! Valuation settings loaded from TOML files and environment variables.
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`LSM_*`)
//! 2. Settings file
//! 3. Default values
//!
//! # Examples
//!
//! ```rust
//! use lsm_pricing::settings::LsmSettings;
//!
//! let settings = LsmSettings::from_toml_str(r#"
//!     risk_free_rate = 0.06
//!     time_step = 0.02
//!     basis = "laguerre"
//!     degree = 3
//! "#).unwrap();
//!
//! let config = settings.into_config().unwrap();
//! assert_eq!(config.basis().degree(), 3);
//! ```

use std::path::Path;
use std::str::FromStr;

use lsm_core::math::polynomials::BasisFamily;
use lsm_core::types::ConfigError;
use serde::Deserialize;

use crate::lsm::config::{LsmConfig, DEFAULT_PARALLEL_THRESHOLD};

/// Environment variable overriding the risk-free rate.
pub const ENV_RISK_FREE_RATE: &str = "LSM_RISK_FREE_RATE";
/// Environment variable overriding the period length.
pub const ENV_TIME_STEP: &str = "LSM_TIME_STEP";
/// Environment variable overriding the basis family name.
pub const ENV_BASIS: &str = "LSM_BASIS";
/// Environment variable overriding the polynomial degree.
pub const ENV_DEGREE: &str = "LSM_DEGREE";
/// Environment variable overriding cross products.
pub const ENV_CROSS_PRODUCT: &str = "LSM_CROSS_PRODUCT";
/// Environment variable overriding parallel execution.
pub const ENV_PARALLEL: &str = "LSM_PARALLEL";

/// Serialisable valuation settings.
///
/// Unlike [`LsmConfig`] the rate and time step are optional here, so a
/// file may leave them to the environment; [`into_config`](Self::into_config)
/// rejects settings where either is still missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LsmSettings {
    /// Continuously compounded risk-free rate.
    pub risk_free_rate: Option<f64>,
    /// Period length in years.
    pub time_step: Option<f64>,
    /// Basis family name.
    pub basis: String,
    /// Requested polynomial degree, possibly fractional.
    pub degree: f64,
    /// Whether pairwise cross products are included.
    pub cross_product: bool,
    /// Jacobi `α` (ignored for other families).
    pub jacobi_alpha: f64,
    /// Jacobi `β` (ignored for other families).
    pub jacobi_beta: f64,
    /// Whether period 0 is an exercise decision point.
    pub exercise_at_inception: bool,
    /// Whether per-step work may run in parallel.
    pub parallel: bool,
    /// Row count above which per-step work runs in parallel.
    pub parallel_threshold: usize,
}

impl Default for LsmSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: None,
            time_step: None,
            basis: BasisFamily::Power.name().to_string(),
            degree: 2.0,
            cross_product: true,
            jacobi_alpha: 0.0,
            jacobi_beta: 0.0,
            exercise_at_inception: true,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl LsmSettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FileError` on malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FileError` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileError(format!("Failed to read settings file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Default settings with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Applies `LSM_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` if a variable cannot be parsed.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Keys are the `LSM_*` variable names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` if a value cannot be parsed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rate) = lookup(ENV_RISK_FREE_RATE) {
            self.risk_free_rate = Some(parse_value("risk_free_rate", &rate)?);
        }
        if let Some(dt) = lookup(ENV_TIME_STEP) {
            self.time_step = Some(parse_value("time_step", &dt)?);
        }
        if let Some(basis) = lookup(ENV_BASIS) {
            self.basis = basis.trim().to_string();
        }
        if let Some(degree) = lookup(ENV_DEGREE) {
            self.degree = parse_value("degree", &degree)?;
        }
        if let Some(cross) = lookup(ENV_CROSS_PRODUCT) {
            self.cross_product = parse_flag("cross_product", &cross)?;
        }
        if let Some(parallel) = lookup(ENV_PARALLEL) {
            self.parallel = parse_flag("parallel", &parallel)?;
        }
        Ok(self)
    }

    /// Validates the settings and builds an engine configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the rate or time step is missing, the basis
    /// name is unknown, or any value is out of range.
    pub fn into_config(self) -> Result<LsmConfig, ConfigError> {
        let family = match BasisFamily::from_str(&self.basis)? {
            BasisFamily::Jacobi { .. } => BasisFamily::jacobi(self.jacobi_alpha, self.jacobi_beta),
            other => other,
        };

        let mut builder = LsmConfig::builder()
            .basis(family)
            .degree(self.degree)
            .cross_product(self.cross_product)
            .exercise_at_inception(self.exercise_at_inception)
            .parallel(self.parallel)
            .parallel_threshold(self.parallel_threshold);
        if let Some(rate) = self.risk_free_rate {
            builder = builder.risk_free_rate(rate);
        }
        if let Some(dt) = self.time_step {
            builder = builder.time_step(dt);
        }
        builder.build()
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidParameter {
        name,
        value: format!("cannot parse '{}'", raw),
    })
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidParameter {
            name,
            value: format!("cannot parse '{}' as a flag", raw),
        }),
    }
}
