//! Polynomial families used as regression bases.
//!
//! Every family is evaluated through its three-term recurrence, so a single
//! pass over the orders `1..=degree` yields all basis values for one
//! observation without recomputing lower orders.
//!
//! | Family | `P_1(x)` | `P_{k+1}(x)` |
//! |--------|----------|--------------|
//! | Power | `x` | `x P_k` |
//! | Laguerre | `1 - x` | `((2k + 1 - x) P_k - k P_{k-1}) / (k + 1)` |
//! | Legendre | `x` | `((2k + 1) x P_k - k P_{k-1}) / (k + 1)` |
//! | Chebyshev | `x` | `2x P_k - P_{k-1}` |
//! | Hermite | `2x` | `2x P_k - 2k P_{k-1}` |
//! | Jacobi | `(α + 1) + (α + β + 2)(x - 1) / 2` | standard Jacobi recurrence |
//!
//! All families have `P_0 = 1`.

use std::fmt;
use std::str::FromStr;

use num_traits::Float;

use crate::types::ConfigError;

/// Polynomial basis family.
///
/// Closed set of families; Jacobi carries its shape parameters.
///
/// # Examples
///
/// ```
/// use lsm_core::math::polynomials::BasisFamily;
///
/// let family: BasisFamily = "laguerre".parse().unwrap();
/// assert_eq!(family, BasisFamily::Laguerre);
///
/// // L_2(x) = (x^2 - 4x + 2) / 2
/// let value: f64 = family.evaluate(1.0, 2);
/// assert!((value + 0.5).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BasisFamily {
    /// Monomials `x^k`.
    #[default]
    Power,
    /// Laguerre polynomials `L_k`.
    Laguerre,
    /// Legendre polynomials `P_k`.
    Legendre,
    /// Chebyshev polynomials of the first kind `T_k`.
    Chebyshev,
    /// Physicists' Hermite polynomials `H_k`.
    Hermite,
    /// Jacobi polynomials `P_k^(α, β)`.
    Jacobi {
        /// Shape parameter α (> -1).
        alpha: f64,
        /// Shape parameter β (> -1).
        beta: f64,
    },
}

impl BasisFamily {
    /// Canonical family names accepted by [`FromStr`].
    pub const NAMES: [&'static str; 6] = [
        "POWER",
        "LAGUERRE",
        "LEGENDRE",
        "CHEBYSHEV",
        "HERMITE",
        "JACOBI",
    ];

    /// Jacobi family with the given shape parameters.
    #[inline]
    pub fn jacobi(alpha: f64, beta: f64) -> Self {
        Self::Jacobi { alpha, beta }
    }

    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Power => "POWER",
            Self::Laguerre => "LAGUERRE",
            Self::Legendre => "LEGENDRE",
            Self::Chebyshev => "CHEBYSHEV",
            Self::Hermite => "HERMITE",
            Self::Jacobi { .. } => "JACOBI",
        }
    }

    /// Checks family parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidParameter` if a Jacobi shape parameter is
    /// not finite or not greater than -1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Jacobi { alpha, beta } = *self {
            for (name, value) in [("jacobi_alpha", alpha), ("jacobi_beta", beta)] {
                if !value.is_finite() || value <= -1.0 {
                    return Err(ConfigError::InvalidParameter {
                        name,
                        value: format!("{} must be finite and greater than -1", value),
                    });
                }
            }
        }
        Ok(())
    }

    /// Writes `P_1(x) ..= P_n(x)` into `out`, where `n = out.len()`.
    ///
    /// The constant `P_0 = 1` is not written; callers add a single
    /// intercept column instead.
    pub fn evaluate_into<T: Float>(&self, x: T, out: &mut [T]) {
        let Some((first, rest)) = out.split_first_mut() else {
            return;
        };

        let one = T::one();
        let mut prev = one;
        let mut cur = self.first_order(x);
        *first = cur;

        // Order of `cur`, carried as T to avoid casts in the recurrence.
        let mut k = one;
        for slot in rest.iter_mut() {
            let next = self.next_order(x, k, prev, cur);
            prev = cur;
            cur = next;
            k = k + one;
            *slot = cur;
        }
    }

    /// Evaluates the single polynomial `P_order(x)`.
    pub fn evaluate<T: Float>(&self, x: T, order: usize) -> T {
        if order == 0 {
            return T::one();
        }
        let mut values = vec![T::zero(); order];
        self.evaluate_into(x, &mut values);
        values[order - 1]
    }

    fn first_order<T: Float>(&self, x: T) -> T {
        let one = T::one();
        let two = one + one;
        match *self {
            Self::Power | Self::Legendre | Self::Chebyshev => x,
            Self::Laguerre => one - x,
            Self::Hermite => two * x,
            Self::Jacobi { alpha, beta } => {
                let a = cast::<T>(alpha);
                let b = cast::<T>(beta);
                (a + one) + (a + b + two) * (x - one) / two
            }
        }
    }

    /// `P_{k+1}` from `P_k` (`cur`) and `P_{k-1}` (`prev`), `k >= 1`.
    fn next_order<T: Float>(&self, x: T, k: T, prev: T, cur: T) -> T {
        let one = T::one();
        let two = one + one;
        match *self {
            Self::Power => cur * x,
            Self::Laguerre => ((two * k + one - x) * cur - k * prev) / (k + one),
            Self::Legendre => ((two * k + one) * x * cur - k * prev) / (k + one),
            Self::Chebyshev => two * x * cur - prev,
            Self::Hermite => two * x * cur - two * k * prev,
            Self::Jacobi { alpha, beta } => {
                let a = cast::<T>(alpha);
                let b = cast::<T>(beta);
                let n = k + one;
                let s = two * n + a + b;
                let c1 = two * n * (n + a + b) * (s - two);
                let c2 = (s - one) * (s * (s - two) * x + a * a - b * b);
                let c3 = two * (n + a - one) * (n + b - one) * s;
                (c2 * cur - c3 * prev) / c1
            }
        }
    }
}

#[inline]
fn cast<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

impl fmt::Display for BasisFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jacobi { alpha, beta } => write!(f, "JACOBI(alpha={}, beta={})", alpha, beta),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for BasisFamily {
    type Err = ConfigError;

    /// Parses a family name case-insensitively. `"JACOBI"` yields the
    /// Legendre-equivalent shape `α = β = 0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POWER" => Ok(Self::Power),
            "LAGUERRE" => Ok(Self::Laguerre),
            "LEGENDRE" => Ok(Self::Legendre),
            "CHEBYSHEV" => Ok(Self::Chebyshev),
            "HERMITE" => Ok(Self::Hermite),
            "JACOBI" => Ok(Self::jacobi(0.0, 0.0)),
            _ => Err(ConfigError::UnknownBasisFamily(s.to_string())),
        }
    }
}

/// Record of a requested degree that had to be rounded down.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DegreeRounding {
    /// Degree as requested.
    pub requested: f64,
    /// Degree actually used.
    pub used: u32,
}

impl fmt::Display for DegreeRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "polynomial degree rounded down from {} to {}",
            self.requested, self.used
        )
    }
}

/// Resolves a requested polynomial degree to an integer order.
///
/// Non-integer degrees are floored; the rounding is returned so that the
/// caller can report it.
///
/// # Errors
///
/// Returns `ConfigError::InvalidDegree` for negative or non-finite values.
///
/// # Examples
///
/// ```
/// use lsm_core::math::polynomials::resolve_degree;
///
/// assert_eq!(resolve_degree(3.0).unwrap(), (3, None));
///
/// let (degree, rounding) = resolve_degree(2.5).unwrap();
/// assert_eq!(degree, 2);
/// assert!(rounding.is_some());
///
/// assert!(resolve_degree(-1.0).is_err());
/// ```
pub fn resolve_degree(requested: f64) -> Result<(u32, Option<DegreeRounding>), ConfigError> {
    if !requested.is_finite() || requested < 0.0 || requested > u32::MAX as f64 {
        return Err(ConfigError::InvalidDegree(requested));
    }
    let used = requested.floor();
    let rounding = (used != requested).then_some(DegreeRounding {
        requested,
        used: used as u32,
    });
    Ok((used as u32, rounding))
}
