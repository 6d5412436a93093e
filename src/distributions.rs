//! Probability distributions.
//!
//! Validated Normal, Student's-t and chi-squared distribution types with
//! PDF, CDF, survival function and quantile evaluation, plus free
//! functions taking raw parameters for one-off evaluations.
//!
//! | Distribution | Parameters | Support |
//! |---|---|---|
//! | [`Normal`] | μ, σ > 0 | ℝ |
//! | [`StudentT`] | df ≥ 1 | ℝ |
//! | [`ChiSquared`] | df ≥ 1 | [0, ∞) |
//!
//! Quantiles fail with [`StatError::InvalidInput`] for `p` outside the
//! open interval (0, 1). PDFs are defined on the whole real line.

use crate::error::{ensure_finite, ensure_open_unit, Result, StatError};
use crate::special;

/// A continuous univariate distribution.
///
/// The significance and interval engines are written against this trait
/// so Z and T computations share one code path.
pub trait ContinuousDistribution {
    /// Probability density at `x`.
    fn pdf(&self, x: f64) -> f64;

    /// P(X ≤ x).
    fn cdf(&self, x: f64) -> f64;

    /// P(X > x).
    fn sf(&self, x: f64) -> f64 {
        1.0 - self.cdf(x)
    }

    /// Inverse CDF.
    ///
    /// # Errors
    /// [`StatError::InvalidInput`] if `p` is not in (0, 1).
    fn quantile(&self, p: f64) -> Result<f64>;
}

fn ensure_df(df: u32) -> Result<()> {
    if df >= 1 {
        Ok(())
    } else {
        Err(StatError::invalid("degrees of freedom must be at least 1"))
    }
}

// ============================================================================
// Normal Distribution
// ============================================================================

/// Normal (Gaussian) distribution N(μ, σ²).
///
/// # Mathematical Definition
/// - PDF: φ(x) = (1/(σ√(2π))) exp(−(x−μ)²/(2σ²))
/// - CDF: Φ((x−μ)/σ)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mu: f64,
    sigma: f64,
}

impl Normal {
    /// Creates N(μ, σ).
    ///
    /// # Errors
    /// Returns `Err` if `sigma ≤ 0` or either parameter is not finite.
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        ensure_finite("mean", mu)?;
        ensure_finite("standard deviation", sigma)?;
        if sigma <= 0.0 {
            return Err(StatError::invalid(format!(
                "Normal requires σ > 0, got σ={sigma}"
            )));
        }
        Ok(Self { mu, sigma })
    }

    /// The standard normal N(0, 1).
    pub fn standard() -> Self {
        Self { mu: 0.0, sigma: 1.0 }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl ContinuousDistribution for Normal {
    fn pdf(&self, x: f64) -> f64 {
        special::standard_normal_pdf((x - self.mu) / self.sigma) / self.sigma
    }

    fn cdf(&self, x: f64) -> f64 {
        special::standard_normal_cdf((x - self.mu) / self.sigma)
    }

    fn sf(&self, x: f64) -> f64 {
        special::standard_normal_sf((x - self.mu) / self.sigma)
    }

    /// μ + σ·Φ⁻¹(p).
    fn quantile(&self, p: f64) -> Result<f64> {
        ensure_open_unit("probability", p)?;
        Ok(self.mu + self.sigma * special::inverse_normal_cdf(p))
    }
}

// ============================================================================
// Student's t Distribution
// ============================================================================

/// Student's t-distribution with integer degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentT {
    df: u32,
}

impl StudentT {
    /// # Errors
    /// Returns `Err` if `df < 1`.
    pub fn new(df: u32) -> Result<Self> {
        ensure_df(df)?;
        Ok(Self { df })
    }

    pub fn df(&self) -> u32 {
        self.df
    }
}

impl ContinuousDistribution for StudentT {
    fn pdf(&self, x: f64) -> f64 {
        special::t_distribution_pdf(x, f64::from(self.df))
    }

    fn cdf(&self, x: f64) -> f64 {
        special::t_distribution_cdf(x, f64::from(self.df))
    }

    fn sf(&self, x: f64) -> f64 {
        special::t_distribution_sf(x, f64::from(self.df))
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        ensure_open_unit("probability", p)?;
        Ok(special::t_distribution_quantile(p, f64::from(self.df)))
    }
}

// ============================================================================
// Chi-Squared Distribution
// ============================================================================

/// Chi-squared distribution with integer degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChiSquared {
    df: u32,
}

impl ChiSquared {
    /// # Errors
    /// Returns `Err` if `df < 1`.
    pub fn new(df: u32) -> Result<Self> {
        ensure_df(df)?;
        Ok(Self { df })
    }

    pub fn df(&self) -> u32 {
        self.df
    }
}

impl ContinuousDistribution for ChiSquared {
    /// Zero for x < 0.
    fn pdf(&self, x: f64) -> f64 {
        special::chi_squared_pdf(x, f64::from(self.df))
    }

    fn cdf(&self, x: f64) -> f64 {
        special::chi_squared_cdf(x, f64::from(self.df))
    }

    fn sf(&self, x: f64) -> f64 {
        special::chi_squared_sf(x, f64::from(self.df))
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        ensure_open_unit("probability", p)?;
        Ok(special::chi_squared_quantile(p, f64::from(self.df)))
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Normal density at `x`.
///
/// # Examples
/// ```
/// use u_statcalc::distributions::normal_pdf;
/// let peak = normal_pdf(10.0, 10.0, 2.0).unwrap();
/// assert!((peak - 0.3989422804014327 / 2.0).abs() < 1e-15);
/// ```
pub fn normal_pdf(x: f64, mean: f64, std_dev: f64) -> Result<f64> {
    Ok(Normal::new(mean, std_dev)?.pdf(x))
}

pub fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> Result<f64> {
    Ok(Normal::new(mean, std_dev)?.cdf(x))
}

/// # Examples
/// ```
/// use u_statcalc::distributions::normal_quantile;
/// let x = normal_quantile(0.975, 50.0, 10.0).unwrap();
/// assert!((x - 69.59963984540054).abs() < 1e-10);
/// assert!(normal_quantile(1.0, 0.0, 1.0).is_err());
/// ```
pub fn normal_quantile(p: f64, mean: f64, std_dev: f64) -> Result<f64> {
    Normal::new(mean, std_dev)?.quantile(p)
}

pub fn t_pdf(x: f64, df: u32) -> Result<f64> {
    Ok(StudentT::new(df)?.pdf(x))
}

pub fn t_cdf(x: f64, df: u32) -> Result<f64> {
    Ok(StudentT::new(df)?.cdf(x))
}

pub fn t_quantile(p: f64, df: u32) -> Result<f64> {
    StudentT::new(df)?.quantile(p)
}

pub fn chi2_pdf(x: f64, df: u32) -> Result<f64> {
    Ok(ChiSquared::new(df)?.pdf(x))
}

pub fn chi2_cdf(x: f64, df: u32) -> Result<f64> {
    Ok(ChiSquared::new(df)?.cdf(x))
}

pub fn chi2_quantile(p: f64, df: u32) -> Result<f64> {
    ChiSquared::new(df)?.quantile(p)
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn normal_quantile_cdf_roundtrip(
            mu in -100.0_f64..100.0,
            sigma in 0.01_f64..50.0,
            z in -6.0_f64..6.0,
        ) {
            let x = mu + sigma * z;
            let p = normal_cdf(x, mu, sigma).unwrap();
            let x_back = normal_quantile(p, mu, sigma).unwrap();
            let tol = 1e-7 * sigma.max(1.0) * (1.0 + z.abs());
            prop_assert!((x_back - x).abs() < tol, "x={x}, back={x_back}");
        }

        #[test]
        fn t_pdf_non_negative(x in -50.0_f64..50.0, df in 1_u32..200) {
            prop_assert!(t_pdf(x, df).unwrap() >= 0.0);
        }

        #[test]
        fn t_quantile_roundtrip(p in 0.001_f64..0.999, df in 1_u32..100) {
            let t = t_quantile(p, df).unwrap();
            prop_assert!((t_cdf(t, df).unwrap() - p).abs() < 1e-10);
        }

        #[test]
        fn chi2_cdf_monotonic(x1 in 0.0_f64..60.0, x2 in 0.0_f64..60.0, df in 1_u32..30) {
            let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
            prop_assert!(chi2_cdf(lo, df).unwrap() <= chi2_cdf(hi, df).unwrap() + 1e-14);
        }
    }
}
