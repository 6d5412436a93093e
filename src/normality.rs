//! Normality testing.
//!
//! [`shapiro_wilk`] computes the Shapiro-Wilk W statistic and p-value;
//! [`check`] wraps it into the full checker report with a histogram and
//! reference curves for display.
//!
//! # References
//!
//! - Shapiro & Wilk (1965). "An analysis of variance test for normality".
//!   Biometrika, 52(3–4), 591–611.
//! - Royston (1992). "Approximating the Shapiro-Wilk W-test for
//!   non-normality". Statistics and Computing, 2, 117–119.
//! - Royston (1995). "Remark AS R94: A remark on Algorithm AS 181".
//!   Applied Statistics, 44(4), 547–551.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::distributions::Normal;
use crate::error::{Result, StatError, Warning};
use crate::plot::{density_curve, Curve};
use crate::sample::{Histogram, Sample};
use crate::special;

/// p-value above which a sample "looks Normal".
///
/// Fixed at 0.05 and independent of the α a user picks for the
/// significance engine. The two thresholds can disagree; callers that
/// want the user's α should compare `p_value` themselves.
pub const NORMALITY_THRESHOLD: f64 = 0.05;

/// Smallest sample Shapiro-Wilk accepts.
pub const MIN_SIZE: usize = 3;

/// Largest sample the Royston p-value approximation was fitted for.
/// Larger samples are still tested; [`check`] flags their p-value with
/// [`Warning::ApproximatePValue`].
pub const MAX_ACCURATE_SIZE: usize = 5000;

/// Result of the Shapiro-Wilk test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapiroWilk {
    /// W ∈ (0, 1]; values close to 1 suggest normality.
    pub statistic: f64,
    /// Small values reject the null hypothesis of normality.
    pub p_value: f64,
}

impl ShapiroWilk {
    /// `p_value > NORMALITY_THRESHOLD`.
    pub fn looks_normal(&self) -> bool {
        self.p_value > NORMALITY_THRESHOLD
    }
}

/// Shapiro-Wilk normality test, H₀: the data are normally distributed.
///
/// # Algorithm
///
/// Royston's AS R94:
/// 1. Coefficients from Blom-approximated normal order statistics, with
///    polynomial corrections for the outermost one or two
/// 2. W = (Σ aᵢ (x₍ₙ₊₁₋ᵢ₎ − x₍ᵢ₎))² / Σ (xᵢ − x̄)²
/// 3. log transform of 1 − W to an approximate standard normal z
/// 4. p = 1 − Φ(z)
///
/// n = 3 uses the exact distribution of W. Above
/// [`MAX_ACCURATE_SIZE`] the same formulas are applied and the p-value
/// is only approximate.
///
/// # Errors
/// - [`StatError::InvalidInput`] if n < 3.
/// - [`StatError::NumericalDegenerate`] if every value is identical.
///
/// # Examples
/// ```
/// use u_statcalc::normality::shapiro_wilk;
/// use u_statcalc::sample::Sample;
///
/// let sample = Sample::new(vec![-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5]).unwrap();
/// let r = shapiro_wilk(&sample).unwrap();
/// assert!(r.statistic > 0.9);
/// assert!(r.looks_normal());
/// ```
pub fn shapiro_wilk(sample: &Sample) -> Result<ShapiroWilk> {
    let n = sample.len();
    if n < MIN_SIZE {
        return Err(StatError::invalid(format!(
            "Shapiro-Wilk needs at least {MIN_SIZE} values, got {n}"
        )));
    }

    let mut x = sample.values().to_vec();
    x.sort_by(f64::total_cmp);

    if x[n - 1] - x[0] < 1e-300 {
        return Err(StatError::NumericalDegenerate(
            "Shapiro-Wilk is undefined for a sample with zero range".into(),
        ));
    }

    let result = if n == 3 {
        exact_n3(&x)
    } else {
        let a = coefficients(n)?;
        let w = statistic(&x, &a);
        if !(0.0..=1.0 + 1e-10).contains(&w) {
            return Err(StatError::NumericalDegenerate(format!(
                "W statistic {w} outside (0, 1]"
            )));
        }
        let w = w.min(1.0);
        ShapiroWilk {
            statistic: w,
            p_value: p_value(w, n).clamp(0.0, 1.0),
        }
    };

    tracing::debug!(n, w = result.statistic, p = result.p_value, "shapiro-wilk");
    Ok(result)
}

// W has a known distribution for n = 3: p = 1 − (6/π)·acos(√W), W ≥ 3/4.
fn exact_n3(x: &[f64]) -> ShapiroWilk {
    let mean = (x[0] + x[1] + x[2]) / 3.0;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    let numerator = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
    let w = (numerator * numerator / ss).clamp(0.75, 1.0);
    let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
    ShapiroWilk {
        statistic: w,
        p_value: p.clamp(0.0, 1.0),
    }
}

// Royston polynomial coefficients, lowest order first
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Antisymmetric weights a₁..a₍ₙ/₂₎ for the lower half of the order
/// statistics.
fn coefficients(n: usize) -> Result<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    let m: Vec<f64> = (1..=half)
        .map(|i| special::inverse_normal_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    // m is negative in the lower half, so the corrected weights are positive
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let corrected: Vec<f64> = if n <= 5 {
        vec![a1]
    } else {
        vec![a1, poly(&C2, rsn) - m[1] / ssumm2]
    };

    let fac_sq = summ2 - 2.0 * m[..corrected.len()].iter().map(|v| v * v).sum::<f64>();
    let rest = 1.0 - 2.0 * corrected.iter().map(|v| v * v).sum::<f64>();
    if fac_sq <= 0.0 || rest <= 0.0 {
        return Err(StatError::NumericalDegenerate(format!(
            "Shapiro-Wilk coefficients undefined for n = {n}"
        )));
    }
    let fac = (fac_sq / rest).sqrt();

    let mut a = corrected;
    a.extend(m[a.len()..].iter().map(|&mi| -mi / fac));
    Ok(a)
}

fn statistic(x: &[f64], a: &[f64]) -> f64 {
    let n = x.len();
    let sa: f64 = a
        .iter()
        .enumerate()
        .map(|(i, &ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    sa * sa / ss
}

fn p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    let (z, ok) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let s = poly(&C4, nf).exp();
        ((y2 - poly(&C3, nf)) / s, s >= 1e-300)
    } else {
        let ln_n = nf.ln();
        let s = poly(&C6, ln_n).exp();
        ((y - poly(&C5, ln_n)) / s, s >= 1e-300)
    };
    if !ok {
        return 0.0;
    }
    special::standard_normal_sf(z)
}

// ============================================================================
// Checker report
// ============================================================================

/// Everything the normality checker displays for one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityReport {
    pub size: usize,
    pub mean: f64,
    /// Population standard deviation (denominator n).
    pub std_dev: f64,
    /// `None` when the sample has zero spread.
    pub shapiro_wilk: Option<ShapiroWilk>,
    /// `None` when `shapiro_wilk` is.
    pub looks_normal: Option<bool>,
    pub histogram: Histogram,
    /// Normal(0, 1) density over the histogram's range.
    pub reference_curve: Curve,
    /// Normal(mean, std_dev) density; `None` when `std_dev == 0`.
    pub fitted_curve: Option<Curve>,
    pub warnings: Vec<Warning>,
}

/// Builds the checker report for `sample`.
///
/// A zero-spread sample still gets a report: the Shapiro-Wilk result and
/// fitted curve are left out and a [`Warning::DegenerateSpread`] is
/// attached. Samples larger than [`MAX_ACCURATE_SIZE`] are tested and
/// carry a [`Warning::ApproximatePValue`].
///
/// # Errors
/// [`StatError::InvalidInput`] if the sample has fewer than 3 values and
/// a spread, or if `config` is invalid.
pub fn check(sample: &Sample, config: &EngineConfig) -> Result<NormalityReport> {
    config.validate()?;
    let plot = &config.plot;

    let mean = sample.mean();
    let std_dev = sample.population_std_dev();
    let histogram = sample.histogram(plot.histogram_bins)?;
    let (lo, hi) = if sample.max() > sample.min() {
        (sample.min(), sample.max())
    } else {
        (histogram.edges[0], histogram.edges[histogram.edges.len() - 1])
    };
    let reference_curve = density_curve(
        "Normal(0, 1)",
        &Normal::standard(),
        lo,
        hi,
        plot.checker_curve_points,
    );

    let mut warnings = Vec::new();
    let (shapiro_wilk, fitted_curve) = match Normal::new(mean, std_dev) {
        Ok(fitted) if sample.max() > sample.min() => {
            let sw = shapiro_wilk(sample)?;
            if sample.len() > MAX_ACCURATE_SIZE {
                tracing::warn!(n = sample.len(), "Shapiro-Wilk p-value is approximate");
                warnings.push(Warning::ApproximatePValue {
                    detail: format!(
                        "p-value may be inaccurate for more than {MAX_ACCURATE_SIZE} values"
                    ),
                });
            }
            let label = format!("Normal({mean:.4}, {std_dev:.4})");
            let curve = density_curve(label, &fitted, lo, hi, plot.checker_curve_points);
            (Some(sw), Some(curve))
        }
        _ => {
            tracing::warn!(n = sample.len(), "sample has zero spread");
            warnings.push(Warning::DegenerateSpread {
                detail: "all values are identical; normality cannot be assessed".into(),
            });
            (None, None)
        }
    };

    Ok(NormalityReport {
        size: sample.len(),
        mean,
        std_dev,
        looks_normal: shapiro_wilk.map(|sw| sw.looks_normal()),
        shapiro_wilk,
        histogram,
        reference_curve,
        fitted_curve,
        warnings,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn statistic_and_p_bounded(data in proptest::collection::vec(-1e3_f64..1e3, 3..=50)) {
            let s = Sample::new(data).unwrap();
            if let Ok(r) = shapiro_wilk(&s) {
                prop_assert!(r.statistic > 0.0 && r.statistic <= 1.0, "W = {}", r.statistic);
                prop_assert!((0.0..=1.0).contains(&r.p_value), "p = {}", r.p_value);
            }
        }

        #[test]
        fn invariant_under_affine_maps(
            data in proptest::collection::vec(-100.0_f64..100.0, 5..=40),
            shift in -50.0_f64..50.0,
            scale in 0.5_f64..5.0,
        ) {
            let base = Sample::new(data.clone()).unwrap();
            let moved = Sample::new(data.iter().map(|v| v * scale + shift).collect()).unwrap();
            if let (Ok(a), Ok(b)) = (shapiro_wilk(&base), shapiro_wilk(&moved)) {
                prop_assert!((a.statistic - b.statistic).abs() < 1e-8);
            }
        }
    }
}
