//! Confidence intervals for a mean or a proportion.
//!
//! Both estimators are `centre ± critical × SE`:
//!
//! | Estimate | SE | Critical value |
//! |---|---|---|
//! | mean | σ / √n | z₁₋α/₂ if n ≥ 30, else t₁₋α/₂(n − 1) |
//! | proportion | √(p̂(1 − p̂)/n) | z₁₋α/₂ |
//!
//! The proportion interval is the large-sample Wald approximation. It
//! can extend past [0, 1] and collapses to a point when p̂ is 0 or 1;
//! bounds are reported as computed and [`Interval::clamped`] is there for
//! callers who want them clipped.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::distributions::{ContinuousDistribution, Normal, StudentT};
use crate::error::{ensure_finite, Result, StatError, Warning};
use crate::plot::{density_curve, Curve, Marker, ShadedArea};

/// Sample size from which the mean interval switches to the Normal quantile.
pub const LARGE_SAMPLE_SIZE: usize = 30;

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// Inclusive at both ends.
    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// The interval with both bounds clamped to `[min, max]`.
    ///
    /// # Examples
    /// ```
    /// use u_statcalc::interval::Interval;
    /// let i = Interval { lower: -0.05, upper: 0.3 };
    /// assert_eq!(i.clamped(0.0, 1.0), Interval { lower: 0.0, upper: 0.3 });
    /// ```
    pub fn clamped(&self, min: f64, max: f64) -> Self {
        Self {
            lower: self.lower.clamp(min, max),
            upper: self.upper.clamp(min, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimateKind {
    Mean,
    Proportion,
}

/// A computed confidence interval and its ingredients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalEstimate {
    pub kind: EstimateKind,
    /// Sample mean or sample proportion p̂.
    pub estimate: f64,
    /// Percent, in (0, 100).
    pub confidence: f64,
    pub interval: Interval,
    pub standard_error: f64,
    pub critical_value: f64,
    pub margin_of_error: f64,
    pub probe: Option<f64>,
    /// Whether `probe` lies in `interval`; `None` without a probe.
    pub probe_within: Option<bool>,
}

fn alpha_from_confidence(confidence: f64) -> Result<f64> {
    if confidence.is_finite() && confidence > 0.0 && confidence < 100.0 {
        Ok(1.0 - confidence / 100.0)
    } else {
        Err(StatError::invalid(format!(
            "confidence level must be strictly between 0 and 100, got {confidence}"
        )))
    }
}

fn build(
    kind: EstimateKind,
    estimate: f64,
    confidence: f64,
    standard_error: f64,
    critical_value: f64,
    probe: Option<f64>,
) -> IntervalEstimate {
    let margin_of_error = critical_value * standard_error;
    let interval = Interval {
        lower: estimate - margin_of_error,
        upper: estimate + margin_of_error,
    };
    let probe_within = probe.map(|x| interval.contains(x));
    tracing::debug!(
        ?kind,
        estimate,
        confidence,
        lower = interval.lower,
        upper = interval.upper,
        "computed confidence interval"
    );
    IntervalEstimate {
        kind,
        estimate,
        confidence,
        interval,
        standard_error,
        critical_value,
        margin_of_error,
        probe,
        probe_within,
    }
}

/// Confidence interval for a population mean.
///
/// Uses the Normal quantile when `size >= 30` and Student's t with
/// `size - 1` degrees of freedom below that.
///
/// # Errors
/// [`StatError::InvalidInput`] if `mean`, `std_dev` or `probe` is not
/// finite, `std_dev < 0`, `size == 0`, `size == 1` (no degrees of
/// freedom for t), or `confidence` is not in (0, 100).
///
/// # Examples
/// ```
/// use u_statcalc::interval::mean_interval;
/// let est = mean_interval(50.0, 10.0, 100, 95.0, Some(51.0)).unwrap();
/// assert!((est.interval.lower - 48.04).abs() < 1e-2);
/// assert!((est.interval.upper - 51.96).abs() < 1e-2);
/// assert_eq!(est.probe_within, Some(true));
/// ```
pub fn mean_interval(
    mean: f64,
    std_dev: f64,
    size: usize,
    confidence: f64,
    probe: Option<f64>,
) -> Result<IntervalEstimate> {
    ensure_finite("mean", mean)?;
    ensure_finite("standard deviation", std_dev)?;
    if std_dev < 0.0 {
        return Err(StatError::invalid(format!(
            "standard deviation must be non-negative, got {std_dev}"
        )));
    }
    if size == 0 {
        return Err(StatError::invalid("sample size must be at least 1"));
    }
    if let Some(x) = probe {
        ensure_finite("probe", x)?;
    }
    let alpha = alpha_from_confidence(confidence)?;

    let q = 1.0 - alpha / 2.0;
    let critical_value = if size >= LARGE_SAMPLE_SIZE {
        Normal::standard().quantile(q)?
    } else {
        let df = u32::try_from(size - 1)
            .map_err(|_| StatError::invalid(format!("sample size {size} too large")))?;
        StudentT::new(df)?.quantile(q)?
    };
    let standard_error = std_dev / (size as f64).sqrt();
    Ok(build(
        EstimateKind::Mean,
        mean,
        confidence,
        standard_error,
        critical_value,
        probe,
    ))
}

/// Wald confidence interval for a population proportion.
///
/// # Errors
/// [`StatError::InvalidInput`] if `trials == 0`, `successes > trials`,
/// `confidence` is not in (0, 100), or `probe` is outside [0, 1].
///
/// # Examples
/// ```
/// use u_statcalc::interval::proportion_interval;
/// let est = proportion_interval(40, 100, 95.0, None).unwrap();
/// assert!((est.interval.lower - 0.304).abs() < 1e-3);
/// assert!((est.interval.upper - 0.496).abs() < 1e-3);
/// ```
pub fn proportion_interval(
    successes: u64,
    trials: u64,
    confidence: f64,
    probe: Option<f64>,
) -> Result<IntervalEstimate> {
    if trials == 0 {
        return Err(StatError::invalid("number of trials must be at least 1"));
    }
    if successes > trials {
        return Err(StatError::invalid(format!(
            "successes ({successes}) cannot exceed trials ({trials})"
        )));
    }
    if let Some(x) = probe {
        if !(0.0..=1.0).contains(&x) {
            return Err(StatError::invalid(format!(
                "proportion to check must lie in [0, 1], got {x}"
            )));
        }
    }
    let alpha = alpha_from_confidence(confidence)?;

    let n = trials as f64;
    let p_hat = successes as f64 / n;
    let standard_error = (p_hat * (1.0 - p_hat) / n).sqrt();
    let critical_value = Normal::standard().quantile(1.0 - alpha / 2.0)?;
    Ok(build(
        EstimateKind::Proportion,
        p_hat,
        confidence,
        standard_error,
        critical_value,
        probe,
    ))
}

// ============================================================================
// Plot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalPlot {
    /// Normal(estimate, SE) density; `None` when SE is 0.
    pub curve: Option<Curve>,
    pub interval_area: Option<ShadedArea>,
    /// Lower bound, upper bound, estimate and (if any) probe.
    pub markers: Vec<Marker>,
    pub warnings: Vec<Warning>,
}

/// Describes the plot for a confidence interval.
///
/// A mean is drawn over `[lower - padding, upper + padding]`, a
/// proportion over `[0, 1]`.
///
/// # Errors
/// [`StatError::InvalidInput`] if `config` is invalid.
pub fn interval_plot(estimate: &IntervalEstimate, config: &EngineConfig) -> Result<IntervalPlot> {
    config.validate()?;
    let plot = &config.plot;
    let Interval { lower, upper } = estimate.interval;

    let (start, end, centre_label) = match estimate.kind {
        EstimateKind::Mean => (
            lower - plot.interval_padding,
            upper + plot.interval_padding,
            "Mean",
        ),
        EstimateKind::Proportion => (0.0, 1.0, "Proportion"),
    };

    let mut markers = vec![
        Marker::vertical(format!("Lower bound ({lower:.2})"), lower),
        Marker::vertical(format!("Upper bound ({upper:.2})"), upper),
        Marker::vertical(
            format!("{centre_label} ({:.2})", estimate.estimate),
            estimate.estimate,
        ),
    ];
    if let Some(x) = estimate.probe {
        markers.push(Marker::vertical(format!("Value to check ({x:.2})"), x));
    }

    let mut warnings = Vec::new();
    let (curve, interval_area) = match Normal::new(estimate.estimate, estimate.standard_error) {
        Ok(dist) => {
            let curve = density_curve(
                "Sampling distribution",
                &dist,
                start,
                end,
                plot.interval_curve_points,
            );
            let area = ShadedArea::under(&curve, "Confidence interval", lower, upper);
            (Some(curve), Some(area))
        }
        Err(_) => {
            tracing::warn!(estimate = estimate.estimate, "standard error is zero");
            warnings.push(Warning::DegenerateSpread {
                detail: "standard error is zero; the sampling distribution is a point mass".into(),
            });
            (None, None)
        }
    };

    Ok(IntervalPlot {
        curve,
        interval_area,
        markers,
        warnings,
    })
}
