//! Significance tests for Z, Student's-t and χ² statistics.
//!
//! [`evaluate`] turns a test statistic and a significance level α into a
//! p-value, the critical value(s), the rejection region and a decision.
//! Rejection regions are centred on the critical values and depend only
//! on α, the degrees of freedom and the tail, never on the statistic.
//!
//! # Examples
//! ```
//! use u_statcalc::significance::{evaluate, SignificanceTest, Tail};
//!
//! let test = SignificanceTest::T { statistic: 2.0, df: 10, tail: Tail::TwoTailed };
//! let result = evaluate(&test, 0.05).unwrap();
//! assert!((result.p_value - 0.0734).abs() < 1e-4);
//! assert!(!result.reject_null);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::distributions::{ChiSquared, ContinuousDistribution, Normal, StudentT};
use crate::error::{ensure_finite, ensure_open_unit, Result, StatError};
use crate::plot::{density_curve, Curve, Marker, ShadedArea};

/// Relative width of the band below α inside which a p-value is treated
/// as a tie with α and does not reject.
///
/// At α = 0.05 the band is 5e-5, half of a four-decimal display unit, so
/// z = 1.96 (p = 0.049996, shown as 0.0500) is not rejected. A statistic
/// sitting exactly on a critical value lands inside the band regardless
/// of rounding in the quantile.
pub const P_VALUE_TIE_TOLERANCE: f64 = 1e-3;

/// Which tail(s) of the reference distribution count as extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tail {
    TwoTailed,
    LeftTailed,
    RightTailed,
}

impl FromStr for Tail {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "two" | "two-tailed" | "both" => Ok(Tail::TwoTailed),
            "left" | "left-tailed" | "lower" => Ok(Tail::LeftTailed),
            "right" | "right-tailed" | "upper" => Ok(Tail::RightTailed),
            other => Err(StatError::invalid(format!(
                "unknown tail {other:?}, expected two, left or right"
            ))),
        }
    }
}

impl fmt::Display for Tail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tail::TwoTailed => "two-tailed",
            Tail::LeftTailed => "left-tailed",
            Tail::RightTailed => "right-tailed",
        })
    }
}

/// A test statistic together with its reference distribution.
///
/// χ² is right-tailed only and takes no tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SignificanceTest {
    Z { statistic: f64, tail: Tail },
    T { statistic: f64, df: u32, tail: Tail },
    ChiSquare { statistic: f64, df: u32 },
}

impl SignificanceTest {
    pub fn statistic(&self) -> f64 {
        match *self {
            SignificanceTest::Z { statistic, .. }
            | SignificanceTest::T { statistic, .. }
            | SignificanceTest::ChiSquare { statistic, .. } => statistic,
        }
    }

    pub fn tail(&self) -> Tail {
        match *self {
            SignificanceTest::Z { tail, .. } | SignificanceTest::T { tail, .. } => tail,
            SignificanceTest::ChiSquare { .. } => Tail::RightTailed,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SignificanceTest::Z { .. } => "Z",
            SignificanceTest::T { .. } => "T",
            SignificanceTest::ChiSquare { .. } => "Chi-square",
        }
    }
}

/// An open interval `(lower, upper)`; either end may be infinite.
///
/// Infinite ends serialise as `null` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub lower: f64,
    pub upper: f64,
}

impl Region {
    pub fn below(upper: f64) -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper,
        }
    }

    pub fn above(lower: f64) -> Self {
        Self {
            lower,
            upper: f64::INFINITY,
        }
    }

    /// Strict containment; the end points are outside.
    pub fn contains(&self, x: f64) -> bool {
        self.lower < x && x < self.upper
    }
}

/// Outcome of a significance test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub alpha: f64,
    pub p_value: f64,
    /// One value for a one-sided test, `[lower, upper]` for two-tailed.
    pub critical_values: Vec<f64>,
    /// Disjoint, ascending.
    pub rejection_region: Vec<Region>,
    /// `p_value < alpha` outside the tie band of
    /// [`P_VALUE_TIE_TOLERANCE`]. A statistic just past a critical value
    /// has its p-value inside the band, so this can be `false` while
    /// [`TestResult::in_rejection_region`] is `true`.
    pub reject_null: bool,
}

impl TestResult {
    /// Whether `x` lies strictly inside the rejection region.
    ///
    /// This is a geometric test for plotting. It is not the decision:
    /// within the tie band just beyond a critical value it returns `true`
    /// while `reject_null` is `false`.
    pub fn in_rejection_region(&self, x: f64) -> bool {
        self.rejection_region.iter().any(|r| r.contains(x))
    }
}

/// Computes the p-value, critical values, rejection region and decision.
///
/// | Tail | p-value | Region |
/// |---|---|---|
/// | two | 2·P(X > \|x\|) | (−∞, −c) ∪ (c, ∞), c = F⁻¹(1 − α/2) |
/// | left | P(X ≤ x) | (−∞, c), c = F⁻¹(α) |
/// | right | P(X > x) | (c, ∞), c = F⁻¹(1 − α) |
///
/// H₀ is rejected when `p < α`, outside the tie band described on
/// [`P_VALUE_TIE_TOLERANCE`].
///
/// # Errors
/// [`StatError::InvalidInput`] if α is not in (0, 1), the statistic is
/// not finite, df < 1, or a χ² statistic is negative.
pub fn evaluate(test: &SignificanceTest, alpha: f64) -> Result<TestResult> {
    ensure_open_unit("alpha", alpha)?;
    let statistic = test.statistic();
    ensure_finite("statistic", statistic)?;

    let (p_value, critical_values, rejection_region) = match *test {
        SignificanceTest::Z { tail, .. } => tailed(&Normal::standard(), statistic, tail, alpha)?,
        SignificanceTest::T { df, tail, .. } => {
            tailed(&StudentT::new(df)?, statistic, tail, alpha)?
        }
        SignificanceTest::ChiSquare { df, .. } => {
            if statistic < 0.0 {
                return Err(StatError::invalid(format!(
                    "chi-square statistic must be non-negative, got {statistic}"
                )));
            }
            tailed(&ChiSquared::new(df)?, statistic, Tail::RightTailed, alpha)?
        }
    };
    let p_value = p_value.clamp(0.0, 1.0);
    let reject_null = p_value < alpha * (1.0 - P_VALUE_TIE_TOLERANCE);

    tracing::debug!(
        test = test.name(),
        tail = %test.tail(),
        statistic,
        alpha,
        p_value,
        reject_null,
        "evaluated significance test"
    );

    Ok(TestResult {
        statistic,
        alpha,
        p_value,
        critical_values,
        rejection_region,
        reject_null,
    })
}

// Two-tailed regions mirror the upper critical value, which is only
// valid for the symmetric Z and T references.
fn tailed<D: ContinuousDistribution + ?Sized>(
    dist: &D,
    x: f64,
    tail: Tail,
    alpha: f64,
) -> Result<(f64, Vec<f64>, Vec<Region>)> {
    Ok(match tail {
        Tail::TwoTailed => {
            let c = dist.quantile(1.0 - alpha / 2.0)?;
            let p = 2.0 * dist.sf(x.abs());
            (p, vec![-c, c], vec![Region::below(-c), Region::above(c)])
        }
        Tail::LeftTailed => {
            let c = dist.quantile(alpha)?;
            (dist.cdf(x), vec![c], vec![Region::below(c)])
        }
        Tail::RightTailed => {
            let c = dist.quantile(1.0 - alpha)?;
            (dist.sf(x), vec![c], vec![Region::above(c)])
        }
    })
}

// ============================================================================
// Plot
// ============================================================================

/// Reference density, shaded rejection areas and statistic marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestPlot {
    pub curve: Curve,
    /// Rejection regions clipped to the plotted range.
    pub rejection_areas: Vec<ShadedArea>,
    pub critical_markers: Vec<Marker>,
    /// At (statistic, density at statistic).
    pub statistic_marker: Marker,
}

/// Describes the plot for an evaluated test.
///
/// Z and T are drawn over `[-test_half_width, test_half_width]`. χ² is
/// drawn from 0 to `chi_square_upper`, extended so the critical value
/// and the statistic stay on the plot.
///
/// # Errors
/// [`StatError::InvalidInput`] for invalid df or configuration.
pub fn test_plot(
    test: &SignificanceTest,
    result: &TestResult,
    config: &EngineConfig,
) -> Result<TestPlot> {
    config.validate()?;
    let plot = &config.plot;
    let statistic = test.statistic();

    let dist: Box<dyn ContinuousDistribution> = match *test {
        SignificanceTest::Z { .. } => Box::new(Normal::standard()),
        SignificanceTest::T { df, .. } => Box::new(StudentT::new(df)?),
        SignificanceTest::ChiSquare { df, .. } => Box::new(ChiSquared::new(df)?),
    };
    let (start, end) = match test {
        SignificanceTest::ChiSquare { .. } => {
            let reach = result
                .critical_values
                .iter()
                .chain(std::iter::once(&statistic))
                .fold(plot.chi_square_upper, |acc, &v| acc.max(1.25 * v));
            (0.0, reach)
        }
        _ => (-plot.test_half_width, plot.test_half_width),
    };

    let curve = density_curve(
        format!("{} density", test.name()),
        dist.as_ref(),
        start,
        end,
        plot.test_curve_points,
    );
    let rejection_areas = result
        .rejection_region
        .iter()
        .filter(|r| r.upper > start && r.lower < end)
        .map(|r| ShadedArea::under(&curve, "Rejection region", r.lower.max(start), r.upper.min(end)))
        .collect();
    let critical_markers = result
        .critical_values
        .iter()
        .map(|&c| Marker::vertical(format!("Critical value ({c:.4})"), c))
        .collect();
    let statistic_marker = Marker::point(
        format!("{} statistic ({statistic:.4})", test.name()),
        statistic,
        dist.pdf(statistic),
    );

    Ok(TestPlot {
        curve,
        rejection_areas,
        critical_markers,
        statistic_marker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn z(statistic: f64, tail: Tail) -> SignificanceTest {
        SignificanceTest::Z { statistic, tail }
    }

    #[test]
    fn test_z_196_two_tailed_does_not_reject() {
        let r = evaluate(&z(1.96, Tail::TwoTailed), 0.05).unwrap();
        assert!((r.p_value - 0.049_995_79).abs() < 1e-7, "p = {}", r.p_value);
        assert!(!r.reject_null);
        assert!((r.critical_values[1] - 1.959_963_985).abs() < 1e-8);
        assert_eq!(r.critical_values[0], -r.critical_values[1]);
        assert!(r.in_rejection_region(1.96));
    }

    #[test]
    fn test_region_and_decision_differ_inside_tie_band() {
        let r = evaluate(&z(1.9601, Tail::TwoTailed), 0.05).unwrap();
        assert!((r.p_value - 0.049_984).abs() < 1e-6, "p = {}", r.p_value);
        assert!(r.in_rejection_region(r.statistic));
        assert!(!r.reject_null);

        // just past the band both agree again
        let r = evaluate(&z(1.961, Tail::TwoTailed), 0.05).unwrap();
        assert!(r.in_rejection_region(r.statistic));
        assert!(r.reject_null, "p = {}", r.p_value);
    }

    #[test]
    fn test_t_scenario() {
        let t = SignificanceTest::T {
            statistic: 2.0,
            df: 10,
            tail: Tail::TwoTailed,
        };
        let r = evaluate(&t, 0.05).unwrap();
        assert!((r.p_value - 0.073_388).abs() < 1e-5, "p = {}", r.p_value);
        assert!(!r.reject_null);
        assert!((r.critical_values[1] - 2.228_138_852).abs() < 1e-7);
        assert_eq!(r.rejection_region.len(), 2);
    }

    #[test]
    fn test_clear_rejection() {
        let r = evaluate(&z(3.0, Tail::TwoTailed), 0.05).unwrap();
        assert!(r.reject_null);
        assert!((r.p_value - 0.002_699_796).abs() < 1e-8);
    }

    #[test]
    fn test_one_sided_z() {
        let left = evaluate(&z(-1.0, Tail::LeftTailed), 0.05).unwrap();
        assert!((left.p_value - 0.158_655_254).abs() < 1e-8);
        assert!((left.critical_values[0] + 1.644_853_627).abs() < 1e-8);
        assert_eq!(left.rejection_region, vec![Region::below(left.critical_values[0])]);

        let right = evaluate(&z(2.0, Tail::RightTailed), 0.05).unwrap();
        assert!((right.p_value - 0.022_750_132).abs() < 1e-8);
        assert!(right.reject_null);
        assert_eq!(right.rejection_region, vec![Region::above(right.critical_values[0])]);
    }

    #[test]
    fn test_chi_square() {
        // df = 2 has closed form P(X > x) = exp(-x/2)
        let chi = SignificanceTest::ChiSquare {
            statistic: 4.0,
            df: 2,
        };
        let r = evaluate(&chi, 0.05).unwrap();
        assert!((r.p_value - (-2.0_f64).exp()).abs() < 1e-12);
        assert!(!r.reject_null);
        assert!((r.critical_values[0] - 2.0 * 20.0_f64.ln()).abs() < 1e-8);

        let chi3 = SignificanceTest::ChiSquare {
            statistic: 10.0,
            df: 3,
        };
        let r = evaluate(&chi3, 0.05).unwrap();
        assert!((r.critical_values[0] - 7.814_727_903).abs() < 1e-7);
        assert!(r.reject_null);
    }

    #[test]
    fn test_statistic_at_critical_value_not_rejected() {
        for alpha in [0.001, 0.01, 0.05, 0.1, 0.2] {
            for tail in [Tail::TwoTailed, Tail::LeftTailed, Tail::RightTailed] {
                let c = *evaluate(&z(0.0, tail), alpha)
                    .unwrap()
                    .critical_values
                    .last()
                    .unwrap();
                let r = evaluate(&z(c, tail), alpha).unwrap();
                assert!((r.p_value - alpha).abs() < 1e-9, "{tail} α={alpha}: p={}", r.p_value);
                assert!(!r.reject_null);
                assert!(!r.in_rejection_region(c));
            }
        }
    }

    #[test]
    fn test_tiny_alpha_still_rejects() {
        let r = evaluate(&z(6.0, Tail::TwoTailed), 1e-6).unwrap();
        assert!(r.reject_null, "p = {}", r.p_value);
    }

    #[test]
    fn test_invalid_inputs() {
        for alpha in [0.0, 1.0, -0.1, f64::NAN] {
            let err = evaluate(&z(1.0, Tail::TwoTailed), alpha).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        let t0 = SignificanceTest::T {
            statistic: 1.0,
            df: 0,
            tail: Tail::TwoTailed,
        };
        assert_eq!(evaluate(&t0, 0.05).unwrap_err().kind(), ErrorKind::InvalidInput);
        let neg = SignificanceTest::ChiSquare {
            statistic: -1.0,
            df: 3,
        };
        assert!(evaluate(&neg, 0.05).is_err());
        assert!(evaluate(&z(f64::INFINITY, Tail::LeftTailed), 0.05).is_err());
    }

    #[test]
    fn test_tail_parsing() {
        assert_eq!("two".parse::<Tail>().unwrap(), Tail::TwoTailed);
        assert_eq!("Left".parse::<Tail>().unwrap(), Tail::LeftTailed);
        assert_eq!("right-tailed".parse::<Tail>().unwrap(), Tail::RightTailed);
        assert!("sideways".parse::<Tail>().is_err());
    }

    #[test]
    fn test_region_is_open() {
        let r = Region::above(1.0);
        assert!(!r.contains(1.0));
        assert!(r.contains(1.0 + 1e-12));
        assert!(Region::below(0.0).contains(-1e300));
    }

    #[test]
    fn test_plot_z_two_tailed() {
        let test = z(2.5, Tail::TwoTailed);
        let result = evaluate(&test, 0.05).unwrap();
        let plot = test_plot(&test, &result, &EngineConfig::default()).unwrap();

        assert_eq!(plot.curve.points.len(), 1000);
        assert_eq!(plot.curve.points[0].0, -4.0);
        assert_eq!(plot.rejection_areas.len(), 2);
        assert_eq!(plot.rejection_areas[0].lower, -4.0);
        assert_eq!(plot.rejection_areas[1].upper, 4.0);
        assert!(plot.rejection_areas[1].points.iter().all(|&(x, _)| x >= result.critical_values[1]));
        assert_eq!(plot.critical_markers.len(), 2);
        assert_eq!(plot.statistic_marker.x, 2.5);
        let expected_y = Normal::standard().pdf(2.5);
        assert_eq!(plot.statistic_marker.y, Some(expected_y));
    }

    #[test]
    fn test_plot_chi_square_widens() {
        let test = SignificanceTest::ChiSquare {
            statistic: 30.0,
            df: 12,
        };
        let result = evaluate(&test, 0.05).unwrap();
        let plot = test_plot(&test, &result, &EngineConfig::default()).unwrap();
        let last = plot.curve.points.last().unwrap().0;
        assert!(last >= 30.0 && last >= result.critical_values[0], "end = {last}");
        assert_eq!(plot.curve.points[0].0, 0.0);
        assert_eq!(plot.rejection_areas.len(), 1);
    }

    #[test]
    fn test_plot_chi_square_default_range() {
        let test = SignificanceTest::ChiSquare {
            statistic: 1.0,
            df: 2,
        };
        let result = evaluate(&test, 0.05).unwrap();
        let plot = test_plot(&test, &result, &EngineConfig::default()).unwrap();
        assert_eq!(plot.curve.points.last().unwrap().0, 10.0);
    }
}
