//! Plot descriptions.
//!
//! The engine never renders. It hands the presentation layer sampled
//! curves, shaded areas and markers, all in data coordinates.

use serde::Serialize;

use crate::distributions::ContinuousDistribution;

/// A sampled curve, points in ascending `x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Curve {
    /// Points with `lower ≤ x ≤ upper`.
    pub fn between(&self, lower: f64, upper: f64) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .filter(|&(x, _)| x >= lower && x <= upper)
            .collect()
    }
}

/// A region under a curve to fill, with the curve points that bound it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShadedArea {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub points: Vec<(f64, f64)>,
}

impl ShadedArea {
    pub fn under(curve: &Curve, label: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
            points: curve.between(lower, upper),
        }
    }
}

/// A highlighted position. `y` is `None` for a full-height vertical line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub label: String,
    pub x: f64,
    pub y: Option<f64>,
}

impl Marker {
    pub fn point(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y: Some(y),
        }
    }

    pub fn vertical(label: impl Into<String>, x: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y: None,
        }
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// # Examples
/// ```
/// use u_statcalc::plot::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
/// ```
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Samples the density of `dist` at `n` points across `[start, end]`.
///
/// Non-finite densities (the χ² pole at 0 for df = 1) are skipped.
pub fn density_curve<D: ContinuousDistribution + ?Sized>(
    label: impl Into<String>,
    dist: &D,
    start: f64,
    end: f64,
    n: usize,
) -> Curve {
    let points = linspace(start, end, n)
        .into_iter()
        .map(|x| (x, dist.pdf(x)))
        .filter(|(_, y)| y.is_finite())
        .collect();
    Curve {
        label: label.into(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{ChiSquared, Normal};

    #[test]
    fn test_linspace_endpoints() {
        let xs = linspace(-4.0, 4.0, 1000);
        assert_eq!(xs.len(), 1000);
        assert_eq!(xs[0], -4.0);
        assert_eq!(xs[999], 4.0);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_linspace_empty() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_density_curve_peak() {
        let c = density_curve("N(0,1)", &Normal::standard(), -1.0, 1.0, 3);
        assert_eq!(c.points.len(), 3);
        assert_eq!(c.points[1].0, 0.0);
        assert!((c.points[1].1 - 0.398_942_280_401_432_7).abs() < 1e-15);
    }

    #[test]
    fn test_density_curve_skips_pole() {
        let chi = ChiSquared::new(1).unwrap();
        let c = density_curve("χ²(1)", &chi, 0.0, 10.0, 11);
        assert_eq!(c.points.len(), 10);
        assert_eq!(c.points[0].0, 1.0);
    }

    #[test]
    fn test_shaded_area_subset() {
        let c = density_curve("N(0,1)", &Normal::standard(), -4.0, 4.0, 9);
        let area = ShadedArea::under(&c, "tail", 2.0, f64::INFINITY);
        let xs: Vec<f64> = area.points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }
}
