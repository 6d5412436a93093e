//! Samples: validated data, ingestion and descriptive statistics.
//!
//! A [`Sample`] is an immutable, non-empty sequence of finite values. It
//! can be built from a vector, parsed from a delimited text blob or read
//! from the first column of a CSV table, and exported back to CSV.
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier compensated summation.
//! - **Variance**: Welford's single-pass update.
//!   Reference: Welford (1962), "Note on a Method for Calculating
//!   Corrected Sums of Squares and Products", *Technometrics* 4(3).

use std::io;

use serde::Serialize;

use crate::error::{Result, StatError};

/// An ordered, immutable sequence of finite real numbers, length ≥ 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sample {
    values: Vec<f64>,
}

impl Sample {
    /// Wraps `values` after checking they are non-empty and finite.
    ///
    /// # Errors
    /// [`StatError::InvalidInput`] for an empty vector or any NaN/±∞.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(StatError::invalid("sample must contain at least one value"));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(StatError::invalid(format!(
                "sample value #{} is not finite: {}",
                pos + 1,
                values[pos]
            )));
        }
        Ok(Self { values })
    }

    /// Parses a comma- and/or newline-separated list of numbers.
    ///
    /// Blank tokens are skipped. `position` in a parse error is the
    /// 1-based index of the token in the raw, unfiltered token stream.
    ///
    /// # Examples
    /// ```
    /// use u_statcalc::sample::Sample;
    /// let s = Sample::from_text("1.5, 2.5\n3.5,,\n").unwrap();
    /// assert_eq!(s.values(), &[1.5, 2.5, 3.5]);
    /// assert!(Sample::from_text("1, two, 3").is_err());
    /// ```
    pub fn from_text(text: &str) -> Result<Self> {
        let mut values = Vec::new();
        for (i, raw) in text.split(|c: char| c == ',' || c == '\n').enumerate() {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            values.push(parse_value(token, i + 1)?);
        }
        Self::from_parsed(values)
    }

    /// Reads the first column of a CSV table with a header row.
    ///
    /// Empty cells are skipped. `position` in a parse error is the 1-based
    /// data row (the header is row 0).
    ///
    /// # Examples
    /// ```
    /// use u_statcalc::sample::Sample;
    /// let csv = "Values,Label\n1.0,a\n,b\n2.0,c\n";
    /// let s = Sample::from_csv_reader(csv.as_bytes()).unwrap();
    /// assert_eq!(s.values(), &[1.0, 2.0]);
    /// ```
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut values = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            match record.get(0) {
                Some(cell) if !cell.is_empty() => values.push(parse_value(cell, row + 1)?),
                _ => continue,
            }
        }
        Self::from_parsed(values)
    }

    fn from_parsed(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(StatError::Parse {
                token: String::new(),
                position: 0,
                reason: "no numeric values found".into(),
            });
        }
        Ok(Self { values })
    }

    /// Renders the sample as a one-column CSV with header `Values`.
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["Values"])?;
        for v in &self.values {
            wtr.write_record([v.to_string()])?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| StatError::Csv(e.into_error().into()))?;
        String::from_utf8(bytes).map_err(|e| StatError::invalid(e.to_string()))
    }

    /// Comma-separated rendering suitable for pasting back into
    /// [`Sample::from_text`].
    pub fn to_text(&self) -> String {
        self.values
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> f64 {
        neumaier_sum(&self.values) / self.values.len() as f64
    }

    /// Sample standard deviation (denominator n − 1); `None` when n < 2.
    pub fn sample_std_dev(&self) -> Option<f64> {
        let (n, _, m2) = welford(&self.values);
        (n >= 2).then(|| (m2 / (n - 1) as f64).sqrt())
    }

    /// Population standard deviation (denominator n).
    pub fn population_std_dev(&self) -> f64 {
        let (n, _, m2) = welford(&self.values);
        (m2 / n as f64).sqrt()
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Density-normalised histogram with `bins` equal-width bins over
    /// `[min, max]`.
    ///
    /// Bars integrate to 1. A zero-range sample is binned over
    /// `[x − 0.5, x + 0.5]`.
    ///
    /// # Errors
    /// [`StatError::InvalidInput`] if `bins == 0`.
    pub fn histogram(&self, bins: usize) -> Result<Histogram> {
        if bins == 0 {
            return Err(StatError::invalid("histogram needs at least one bin"));
        }
        let (mut lo, mut hi) = (self.min(), self.max());
        if hi - lo == 0.0 {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0_usize; bins];
        for &v in &self.values {
            // Last bin is closed on the right
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let scale = 1.0 / (self.values.len() as f64 * width);
        let densities = counts.iter().map(|&c| c as f64 * scale).collect();
        Ok(Histogram {
            edges,
            counts,
            densities,
        })
    }
}

impl TryFrom<Vec<f64>> for Sample {
    type Error = StatError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

/// Equal-width histogram of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Bin edges, `counts.len() + 1` of them.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// `count / (n · width)` per bin.
    pub densities: Vec<f64>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }
}

fn parse_value(token: &str, position: usize) -> Result<f64> {
    let value: f64 = token.parse().map_err(|_| StatError::Parse {
        token: token.to_string(),
        position,
        reason: "not a number".into(),
    })?;
    if !value.is_finite() {
        return Err(StatError::Parse {
            token: token.to_string(),
            position,
            reason: "not a finite number".into(),
        });
    }
    Ok(value)
}

/// Neumaier's variant of Kahan summation.
///
/// Reference: Neumaier (1974), *Zeitschrift für Angewandte Mathematik
/// und Mechanik* 54(1), pp. 39–51.
fn neumaier_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        c += if sum.abs() >= x.abs() {
            (sum - t) + x
        } else {
            (x - t) + sum
        };
        sum = t;
    }
    sum + c
}

/// Returns `(n, mean, M₂)` where M₂ is the sum of squared deviations.
fn welford(data: &[f64]) -> (usize, f64, f64) {
    data.iter()
        .fold((0_usize, 0.0_f64, 0.0_f64), |(n, mean, m2), &x| {
            let n = n + 1;
            let delta = x - mean;
            let mean = mean + delta / n as f64;
            (n, mean, m2 + delta * (x - mean))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_rejects_empty_and_non_finite() {
        assert_eq!(Sample::new(vec![]).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(Sample::new(vec![1.0, f64::NAN]).is_err());
        assert!(Sample::new(vec![f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_from_text_separators() {
        let s = Sample::from_text(" 1, 2 ,3\n4\r\n5,\n\n").unwrap();
        assert_eq!(s.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_from_text_scientific_and_signs() {
        let s = Sample::from_text("-1.5e2, +3, .25").unwrap();
        assert_eq!(s.values(), &[-150.0, 3.0, 0.25]);
    }

    #[test]
    fn test_from_text_reports_token() {
        match Sample::from_text("1,, abc, 4") {
            Err(StatError::Parse {
                token, position, ..
            }) => {
                assert_eq!(token, "abc");
                assert_eq!(position, 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_text_rejects_nan_literal() {
        let err = Sample::from_text("1, NaN").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_from_text_blank_is_parse_error() {
        let err = Sample::from_text(" ,\n, ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_from_csv_first_column() {
        let csv = "x,y\n1.5,9\n2.5,9\n \n3.5,9\n";
        let s = Sample::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(s.values(), &[1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_from_csv_reports_row() {
        let csv = "Values\n1\n2\noops\n";
        match Sample::from_csv_reader(csv.as_bytes()) {
            Err(StatError::Parse {
                token, position, ..
            }) => {
                assert_eq!(token, "oops");
                assert_eq!(position, 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_csv_header_only() {
        let err = Sample::from_csv_reader("Values\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_csv_export_reads_back() {
        let s = Sample::new(vec![0.1, -2.0, 3.25]).unwrap();
        let csv = s.to_csv().unwrap();
        assert!(csv.starts_with("Values\n"));
        let back = Sample::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_to_text_reparses() {
        let s = Sample::new(vec![1.0, 2.5, -3.0]).unwrap();
        assert_eq!(s.to_text(), "1, 2.5, -3");
        assert_eq!(Sample::from_text(&s.to_text()).unwrap(), s);
    }

    #[test]
    fn test_moments() {
        let s = Sample::new(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s.mean() - 5.0).abs() < 1e-15);
        assert!((s.population_std_dev() - 2.0).abs() < 1e-12);
        let sd = s.sample_std_dev().unwrap();
        assert!((sd - 2.138_089_935_299_395).abs() < 1e-10);
    }

    #[test]
    fn test_single_value() {
        let s = Sample::new(vec![42.0]).unwrap();
        assert_eq!(s.mean(), 42.0);
        assert_eq!(s.population_std_dev(), 0.0);
        assert_eq!(s.sample_std_dev(), None);
    }

    #[test]
    fn test_min_max() {
        let s = Sample::new(vec![3.0, -1.0, 7.5]).unwrap();
        assert_eq!(s.min(), -1.0);
        assert_eq!(s.max(), 7.5);
    }

    #[test]
    fn test_histogram_counts_and_density() {
        let s = Sample::new(vec![0.0, 0.1, 0.5, 0.9, 1.0]).unwrap();
        let h = s.histogram(2).unwrap();
        assert_eq!(h.edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(h.counts, vec![2, 3]);
        let area: f64 = h.densities.iter().map(|d| d * h.bin_width()).sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let s = Sample::new(vec![4.0; 10]).unwrap();
        let h = s.histogram(5).unwrap();
        assert_eq!(h.counts.iter().sum::<usize>(), 10);
        assert!((h.edges[0] - 3.5).abs() < 1e-15);
        assert!((h.edges[5] - 4.5).abs() < 1e-15);
    }

    #[test]
    fn test_histogram_zero_bins() {
        let s = Sample::new(vec![1.0, 2.0]).unwrap();
        assert!(s.histogram(0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(-1e6_f64..1e6, min_len..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn text_roundtrip(data in finite_vec(1, 60)) {
            let s = Sample::new(data).unwrap();
            let back = Sample::from_text(&s.to_text()).unwrap();
            prop_assert_eq!(back, s);
        }

        #[test]
        fn population_sd_not_above_sample_sd(data in finite_vec(2, 100)) {
            let s = Sample::new(data).unwrap();
            let pop = s.population_std_dev();
            let smp = s.sample_std_dev().unwrap();
            prop_assert!(pop <= smp + 1e-9 * smp.max(1.0));
        }

        #[test]
        fn histogram_conserves_count(data in finite_vec(1, 200), bins in 1_usize..50) {
            let s = Sample::new(data).unwrap();
            let h = s.histogram(bins).unwrap();
            prop_assert_eq!(h.counts.iter().sum::<usize>(), s.len());
            prop_assert_eq!(h.edges.len(), bins + 1);
        }
    }
}
