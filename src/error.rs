//! Error types for the calculator engine.
//!
//! Every fallible operation returns [`Result`]. Callers branch on
//! [`StatError::kind`] rather than on message text.

use thiserror::Error;

/// Errors produced by engine operations.
///
/// A failed operation never leaves partial results behind.
#[derive(Debug, Error)]
pub enum StatError {
    /// A parameter lies outside its mathematical domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Ingested data could not be turned into a sample.
    #[error("parse error at {position}: {reason} (token {token:?})")]
    Parse {
        /// The offending token, empty when there was nothing to parse.
        token: String,
        /// 1-based token index for text input, 1-based data row for CSV.
        position: usize,
        /// What went wrong.
        reason: String,
    },

    /// The computation is undefined for this data (e.g. zero spread).
    #[error("numerically degenerate: {0}")]
    NumericalDegenerate(String),

    /// The CSV reader failed below the parsing layer.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification of [`StatError`] for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    InvalidInput,
    Parse,
    NumericalDegenerate,
}

impl StatError {
    /// Returns the error kind; CSV reader failures count as parse errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatError::InvalidInput(_) => ErrorKind::InvalidInput,
            StatError::Parse { .. } | StatError::Csv(_) => ErrorKind::Parse,
            StatError::NumericalDegenerate(_) => ErrorKind::NumericalDegenerate,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StatError::InvalidInput(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StatError>;

/// Non-fatal conditions attached to otherwise successful results.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Warning {
    /// The spread (standard deviation or standard error) is zero, so
    /// density curves cannot be drawn.
    DegenerateSpread { detail: String },

    /// The p-value comes from an approximation used outside the sample
    /// sizes it was fitted for and may be inaccurate.
    ApproximatePValue { detail: String },
}

/// Fails with [`StatError::InvalidInput`] unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StatError::invalid(format!("{name} must be finite, got {value}")))
    }
}

/// Fails unless `p` lies strictly inside (0, 1).
pub(crate) fn ensure_open_unit(name: &str, p: f64) -> Result<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(StatError::invalid(format!("{name} must lie in (0, 1), got {p}")))
    }
}
