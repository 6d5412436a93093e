//! # u-statcalc
//!
//! Engine for an educational statistics calculator.
//!
//! Every operation is a pure computation from numbers to numbers plus a
//! plot description; nothing here renders, stores or shares state. The
//! only source of randomness is the RNG a caller passes to
//! [`random::generate`].
//!
//! ## Modules
//!
//! - [`random`]: Normal sample generation with an injected RNG
//! - [`special`]: Φ, Φ⁻¹, ln Γ, incomplete beta and gamma
//! - [`distributions`]: Normal, Student's-t and χ² PDF/CDF/quantile
//! - [`sample`]: validated samples, text/CSV ingestion and descriptive statistics
//! - [`normality`]: Shapiro-Wilk test and the normality checker report
//! - [`significance`]: Z, T and χ² p-values, critical values and decisions
//! - [`interval`]: confidence intervals for a mean or a proportion
//! - [`plot`]: curves, shaded areas and markers for a presentation layer
//! - [`config`]: plot settings loaded from TOML and the environment
//!
//! ## Design Philosophy
//!
//! - **Numerical stability first**: Welford variance, compensated sums,
//!   upper-tail functions evaluated directly
//! - **Errors, not panics**: every domain violation is a [`StatError`]
//! - **Property-based testing**: statistical invariants verified via proptest
//!
//! ## Example
//!
//! ```
//! use u_statcalc::significance::{evaluate, SignificanceTest, Tail};
//!
//! let result = evaluate(&SignificanceTest::Z { statistic: 1.96, tail: Tail::TwoTailed }, 0.05).unwrap();
//! assert!((result.p_value - 0.05).abs() < 1e-4);
//! assert!(!result.reject_null);
//! ```

pub mod config;
pub mod distributions;
pub mod error;
pub mod interval;
pub mod normality;
pub mod plot;
pub mod random;
pub mod sample;
pub mod significance;
pub mod special;

pub use config::{ConfigLoader, EngineConfig};
pub use error::{ErrorKind, Result, StatError, Warning};
pub use sample::Sample;
