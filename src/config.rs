//! Engine configuration.
//!
//! Only presentation knobs live here: plot resolution, plot ranges and
//! the optional RNG seed. Statistical thresholds (the 0.05 normality
//! cut-off, the n ≥ 30 switch to the Normal quantile) are fixed
//! constants in their modules and cannot be configured.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatError};

/// Environment variable prefix, e.g. `STATCALC_SEED=7` or
/// `STATCALC_PLOT__HISTOGRAM_BINS=40`.
pub const ENV_PREFIX: &str = "STATCALC_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub plot: PlotConfig,
    /// Seed for the generator; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Points on the Z/T/χ² reference density.
    pub test_curve_points: usize,
    /// Points on the confidence-interval density.
    pub interval_curve_points: usize,
    /// Points on the normality checker's reference and fitted curves.
    pub checker_curve_points: usize,
    pub histogram_bins: usize,
    /// Z and T densities are drawn over `[-half_width, half_width]`.
    pub test_half_width: f64,
    /// χ² densities are drawn over `[0, chi_square_upper]` at least.
    pub chi_square_upper: f64,
    /// Mean-interval densities extend this far past each bound.
    pub interval_padding: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plot: PlotConfig::default(),
            seed: None,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            test_curve_points: 1000,
            interval_curve_points: 500,
            checker_curve_points: 1000,
            histogram_bins: 30,
            test_half_width: 4.0,
            chi_square_upper: 10.0,
            interval_padding: 2.0,
        }
    }
}

impl EngineConfig {
    /// Checks that every plot knob is usable.
    ///
    /// # Errors
    /// [`StatError::InvalidInput`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let p = &self.plot;
        let counts = [
            ("plot.test_curve_points", p.test_curve_points),
            ("plot.interval_curve_points", p.interval_curve_points),
            ("plot.checker_curve_points", p.checker_curve_points),
        ];
        for (name, n) in counts {
            if n < 2 {
                return Err(StatError::invalid(format!("{name} must be at least 2, got {n}")));
            }
        }
        if p.histogram_bins == 0 {
            return Err(StatError::invalid("plot.histogram_bins must be at least 1"));
        }
        let spans = [
            ("plot.test_half_width", p.test_half_width),
            ("plot.chi_square_upper", p.chi_square_upper),
            ("plot.interval_padding", p.interval_padding),
        ];
        for (name, v) in spans {
            if !(v.is_finite() && v > 0.0) {
                return Err(StatError::invalid(format!("{name} must be positive, got {v}")));
            }
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, an optional TOML file
    /// and `STATCALC_`-prefixed environment variables.
    ///
    /// A missing file is not an error; the defaults stand in for it.
    ///
    /// # Errors
    /// [`StatError::InvalidInput`] if a source cannot be parsed or the
    /// merged configuration fails [`EngineConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    /// Loads configuration from TOML text layered over the defaults.
    ///
    /// # Errors
    /// Same as [`ConfigLoader::load`].
    pub fn from_toml_str(toml: &str) -> Result<EngineConfig> {
        let figment =
            Figment::from(Serialized::defaults(EngineConfig::default())).merge(Toml::string(toml));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<EngineConfig> {
        let config: EngineConfig = figment
            .extract()
            .map_err(|e| StatError::invalid(format!("configuration: {e}")))?;
        config.validate()?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }
}
