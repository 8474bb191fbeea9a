//! Configuration loading for the motion core.
//!
//! ## Loading Sequence
//!
//! 1. Read and parse the TOML file into [`PlotterConfig`]; missing fields
//!    take their defaults.
//! 2. Validate every bound (tick period, rapid feedrate, per-axis
//!    calibration, gains and homing limits).

use std::path::Path;

use plotter_common::config::{ConfigError, ConfigLoader};
use plotter_common::motion::config::PlotterConfig;

/// Load and validate a plotter configuration file.
///
/// Runs before the tracing subscriber exists, so it does not log.
pub fn load_config(path: &Path) -> Result<PlotterConfig, ConfigError> {
    let config = PlotterConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a configuration from a TOML string (for testing).
pub fn load_config_from_str(toml: &str) -> Result<PlotterConfig, ConfigError> {
    let config = PlotterConfig::from_toml(toml)?;
    config.validate()?;
    Ok(config)
}
