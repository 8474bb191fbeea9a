//! Configuration structures for the motion core.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every
//! numeric parameter has a default and bounds in [`crate::consts`];
//! missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, FEEDRATE_MAX, GAIN_MAX,
    HOME_DEBOUNCE_TICKS, HOMING_FEEDRATE_DEFAULT, HOMING_TIMEOUT_TICKS, INTEGRAL_LIMIT_DEFAULT,
    KI_DEFAULT, KP_DEFAULT, MARGIN_DEFAULT, MARGIN_MAX, MARGIN_MIN, RAPID_FEEDRATE_DEFAULT,
    TICKS_PER_MM_DEFAULT, TICKS_PER_MM_MAX, TICKS_PER_MM_MIN,
};

use super::types::Axis;

/// Direction an axis travels toward its limit switch while homing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HomingDirection {
    Positive,
    #[default]
    Negative,
}

impl HomingDirection {
    /// Sign multiplier for the approach velocity.
    #[inline]
    pub const fn sign(&self) -> f32 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// Calibration and tuning for one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Encoder resolution [ticks/mm].
    pub ticks_per_mm: f32,
    /// Target-reached tolerance [mm].
    pub margin: f32,
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain (applied to the accumulated error).
    pub ki: f32,
    /// Anti-windup clamp on the integral term [drive].
    pub integral_limit: f32,
    /// Homing approach speed [mm/min].
    pub homing_feedrate: f32,
    pub homing_direction: HomingDirection,
    /// Consecutive switch reads required to confirm home.
    pub home_debounce_ticks: u8,
    /// Ticks before a homing attempt is declared failed.
    pub homing_timeout_ticks: u32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            ticks_per_mm: TICKS_PER_MM_DEFAULT,
            margin: MARGIN_DEFAULT,
            kp: KP_DEFAULT,
            ki: KI_DEFAULT,
            integral_limit: INTEGRAL_LIMIT_DEFAULT,
            homing_feedrate: HOMING_FEEDRATE_DEFAULT,
            homing_direction: HomingDirection::default(),
            home_debounce_ticks: HOME_DEBOUNCE_TICKS,
            homing_timeout_ticks: HOMING_TIMEOUT_TICKS,
        }
    }
}

impl AxisConfig {
    /// Validate parameter bounds.
    pub fn validate(&self, axis: Axis) -> Result<(), ConfigError> {
        let err = |msg: String| Err(ConfigError::ValidationError(format!("axis {axis}: {msg}")));

        if !(TICKS_PER_MM_MIN..=TICKS_PER_MM_MAX).contains(&self.ticks_per_mm) {
            return err(format!(
                "ticks_per_mm {} out of range [{}, {}]",
                self.ticks_per_mm, TICKS_PER_MM_MIN, TICKS_PER_MM_MAX
            ));
        }
        if !(MARGIN_MIN..=MARGIN_MAX).contains(&self.margin) {
            return err(format!(
                "margin {} out of range [{}, {}]",
                self.margin, MARGIN_MIN, MARGIN_MAX
            ));
        }
        // Margin narrower than one encoder tick can never be satisfied reliably.
        if self.margin * self.ticks_per_mm < 1.0 {
            return err(format!(
                "margin {} is below one encoder tick ({} mm)",
                self.margin,
                1.0 / self.ticks_per_mm
            ));
        }
        for (name, gain) in [("kp", self.kp), ("ki", self.ki)] {
            if !(0.0..=GAIN_MAX).contains(&gain) {
                return err(format!("{name} {gain} out of range [0, {GAIN_MAX}]"));
            }
        }
        if self.kp == 0.0 {
            return err("kp must be non-zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.integral_limit) {
            return err(format!(
                "integral_limit {} out of range [0, 1]",
                self.integral_limit
            ));
        }
        if !(self.homing_feedrate > 0.0 && self.homing_feedrate <= FEEDRATE_MAX) {
            return err(format!(
                "homing_feedrate {} out of range (0, {}]",
                self.homing_feedrate, FEEDRATE_MAX
            ));
        }
        if self.home_debounce_ticks == 0 || self.home_debounce_ticks == u8::MAX {
            return err(format!(
                "home_debounce_ticks {} out of range [1, {}]",
                self.home_debounce_ticks,
                u8::MAX - 1
            ));
        }
        if self.homing_timeout_ticks <= self.home_debounce_ticks as u32 {
            return err(format!(
                "homing_timeout_ticks {} must exceed home_debounce_ticks {}",
                self.homing_timeout_ticks, self.home_debounce_ticks
            ));
        }
        Ok(())
    }
}

/// Per-axis configuration pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AxesConfig {
    pub x: AxisConfig,
    pub y: AxisConfig,
}

impl AxesConfig {
    #[inline]
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

/// Top-level plotter configuration.
///
/// # TOML Example
///
/// ```toml
/// cycle_time_us = 1000
/// rapid_feedrate = 3000.0
///
/// [shared]
/// service_name = "plotter"
///
/// [axes.x]
/// ticks_per_mm = 100.0
/// homing_direction = "negative"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotterConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Tick period [µs] (default: 1000 = 1 kHz).
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Feedrate used by rapid moves [mm/min].
    #[serde(default = "default_rapid_feedrate")]
    pub rapid_feedrate: f32,

    #[serde(default)]
    pub axes: AxesConfig,
}

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}
fn default_rapid_feedrate() -> f32 {
    RAPID_FEEDRATE_DEFAULT
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            cycle_time_us: CYCLE_TIME_US,
            rapid_feedrate: RAPID_FEEDRATE_DEFAULT,
            axes: AxesConfig::default(),
        }
    }
}

impl PlotterConfig {
    /// Validate all parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }
        if !(self.rapid_feedrate > 0.0 && self.rapid_feedrate <= FEEDRATE_MAX) {
            return Err(ConfigError::ValidationError(format!(
                "rapid_feedrate {} out of range (0, {}]",
                self.rapid_feedrate, FEEDRATE_MAX
            )));
        }
        for axis in Axis::ALL {
            self.axes.get(axis).validate(axis)?;
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
