//! System-wide constants for the plotter workspace.
//!
//! Single source of truth for numeric limits and defaults.
//! Config types take their `serde` defaults from here.

use static_assertions::const_assert;

/// Default tick period in microseconds (1 kHz = 1000 µs).
pub const CYCLE_TIME_US: u32 = 1000;
/// Minimum accepted tick period [µs].
pub const CYCLE_TIME_US_MIN: u32 = 100;
/// Maximum accepted tick period [µs].
pub const CYCLE_TIME_US_MAX: u32 = 20_000;

/// Milliseconds per minute; feedrates are in mm/min, timestamps in ms.
pub const MS_PER_MINUTE: f32 = 60_000.0;

/// Encoder resolution default [ticks/mm].
pub const TICKS_PER_MM_DEFAULT: f32 = 100.0;
pub const TICKS_PER_MM_MIN: f32 = 1.0;
pub const TICKS_PER_MM_MAX: f32 = 10_000.0;

/// Target-reached tolerance default [mm].
pub const MARGIN_DEFAULT: f32 = 0.05;
pub const MARGIN_MIN: f32 = 0.001;
pub const MARGIN_MAX: f32 = 5.0;

/// Proportional gain default [drive/mm].
pub const KP_DEFAULT: f32 = 2.0;
/// Integral gain default [drive/(mm·tick)].
pub const KI_DEFAULT: f32 = 0.0005;
/// Gain upper bound (both terms).
pub const GAIN_MAX: f32 = 1000.0;
/// Anti-windup clamp on the integral term [drive].
pub const INTEGRAL_LIMIT_DEFAULT: f32 = 0.5;

/// Homing approach speed [mm/min].
pub const HOMING_FEEDRATE_DEFAULT: f32 = 600.0;
/// Rapid (G0) speed [mm/min].
pub const RAPID_FEEDRATE_DEFAULT: f32 = 3000.0;
/// Feedrate upper bound [mm/min].
pub const FEEDRATE_MAX: f32 = 60_000.0;

/// Consecutive "triggered" limit switch reads required to confirm home.
pub const HOME_DEBOUNCE_TICKS: u8 = 4;
/// Ticks after which an unconfirmed homing attempt is declared failed.
pub const HOMING_TIMEOUT_TICKS: u32 = 30_000;

/// Encoder delta magnitude flagged as a desync (quarter of the 16-bit range).
pub const ENCODER_DESYNC_THRESHOLD: i16 = i16::MAX / 4;

// The debounce counter lives in a `u8` and must be reachable.
const_assert!(HOME_DEBOUNCE_TICKS > 0 && HOME_DEBOUNCE_TICKS < u8::MAX);
// A homing attempt must outlast the debounce window.
const_assert!(HOMING_TIMEOUT_TICKS > HOME_DEBOUNCE_TICKS as u32);
const_assert!(CYCLE_TIME_US >= CYCLE_TIME_US_MIN && CYCLE_TIME_US <= CYCLE_TIME_US_MAX);
