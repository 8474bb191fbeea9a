//! Proportional + accumulated-error drive law.
//!
//! The integrator state is the axis' `cumulative_error` (summed per tick,
//! not scaled by dt), so this module is stateless. Anti-windup is a hard
//! clamp on the integral term; the final output is clamped to `[-1, 1]`.

use plotter_common::motion::config::AxisConfig;

/// PI gains taken from `AxisConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiGains {
    /// Proportional gain [drive/mm].
    pub kp: f32,
    /// Integral gain [drive/(mm·tick)] (0 = disabled).
    pub ki: f32,
    /// Integral term saturation [drive].
    pub integral_limit: f32,
}

impl From<&AxisConfig> for PiGains {
    fn from(config: &AxisConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki,
            integral_limit: config.integral_limit,
        }
    }
}

/// Compute the drive command for one tick.
///
/// # Arguments
/// - `last_error`: commanded − measured position [mm].
/// - `cumulative_error`: sum of per-tick errors since the motion started.
///
/// # Returns
/// Drive level in `[-1, 1]`; sign is direction.
#[inline]
pub fn pi_compute(gains: &PiGains, last_error: f32, cumulative_error: f32) -> f32 {
    let p_term = gains.kp * last_error;

    let i_term = if gains.ki != 0.0 {
        (gains.ki * cumulative_error).clamp(-gains.integral_limit, gains.integral_limit)
    } else {
        0.0
    };

    let out = p_term + i_term;
    if out.is_nan() { 0.0 } else { out.clamp(-1.0, 1.0) }
}

// ─── Tests ──────────────────────────────────────────────────────────
