//! Motion error taxonomy.
//!
//! [`MotionError`] is the structured outcome returned by core operations.
//! [`AxisFault`] is the persistent per-axis fault record carried in
//! snapshots; it survives until a new homing attempt or a reset clears it.
//!
//! Unknown commands are rejected in the command layer and never reach
//! the core, so they have no variant here.

use bitflags::bitflags;
use thiserror::Error;

use super::types::Axis;

/// Error returned by motion core operations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MotionError {
    /// Motion requested on a disabled axis. No state was changed.
    #[error("axis {0} is disabled")]
    AxisDisabled(Axis),

    /// Feedrate is not a positive finite number for a move that needs travel.
    #[error("invalid feedrate {0} mm/min")]
    InvalidFeedrate(f32),

    /// Home switch never confirmed within the homing timeout.
    #[error("axis {0} homing timed out")]
    HomingTimeout(Axis),

    /// Anomalously large encoder delta between two samples.
    #[error("axis {axis} encoder desync (delta {delta} ticks)")]
    EncoderDesync { axis: Axis, delta: i16 },
}

bitflags! {
    /// Persistent per-axis fault flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AxisFault: u8 {
        /// Last homing attempt timed out. Cleared by the next `home()`.
        const HOMING_TIMEOUT = 0x01;
        /// An encoder delta exceeded the desync threshold. Diagnostic only.
        const ENCODER_DESYNC = 0x02;
    }
}

impl AxisFault {
    /// Faults that put the axis in the Faulted mode.
    pub const BLOCKING_MASK: Self = Self::HOMING_TIMEOUT;

    /// Returns true if any blocking fault is set.
    #[inline]
    pub const fn is_blocking(&self) -> bool {
        self.intersects(Self::BLOCKING_MASK)
    }
}
