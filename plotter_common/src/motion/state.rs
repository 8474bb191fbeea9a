//! Per-axis and machine-wide state snapshots.
//!
//! Both types are plain `Copy` data. The motion core is their only writer;
//! the command layer receives full copies and never observes a value that
//! is half way through an update.

use super::error::AxisFault;
use super::types::{Axis, PositioningMode, Vector2D};

/// Derived per-axis mode.
///
/// `Disabled` overrides every other mode. `Faulted` is an idle axis whose
/// last homing attempt timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AxisMode {
    Disabled = 0,
    Idle = 1,
    Jogging = 2,
    Moving = 3,
    Homing = 4,
    Faulted = 5,
}

/// Per-axis tracking state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisInfo {
    /// Timestamp of the last encoder sample [ms].
    pub last_sample_time: u32,
    /// Timestamp the active move, jog or homing approach started [ms].
    pub move_start_time: u32,
    /// Measured position at the last sample [mm].
    pub last_position: f32,
    /// Position the active move started from [mm].
    pub move_start: f32,
    /// Target of the active move [mm]; `±INFINITY` while jogging.
    pub move_end: f32,
    /// Following error of the last tick (commanded − measured) [mm].
    pub last_error: f32,
    /// Error accumulated since the active motion started [mm·tick].
    pub cumulative_error: f32,
    /// Consecutive "triggered" limit switch reads while homing.
    pub margin_check_counter: u8,
    pub moving: bool,
    pub homing: bool,

    /// Per-axis feedrate of the active motion [mm/min].
    pub feedrate: f32,
    /// Output driver enabled.
    pub enabled: bool,
    /// Ticks spent in the current homing attempt.
    pub homing_ticks: u32,
    /// Last drive command, sign = direction [-1, 1].
    pub drive: f32,
    /// Persistent fault flags.
    pub faults: AxisFault,
}

impl Default for AxisInfo {
    fn default() -> Self {
        Self {
            last_sample_time: 0,
            move_start_time: 0,
            last_position: 0.0,
            move_start: 0.0,
            move_end: 0.0,
            last_error: 0.0,
            cumulative_error: 0.0,
            margin_check_counter: 0,
            moving: false,
            homing: false,
            feedrate: 0.0,
            enabled: false,
            homing_ticks: 0,
            drive: 0.0,
            faults: AxisFault::empty(),
        }
    }
}

impl AxisInfo {
    /// Current derived mode.
    pub fn mode(&self) -> AxisMode {
        if !self.enabled {
            AxisMode::Disabled
        } else if self.homing {
            AxisMode::Homing
        } else if self.moving && self.move_end.is_finite() {
            AxisMode::Moving
        } else if self.moving {
            AxisMode::Jogging
        } else if self.faults.is_blocking() {
            AxisMode::Faulted
        } else {
            AxisMode::Idle
        }
    }

    /// True while a bounded move, a jog or a homing approach is active.
    #[inline]
    pub const fn is_busy(&self) -> bool {
        self.moving || self.homing
    }

    /// True when a bounded move has reached its completion margin.
    #[inline]
    pub fn within_margin(&self, margin: f32) -> bool {
        self.move_end.is_finite() && (self.move_end - self.last_position).abs() <= margin
    }
}

/// Aggregate machine snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MachineState {
    /// Measured tool position [mm].
    pub position: Vector2D,
    pub brush_down: bool,
    pub axis_x: AxisInfo,
    pub axis_y: AxisInfo,
    /// Modal feedrate of the last coordinated move [mm/min].
    pub feedrate: f32,
    pub positioning_mode: PositioningMode,
    /// X-then-Y homing sequence in progress.
    pub homing_sequence: bool,
}

impl MachineState {
    #[inline]
    pub const fn axis(&self, axis: Axis) -> &AxisInfo {
        match axis {
            Axis::X => &self.axis_x,
            Axis::Y => &self.axis_y,
        }
    }

    /// No axis is moving or homing and no homing sequence is pending.
    #[inline]
    pub const fn is_idle(&self) -> bool {
        !self.axis_x.is_busy() && !self.axis_y.is_busy() && !self.homing_sequence
    }

    /// Any axis carries a blocking fault.
    #[inline]
    pub const fn has_fault(&self) -> bool {
        self.axis_x.faults.is_blocking() || self.axis_y.faults.is_blocking()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
