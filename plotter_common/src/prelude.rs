//! Prelude module for common re-exports.
//!
//! ```rust
//! use plotter_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::motion::config::{AxesConfig, AxisConfig, HomingDirection, PlotterConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::CYCLE_TIME_US;

// ─── Hardware Capabilities ─────────────────────────────────────────
pub use crate::hal::{AxisDriver, BrushDriver, StatusLed};

// ─── Motion Types ───────────────────────────────────────────────────
pub use crate::motion::error::{AxisFault, MotionError};
pub use crate::motion::reply::Reply;
pub use crate::motion::state::{AxisInfo, AxisMode, MachineState};
pub use crate::motion::types::{Axis, PositioningMode, Vector2D};

/// Default tick period as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);
