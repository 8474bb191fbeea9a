//! # Plotter Motion Core
//!
//! Closed-loop motion control for a two-axis pen plotter with a binary
//! brush. Each axis reconstructs its absolute position from a wrapping
//! 16-bit quadrature counter, follows a time-interpolated commanded
//! position with a PI drive law, and homes against a debounced limit
//! switch. The orchestrator splits coordinated feedrates so both axes
//! arrive together and sequences homing X then Y.
//!
//! ## Execution Contexts
//!
//! 1. **Tick**: [`cycle::TickRunner`] calls `update()` at a fixed rate.
//! 2. **Command**: [`command::CommandDispatcher`] runs one operation per
//!    received line.
//!
//! Both go through [`shared::SharedController`]; the tick never blocks.
//!
//! ## Modules
//!
//! - [`encoder`] - Absolute position from the wrapping counter
//! - [`axis`] - Per-axis tracking, interpolation, homing
//! - [`homing`] - Limit switch debounce and timeout
//! - [`control`] - PI drive law
//! - [`brush`] - Brush actuator
//! - [`orchestrator`] - Coordinated moves, homing sequence, snapshots
//! - [`shared`] - Synchronized holder for the two contexts
//! - [`command`] / [`line`] - Protocol commands and line parser
//! - [`sim`] - Host simulation drivers

pub mod axis;
pub mod brush;
pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod encoder;
pub mod homing;
pub mod line;
pub mod orchestrator;
pub mod shared;
pub mod sim;
