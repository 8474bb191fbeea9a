//! Motion core shared types.
//!
//! Everything the command layer and the motion core exchange lives here:
//! geometry primitives, per-axis and machine snapshots, the error
//! taxonomy and the two reply tokens of the serial protocol.

pub mod config;
pub mod error;
pub mod reply;
pub mod state;
pub mod types;
