//! Feedback control law for the axis drive output.

pub mod pi;

pub use pi::{PiGains, pi_compute};
