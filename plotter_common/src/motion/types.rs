//! Geometry and addressing primitives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generic 2D quantity: a position [mm] or a feedrate decomposition [mm/min].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Component for the given axis.
    #[inline]
    pub const fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// Independently controlled linear degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
}

impl Axis {
    /// All axes, in homing order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::Y => f.write_str("Y"),
        }
    }
}

/// Interpretation of target coordinates passed to move/jog commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositioningMode {
    /// Target is the final machine position (G90).
    #[default]
    Absolute,
    /// Target is an offset from the current position (G91).
    Relative,
}

impl PositioningMode {
    /// Resolve a single-axis target against the current position.
    #[inline]
    pub fn resolve(self, target: f32, current: f32) -> f32 {
        match self {
            Self::Absolute => target,
            Self::Relative => current + target,
        }
    }
}
