//! Hardware capability interface.
//!
//! The motion core drives hardware only through these traits. A
//! platform-specific adapter implements them on top of the timer, PWM and
//! GPIO peripherals; the host build uses the simulation drivers in
//! `plotter_motion::sim`.
//!
//! # Timing Contracts
//!
//! Every method is called from the tick context and must return without
//! blocking.
//!
//! | Method | Called |
//! |--------|--------|
//! | `read_encoder()` | once per tick per axis |
//! | `read_limit_switch()` | once per tick while homing |
//! | `set_drive()` | once per tick, and on stop/disable |
//! | `set_enabled()` | on enable/disable only |

/// One motor + quadrature encoder + limit switch.
pub trait AxisDriver: Send {
    /// Raw hardware encoder counter, reinterpreted as signed 16-bit.
    ///
    /// The counter wraps; the core reconstructs the absolute position.
    fn read_encoder(&mut self) -> i16;

    /// Limit switch reading; `true` means "triggered".
    fn read_limit_switch(&mut self) -> bool;

    /// Motor drive command. Sign is direction, magnitude is duty in `[0, 1]`.
    fn set_drive(&mut self, level: f32);

    /// Gate the output driver.
    fn set_enabled(&mut self, enabled: bool);
}

/// Binary brush drop/raise output.
pub trait BrushDriver: Send {
    fn set_brush(&mut self, down: bool);
}

/// Status LED; hardware only, no core interaction.
pub trait StatusLed {
    fn toggle(&mut self);
}

impl<T: AxisDriver + ?Sized> AxisDriver for Box<T> {
    fn read_encoder(&mut self) -> i16 {
        (**self).read_encoder()
    }

    fn read_limit_switch(&mut self) -> bool {
        (**self).read_limit_switch()
    }

    fn set_drive(&mut self, level: f32) {
        (**self).set_drive(level)
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled)
    }
}

impl<T: BrushDriver + ?Sized> BrushDriver for Box<T> {
    fn set_brush(&mut self, down: bool) {
        (**self).set_brush(down)
    }
}
