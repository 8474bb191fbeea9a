//! Host simulation drivers.
//!
//! Stand-ins for the motor bridge, quadrature counter, limit switch, brush
//! solenoid and status LED, so the motion core runs unchanged on a host
//! for tests, benches and the `plotter_motion` binary.
//!
//! The axis plant is first order: every encoder read advances the carriage
//! by `drive × max_speed × tick`, then reports the position through a
//! wrapping 16-bit counter like the real peripheral.

use plotter_common::hal::{AxisDriver, BrushDriver, StatusLed};
use plotter_common::motion::config::AxisConfig;
use tracing::{debug, info};

/// Carriage speed at full drive [mm/min].
pub const SIM_MAX_SPEED: f32 = 6000.0;

/// Simulated time per encoder read [ms].
pub const SIM_TICK_MS: f32 = 1.0;

/// Limit switch model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitSwitch {
    /// Switch never closes.
    Never,
    /// Closed while the carriage is at or below this position [mm].
    Below(f32),
    /// Closed while the carriage is at or above this position [mm].
    Above(f32),
    /// Closed from the n-th switch read on.
    AfterReads(u32),
}

/// First-order axis plant with a 16-bit quadrature counter.
#[derive(Debug, Clone)]
pub struct SimulatedAxis {
    /// Carriage position [mm].
    position: f64,
    /// Counter offset injected by `jump_ticks` [ticks].
    glitch: i64,
    ticks_per_mm: f64,
    /// Travel per read at full drive [mm].
    step_per_read: f64,
    drive: f32,
    enabled: bool,
    limit: LimitSwitch,
    /// Closed reads still reported open, alternating, before settling.
    bounce_reads: u32,
    bounce_toggle: bool,
    switch_reads: u32,
}

impl SimulatedAxis {
    pub fn new(config: &AxisConfig) -> Self {
        Self {
            position: 0.0,
            glitch: 0,
            ticks_per_mm: config.ticks_per_mm as f64,
            step_per_read: (SIM_MAX_SPEED * SIM_TICK_MS / 60_000.0) as f64,
            drive: 0.0,
            enabled: false,
            limit: LimitSwitch::Never,
            bounce_reads: 0,
            bounce_toggle: false,
            switch_reads: 0,
        }
    }

    pub fn with_limit_switch(mut self, limit: LimitSwitch) -> Self {
        self.limit = limit;
        self
    }

    /// Make the first `reads` closed readings chatter open/closed.
    pub fn with_bounce(mut self, reads: u32) -> Self {
        self.bounce_reads = reads;
        self
    }

    /// Place the carriage at `position` [mm] before the first read.
    pub fn with_position(mut self, position: f32) -> Self {
        self.position = position as f64;
        self
    }

    /// Carriage position [mm].
    #[inline]
    pub fn position(&self) -> f32 {
        self.position as f32
    }

    /// Last drive command.
    #[inline]
    pub fn drive(&self) -> f32 {
        self.drive
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of limit switch reads so far.
    #[inline]
    pub fn switch_reads(&self) -> u32 {
        self.switch_reads
    }

    /// Inject a counter jump, as a missed-edge burst would.
    pub fn jump_ticks(&mut self, ticks: i64) {
        self.glitch += ticks;
    }

    fn raw_count(&self) -> i16 {
        let ticks = (self.position * self.ticks_per_mm).round() as i64 + self.glitch;
        // Two's-complement truncation to the 16-bit counter.
        ticks as i16
    }

    fn switch_closed(&self) -> bool {
        match self.limit {
            LimitSwitch::Never => false,
            LimitSwitch::Below(at) => self.position <= at as f64,
            LimitSwitch::Above(at) => self.position >= at as f64,
            LimitSwitch::AfterReads(n) => self.switch_reads >= n,
        }
    }
}

impl AxisDriver for SimulatedAxis {
    fn read_encoder(&mut self) -> i16 {
        if self.enabled {
            self.position += self.drive as f64 * self.step_per_read;
        }
        self.raw_count()
    }

    fn read_limit_switch(&mut self) -> bool {
        self.switch_reads = self.switch_reads.saturating_add(1);
        let closed = self.switch_closed();
        if closed && self.bounce_reads > 0 {
            self.bounce_reads -= 1;
            self.bounce_toggle = !self.bounce_toggle;
            return self.bounce_toggle;
        }
        closed
    }

    fn set_drive(&mut self, level: f32) {
        self.drive = level.clamp(-1.0, 1.0);
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            debug!(enabled, "simulated axis driver");
        }
        self.enabled = enabled;
    }
}

/// Brush solenoid stand-in.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBrush {
    down: bool,
    /// Output changes so far.
    switches: u32,
}

impl SimulatedBrush {
    #[inline]
    pub fn is_down(&self) -> bool {
        self.down
    }

    #[inline]
    pub fn switches(&self) -> u32 {
        self.switches
    }
}

impl BrushDriver for SimulatedBrush {
    fn set_brush(&mut self, down: bool) {
        if down != self.down {
            self.switches += 1;
        }
        self.down = down;
    }
}

/// Status LED that reports toggles through the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingLed {
    on: bool,
}

impl LoggingLed {
    #[inline]
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl StatusLed for LoggingLed {
    fn toggle(&mut self) {
        self.on = !self.on;
        info!(on = self.on, "status LED toggled");
    }
}
