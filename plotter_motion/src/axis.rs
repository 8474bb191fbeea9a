//! Per-axis controller: commanded vs. measured position tracking.
//!
//! One `AxisController` owns the axis' output driver, its encoder tracker
//! and its homing supervisor. Command operations (`move_to`, `jog`,
//! `home`, `stop`, ...) only rewrite [`AxisInfo`]; the fixed-rate
//! [`AxisController::update`] does all the work:
//!
//! 1. Sample the encoder, recompute `last_position`.
//! 2. If homing: debounce the limit switch, check the timeout.
//! 3. If moving: interpolate the commanded position at the axis feedrate,
//!    clamped at `move_end` for bounded moves.
//! 4. `error = commanded − measured`, accumulate, store as `last_error`.
//! 5. Drive output from the PI law.
//! 6. Bounded move within `margin` of `move_end` → move concluded.
//!
//! Commands take their start timestamp from the last tick
//! (`last_sample_time`), the instant `last_position` was measured at.
//!
//! ## State machine
//!
//! `Disabled ⇄ Idle`, `Idle → Jogging → Idle`, `Idle → Moving → Idle`,
//! `Idle → Homing → Idle | Faulted`. `disable()` aborts whatever is active.

use plotter_common::consts::MS_PER_MINUTE;
use plotter_common::hal::AxisDriver;
use plotter_common::motion::config::AxisConfig;
use plotter_common::motion::error::{AxisFault, MotionError};
use plotter_common::motion::reply::Reply;
use plotter_common::motion::state::{AxisInfo, AxisMode};
use plotter_common::motion::types::{Axis, PositioningMode};
use tracing::{debug, info, warn};

use crate::control::{PiGains, pi_compute};
use crate::encoder::EncoderTracker;
use crate::homing::{HomingSupervisor, HomingTickResult};

/// Outcome of starting a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Nothing to do; already at the target. Acknowledge immediately.
    Finished,
    /// Motion started; completion is reported by the update loop.
    InProgress,
}

impl MoveStatus {
    /// Combine per-axis outcomes: finished only if every part is.
    #[inline]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finished, Self::Finished) => Self::Finished,
            _ => Self::InProgress,
        }
    }
}

/// Transition reported by one `update()` tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisEvent {
    None,
    /// Bounded move reached its margin this tick.
    MoveFinished,
    /// Home switch confirmed; the axis is now zeroed.
    HomingComplete,
    /// Homing attempt failed; the axis is Faulted.
    HomingFailed(MotionError),
}

/// Closed-loop controller for one axis.
#[derive(Debug)]
pub struct AxisController<D> {
    axis: Axis,
    driver: D,
    encoder: EncoderTracker,
    info: AxisInfo,
    gains: PiGains,
    /// Completion tolerance [mm].
    margin: f32,
    homing: HomingSupervisor,
    /// Homing approach speed [mm/min].
    homing_feedrate: f32,
    /// Homing approach direction sign.
    homing_sign: f32,
}

impl<D: AxisDriver> AxisController<D> {
    /// Create a disabled, zeroed axis.
    pub fn new(axis: Axis, driver: D, config: &AxisConfig) -> Self {
        Self {
            axis,
            driver,
            encoder: EncoderTracker::new(config.ticks_per_mm),
            info: AxisInfo::default(),
            gains: PiGains::from(config),
            margin: config.margin,
            homing: HomingSupervisor::new(config),
            homing_feedrate: config.homing_feedrate,
            homing_sign: config.homing_direction.sign(),
        }
    }

    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[inline]
    pub fn info(&self) -> &AxisInfo {
        &self.info
    }

    #[inline]
    pub fn mode(&self) -> AxisMode {
        self.info.mode()
    }

    /// Measured position at the last tick [mm].
    #[inline]
    pub fn position(&self) -> f32 {
        self.info.last_position
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    #[inline]
    pub fn encoder(&self) -> &EncoderTracker {
        &self.encoder
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Enable the output driver. Does not resume any aborted motion.
    pub fn enable(&mut self) {
        self.info.enabled = true;
        self.driver.set_enabled(true);
    }

    /// Disable the output driver, aborting any move, jog or homing.
    pub fn disable(&mut self) {
        if self.info.is_busy() {
            warn!(axis = %self.axis, mode = ?self.info.mode(), "axis disabled while active, motion aborted");
        }
        self.halt();
        self.info.enabled = false;
        self.driver.set_enabled(false);
    }

    /// Redefine the current physical location as position 0.
    pub fn zero(&mut self) {
        self.encoder.rebase();
        self.info.last_position = 0.0;
        self.info.move_start = 0.0;
        self.info.move_end = 0.0;
        self.info.last_error = 0.0;
        self.info.cumulative_error = 0.0;
    }

    /// Open-ended motion at `|feedrate|` in the direction of its sign.
    ///
    /// A zero feedrate is a stop.
    pub fn jog(&mut self, feedrate: f32) -> Result<(), MotionError> {
        self.ensure_enabled()?;
        if !feedrate.is_finite() {
            return Err(MotionError::InvalidFeedrate(feedrate));
        }
        if feedrate == 0.0 {
            self.stop(false);
            return Ok(());
        }

        self.abort_homing();
        let end = if feedrate > 0.0 {
            f32::INFINITY
        } else {
            f32::NEG_INFINITY
        };
        self.begin_motion(end, feedrate.abs());
        self.info.moving = true;
        debug!(axis = %self.axis, feedrate, "jog started");
        Ok(())
    }

    /// Move to `target`, interpreted per `mode`, at `feedrate` [mm/min].
    ///
    /// A target already within `margin` finishes immediately without
    /// motion. Fails only on a disabled axis or an unusable feedrate.
    pub fn move_to(
        &mut self,
        target: f32,
        feedrate: f32,
        mode: PositioningMode,
    ) -> Result<MoveStatus, MotionError> {
        self.ensure_enabled()?;
        let resolved = mode.resolve(target, self.info.last_position);

        self.abort_homing();
        self.begin_motion(resolved, feedrate);

        if (resolved - self.info.last_position).abs() <= self.margin {
            self.stop(false);
            return Ok(MoveStatus::Finished);
        }
        if !(feedrate.is_finite() && feedrate > 0.0) {
            self.stop(false);
            return Err(MotionError::InvalidFeedrate(feedrate));
        }

        self.info.moving = true;
        debug!(axis = %self.axis, from = self.info.move_start, to = resolved, feedrate, "move started");
        Ok(MoveStatus::InProgress)
    }

    /// Stop immediately. Returns the finished token if `emit_reply`.
    ///
    /// Also aborts homing. Stopping a stopped axis changes nothing.
    pub fn stop(&mut self, emit_reply: bool) -> Option<Reply> {
        self.halt();
        emit_reply.then_some(Reply::Finished)
    }

    /// Drive toward the limit switch until it is confirmed or times out.
    pub fn home(&mut self) -> Result<(), MotionError> {
        self.ensure_enabled()?;
        self.info.moving = false;
        self.info.faults.remove(AxisFault::HOMING_TIMEOUT);

        let end = self.homing_sign * f32::INFINITY;
        self.begin_motion(end, self.homing_feedrate);
        self.homing.start();
        self.info.homing = true;
        self.info.margin_check_counter = 0;
        self.info.homing_ticks = 0;
        info!(axis = %self.axis, feedrate = self.homing_feedrate, "homing started");
        Ok(())
    }

    /// Clear every persistent fault flag.
    pub fn clear_faults(&mut self) {
        self.info.faults = AxisFault::empty();
    }

    // ─── Periodic Update ────────────────────────────────────────────

    /// Run one fixed-rate tick. Never blocks.
    pub fn update(&mut self, now: u32) -> AxisEvent {
        // 1. Encoder → measured position.
        let delta = self.encoder.sample(self.driver.read_encoder());
        if EncoderTracker::is_desync(delta) && !self.info.faults.contains(AxisFault::ENCODER_DESYNC)
        {
            self.info.faults.insert(AxisFault::ENCODER_DESYNC);
            warn!("{}", MotionError::EncoderDesync { axis: self.axis, delta });
        }
        self.info.last_position = self.encoder.position();
        self.info.last_sample_time = now;

        if !self.info.enabled {
            return AxisEvent::None;
        }

        // 2. Homing supervision.
        if self.info.homing {
            let triggered = self.driver.read_limit_switch();
            let result = self.homing.tick(triggered);
            self.info.margin_check_counter = self.homing.counter();
            self.info.homing_ticks = self.homing.elapsed();

            return match result {
                HomingTickResult::InProgress => {
                    self.track(now);
                    AxisEvent::None
                }
                HomingTickResult::Success => {
                    self.halt();
                    self.zero();
                    info!(axis = %self.axis, ticks = self.info.homing_ticks, "home confirmed, axis zeroed");
                    AxisEvent::HomingComplete
                }
                HomingTickResult::TimedOut => {
                    self.halt();
                    self.info.faults.insert(AxisFault::HOMING_TIMEOUT);
                    let err = MotionError::HomingTimeout(self.axis);
                    warn!(ticks = self.info.homing_ticks, "{err}");
                    AxisEvent::HomingFailed(err)
                }
            };
        }

        // 3-6. Interpolate, correct, conclude.
        if self.info.moving {
            self.track(now);
            if self.info.within_margin(self.margin) {
                self.halt();
                debug!(axis = %self.axis, position = self.info.last_position, "move finished");
                return AxisEvent::MoveFinished;
            }
            return AxisEvent::None;
        }

        self.apply_drive(0.0);
        AxisEvent::None
    }

    /// Interpolated commanded position at `now` [mm].
    pub fn commanded_position(&self, now: u32) -> f32 {
        let info = &self.info;
        let elapsed_ms = now.wrapping_sub(info.move_start_time) as f32;
        let travel = info.feedrate * elapsed_ms / MS_PER_MINUTE;
        let direction = (info.move_end - info.move_start).signum();
        let commanded = info.move_start + direction * travel;

        if !info.move_end.is_finite() {
            commanded
        } else if direction > 0.0 {
            commanded.min(info.move_end)
        } else {
            commanded.max(info.move_end)
        }
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn ensure_enabled(&self) -> Result<(), MotionError> {
        if self.info.enabled {
            Ok(())
        } else {
            warn!(axis = %self.axis, "motion rejected on disabled axis");
            Err(MotionError::AxisDisabled(self.axis))
        }
    }

    /// Reset the per-motion fields for a motion starting now.
    fn begin_motion(&mut self, move_end: f32, feedrate: f32) {
        self.info.move_start = self.info.last_position;
        self.info.move_end = move_end;
        self.info.move_start_time = self.info.last_sample_time;
        self.info.feedrate = feedrate;
        self.info.last_error = 0.0;
        self.info.cumulative_error = 0.0;
    }

    /// Steps 3-5: follow the commanded position with the PI law.
    fn track(&mut self, now: u32) {
        let error = self.commanded_position(now) - self.info.last_position;
        self.info.cumulative_error += error;
        self.info.last_error = error;
        let drive = pi_compute(&self.gains, self.info.last_error, self.info.cumulative_error);
        self.apply_drive(drive);
    }

    fn abort_homing(&mut self) {
        if self.info.homing {
            debug!(axis = %self.axis, "homing aborted by new motion command");
        }
        self.info.homing = false;
        self.homing.reset();
    }

    /// Abrupt stop: clear motion flags and cut the drive.
    /// End any active motion. The tracking error only lives as long as the motion.
    fn halt(&mut self) {
        self.info.moving = false;
        self.info.homing = false;
        self.info.last_error = 0.0;
        self.info.cumulative_error = 0.0;
        self.homing.reset();
        self.apply_drive(0.0);
    }

    #[inline]
    fn apply_drive(&mut self, level: f32) {
        self.info.drive = level;
        self.driver.set_drive(level);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
