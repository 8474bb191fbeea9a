//! Machine-level coordinator.
//!
//! Owns both axis controllers and the brush, the positioning mode, the
//! X-then-Y homing sequence and the deferred completion reply of the last
//! move or home command. `update()` is the fixed-rate tick; everything
//! else is a command operation.
//!
//! After every operation the cached [`MachineState`] is rebuilt, so
//! `get_state()` always returns a snapshot taken between two whole
//! operations.

use plotter_common::hal::{AxisDriver, BrushDriver};
use plotter_common::motion::config::PlotterConfig;
use plotter_common::motion::error::MotionError;
use plotter_common::motion::reply::Reply;
use plotter_common::motion::state::MachineState;
use plotter_common::motion::types::{Axis, PositioningMode, Vector2D};
use tracing::{debug, info, warn};

use crate::axis::{AxisController, AxisEvent, MoveStatus};
use crate::brush::BrushActuator;

/// Split a coordinated feedrate so both axes arrive together.
///
/// Each component is `feedrate × |delta| / distance`. A zero-length delta
/// yields zero on both axes.
pub fn split_feedrate(delta: Vector2D, feedrate: f32) -> Vector2D {
    let distance = delta.length();
    if distance == 0.0 {
        return Vector2D::ZERO;
    }
    Vector2D::new(
        feedrate * delta.x.abs() / distance,
        feedrate * delta.y.abs() / distance,
    )
}

/// Command whose completion reply is still outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// Completes when no axis is moving.
    Move,
    /// Completes when the homing sequence ends.
    Home,
}

/// Axes still to be homed, in order.
#[derive(Debug, Clone, Copy, Default)]
struct HomingSequence {
    current: Option<Axis>,
    next: Option<Axis>,
    failed: bool,
}

impl HomingSequence {
    fn start(first: Axis, next: Option<Axis>) -> Self {
        Self {
            current: Some(first),
            next,
            failed: false,
        }
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.current.is_some()
    }

    #[inline]
    fn involves(&self, axis: Axis) -> bool {
        self.current == Some(axis) || self.next == Some(axis)
    }
}

/// Two-axis motion coordinator.
#[derive(Debug)]
pub struct MotionOrchestrator<A, B> {
    axes: [AxisController<A>; 2],
    brush: BrushActuator<B>,
    mode: PositioningMode,
    /// Feedrate of the last coordinated move [mm/min].
    feedrate: f32,
    homing: HomingSequence,
    pending: Option<Pending>,
    reply: Option<Reply>,
    state: MachineState,
}

impl<A: AxisDriver, B: BrushDriver> MotionOrchestrator<A, B> {
    /// Build the core around its drivers. Both axes start enabled.
    pub fn new(x: A, y: A, brush: B, config: &PlotterConfig) -> Self {
        let mut orchestrator = Self {
            axes: [
                AxisController::new(Axis::X, x, &config.axes.x),
                AxisController::new(Axis::Y, y, &config.axes.y),
            ],
            brush: BrushActuator::new(brush),
            mode: PositioningMode::Absolute,
            feedrate: 0.0,
            homing: HomingSequence::default(),
            pending: None,
            reply: None,
            state: MachineState::default(),
        };
        for axis in &mut orchestrator.axes {
            axis.enable();
        }
        orchestrator.refresh_state();
        orchestrator
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisController<A> {
        &self.axes[axis.index()]
    }

    #[inline]
    pub fn brush(&self) -> &BrushActuator<B> {
        &self.brush
    }

    #[inline]
    pub fn positioning_mode(&self) -> PositioningMode {
        self.mode
    }

    /// Measured tool position [mm].
    #[inline]
    pub fn position(&self) -> Vector2D {
        Vector2D::new(self.axes[0].position(), self.axes[1].position())
    }

    /// A move or home command is awaiting its completion reply.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Copy of the latest consistent snapshot.
    #[inline]
    pub fn get_state(&self) -> MachineState {
        self.state
    }

    /// Take the completion reply of the last move or home, once.
    #[inline]
    pub fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }

    // ─── Modes & Brush ──────────────────────────────────────────────

    pub fn positioning_absolute(&mut self) {
        self.mode = PositioningMode::Absolute;
        self.refresh_state();
    }

    pub fn positioning_relative(&mut self) {
        self.mode = PositioningMode::Relative;
        self.refresh_state();
    }

    pub fn brush_drop(&mut self) {
        self.brush.drop();
        self.refresh_state();
    }

    pub fn brush_raise(&mut self) {
        self.brush.raise();
        self.refresh_state();
    }

    // ─── Motion Commands ────────────────────────────────────────────

    /// Coordinated straight-line move to `target` at `feedrate` [mm/min].
    ///
    /// Both axes are checked before either starts, so a rejected move leaves
    /// the machine untouched. An axis with no travel is not started and
    /// records a feedrate of 0.
    pub fn move_to(&mut self, target: Vector2D, feedrate: f32) -> Result<MoveStatus, MotionError> {
        self.ensure_enabled(&Axis::ALL)?;

        let current = self.position();
        let resolved = Vector2D::new(
            self.mode.resolve(target.x, current.x),
            self.mode.resolve(target.y, current.y),
        );
        let delta = Vector2D::new(resolved.x - current.x, resolved.y - current.y);
        let distance = delta.length();
        if distance == 0.0 {
            return Ok(MoveStatus::Finished);
        }
        let split = split_feedrate(delta, feedrate);
        if !(feedrate.is_finite() && feedrate > 0.0 && split.x.is_finite() && split.y.is_finite())
        {
            warn!(feedrate, "coordinated move rejected");
            return Err(MotionError::InvalidFeedrate(feedrate));
        }

        self.abort_sequence();
        self.feedrate = feedrate;
        let mut status = MoveStatus::Finished;
        for axis in Axis::ALL {
            let started = self.axes[axis.index()].move_to(
                resolved.get(axis),
                split.get(axis),
                PositioningMode::Absolute,
            )?;
            status = status.and(started);
        }
        debug!(x = resolved.x, y = resolved.y, distance, feedrate, ?status, "coordinated move");

        self.settle_pending(status, Pending::Move);
        Ok(status)
    }

    /// Single-axis move in the current positioning mode.
    pub fn move_axis(
        &mut self,
        axis: Axis,
        target: f32,
        feedrate: f32,
    ) -> Result<MoveStatus, MotionError> {
        self.ensure_enabled(&[axis])?;
        if self.homing.involves(axis) {
            self.abort_sequence();
        }
        match self.axes[axis.index()].move_to(target, feedrate, self.mode) {
            Ok(status) => {
                self.settle_pending(status, Pending::Move);
                Ok(status)
            }
            Err(e) => {
                self.refresh_state();
                Err(e)
            }
        }
    }

    /// Open-ended motion on both axes; the sign of each component is its direction.
    pub fn jog(&mut self, feedrate: Vector2D) -> Result<(), MotionError> {
        self.ensure_enabled(&Axis::ALL)?;
        if let Some(bad) = [feedrate.x, feedrate.y].into_iter().find(|f| !f.is_finite()) {
            warn!(x = feedrate.x, y = feedrate.y, "jog rejected");
            return Err(MotionError::InvalidFeedrate(bad));
        }
        self.abort_sequence();
        for axis in Axis::ALL {
            self.axes[axis.index()].jog(feedrate.get(axis))?;
        }
        self.refresh_state();
        Ok(())
    }

    pub fn jog_axis(&mut self, axis: Axis, feedrate: f32) -> Result<(), MotionError> {
        self.ensure_enabled(&[axis])?;
        if !feedrate.is_finite() {
            return Err(MotionError::InvalidFeedrate(feedrate));
        }
        if self.homing.involves(axis) {
            self.abort_sequence();
        }
        self.axes[axis.index()].jog(feedrate)?;
        self.refresh_state();
        Ok(())
    }

    /// Home X, then Y. The reply is deferred until both attempts end.
    pub fn home(&mut self) -> Result<(), MotionError> {
        self.ensure_enabled(&Axis::ALL)?;
        self.start_sequence(Axis::X, Some(Axis::Y))
    }

    /// Home a single axis.
    pub fn home_axis(&mut self, axis: Axis) -> Result<(), MotionError> {
        self.ensure_enabled(&[axis])?;
        self.start_sequence(axis, None)
    }

    /// Emergency stop: halt both axes, abort homing, drop any pending reply.
    pub fn stop(&mut self) -> Reply {
        for axis in &mut self.axes {
            axis.stop(false);
        }
        self.homing = HomingSequence::default();
        if self.pending.take().is_some() {
            info!("emergency stop dropped a pending completion");
        }
        self.reply = None;
        self.refresh_state();
        Reply::Finished
    }

    /// Stop one axis. A pending command that needed it fails.
    pub fn stop_axis(&mut self, axis: Axis, emit_reply: bool) -> Option<Reply> {
        let was_busy = self.axes[axis.index()].info().is_busy();
        let reply = self.axes[axis.index()].stop(emit_reply);
        if self.homing.involves(axis) || (was_busy && self.pending == Some(Pending::Move)) {
            self.fail_pending();
        }
        self.refresh_state();
        reply
    }

    pub fn enable_axis(&mut self, axis: Axis) {
        self.axes[axis.index()].enable();
        self.refresh_state();
    }

    /// Disable one axis. A pending command that needed it fails.
    pub fn disable_axis(&mut self, axis: Axis) {
        let involved = self.axes[axis.index()].info().is_busy() || self.homing.involves(axis);
        self.axes[axis.index()].disable();
        if involved && self.pending.is_some() {
            self.fail_pending();
        }
        self.refresh_state();
    }

    pub fn zero_axis(&mut self, axis: Axis) {
        self.axes[axis.index()].zero();
        self.refresh_state();
    }

    /// Return to the power-on state, keeping the drivers.
    pub fn reset(&mut self) {
        self.homing = HomingSequence::default();
        self.pending = None;
        self.reply = None;
        for axis in &mut self.axes {
            axis.stop(false);
            axis.clear_faults();
            axis.zero();
            axis.enable();
        }
        self.brush.raise();
        self.mode = PositioningMode::Absolute;
        self.feedrate = 0.0;
        self.refresh_state();
        info!("motion core reset");
    }

    // ─── Periodic Update ────────────────────────────────────────────

    /// Fixed-rate tick: advance both axes, the homing sequence and the
    /// pending completion, then rebuild the snapshot.
    pub fn update(&mut self, now: u32) {
        let events = [self.axes[0].update(now), self.axes[1].update(now)];

        if let Some(current) = self.homing.current {
            match events[current.index()] {
                AxisEvent::HomingComplete => self.advance_sequence(false),
                AxisEvent::HomingFailed(_) => self.advance_sequence(true),
                AxisEvent::None | AxisEvent::MoveFinished => {}
            }
        }

        if self.pending == Some(Pending::Move) && !self.axes.iter().any(|a| a.info().moving) {
            self.pending = None;
            self.reply = Some(Reply::Finished);
        }

        self.refresh_state();
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn ensure_enabled(&self, axes: &[Axis]) -> Result<(), MotionError> {
        for &axis in axes {
            if !self.axes[axis.index()].info().enabled {
                warn!(axis = %axis, "command rejected, axis disabled");
                return Err(MotionError::AxisDisabled(axis));
            }
        }
        Ok(())
    }

    /// Only one axis homes at a time: anything still busy is stopped first.
    fn start_sequence(&mut self, first: Axis, next: Option<Axis>) -> Result<(), MotionError> {
        self.abort_sequence();
        for axis in &mut self.axes {
            if axis.info().is_busy() {
                axis.stop(false);
            }
        }
        self.axes[first.index()].home()?;
        self.homing = HomingSequence::start(first, next);
        self.pending = Some(Pending::Home);
        self.reply = None;
        info!(first = %first, next = ?next, "homing sequence started");
        self.refresh_state();
        Ok(())
    }

    /// Current axis finished; start the next one or conclude.
    fn advance_sequence(&mut self, failed: bool) {
        self.homing.failed |= failed;
        match self.homing.next.take() {
            Some(next) => {
                self.homing.current = Some(next);
                if let Err(e) = self.axes[next.index()].home() {
                    warn!("homing sequence cannot continue: {e}");
                    self.homing.failed = true;
                    self.finish_sequence();
                }
            }
            None => self.finish_sequence(),
        }
    }

    fn finish_sequence(&mut self) {
        let ok = !self.homing.failed;
        self.homing = HomingSequence::default();
        if self.pending == Some(Pending::Home) {
            self.pending = None;
            self.reply = Some(Reply::from_success(ok));
        }
        if ok {
            info!("homing sequence complete");
        } else {
            warn!("homing sequence finished with a fault");
        }
    }

    /// Drop an in-flight homing sequence when other motion takes over.
    fn abort_sequence(&mut self) {
        if let Some(current) = self.homing.current {
            debug!(axis = %current, "homing sequence superseded");
            self.axes[current.index()].stop(false);
            self.homing = HomingSequence::default();
        }
    }

    /// Abort whatever is pending and report it as failed.
    fn fail_pending(&mut self) {
        self.abort_sequence();
        if self.pending.take().is_some() {
            self.reply = Some(Reply::Unknown);
        }
    }

    /// A new move replaces any earlier pending completion.
    fn settle_pending(&mut self, status: MoveStatus, kind: Pending) {
        self.reply = None;
        self.pending = match status {
            MoveStatus::Finished => None,
            MoveStatus::InProgress => Some(kind),
        };
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        self.state = MachineState {
            position: self.position(),
            brush_down: self.brush.is_down(),
            axis_x: *self.axes[0].info(),
            axis_y: *self.axes[1].info(),
            feedrate: self.feedrate,
            positioning_mode: self.mode,
            homing_sequence: self.homing.is_active(),
        };
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
