//! Command surface: maps protocol commands onto motion core operations.
//!
//! | Command | Core operation | Reply |
//! |---------|----------------|-------|
//! | `RESET` | `reset()` | `ACK` |
//! | `LED` | status LED toggle | `ACK` |
//! | `M112` | `stop()` | `ACK`, drops any pending reply |
//! | `M114` | `get_state()` | `X:<x> Y:<y> B:<0\|1>` then `ACK` |
//! | `G00` / `G01` | `move_to()` | `ACK` on arrival, `NACK` on rejection |
//! | `G28` | `home()` | `ACK` when both axes are homed, `NACK` on a fault |
//! | `G90` / `G91` | positioning mode | `ACK` |
//! | `J69` | none | `NACK` |
//!
//! Deferred replies are collected with [`CommandDispatcher::poll_reply`].

use core::fmt::Write;

use heapless::String;
use plotter_common::hal::{AxisDriver, BrushDriver, StatusLed};
use plotter_common::motion::reply::Reply;
use plotter_common::motion::types::{PositioningMode, Vector2D};
use tracing::{debug, warn};

use crate::axis::MoveStatus;
use crate::line::{ParseError, parse_line};
use crate::shared::SharedController;

/// Capacity of a position report line.
pub const REPORT_CAPACITY: usize = 64;

/// Optional parameter words of a move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveParams {
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Brush: `≤ 0` lowers it, `> 0` lifts it.
    pub z: Option<f32>,
    /// Feedrate [mm/min]; modal.
    pub f: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Reset,
    ToggleLed,
    EmergencyStop,
    ReportPosition,
    RapidMove(MoveParams),
    LinearMove(MoveParams),
    Home,
    AbsoluteMode,
    RelativeMode,
    CustomJog,
}

/// Immediate outcome of a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Reply(Reply),
    /// Report line; the finished token follows it.
    Report(String<REPORT_CAPACITY>),
    /// Reply arrives later through `poll_reply()`.
    Pending,
}

/// Executes commands against the shared motion core.
pub struct CommandDispatcher<A, B, L> {
    core: SharedController<A, B>,
    led: L,
    /// Last `F` word seen [mm/min].
    modal_feedrate: f32,
    rapid_feedrate: f32,
}

impl<A: AxisDriver, B: BrushDriver, L: StatusLed> CommandDispatcher<A, B, L> {
    pub fn new(core: SharedController<A, B>, led: L, rapid_feedrate: f32) -> Self {
        Self {
            core,
            led,
            modal_feedrate: 0.0,
            rapid_feedrate,
        }
    }

    #[inline]
    pub fn core(&self) -> &SharedController<A, B> {
        &self.core
    }

    #[inline]
    pub fn led(&self) -> &L {
        &self.led
    }

    #[inline]
    pub fn modal_feedrate(&self) -> f32 {
        self.modal_feedrate
    }

    /// Parse and dispatch one line. Blank lines produce nothing.
    pub fn dispatch_line(&mut self, line: &str) -> Option<Dispatch> {
        match parse_line(line) {
            Ok(command) => Some(self.dispatch(command)),
            Err(ParseError::Empty) => None,
            Err(e) => {
                debug!("{e}");
                Some(Dispatch::Reply(Reply::Unknown))
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Dispatch {
        debug!(?command, "dispatch");
        match command {
            Command::Reset => {
                self.core.with(|core| core.reset());
                self.modal_feedrate = 0.0;
                Dispatch::Reply(Reply::Finished)
            }
            Command::ToggleLed => {
                self.led.toggle();
                Dispatch::Reply(Reply::Finished)
            }
            Command::EmergencyStop => Dispatch::Reply(self.core.stop()),
            Command::ReportPosition => self.report(),
            Command::RapidMove(params) => {
                self.latch_feedrate(&params);
                self.linear_move(&params, self.rapid_feedrate)
            }
            Command::LinearMove(params) => {
                self.latch_feedrate(&params);
                self.linear_move(&params, self.modal_feedrate)
            }
            Command::Home => match self.core.with(|core| core.home()) {
                Ok(()) => Dispatch::Pending,
                Err(e) => {
                    warn!("home rejected: {e}");
                    Dispatch::Reply(Reply::Unknown)
                }
            },
            Command::AbsoluteMode => {
                self.core.with(|core| core.positioning_absolute());
                Dispatch::Reply(Reply::Finished)
            }
            Command::RelativeMode => {
                self.core.with(|core| core.positioning_relative());
                Dispatch::Reply(Reply::Finished)
            }
            Command::CustomJog => {
                warn!("J69 has no defined parameter semantics, rejected");
                Dispatch::Reply(Reply::Unknown)
            }
        }
    }

    /// Deferred completion of the last move or home.
    pub fn poll_reply(&self) -> Option<Reply> {
        self.core.take_reply()
    }

    fn latch_feedrate(&mut self, params: &MoveParams) {
        if let Some(f) = params.f {
            self.modal_feedrate = f;
        }
    }

    fn linear_move(&mut self, params: &MoveParams, feedrate: f32) -> Dispatch {
        let result = self.core.with(|core| {
            match params.z {
                Some(z) if z <= 0.0 => core.brush_drop(),
                Some(_) => core.brush_raise(),
                None => {}
            }

            // Missing words keep the current coordinate.
            let target = match core.positioning_mode() {
                PositioningMode::Absolute => {
                    let here = core.position();
                    Vector2D::new(params.x.unwrap_or(here.x), params.y.unwrap_or(here.y))
                }
                PositioningMode::Relative => {
                    Vector2D::new(params.x.unwrap_or(0.0), params.y.unwrap_or(0.0))
                }
            };
            core.move_to(target, feedrate)
        });

        match result {
            Ok(MoveStatus::Finished) => Dispatch::Reply(Reply::Finished),
            Ok(MoveStatus::InProgress) => Dispatch::Pending,
            Err(e) => {
                warn!("move rejected: {e}");
                Dispatch::Reply(Reply::Unknown)
            }
        }
    }

    fn report(&self) -> Dispatch {
        let state = self.core.get_state();
        let mut line: String<REPORT_CAPACITY> = String::new();
        let written = writeln!(
            line,
            "X:{:.3} Y:{:.3} B:{}",
            state.position.x,
            state.position.y,
            u8::from(state.brush_down)
        );
        match written {
            Ok(()) => Dispatch::Report(line),
            Err(_) => Dispatch::Reply(Reply::Unknown),
        }
    }
}
