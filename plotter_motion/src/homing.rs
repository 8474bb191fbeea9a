//! Homing supervision: limit switch debounce and timeout.
//!
//! The axis controller drives toward the switch; this supervisor only
//! watches the switch reading each tick and decides when the reference is
//! confirmed or the attempt has failed.
//!
//! ## Lifecycle
//!
//! 1. `start()` → `Approach`, counters cleared.
//! 2. Each tick: `tick(triggered)`.
//!    - A "triggered" read increments the debounce counter; any other read
//!      resets it to 0.
//!    - Counter reaching `debounce_ticks` → `Complete`.
//!    - Otherwise, `timeout_ticks` elapsed → `Failed`.
//! 3. The caller stops motion and zeroes on success, or raises
//!    `AxisFault::HOMING_TIMEOUT` on failure.

use plotter_common::motion::config::AxisConfig;

// ─── Homing Phases ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingPhase {
    Idle,
    /// Driving toward the limit switch.
    Approach,
    Complete,
    Failed,
}

/// Result of a single homing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingTickResult {
    InProgress,
    /// Switch confirmed; caller must stop and zero the axis.
    Success,
    /// Switch never confirmed within the timeout.
    TimedOut,
}

// ─── Homing Supervisor ──────────────────────────────────────────────

/// Per-axis homing supervisor state machine.
#[derive(Debug, Clone)]
pub struct HomingSupervisor {
    phase: HomingPhase,
    /// Consecutive triggered reads so far.
    counter: u8,
    /// Ticks spent in the current attempt.
    elapsed: u32,
    /// Consecutive reads required to confirm.
    debounce_ticks: u8,
    /// Maximum attempt length [ticks].
    timeout_ticks: u32,
}

impl HomingSupervisor {
    pub fn new(config: &AxisConfig) -> Self {
        Self {
            phase: HomingPhase::Idle,
            counter: 0,
            elapsed: 0,
            debounce_ticks: config.home_debounce_ticks.max(1),
            timeout_ticks: config.homing_timeout_ticks,
        }
    }

    #[inline]
    pub fn phase(&self) -> HomingPhase {
        self.phase
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == HomingPhase::Approach
    }

    /// Consecutive triggered reads in the current attempt.
    #[inline]
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Ticks spent in the current attempt.
    #[inline]
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Begin a new homing attempt.
    pub fn start(&mut self) {
        self.phase = HomingPhase::Approach;
        self.counter = 0;
        self.elapsed = 0;
    }

    /// Tick the supervisor once with the current limit switch reading.
    pub fn tick(&mut self, triggered: bool) -> HomingTickResult {
        match self.phase {
            HomingPhase::Idle => HomingTickResult::InProgress,
            HomingPhase::Complete => HomingTickResult::Success,
            HomingPhase::Failed => HomingTickResult::TimedOut,
            HomingPhase::Approach => {
                self.elapsed = self.elapsed.saturating_add(1);

                if triggered {
                    self.counter = self.counter.saturating_add(1);
                } else {
                    self.counter = 0;
                }

                if self.counter >= self.debounce_ticks {
                    self.phase = HomingPhase::Complete;
                    HomingTickResult::Success
                } else if self.elapsed >= self.timeout_ticks {
                    self.phase = HomingPhase::Failed;
                    HomingTickResult::TimedOut
                } else {
                    HomingTickResult::InProgress
                }
            }
        }
    }

    /// Abort and return to idle.
    pub fn reset(&mut self) {
        self.phase = HomingPhase::Idle;
        self.counter = 0;
        self.elapsed = 0;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
