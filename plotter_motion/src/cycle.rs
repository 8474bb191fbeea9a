//! Fixed-rate tick runner.
//!
//! Drives [`SharedController::tick`] once per configured period until the
//! shared `running` flag is cleared.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`, lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`, pin to one CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! With the `rt` feature the loop sleeps on `CLOCK_MONOTONIC` with
//! `clock_nanosleep(TIMER_ABSTIME)` and an overrun ends the run. Without
//! it the loop uses `std::thread::sleep` and only counts overruns.
//!
//! Tick timestamps are milliseconds since the runner was created,
//! truncated to `u32`; the core only ever takes wrapping differences.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use plotter_common::hal::{AxisDriver, BrushDriver};
use thiserror::Error;
use tracing::info;

use crate::shared::SharedController;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Cycles whose body exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// A tick took longer than the period.
    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun {
        /// Actual cycle duration [ns].
        actual_ns: i64,
        /// Configured cycle budget [ns].
        budget_ns: i64,
    },
}

/// Lock memory, prefault the stack, pin the calling thread and raise it to
/// `SCHED_FIFO`.
///
/// Without the `rt` feature only the stack prefault runs.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    #[cfg(feature = "rt")]
    rt::lock_memory()?;
    prefault_stack();
    #[cfg(feature = "rt")]
    {
        rt::pin_to_core(cpu_core)?;
        rt::set_fifo_priority(rt_priority)?;
    }
    #[cfg(not(feature = "rt"))]
    let _ = (cpu_core, rt_priority);
    Ok(())
}

/// Touch a stack buffer so its pages are resident before the loop starts.
fn prefault_stack() {
    const PREFAULT_BYTES: usize = 256 * 1024;
    let mut buf = [0u8; PREFAULT_BYTES];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
mod rt {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::sys::mman::{MlockallFlags, mlockall};
    use nix::unistd::Pid;

    use super::CycleError;

    fn setup_err(call: &str, e: impl std::fmt::Display) -> CycleError {
        CycleError::RtSetup(format!("{call} failed: {e}"))
    }

    pub(super) fn lock_memory() -> Result<(), CycleError> {
        mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
            .map_err(|e| setup_err("mlockall", e))
    }

    pub(super) fn pin_to_core(cpu: usize) -> Result<(), CycleError> {
        let mut cpuset = CpuSet::new();
        cpuset.set(cpu).map_err(|e| setup_err("CpuSet::set", e))?;
        sched_setaffinity(Pid::from_raw(0), &cpuset).map_err(|e| setup_err("sched_setaffinity", e))
    }

    pub(super) fn set_fifo_priority(priority: i32) -> Result<(), CycleError> {
        let param = libc::sched_param {
            sched_priority: priority,
        };
        // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
            return Err(setup_err(
                "sched_setscheduler(SCHED_FIFO)",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}

// ─── Tick Runner ────────────────────────────────────────────────────

/// Paces the motion core's update at a fixed period.
pub struct TickRunner<A, B> {
    core: SharedController<A, B>,
    running: Arc<AtomicBool>,
    epoch: Instant,
    /// Configured period [ns].
    cycle_time_ns: i64,
    stats: CycleStats,
}

impl<A: AxisDriver, B: BrushDriver> TickRunner<A, B> {
    pub fn new(core: SharedController<A, B>, cycle_time_us: u32, running: Arc<AtomicBool>) -> Self {
        Self {
            core,
            running,
            epoch: Instant::now(),
            cycle_time_ns: cycle_time_us as i64 * 1000,
            stats: CycleStats::new(),
        }
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Milliseconds since the runner was created, wrapping at `u32::MAX`.
    #[inline]
    pub fn now_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    /// Run until `running` is cleared.
    ///
    /// # Errors
    /// With the `rt` feature, `CycleError::CycleOverrun` on the first
    /// overrun; `CycleError::RtSetup` if the clock cannot be read.
    pub fn run(&mut self) -> Result<(), CycleError> {
        info!(cycle_time_ns = self.cycle_time_ns, "tick loop started");

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop();

        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop();

        info!(
            cycles = self.stats.cycle_count,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            overruns = self.stats.overruns,
            skipped = self.core.skipped_ticks(),
            "tick loop stopped"
        );
        result
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::sys::time::{TimeSpec, TimeValLike};
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let read_clock = || {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))
        };
        let period = TimeSpec::nanoseconds(self.cycle_time_ns);
        let mut next_wake = read_clock()?;

        while self.running.load(Ordering::Relaxed) {
            next_wake = next_wake + period;

            let cycle_start = read_clock()?;
            self.core.tick(self.now_ms());
            let cycle_end = read_clock()?;

            let duration_ns = (cycle_end - cycle_start).num_nanoseconds();
            let latency_ns = (cycle_start - (next_wake - period)).num_nanoseconds().abs();
            self.stats.record(duration_ns, latency_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            // EINTR only shortens this period; the next deadline is absolute.
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), CycleError> {
        let cycle_duration = std::time::Duration::from_nanos(self.cycle_time_ns as u64);

        while self.running.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            self.core.tick(self.now_ms());

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);

            // Counted only; host scheduling jitter is not a fault here.
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
