//! Synchronized holder shared by the command and tick contexts.
//!
//! All access to the motion core goes through one `parking_lot::Mutex`.
//! Command operations lock for the length of one call. The tick only
//! `try_lock`s: under contention it skips the update and counts the miss,
//! so the fixed-rate context never blocks on a command. Interpolation is
//! time-based, so a skipped tick delays feedback by one period and loses
//! nothing else.
//!
//! Snapshots are copied out under the lock; a reader never observes a
//! state in the middle of an update.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use plotter_common::hal::{AxisDriver, BrushDriver};
use plotter_common::motion::reply::Reply;
use plotter_common::motion::state::MachineState;

use crate::orchestrator::MotionOrchestrator;

static_assertions::assert_impl_all!(
    SharedController<crate::sim::SimulatedAxis, crate::sim::SimulatedBrush>: Send, Sync, Clone
);

struct Inner<A, B> {
    core: Mutex<MotionOrchestrator<A, B>>,
    ticks: AtomicU64,
    skipped_ticks: AtomicU64,
}

/// Cloneable handle to the motion core.
pub struct SharedController<A, B> {
    inner: Arc<Inner<A, B>>,
}

impl<A, B> Clone for SharedController<A, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AxisDriver, B: BrushDriver> SharedController<A, B> {
    pub fn new(core: MotionOrchestrator<A, B>) -> Self {
        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(core),
                ticks: AtomicU64::new(0),
                skipped_ticks: AtomicU64::new(0),
            }),
        }
    }

    /// Run one update unless a command holds the core.
    ///
    /// Returns `false` if the tick was skipped.
    pub fn tick(&self, now: u32) -> bool {
        match self.inner.core.try_lock() {
            Some(mut core) => {
                core.update(now);
                self.inner.ticks.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => {
                self.inner.skipped_ticks.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Run a command operation with exclusive access to the core.
    pub fn with<R>(&self, op: impl FnOnce(&mut MotionOrchestrator<A, B>) -> R) -> R {
        let mut core = self.inner.core.lock();
        op(&mut core)
    }

    /// Consistent copy of the machine state.
    pub fn get_state(&self) -> MachineState {
        self.inner.core.lock().get_state()
    }

    /// Emergency stop; in effect before the next tick runs.
    pub fn stop(&self) -> Reply {
        self.inner.core.lock().stop()
    }

    pub fn take_reply(&self) -> Option<Reply> {
        self.inner.core.lock().take_reply()
    }

    /// Updates that ran.
    pub fn ticks(&self) -> u64 {
        self.inner.ticks.load(Ordering::Relaxed)
    }

    /// Updates skipped because the core was locked.
    pub fn skipped_ticks(&self) -> u64 {
        self.inner.skipped_ticks.load(Ordering::Relaxed)
    }
}
