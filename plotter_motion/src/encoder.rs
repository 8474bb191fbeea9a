//! Absolute position reconstruction from a wrapping 16-bit encoder counter.
//!
//! The hardware counter wraps within 16 bits. Each sample is differenced
//! against the previous one in the counter's native width, so a jump from
//! near `i16::MAX` to near `i16::MIN` reads as a small forward step.
//!
//! ## Caller obligation
//!
//! `sample()` must be called at least once per half counter range of
//! travel (32768 ticks). Slower sampling silently desynchronizes the
//! absolute count; [`EncoderTracker::is_desync`] flags deltas that are
//! already suspiciously large so the axis can report it.

use plotter_common::consts::ENCODER_DESYNC_THRESHOLD;

/// Absolute encoder position tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderTracker {
    /// Raw counter value at the previous sample.
    old_count: i16,
    /// Cumulative displacement since the last rebase [ticks].
    absolute_count: i32,
    /// Calibration [ticks/mm].
    ticks_per_mm: f32,
}

impl EncoderTracker {
    pub const fn new(ticks_per_mm: f32) -> Self {
        Self {
            old_count: 0,
            absolute_count: 0,
            ticks_per_mm,
        }
    }

    /// Fold a raw counter reading into the absolute count.
    ///
    /// Returns the signed delta since the previous sample.
    #[inline]
    pub fn sample(&mut self, raw_count: i16) -> i16 {
        let delta = raw_count.wrapping_sub(self.old_count);
        self.absolute_count = self.absolute_count.wrapping_add(delta as i32);
        self.old_count = raw_count;
        delta
    }

    /// Current position [mm].
    #[inline]
    pub fn position(&self) -> f32 {
        self.absolute_count as f32 / self.ticks_per_mm
    }

    /// Redefine the current physical location as zero.
    ///
    /// The raw reference is kept so the next delta is measured from here.
    #[inline]
    pub fn rebase(&mut self) {
        self.absolute_count = 0;
    }

    /// Whether a sampled delta is large enough to suspect missed samples.
    #[inline]
    pub fn is_desync(delta: i16) -> bool {
        delta.unsigned_abs() > ENCODER_DESYNC_THRESHOLD as u16
    }

    #[inline]
    pub const fn absolute_count(&self) -> i32 {
        self.absolute_count
    }

    #[inline]
    pub const fn old_count(&self) -> i16 {
        self.old_count
    }

    #[inline]
    pub const fn ticks_per_mm(&self) -> f32 {
        self.ticks_per_mm
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
