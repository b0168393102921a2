//! One-shot expiry timer driven by a wrapping millisecond counter.
//!
//! The timer never reads a clock itself: every call takes `now_ms` from the
//! control loop, so elapsed time is always computed against the most recent
//! `arm()` and nothing stale survives a re-arm.
//!
//! Elapsed time uses `wrapping_sub`, which stays correct when the `u32`
//! counter rolls over (~49.7 days of uptime).

/// A restartable countdown with a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    start_ms: u32,
    duration_ms: u32,
    active: bool,
}

impl Timer {
    /// Create an inactive timer that expires `duration_ms` after each arm.
    pub const fn new(duration_ms: u32) -> Self {
        Self {
            start_ms: 0,
            duration_ms,
            active: false,
        }
    }

    /// Start (or restart) the countdown at `now_ms`.
    pub fn arm(&mut self, now_ms: u32) {
        self.start_ms = now_ms;
        self.active = true;
    }

    /// Stop the countdown. Idempotent.
    pub fn disarm(&mut self) {
        self.active = false;
    }

    /// One-shot expiry test.
    ///
    /// Returns `true` exactly once per arm cycle, on the first call where
    /// `elapsed >= duration`; the timer deactivates itself at that point.
    pub fn is_expired(&mut self, now_ms: u32) -> bool {
        if !self.active {
            return false;
        }
        if self.elapsed(now_ms) >= self.duration_ms {
            self.active = false;
            return true;
        }
        false
    }

    /// Milliseconds since the last `arm()`, modulo 2^32.
    pub fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.start_ms)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn duration(&self) -> u32 {
        self.duration_ms
    }
}
