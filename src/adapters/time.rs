//! Host time adapter.
//!
//! Provides the wrapping millisecond counter the control core runs on,
//! backed by `std::time::Instant`.

use std::time::Instant;

/// Monotonic clock starting at zero when constructed.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since start, wrapping at `u32::MAX` like a
    /// microcontroller tick counter.
    pub fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}
