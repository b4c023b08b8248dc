use std::time::Duration;

use quanta::Clock;
use quanta::Instant;

/// Monotonic time source shared by every limiter variant.
///
/// Wraps a `quanta::Clock` together with a fixed anchor captured at
/// construction, and reports elapsed time as whole milliseconds since that
/// anchor. Millisecond resolution is deliberate: it matches the granularity
/// the algorithms reason in and keeps timestamps small enough for atomics.
///
/// Tests inject `quanta::Clock::mock()` through [`ClockSource::from_clock`]
/// and drive time forward explicitly.
#[derive(Debug, Clone)]
pub struct ClockSource {
    clock: Clock,
    /// A fixed point in time to calculate deltas from.
    anchor: Instant,
}

impl ClockSource {
    /// Create a clock source backed by the system's monotonic clock.
    pub fn new() -> Self {
        Self::from_clock(Clock::new())
    }

    /// Create a clock source over an explicit clock (usually a mock).
    pub fn from_clock(clock: Clock) -> Self {
        let anchor = clock.now();
        Self { clock, anchor }
    }

    /// Milliseconds elapsed since this source was created.
    pub fn now_millis(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Raw elapsed time since the anchor.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().duration_since(self.anchor)
    }
}

impl Default for ClockSource {
    fn default() -> Self {
        Self::new()
    }
}
