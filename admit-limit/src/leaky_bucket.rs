use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use quanta::Clock;

use super::ClockSource;
use super::Limiter;
use super::Reason;

#[derive(Debug)]
struct BucketState {
    /// Current fill level, always within [0, capacity].
    level: usize,
    /// Time of the last leak, in ms since the clock anchor.
    last_leak: u64,
}

/// A leaky bucket.
///
/// Each admission pours one unit into the bucket; the bucket leaks
/// `leak_rate` units per elapsed time unit. The leak is quantized: only
/// whole elapsed units drain anything, so a partial unit never leaks early.
/// This deliberately contrasts with [`TokenBucket`](crate::TokenBucket),
/// whose refill is continuous.
///
/// The leak-then-fill sequence is a single read-modify-write that cannot be
/// decomposed into independent atomics, so it runs under a short mutex.
#[derive(Debug)]
pub struct LeakyBucket {
    capacity: usize,
    leak_rate: usize,
    unit_ms: u64,
    state: Mutex<BucketState>,
    clock: ClockSource,
}

impl LeakyBucket {
    /// Creates a new `LeakyBucket` limiter.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum fill level of the bucket.
    /// * `leak_rate` - Units drained per elapsed time unit.
    /// * `unit` - The length of one time unit.
    pub fn new(capacity: NonZeroUsize, leak_rate: NonZeroUsize, unit: Duration) -> Self {
        Self::with_clock(capacity, leak_rate, unit, Clock::new())
    }

    pub fn with_clock(
        capacity: NonZeroUsize,
        leak_rate: NonZeroUsize,
        unit: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            capacity: capacity.get(),
            leak_rate: leak_rate.get(),
            unit_ms: unit.as_millis() as u64,
            state: Mutex::new(BucketState {
                level: 0,
                last_leak: 0,
            }),
            clock: ClockSource::from_clock(clock),
        }
    }

    #[cfg(test)]
    pub(crate) fn level(&self) -> usize {
        self.state.lock().level
    }
}

impl Limiter for LeakyBucket {
    fn try_admit(&self) -> ControlFlow<Reason> {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();

        // Drain whole elapsed units only; integer division quantizes the
        // leak. A partial unit keeps waiting.
        let elapsed = now.saturating_sub(state.last_leak);
        if elapsed >= self.unit_ms {
            let leaked = (elapsed / self.unit_ms) as usize * self.leak_rate;
            state.level = state.level.saturating_sub(leaked);
            state.last_leak = now;
        }
        debug_assert!(state.level <= self.capacity);

        if state.level < self.capacity {
            state.level += 1;
            ControlFlow::Continue(())
        } else {
            let retry_ms = (state.last_leak + self.unit_ms)
                .saturating_sub(now)
                .max(1);
            ControlFlow::Break(Reason::Throttled {
                retry_after: Duration::from_millis(retry_ms),
            })
        }
    }
}
