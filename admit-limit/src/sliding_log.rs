use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use quanta::Clock;

use super::ClockSource;
use super::Limiter;
use super::Reason;

/// A sliding-window log.
///
/// Keeps the timestamp of every admission still inside the window: append at
/// the tail, evict from the head. This gives an exact rolling count with no
/// boundary overshoot, at the cost of O(window-size) pruning per call. The
/// prune cost amortizes to O(1): each admitted timestamp is evicted exactly
/// once by some later call.
#[derive(Debug)]
pub struct SlidingLog {
    limit: usize,
    window_ms: u64,
    /// Admission timestamps in ms since the clock anchor, oldest first.
    log: Mutex<VecDeque<u64>>,
    clock: ClockSource,
}

impl SlidingLog {
    /// Creates a new `SlidingLog` limiter.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of admissions within any rolling window.
    /// * `window` - The width of the rolling window.
    pub fn new(limit: NonZeroUsize, window: Duration) -> Self {
        Self::with_clock(limit, window, Clock::new())
    }

    pub fn with_clock(limit: NonZeroUsize, window: Duration, clock: Clock) -> Self {
        Self {
            limit: limit.get(),
            window_ms: window.as_millis() as u64,
            log: Mutex::new(VecDeque::with_capacity(limit.get())),
            clock: ClockSource::from_clock(clock),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_window(&self) -> usize {
        self.log.lock().len()
    }
}

impl Limiter for SlidingLog {
    fn try_admit(&self) -> ControlFlow<Reason> {
        let now = self.clock.now_millis();
        // Signed threshold: early in the process's life `now - window` is
        // negative and nothing may be evicted.
        let threshold = now as i64 - self.window_ms as i64;

        let mut log = self.log.lock();
        while log.front().is_some_and(|&head| head as i64 <= threshold) {
            log.pop_front();
        }

        if log.len() < self.limit {
            log.push_back(now);
            ControlFlow::Continue(())
        } else {
            // Full window: free capacity when the oldest entry ages out
            let retry_ms = log
                .front()
                .map(|&head| (head + self.window_ms).saturating_sub(now))
                .unwrap_or(self.window_ms)
                .max(1);
            ControlFlow::Break(Reason::Throttled {
                retry_after: Duration::from_millis(retry_ms),
            })
        }
    }
}
