use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use quanta::Clock;

use super::ClockSource;
use super::Limiter;
use super::Reason;

/// A fixed-window counter.
///
/// Divides time into intervals anchored at the first call of each window.
/// It is the cheapest variant but is susceptible to "boundary bursts": two
/// adjacent windows can each admit up to `limit`, so up to `2 x limit` calls
/// can land in a short interval straddling the boundary. That is an intrinsic
/// property of fixed windows, not a defect.
#[derive(Debug)]
pub struct FixedWindow {
    limit: usize,
    window_ms: u64,
    /// Start of the current window, in ms since the clock anchor.
    window_start: AtomicU64,
    count: AtomicUsize,
    clock: ClockSource,
}

impl FixedWindow {
    /// Creates a new `FixedWindow` limiter.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of admissions within a single window.
    /// * `window` - The duration of the fixed time window.
    pub fn new(limit: NonZeroUsize, window: Duration) -> Self {
        Self::with_clock(limit, window, Clock::new())
    }

    pub fn with_clock(limit: NonZeroUsize, window: Duration, clock: Clock) -> Self {
        Self {
            limit: limit.get(),
            window_ms: window.as_millis() as u64,
            window_start: AtomicU64::new(0),
            count: AtomicUsize::new(0),
            clock: ClockSource::from_clock(clock),
        }
    }
}

impl Limiter for FixedWindow {
    fn try_admit(&self) -> ControlFlow<Reason> {
        let now = self.clock.now_millis();
        let start = self.window_start.load(Ordering::Acquire);

        // Roll the window over once it has fully elapsed. The CAS winner
        // resets the count; losers simply observe the fresh window.
        if now.saturating_sub(start) > self.window_ms
            && self
                .window_start
                .compare_exchange(start, now, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
        {
            self.count.store(0, Ordering::Release);
        }

        // Increment first, revert on overshoot. This avoids a separate
        // read-check-write race; the transient overshoot is never observable
        // as an admission.
        if self.count.fetch_add(1, Ordering::SeqCst) < self.limit {
            ControlFlow::Continue(())
        } else {
            self.count.fetch_sub(1, Ordering::SeqCst);
            let start = self.window_start.load(Ordering::Acquire);
            let retry_ms = (start + self.window_ms).saturating_sub(now).max(1);
            ControlFlow::Break(Reason::Throttled {
                retry_after: Duration::from_millis(retry_ms),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_enforces_limits() {
        let (clock, mock) = Clock::mock();
        let rl = FixedWindow::with_clock(
            NonZeroUsize::new(2).unwrap(),
            Duration::from_secs(1),
            clock,
        );

        // 5 rapid calls inside one window: exactly 2 admitted
        let admitted = (0..5).filter(|_| rl.try_admit().is_continue()).count();
        assert_eq!(admitted, 2);

        // After rollover, exactly 2 more, regardless of the prior window
        mock.increment(Duration::from_millis(1001));
        let admitted = (0..5).filter(|_| rl.try_admit().is_continue()).count();
        assert_eq!(admitted, 2);
    }

    #[test]
    fn rejection_leaves_count_untouched() {
        let (clock, _mock) = Clock::mock();
        let rl = FixedWindow::with_clock(
            NonZeroUsize::new(1).unwrap(),
            Duration::from_secs(1),
            clock,
        );

        assert!(rl.try_admit().is_continue());
        for _ in 0..10 {
            assert!(rl.try_admit().is_break());
        }
        assert_eq!(rl.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn adjacent_windows_can_straddle_double_limit() {
        let (clock, mock) = Clock::mock();
        let rl = FixedWindow::with_clock(
            NonZeroUsize::new(2).unwrap(),
            Duration::from_millis(100),
            clock,
        );

        // Land on the last millisecond of window A
        mock.increment(Duration::from_millis(100));
        assert!(rl.try_admit().is_continue());
        assert!(rl.try_admit().is_continue());

        // 1ms later the window has rolled; a fresh burst is admitted.
        // 4 admissions within 1ms: the intrinsic 2 x limit straddle.
        mock.increment(Duration::from_millis(1));
        assert!(rl.try_admit().is_continue());
        assert!(rl.try_admit().is_continue());
        assert!(rl.try_admit().is_break());
    }

    #[test]
    fn rejection_reports_retry_hint() {
        let (clock, mock) = Clock::mock();
        let rl = FixedWindow::with_clock(
            NonZeroUsize::new(1).unwrap(),
            Duration::from_millis(100),
            clock,
        );

        assert!(rl.try_admit().is_continue());
        mock.increment(Duration::from_millis(40));
        match rl.try_admit() {
            ControlFlow::Break(Reason::Throttled { retry_after }) => {
                assert_eq!(retry_after, Duration::from_millis(60));
            }
            other => panic!("expected throttle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_actual_concurrency() {
        use std::sync::Arc;

        let limit = 100;
        let rl = Arc::new(FixedWindow::new(
            NonZeroUsize::new(limit).unwrap(),
            Duration::from_secs(1),
        ));

        let mut handles = vec![];
        for _ in 0..limit + 20 {
            let rl_clone = Arc::clone(&rl);
            handles.push(tokio::spawn(async move { rl_clone.try_admit() }));
        }

        let results = futures::future::join_all(handles).await;
        let admitted = results
            .into_iter()
            .filter(|r| matches!(r, Ok(ControlFlow::Continue(()))))
            .count();

        // Even racing, exactly 'limit' calls pass
        assert_eq!(admitted, limit);
    }
}
