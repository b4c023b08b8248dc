use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use quanta::Clock;

use super::ClockSource;
use super::Limiter;
use super::Reason;

/// One whole token, in micro-tokens.
///
/// Fixed-point accounting lets the refill stay continuous (sub-token accrual
/// every millisecond) while the balance lives in an atomic.
const MICRO: u64 = 1_000_000;

/// A token bucket with continuous refill.
///
/// Tokens accrue proportionally to elapsed time at `rate_per_second`, capped
/// at `burst` tokens, and each admission debits exactly one token. Unlike
/// [`LeakyBucket`](crate::LeakyBucket), the refill is not quantized to whole
/// time units: half the refill interval earns half a token.
///
/// The bucket starts full, so a fresh limiter allows an immediate burst.
#[derive(Debug)]
pub struct TokenBucket {
    burst_micro: u64,
    rate_micro_per_ms: f64,
    /// Current balance in micro-tokens, within [0, burst_micro].
    tokens: AtomicU64,
    /// Time of the last refill, in ms since the clock anchor.
    last_refill: AtomicU64,
    clock: ClockSource,
}

impl TokenBucket {
    /// Creates a new `TokenBucket` limiter.
    ///
    /// # Arguments
    ///
    /// * `rate_per_second` - Tokens accrued per second. Must be positive
    ///   and finite; the configuration layer validates this before
    ///   construction.
    /// * `burst` - The maximum token balance.
    pub fn new(rate_per_second: f64, burst: NonZeroUsize) -> Self {
        Self::with_clock(rate_per_second, burst, Clock::new())
    }

    pub fn with_clock(rate_per_second: f64, burst: NonZeroUsize, clock: Clock) -> Self {
        debug_assert!(rate_per_second.is_finite() && rate_per_second > 0.0);
        let burst_micro = burst.get() as u64 * MICRO;
        Self {
            burst_micro,
            // tokens/second -> micro-tokens/millisecond
            rate_micro_per_ms: rate_per_second * 1_000.0,
            tokens: AtomicU64::new(burst_micro),
            last_refill: AtomicU64::new(0),
            clock: ClockSource::from_clock(clock),
        }
    }

    fn refill(&self, now: u64) {
        loop {
            let last = self.last_refill.load(Ordering::Acquire);
            let elapsed = now.saturating_sub(last);
            if elapsed == 0 {
                return;
            }
            let added = (elapsed as f64 * self.rate_micro_per_ms) as u64;
            if added == 0 {
                // Too slow a rate to earn anything this millisecond; leave
                // `last` alone so the remainder keeps accruing.
                return;
            }

            // Claim the elapsed span before crediting it: the CAS winner is
            // the only caller that adds tokens for this span, and the credit
            // itself is a CAS loop so it never clobbers a concurrent debit.
            if self
                .last_refill
                .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let _ = self
                    .tokens
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |balance| {
                        Some(balance.saturating_add(added).min(self.burst_micro))
                    });
                return;
            }
            // Lost the claim; re-read and settle any span that remains
        }
    }

    #[cfg(test)]
    pub(crate) fn balance_micro(&self) -> u64 {
        self.tokens.load(Ordering::SeqCst)
    }
}

impl Limiter for TokenBucket {
    fn try_admit(&self) -> ControlFlow<Reason> {
        let now = self.clock.now_millis();
        self.refill(now);

        let debited = self
            .tokens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |balance| {
                if balance >= MICRO {
                    Some(balance - MICRO)
                } else {
                    None
                }
            });

        match debited {
            Ok(_) => ControlFlow::Continue(()),
            Err(balance) => {
                let deficit = MICRO - balance;
                let retry_ms = (deficit as f64 / self.rate_micro_per_ms).ceil() as u64;
                ControlFlow::Break(Reason::Throttled {
                    retry_after: Duration::from_millis(retry_ms.max(1)),
                })
            }
        }
    }
}
