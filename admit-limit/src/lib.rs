//! # admit-limit
//!
//! `admit-limit` provides the admission-control algorithms that decide, per
//! protected operation and per time interval, whether a call may proceed or
//! must be rejected.
//!
//! ## Core Philosophy
//!
//! Rejection is an expected, high-frequency outcome, so it travels on the
//! normal-return path as [`ControlFlow::Break`] rather than as an error or a
//! panic. Every variant is safe to share across threads behind an `Arc` and
//! none of them blocks the caller: time-based variants recalculate lazily at
//! the moment of the request, so there are no background timers, and the only
//! suspension point in the whole crate is [`PermitPool::acquire`], which is
//! always timeout-bounded.
//!
//! ## Key Concepts
//!
//! * **Limiter Trait**: one contract, five sharply different state shapes.
//! * **Clock Seam**: all variants read time through [`ClockSource`], so a
//!   `quanta` mock clock makes every decision deterministic in tests.
//! * **Permits**: bounded concurrency is a resource, not a count; acquired
//!   permits release themselves on drop, on every exit path.
//!
//! ## Example
//!
//! ```rust
//! use std::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! use admit_limit::FixedWindow;
//! use admit_limit::Limiter;
//!
//! let limit = NonZeroUsize::new(100).unwrap();
//! let window = Duration::from_secs(1);
//! let limiter = FixedWindow::new(limit, window);
//!
//! if limiter.try_admit().is_continue() {
//!     // Call allowed
//! }
//! ```

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::time::Duration;

mod clock;
mod fixed_window;
mod leaky_bucket;
mod permits;
mod sliding_log;
mod token_bucket;

pub use clock::ClockSource;
pub use fixed_window::FixedWindow;
pub use leaky_bucket::LeakyBucket;
pub use permits::PermitPool;
pub use sliding_log::SlidingLog;
pub use token_bucket::TokenBucket;

/// Reasons why a call might be rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// The limiter's capacity for the current interval is exhausted.
    ///
    /// `retry_after` is a hint: the earliest duration after which a retry
    /// could plausibly succeed. It is advisory, not a reservation.
    Throttled { retry_after: Duration },
    /// A permit could not be obtained within the configured timeout.
    AcquireTimeout,
}

/// The core trait for all admission-control algorithms.
///
/// Implementors must be `Send` and `Sync` so one instance can arbitrate
/// concurrent callers via `Arc`.
pub trait Limiter: Debug + Send + Sync {
    /// Attempts to admit a single call.
    ///
    /// This method never blocks; it updates internal state atomically or
    /// under a short critical section and returns immediately. A rejection
    /// leaves no observable trace in the limiter's state.
    fn try_admit(&self) -> ControlFlow<Reason>;
}
