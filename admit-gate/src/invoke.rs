use std::ops::ControlFlow;

use tracing::trace;

use admit_limit::Reason;

use crate::handle::Admission;
use crate::handle::Handle;

/// The result of an admission-controlled invocation.
///
/// Throttling is an expected, recoverable outcome, so it is a value on the
/// normal-return path, never an `Err` and never a panic. Whether and when to
/// retry is the caller's decision; this layer performs no retries.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Every limiter admitted and the work ran to completion.
    Executed(T),
    /// Some limiter rejected; the work never ran.
    Throttled(Reason),
}

impl<T> Outcome<T> {
    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed(_))
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Outcome::Throttled(_))
    }

    /// The work's output, if it ran.
    pub fn executed(self) -> Option<T> {
        match self {
            Outcome::Executed(value) => Some(value),
            Outcome::Throttled(_) => None,
        }
    }
}

/// Run `work` if and only if every handle admits.
///
/// Handles are evaluated left-to-right. The first rejection wins: permits
/// already acquired by this attempt are released immediately (no partial
/// holds), the work is never polled, and the call resolves to
/// [`Outcome::Throttled`]. On admission the work's output passes through
/// unchanged, including any `Err` it produces itself, and every held
/// permit is released exactly once when the invocation ends, even if the
/// work panics.
pub async fn invoke<T, F>(handles: &[Handle], work: F) -> Outcome<T>
where
    F: Future<Output = T>,
{
    let mut held = Vec::new();

    for handle in handles {
        match handle.admit().await {
            ControlFlow::Continue(Admission::Counted) => {}
            ControlFlow::Continue(Admission::Held(permit)) => held.push(permit),
            ControlFlow::Break(reason) => {
                trace!(key = handle.key(), ?reason, "call throttled");
                // `held` drops here, returning any permits from this attempt
                return Outcome::Throttled(reason);
            }
        }
    }

    let output = work.await;
    drop(held);
    Outcome::Executed(output)
}
