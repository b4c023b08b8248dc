use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use admit_limit::FixedWindow;
use admit_limit::LeakyBucket;
use admit_limit::Limiter;
use admit_limit::PermitPool;
use admit_limit::Reason;
use admit_limit::SlidingLog;
use admit_limit::TokenBucket;

use crate::error::ConfigError;
use crate::policy::Policy;

/// What a successful admission handed the caller.
///
/// Dropping an `Admission` returns whatever it holds; for the counting
/// variants that is nothing, for permit pools it is the permit itself.
#[derive(Debug)]
pub enum Admission {
    /// The call was counted; there is nothing to give back.
    Counted,
    /// The call holds a permit that returns to its pool on drop.
    Held(OwnedSemaphorePermit),
}

#[derive(Debug, Clone)]
enum HandleKind {
    Rate(Arc<dyn Limiter>),
    Pool(Arc<PermitPool>),
}

/// A cheaply-cloneable reference to one registered limiter.
///
/// All clones of a handle share the same limiter state; the key and policy
/// ride along for routing and for the registry's idempotency check.
#[derive(Debug, Clone)]
pub struct Handle {
    key: Arc<str>,
    policy: Policy,
    kind: HandleKind,
}

fn count(key: &str, field: &'static str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or_else(|| ConfigError::ZeroCount {
        key: key.to_string(),
        field,
    })
}

fn duration(
    key: &str,
    field: &'static str,
    value: std::time::Duration,
) -> Result<std::time::Duration, ConfigError> {
    if value.is_zero() {
        Err(ConfigError::ZeroDuration {
            key: key.to_string(),
            field,
        })
    } else {
        Ok(value)
    }
}

impl Handle {
    /// Validate a policy and construct its limiter.
    ///
    /// This is the single fail-fast point of the configuration surface:
    /// every invalid policy is rejected here, before any state exists.
    pub(crate) fn build(key: &str, policy: Policy) -> Result<Self, ConfigError> {
        let kind = match &policy {
            Policy::FixedWindow { limit, window } => {
                let limit = count(key, "limit", *limit)?;
                let window = duration(key, "window", *window)?;
                HandleKind::Rate(Arc::new(FixedWindow::new(limit, window)))
            }
            Policy::SlidingLog { limit, window } => {
                let limit = count(key, "limit", *limit)?;
                let window = duration(key, "window", *window)?;
                HandleKind::Rate(Arc::new(SlidingLog::new(limit, window)))
            }
            Policy::LeakyBucket {
                capacity,
                leak_rate,
                unit,
            } => {
                let capacity = count(key, "capacity", *capacity)?;
                let leak_rate = count(key, "leak_rate", *leak_rate)?;
                let unit = duration(key, "unit", *unit)?;
                HandleKind::Rate(Arc::new(LeakyBucket::new(capacity, leak_rate, unit)))
            }
            Policy::TokenBucket {
                rate_per_second,
                burst,
            } => {
                let rate = *rate_per_second;
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(ConfigError::InvalidRate {
                        key: key.to_string(),
                        rate,
                    });
                }
                let burst = match burst {
                    Some(burst) => count(key, "burst", *burst)?,
                    // Default burst: the configured rate, rounded up
                    None => count(key, "burst", rate.ceil() as usize)?,
                };
                HandleKind::Rate(Arc::new(TokenBucket::new(rate, burst)))
            }
            Policy::Permits {
                max_permits,
                acquire_timeout,
            } => {
                let max_permits = count(key, "max_permits", *max_permits)?;
                // A zero acquire timeout is meaningful: try-once, no waiting
                HandleKind::Pool(Arc::new(PermitPool::new(max_permits, *acquire_timeout)))
            }
        };

        Ok(Self {
            key: Arc::from(key),
            policy,
            kind,
        })
    }

    /// The key this handle was registered under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Ask this handle's limiter to admit one call.
    ///
    /// Non-blocking for every variant except a permit pool with a non-zero
    /// timeout, which may suspend up to that timeout.
    pub async fn admit(&self) -> ControlFlow<Reason, Admission> {
        match &self.kind {
            HandleKind::Rate(limiter) => match limiter.try_admit() {
                ControlFlow::Continue(()) => ControlFlow::Continue(Admission::Counted),
                ControlFlow::Break(reason) => ControlFlow::Break(reason),
            },
            HandleKind::Pool(pool) => match pool.acquire().await {
                ControlFlow::Continue(permit) => ControlFlow::Continue(Admission::Held(permit)),
                ControlFlow::Break(reason) => ControlFlow::Break(reason),
            },
        }
    }

    /// Run `work` under this handle alone.
    ///
    /// Shorthand for [`invoke`](crate::invoke) with a single handle.
    pub async fn invoke<T, F>(&self, work: F) -> crate::Outcome<T>
    where
        F: Future<Output = T>,
    {
        crate::invoke(std::slice::from_ref(self), work).await
    }

    #[cfg(test)]
    pub(crate) fn shares_state_with(&self, other: &Handle) -> bool {
        match (&self.kind, &other.kind) {
            (HandleKind::Rate(a), HandleKind::Rate(b)) => Arc::ptr_eq(a, b),
            (HandleKind::Pool(a), HandleKind::Pool(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
