use std::time::Duration;

/// The default time granularity for rate-based policies.
pub const DEFAULT_UNIT: Duration = Duration::from_secs(1);

/// An immutable admission policy, fixed at registration time.
///
/// Each variant selects one limiter algorithm and carries its numeric
/// parameters. Validation happens when the policy is registered, not here;
/// see [`ConfigError`](crate::ConfigError) for the rejection cases.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// At most `limit` admissions per fixed `window`.
    FixedWindow { limit: usize, window: Duration },
    /// At most `limit` admissions within any rolling `window`.
    SlidingLog { limit: usize, window: Duration },
    /// A bucket of `capacity` draining `leak_rate` per whole `unit`.
    LeakyBucket {
        capacity: usize,
        leak_rate: usize,
        unit: Duration,
    },
    /// Continuous refill at `rate_per_second`, bursting up to `burst`
    /// tokens. `None` defaults the burst to the rate, rounded up.
    TokenBucket {
        rate_per_second: f64,
        burst: Option<usize>,
    },
    /// At most `max_permits` calls in flight, each waiting up to
    /// `acquire_timeout` for a free permit. A zero timeout never waits.
    Permits {
        max_permits: usize,
        acquire_timeout: Duration,
    },
}

impl Policy {
    pub fn fixed_window(limit: usize, window: Duration) -> Self {
        Policy::FixedWindow { limit, window }
    }

    pub fn sliding_log(limit: usize, window: Duration) -> Self {
        Policy::SlidingLog { limit, window }
    }

    /// A leaky bucket with the default 1-second unit.
    pub fn leaky_bucket(capacity: usize, leak_rate: usize) -> Self {
        Policy::LeakyBucket {
            capacity,
            leak_rate,
            unit: DEFAULT_UNIT,
        }
    }

    pub fn leaky_bucket_with_unit(capacity: usize, leak_rate: usize, unit: Duration) -> Self {
        Policy::LeakyBucket {
            capacity,
            leak_rate,
            unit,
        }
    }

    /// A token bucket whose burst defaults to the rate, rounded up.
    pub fn token_bucket(rate_per_second: f64) -> Self {
        Policy::TokenBucket {
            rate_per_second,
            burst: None,
        }
    }

    pub fn token_bucket_with_burst(rate_per_second: f64, burst: usize) -> Self {
        Policy::TokenBucket {
            rate_per_second,
            burst: Some(burst),
        }
    }

    pub fn permits(max_permits: usize, acquire_timeout: Duration) -> Self {
        Policy::Permits {
            max_permits,
            acquire_timeout,
        }
    }
}
