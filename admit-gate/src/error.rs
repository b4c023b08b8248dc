/// Errors raised while registering a policy.
///
/// These are programming/configuration faults and fail fast at
/// [`configure`](crate::Registry::configure) time; nothing is ever silently
/// clamped into a valid range. Throttling itself is not an error: it is the
/// [`Outcome::Throttled`](crate::Outcome::Throttled) value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A limit, capacity, leak rate, burst or permit count of zero.
    #[error("`{key}`: {field} must be at least 1")]
    ZeroCount {
        /// The key being registered.
        key: String,
        /// Which policy field was zero.
        field: &'static str,
    },

    /// A zero-length window or time unit.
    #[error("`{key}`: {field} must be a non-zero duration")]
    ZeroDuration {
        /// The key being registered.
        key: String,
        /// Which policy field was zero-length.
        field: &'static str,
    },

    /// A refill rate that is zero, negative, or not finite.
    #[error("`{key}`: rate must be a positive finite number, got {rate}")]
    InvalidRate {
        /// The key being registered.
        key: String,
        /// The offending rate.
        rate: f64,
    },

    /// The key is already registered with a different policy.
    ///
    /// Re-registering with an equal policy is idempotent and returns the
    /// existing handle; changing the policy of a live key is undefined
    /// behavior by contract, so it is rejected instead.
    #[error("`{key}` is already registered with a different policy")]
    PolicyConflict {
        /// The key that was registered twice.
        key: String,
    },
}
