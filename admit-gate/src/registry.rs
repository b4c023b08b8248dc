use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::ConfigError;
use crate::handle::Handle;
use crate::policy::Policy;

/// Maps each protected operation's key to its one long-lived limiter.
///
/// Keys are opaque strings; the convention is the qualified operation
/// signature (for example `"OrderService::place_order"`). A key's limiter is
/// constructed at most once, on first registration, and lives for the
/// process's duration: the key space is the fixed set of protected
/// operations, so there is no eviction.
#[derive(Debug, Default)]
pub struct Registry {
    limiters: DashMap<String, Handle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `policy` for `key`, creating the limiter on first use.
    ///
    /// Registration is idempotent: repeating it with an equal policy returns
    /// a handle to the existing limiter. Re-registering with a *different*
    /// policy is rejected with [`ConfigError::PolicyConflict`], and an
    /// invalid policy fails before any state is created. Concurrent first
    /// registrations of one key construct exactly one limiter.
    pub fn configure(&self, key: &str, policy: Policy) -> Result<Handle, ConfigError> {
        // The entry holds the shard lock, so racing callers serialize here
        // and the loser observes the winner's handle.
        match self.limiters.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                if entry.get().policy() == &policy {
                    Ok(entry.get().clone())
                } else {
                    Err(ConfigError::PolicyConflict {
                        key: key.to_string(),
                    })
                }
            }
            Entry::Vacant(entry) => {
                let handle = Handle::build(key, policy)?;
                debug!(key, policy = ?handle.policy(), "creating limiter");
                entry.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    /// Look up the handle for an already-registered key.
    pub fn handle(&self, key: &str) -> Option<Handle> {
        self.limiters.get(key).map(|entry| entry.value().clone())
    }

    /// The number of registered keys.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}
