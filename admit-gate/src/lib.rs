//! # admit-gate
//!
//! `admit-gate` composes the [`admit_limit`] algorithms into a call-site
//! admission boundary: register a [`Policy`] per protected operation, then
//! wrap each unit of work with [`invoke`].
//!
//! ## The Two Call Shapes
//!
//! 1. **Configure**: [`Registry::configure`] maps a stable key to exactly
//!    one lazily-created, long-lived limiter. Registration is idempotent;
//!    invalid policies and policy conflicts fail fast with [`ConfigError`].
//! 2. **Invoke**: [`invoke`] (or [`Handle::invoke`]) runs a future if and
//!    only if every supplied handle admits, with all-or-nothing permit
//!    acquisition and guaranteed release. Rejection surfaces as
//!    [`Outcome::Throttled`], a value rather than an error, and the work's own
//!    output passes through untouched inside [`Outcome::Executed`].
//!
//! Translating `Throttled` into a transport-level response (HTTP 429/503,
//! gRPC `RESOURCE_EXHAUSTED`, ...) is the caller's job; this crate is a
//! library boundary with no wire format.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use admit_gate::Policy;
//! use admit_gate::Registry;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let registry = Registry::new();
//! let handle = registry
//!     .configure(
//!         "OrderService::place_order",
//!         Policy::fixed_window(100, Duration::from_secs(1)),
//!     )
//!     .unwrap();
//!
//! let outcome = handle.invoke(async { "order placed" }).await;
//! assert!(outcome.is_executed());
//! # });
//! ```

mod error;
mod handle;
mod invoke;
mod policy;
mod registry;


pub use admit_limit::Reason;
pub use error::ConfigError;
pub use handle::Admission;
pub use handle::Handle;
pub use invoke::Outcome;
pub use invoke::invoke;
pub use policy::DEFAULT_UNIT;
pub use policy::Policy;
pub use registry::Registry;
