#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

//! Ambient concurrency plumbing shared by the engine loop: a bounded,
//! drop-on-overflow broadcast channel for the state broadcaster, a priority
//! token-bucket rate limiter for broker call backoff, and a deadline helper
//! for wrapping broker I/O with a caller-supplied timeout.

pub mod channel;
pub mod deadline;
pub mod rate_limit;

pub use channel::{BoundedTx, DropReason};
pub use deadline::{with_deadline, DeadlineError};
pub use rate_limit::{Priority, RateLimiter};
