#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! The broker adapter contract, a deterministic paper-trading implementation
//! of it, and the order executor that enforces exactly-once fill semantics
//! on top of either.

pub mod broker;
pub mod error;
pub mod executor;
pub mod paper;

pub use broker::{Action, BrokerAdapter, OrderStatus, PlaceOrderRequest, QuoteTick};
pub use error::{BrokerRejection, FatalBrokerError, ResolveError, TransientBrokerError};
pub use executor::{OrderExecutor, OrderOutcome};
pub use paper::PaperBrokerAdapter;
