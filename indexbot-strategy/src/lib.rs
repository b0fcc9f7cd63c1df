#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Candle-close entry signal evaluation: gates a flip-only SuperTrend signal
//! through the daily trade-count and loss limits, sizes the position, and
//! hands back a candidate the engine loop submits through the order
//! executor. Never places an order itself - it only decides whether and
//! what to propose.

pub mod entry;

pub use entry::{EntryCandidate, EntryConfig, EntryEvaluator, EntryGate};
