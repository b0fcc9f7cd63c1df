#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Streaming technical indicators for the indexbot trading core.
//!
//! Every indicator here updates on a closed candle and never looks ahead;
//! all arithmetic stays in [`rust_decimal::Decimal`] to match the rest of
//! the engine.

pub mod average;
pub mod macd;
pub mod supertrend;

pub use average::{ExponentialMovingAverage, SimpleMovingAverage};
pub use macd::{Macd, MacdConfirmation, MacdOutput};
pub use supertrend::{Direction, SuperTrend, SuperTrendConfig};
