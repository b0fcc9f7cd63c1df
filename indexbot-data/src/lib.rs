#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

//! Tick ingestion and fixed-interval OHLC candle aggregation.

pub mod aggregator;
pub mod candle;
pub mod tick;

pub use aggregator::CandleAggregator;
pub use candle::Candle;
pub use tick::Tick;
