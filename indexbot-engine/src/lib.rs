#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! The single-writer engine loop for one strategy instance: owns the
//! candle aggregator, indicator state, risk book and at-most-one
//! [`Position`](indexbot_risk::Position), and is the only thing in the
//! core allowed to submit orders or mutate that state.

pub mod broadcaster;
pub mod config;
pub mod engine;
pub mod error;
pub mod snapshot;

pub use broadcaster::Broadcaster;
pub use config::{ConfigError, ConfigPatch, EngineConfig, MacdParams};
pub use engine::Engine;
pub use error::EngineError;
pub use snapshot::{ActionKind, IndicatorSnapshot, LastAction, PositionSnapshot, RiskBookSnapshot, Snapshot};
