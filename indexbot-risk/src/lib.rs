#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Position ledger and the priority-ordered risk/exit evaluator for a single
//! strategy instance.
//!
//! The evaluator never mutates a [`Position`] itself - it reports an
//! [`ExitReason`] and the caller (the engine loop) is responsible for
//! submitting the SELL order and transitioning the position once the fill is
//! confirmed. This keeps risk evaluation pure and independently testable.

pub mod position;
pub mod risk_book;
pub mod risk_evaluator;

pub use position::{Anchors, Position, PositionState};
pub use risk_book::RiskBook;
pub use risk_evaluator::{ExitReason, RiskConfig, RiskEvaluator};
