use chrono::{DateTime, Utc};
use indexbot_instrument::{OptionRef, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk anchors carried by an open position; mutated only by the risk
/// evaluator's trailing-stop rule, never by the entry evaluator after open.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Anchors {
    pub initial_stop: Decimal,
    pub trailing_stop: Option<Decimal>,
    pub target_price: Option<Decimal>,
    pub max_loss_rupees: Option<Decimal>,
    pub high_water_mark_price: Option<Decimal>,
}

impl Anchors {
    pub fn new(initial_stop: Decimal) -> Self {
        Self {
            initial_stop,
            trailing_stop: None,
            target_price: None,
            max_loss_rupees: None,
            high_water_mark_price: None,
        }
    }
}

/// A position's place in its lifecycle. Exactly one of these holds at any
/// time (spec.md §3) - there is no "no position" variant because the engine
/// only holds a [`Position`] value once an OPEN order has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PositionState {
    Opening,
    Open,
    Closing,
    Closed,
}

/// The at-most-one open position for a strategy instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub option: OptionRef,
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub qty: u32,
    pub anchors: Anchors,
    pub state: PositionState,
    pub open_order_id: String,
    pub exit_order_id: Option<String>,
}

impl Position {
    pub fn opening(
        option: OptionRef,
        side: Side,
        entry_time: DateTime<Utc>,
        entry_price: Decimal,
        qty: u32,
        anchors: Anchors,
        open_order_id: String,
    ) -> Self {
        assert!(qty > 0, "qty must be positive");
        Self {
            option,
            side,
            entry_time,
            entry_price,
            qty,
            anchors,
            state: PositionState::Opening,
            open_order_id,
            exit_order_id: None,
        }
    }

    /// Unrealized P&L at `ltp` for this position's quantity, signed so a
    /// profitable long move is positive for both CE and PE (both legs here
    /// are long option buys per spec.md's single documented strategy).
    pub fn unrealized_pnl(&self, ltp: Decimal) -> Decimal {
        (ltp - self.entry_price) * Decimal::from(self.qty)
    }

    pub fn mark_open(&mut self) {
        debug_assert_eq!(self.state, PositionState::Opening);
        self.state = PositionState::Open;
    }

    pub fn mark_closing(&mut self, exit_order_id: String) {
        debug_assert_eq!(self.state, PositionState::Open);
        self.state = PositionState::Closing;
        self.exit_order_id = Some(exit_order_id);
    }

    pub fn mark_closed(&mut self) {
        debug_assert_eq!(self.state, PositionState::Closing);
        self.state = PositionState::Closed;
    }

    /// Undoes `mark_closing` after the broker rejects the SELL: clears
    /// `exit_order_id` and reverts to OPEN so the risk/entry evaluators see
    /// this position again on the next tick (spec.md §4.7).
    pub fn revert_to_open(&mut self) {
        debug_assert_eq!(self.state, PositionState::Closing);
        self.state = PositionState::Open;
        self.exit_order_id = None;
    }
}
