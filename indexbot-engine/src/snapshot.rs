use chrono::{DateTime, NaiveDate, Utc};
use indexbot_instrument::Side;
use indexbot_journal::Mode;
use indexbot_risk::Anchors;
use indexbot_ta::Direction;
use rust_decimal::Decimal;

/// A consistent, point-in-time view of one strategy instance, published
/// after every tick processed (spec.md §6). Every field is read from the
/// same engine state snapshot-in-time, so consumers never observe a
/// position half-updated against a risk book from a different tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub strategy_instance_id: String,
    pub mode: Mode,
    pub running: bool,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_candle_boundary_at: Option<DateTime<Utc>>,
    pub indicator: IndicatorSnapshot,
    pub position: Option<PositionSnapshot>,
    pub risk_book: RiskBookSnapshot,
    pub last_action: Option<LastAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorSnapshot {
    pub direction: Option<Direction>,
    pub flipped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    pub side: Side,
    pub strike: Decimal,
    pub expiry: NaiveDate,
    pub entry_price: Decimal,
    pub qty: u32,
    pub unrealized_pnl: Decimal,
    pub anchors: Anchors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RiskBookSnapshot {
    pub realized_pnl_today: Decimal,
    pub trades_taken_today: u32,
    pub daily_loss_tripped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastAction {
    pub kind: ActionKind,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}
