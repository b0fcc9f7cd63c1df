use chrono::{DateTime, NaiveDate, Utc};
use indexbot_risk::ExitReason;
use indexbot_instrument::{Root, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Mode {
    Paper,
    Live,
}

/// Fields written once the SELL fill is confirmed. Kept separate from
/// [`TradeRecord`] so `write_close` can be expressed as "fill in this, if
/// and only if it is still unset".
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeClose {
    pub close_at: DateTime<Utc>,
    pub exit_price: Decimal,
    pub realized_pnl: Decimal,
    pub exit_reason: String,
}

impl TradeClose {
    pub fn new(close_at: DateTime<Utc>, exit_price: Decimal, realized_pnl: Decimal, exit_reason: ExitReason) -> Self {
        Self {
            close_at,
            exit_price,
            realized_pnl,
            exit_reason: exit_reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub open_at: DateTime<Utc>,
    pub side: Side,
    pub strike: Decimal,
    pub expiry: NaiveDate,
    pub entry_price: Decimal,
    pub qty: u32,
    pub mode: Mode,
    pub root: Root,
    pub close: Option<TradeClose>,
}

impl TradeRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn opened(
        trade_id: String,
        open_at: DateTime<Utc>,
        side: Side,
        strike: Decimal,
        expiry: NaiveDate,
        entry_price: Decimal,
        qty: u32,
        mode: Mode,
        root: Root,
    ) -> Self {
        Self {
            trade_id,
            open_at,
            side,
            strike,
            expiry,
            entry_price,
            qty,
            mode,
            root,
            close: None,
        }
    }

    /// Realized P&L for a long option: `(exit - entry) * qty` (spec.md §4.8
    /// - the bot is always long, shorts are not supported).
    pub fn realized_pnl(entry_price: Decimal, exit_price: Decimal, qty: u32) -> Decimal {
        (exit_price - entry_price) * Decimal::from(qty)
    }
}
