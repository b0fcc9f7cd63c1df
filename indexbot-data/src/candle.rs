use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fixed-interval OHLC candle. Once `closed` is `true` the candle is
/// immutable (spec.md §3); the aggregator only ever mutates the
/// in-progress candle for the current boundary.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Candle {
    pub boundary_start_utc: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub closed: bool,
}

impl Candle {
    pub fn open_at(boundary_start_utc: DateTime<Utc>, price: Decimal) -> Self {
        Self {
            boundary_start_utc,
            open: price,
            high: price,
            low: price,
            close: price,
            closed: false,
        }
    }

    pub fn fold(&mut self, price: Decimal) {
        debug_assert!(!self.closed, "cannot fold a price into a closed candle");
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }

    /// `low <= min(open, close) <= max(open, close) <= high` (spec.md §3).
    pub fn maintains_ohlc_invariant(&self) -> bool {
        self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high
    }
}
