use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single last-traded-price observation for an instrument.
///
/// `wall_time_utc` is expected to be monotonically non-decreasing per
/// instrument; the [`CandleAggregator`](crate::aggregator::CandleAggregator)
/// does not itself re-sort ticks, it only ever folds later-or-equal
/// boundaries (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Tick {
    pub wall_time_utc: DateTime<Utc>,
    pub last_price: Decimal,
}

impl Tick {
    pub fn new(wall_time_utc: DateTime<Utc>, last_price: Decimal) -> Self {
        Self {
            wall_time_utc,
            last_price,
        }
    }
}
