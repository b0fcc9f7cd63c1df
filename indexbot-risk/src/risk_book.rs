use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-trading-day, per-strategy accounting. Resets whenever the IST
/// calendar day rolls over (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RiskBook {
    pub day_start_utc: DateTime<Utc>,
    pub realized_pnl_today: Decimal,
    pub trades_taken_today: u32,
    pub daily_loss_tripped: bool,
    day_ist: NaiveDate,
}

impl RiskBook {
    pub fn new(now_ist: DateTime<chrono::FixedOffset>) -> Self {
        Self {
            day_start_utc: now_ist.to_utc(),
            realized_pnl_today: Decimal::ZERO,
            trades_taken_today: 0,
            daily_loss_tripped: false,
            day_ist: now_ist.date_naive(),
        }
    }

    /// Resets the book if `now_ist` falls on a different calendar day than
    /// the last reset. Must be called before any risk evaluation so a
    /// session that spans midnight (or an engine restart the next day)
    /// never carries yesterday's state forward.
    pub fn roll_if_new_day(&mut self, now_ist: DateTime<chrono::FixedOffset>) {
        let today = now_ist.date_naive();
        if today != self.day_ist {
            *self = RiskBook::new(now_ist);
        }
    }

    pub fn record_realized_close(&mut self, realized_pnl: Decimal) {
        self.realized_pnl_today += realized_pnl;
        self.trades_taken_today += 1;
    }

    pub fn trip_daily_loss(&mut self) {
        self.daily_loss_tripped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    fn ist(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 30 * 60)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn new_day_resets_all_counters() {
        let mut book = RiskBook::new(ist(2026, 8, 3, 9, 20));
        book.record_realized_close(dec!(-500));
        book.trip_daily_loss();
        assert_eq!(book.trades_taken_today, 1);

        book.roll_if_new_day(ist(2026, 8, 4, 9, 20));
        assert_eq!(book.trades_taken_today, 0);
        assert_eq!(book.realized_pnl_today, Decimal::ZERO);
        assert!(!book.daily_loss_tripped);
    }

    #[test]
    fn same_day_does_not_reset() {
        let mut book = RiskBook::new(ist(2026, 8, 3, 9, 20));
        book.record_realized_close(dec!(200));
        book.roll_if_new_day(ist(2026, 8, 3, 14, 0));
        assert_eq!(book.trades_taken_today, 1);
        assert_eq!(book.realized_pnl_today, dec!(200));
    }
}
