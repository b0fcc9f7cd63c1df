use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trend direction produced by [`SuperTrend`]. `Up` favours a call-side
/// (CE) entry, `Down` favours a put-side (PE) entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn sign_of(value: Decimal) -> Self {
        if value.is_sign_negative() {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SuperTrendConfig {
    pub period: usize,
    pub multiplier: Decimal,
}

/// Outcome of feeding one closed candle into [`SuperTrend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTrendUpdate {
    /// `None` while the ATR is still warming up.
    pub direction: Option<Direction>,
    /// `true` only on the candle where `direction` changed from the prior
    /// emitted direction.
    pub flipped: bool,
}

/// SuperTrend(period, multiplier) maintained across closed candles.
///
/// ATR uses Wilder's smoothing (warm-up = `period` closed candles before the
/// first direction is emitted); the final bands only ratchet toward price,
/// never away from it, per the standard SuperTrend construction.
#[derive(Debug, Clone)]
pub struct SuperTrend {
    config: SuperTrendConfig,
    tr_sum: Decimal,
    tr_count: usize,
    atr: Option<Decimal>,
    prev_close: Option<Decimal>,
    final_upper: Option<Decimal>,
    final_lower: Option<Decimal>,
    direction: Option<Direction>,
    last_flip_boundary: Option<DateTime<Utc>>,
}

impl SuperTrend {
    pub fn new(config: SuperTrendConfig) -> Self {
        assert!(config.period > 0, "period must be positive");
        Self {
            config,
            tr_sum: Decimal::ZERO,
            tr_count: 0,
            atr: None,
            prev_close: None,
            final_upper: None,
            final_lower: None,
            direction: None,
            last_flip_boundary: None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn last_flip_boundary(&self) -> Option<DateTime<Utc>> {
        self.last_flip_boundary
    }

    fn true_range(&self, high: Decimal, low: Decimal) -> Decimal {
        match self.prev_close {
            None => high - low,
            Some(prev_close) => {
                let hl = high - low;
                let hc = (high - prev_close).abs();
                let lc = (low - prev_close).abs();
                hl.max(hc).max(lc)
            }
        }
    }

    fn update_atr(&mut self, tr: Decimal) {
        self.atr = match self.atr {
            Some(prev_atr) => {
                let period = Decimal::from(self.config.period as u64);
                Some((prev_atr * (period - Decimal::ONE) + tr) / period)
            }
            None => {
                self.tr_sum += tr;
                self.tr_count += 1;
                if self.tr_count >= self.config.period {
                    Some(self.tr_sum / Decimal::from(self.config.period as u64))
                } else {
                    None
                }
            }
        };
    }

    /// Feed one closed candle. `boundary` is the candle's boundary start,
    /// recorded when a flip occurs.
    pub fn on_closed_candle(
        &mut self,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        boundary: DateTime<Utc>,
    ) -> SuperTrendUpdate {
        let tr = self.true_range(high, low);
        self.update_atr(tr);

        let Some(atr) = self.atr else {
            self.prev_close = Some(close);
            return SuperTrendUpdate {
                direction: None,
                flipped: false,
            };
        };

        let mid = (high + low) / Decimal::TWO;
        let basic_upper = mid + self.config.multiplier * atr;
        let basic_lower = mid - self.config.multiplier * atr;

        let final_upper = match (self.final_upper, self.prev_close) {
            (Some(prev_final_upper), Some(prev_close))
                if basic_upper < prev_final_upper || prev_close > prev_final_upper =>
            {
                basic_upper
            }
            (Some(prev_final_upper), _) => prev_final_upper,
            (None, _) => basic_upper,
        };
        let final_lower = match (self.final_lower, self.prev_close) {
            (Some(prev_final_lower), Some(prev_close))
                if basic_lower > prev_final_lower || prev_close < prev_final_lower =>
            {
                basic_lower
            }
            (Some(prev_final_lower), _) => prev_final_lower,
            (None, _) => basic_lower,
        };

        let next_direction = match self.direction {
            None => Direction::sign_of(close - final_upper),
            Some(Direction::Up) if close < final_lower => Direction::Down,
            Some(Direction::Down) if close > final_upper => Direction::Up,
            Some(current) => current,
        };

        let flipped = self.direction.is_some_and(|d| d != next_direction) || self.direction.is_none();
        if flipped {
            self.last_flip_boundary = Some(boundary);
            debug!(?next_direction, %boundary, "supertrend direction flip");
        }

        self.direction = Some(next_direction);
        self.final_upper = Some(final_upper);
        self.final_lower = Some(final_lower);
        self.prev_close = Some(close);

        SuperTrendUpdate {
            direction: Some(next_direction),
            flipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn boundary(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(n * 60, 0).unwrap()
    }

    #[test]
    fn no_direction_until_warm_up_completes() {
        let mut st = SuperTrend::new(SuperTrendConfig {
            period: 3,
            multiplier: dec!(3),
        });
        for i in 0..2 {
            let u = st.on_closed_candle(dec!(110), dec!(90), dec!(100), boundary(i));
            assert_eq!(u.direction, None);
        }
        let u = st.on_closed_candle(dec!(110), dec!(90), dec!(100), boundary(2));
        assert!(u.direction.is_some());
    }

    #[test]
    fn direction_flips_at_most_once_per_call() {
        let mut st = SuperTrend::new(SuperTrendConfig {
            period: 2,
            multiplier: dec!(1),
        });
        st.on_closed_candle(dec!(105), dec!(95), dec!(100), boundary(0));
        let first = st.on_closed_candle(dec!(105), dec!(95), dec!(100), boundary(1));
        assert!(first.direction.is_some());

        // Drive price far below the lower band to force a flip to Down.
        let second = st.on_closed_candle(dec!(80), dec!(60), dec!(60), boundary(2));
        if first.direction == Some(Direction::Up) {
            assert_eq!(second.direction, Some(Direction::Down));
            assert!(second.flipped);
            assert_eq!(st.last_flip_boundary(), Some(boundary(2)));
        }
    }
}
