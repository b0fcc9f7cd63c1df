use crate::{candle::Candle, tick::Tick};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use tracing::debug;

fn boundary_of(wall_time_utc: DateTime<Utc>, interval_seconds: i64) -> DateTime<Utc> {
    let floored = (wall_time_utc.timestamp() / interval_seconds) * interval_seconds;
    Utc.timestamp_opt(floored, 0).single().expect("boundary timestamp in range")
}

/// Folds a per-instrument tick stream into fixed-interval OHLC candles.
///
/// One [`CandleAggregator`] is scoped to a single `(instrument, interval)`
/// pair; the engine holds one per instance per spec.md §4.3. Ticks must be
/// fed in non-decreasing `wall_time_utc` order - the aggregator never
/// reorders or interpolates across a missing boundary, it simply never emits
/// an event for a period with no ticks.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    interval_seconds: i64,
    current: Option<Candle>,
}

impl CandleAggregator {
    pub fn new(interval_seconds: i64) -> Self {
        assert!(interval_seconds > 0, "interval_seconds must be positive");
        Self {
            interval_seconds,
            current: None,
        }
    }

    /// Fold `tick` into the in-progress candle, returning the just-closed
    /// candle if `tick` crossed into a new boundary.
    pub fn on_tick(&mut self, tick: Tick) -> Option<Candle> {
        let boundary = boundary_of(tick.wall_time_utc, self.interval_seconds);

        match self.current {
            Some(candle) if boundary == candle.boundary_start_utc => {
                self.current = Some({
                    let mut c = candle;
                    c.fold(tick.last_price);
                    c
                });
                None
            }
            Some(candle) if boundary > candle.boundary_start_utc => {
                let mut closed = candle;
                closed.closed = true;
                debug!(boundary = %closed.boundary_start_utc, "candle closed");
                self.current = Some(Candle::open_at(boundary, tick.last_price));
                Some(closed)
            }
            Some(_) => {
                // A tick arrived for a boundary strictly before the current
                // one - out of order input the caller must not feed us.
                None
            }
            None => {
                self.current = Some(Candle::open_at(boundary, tick.last_price));
                None
            }
        }
    }

    /// The in-progress (unclosed) candle, if any ticks have been folded
    /// since the last restart.
    pub fn in_progress(&self) -> Option<Candle> {
        self.current
    }

    /// Discard any partial candle. Called once at engine start so a
    /// restart never emits a candle built from ticks observed before the
    /// restart (spec.md §4.3 restart policy).
    pub fn restart(&mut self) {
        self.current = None;
    }
}

/// Multiple instruments' aggregators keyed by an arbitrary caller-chosen key
/// (typically an instrument identity), all sharing one `interval_seconds`.
#[derive(Debug, Clone, Default)]
pub struct CandleAggregatorMap<K> {
    interval_seconds: i64,
    aggregators: HashMap<K, CandleAggregator>,
}

impl<K> CandleAggregatorMap<K>
where
    K: std::hash::Hash + Eq + Clone,
{
    pub fn new(interval_seconds: i64) -> Self {
        Self {
            interval_seconds,
            aggregators: HashMap::new(),
        }
    }

    pub fn on_tick(&mut self, key: K, tick: Tick) -> Option<Candle> {
        self.aggregators
            .entry(key)
            .or_insert_with(|| CandleAggregator::new(self.interval_seconds))
            .on_tick(tick)
    }
}
