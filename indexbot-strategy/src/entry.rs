use indexbot_instrument::{InstrumentRef, Side};
use indexbot_ta::{Direction, MacdConfirmation};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

/// Everything the entry gate needs from the rest of the engine that isn't
/// the indicator signal itself.
#[derive(Debug, Clone, Copy)]
pub struct EntryGate {
    pub within_entry_window: bool,
    pub daily_loss_tripped: bool,
    pub trades_taken_today: u32,
    pub closed_candles_since_last_exit: u32,
}

impl EntryGate {
    fn passes(&self, max_trades_per_day: u32, min_gap_candles: u32) -> bool {
        self.within_entry_window
            && !self.daily_loss_tripped
            && self.trades_taken_today < max_trades_per_day
            && self.closed_candles_since_last_exit >= min_gap_candles
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EntryConfig {
    pub use_macd: bool,
    pub initial_stop_points: Decimal,
    /// 0 disables risk-based sizing in favour of `configured_lots`.
    pub risk_per_trade_rupees: Decimal,
    pub configured_lots: u32,
    pub max_trades_per_day: u32,
    pub min_gap_candles_between_trades: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryCandidate {
    pub side: Side,
    pub strike: Decimal,
    pub qty: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EntryEvaluator;

impl EntryEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// `flipped` and `direction` must come from the same just-closed
    /// boundary - flip-only entry (spec.md §4.6) requires the direction to
    /// have changed AT this candle, not merely to currently disagree with
    /// no open position.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        config: &EntryConfig,
        instrument: &InstrumentRef,
        gate: EntryGate,
        direction: Option<Direction>,
        flipped: bool,
        macd: Option<MacdConfirmation>,
        spot_at_close: Decimal,
    ) -> Option<EntryCandidate> {
        if !gate.passes(config.max_trades_per_day, config.min_gap_candles_between_trades) {
            return None;
        }

        let direction = direction?;
        if !flipped {
            return None;
        }

        if config.use_macd && macd != Some(MacdConfirmation::Confirmed) {
            debug!("entry skipped: macd did not confirm the supertrend candidate");
            return None;
        }

        let side = match direction {
            Direction::Up => Side::Call,
            Direction::Down => Side::Put,
        };
        let strike = instrument.atm_strike(spot_at_close);
        let qty = self.size_position(config, instrument.lot_size);

        Some(EntryCandidate { side, strike, qty })
    }

    fn size_position(&self, config: &EntryConfig, lot_size: u32) -> u32 {
        let lots = if config.risk_per_trade_rupees > Decimal::ZERO && config.initial_stop_points > Decimal::ZERO {
            let risk_per_lot = config.initial_stop_points * Decimal::from(lot_size);
            let lots = (config.risk_per_trade_rupees / risk_per_lot)
                .floor()
                .to_u32()
                .unwrap_or(0);
            lots.max(1)
        } else {
            config.configured_lots
        };
        lots * lot_size
    }
}
