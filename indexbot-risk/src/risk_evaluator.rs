use crate::position::Position;
use crate::risk_book::RiskBook;
use chrono::{DateTime, Duration, Utc};
use indexbot_instrument::Side;
use indexbot_ta::Direction;
use rust_decimal::Decimal;
use std::fmt;
use tracing::info;

/// Points- and rupee-denominated risk parameters read from
/// [`EngineConfig`](indexbot_risk). `Decimal::ZERO` disables the
/// corresponding rule, matching the "0=disabled" convention used throughout
/// the rest of the engine's configuration.
#[derive(Debug, Clone, Copy)]
pub struct RiskConfig {
    pub daily_max_loss_rupees: Decimal,
    pub max_loss_per_trade_rupees: Decimal,
    pub initial_stop_points: Decimal,
    pub target_points: Decimal,
    pub trail_start_points: Decimal,
    pub trail_step_points: Decimal,
    pub min_hold_before_reversal: Duration,
}

/// Why a position was exited. Priority order matches spec.md §4.5: lower
/// variants here win whenever more than one rule would fire on the same
/// tick, because the evaluator checks them in this order and returns on the
/// first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    DailyMaxLoss,
    PerTradeMaxLoss,
    InitialStop,
    Target,
    TrailingStop,
    Reversal,
    ForceFlat,
    ManualSquareoff,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitReason::DailyMaxLoss => "Daily Max Loss",
            ExitReason::PerTradeMaxLoss => "Max Loss Per Trade",
            ExitReason::InitialStop => "Initial SL",
            ExitReason::Target => "Target",
            ExitReason::TrailingStop => "Trail SL",
            ExitReason::Reversal => "Reversal",
            ExitReason::ForceFlat => "Force Squareoff",
            ExitReason::ManualSquareoff => "Manual Squareoff",
        };
        f.write_str(label)
    }
}

/// Stateless, priority-ordered evaluator for the tick- and candle-close-level
/// triggers in spec.md §4.5. Force Flat, the third (wall-time) trigger, is
/// evaluated by the engine directly against the exchange calendar rather than
/// through this evaluator, since it is a pure function of wall time with no
/// position-side-dependent logic of its own. The engine loop calls whichever
/// of these methods applies and stops at the first `Some`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RiskEvaluator;

impl RiskEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Runs triggers 1-5. Mutates `risk_book` (daily-loss trip) and
    /// `position.anchors` (trailing-stop ratchet) in place since those are
    /// the only pieces of mutable state the tick-level rules own.
    pub fn evaluate_tick(
        &self,
        config: &RiskConfig,
        position: &mut Position,
        risk_book: &mut RiskBook,
        ltp: Decimal,
    ) -> Option<ExitReason> {
        let unrealized = position.unrealized_pnl(ltp);

        if config.daily_max_loss_rupees > Decimal::ZERO
            && risk_book.realized_pnl_today + unrealized <= -config.daily_max_loss_rupees
        {
            risk_book.trip_daily_loss();
            info!(%unrealized, "daily max loss tripped");
            return Some(ExitReason::DailyMaxLoss);
        }

        if config.max_loss_per_trade_rupees > Decimal::ZERO
            && unrealized <= -config.max_loss_per_trade_rupees
        {
            return Some(ExitReason::PerTradeMaxLoss);
        }

        if config.initial_stop_points > Decimal::ZERO
            && ltp <= position.entry_price - config.initial_stop_points
        {
            return Some(ExitReason::InitialStop);
        }

        if config.target_points > Decimal::ZERO && ltp >= position.entry_price + config.target_points
        {
            return Some(ExitReason::Target);
        }

        if config.trail_start_points > Decimal::ZERO && config.trail_step_points > Decimal::ZERO {
            self.ratchet_trailing_stop(config, position, ltp);
            if let Some(trailing_stop) = position.anchors.trailing_stop {
                if ltp <= trailing_stop {
                    return Some(ExitReason::TrailingStop);
                }
            }
        }

        None
    }

    fn ratchet_trailing_stop(&self, config: &RiskConfig, position: &mut Position, ltp: Decimal) {
        match position.anchors.high_water_mark_price {
            None => {
                if ltp - position.entry_price >= config.trail_start_points {
                    position.anchors.high_water_mark_price = Some(ltp);
                    position.anchors.trailing_stop = Some(ltp - config.trail_step_points);
                }
            }
            Some(high_water_mark) if ltp > high_water_mark => {
                position.anchors.high_water_mark_price = Some(ltp);
                let candidate = ltp - config.trail_step_points;
                position.anchors.trailing_stop = Some(
                    position
                        .anchors
                        .trailing_stop
                        .map_or(candidate, |stop| stop.max(candidate)),
                );
            }
            Some(_) => {}
        }
    }

    /// Trigger 6 (Reversal). Only meaningful on an index candle close.
    pub fn evaluate_reversal(
        &self,
        config: &RiskConfig,
        position: &Position,
        direction: Option<Direction>,
        now: DateTime<Utc>,
    ) -> Option<ExitReason> {
        let direction = direction?;
        let opposes = match position.side {
            Side::Call => direction == Direction::Down,
            Side::Put => direction == Direction::Up,
        };
        if opposes && now - position.entry_time >= config.min_hold_before_reversal {
            Some(ExitReason::Reversal)
        } else {
            None
        }
    }
}
