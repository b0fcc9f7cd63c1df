use crate::broadcaster::Broadcaster;
use crate::config::EngineConfig;
use crate::snapshot::{ActionKind, IndicatorSnapshot, LastAction, PositionSnapshot, RiskBookSnapshot, Snapshot};
use crate::EngineError;
use chrono::{DateTime, Utc};
use indexbot_data::{Candle, CandleAggregator, Tick};
use indexbot_execution::{Action, BrokerAdapter, OrderExecutor, OrderOutcome, PlaceOrderRequest};
use indexbot_instrument::calendar::{to_ist, Clock, SessionCalendar};
use indexbot_instrument::InstrumentRef;
use indexbot_journal::{Mode, TradeClose, TradeJournal, TradeRecord};
use indexbot_risk::{Anchors, ExitReason, Position, PositionState, RiskBook, RiskConfig, RiskEvaluator};
use indexbot_strategy::{EntryConfig, EntryEvaluator, EntryGate};
use indexbot_ta::{Macd, SuperTrend, SuperTrendConfig};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Owns everything mutable for one strategy instance and is the sole writer
/// of that state. Two tick streams drive it: index ticks
/// ([`Engine::on_index_tick`]) feed the candle aggregator and the
/// indicator/entry/reversal logic, option ticks ([`Engine::on_option_tick`])
/// feed the open position's risk evaluation, since both the SuperTrend
/// signal and the position's stop/target math key off different instruments
/// (spec.md §4).
pub struct Engine {
    strategy_instance_id: String,
    mode: Mode,
    instrument: InstrumentRef,
    clock: Arc<dyn Clock>,
    broker: Arc<dyn BrokerAdapter>,
    journal: Arc<dyn TradeJournal>,
    executor: OrderExecutor,
    config: EngineConfig,
    aggregator: CandleAggregator,
    supertrend: SuperTrend,
    macd: Option<Macd>,
    risk: RiskEvaluator,
    risk_book: RiskBook,
    position: Option<Position>,
    running: bool,
    manual_exit_requested: bool,
    pending_exit_reason: Option<ExitReason>,
    closed_candles_since_last_exit: u32,
    trade_seq: u64,
    last_tick_at: Option<DateTime<Utc>>,
    last_candle_boundary_at: Option<DateTime<Utc>>,
    last_direction: Option<indexbot_ta::Direction>,
    last_flip_at: Option<DateTime<Utc>>,
    last_action: Option<LastAction>,
    broadcaster: Broadcaster<Snapshot>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("strategy_instance_id", &self.strategy_instance_id)
            .field("running", &self.running)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        strategy_instance_id: String,
        mode: Mode,
        instrument: InstrumentRef,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        broker: Arc<dyn BrokerAdapter>,
        journal: Arc<dyn TradeJournal>,
    ) -> Self {
        let supertrend = SuperTrend::new(SuperTrendConfig {
            period: config.supertrend_period,
            multiplier: config.supertrend_multiplier,
        });
        let macd = macd_from_config(&config);
        let executor = OrderExecutor::new(config.order_poll_interval, config.order_fill_timeout);
        let aggregator = CandleAggregator::new(config.interval_seconds);
        let risk_book = RiskBook::new(clock.now_ist());

        Self {
            strategy_instance_id,
            mode,
            instrument,
            clock,
            broker,
            journal,
            executor,
            config,
            aggregator,
            supertrend,
            macd,
            risk: RiskEvaluator::new(),
            risk_book,
            position: None,
            running: false,
            manual_exit_requested: false,
            pending_exit_reason: None,
            closed_candles_since_last_exit: 0,
            trade_seq: 0,
            last_tick_at: None,
            last_candle_boundary_at: None,
            last_direction: None,
            last_flip_at: None,
            last_action: None,
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn start(&mut self) {
        info!(strategy_instance_id = %self.strategy_instance_id, "engine started");
        self.running = true;
    }

    pub fn stop(&mut self) {
        info!(strategy_instance_id = %self.strategy_instance_id, "engine stopped");
        self.running = false;
    }

    /// Requests a manual squareoff of an open position on the next index
    /// tick. A no-op if no position is open or one is already closing.
    pub fn request_squareoff(&mut self) {
        self.manual_exit_requested = true;
    }

    pub fn update_config(&mut self, patch: crate::config::ConfigPatch) -> Result<(), EngineError> {
        let use_macd_changed = patch.use_macd.is_some();
        self.config.apply_patch(patch, self.position.is_none())?;
        if use_macd_changed {
            self.macd = macd_from_config(&self.config);
        }
        Ok(())
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<Snapshot> {
        self.broadcaster.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            strategy_instance_id: self.strategy_instance_id.clone(),
            mode: self.mode,
            running: self.running,
            last_tick_at: self.last_tick_at,
            last_candle_boundary_at: self.last_candle_boundary_at,
            indicator: IndicatorSnapshot {
                direction: self.last_direction,
                flipped_at: self.last_flip_at,
            },
            position: self.position.as_ref().map(|position| PositionSnapshot {
                side: position.side,
                strike: position.option.strike,
                expiry: position.option.expiry_date,
                entry_price: position.entry_price,
                qty: position.qty,
                unrealized_pnl: position.unrealized_pnl(position.entry_price),
                anchors: position.anchors,
            }),
            risk_book: RiskBookSnapshot {
                realized_pnl_today: self.risk_book.realized_pnl_today,
                trades_taken_today: self.risk_book.trades_taken_today,
                daily_loss_tripped: self.risk_book.daily_loss_tripped,
            },
            last_action: self.last_action.clone(),
        }
    }

    fn publish_snapshot(&mut self) {
        let snapshot = self.snapshot();
        self.broadcaster.publish(snapshot);
    }

    fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            daily_max_loss_rupees: self.config.daily_max_loss_rupees,
            max_loss_per_trade_rupees: self.config.max_loss_per_trade_rupees,
            initial_stop_points: self.config.initial_stop_points,
            target_points: self.config.target_points,
            trail_start_points: self.config.trail_start_points,
            trail_step_points: self.config.trail_step_points,
            min_hold_before_reversal: chrono::Duration::from_std(self.config.min_hold_before_reversal)
                .unwrap_or_else(|_| chrono::Duration::zero()),
        }
    }

    /// The exchange session/entry/force-flat window, built fresh from the
    /// live config every call so a hot-swapped cutoff takes effect on the
    /// very next tick (spec.md §4.1).
    fn session_calendar(&self) -> SessionCalendar {
        SessionCalendar {
            session_open: self.config.session_open_ist,
            session_close: self.config.session_close_ist,
            entry_open: self.config.entry_open_ist,
            entry_close: self.config.entry_close_ist,
            force_flat: self.config.force_flat_ist,
        }
    }

    /// Risk-relevant tick on the held option's own LTP: daily/per-trade
    /// loss, initial stop, target and trailing stop all key off this price,
    /// never the index (spec.md §4.5).
    pub async fn on_option_tick(&mut self, tick: Tick) -> Result<(), EngineError> {
        if !self.running {
            self.publish_snapshot();
            return Ok(());
        }

        match self.position.as_ref().map(|position| position.state) {
            Some(PositionState::Closing) => self.poll_pending_exit().await?,
            Some(PositionState::Open) => {
                let risk_config = self.risk_config();
                let mut position = self.position.take().expect("state checked above");
                let reason = self
                    .risk
                    .evaluate_tick(&risk_config, &mut position, &mut self.risk_book, tick.last_price);
                self.position = Some(position);
                if let Some(reason) = reason {
                    self.submit_exit(reason).await?;
                }
            }
            _ => {}
        }

        self.publish_snapshot();
        Ok(())
    }

    /// Index tick: folds into the candle aggregator unconditionally, then
    /// checks the triggers that depend on wall time, operator action, or a
    /// pending exit - in that order, each capable of closing the position
    /// the candle fold above may have just opened or exited.
    pub async fn on_index_tick(&mut self, tick: Tick) -> Result<(), EngineError> {
        self.last_tick_at = Some(tick.wall_time_utc);
        let now_ist = to_ist(tick.wall_time_utc);
        self.risk_book.roll_if_new_day(now_ist);

        if !self.running {
            self.publish_snapshot();
            return Ok(());
        }

        // Outside the exchange session entirely, with no position to manage,
        // there is nothing to do with this tick (spec.md §4.1 step 1). This
        // is distinct from the in-session early-return triggers below: those
        // must never skip the candle fold, this one is the session gate
        // itself and runs before a candle concept even applies.
        if self.position.is_none() && !self.session_calendar().within_session(now_ist) {
            self.publish_snapshot();
            return Ok(());
        }

        if let Some(candle) = self.aggregator.on_tick(tick) {
            self.on_closed_candle(candle).await?;
        }

        if self.position.as_ref().is_some_and(|position| position.state == PositionState::Open) {
            if self.manual_exit_requested {
                self.manual_exit_requested = false;
                self.submit_exit(ExitReason::ManualSquareoff).await?;
                self.publish_snapshot();
                return Ok(());
            }
            if self.session_calendar().at_or_after_force_flat(now_ist) {
                self.submit_exit(ExitReason::ForceFlat).await?;
                self.publish_snapshot();
                return Ok(());
            }
        } else {
            self.manual_exit_requested = false;
        }

        if self.position.as_ref().is_some_and(|position| position.state == PositionState::Closing) {
            self.poll_pending_exit().await?;
        }

        self.publish_snapshot();
        Ok(())
    }

    async fn on_closed_candle(&mut self, candle: Candle) -> Result<(), EngineError> {
        self.last_candle_boundary_at = Some(candle.boundary_start_utc);
        let update = self
            .supertrend
            .on_closed_candle(candle.high, candle.low, candle.close, candle.boundary_start_utc);
        self.last_direction = update.direction;
        if update.flipped {
            self.last_flip_at = Some(candle.boundary_start_utc);
        }
        let macd_output = self.macd.as_mut().map(|macd| macd.on_closed_candle(candle.close));
        self.closed_candles_since_last_exit += 1;

        if let Some(position) = self.position.as_ref() {
            if position.state == PositionState::Open {
                if let Some(reason) =
                    self.risk
                        .evaluate_reversal(&self.risk_config(), position, update.direction, candle.boundary_start_utc)
                {
                    self.submit_exit(reason).await?;
                    return Ok(());
                }
            }
        }

        if self.position.is_none() {
            let gate = EntryGate {
                within_entry_window: self.session_calendar().within_entry_window(to_ist(candle.boundary_start_utc)),
                daily_loss_tripped: self.risk_book.daily_loss_tripped,
                trades_taken_today: self.risk_book.trades_taken_today,
                closed_candles_since_last_exit: self.closed_candles_since_last_exit,
            };
            let entry_config = EntryConfig {
                use_macd: self.config.use_macd,
                initial_stop_points: self.config.initial_stop_points,
                risk_per_trade_rupees: self.config.risk_per_trade_rupees,
                configured_lots: self.config.configured_lots,
                max_trades_per_day: self.config.max_trades_per_day,
                min_gap_candles_between_trades: self.config.min_gap_candles_between_trades,
            };
            let macd_confirmation = macd_output
                .zip(update.direction)
                .map(|(output, direction)| output.confirms(direction));

            if let Some(candidate) = EntryEvaluator::new().evaluate(
                &entry_config,
                &self.instrument,
                gate,
                update.direction,
                update.flipped,
                macd_confirmation,
                candle.close,
            ) {
                self.submit_entry(candidate.side, candidate.qty, candle.close).await?;
            }
        }

        Ok(())
    }

    async fn submit_entry(&mut self, side: indexbot_instrument::Side, qty: u32, reference_spot: Decimal) -> Result<(), EngineError> {
        let option = match self.broker.resolve_option(self.instrument.root, reference_spot, side).await {
            Ok(option) => option,
            Err(err) => {
                warn!(%err, "entry skipped: could not resolve an option contract");
                return Ok(());
            }
        };

        self.trade_seq += 1;
        let client_tag = format!("{}-{}-ENTRY", self.strategy_instance_id, self.trade_seq);
        let outcome = self
            .executor
            .place_and_confirm(
                self.broker.as_ref(),
                PlaceOrderRequest {
                    option: option.clone(),
                    action: Action::Buy,
                    qty,
                    client_tag,
                },
            )
            .await;

        match outcome {
            OrderOutcome::Filled { broker_order_id, avg_fill_price, filled_qty } => {
                let mut position = Position::opening(
                    option.clone(),
                    side,
                    self.clock.now_utc(),
                    avg_fill_price,
                    filled_qty,
                    Anchors::new(avg_fill_price - self.config.initial_stop_points),
                    broker_order_id.clone(),
                );
                position.mark_open();

                let record = TradeRecord::opened(
                    broker_order_id,
                    self.clock.now_utc(),
                    side,
                    option.strike,
                    option.expiry_date,
                    avg_fill_price,
                    filled_qty,
                    self.mode,
                    self.instrument.root,
                );
                self.journal.write_open(record).await?;

                self.closed_candles_since_last_exit = 0;
                self.last_action = Some(LastAction {
                    kind: ActionKind::Entry,
                    at: self.clock.now_utc(),
                    reason: None,
                });
                self.position = Some(position);
            }
            OrderOutcome::BuyAbandoned { broker_order_id } => {
                warn!(%broker_order_id, "entry order abandoned after its fill deadline elapsed");
            }
            OrderOutcome::Rejected { reason } => {
                warn!(%reason, "entry order rejected");
            }
            OrderOutcome::SellStillPending { .. } => unreachable!("entry orders are always BUY"),
        }

        Ok(())
    }

    async fn submit_exit(&mut self, reason: ExitReason) -> Result<(), EngineError> {
        let Some(mut position) = self.position.take() else {
            return Ok(());
        };

        self.trade_seq += 1;
        let client_tag = format!("{}-{}-EXIT", self.strategy_instance_id, self.trade_seq);
        let outcome = self
            .executor
            .place_and_confirm(
                self.broker.as_ref(),
                PlaceOrderRequest {
                    option: position.option.clone(),
                    action: Action::Sell,
                    qty: position.qty,
                    client_tag,
                },
            )
            .await;

        match outcome {
            OrderOutcome::Filled { broker_order_id, avg_fill_price, .. } => {
                position.mark_closing(broker_order_id);
                position.mark_closed();
                self.finalize_close(position, avg_fill_price, reason).await?;
            }
            OrderOutcome::SellStillPending { broker_order_id } => {
                position.mark_closing(broker_order_id);
                self.pending_exit_reason = Some(reason);
                self.position = Some(position);
            }
            OrderOutcome::Rejected { reason: rejection } => {
                error!(%rejection, %reason, "exit order rejected, position remains open");
                self.position = Some(position);
            }
            OrderOutcome::BuyAbandoned { .. } => unreachable!("exit orders are always SELL"),
        }

        Ok(())
    }

    async fn poll_pending_exit(&mut self) -> Result<(), EngineError> {
        let Some(mut position) = self.position.take() else {
            return Ok(());
        };
        let exit_order_id = position
            .exit_order_id
            .clone()
            .expect("a Closing position always has an exit_order_id");

        let outcome = self.executor.confirm_existing(self.broker.as_ref(), &exit_order_id, Action::Sell).await;
        match outcome {
            OrderOutcome::Filled { avg_fill_price, .. } => {
                position.mark_closed();
                let reason = self.pending_exit_reason.take().unwrap_or(ExitReason::ManualSquareoff);
                self.finalize_close(position, avg_fill_price, reason).await?;
            }
            OrderOutcome::SellStillPending { .. } => {
                self.position = Some(position);
            }
            OrderOutcome::Rejected { reason } => {
                error!(%reason, %exit_order_id, "exit confirmation rejected after acceptance, reverting to open");
                position.revert_to_open();
                self.position = Some(position);
            }
            OrderOutcome::BuyAbandoned { .. } => unreachable!("pending exits are always SELL"),
        }
        Ok(())
    }

    async fn finalize_close(&mut self, position: Position, exit_price: Decimal, reason: ExitReason) -> Result<(), EngineError> {
        let realized = TradeRecord::realized_pnl(position.entry_price, exit_price, position.qty);
        let close = TradeClose::new(self.clock.now_utc(), exit_price, realized, reason);
        self.journal.write_close(&position.open_order_id, close).await?;
        self.risk_book.record_realized_close(realized);
        self.closed_candles_since_last_exit = 0;
        self.last_action = Some(LastAction {
            kind: ActionKind::Exit,
            at: self.clock.now_utc(),
            reason: Some(reason.to_string()),
        });
        info!(%reason, %realized, "position closed");
        Ok(())
    }
}

fn macd_from_config(config: &EngineConfig) -> Option<Macd> {
    if !config.use_macd {
        return None;
    }
    match config.macd_params {
        Some(params) => Some(Macd::new(params.fast, params.slow, params.signal)),
        None => {
            warn!("use_macd is enabled but no macd_params were configured; entries will never confirm");
            None
        }
    }
}
