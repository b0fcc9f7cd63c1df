use crate::broker::{Action, BrokerAdapter, OrderStatus, PlaceOrderRequest, QuoteTick};
use crate::error::{BrokerRejection, FatalBrokerError, ResolveError, TransientBrokerError};
use async_trait::async_trait;
use chrono::NaiveDate;
use indexbot_instrument::calendar::Clock;
use indexbot_instrument::{InstrumentRef, OptionRef, Root, Side};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct PaperState {
    index_price: Option<Decimal>,
    option_prices: HashMap<String, Decimal>,
    next_expiry: Option<NaiveDate>,
    next_order_id: u64,
    orders: HashMap<String, OrderStatus>,
    sell_order_count: u64,
}

/// Deterministic simulated broker. Quotes and fills are driven entirely by
/// prices a test (or a backtest harness) feeds in through
/// [`PaperBrokerAdapter::set_index_price`] and
/// [`PaperBrokerAdapter::set_option_price`] - this adapter never reaches out
/// to a real venue, so paper and live quotes can never be mixed within one
/// run (spec.md §9).
pub struct PaperBrokerAdapter {
    clock: Arc<dyn Clock>,
    instrument: InstrumentRef,
    state: Mutex<PaperState>,
}

impl std::fmt::Debug for PaperBrokerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperBrokerAdapter")
            .field("instrument", &self.instrument)
            .finish_non_exhaustive()
    }
}

impl PaperBrokerAdapter {
    pub fn new(clock: Arc<dyn Clock>, instrument: InstrumentRef) -> Self {
        Self {
            clock,
            instrument,
            state: Mutex::new(PaperState {
                index_price: None,
                option_prices: HashMap::new(),
                next_expiry: None,
                next_order_id: 0,
                orders: HashMap::new(),
                sell_order_count: 0,
            }),
        }
    }

    /// Number of SELL orders placed so far - lets a test assert that a
    /// scenario triggered exactly one exit, not two racing ones.
    pub fn sell_order_count(&self) -> u64 {
        self.state.lock().sell_order_count
    }

    pub fn set_index_price(&self, price: Decimal) {
        self.state.lock().index_price = Some(price);
    }

    pub fn set_option_price(&self, broker_security_id: &str, price: Decimal) {
        self.state
            .lock()
            .option_prices
            .insert(broker_security_id.to_string(), price);
    }

    pub fn set_next_expiry(&self, expiry: NaiveDate) {
        self.state.lock().next_expiry = Some(expiry);
    }

    fn security_id(&self, root: Root, expiry: NaiveDate, strike: Decimal, side: Side) -> String {
        format!("PAPER:{root}:{expiry}:{strike}:{side}")
    }
}

#[async_trait]
impl BrokerAdapter for PaperBrokerAdapter {
    async fn resolve_option(
        &self,
        root: Root,
        reference_spot: Decimal,
        side: Side,
    ) -> Result<OptionRef, ResolveError> {
        let strike = self.instrument.atm_strike(reference_spot);
        let expiry = self
            .state
            .lock()
            .next_expiry
            .ok_or_else(|| ResolveError("no simulated expiry configured".to_string()))?;
        let broker_security_id = self.security_id(root, expiry, strike, side);
        Ok(OptionRef {
            root,
            expiry_date: expiry,
            strike,
            side,
            broker_security_id,
        })
    }

    async fn quote_index(&self, _instrument: &InstrumentRef) -> Result<QuoteTick, TransientBrokerError> {
        let price = self
            .state
            .lock()
            .index_price
            .ok_or_else(|| TransientBrokerError("no simulated index price set".to_string()))?;
        Ok(QuoteTick::new(self.clock.now_utc(), price))
    }

    async fn quote_option(&self, option: &OptionRef) -> Result<QuoteTick, TransientBrokerError> {
        let price = self
            .state
            .lock()
            .option_prices
            .get(&option.broker_security_id)
            .copied()
            .ok_or_else(|| TransientBrokerError(format!("no simulated quote for {option}")))?;
        Ok(QuoteTick::new(self.clock.now_utc(), price))
    }

    async fn place_market_order(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<String, BrokerRejection> {
        let mut state = self.state.lock();
        let Some(&fill_price) = state.option_prices.get(&request.option.broker_security_id) else {
            return Err(BrokerRejection(format!(
                "no simulated liquidity for {}",
                request.option
            )));
        };

        let order_id = format!("PAPER-ORDER-{}", state.next_order_id);
        state.next_order_id += 1;
        if request.action == Action::Sell {
            state.sell_order_count += 1;
        }
        state.orders.insert(
            order_id.clone(),
            OrderStatus::Filled {
                avg_fill_price: fill_price,
                filled_qty: request.qty,
            },
        );
        debug!(%order_id, action = %request.action, tag = %request.client_tag, "paper order filled");
        Ok(order_id)
    }

    async fn order_status(&self, broker_order_id: &str) -> Result<OrderStatus, FatalBrokerError> {
        Ok(self
            .state
            .lock()
            .orders
            .get(broker_order_id)
            .copied()
            .unwrap_or(OrderStatus::Unknown))
    }
}
