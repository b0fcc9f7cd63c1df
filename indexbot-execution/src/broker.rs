use crate::error::{BrokerRejection, FatalBrokerError, ResolveError, TransientBrokerError};
use async_trait::async_trait;
use indexbot_data::Tick;
use indexbot_instrument::{InstrumentRef, OptionRef, Side};
use rust_decimal::Decimal;
use std::fmt;

/// A quote is just a tick observed directly from the broker rather than
/// folded from a subscription feed; the two share a shape by design so the
/// aggregator can fold quote ticks without a conversion step.
pub type QuoteTick = Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        })
    }
}

#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub option: OptionRef,
    pub action: Action,
    pub qty: u32,
    /// Idempotency key derived from (strategyId, intent, monotonicSeq).
    /// MUST stay stable across retries of the same intent.
    pub client_tag: String,
}

/// Broker order status, normalized from vendor-specific strings. Adapters
/// map {FILLED, TRADED, COMPLETE, COMPLETED} onto `Filled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Filled { avg_fill_price: Decimal, filled_qty: u32 },
    Rejected,
    Unknown,
}

/// The contract the core demands of any broker, live or simulated. No
/// method may block the caller's executor thread for longer than the
/// deadline the caller supplies around the call.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    async fn resolve_option(
        &self,
        root: indexbot_instrument::Root,
        reference_spot: Decimal,
        side: Side,
    ) -> Result<OptionRef, ResolveError>;

    async fn quote_index(&self, instrument: &InstrumentRef) -> Result<QuoteTick, TransientBrokerError>;

    async fn quote_option(&self, option: &OptionRef) -> Result<QuoteTick, TransientBrokerError>;

    async fn place_market_order(
        &self,
        request: PlaceOrderRequest,
    ) -> Result<String, BrokerRejection>;

    async fn order_status(&self, broker_order_id: &str) -> Result<OrderStatus, FatalBrokerError>;
}
