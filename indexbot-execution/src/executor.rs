use crate::broker::{Action, BrokerAdapter, OrderStatus, PlaceOrderRequest};
use crate::error::BrokerRejection;
use indexbot_instrument::OptionRef;
use indexbot_integration::{with_deadline, DeadlineError, Priority, RateLimiter};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, warn};

/// Outcome of driving one order through to a terminal state (or to the
/// caller's deadline, for SELL).
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled { broker_order_id: String, avg_fill_price: Decimal, filled_qty: u32 },
    /// BUY-side timeout: the attempt is abandoned, no Position exists.
    BuyAbandoned { broker_order_id: String },
    /// SELL-side timeout: Position stays CLOSING, caller keeps polling.
    SellStillPending { broker_order_id: String },
    Rejected { reason: String },
}

/// Places one order and polls it to a terminal state, honouring the
/// exactly-once and timeout-handling rules in spec.md §4.7. Carries no
/// Position-level state itself - the caller (engine loop / strategy) owns
/// the single-in-flight-SELL invariant by only ever calling this once per
/// intent and checking `Position.exit_order_id` before calling again.
///
/// Every broker call is paced through a shared [`RateLimiter`]: a fatal
/// broker error backs the interval off, a clean call resets it (spec.md §5).
#[derive(Debug, Clone)]
pub struct OrderExecutor {
    pub poll_interval: Duration,
    pub fill_timeout: Duration,
    rate_limiter: RateLimiter,
}

impl OrderExecutor {
    pub fn new(poll_interval: Duration, fill_timeout: Duration) -> Self {
        Self {
            poll_interval,
            fill_timeout,
            rate_limiter: RateLimiter::new(poll_interval, fill_timeout.max(poll_interval)),
        }
    }

    /// Places `request` and polls until FILLED, REJECTED, or `fill_timeout`
    /// elapses. `request.client_tag` must already be the final, stable tag
    /// for this intent - this method performs no retries of its own.
    pub async fn place_and_confirm(
        &self,
        broker: &dyn BrokerAdapter,
        request: PlaceOrderRequest,
    ) -> OrderOutcome {
        let action = request.action;
        let option = request.option.clone();

        self.rate_limiter.wait(Priority::High).await;
        let broker_order_id = match broker.place_market_order(request).await {
            Ok(id) => {
                self.rate_limiter.reset().await;
                id
            }
            Err(BrokerRejection(reason)) => {
                warn!(%reason, %action, %option, "order placement rejected");
                return OrderOutcome::Rejected { reason };
            }
        };

        match with_deadline(self.fill_timeout, self.poll_until_terminal(broker, &broker_order_id)).await
        {
            Ok(outcome) => outcome,
            Err(DeadlineError(_)) => {
                warn!(%broker_order_id, %action, "order fill poll hit its deadline while still pending");
                match action {
                    Action::Buy => OrderOutcome::BuyAbandoned { broker_order_id },
                    Action::Sell => OrderOutcome::SellStillPending { broker_order_id },
                }
            }
        }
    }

    /// Resumes polling a previously-placed order, without placing a new
    /// one. The caller (the engine loop) uses this once a SELL has already
    /// been accepted by the broker but the prior call's deadline elapsed
    /// before a terminal status came back - re-placing would violate the
    /// at-most-one-SELL-in-flight invariant.
    pub async fn confirm_existing(
        &self,
        broker: &dyn BrokerAdapter,
        broker_order_id: &str,
        action: Action,
    ) -> OrderOutcome {
        match with_deadline(self.fill_timeout, self.poll_until_terminal(broker, broker_order_id)).await {
            Ok(outcome) => outcome,
            Err(DeadlineError(_)) => {
                warn!(%broker_order_id, %action, "order fill poll hit its deadline while still pending");
                match action {
                    Action::Buy => OrderOutcome::BuyAbandoned {
                        broker_order_id: broker_order_id.to_string(),
                    },
                    Action::Sell => OrderOutcome::SellStillPending {
                        broker_order_id: broker_order_id.to_string(),
                    },
                }
            }
        }
    }

    async fn poll_until_terminal(&self, broker: &dyn BrokerAdapter, broker_order_id: &str) -> OrderOutcome {
        loop {
            self.rate_limiter.wait(Priority::Normal).await;
            match broker.order_status(broker_order_id).await {
                Ok(OrderStatus::Filled { avg_fill_price, filled_qty }) => {
                    self.rate_limiter.reset().await;
                    return OrderOutcome::Filled {
                        broker_order_id: broker_order_id.to_string(),
                        avg_fill_price,
                        filled_qty,
                    };
                }
                Ok(OrderStatus::Rejected) => {
                    self.rate_limiter.reset().await;
                    return OrderOutcome::Rejected {
                        reason: "broker reported REJECTED".to_string(),
                    };
                }
                Ok(OrderStatus::Pending | OrderStatus::Unknown) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(err) => {
                    self.rate_limiter.report_violation().await;
                    error!(%err, %broker_order_id, "order status poll failed fatally");
                    return OrderOutcome::Rejected { reason: err.to_string() };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::QuoteTick;
    use crate::error::{FatalBrokerError, ResolveError, TransientBrokerError};
    use async_trait::async_trait;
    use indexbot_instrument::{InstrumentRef, Root, Side};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct ScriptedBroker {
        statuses: Mutex<Vec<OrderStatus>>,
    }

    #[async_trait]
    impl BrokerAdapter for ScriptedBroker {
        async fn resolve_option(
            &self,
            _root: Root,
            _reference_spot: Decimal,
            _side: Side,
        ) -> Result<OptionRef, ResolveError> {
            unimplemented!()
        }

        async fn quote_index(&self, _instrument: &InstrumentRef) -> Result<QuoteTick, TransientBrokerError> {
            unimplemented!()
        }

        async fn quote_option(&self, _option: &OptionRef) -> Result<QuoteTick, TransientBrokerError> {
            unimplemented!()
        }

        async fn place_market_order(&self, _request: PlaceOrderRequest) -> Result<String, BrokerRejection> {
            Ok("order-1".to_string())
        }

        async fn order_status(&self, _broker_order_id: &str) -> Result<OrderStatus, FatalBrokerError> {
            let mut statuses = self.statuses.lock();
            if statuses.len() > 1 {
                Ok(statuses.remove(0))
            } else {
                Ok(statuses[0])
            }
        }
    }

    fn sample_option() -> OptionRef {
        OptionRef {
            root: Root::Nifty,
            expiry_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            strike: dec!(22150),
            side: Side::Call,
            broker_security_id: "NSE:NIFTY26AUG22150CE".to_string(),
        }
    }

    #[tokio::test]
    async fn confirms_fill_once_broker_reports_filled() {
        let broker = ScriptedBroker {
            statuses: Mutex::new(vec![
                OrderStatus::Pending,
                OrderStatus::Filled {
                    avg_fill_price: dec!(101.5),
                    filled_qty: 50,
                },
            ]),
        };
        let executor = OrderExecutor::new(Duration::from_millis(1), Duration::from_secs(5));
        let outcome = executor
            .place_and_confirm(
                &broker,
                PlaceOrderRequest {
                    option: sample_option(),
                    action: Action::Buy,
                    qty: 50,
                    client_tag: "tag-1".to_string(),
                },
            )
            .await;
        assert_eq!(
            outcome,
            OrderOutcome::Filled {
                broker_order_id: "order-1".to_string(),
                avg_fill_price: dec!(101.5),
                filled_qty: 50
            }
        );
    }

    #[tokio::test]
    async fn buy_timeout_abandons_the_attempt() {
        let broker = ScriptedBroker {
            statuses: Mutex::new(vec![OrderStatus::Pending]),
        };
        let executor = OrderExecutor::new(Duration::from_millis(1), Duration::from_millis(10));
        let outcome = executor
            .place_and_confirm(
                &broker,
                PlaceOrderRequest {
                    option: sample_option(),
                    action: Action::Buy,
                    qty: 50,
                    client_tag: "tag-2".to_string(),
                },
            )
            .await;
        assert_eq!(
            outcome,
            OrderOutcome::BuyAbandoned {
                broker_order_id: "order-1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn sell_timeout_keeps_position_closing() {
        let broker = ScriptedBroker {
            statuses: Mutex::new(vec![OrderStatus::Pending]),
        };
        let executor = OrderExecutor::new(Duration::from_millis(1), Duration::from_millis(10));
        let outcome = executor
            .place_and_confirm(
                &broker,
                PlaceOrderRequest {
                    option: sample_option(),
                    action: Action::Sell,
                    qty: 50,
                    client_tag: "tag-3".to_string(),
                },
            )
            .await;
        assert_eq!(
            outcome,
            OrderOutcome::SellStillPending {
                broker_order_id: "order-1".to_string()
            }
        );
    }
}
