//! The order sequencer: turns a validated intent into broker operations.
//!
//! Per instrument the decision state is derived from the signed broker
//! position at call time (long / short / flat), never persisted. An open
//! intent either opens from flat, skips as a pyramiding no-op, or
//! reverses (full close, settlement wait, then open) when the desired
//! side opposes the current position. A close intent flattens the full
//! position and cancels its take-profit. Every broker failure aborts the
//! remaining steps with no rollback of orders already submitted.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use tradehook_core::config::EngineConfig;
use tradehook_core::error::{BrokerError, TradehookError};
use tradehook_core::intent::{Intent, IntentAction, OrderSide};
use tradehook_core::order::{ContractSpec, OrderRequest};
use tradehook_core::traits::BrokerGateway;

use crate::positions::current_position;
use crate::resolver;
use crate::tp_registry::TpRegistry;

/// What the sequencer did with an intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentOutcome {
    /// Market order placed from flat, plus optional take-profit.
    Opened {
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
        take_profit: Option<Decimal>,
    },
    /// Existing opposite position closed, then opened in the desired
    /// direction.
    Reversed {
        symbol: String,
        closed_quantity: Decimal,
        side: OrderSide,
        quantity: Decimal,
        take_profit: Option<Decimal>,
    },
    /// Pyramiding guard: already positioned in the desired direction.
    Skipped { symbol: String, current: Decimal },
    /// Position flattened and take-profit cancelled.
    Closed { symbol: String, quantity: Decimal },
    /// Close requested while already flat.
    AlreadyFlat { symbol: String },
}

/// Owns the broker session, the take-profit registry, and the
/// per-instrument locks; constructed once at startup and shared.
pub struct OrderSequencer {
    gateway: Arc<dyn BrokerGateway>,
    tps: TpRegistry,
    locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
    config: EngineConfig,
}

impl OrderSequencer {
    #[must_use]
    pub fn new(gateway: Arc<dyn BrokerGateway>, config: EngineConfig) -> Self {
        Self {
            gateway,
            tps: TpRegistry::new(),
            locks: parking_lot::Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Whether the underlying broker session is live.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.gateway.is_connected()
    }

    /// Applies a validated intent, serialized per normalized instrument.
    ///
    /// Two intents for the same instrument queue on its lock so neither
    /// decides against a position snapshot the other is about to change;
    /// different instruments proceed in parallel.
    ///
    /// # Errors
    /// Validation errors occur before any broker call; resolution and
    /// broker errors abort the remaining sequence without rollback.
    pub async fn apply_intent(&self, intent: &Intent) -> Result<IntentOutcome, TradehookError> {
        let lock = self.instrument_lock(&intent.symbol);
        let _guard = lock.lock().await;

        match intent.action {
            IntentAction::Open => self.open(intent).await,
            IntentAction::Close => self.close(&intent.symbol).await,
        }
    }

    async fn open(&self, intent: &Intent) -> Result<IntentOutcome, TradehookError> {
        let side = intent
            .side
            .ok_or_else(|| TradehookError::validation("side is required for open"))?;
        let quantity = intent
            .quantity
            .filter(|q| *q > Decimal::ZERO)
            .ok_or_else(|| TradehookError::validation("quantity must be positive for open"))?;

        let contract = resolver::resolve(self.gateway.as_ref(), &intent.symbol).await?;
        let symbol = &intent.symbol;
        let mut current = current_position(self.gateway.as_ref(), symbol).await?;
        let want_long = side == OrderSide::Buy;

        // Reverse first if positioned the other way.
        let mut closed_quantity = None;
        if current != Decimal::ZERO && (current > Decimal::ZERO) != want_long {
            info!(symbol = %symbol, current = %current, "reversing existing position");
            self.flatten(&contract, symbol, current).await?;
            self.await_settlement(symbol).await?;
            closed_quantity = Some(current.abs());
            current = current_position(self.gateway.as_ref(), symbol).await?;
        }

        // Pyramiding guard: never add to a same-direction position.
        if (want_long && current > Decimal::ZERO) || (!want_long && current < Decimal::ZERO) {
            info!(symbol = %symbol, current = %current, "skipping pyramiding");
            return Ok(IntentOutcome::Skipped {
                symbol: symbol.clone(),
                current,
            });
        }

        self.gateway
            .place_order(&contract, &OrderRequest::market(side, quantity))
            .await?;
        info!(symbol = %symbol, side = %side, quantity = %quantity, "placed market order");

        if let Some(tp) = intent.take_profit {
            let tp_order = OrderRequest::limit(side.opposite(), quantity, tp);
            let handle = self.gateway.place_order(&contract, &tp_order).await?;
            self.tps.set(symbol, handle);
            info!(
                symbol = %symbol, side = %side.opposite(), quantity = %quantity, price = %tp,
                handle = %handle, "registered take-profit"
            );
        }

        Ok(match closed_quantity {
            Some(closed) => IntentOutcome::Reversed {
                symbol: symbol.clone(),
                closed_quantity: closed,
                side,
                quantity,
                take_profit: intent.take_profit,
            },
            None => IntentOutcome::Opened {
                symbol: symbol.clone(),
                side,
                quantity,
                take_profit: intent.take_profit,
            },
        })
    }

    async fn close(&self, symbol: &str) -> Result<IntentOutcome, TradehookError> {
        let current = current_position(self.gateway.as_ref(), symbol).await?;
        if current == Decimal::ZERO {
            info!(symbol = %symbol, "no position to close");
            return Ok(IntentOutcome::AlreadyFlat {
                symbol: symbol.to_string(),
            });
        }

        let contract = resolver::resolve(self.gateway.as_ref(), symbol).await?;
        self.flatten(&contract, symbol, current).await?;

        Ok(IntentOutcome::Closed {
            symbol: symbol.to_string(),
            quantity: current.abs(),
        })
    }

    /// Market-closes the full position and cancels its take-profit.
    async fn flatten(
        &self,
        contract: &ContractSpec,
        symbol: &str,
        current: Decimal,
    ) -> Result<(), TradehookError> {
        let side = if current > Decimal::ZERO {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };
        self.gateway
            .place_order(contract, &OrderRequest::market(side, current.abs()))
            .await?;
        info!(symbol = %symbol, side = %side, quantity = %current.abs(), "closed position");

        if let Some(handle) = self.tps.pop(symbol) {
            self.gateway.cancel_order(handle).await?;
            info!(symbol = %symbol, handle = %handle, "cancelled take-profit");
        }
        Ok(())
    }

    /// Polls the broker until the instrument reads flat, bounded by the
    /// configured settlement timeout.
    ///
    /// The following open decision must be made against post-fill state;
    /// polling the authoritative position (instead of a fixed delay)
    /// keeps it from racing the fill.
    async fn await_settlement(&self, symbol: &str) -> Result<(), TradehookError> {
        let timeout = Duration::from_secs(self.config.settle_timeout_secs);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if current_position(self.gateway.as_ref(), symbol).await? == Decimal::ZERO {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrokerError::timeout(
                    format!("settlement of {symbol}"),
                    self.config.settle_timeout_secs,
                )
                .into());
            }
            tokio::time::sleep(Duration::from_millis(self.config.settle_poll_ms)).await;
        }
    }

    fn instrument_lock(&self, symbol: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        // Entries held only by the map belong to finished intents;
        // dropping them keeps the map sized to the instruments in flight.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MockGateway;
    use rust_decimal_macros::dec;
    use tradehook_core::order::{OrderType, OrderHandle};

    fn sequencer(gateway: MockGateway) -> (Arc<MockGateway>, OrderSequencer) {
        let gateway = Arc::new(gateway);
        let sequencer = OrderSequencer::new(gateway.clone(), EngineConfig::default());
        (gateway, sequencer)
    }

    fn open_intent(symbol: &str, side: OrderSide, quantity: Decimal, tp: Option<Decimal>) -> Intent {
        Intent {
            symbol: symbol.to_string(),
            action: IntentAction::Open,
            side: Some(side),
            quantity: Some(quantity),
            take_profit: tp,
        }
    }

    fn close_intent(symbol: &str) -> Intent {
        Intent {
            symbol: symbol.to_string(),
            action: IntentAction::Close,
            side: None,
            quantity: None,
            take_profit: None,
        }
    }

    #[tokio::test]
    async fn open_from_flat_places_market_and_tp() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(10000), Some(dec!(1.10)));

        let outcome = sequencer.apply_intent(&intent).await.unwrap();

        assert_eq!(
            outcome,
            IntentOutcome::Opened {
                symbol: "EURUSD".to_string(),
                side: OrderSide::Buy,
                quantity: dec!(10000),
                take_profit: Some(dec!(1.10)),
            }
        );
        let orders = gateway.orders.lock();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].1, OrderRequest::market(OrderSide::Buy, dec!(10000)));
        assert_eq!(
            orders[1].1,
            OrderRequest::limit(OrderSide::Sell, dec!(10000), dec!(1.10))
        );
        drop(orders);
        assert!(sequencer.tps.contains("EURUSD"));
        assert_eq!(gateway.position("EURUSD"), dec!(10000));
    }

    #[tokio::test]
    async fn open_without_tp_places_single_order() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        let intent = open_intent("EURUSD", OrderSide::Sell, dec!(5000), None);

        sequencer.apply_intent(&intent).await.unwrap();

        assert_eq!(gateway.order_count(), 1);
        assert!(!sequencer.tps.contains("EURUSD"));
        assert_eq!(gateway.position("EURUSD"), dec!(-5000));
    }

    #[tokio::test]
    async fn repeated_open_is_pyramiding_noop() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(10000), None);

        sequencer.apply_intent(&intent).await.unwrap();
        let second = sequencer.apply_intent(&intent).await.unwrap();

        assert_eq!(
            second,
            IntentOutcome::Skipped {
                symbol: "EURUSD".to_string(),
                current: dec!(10000),
            }
        );
        // exactly one market order total; the second call was a no-op
        assert_eq!(gateway.order_count(), 1);
    }

    #[tokio::test]
    async fn reversal_closes_then_opens() {
        let gateway = MockGateway::new().with_position("EURUSD", dec!(-3000));
        let (gateway, sequencer) = sequencer(gateway);
        sequencer.tps.set("EURUSD", OrderHandle(99));

        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(10000), Some(dec!(1.12)));
        let outcome = sequencer.apply_intent(&intent).await.unwrap();

        assert_eq!(
            outcome,
            IntentOutcome::Reversed {
                symbol: "EURUSD".to_string(),
                closed_quantity: dec!(3000),
                side: OrderSide::Buy,
                quantity: dec!(10000),
                take_profit: Some(dec!(1.12)),
            }
        );
        let market_orders = gateway.market_orders();
        assert_eq!(market_orders.len(), 2);
        // closing buy for the short size, then the desired open
        assert_eq!(market_orders[0], OrderRequest::market(OrderSide::Buy, dec!(3000)));
        assert_eq!(market_orders[1], OrderRequest::market(OrderSide::Buy, dec!(10000)));
        // prior take-profit cancelled before the new one was registered
        assert_eq!(gateway.cancelled.lock().as_slice(), &[OrderHandle(99)]);
        assert!(sequencer.tps.contains("EURUSD"));
        assert_ne!(sequencer.tps.pop("EURUSD"), Some(OrderHandle(99)));
        assert_eq!(gateway.position("EURUSD"), dec!(10000));
    }

    #[tokio::test]
    async fn close_from_flat_issues_no_orders() {
        let (gateway, sequencer) = sequencer(MockGateway::new());

        let outcome = sequencer.apply_intent(&close_intent("EURUSD")).await.unwrap();

        assert_eq!(
            outcome,
            IntentOutcome::AlreadyFlat {
                symbol: "EURUSD".to_string(),
            }
        );
        assert_eq!(gateway.order_count(), 0);
        // flat close never needs qualification either
        assert!(gateway.qualify_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn close_flattens_full_position_and_clears_tp() {
        let gateway = MockGateway::new().with_position("EURUSD", dec!(10000));
        let (gateway, sequencer) = sequencer(gateway);
        sequencer.tps.set("EURUSD", OrderHandle(4));

        let outcome = sequencer.apply_intent(&close_intent("EURUSD")).await.unwrap();

        assert_eq!(
            outcome,
            IntentOutcome::Closed {
                symbol: "EURUSD".to_string(),
                quantity: dec!(10000),
            }
        );
        let orders = gateway.orders.lock();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].1, OrderRequest::market(OrderSide::Sell, dec!(10000)));
        drop(orders);
        assert_eq!(gateway.cancelled.lock().as_slice(), &[OrderHandle(4)]);
        assert!(!sequencer.tps.contains("EURUSD"));
        assert_eq!(gateway.position("EURUSD"), Decimal::ZERO);
    }

    #[tokio::test]
    async fn close_of_short_buys_back() {
        let gateway = MockGateway::new().with_position("GBPUSD", dec!(-7500));
        let (gateway, sequencer) = sequencer(gateway);

        sequencer.apply_intent(&close_intent("GBPUSD")).await.unwrap();

        let orders = gateway.market_orders();
        assert_eq!(orders[0], OrderRequest::market(OrderSide::Buy, dec!(7500)));
    }

    #[tokio::test]
    async fn open_without_side_makes_no_broker_calls() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        let intent = Intent {
            symbol: "EURUSD".to_string(),
            action: IntentAction::Open,
            side: None,
            quantity: Some(dec!(100)),
            take_profit: None,
        };

        let err = sequencer.apply_intent(&intent).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(gateway.order_count(), 0);
        assert!(gateway.qualify_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn rejected_order_aborts_before_tp() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        *gateway.reject_orders.lock() = true;
        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(100), Some(dec!(1.10)));

        let err = sequencer.apply_intent(&intent).await.unwrap_err();

        assert!(matches!(
            err,
            TradehookError::Broker(BrokerError::OrderRejected(_))
        ));
        assert!(!sequencer.tps.contains("EURUSD"));
    }

    #[tokio::test]
    async fn unresolvable_symbol_places_no_orders() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        gateway.dead_exchanges.lock().push("IDEALPRO".to_string());
        gateway.dead_exchanges.lock().push("SMART".to_string());
        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(100), None);

        let err = sequencer.apply_intent(&intent).await.unwrap_err();

        assert!(matches!(err, TradehookError::Resolution { .. }));
        assert_eq!(gateway.order_count(), 0);
    }

    #[tokio::test]
    async fn unsettled_reversal_times_out() {
        let gateway = MockGateway::new().with_position("EURUSD", dec!(-3000));
        *gateway.never_settle.lock() = true;
        let gateway = Arc::new(gateway);
        let config = EngineConfig {
            settle_timeout_secs: 0,
            settle_poll_ms: 1,
        };
        let sequencer = OrderSequencer::new(gateway.clone(), config);

        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(10000), None);
        let err = sequencer.apply_intent(&intent).await.unwrap_err();

        assert!(matches!(
            err,
            TradehookError::Broker(BrokerError::Timeout { .. })
        ));
        // the closing order went out; the open never did
        assert_eq!(gateway.market_orders().len(), 1);
    }

    #[tokio::test]
    async fn example_scenario_open_then_close() {
        // {symbol:"EURUSD", action:"open", side:"buy", quantity:10000, tp:1.10}
        let (gateway, sequencer) = sequencer(MockGateway::new());
        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(10000), Some(dec!(1.10)));
        sequencer.apply_intent(&intent).await.unwrap();

        {
            let orders = gateway.orders.lock();
            assert_eq!(orders[0].1.order_type, OrderType::Market);
            assert_eq!(orders[0].1.side, OrderSide::Buy);
            assert_eq!(
                orders[1].1.order_type,
                OrderType::Limit { price: dec!(1.10) }
            );
            assert_eq!(orders[1].1.side, OrderSide::Sell);
        }
        assert!(sequencer.tps.contains("EURUSD"));

        // then {action:"close"} while long 10000
        sequencer.apply_intent(&close_intent("EURUSD")).await.unwrap();
        let orders = gateway.orders.lock();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[2].1, OrderRequest::market(OrderSide::Sell, dec!(10000)));
        drop(orders);
        assert!(!sequencer.tps.contains("EURUSD"));
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = IntentOutcome::Skipped {
            symbol: "EURUSD".to_string(),
            current: dec!(10000),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "skipped");
        assert_eq!(json["symbol"], "EURUSD");
    }

    #[tokio::test]
    async fn finished_intents_release_their_lock_entries() {
        let (_, sequencer) = sequencer(MockGateway::new());

        for symbol in ["EURUSD", "GBPUSD", "USDJPY"] {
            let intent = open_intent(symbol, OrderSide::Buy, dec!(100), None);
            sequencer.apply_intent(&intent).await.unwrap();
        }

        // Only the most recent instrument survives; the idle entries
        // were evicted on the later acquisitions.
        assert_eq!(sequencer.locks.lock().len(), 1);
        assert!(sequencer.locks.lock().contains_key("USDJPY"));
    }

    #[tokio::test]
    async fn concurrent_intents_for_one_symbol_serialize() {
        let (gateway, sequencer) = sequencer(MockGateway::new());
        let sequencer = Arc::new(sequencer);
        let intent = open_intent("EURUSD", OrderSide::Buy, dec!(100), None);

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let sequencer = sequencer.clone();
                let intent = intent.clone();
                tokio::spawn(async move { sequencer.apply_intent(&intent).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // one open, three pyramiding skips; never four opens
        assert_eq!(gateway.order_count(), 1);
        assert_eq!(gateway.position("EURUSD"), dec!(100));
    }
}
