//! In-memory recording gateway for sequencer tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use tradehook_core::error::BrokerError;
use tradehook_core::order::{
    ContractSpec, OrderHandle, OrderRequest, OrderType, PositionSnapshot,
};
use tradehook_core::symbol;
use tradehook_core::traits::BrokerGateway;
use tradehook_core::intent::OrderSide;

/// Records every gateway call and simulates instant market fills against
/// an in-memory position book.
#[derive(Default)]
pub struct MockGateway {
    pub positions: Mutex<HashMap<String, Decimal>>,
    pub orders: Mutex<Vec<(ContractSpec, OrderRequest)>>,
    pub cancelled: Mutex<Vec<OrderHandle>>,
    pub qualify_calls: Mutex<Vec<ContractSpec>>,
    next_id: AtomicI32,
    /// Exchanges on which qualification returns no match.
    pub dead_exchanges: Mutex<Vec<String>>,
    /// When true, every place_order is rejected.
    pub reject_orders: Mutex<bool>,
    /// When true, market fills do not move positions (settlement never
    /// observed).
    pub never_settle: Mutex<bool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(self, instrument: &str, quantity: Decimal) -> Self {
        self.positions
            .lock()
            .insert(instrument.to_string(), quantity);
        self
    }

    pub fn position(&self, instrument: &str) -> Decimal {
        self.positions
            .lock()
            .get(instrument)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn market_orders(&self) -> Vec<OrderRequest> {
        self.orders
            .lock()
            .iter()
            .filter(|(_, o)| o.order_type == OrderType::Market)
            .map(|(_, o)| o.clone())
            .collect()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().len()
    }
}

#[async_trait]
impl BrokerGateway for MockGateway {
    async fn list_positions(&self) -> Result<Vec<PositionSnapshot>, BrokerError> {
        Ok(self
            .positions
            .lock()
            .iter()
            .filter(|(_, q)| **q != Decimal::ZERO)
            .map(|(instrument, quantity)| PositionSnapshot {
                instrument: instrument.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn qualify_contract(
        &self,
        draft: &ContractSpec,
    ) -> Result<Vec<ContractSpec>, BrokerError> {
        self.qualify_calls.lock().push(draft.clone());
        if self.dead_exchanges.lock().contains(&draft.exchange) {
            return Ok(vec![]);
        }
        Ok(vec![draft.clone()])
    }

    async fn place_order(
        &self,
        contract: &ContractSpec,
        order: &OrderRequest,
    ) -> Result<OrderHandle, BrokerError> {
        if *self.reject_orders.lock() {
            return Err(BrokerError::rejected("simulated rejection"));
        }
        self.orders.lock().push((contract.clone(), order.clone()));
        if order.order_type == OrderType::Market && !*self.never_settle.lock() {
            let instrument = symbol::normalize(&contract.instrument());
            let mut positions = self.positions.lock();
            let entry = positions.entry(instrument).or_insert(Decimal::ZERO);
            match order.side {
                OrderSide::Buy => *entry += order.quantity,
                OrderSide::Sell => *entry -= order.quantity,
            }
        }
        Ok(OrderHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn cancel_order(&self, handle: OrderHandle) -> Result<(), BrokerError> {
        self.cancelled.lock().push(handle);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
