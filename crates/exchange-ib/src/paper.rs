//! Paper trading gateway.
//!
//! Simulates an IB session entirely in memory: market orders fill
//! immediately against a local position book, limit orders rest until
//! cancelled. Useful for exercising the full webhook pipeline before
//! connecting to IB Gateway.

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::info;

use tradehook_core::error::BrokerError;
use tradehook_core::intent::OrderSide;
use tradehook_core::order::{
    ContractSpec, OrderHandle, OrderRequest, OrderType, PositionSnapshot,
};
use tradehook_core::symbol;
use tradehook_core::traits::BrokerGateway;

#[derive(Default)]
struct PaperBook {
    positions: HashMap<String, Decimal>,
    resting: HashSet<OrderHandle>,
    next_id: i32,
}

/// In-memory stand-in for a live IB session.
#[derive(Default)]
pub struct PaperGateway {
    book: Mutex<PaperBook>,
}

impl PaperGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an open position, for tests and dry runs.
    pub fn seed_position(&self, instrument: &str, quantity: Decimal) {
        self.book
            .lock()
            .positions
            .insert(symbol::normalize(instrument), quantity);
    }

    /// Number of resting (unfilled, uncancelled) limit orders.
    #[must_use]
    pub fn resting_orders(&self) -> usize {
        self.book.lock().resting.len()
    }
}

#[async_trait]
impl BrokerGateway for PaperGateway {
    async fn list_positions(&self) -> Result<Vec<PositionSnapshot>, BrokerError> {
        Ok(self
            .book
            .lock()
            .positions
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
        // Paper venue accepts any well-formed draft as-is.
        Ok(vec![draft.clone()])
    }

    async fn place_order(
        &self,
        contract: &ContractSpec,
        order: &OrderRequest,
    ) -> Result<OrderHandle, BrokerError> {
        let mut book = self.book.lock();
        book.next_id += 1;
        let handle = OrderHandle(book.next_id);

        match order.order_type {
            OrderType::Market => {
                let instrument = symbol::normalize(&contract.instrument());
                let entry = book.positions.entry(instrument).or_insert(Decimal::ZERO);
                match order.side {
                    OrderSide::Buy => *entry += order.quantity,
                    OrderSide::Sell => *entry -= order.quantity,
                }
            }
            OrderType::Limit { .. } => {
                book.resting.insert(handle);
            }
        }

        info!(
            symbol = %contract.instrument(), side = %order.side, quantity = %order.quantity,
            handle = %handle, "paper fill"
        );
        Ok(handle)
    }

    async fn cancel_order(&self, handle: OrderHandle) -> Result<(), BrokerError> {
        self.book.lock().resting.remove(&handle);
        info!(handle = %handle, "paper cancel");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
