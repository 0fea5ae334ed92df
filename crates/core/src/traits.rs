//! Capability trait for the broker gateway the engine drives.

use async_trait::async_trait;

use crate::error::BrokerError;
use crate::order::{ContractSpec, OrderHandle, OrderRequest, PositionSnapshot};

/// One authenticated brokerage session: position queries, contract
/// qualification, order placement, and cancellation.
///
/// Positions are broker-authoritative; implementations must not cache
/// them. Qualification returns an empty vec (not an error) when the venue
/// has no match for the draft spec.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn list_positions(&self) -> Result<Vec<PositionSnapshot>, BrokerError>;

    async fn qualify_contract(
        &self,
        draft: &ContractSpec,
    ) -> Result<Vec<ContractSpec>, BrokerError>;

    async fn place_order(
        &self,
        contract: &ContractSpec,
        order: &OrderRequest,
    ) -> Result<OrderHandle, BrokerError>;

    async fn cancel_order(&self, handle: OrderHandle) -> Result<(), BrokerError>;

    /// Whether the session is currently live.
    fn is_connected(&self) -> bool;
}
