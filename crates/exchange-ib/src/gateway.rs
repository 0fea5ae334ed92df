//! [`BrokerGateway`] implementation over the IB TWS API.
//!
//! Thin translation layer: contract specs and order requests map onto
//! ibapi structs, positions stream back through the positions
//! subscription, and every round trip is bounded by the configured
//! request timeout.

use async_trait::async_trait;
use ibapi::accounts::PositionUpdate;
use ibapi::contracts::Contract;
use ibapi::orders::{Action, Order};
use ibapi::prelude::*;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use tradehook_core::config::IbConfig;
use tradehook_core::error::BrokerError;
use tradehook_core::intent::OrderSide;
use tradehook_core::order::{
    ContractSpec, OrderHandle, OrderRequest, OrderType, PositionSnapshot, SecurityKind,
};
use tradehook_core::traits::BrokerGateway;

use crate::client::IbClient;

/// Live gateway over one authenticated TWS/IB Gateway session.
pub struct IbGateway {
    client: IbClient,
    request_timeout: Duration,
}

impl IbGateway {
    /// Connects to IB Gateway/TWS with the given settings.
    ///
    /// # Errors
    /// Fails if the session cannot be established.
    pub async fn connect(config: IbConfig) -> anyhow::Result<Self> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = IbClient::connect(config).await?;
        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Runs a gateway round trip under the configured timeout bound.
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, BrokerError>
    where
        F: Future<Output = Result<T, ibapi::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result.map_err(|e| BrokerError::Api(e.to_string())),
            Err(_) => Err(BrokerError::timeout(
                operation,
                self.request_timeout.as_secs(),
            )),
        }
    }
}

fn to_ib_contract(spec: &ContractSpec) -> Contract {
    Contract {
        symbol: Symbol(spec.symbol.clone()),
        security_type: match spec.security {
            SecurityKind::Forex => SecurityType::ForexPair,
            SecurityKind::Stock => SecurityType::Stock,
        },
        exchange: Exchange(spec.exchange.clone()),
        currency: Currency(spec.currency.clone()),
        ..Default::default()
    }
}

fn from_ib_contract(contract: &Contract) -> ContractSpec {
    let security = match contract.security_type {
        SecurityType::ForexPair => SecurityKind::Forex,
        _ => SecurityKind::Stock,
    };
    ContractSpec {
        symbol: contract.symbol.0.clone(),
        security,
        exchange: contract.exchange.0.clone(),
        currency: contract.currency.0.clone(),
    }
}

#[async_trait]
impl BrokerGateway for IbGateway {
    async fn list_positions(&self) -> Result<Vec<PositionSnapshot>, BrokerError> {
        let client = self.client.inner();
        self.bounded("positions", async {
            let mut subscription = client.positions().await?;
            let mut snapshots = Vec::new();
            while let Some(update) = subscription.next().await {
                match update? {
                    PositionUpdate::Position(position) => {
                        let spec = from_ib_contract(&position.contract);
                        let quantity =
                            Decimal::from_f64(position.position).unwrap_or(Decimal::ZERO);
                        if quantity != Decimal::ZERO {
                            snapshots.push(PositionSnapshot {
                                instrument: spec.instrument(),
                                quantity,
                            });
                        }
                    }
                    PositionUpdate::PositionEnd => break,
                }
            }
            Ok(snapshots)
        })
        .await
    }

    async fn qualify_contract(
        &self,
        draft: &ContractSpec,
    ) -> Result<Vec<ContractSpec>, BrokerError> {
        let contract = to_ib_contract(draft);
        debug!(symbol = %draft.instrument(), exchange = %draft.exchange, "qualifying contract");
        let result = tokio::time::timeout(
            self.request_timeout,
            self.client.inner().contract_details(&contract),
        )
        .await;
        match result {
            Ok(Ok(details)) => Ok(details
                .into_iter()
                .map(|d| from_ib_contract(&d.contract))
                .collect()),
            // IB reports an unqualifiable draft as an error message, not
            // an empty result; surface it as "no match" so the resolver
            // can try its fallback venue.
            Ok(Err(e)) if e.to_string().contains("No security definition") => Ok(vec![]),
            Ok(Err(e)) => Err(BrokerError::Api(e.to_string())),
            Err(_) => Err(BrokerError::timeout(
                "contract qualification",
                self.request_timeout.as_secs(),
            )),
        }
    }

    async fn place_order(
        &self,
        contract: &ContractSpec,
        order: &OrderRequest,
    ) -> Result<OrderHandle, BrokerError> {
        let ib_contract = to_ib_contract(contract);
        let total_quantity = order
            .quantity
            .to_f64()
            .ok_or_else(|| BrokerError::Api("quantity not representable".to_string()))?;
        let action = match order.side {
            OrderSide::Buy => Action::Buy,
            OrderSide::Sell => Action::Sell,
        };
        let ib_order = match order.order_type {
            OrderType::Market => Order {
                action,
                order_type: "MKT".to_string(),
                total_quantity,
                ..Default::default()
            },
            OrderType::Limit { price } => Order {
                action,
                order_type: "LMT".to_string(),
                total_quantity,
                limit_price: price.to_f64(),
                ..Default::default()
            },
        };

        let client = self.client.inner();
        let order_id = client.next_order_id();
        self.bounded("order submission", client.submit_order(order_id, &ib_contract, &ib_order))
            .await?;
        info!(
            symbol = %contract.instrument(), side = %order.side, quantity = %order.quantity,
            order_id, "submitted order"
        );
        Ok(OrderHandle(order_id))
    }

    async fn cancel_order(&self, handle: OrderHandle) -> Result<(), BrokerError> {
        let client = self.client.inner();
        let _ = self
            .bounded("order cancellation", client.cancel_order(handle.0, ""))
            .await?;
        info!(order_id = handle.0, "cancelled order");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }
}
