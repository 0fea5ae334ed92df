//! Contract, order, and position types shared across the workspace.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::intent::OrderSide;

/// Venue security classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityKind {
    /// Cash forex pair.
    Forex,
    /// Equity.
    Stock,
}

/// A contract specification sent to the gateway for qualification.
///
/// Starts as a draft built from a normalized symbol; the gateway's
/// qualification step confirms (and may rewrite) the exchange. Resolved
/// per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSpec {
    /// Base currency for forex, ticker for stock.
    pub symbol: String,
    pub security: SecurityKind,
    /// Routing exchange (e.g. "IDEALPRO", "SMART").
    pub exchange: String,
    /// Quote currency for forex, settlement currency for stock.
    pub currency: String,
}

impl ContractSpec {
    /// Draft forex contract (base/quote cash pair) on the given exchange.
    pub fn forex(base: &str, quote: &str, exchange: &str) -> Self {
        Self {
            symbol: base.to_string(),
            security: SecurityKind::Forex,
            exchange: exchange.to_string(),
            currency: quote.to_string(),
        }
    }

    /// Draft US equity contract, SMART-routed in USD.
    pub fn stock(ticker: &str) -> Self {
        Self {
            symbol: ticker.to_string(),
            security: SecurityKind::Stock,
            exchange: "SMART".to_string(),
            currency: "USD".to_string(),
        }
    }

    /// The same draft routed through a different exchange.
    #[must_use]
    pub fn with_exchange(mut self, exchange: &str) -> Self {
        self.exchange = exchange.to_string();
        self
    }

    /// Flat instrument identifier ("EURUSD" for forex, ticker for stock).
    #[must_use]
    pub fn instrument(&self) -> String {
        match self.security {
            SecurityKind::Forex => format!("{}{}", self.symbol, self.currency),
            SecurityKind::Stock => self.symbol.clone(),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit { price: Decimal },
}

/// An order to submit; not retained after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub quantity: Decimal,
    pub order_type: OrderType,
}

impl OrderRequest {
    /// Market order.
    pub fn market(side: OrderSide, quantity: Decimal) -> Self {
        Self {
            side,
            quantity,
            order_type: OrderType::Market,
        }
    }

    /// Limit order at the given price.
    pub fn limit(side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            side,
            quantity,
            order_type: OrderType::Limit { price },
        }
    }
}

/// Opaque handle to a submitted order, usable for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderHandle(pub i32);

impl std::fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A broker-side open position: signed quantity keyed by instrument.
/// Positive is long, negative is short. Broker-owned; never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Normalized instrument identifier (e.g. "EURUSD", "AAPL").
    pub instrument: String,
    pub quantity: Decimal,
}
