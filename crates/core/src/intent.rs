//! Trade intent types and webhook payload validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TradehookError;
use crate::symbol;

/// What the signal wants done with the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentAction {
    Open,
    Close,
}

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The closing direction for this side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Raw webhook payload, exactly as the sender posts it.
///
/// `action` and `side` are kept as strings here so unknown values fail
/// validation with a useful message instead of a serde parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub symbol: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp: Option<Decimal>,
}

/// A validated trade intent, produced from a [`WebhookRequest`] before
/// any broker interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Normalized instrument identifier.
    pub symbol: String,
    pub action: IntentAction,
    /// Required when `action` is open.
    pub side: Option<OrderSide>,
    /// Required and positive when `action` is open.
    pub quantity: Option<Decimal>,
    /// Optional take-profit price, positive when present.
    pub take_profit: Option<Decimal>,
}

impl Intent {
    /// Validates a raw webhook payload into a typed intent.
    ///
    /// # Errors
    /// Returns a validation error for an unknown action, a missing or
    /// non-positive quantity on open, a missing side on open, or a
    /// non-positive take-profit price.
    pub fn from_request(req: &WebhookRequest) -> Result<Self, TradehookError> {
        let symbol = symbol::normalize(&req.symbol);
        if symbol.is_empty() {
            return Err(TradehookError::validation("symbol is required"));
        }

        let action = match req.action.to_ascii_lowercase().as_str() {
            "open" => IntentAction::Open,
            "close" => IntentAction::Close,
            other => {
                return Err(TradehookError::validation(format!(
                    "unknown action: {other}"
                )))
            }
        };

        let side = match req.side.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("buy") => Some(OrderSide::Buy),
            Some("sell") => Some(OrderSide::Sell),
            Some(other) => {
                return Err(TradehookError::validation(format!("unknown side: {other}")))
            }
            None => None,
        };

        if action == IntentAction::Open {
            if side.is_none() {
                return Err(TradehookError::validation("side is required for open"));
            }
            match req.quantity {
                None => {
                    return Err(TradehookError::validation("quantity is required for open"))
                }
                Some(q) if q <= Decimal::ZERO => {
                    return Err(TradehookError::validation("quantity must be positive"))
                }
                Some(_) => {}
            }
        }

        if let Some(tp) = req.tp {
            if tp <= Decimal::ZERO {
                return Err(TradehookError::validation("tp must be positive"));
            }
        }

        Ok(Self {
            symbol,
            action,
            side,
            quantity: req.quantity,
            take_profit: req.tp,
        })
    }
}
