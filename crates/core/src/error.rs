//! Error types for the webhook trading bridge.
//!
//! Failures are split into three kinds so callers can tell whether any
//! broker side effects may have happened: validation rejects an intent
//! before the first broker call, resolution aborts before any order is
//! placed, and broker errors can interrupt a partially executed sequence.

use thiserror::Error;

/// Errors from a broker gateway round trip.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Could not establish or lost the gateway session.
    #[error("connection error: {0}")]
    Connection(String),

    /// Order was rejected by the venue.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// A gateway round trip exceeded its bound.
    #[error("timeout after {timeout_secs}s waiting for {operation}")]
    Timeout {
        /// The operation that timed out (e.g. "positions", "settlement").
        operation: String,
        /// The configured bound in seconds.
        timeout_secs: u64,
    },

    /// Any other gateway/API failure.
    #[error("broker API error: {0}")]
    Api(String),
}

impl BrokerError {
    /// Creates a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs,
        }
    }

    /// Creates an order-rejected error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::OrderRejected(reason.into())
    }

    /// Returns true if the failure was a bounded-wait expiry rather than
    /// an explicit rejection.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Top-level error for intent processing.
#[derive(Debug, Error)]
pub enum TradehookError {
    /// Malformed or incomplete intent; no broker interaction occurred.
    #[error("validation error: {0}")]
    Validation(String),

    /// The instrument could not be qualified into a tradable contract.
    #[error("could not resolve {symbol}: {reason}")]
    Resolution {
        /// Normalized symbol that failed to qualify.
        symbol: String,
        /// Why qualification failed.
        reason: String,
    },

    /// A broker call failed mid-sequence; earlier orders may have been
    /// submitted.
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

impl TradehookError {
    /// Creates a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a resolution error.
    pub fn resolution(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the intent was rejected before any broker call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for intent processing.
pub type Result<T> = std::result::Result<T, TradehookError>;
