//! Symbol resolution: normalized identifier to venue-qualified contract.

use tracing::{info, warn};

use tradehook_core::error::TradehookError;
use tradehook_core::order::{ContractSpec, SecurityKind};
use tradehook_core::symbol::{self, SymbolKind};
use tradehook_core::traits::BrokerGateway;

/// Primary venue for cash forex pairs.
pub const FOREX_EXCHANGE: &str = "IDEALPRO";
/// Fallback venue when the primary returns no qualification match.
pub const FALLBACK_EXCHANGE: &str = "SMART";

/// Resolves a raw instrument identifier into a qualified contract.
///
/// Forex pairs are qualified against IDEALPRO with a single SMART retry;
/// stocks go straight to SMART. One fallback attempt, no further retries.
///
/// # Errors
/// Returns a resolution error for a malformed identifier or when no
/// attempted exchange yields a match; broker call failures pass through.
pub async fn resolve(
    gateway: &dyn BrokerGateway,
    raw_symbol: &str,
) -> Result<ContractSpec, TradehookError> {
    let draft = match symbol::classify(raw_symbol)? {
        SymbolKind::Forex { base, quote } => ContractSpec::forex(&base, &quote, FOREX_EXCHANGE),
        SymbolKind::Stock { ticker } => ContractSpec::stock(&ticker),
    };
    let instrument = draft.instrument();

    if let Some(qualified) = gateway.qualify_contract(&draft).await?.into_iter().next() {
        info!(symbol = %instrument, exchange = %qualified.exchange, "qualified contract");
        return Ok(qualified);
    }

    if draft.security == SecurityKind::Forex {
        warn!(
            symbol = %instrument,
            "{FOREX_EXCHANGE} qualification failed, trying {FALLBACK_EXCHANGE}"
        );
        let fallback = draft.with_exchange(FALLBACK_EXCHANGE);
        if let Some(qualified) = gateway
            .qualify_contract(&fallback)
            .await?
            .into_iter()
            .next()
        {
            info!(symbol = %instrument, exchange = %qualified.exchange, "qualified contract");
            return Ok(qualified);
        }
    }

    Err(TradehookError::resolution(
        instrument,
        "no qualification match on any attempted exchange",
    ))
}
