//! Read-through position query against the broker.

use rust_decimal::Decimal;

use tradehook_core::error::BrokerError;
use tradehook_core::symbol;
use tradehook_core::traits::BrokerGateway;

/// Returns the signed open position for a normalized instrument, zero if
/// the broker reports none.
///
/// Always a live read, never cached, so decisions are made against the
/// broker's authoritative state at call time.
///
/// # Errors
/// Propagates gateway failures.
pub async fn current_position(
    gateway: &dyn BrokerGateway,
    instrument: &str,
) -> Result<Decimal, BrokerError> {
    let positions = gateway.list_positions().await?;
    Ok(positions
        .into_iter()
        .find(|p| symbol::normalize(&p.instrument) == instrument)
        .map(|p| p.quantity)
        .unwrap_or(Decimal::ZERO))
}
