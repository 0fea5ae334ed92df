//! Symbol normalization and classification.
//!
//! Signals arrive with instrument identifiers in whatever shape the
//! sender uses ("EURUSD", "eur/usd", "AAPL"). Everything downstream keys
//! on the normalized form, so normalization must be idempotent and
//! insensitive to case and separators.

use crate::error::TradehookError;

/// Normalized instrument classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// Currency pair, split into base and quote codes.
    Forex { base: String, quote: String },
    /// Equity ticker (1-5 letters).
    Stock { ticker: String },
}

/// Uppercases and strips separator characters (`/`, `-`, `:`, `.`,
/// whitespace) from a raw symbol.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '/' | '-' | ':' | '.') && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Classifies a raw symbol as forex pair or equity ticker.
///
/// Six alphabetic characters split into base(3)/quote(3); one to five
/// alphabetic characters are a stock ticker. Anything else is rejected.
///
/// # Errors
/// Returns a resolution error if the normalized symbol is neither form.
pub fn classify(raw: &str) -> Result<SymbolKind, TradehookError> {
    let symbol = normalize(raw);
    if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_uppercase()) {
        match symbol.len() {
            6 => {
                return Ok(SymbolKind::Forex {
                    base: symbol[..3].to_string(),
                    quote: symbol[3..].to_string(),
                })
            }
            1..=5 => {
                return Ok(SymbolKind::Stock { ticker: symbol })
            }
            _ => {}
        }
    }
    Err(TradehookError::resolution(
        symbol,
        "not a 6-letter currency pair or 1-5 letter ticker",
    ))
}
