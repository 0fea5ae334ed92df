//! Take-profit order bookkeeping.
//!
//! Maps normalized instrument to the handle of its resting take-profit
//! limit order, at most one per instrument. Purely in-process: handles
//! are lost on restart and the broker-side orders are not reconciled on
//! startup. Setting over an existing entry overwrites it; callers cancel
//! the prior handle first (the close and reversal paths do), otherwise
//! the superseded order is orphaned at the broker.

use parking_lot::RwLock;
use std::collections::HashMap;

use tradehook_core::order::OrderHandle;

#[derive(Debug, Default)]
pub struct TpRegistry {
    inner: RwLock<HashMap<String, OrderHandle>>,
}

impl TpRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overwrites) the take-profit handle for an instrument.
    pub fn set(&self, instrument: &str, handle: OrderHandle) {
        self.inner.write().insert(instrument.to_string(), handle);
    }

    /// Removes and returns the handle for an instrument, if any.
    pub fn pop(&self, instrument: &str) -> Option<OrderHandle> {
        self.inner.write().remove(instrument)
    }

    /// Drops the entry for an instrument without returning it.
    pub fn clear(&self, instrument: &str) {
        self.inner.write().remove(instrument);
    }

    /// Whether an instrument currently has a registered take-profit.
    #[must_use]
    pub fn contains(&self, instrument: &str) -> bool {
        self.inner.read().contains_key(instrument)
    }
}
