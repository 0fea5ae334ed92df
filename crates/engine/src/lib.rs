//! Decision logic between webhook intents and broker orders.
//!
//! The sequencer reconciles each validated intent against the broker's
//! live position for that instrument and issues the minimal sequence of
//! market/limit orders: open when flat, skip when already positioned in
//! the same direction, close-then-open on a reversal. Take-profit limit
//! orders are tracked per instrument for cancellation on close.

pub mod positions;
pub mod resolver;
pub mod sequencer;
pub mod tp_registry;

pub use sequencer::{IntentOutcome, OrderSequencer};
pub use tp_registry::TpRegistry;

#[cfg(test)]
pub(crate) mod testkit;
