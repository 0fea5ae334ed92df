//! Interactive Brokers gateway adapter.
//!
//! Provides IB Gateway/TWS connectivity and the live [`IbGateway`]
//! implementation of the broker capability trait, plus an in-memory
//! [`PaperGateway`] for dry runs and tests.

pub mod client;
pub mod gateway;
pub mod paper;

pub use client::IbClient;
pub use gateway::IbGateway;
pub use paper::PaperGateway;
