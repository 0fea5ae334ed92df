//! Shared types, errors, configuration, and the broker gateway trait for
//! the webhook trading bridge.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod intent;
pub mod order;
pub mod symbol;
pub mod traits;

pub use config::{AppConfig, EngineConfig, IbConfig, ServerConfig};
pub use config_loader::ConfigLoader;
pub use error::{BrokerError, TradehookError};
pub use intent::{Intent, IntentAction, OrderSide, WebhookRequest};
pub use order::{
    ContractSpec, OrderHandle, OrderRequest, OrderType, PositionSnapshot, SecurityKind,
};
pub use traits::BrokerGateway;
