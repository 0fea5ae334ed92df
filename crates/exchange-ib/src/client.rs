//! IB Gateway/TWS client connection management.

use anyhow::{Context, Result};
use tracing::info;

use tradehook_core::config::IbConfig;

/// Wrapper around ibapi::Client holding the one authenticated session
/// for the process.
pub struct IbClient {
    config: IbConfig,
    client: ibapi::Client,
}

impl IbClient {
    /// Connect to IB Gateway/TWS.
    ///
    /// # Errors
    /// Fails if the TCP session or API handshake cannot be established.
    pub async fn connect(config: IbConfig) -> Result<Self> {
        let url = config.connection_url();
        info!(url = %url, client_id = config.client_id, "connecting to IB Gateway");

        let client = ibapi::Client::connect(&url, config.client_id)
            .await
            .context("failed to connect to IB Gateway")?;

        info!("connected to IB Gateway");
        Ok(Self { config, client })
    }

    /// Get a reference to the underlying ibapi client.
    pub fn inner(&self) -> &ibapi::Client {
        &self.client
    }

    /// Check if the connection is alive.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Get the configuration.
    pub fn config(&self) -> &IbConfig {
        &self.config
    }
}
