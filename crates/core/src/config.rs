use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ib: IbConfig,
    pub engine: EngineConfig,
}

/// Webhook listener address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// IB Gateway/TWS connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IbConfig {
    /// Gateway/TWS host (use 127.0.0.1, not localhost — TWS may block IPv6).
    pub host: String,
    /// API port (7497 = TWS live, 4002 = gateway paper).
    pub port: u16,
    /// Client ID, unique per connection.
    pub client_id: i32,
    /// Bound on each gateway round trip, in seconds.
    pub request_timeout_secs: u64,
}

impl IbConfig {
    /// Connection URL for the ibapi crate.
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Order-sequencing timing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bound on waiting for a closing order to settle, in seconds.
    pub settle_timeout_secs: u64,
    /// Interval between position re-reads while waiting, in milliseconds.
    pub settle_poll_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ib: IbConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

impl Default for IbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 1,
            request_timeout_secs: 10,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_timeout_secs: 10,
            settle_poll_ms: 250,
        }
    }
}
