use serde::{Deserialize, Serialize};
use std::time::Duration;
use vrsi_core::{ExchangeId, Market};

/// Root configuration for the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigFile {
    pub exchanges: Vec<ExchangeConfig>,
    /// Forwarding relay for venues that are not reachable directly
    #[serde(default)]
    pub relay: Option<RelayConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Configuration for a single exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub id: ExchangeId,
    /// Whether this exchange is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub spot_rest_url: String,
    pub derivatives_rest_url: String,
    pub spot_ws_url: String,
    pub derivatives_ws_url: String,
    /// Route REST calls through the relay instead of calling the venue directly
    #[serde(default)]
    pub use_relay: bool,
}

impl ExchangeConfig {
    pub fn rest_url(&self, market: Market) -> &str {
        match market {
            Market::Spot => &self.spot_rest_url,
            Market::Derivatives => &self.derivatives_rest_url,
        }
    }

    pub fn ws_url(&self, market: Market) -> &str {
        match market {
            Market::Spot => &self.spot_ws_url,
            Market::Derivatives => &self.derivatives_ws_url,
        }
    }

    /// Stock endpoints for a venue
    pub fn default_for(id: ExchangeId) -> Self {
        let (spot_rest, deriv_rest, spot_ws, deriv_ws) = match id {
            ExchangeId::Binance => (
                "https://api.binance.com",
                "https://fapi.binance.com",
                "wss://stream.binance.com:9443",
                "wss://fstream.binance.com",
            ),
            ExchangeId::Bybit => (
                "https://api.bybit.com",
                "https://api.bybit.com",
                "wss://stream.bybit.com/v5/public/spot",
                "wss://stream.bybit.com/v5/public/linear",
            ),
            ExchangeId::Okx => (
                "https://www.okx.com",
                "https://www.okx.com",
                "wss://ws.okx.com:8443/ws/v5/public",
                "wss://ws.okx.com:8443/ws/v5/public",
            ),
            ExchangeId::Mexc => (
                "https://api.mexc.com",
                "https://contract.mexc.com",
                "wss://wbs.mexc.com/ws",
                "wss://contract.mexc.com/edge",
            ),
        };
        ExchangeConfig {
            id,
            enabled: true,
            spot_rest_url: spot_rest.to_string(),
            derivatives_rest_url: deriv_rest.to_string(),
            spot_ws_url: spot_ws.to_string(),
            derivatives_ws_url: deriv_ws.to_string(),
            use_relay: false,
        }
    }

    /// Point every endpoint of this exchange at one host (mock servers, local proxies)
    pub fn with_base_urls(mut self, rest: impl Into<String>, ws: impl Into<String>) -> Self {
        let rest = rest.into();
        let ws = ws.into();
        self.spot_rest_url = rest.clone();
        self.derivatives_rest_url = rest;
        self.spot_ws_url = ws.clone();
        self.derivatives_ws_url = ws;
        self
    }
}

/// Cross-origin forwarding relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL; requests go to `{url}/api/proxy?url=<upstream>`
    pub url: String,
}

/// HTTP client settings shared by all adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_ms: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Live stream connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Delay between reconnection attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Maximum number of consecutive reconnection attempts
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_timeout")]
    pub connect_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            connect_timeout_ms: default_timeout(),
        }
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; vrsi-scanner)".to_string()
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}
