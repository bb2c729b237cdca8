//! V-RSI Gateway
//!
//! Infrastructure side of the scanner. Provides:
//! - Exchange adapters for Binance, Bybit, OKX and MEXC (spot and USDT perpetuals)
//! - HTTP transport with optional routing through a forwarding relay
//! - Live ticker streams with reconnection and keep-alive
//! - Gateway configuration (endpoints, relay, timeouts)
//!
//! ## Architecture
//!
//! ```text
//!   Scanner / caller
//!         │  Arc<dyn ExchangeAdapter>
//!    ┌────▼──────────┐
//!    │AdapterRegistry│  one adapter per enabled exchange
//!    └────┬──────────┘
//!         │
//!    ┌────▼─────┐   REST: RestClient (Direct | Relay)
//!    │ Adapters │
//!    └────┬─────┘   WS:   LiveStream ─► TickerSink
//!         │
//!   Binance · Bybit · OKX · MEXC
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod registry;
pub mod stream;
pub mod transport;

// Re-export commonly used types
pub use adapters::{BinanceAdapter, BybitAdapter, Endpoints, MexcAdapter, OkxAdapter};
pub use config::{
    ConfigError, ExchangeConfig, GatewayConfigFile, HttpConfig, RelayConfig, StreamConfig,
    load_config, load_config_from_str, load_default_config,
};
pub use error::{StreamError, TransportError};
pub use registry::AdapterRegistry;
pub use stream::{LiveStream, StreamHandle, StreamStatus, TickerSink};
pub use transport::{RestClient, Route, build_http_client};
