use std::path::Path;
use thiserror::Error;
use vrsi_core::ExchangeId;

use super::types::{ExchangeConfig, GatewayConfigFile};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No enabled exchanges in config")]
    NoEnabledExchanges,
    #[error("Exchange not found: {0}")]
    ExchangeNotFound(ExchangeId),
    #[error("Exchange {0} routes through the relay but no relay is configured")]
    MissingRelay(ExchangeId),
    #[error("Invalid HTTP client settings: {0}")]
    HttpClient(String),
}

/// Load gateway configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<GatewayConfigFile, ConfigError> {
    let config: GatewayConfigFile = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<GatewayConfigFile, ConfigError> {
    let default_config = include_str!("gateway_config.json");
    load_config_from_str(default_config)
}

impl GatewayConfigFile {
    /// Get only enabled exchanges
    pub fn enabled_exchanges(&self) -> Vec<&ExchangeConfig> {
        self.exchanges.iter().filter(|e| e.enabled).collect()
    }

    /// Get a specific exchange by ID
    pub fn get_exchange(&self, id: ExchangeId) -> Option<&ExchangeConfig> {
        self.exchanges.iter().find(|e| e.id == id)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let enabled = self.enabled_exchanges();
        if enabled.is_empty() {
            return Err(ConfigError::NoEnabledExchanges);
        }
        if let Some(e) = enabled.iter().find(|e| e.use_relay) {
            if self.relay.is_none() {
                return Err(ConfigError::MissingRelay(e.id));
            }
        }
        Ok(())
    }
}
