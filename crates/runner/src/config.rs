//! Runner configuration - gateway endpoints plus scan parameters in one file

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use vrsi_gateway::GatewayConfigFile;
use vrsi_scanner::{ScanConfig, ScanError};

#[derive(Error, Debug)]
pub enum RunnerConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error(transparent)]
    Gateway(#[from] vrsi_gateway::ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Exchange {0} is not enabled in the gateway section")]
    ExchangeDisabled(vrsi_core::ExchangeId),
}

/// Root of the runner's JSON config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub gateway: GatewayConfigFile,
    pub scan: ScanConfig,
}

impl RunnerConfig {
    /// Check both sections and that the scanned exchange is enabled
    pub fn validate(&self) -> Result<(), RunnerConfigError> {
        self.gateway.validate()?;
        self.scan.validate()?;
        let enabled = self
            .gateway
            .get_exchange(self.scan.exchange)
            .is_some_and(|e| e.enabled);
        if !enabled {
            return Err(RunnerConfigError::ExchangeDisabled(self.scan.exchange));
        }
        Ok(())
    }
}

/// Load runner configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, RunnerConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<RunnerConfig, RunnerConfigError> {
    let config: RunnerConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<RunnerConfig, RunnerConfigError> {
    load_config_from_str(include_str!("vrsi_config.json"))
}
