use std::collections::HashMap;
use std::sync::Arc;
use vrsi_core::ExchangeId;
use vrsi_ports::ExchangeAdapter;

use crate::adapters::{BinanceAdapter, BybitAdapter, Endpoints, MexcAdapter, OkxAdapter};
use crate::config::{ConfigError, ExchangeConfig, GatewayConfigFile};
use crate::transport::{RestClient, Route, build_http_client};

/// Adapters for every enabled exchange, built once from configuration
pub struct AdapterRegistry {
    config: GatewayConfigFile,
    adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
}

impl AdapterRegistry {
    /// Validate the configuration and build one adapter per enabled exchange
    pub fn from_config(config: GatewayConfigFile) -> Result<Self, ConfigError> {
        config.validate()?;
        let client =
            build_http_client(&config.http).map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let mut adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>> = HashMap::new();
        for exchange in config.enabled_exchanges() {
            let route = match (&config.relay, exchange.use_relay) {
                (Some(relay), true) => Route::Relay {
                    base_url: relay.url.clone(),
                },
                _ => Route::Direct,
            };
            let endpoints = endpoints_for(exchange, &client, route);
            tracing::info!(
                exchange = %exchange.id,
                relayed = exchange.use_relay,
                "adapter initialised"
            );
            adapters.insert(exchange.id, build_adapter(exchange.id, endpoints));
        }

        Ok(AdapterRegistry { config, adapters })
    }

    /// Get the adapter for a specific exchange
    pub fn get(&self, id: ExchangeId) -> Result<Arc<dyn ExchangeAdapter>, ConfigError> {
        self.adapters
            .get(&id)
            .cloned()
            .ok_or(ConfigError::ExchangeNotFound(id))
    }

    /// Get list of exchanges with an adapter
    pub fn exchanges(&self) -> Vec<ExchangeId> {
        let mut ids: Vec<_> = self.adapters.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    /// Get the configuration
    pub fn config(&self) -> &GatewayConfigFile {
        &self.config
    }
}

fn endpoints_for(config: &ExchangeConfig, client: &reqwest::Client, route: Route) -> Endpoints {
    Endpoints {
        spot: RestClient::new(client.clone(), config.spot_rest_url.clone(), route.clone()),
        derivatives: RestClient::new(client.clone(), config.derivatives_rest_url.clone(), route),
        spot_ws: config.spot_ws_url.clone(),
        derivatives_ws: config.derivatives_ws_url.clone(),
    }
}

fn build_adapter(id: ExchangeId, endpoints: Endpoints) -> Arc<dyn ExchangeAdapter> {
    match id {
        ExchangeId::Binance => Arc::new(BinanceAdapter::new(endpoints)),
        ExchangeId::Bybit => Arc::new(BybitAdapter::new(endpoints)),
        ExchangeId::Okx => Arc::new(OkxAdapter::new(endpoints)),
        ExchangeId::Mexc => Arc::new(MexcAdapter::new(endpoints)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelayConfig, load_default_config};
    use vrsi_core::Market;

    #[test]
    fn test_registry_from_default_config() {
        let registry = AdapterRegistry::from_config(load_default_config().unwrap()).unwrap();
        assert_eq!(registry.exchanges().len(), 4);

        for id in ExchangeId::ALL {
            assert_eq!(registry.get(id).unwrap().exchange(), id);
        }
    }

    #[test]
    fn test_disabled_exchange_is_not_built() {
        let mut config = load_default_config().unwrap();
        config
            .exchanges
            .iter_mut()
            .filter(|e| e.id == ExchangeId::Mexc)
            .for_each(|e| e.enabled = false);

        let registry = AdapterRegistry::from_config(config).unwrap();
        assert!(matches!(
            registry.get(ExchangeId::Mexc),
            Err(ConfigError::ExchangeNotFound(ExchangeId::Mexc))
        ));
    }

    #[test]
    fn test_relayed_exchange_builds() {
        let mut config = load_default_config().unwrap();
        config.relay = Some(RelayConfig {
            url: "https://relay.example.com".to_string(),
        });
        config.exchanges.iter_mut().for_each(|e| e.use_relay = e.id != ExchangeId::Binance);

        let registry = AdapterRegistry::from_config(config).unwrap();
        let okx = registry.get(ExchangeId::Okx).unwrap();
        let spec = okx.build_stream_subscription(&[vrsi_core::SymbolId::new("BTCUSDT")], Market::Spot);
        assert_eq!(spec.url, "wss://ws.okx.com:8443/ws/v5/public");
    }
}
