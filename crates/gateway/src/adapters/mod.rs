//! Exchange adapters
//!
//! One [`ExchangeAdapter`](vrsi_ports::ExchangeAdapter) implementation per
//! venue. Each adapter owns its endpoints and its symbol-translation rules;
//! both are built once and never mutated.

mod binance;
mod bybit;
mod codec;
mod json;
mod mexc;
mod okx;

pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;
pub use codec::{MarketCodecs, SymbolCodec};
pub use mexc::MexcAdapter;
pub use okx::OkxAdapter;

use vrsi_core::Market;

use crate::transport::RestClient;

/// REST clients and stream URLs of one venue, per market
#[derive(Clone)]
pub struct Endpoints {
    pub spot: RestClient,
    pub derivatives: RestClient,
    pub spot_ws: String,
    pub derivatives_ws: String,
}

impl Endpoints {
    pub fn rest(&self, market: Market) -> &RestClient {
        match market {
            Market::Spot => &self.spot,
            Market::Derivatives => &self.derivatives,
        }
    }

    pub fn ws(&self, market: Market) -> &str {
        let url = match market {
            Market::Spot => &self.spot_ws,
            Market::Derivatives => &self.derivatives_ws,
        };
        url.trim_end_matches('/')
    }
}

/// Number of candles to request, clamped to a venue's page size
fn page_size(min_count: usize, max: usize) -> usize {
    min_count.clamp(1, max)
}

#[cfg(test)]
impl Endpoints {
    /// Endpoints that are never dialled; only the stream URLs matter
    pub(crate) fn offline(spot_ws: &str, derivatives_ws: &str) -> Self {
        use crate::transport::Route;

        let rest = RestClient::new(reqwest::Client::new(), "http://127.0.0.1:9", Route::Direct);
        Endpoints {
            spot: rest.clone(),
            derivatives: rest,
            spot_ws: spot_ws.to_string(),
            derivatives_ws: derivatives_ws.to_string(),
        }
    }
}
