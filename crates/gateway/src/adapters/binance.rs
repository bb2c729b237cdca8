use async_trait::async_trait;
use serde_json::Value;
use vrsi_core::{
    Candle, ExchangeId, FundingSnapshot, Interval, Market, SymbolId, TickerUpdate,
    into_chronological, is_leveraged_base,
};
use vrsi_ports::{AdapterError, AdapterResult, ConnectionSpec, ExchangeAdapter};

use super::json::{candle_rows, decimal, str_field};
use super::{Endpoints, MarketCodecs, SymbolCodec, page_size};

const MAX_KLINES: usize = 1000;

/// Binance spot (`api.binance.com`) and USDT-M futures (`fapi.binance.com`)
pub struct BinanceAdapter {
    endpoints: Endpoints,
    codecs: MarketCodecs,
}

impl BinanceAdapter {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            codecs: MarketCodecs::new(SymbolCodec::plain(), SymbolCodec::plain()),
        }
    }

    fn api_prefix(market: Market) -> &'static str {
        match market {
            Market::Spot => "/api/v3",
            Market::Derivatives => "/fapi/v1",
        }
    }
}

/// Symbols from an `exchangeInfo` document
fn parse_exchange_info(doc: &Value, market: Market, codec: &SymbolCodec) -> Option<Vec<SymbolId>> {
    let symbols = doc.get("symbols")?.as_array()?;
    let mut out = Vec::with_capacity(symbols.len());

    for s in symbols {
        if str_field(s, "status") != Some("TRADING") || str_field(s, "quoteAsset") != Some("USDT") {
            continue;
        }
        if market.is_derivatives() && str_field(s, "contractType") != Some("PERPETUAL") {
            continue;
        }
        let Some(symbol) = str_field(s, "symbol").and_then(|n| codec.to_canonical(n)) else {
            continue;
        };
        if is_leveraged_base(symbol.base()) || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }

    Some(out)
}

/// Combined-stream ticker: `{"stream": "btcusdt@ticker", "data": {"s": "BTCUSDT", "c": "..."}}`
fn parse_ticker(raw: &str, codec: &SymbolCodec) -> Option<TickerUpdate> {
    let msg: Value = serde_json::from_str(raw).ok()?;
    let data = msg.get("data").unwrap_or(&msg);
    if let Some(event) = str_field(data, "e") {
        if event != "24hrTicker" {
            return None;
        }
    }
    let symbol = codec.to_canonical(str_field(data, "s")?)?;
    let price = decimal(data.get("c")?)?;
    Some(TickerUpdate::new(symbol, price))
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    async fn list_usdt_symbols(&self, market: Market) -> AdapterResult<Vec<SymbolId>> {
        let path = format!("{}/exchangeInfo", Self::api_prefix(market));
        let doc = self
            .endpoints
            .rest(market)
            .get_json(&path, &[])
            .await
            .map_err(|e| AdapterError::discovery(self.exchange(), market, e))?;

        parse_exchange_info(&doc, market, self.codecs.for_market(market))
            .ok_or_else(|| AdapterError::discovery(self.exchange(), market, "missing symbols array"))
    }

    async fn fetch_candles(
        &self,
        symbol: &SymbolId,
        interval: Interval,
        min_count: usize,
        market: Market,
    ) -> AdapterResult<Vec<Candle>> {
        let path = format!("{}/klines", Self::api_prefix(market));
        let query = [
            ("symbol", self.codecs.for_market(market).to_native(symbol)),
            ("interval", interval.as_str().to_string()),
            ("limit", page_size(min_count, MAX_KLINES).to_string()),
        ];
        let doc = self
            .endpoints
            .rest(market)
            .get_json(&path, &query)
            .await
            .map_err(|e| AdapterError::candle_fetch(symbol, e))?;

        let candles = candle_rows(&doc)
            .ok_or_else(|| AdapterError::candle_fetch(symbol, "klines response is not an array"))?;
        Ok(into_chronological(candles))
    }

    async fn fetch_funding(&self, symbol: &SymbolId, market: Market) -> AdapterResult<FundingSnapshot> {
        if !market.is_derivatives() {
            return Ok(FundingSnapshot::zero());
        }
        let rest = self.endpoints.rest(market);
        let query = [("symbol", self.codecs.derivatives.to_native(symbol))];

        let (premium, open_interest) = tokio::join!(
            rest.get_json("/fapi/v1/premiumIndex", &query),
            rest.get_json("/fapi/v1/openInterest", &query),
        );
        let premium = premium.map_err(|e| AdapterError::funding_fetch(symbol, e))?;
        let open_interest = open_interest.map_err(|e| AdapterError::funding_fetch(symbol, e))?;

        let rate = premium
            .get("lastFundingRate")
            .and_then(decimal)
            .ok_or_else(|| AdapterError::funding_fetch(symbol, "missing lastFundingRate"))?;
        let oi = open_interest
            .get("openInterest")
            .and_then(decimal)
            .ok_or_else(|| AdapterError::funding_fetch(symbol, "missing openInterest"))?;

        Ok(FundingSnapshot::with_discount(
            rate,
            oi,
            self.exchange().open_interest_discount(),
        ))
    }

    fn build_stream_subscription(&self, symbols: &[SymbolId], market: Market) -> ConnectionSpec {
        let codec = self.codecs.for_market(market);
        let streams = symbols
            .iter()
            .map(|s| format!("{}@ticker", codec.to_native(s).to_ascii_lowercase()))
            .collect::<Vec<_>>()
            .join("/");
        ConnectionSpec::new(format!(
            "{}/stream?streams={}",
            self.endpoints.ws(market),
            streams
        ))
    }

    fn parse_stream_message(&self, raw: &str) -> Option<TickerUpdate> {
        parse_ticker(raw, &self.codecs.spot)
    }
}
