use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use vrsi_core::{
    Candle, ExchangeId, FundingSnapshot, Interval, Market, SymbolId, TickerUpdate,
    into_chronological, is_leveraged_base,
};
use vrsi_ports::{AdapterError, AdapterResult, ConnectionSpec, ExchangeAdapter};

use super::json::{candle_rows, decimal, integer, str_field};
use super::{Endpoints, MarketCodecs, SymbolCodec, page_size};

const MAX_KLINES: usize = 1000;
const PING_INTERVAL: Duration = Duration::from_secs(20);

/// Bybit v5 unified API (`category=spot` / `category=linear`)
pub struct BybitAdapter {
    endpoints: Endpoints,
    codecs: MarketCodecs,
}

impl BybitAdapter {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            codecs: MarketCodecs::new(SymbolCodec::plain(), SymbolCodec::plain()),
        }
    }

    fn category(market: Market) -> &'static str {
        match market {
            Market::Spot => "spot",
            Market::Derivatives => "linear",
        }
    }

    fn interval_token(interval: Interval) -> &'static str {
        match interval {
            Interval::M5 => "5",
            Interval::M15 => "15",
            Interval::M30 => "30",
            Interval::H1 => "60",
            Interval::H4 => "240",
            Interval::D1 => "D",
            Interval::W1 => "W",
        }
    }
}

/// `result` of a v5 envelope, or the venue's error message
fn v5_result(doc: &Value) -> Result<&Value, String> {
    match doc.get("retCode").and_then(integer) {
        Some(0) | None => doc
            .get("result")
            .ok_or_else(|| "missing result".to_string()),
        Some(code) => Err(format!(
            "retCode {}: {}",
            code,
            str_field(doc, "retMsg").unwrap_or("unknown error")
        )),
    }
}

fn parse_instruments(result: &Value, market: Market, codec: &SymbolCodec) -> Option<Vec<SymbolId>> {
    let list = result.get("list")?.as_array()?;
    let mut out = Vec::with_capacity(list.len());

    for s in list {
        if str_field(s, "status") != Some("Trading") || str_field(s, "quoteCoin") != Some("USDT") {
            continue;
        }
        if market.is_derivatives() && str_field(s, "contractType") != Some("LinearPerpetual") {
            continue;
        }
        let Some(symbol) = str_field(s, "symbol").and_then(|n| codec.to_canonical(n)) else {
            continue;
        };
        // Dated contracts and odd listings use a symbol other than BASE+USDT
        if str_field(s, "baseCoin").is_some_and(|base| base != symbol.base()) {
            continue;
        }
        if is_leveraged_base(symbol.base()) || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }

    Some(out)
}

/// `{"topic": "tickers.BTCUSDT", "type": "snapshot", "data": {"symbol": ..., "lastPrice": ...}}`
///
/// Delta frames without a last price carry nothing for us.
fn parse_ticker(raw: &str, codec: &SymbolCodec) -> Option<TickerUpdate> {
    let msg: Value = serde_json::from_str(raw).ok()?;
    if !str_field(&msg, "topic")?.starts_with("tickers.") {
        return None;
    }
    let data = msg.get("data")?;
    let symbol = codec.to_canonical(str_field(data, "symbol")?)?;
    let price = decimal(data.get("lastPrice")?)?;
    Some(TickerUpdate::new(symbol, price))
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bybit
    }

    async fn list_usdt_symbols(&self, market: Market) -> AdapterResult<Vec<SymbolId>> {
        let query = [
            ("category", Self::category(market).to_string()),
            ("limit", "1000".to_string()),
        ];
        let doc = self
            .endpoints
            .rest(market)
            .get_json("/v5/market/instruments-info", &query)
            .await
            .map_err(|e| AdapterError::discovery(self.exchange(), market, e))?;

        let result = v5_result(&doc).map_err(|e| AdapterError::discovery(self.exchange(), market, e))?;
        parse_instruments(result, market, self.codecs.for_market(market))
            .ok_or_else(|| AdapterError::discovery(self.exchange(), market, "missing instrument list"))
    }

    async fn fetch_candles(
        &self,
        symbol: &SymbolId,
        interval: Interval,
        min_count: usize,
        market: Market,
    ) -> AdapterResult<Vec<Candle>> {
        let query = [
            ("category", Self::category(market).to_string()),
            ("symbol", self.codecs.for_market(market).to_native(symbol)),
            ("interval", Self::interval_token(interval).to_string()),
            ("limit", page_size(min_count, MAX_KLINES).to_string()),
        ];
        let doc = self
            .endpoints
            .rest(market)
            .get_json("/v5/market/kline", &query)
            .await
            .map_err(|e| AdapterError::candle_fetch(symbol, e))?;

        let result = v5_result(&doc).map_err(|e| AdapterError::candle_fetch(symbol, e))?;
        // Newest first on the wire
        let candles = result
            .get("list")
            .and_then(candle_rows)
            .ok_or_else(|| AdapterError::candle_fetch(symbol, "missing kline list"))?;
        Ok(into_chronological(candles))
    }

    async fn fetch_funding(&self, symbol: &SymbolId, market: Market) -> AdapterResult<FundingSnapshot> {
        if !market.is_derivatives() {
            return Ok(FundingSnapshot::zero());
        }
        let query = [
            ("category", "linear".to_string()),
            ("symbol", self.codecs.derivatives.to_native(symbol)),
        ];
        let doc = self
            .endpoints
            .rest(market)
            .get_json("/v5/market/tickers", &query)
            .await
            .map_err(|e| AdapterError::funding_fetch(symbol, e))?;

        let result = v5_result(&doc).map_err(|e| AdapterError::funding_fetch(symbol, e))?;
        let ticker = result
            .get("list")
            .and_then(|l| l.get(0))
            .ok_or_else(|| AdapterError::funding_fetch(symbol, "empty ticker list"))?;

        let rate = ticker.get("fundingRate").and_then(decimal).unwrap_or_default();
        let oi = ticker.get("openInterest").and_then(decimal).unwrap_or_default();
        Ok(FundingSnapshot::with_discount(
            rate,
            oi,
            self.exchange().open_interest_discount(),
        ))
    }

    fn build_stream_subscription(&self, symbols: &[SymbolId], market: Market) -> ConnectionSpec {
        let codec = self.codecs.for_market(market);
        let messages = symbols
            .iter()
            .map(|s| json!({"op": "subscribe", "args": [format!("tickers.{}", codec.to_native(s))]}).to_string())
            .collect();
        ConnectionSpec::new(self.endpoints.ws(market))
            .with_messages(messages)
            .with_keepalive(PING_INTERVAL, json!({"op": "ping"}).to_string())
    }

    fn parse_stream_message(&self, raw: &str) -> Option<TickerUpdate> {
        parse_ticker(raw, &self.codecs.spot)
    }
}
