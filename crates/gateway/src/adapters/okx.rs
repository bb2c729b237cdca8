use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use vrsi_core::{
    Candle, ExchangeId, FundingSnapshot, Interval, Market, SymbolId, TickerUpdate,
    into_chronological, is_leveraged_base,
};
use vrsi_ports::{AdapterError, AdapterResult, ConnectionSpec, ExchangeAdapter};

use super::json::{candle_rows, decimal, str_field};
use super::{Endpoints, MarketCodecs, SymbolCodec, page_size};

const MAX_CANDLES: usize = 300;
const PING_INTERVAL: Duration = Duration::from_secs(25);

/// OKX v5 public API; spot ids are `BTC-USDT`, swaps `BTC-USDT-SWAP`
pub struct OkxAdapter {
    endpoints: Endpoints,
    codecs: MarketCodecs,
}

impl OkxAdapter {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            codecs: MarketCodecs::new(SymbolCodec::new("-", ""), SymbolCodec::new("-", "-SWAP")),
        }
    }

    fn inst_type(market: Market) -> &'static str {
        match market {
            Market::Spot => "SPOT",
            Market::Derivatives => "SWAP",
        }
    }

    fn bar(interval: Interval) -> &'static str {
        match interval {
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1H",
            Interval::H4 => "4H",
            Interval::D1 => "1D",
            Interval::W1 => "1W",
        }
    }
}

/// `data` of an OKX envelope (`{"code": "0", "msg": "", "data": [...]}`)
fn envelope_data(doc: &Value) -> Result<&Value, String> {
    match str_field(doc, "code") {
        Some("0") | None => doc.get("data").ok_or_else(|| "missing data".to_string()),
        Some(code) => Err(format!(
            "code {}: {}",
            code,
            str_field(doc, "msg").unwrap_or("unknown error")
        )),
    }
}

fn parse_instruments(data: &Value, market: Market, codec: &SymbolCodec) -> Option<Vec<SymbolId>> {
    let list = data.as_array()?;
    let mut out = Vec::with_capacity(list.len());

    for inst in list {
        if str_field(inst, "state") != Some("live") {
            continue;
        }
        let quoted_in_usdt = match market {
            Market::Spot => str_field(inst, "quoteCcy") == Some("USDT"),
            Market::Derivatives => {
                str_field(inst, "settleCcy") == Some("USDT") && str_field(inst, "ctType") == Some("linear")
            }
        };
        if !quoted_in_usdt {
            continue;
        }
        let Some(symbol) = str_field(inst, "instId").and_then(|id| codec.to_canonical(id)) else {
            continue;
        };
        if is_leveraged_base(symbol.base()) || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }

    Some(out)
}

/// `{"arg": {"channel": "tickers", "instId": "BTC-USDT"}, "data": [{"instId": ..., "last": ...}]}`
fn parse_ticker(raw: &str, codecs: &MarketCodecs) -> Option<TickerUpdate> {
    let msg: Value = serde_json::from_str(raw).ok()?;
    if let Some(channel) = msg.get("arg").and_then(|a| str_field(a, "channel")) {
        if channel != "tickers" {
            return None;
        }
    }
    let tick = msg.get("data")?.get(0)?;
    let inst_id = str_field(tick, "instId")?;
    let symbol = codecs
        .derivatives
        .to_canonical(inst_id)
        .or_else(|| codecs.spot.to_canonical(inst_id))?;
    let price = decimal(tick.get("last")?)?;
    Some(TickerUpdate::new(symbol, price))
}

#[async_trait]
impl ExchangeAdapter for OkxAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Okx
    }

    async fn list_usdt_symbols(&self, market: Market) -> AdapterResult<Vec<SymbolId>> {
        let query = [("instType", Self::inst_type(market).to_string())];
        let doc = self
            .endpoints
            .rest(market)
            .get_json("/api/v5/public/instruments", &query)
            .await
            .map_err(|e| AdapterError::discovery(self.exchange(), market, e))?;

        let data = envelope_data(&doc).map_err(|e| AdapterError::discovery(self.exchange(), market, e))?;
        parse_instruments(data, market, self.codecs.for_market(market))
            .ok_or_else(|| AdapterError::discovery(self.exchange(), market, "instrument data is not an array"))
    }

    async fn fetch_candles(
        &self,
        symbol: &SymbolId,
        interval: Interval,
        min_count: usize,
        market: Market,
    ) -> AdapterResult<Vec<Candle>> {
        let query = [
            ("instId", self.codecs.for_market(market).to_native(symbol)),
            ("bar", Self::bar(interval).to_string()),
            ("limit", page_size(min_count, MAX_CANDLES).to_string()),
        ];
        let doc = self
            .endpoints
            .rest(market)
            .get_json("/api/v5/market/candles", &query)
            .await
            .map_err(|e| AdapterError::candle_fetch(symbol, e))?;

        let data = envelope_data(&doc).map_err(|e| AdapterError::candle_fetch(symbol, e))?;
        // Newest first on the wire
        let candles = candle_rows(data)
            .ok_or_else(|| AdapterError::candle_fetch(symbol, "candle data is not an array"))?;
        Ok(into_chronological(candles))
    }

    async fn fetch_funding(&self, symbol: &SymbolId, market: Market) -> AdapterResult<FundingSnapshot> {
        if !market.is_derivatives() {
            return Ok(FundingSnapshot::zero());
        }
        let rest = self.endpoints.rest(market);
        let inst_id = self.codecs.derivatives.to_native(symbol);
        let funding_query = [("instId", inst_id.clone())];
        let oi_query = [("instType", "SWAP".to_string()), ("instId", inst_id)];

        let (funding, open_interest) = tokio::join!(
            rest.get_json("/api/v5/public/funding-rate", &funding_query),
            rest.get_json("/api/v5/public/open-interest", &oi_query),
        );
        let funding = funding.map_err(|e| AdapterError::funding_fetch(symbol, e))?;
        let open_interest = open_interest.map_err(|e| AdapterError::funding_fetch(symbol, e))?;

        let rate = envelope_data(&funding)
            .map_err(|e| AdapterError::funding_fetch(symbol, e))?
            .get(0)
            .and_then(|d| d.get("fundingRate"))
            .and_then(decimal)
            .ok_or_else(|| AdapterError::funding_fetch(symbol, "missing fundingRate"))?;
        let oi = envelope_data(&open_interest)
            .map_err(|e| AdapterError::funding_fetch(symbol, e))?
            .get(0)
            .and_then(|d| d.get("oi"))
            .and_then(decimal)
            .ok_or_else(|| AdapterError::funding_fetch(symbol, "missing oi"))?;

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
            .map(|s| {
                json!({
                    "op": "subscribe",
                    "args": [{"channel": "tickers", "instId": codec.to_native(s)}]
                })
                .to_string()
            })
            .collect();
        ConnectionSpec::new(self.endpoints.ws(market))
            .with_messages(messages)
            .with_keepalive(PING_INTERVAL, "ping")
    }

    fn parse_stream_message(&self, raw: &str) -> Option<TickerUpdate> {
        parse_ticker(raw, &self.codecs)
    }
}
