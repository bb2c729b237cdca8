use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::time::Duration;
use vrsi_core::{
    Candle, ExchangeId, FundingSnapshot, Interval, Market, SymbolId, TickerUpdate,
    into_chronological, is_leveraged_base,
};
use vrsi_ports::{AdapterError, AdapterResult, ConnectionSpec, ExchangeAdapter};

use super::json::{candle_rows, decimal, integer, seconds, str_field};
use super::{Endpoints, MarketCodecs, SymbolCodec, page_size};

const MAX_SPOT_KLINES: usize = 1000;
const MAX_CONTRACT_KLINES: usize = 2000;
const SPOT_PING_INTERVAL: Duration = Duration::from_secs(20);
const CONTRACT_PING_INTERVAL: Duration = Duration::from_secs(15);
const SPOT_DEALS_CHANNEL: &str = "spot@public.deals.v3.api@";

/// MEXC spot (`api.mexc.com`) and contract (`contract.mexc.com`) APIs
///
/// Contract symbols are spelled `BTC_USDT` and the contract kline endpoint
/// answers in columns with second timestamps.
pub struct MexcAdapter {
    endpoints: Endpoints,
    codecs: MarketCodecs,
}

impl MexcAdapter {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            codecs: MarketCodecs::new(SymbolCodec::plain(), SymbolCodec::new("_", "")),
        }
    }

    fn spot_interval(interval: Interval) -> &'static str {
        match interval {
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "60m",
            Interval::H4 => "4h",
            Interval::D1 => "1d",
            Interval::W1 => "1W",
        }
    }

    /// Contract interval token; weekly bars are served as daily ones
    fn contract_interval(interval: Interval) -> (&'static str, Interval) {
        match interval {
            Interval::M5 => ("Min5", Interval::M5),
            Interval::M15 => ("Min15", Interval::M15),
            Interval::M30 => ("Min30", Interval::M30),
            Interval::H1 => ("Min60", Interval::H1),
            Interval::H4 => ("Hour4", Interval::H4),
            Interval::D1 | Interval::W1 => ("Day1", Interval::D1),
        }
    }

    async fn fetch_contract_candles(
        &self,
        symbol: &SymbolId,
        interval: Interval,
        min_count: usize,
    ) -> AdapterResult<Vec<Candle>> {
        let (token, effective) = Self::contract_interval(interval);
        if effective != interval {
            tracing::debug!(%symbol, requested = %interval, served = %effective, "substituting contract interval");
        }
        let count = page_size(min_count, MAX_CONTRACT_KLINES) as i32;
        let end = Utc::now();
        let start = end - effective.duration() * (count + 1);

        let path = format!(
            "/api/v1/contract/kline/{}",
            self.codecs.derivatives.to_native(symbol)
        );
        let query = [
            ("interval", token.to_string()),
            ("start", start.timestamp().to_string()),
            ("end", end.timestamp().to_string()),
        ];
        let doc = self
            .endpoints
            .derivatives
            .get_json(&path, &query)
            .await
            .map_err(|e| AdapterError::candle_fetch(symbol, e))?;

        let data = contract_data(&doc).map_err(|e| AdapterError::candle_fetch(symbol, e))?;
        let candles = parse_columnar_klines(data)
            .ok_or_else(|| AdapterError::candle_fetch(symbol, "malformed contract kline columns"))?;
        Ok(into_chronological(candles))
    }
}

/// `data` of a contract envelope (`{"success": true, "code": 0, "data": ...}`)
fn contract_data(doc: &Value) -> Result<&Value, String> {
    if doc.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(format!(
            "code {}: {}",
            doc.get("code").and_then(integer).unwrap_or_default(),
            str_field(doc, "message").unwrap_or("unknown error")
        ));
    }
    doc.get("data").ok_or_else(|| "missing data".to_string())
}

fn parse_spot_exchange_info(doc: &Value, codec: &SymbolCodec) -> Option<Vec<SymbolId>> {
    let symbols = doc.get("symbols")?.as_array()?;
    let mut out = Vec::with_capacity(symbols.len());

    for s in symbols {
        // "1" on the current API, "ENABLED" on older deployments
        let enabled = matches!(str_field(s, "status"), Some("1") | Some("ENABLED"));
        if !enabled || str_field(s, "quoteAsset") != Some("USDT") {
            continue;
        }
        if s.get("isSpotTradingAllowed").and_then(Value::as_bool) == Some(false) {
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

fn parse_contract_detail(data: &Value, codec: &SymbolCodec) -> Option<Vec<SymbolId>> {
    let contracts = data.as_array()?;
    let mut out = Vec::with_capacity(contracts.len());

    for c in contracts {
        if c.get("state").and_then(integer) != Some(0) || str_field(c, "quoteCoin") != Some("USDT") {
            continue;
        }
        let Some(symbol) = str_field(c, "symbol").and_then(|n| codec.to_canonical(n)) else {
            continue;
        };
        if is_leveraged_base(symbol.base()) || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }

    Some(out)
}

/// Contract klines: `{"time": [secs...], "open": [...], "high": [...], "low": [...], "close": [...], "vol": [...]}`
fn parse_columnar_klines(data: &Value) -> Option<Vec<Candle>> {
    let column = |key: &str| data.get(key).and_then(Value::as_array);
    let time = column("time")?;
    let open = column("open")?;
    let high = column("high")?;
    let low = column("low")?;
    let close = column("close")?;
    let vol = column("vol")?;

    let len = [open.len(), high.len(), low.len(), close.len(), vol.len()]
        .into_iter()
        .fold(time.len(), usize::min);

    Some(
        (0..len)
            .filter_map(|i| {
                Some(Candle::new(
                    seconds(&time[i])?,
                    decimal(&open[i])?,
                    decimal(&high[i])?,
                    decimal(&low[i])?,
                    decimal(&close[i])?,
                    decimal(&vol[i])?,
                ))
            })
            .collect(),
    )
}

/// Spot deals push or contract `push.ticker`
fn parse_ticker(raw: &str, codecs: &MarketCodecs) -> Option<TickerUpdate> {
    let msg: Value = serde_json::from_str(raw).ok()?;

    if str_field(&msg, "channel") == Some("push.ticker") {
        let data = msg.get("data")?;
        let symbol = codecs.derivatives.to_canonical(str_field(data, "symbol")?)?;
        return Some(TickerUpdate::new(symbol, decimal(data.get("lastPrice")?)?));
    }

    if str_field(&msg, "c").is_some_and(|c| c.starts_with(SPOT_DEALS_CHANNEL)) {
        let symbol = codecs.spot.to_canonical(str_field(&msg, "s")?)?;
        // Deals arrive oldest first; the last one is the latest trade
        let price = msg
            .get("d")?
            .get("deals")?
            .as_array()?
            .last()
            .and_then(|deal| deal.get("p"))
            .and_then(decimal)?;
        return Some(TickerUpdate::new(symbol, price));
    }

    // Legacy flat shape
    let data = msg.get("data")?;
    let native = str_field(data, "symbol")?;
    let symbol = codecs
        .derivatives
        .to_canonical(native)
        .or_else(|| codecs.spot.to_canonical(native))?;
    Some(TickerUpdate::new(symbol, decimal(data.get("price")?)?))
}

#[async_trait]
impl ExchangeAdapter for MexcAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Mexc
    }

    async fn list_usdt_symbols(&self, market: Market) -> AdapterResult<Vec<SymbolId>> {
        let rest = self.endpoints.rest(market);
        let codec = self.codecs.for_market(market);
        let discovery = |e: String| AdapterError::discovery(self.exchange(), market, e);

        match market {
            Market::Spot => {
                let doc = rest
                    .get_json("/api/v3/exchangeInfo", &[])
                    .await
                    .map_err(|e| discovery(e.to_string()))?;
                parse_spot_exchange_info(&doc, codec)
                    .ok_or_else(|| discovery("missing symbols array".to_string()))
            }
            Market::Derivatives => {
                let doc = rest
                    .get_json("/api/v1/contract/detail", &[])
                    .await
                    .map_err(|e| discovery(e.to_string()))?;
                let data = contract_data(&doc).map_err(discovery)?;
                parse_contract_detail(data, codec)
                    .ok_or_else(|| discovery("contract data is not an array".to_string()))
            }
        }
    }

    async fn fetch_candles(
        &self,
        symbol: &SymbolId,
        interval: Interval,
        min_count: usize,
        market: Market,
    ) -> AdapterResult<Vec<Candle>> {
        if market.is_derivatives() {
            return self.fetch_contract_candles(symbol, interval, min_count).await;
        }

        let query = [
            ("symbol", self.codecs.spot.to_native(symbol)),
            ("interval", Self::spot_interval(interval).to_string()),
            ("limit", page_size(min_count, MAX_SPOT_KLINES).to_string()),
        ];
        let doc = self
            .endpoints
            .spot
            .get_json("/api/v3/klines", &query)
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
        let rest = &self.endpoints.derivatives;
        let native = self.codecs.derivatives.to_native(symbol);
        let funding_path = format!("/api/v1/contract/funding_rate/{}", native);
        let ticker_query = [("symbol", native)];

        let (funding, ticker) = tokio::join!(
            rest.get_json(&funding_path, &[]),
            rest.get_json("/api/v1/contract/ticker", &ticker_query),
        );
        let funding = funding.map_err(|e| AdapterError::funding_fetch(symbol, e))?;
        let ticker = ticker.map_err(|e| AdapterError::funding_fetch(symbol, e))?;

        let rate = contract_data(&funding)
            .map_err(|e| AdapterError::funding_fetch(symbol, e))?
            .get("fundingRate")
            .and_then(decimal)
            .ok_or_else(|| AdapterError::funding_fetch(symbol, "missing fundingRate"))?;
        let oi = contract_data(&ticker)
            .map_err(|e| AdapterError::funding_fetch(symbol, e))?
            .get("holdVol")
            .and_then(decimal)
            .unwrap_or_default();

        Ok(FundingSnapshot::with_discount(
            rate,
            oi,
            self.exchange().open_interest_discount(),
        ))
    }

    fn build_stream_subscription(&self, symbols: &[SymbolId], market: Market) -> ConnectionSpec {
        let codec = self.codecs.for_market(market);
        let spec = ConnectionSpec::new(self.endpoints.ws(market));

        match market {
            Market::Spot => {
                let messages = symbols
                    .iter()
                    .map(|s| {
                        json!({
                            "method": "SUBSCRIPTION",
                            "params": [format!("{}{}", SPOT_DEALS_CHANNEL, codec.to_native(s))]
                        })
                        .to_string()
                    })
                    .collect();
                spec.with_messages(messages)
                    .with_keepalive(SPOT_PING_INTERVAL, json!({"method": "PING"}).to_string())
            }
            Market::Derivatives => {
                let messages = symbols
                    .iter()
                    .map(|s| {
                        json!({"method": "sub.ticker", "param": {"symbol": codec.to_native(s)}})
                            .to_string()
                    })
                    .collect();
                spec.with_messages(messages)
                    .with_keepalive(CONTRACT_PING_INTERVAL, json!({"method": "ping"}).to_string())
            }
        }
    }

    fn parse_stream_message(&self, raw: &str) -> Option<TickerUpdate> {
        parse_ticker(raw, &self.codecs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn codecs() -> MarketCodecs {
        MarketCodecs::new(SymbolCodec::plain(), SymbolCodec::new("_", ""))
    }

    #[test]
    fn test_parse_spot_exchange_info() {
        let doc = json!({
            "symbols": [
                {"symbol": "BTCUSDT", "status": "1", "quoteAsset": "USDT", "isSpotTradingAllowed": true},
                {"symbol": "ETHUSDT", "status": "ENABLED", "quoteAsset": "USDT"},
                {"symbol": "XYZUSDT", "status": "2", "quoteAsset": "USDT"},
                {"symbol": "ETH3LUSDT", "status": "1", "quoteAsset": "USDT", "isSpotTradingAllowed": false}
            ]
        });
        let symbols = parse_spot_exchange_info(&doc, &SymbolCodec::plain()).unwrap();
        assert_eq!(symbols, vec![SymbolId::new("BTCUSDT"), SymbolId::new("ETHUSDT")]);
    }

    #[test]
    fn test_parse_contract_detail() {
        let data = json!([
            {"symbol": "BTC_USDT", "quoteCoin": "USDT", "state": 0},
            {"symbol": "ETH_USDT", "quoteCoin": "USDT", "state": 1},
            {"symbol": "BTC_USD", "quoteCoin": "USD", "state": 0}
        ]);
        let symbols = parse_contract_detail(&data, &codecs().derivatives).unwrap();
        assert_eq!(symbols, vec![SymbolId::new("BTCUSDT")]);
    }

    #[test]
    fn test_parse_columnar_klines() {
        let data = json!({
            "time": [1700000000, 1700000900],
            "open": [1.0, 2.0],
            "high": [1.5, 2.5],
            "low": [0.5, 1.5],
            "close": [1.2, 2.2],
            "vol": [100, 200]
        });
        let candles = parse_columnar_klines(&data).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time.timestamp(), 1700000000);
        assert_eq!(candles[1].close, dec!(2.2));
        assert_eq!(candles[1].volume, dec!(200));
    }

    #[test]
    fn test_contract_interval_substitutes_weekly() {
        assert_eq!(MexcAdapter::contract_interval(Interval::W1), ("Day1", Interval::D1));
        assert_eq!(MexcAdapter::contract_interval(Interval::H1), ("Min60", Interval::H1));
        assert_eq!(MexcAdapter::spot_interval(Interval::H1), "60m");
    }

    #[test]
    fn test_parse_contract_ticker() {
        let raw = json!({
            "channel": "push.ticker",
            "data": {"symbol": "BTC_USDT", "lastPrice": 43001.5, "fairPrice": 43000.0},
            "symbol": "BTC_USDT",
            "ts": 1700000000000i64
        })
        .to_string();
        let update = parse_ticker(&raw, &codecs()).unwrap();
        assert_eq!(update.symbol, SymbolId::new("BTCUSDT"));
        assert_eq!(update.price, dec!(43001.5));
    }

    #[test]
    fn test_parse_spot_deals() {
        let raw = json!({
            "c": "spot@public.deals.v3.api@ETHUSDT",
            "d": {"deals": [{"S": 1, "p": "2300.10", "t": 1, "v": "0.5"}, {"S": 2, "p": "2300.25", "t": 2, "v": "1"}], "e": "spot@public.deals.v3.api"},
            "s": "ETHUSDT",
            "t": 1700000000000i64
        })
        .to_string();
        let update = parse_ticker(&raw, &codecs()).unwrap();
        assert_eq!(update.symbol, SymbolId::new("ETHUSDT"));
        assert_eq!(update.price, dec!(2300.25));
    }

    #[test]
    fn test_parse_ignores_pong_and_acks() {
        let pong = json!({"channel": "pong", "data": 1700000000000i64});
        assert!(parse_ticker(&pong.to_string(), &codecs()).is_none());
        let ack = json!({"id": 0, "code": 0, "msg": "spot@public.deals.v3.api@BTCUSDT"});
        assert!(parse_ticker(&ack.to_string(), &codecs()).is_none());
    }

    fn adapter() -> MexcAdapter {
        MexcAdapter::new(Endpoints::offline(
            "wss://wbs.mexc.com/ws",
            "wss://contract.mexc.com/edge",
        ))
    }

    fn frames(spec: &ConnectionSpec) -> Vec<Value> {
        spec.subscribe_messages
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect()
    }

    #[test]
    fn test_spot_stream_subscription() {
        let spec = adapter().build_stream_subscription(
            &[SymbolId::new("BTCUSDT"), SymbolId::new("ETHUSDT")],
            Market::Spot,
        );
        assert_eq!(spec.url, "wss://wbs.mexc.com/ws");
        assert_eq!(
            frames(&spec),
            vec![
                json!({"method": "SUBSCRIPTION", "params": ["spot@public.deals.v3.api@BTCUSDT"]}),
                json!({"method": "SUBSCRIPTION", "params": ["spot@public.deals.v3.api@ETHUSDT"]}),
            ]
        );
        let keepalive = spec.keepalive.unwrap();
        assert_eq!(keepalive.interval, SPOT_PING_INTERVAL);
        assert_eq!(
            serde_json::from_str::<Value>(&keepalive.payload).unwrap(),
            json!({"method": "PING"})
        );
    }

    #[test]
    fn test_contract_stream_subscription() {
        let spec =
            adapter().build_stream_subscription(&[SymbolId::new("BTCUSDT")], Market::Derivatives);
        assert_eq!(spec.url, "wss://contract.mexc.com/edge");
        assert_eq!(
            frames(&spec),
            vec![json!({"method": "sub.ticker", "param": {"symbol": "BTC_USDT"}})]
        );
        let keepalive = spec.keepalive.unwrap();
        assert_eq!(keepalive.interval, CONTRACT_PING_INTERVAL);
        assert_eq!(
            serde_json::from_str::<Value>(&keepalive.payload).unwrap(),
            json!({"method": "ping"})
        );
    }
}
