use async_trait::async_trait;
use vrsi_core::{Candle, ExchangeId, FundingSnapshot, Interval, Market, SymbolId, TickerUpdate};

use crate::{AdapterResult, ConnectionSpec};

/// Port for one exchange
///
/// Translates between the canonical model and a venue's REST catalog,
/// candle, funding and streaming formats. Implementations are stateless
/// apart from their immutable symbol-translation rules and HTTP client, so
/// a single instance can be shared across concurrent scan units.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Venue this adapter speaks to
    fn exchange(&self) -> ExchangeId;

    /// USDT-quoted, actively tradable instruments with leveraged tokens removed
    async fn list_usdt_symbols(&self, market: Market) -> AdapterResult<Vec<SymbolId>>;

    /// The most recent candles, oldest first, at least `min_count` when the
    /// venue has that much history (capped by its page limit)
    async fn fetch_candles(
        &self,
        symbol: &SymbolId,
        interval: Interval,
        min_count: usize,
        market: Market,
    ) -> AdapterResult<Vec<Candle>>;

    /// Funding rate and open interest for a perpetual
    async fn fetch_funding(&self, symbol: &SymbolId, market: Market)
    -> AdapterResult<FundingSnapshot>;

    /// Connection target and subscription frames for a live ticker stream
    fn build_stream_subscription(&self, symbols: &[SymbolId], market: Market) -> ConnectionSpec;

    /// Decode one inbound text frame; `None` for acks, heartbeats and anything
    /// that is not a ticker update
    fn parse_stream_message(&self, raw: &str) -> Option<TickerUpdate>;
}
