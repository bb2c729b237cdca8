//! Live price overlay for the symbols of a finished scan

use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use vrsi_core::{Market, Price, ScanResult, SymbolId, TickerUpdate};
use vrsi_gateway::{LiveStream, StreamConfig, StreamError, StreamStatus};
use vrsi_ports::ExchangeAdapter;

/// Latest streamed price per symbol; each update replaces the previous one
#[derive(Debug, Default)]
pub struct PriceBoard {
    prices: DashMap<SymbolId, Price>,
    updates: AtomicU64,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, update: TickerUpdate) {
        self.prices.insert(update.symbol, update.price);
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn price(&self, symbol: &SymbolId) -> Option<Price> {
        self.prices.get(symbol).map(|p| *p)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Updates received, including ones that replaced an earlier price
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

/// Stream prices for `symbols` until `duration` elapses, `shutdown` resolves
/// or the stream gives up
pub async fn watch_prices(
    adapter: Arc<dyn ExchangeAdapter>,
    symbols: &[SymbolId],
    market: Market,
    config: StreamConfig,
    duration: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<Arc<PriceBoard>, StreamError> {
    let board = Arc::new(PriceBoard::new());
    let sink = {
        let board = board.clone();
        move |update: TickerUpdate| board.record(update)
    };

    let mut handle = LiveStream::new(config).subscribe(adapter, symbols, market, sink);
    info!(symbols = symbols.len(), seconds = duration.as_secs(), "Streaming live prices");

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = shutdown => info!("Interrupt received, closing stream"),
        status = handle.closed() => {
            if let StreamStatus::Failed { reason } = status {
                warn!(%reason, "Live stream gave up");
            }
        }
    }

    handle.unsubscribe().await?;
    info!(updates = board.updates(), symbols = board.len(), "Live stream closed");
    Ok(board)
}

/// Scan price next to the latest streamed price
pub struct LiveOverlay<'a> {
    rows: &'a [&'a ScanResult],
    board: &'a PriceBoard,
}

impl<'a> LiveOverlay<'a> {
    pub fn new(rows: &'a [&'a ScanResult], board: &'a PriceBoard) -> Self {
        LiveOverlay { rows, board }
    }
}

impl fmt::Display for LiveOverlay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>16} {:>16} {:>8}",
            "SYMBOL", "SCAN PRICE", "LIVE PRICE", "MOVE%"
        )?;
        for r in self.rows {
            let live = self.board.price(&r.symbol);
            let moved = live
                .filter(|_| !r.last_price.is_zero())
                .map(|p| ((p - r.last_price) / r.last_price * Price::ONE_HUNDRED).round_dp(2).normalize());
            writeln!(
                f,
                "{:<14} {:>16} {:>16} {:>8}",
                r.symbol.as_str(),
                r.last_price.normalize().to_string(),
                live.map(|p| p.normalize().to_string()).unwrap_or_else(|| "-".into()),
                moved.map(|m| m.to_string()).unwrap_or_else(|| "-".into())
            )?;
        }
        Ok(())
    }
}
