//! Scan orchestration against an in-memory exchange

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use vrsi_core::{
    Candle, ExchangeId, FundingSnapshot, Interval, Market, SymbolId, TickerUpdate,
};
use vrsi_ports::{AdapterError, AdapterResult, ConnectionSpec, ExchangeAdapter};
use vrsi_scanner::{
    CancelHandle, ScanConfig, ScanError, ScanEvent, ScanHandle, ScanState, Scanner,
    SymbolSelection,
};

// ============================================================================
// Mock exchange
// ============================================================================

#[derive(Default)]
struct MockExchange {
    symbols: Vec<SymbolId>,
    series: HashMap<SymbolId, Vec<Candle>>,
    fail_discovery: bool,
    failing_candles: HashSet<SymbolId>,
    fail_funding: bool,
    candle_delay: Option<Duration>,
    discovery_calls: AtomicUsize,
    candle_calls: Mutex<Vec<SymbolId>>,
}

impl MockExchange {
    fn listing(symbols: &[&str]) -> Self {
        MockExchange {
            symbols: symbols.iter().map(|s| SymbolId::new(*s)).collect(),
            ..Default::default()
        }
    }

    fn with_series(mut self, symbol: &str, moves: &[i64]) -> Self {
        self.series.insert(SymbolId::new(symbol), trend(moves));
        self
    }

    fn failing(mut self, symbol: &str) -> Self {
        self.failing_candles.insert(SymbolId::new(symbol));
        self
    }

    fn calls(&self) -> Vec<SymbolId> {
        self.candle_calls.lock().clone()
    }
}

#[async_trait]
impl ExchangeAdapter for MockExchange {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    async fn list_usdt_symbols(&self, market: Market) -> AdapterResult<Vec<SymbolId>> {
        self.discovery_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_discovery {
            return Err(AdapterError::discovery(self.exchange(), market, "HTTP 503"));
        }
        Ok(self.symbols.clone())
    }

    async fn fetch_candles(
        &self,
        symbol: &SymbolId,
        _interval: Interval,
        _min_count: usize,
        _market: Market,
    ) -> AdapterResult<Vec<Candle>> {
        self.candle_calls.lock().push(symbol.clone());
        if let Some(delay) = self.candle_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_candles.contains(symbol) {
            return Err(AdapterError::candle_fetch(symbol, "HTTP 429"));
        }
        Ok(self
            .series
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| trend(&[1, 1, 1, 1])))
    }

    async fn fetch_funding(
        &self,
        symbol: &SymbolId,
        _market: Market,
    ) -> AdapterResult<FundingSnapshot> {
        if self.fail_funding {
            return Err(AdapterError::funding_fetch(symbol, "timeout"));
        }
        Ok(FundingSnapshot::with_discount(dec!(0.0001), dec!(1000), dec!(0.95)))
    }

    fn build_stream_subscription(&self, _symbols: &[SymbolId], _market: Market) -> ConnectionSpec {
        ConnectionSpec::new("ws://127.0.0.1:1")
    }

    fn parse_stream_message(&self, _raw: &str) -> Option<TickerUpdate> {
        None
    }
}

/// Candles starting at a close of 100, one per close-to-close move
fn trend(moves: &[i64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut close = dec!(100);
    let mut candles = vec![Candle::new(start, close, close, close, close, dec!(10))];
    for (i, step) in moves.iter().enumerate() {
        close += Decimal::from(*step);
        let open_time = start + chrono::Duration::minutes(15 * (i as i64 + 1));
        candles.push(Candle::new(open_time, close, close, close, close, dec!(10)));
    }
    candles
}

fn config() -> ScanConfig {
    ScanConfig::new(ExchangeId::Binance)
        .with_signal(4, 0.12, 0.25)
        .with_batching(2, Duration::from_millis(200))
}

fn scanner(mock: &Arc<MockExchange>) -> Scanner {
    Scanner::new().with_adapter(mock.clone())
}

async fn drain(handle: &mut ScanHandle) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

fn progress_of(events: &[ScanEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress(p) => Some(p.completed),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Completion
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_scan_ranks_results() {
    let mock = Arc::new(
        MockExchange::listing(&["AUSDT", "BUSDT", "CUSDT", "DUSDT"])
            .with_series("AUSDT", &[1, 1, 1, 1])
            .with_series("BUSDT", &[-1, -1, -1, 1])
            .with_series("CUSDT", &[1, -1, 1, -1])
            .with_series("DUSDT", &[1, 1, 1, -1]),
    );
    let mut handle = scanner(&mock).start_scan(config()).unwrap();

    let events = drain(&mut handle).await;
    assert!(matches!(events[0], ScanEvent::Started { total: 4, .. }));
    assert!(matches!(events.last(), Some(ScanEvent::Completed(_))));

    let report = handle.join().await.unwrap();
    assert_eq!(report.state, ScanState::Completed);
    assert_eq!(report.results.len(), 4);

    // B and D tie on strength; the symbol breaks the tie
    let order: Vec<&str> = report.ranked().iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, vec!["AUSDT", "BUSDT", "DUSDT", "CUSDT"]);

    let stats = report.stats();
    assert_eq!((stats.long, stats.short, stats.neutral), (2, 1, 1));
    assert_eq!(report.results[&SymbolId::new("CUSDT")].raw_index, 50.0);
    assert_eq!(report.results[&SymbolId::new("AUSDT")].last_price, dec!(104));
    assert_eq!(report.results[&SymbolId::new("AUSDT")].funding, None);
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic() {
    let symbols = ["AUSDT", "BUSDT", "CUSDT", "DUSDT", "EUSDT", "FUSDT", "GUSDT"];
    let mock = Arc::new(MockExchange::listing(&symbols));
    let mut handle = scanner(&mock).start_scan(config()).unwrap();

    let events = drain(&mut handle).await;
    assert_eq!(progress_of(&events), vec![2, 4, 6, 7]);

    let batches: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::BatchResults(r) => Some(r.len()),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![2, 2, 2, 1]);

    let report = handle.join().await.unwrap();
    assert_eq!(report.progress().percent(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_empty_universe() {
    let mock = Arc::new(MockExchange::listing(&[]));
    let mut handle = scanner(&mock).start_scan(config()).unwrap();

    let events = drain(&mut handle).await;
    assert!(matches!(
        events.as_slice(),
        [ScanEvent::EmptyUniverse {
            exchange: ExchangeId::Binance,
            market: Market::Spot
        }]
    ));

    let err = handle.join().await.unwrap_err();
    assert_eq!(
        err,
        ScanError::EmptyUniverse {
            exchange: ExchangeId::Binance,
            market: Market::Spot
        }
    );
    assert!(mock.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_discovery_failure_is_empty_universe() {
    let mock = Arc::new(MockExchange {
        fail_discovery: true,
        ..MockExchange::listing(&["BTCUSDT"])
    });
    let handle = scanner(&mock).start_scan(config()).unwrap();

    assert!(matches!(
        handle.join().await,
        Err(ScanError::EmptyUniverse { .. })
    ));
    assert_eq!(mock.discovery_calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Per-symbol failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_all_candle_fetches_fail() {
    let mock = Arc::new(
        MockExchange::listing(&["AUSDT", "BUSDT", "CUSDT"])
            .failing("AUSDT")
            .failing("BUSDT")
            .failing("CUSDT"),
    );
    let handle = scanner(&mock).start_scan(config()).unwrap();

    let report = handle.join().await.unwrap();
    assert_eq!(report.state, ScanState::Completed);
    assert!(report.results.is_empty());
    assert_eq!(report.failures.candle_fetch, 3);
    assert_eq!(report.completed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_short_history_is_counted() {
    let mock = Arc::new(
        MockExchange::listing(&["AUSDT", "BUSDT"])
            .with_series("AUSDT", &[1, 1])
            .failing("BUSDT"),
    );
    let report = scanner(&mock).start_scan(config()).unwrap().join().await.unwrap();

    assert!(report.results.is_empty());
    assert_eq!(report.failures.insufficient_data, 1);
    assert_eq!(report.failures.candle_fetch, 1);
    assert_eq!(report.failures.dropped(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_funding_failure_falls_back_to_zero() {
    let mock = Arc::new(MockExchange {
        fail_funding: true,
        ..MockExchange::listing(&["BTCUSDT", "ETHUSDT"])
    });
    let config = config().with_market(Market::Derivatives);
    let report = scanner(&mock).start_scan(config).unwrap().join().await.unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failures.funding_fetch, 2);
    for result in report.results.values() {
        assert_eq!(result.funding, Some(FundingSnapshot::zero()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_funding_attached_on_derivatives() {
    let mock = Arc::new(MockExchange::listing(&["BTCUSDT"]));
    let config = config().with_market(Market::Derivatives);
    let report = scanner(&mock).start_scan(config).unwrap().join().await.unwrap();

    let funding = report.results[&SymbolId::new("BTCUSDT")].funding.unwrap();
    assert_eq!(funding.open_interest_prev_estimate, dec!(950));

    let without = scanner(&mock)
        .start_scan(self::config().with_market(Market::Derivatives).with_funding(false))
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(without.results[&SymbolId::new("BTCUSDT")].funding, None);
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_explicit_selection_skips_discovery() {
    let mock = Arc::new(MockExchange::listing(&["AUSDT", "BUSDT", "CUSDT"]));
    let selection = SymbolSelection::Explicit(vec![
        SymbolId::new("ETHUSDT"),
        SymbolId::new("BTCUSDT"),
        SymbolId::new("ETHUSDT"),
    ]);
    let report = scanner(&mock)
        .start_scan(config().with_selection(selection))
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(mock.discovery_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        report.universe,
        vec![SymbolId::new("ETHUSDT"), SymbolId::new("BTCUSDT")]
    );
    assert_eq!(mock.calls().len(), 2);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_after_first_batch_stops_scan() {
    let symbols = ["AUSDT", "BUSDT", "CUSDT", "DUSDT", "EUSDT", "FUSDT"];
    let mock = Arc::new(MockExchange::listing(&symbols));
    let mut handle = scanner(&mock).start_scan(config()).unwrap();

    while let Some(event) = handle.next_event().await {
        if let ScanEvent::Progress(progress) = event {
            assert_eq!(progress.completed, 2);
            handle.cancel();
            break;
        }
    }

    let events = drain(&mut handle).await;
    assert!(matches!(events.as_slice(), [ScanEvent::Cancelled(_)]));

    let report = handle.join().await.unwrap();
    assert!(report.is_cancelled());
    assert_eq!(report.completed, 2);
    assert_eq!(report.results.len(), 2);
    // The second batch never started
    assert_eq!(
        mock.calls(),
        vec![SymbolId::new("AUSDT"), SymbolId::new("BUSDT")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_batch_settling_after_cancel_is_discarded() {
    let mock = Arc::new(MockExchange {
        candle_delay: Some(Duration::from_secs(1)),
        ..MockExchange::listing(&["AUSDT", "BUSDT", "CUSDT", "DUSDT"])
    });
    let mut handle = scanner(&mock).start_scan(config()).unwrap();

    // The first batch is in flight once discovery is announced
    match handle.next_event().await {
        Some(ScanEvent::Started { total, .. }) => assert_eq!(total, 4),
        other => panic!("expected Started, got {other:?}"),
    }
    handle.cancel();
    handle.cancel();

    let events = drain(&mut handle).await;
    assert!(progress_of(&events).is_empty());

    let report = handle.join().await.unwrap();
    assert_eq!(report.state, ScanState::Cancelled);
    assert_eq!(report.completed, 0);
    assert!(report.results.is_empty());
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_completion_is_noop() {
    let mock = Arc::new(MockExchange::listing(&["AUSDT"]));
    let handle = scanner(&mock).start_scan(config()).unwrap();
    let cancel = handle.cancel_handle();

    let report = handle.join().await.unwrap();
    cancel.cancel();

    assert!(cancel.is_cancelled());
    assert_eq!(report.state, ScanState::Completed);
    assert_eq!(report.results.len(), 1);
}

// ============================================================================
// Entry points
// ============================================================================

#[tokio::test]
async fn test_invalid_requests_are_rejected_up_front() {
    let mock = Arc::new(MockExchange::listing(&["AUSDT"]));
    let scanner = scanner(&mock);

    let bad = config().with_signal(0, 0.12, 0.25);
    assert!(matches!(
        scanner.start_scan(bad),
        Err(ScanError::InvalidConfig(_))
    ));

    let elsewhere = ScanConfig::new(ExchangeId::Okx);
    assert!(matches!(
        scanner.start_scan(elsewhere),
        Err(ScanError::UnknownExchange(ExchangeId::Okx))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_run_in_place() {
    let mock = Arc::new(MockExchange::listing(&["AUSDT", "BUSDT", "CUSDT"]));
    let cancel = CancelHandle::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = scanner(&mock).run(config(), &cancel, tx).await.unwrap();
    assert_eq!(report.results.len(), 3);

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ScanEvent::Progress(p) = event {
            progress.push(p.completed);
        }
    }
    assert_eq!(progress, vec![2, 3]);
}
