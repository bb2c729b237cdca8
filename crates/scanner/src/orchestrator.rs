use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vrsi_core::{ExchangeId, FundingSnapshot, ScanResult, SymbolId};
use vrsi_ports::ExchangeAdapter;
use vrsi_signal::{SignalParams, percent_change};

use crate::session::ScanSession;
use crate::{ScanConfig, ScanError, ScanEvent, ScanReport, ScanState};

/// Runs scans against the adapters it was built with
#[derive(Clone, Default)]
pub struct Scanner {
    adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_adapters(adapters: impl IntoIterator<Item = Arc<dyn ExchangeAdapter>>) -> Self {
        adapters
            .into_iter()
            .fold(Self::new(), |scanner, adapter| scanner.with_adapter(adapter))
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        self.adapters.insert(adapter.exchange(), adapter);
        self
    }

    pub fn exchanges(&self) -> Vec<ExchangeId> {
        let mut ids: Vec<_> = self.adapters.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    pub fn adapter(&self, exchange: ExchangeId) -> Result<Arc<dyn ExchangeAdapter>, ScanError> {
        self.adapters
            .get(&exchange)
            .cloned()
            .ok_or(ScanError::UnknownExchange(exchange))
    }

    /// Spawn a scan on the current runtime
    ///
    /// Configuration problems are reported here; everything after discovery
    /// is reported through the handle.
    pub fn start_scan(&self, config: ScanConfig) -> Result<ScanHandle, ScanError> {
        config.validate()?;
        let adapter = self.adapter(config.exchange)?;

        let cancel = CancelHandle::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_scan(adapter, config, cancel.subscribe(), events_tx));

        Ok(ScanHandle {
            cancel,
            events: events_rx,
            task,
        })
    }

    /// Run a scan to completion on the caller's task
    pub async fn run(
        &self,
        config: ScanConfig,
        cancel: &CancelHandle,
        events: mpsc::UnboundedSender<ScanEvent>,
    ) -> Result<ScanReport, ScanError> {
        config.validate()?;
        let adapter = self.adapter(config.exchange)?;
        into_outcome(run_scan(adapter, config, cancel.subscribe(), events).await)
    }
}

/// Cooperative cancellation flag shared with a running scan
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        CancelHandle(Arc::new(tx))
    }

    /// Request cancellation. Repeated calls and calls after the scan
    /// finished have no effect.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a spawned scan
///
/// Dropping it detaches the scan, which then runs to completion unobserved.
pub struct ScanHandle {
    cancel: CancelHandle,
    events: mpsc::UnboundedReceiver<ScanEvent>,
    task: JoinHandle<ScanReport>,
}

impl ScanHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Next event; `None` once the scan finished and its events were drained
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scan to finish
    pub async fn join(self) -> Result<ScanReport, ScanError> {
        let report = self
            .task
            .await
            .map_err(|e| ScanError::Task(e.to_string()))?;
        into_outcome(report)
    }
}

fn into_outcome(report: ScanReport) -> Result<ScanReport, ScanError> {
    if report.is_empty_universe() {
        return Err(ScanError::EmptyUniverse {
            exchange: report.exchange,
            market: report.market,
        });
    }
    Ok(report)
}

/// What one unit hands back to the coordinator
struct UnitOutput {
    result: ScanResult,
    funding_failed: bool,
}

enum UnitFailure {
    Cancelled,
    CandleFetch,
    InsufficientData,
}

type UnitOutcome = Result<UnitOutput, UnitFailure>;

/// Coordinator loop; the only writer of the session
async fn run_scan(
    adapter: Arc<dyn ExchangeAdapter>,
    config: ScanConfig,
    mut cancel: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<ScanEvent>,
) -> ScanReport {
    let exchange = adapter.exchange();
    let market = config.market;
    let mut session = ScanSession::new(exchange, market, config.interval);

    session.set_state(ScanState::Discovering);
    let universe = discover(adapter.as_ref(), &config).await;

    if universe.is_empty() {
        warn!(exchange = %exchange, market = %market, "Nothing to scan");
        session.set_state(ScanState::Completed);
        publish(&events, ScanEvent::EmptyUniverse { exchange, market });
        return session.into_report();
    }

    session.begin(universe);
    let total = session.universe().len();
    info!(
        exchange = %exchange,
        market = %market,
        interval = %config.interval,
        symbols = total,
        batch_size = config.batch_size,
        "Scan started"
    );
    publish(
        &events,
        ScanEvent::Started {
            exchange,
            market,
            total,
        },
    );

    let params = config.signal_params();
    let batches: Vec<Vec<SymbolId>> = session
        .universe()
        .chunks(config.batch_size)
        .map(<[SymbolId]>::to_vec)
        .collect();
    let batch_count = batches.len();

    for (index, batch) in batches.into_iter().enumerate() {
        if *cancel.borrow() {
            return finish_cancelled(session, &events);
        }

        let outcomes = run_batch(adapter.as_ref(), &batch, &config, &params, &cancel).await;

        if *cancel.borrow() {
            debug!(batch = index + 1, "Discarding batch settled after cancellation");
            return finish_cancelled(session, &events);
        }

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(output) => {
                    if output.funding_failed {
                        session.failures_mut().funding_fetch += 1;
                    }
                    results.push(output.result);
                }
                Err(UnitFailure::CandleFetch) => session.failures_mut().candle_fetch += 1,
                Err(UnitFailure::InsufficientData) => {
                    session.failures_mut().insufficient_data += 1
                }
                Err(UnitFailure::Cancelled) => {}
            }
        }

        let progress = session.commit_batch(batch.len(), &results);
        debug!(
            batch = index + 1,
            batches = batch_count,
            completed = progress.completed,
            total = progress.total,
            results = results.len(),
            "Batch merged"
        );
        publish(&events, ScanEvent::BatchResults(results));
        publish(&events, ScanEvent::Progress(progress));

        let delay = config.inter_batch_delay();
        if index + 1 < batch_count && !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled(&mut cancel) => {}
            }
        }
    }

    session.set_state(ScanState::Completed);
    let report = session.into_report();
    let stats = report.stats();
    info!(
        exchange = %exchange,
        market = %market,
        results = stats.total,
        long = stats.long,
        short = stats.short,
        neutral = stats.neutral,
        candle_failures = report.failures.candle_fetch,
        insufficient = report.failures.insufficient_data,
        funding_failures = report.failures.funding_fetch,
        "Scan completed"
    );
    publish(&events, ScanEvent::Completed(Arc::new(report.clone())));
    report
}

fn finish_cancelled(mut session: ScanSession, events: &mpsc::UnboundedSender<ScanEvent>) -> ScanReport {
    session.set_state(ScanState::Cancelled);
    let report = session.into_report();
    info!(
        completed = report.completed,
        total = report.universe.len(),
        "Scan cancelled"
    );
    publish(events, ScanEvent::Cancelled(Arc::new(report.clone())));
    report
}

/// Resolve the universe; a failed discovery is an empty one
async fn discover(adapter: &dyn ExchangeAdapter, config: &ScanConfig) -> Vec<SymbolId> {
    if let Some(provided) = config.selection.provided() {
        let mut seen = Vec::with_capacity(provided.len());
        for symbol in provided {
            if !seen.contains(symbol) {
                seen.push(symbol.clone());
            }
        }
        return seen;
    }

    match adapter.list_usdt_symbols(config.market).await {
        Ok(symbols) => symbols,
        Err(e) => {
            warn!(error = %e, "Symbol discovery failed");
            Vec::new()
        }
    }
}

/// Run every unit of a batch concurrently, collecting in completion order
async fn run_batch(
    adapter: &dyn ExchangeAdapter,
    batch: &[SymbolId],
    config: &ScanConfig,
    params: &SignalParams,
    cancel: &watch::Receiver<bool>,
) -> Vec<UnitOutcome> {
    batch
        .iter()
        .map(|symbol| evaluate_symbol(adapter, symbol, config, params, cancel))
        .collect::<FuturesUnordered<_>>()
        .collect()
        .await
}

async fn evaluate_symbol(
    adapter: &dyn ExchangeAdapter,
    symbol: &SymbolId,
    config: &ScanConfig,
    params: &SignalParams,
    cancel: &watch::Receiver<bool>,
) -> UnitOutcome {
    if *cancel.borrow() {
        return Err(UnitFailure::Cancelled);
    }

    let candles = adapter
        .fetch_candles(symbol, config.interval, config.candle_count(), config.market)
        .await
        .map_err(|e| {
            warn!(symbol = %symbol, error = %e, "Candle fetch failed");
            UnitFailure::CandleFetch
        })?;

    let (Some(reading), Some(last)) = (params.evaluate(&candles), candles.last()) else {
        debug!(
            symbol = %symbol,
            candles = candles.len(),
            needed = params.min_candles(),
            "Not enough candles"
        );
        return Err(UnitFailure::InsufficientData);
    };
    let last_price = last.close;
    let change = percent_change(&candles);

    let mut funding_failed = false;
    let funding = if config.wants_funding() {
        match adapter.fetch_funding(symbol, config.market).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Funding fetch failed, using zero snapshot");
                funding_failed = true;
                Some(FundingSnapshot::zero())
            }
        }
    } else {
        None
    };

    Ok(UnitOutput {
        result: ScanResult {
            symbol: symbol.clone(),
            raw_index: reading.raw_index,
            normalized_signal: reading.normalized_signal,
            last_price,
            percent_change: change,
            decision: reading.decision,
            candles,
            funding,
        },
        funding_failed,
    })
}

/// Resolves once cancellation is requested; never if every handle is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|flag| *flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn publish(events: &mpsc::UnboundedSender<ScanEvent>, event: ScanEvent) {
    // A caller that stopped listening does not stop the scan.
    let _ = events.send(event);
}
