use std::collections::HashMap;

use serde::Serialize;
use vrsi_core::{Decision, ExchangeId, Interval, Market, ScanResult, SymbolId};

/// Lifecycle of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Discovering,
    Scanning,
    Completed,
    Cancelled,
}

impl ScanState {
    pub fn is_finished(&self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Cancelled)
    }
}

/// Per-symbol failures absorbed during a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub candle_fetch: usize,
    pub insufficient_data: usize,
    /// Funding failures do not drop the symbol; its snapshot is zeroed
    pub funding_fetch: usize,
}

impl FailureCounts {
    /// Symbols that produced no result
    pub fn dropped(&self) -> usize {
        self.candle_fetch + self.insufficient_data
    }
}

/// Batch progress; `completed` never decreases within a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
}

impl ScanProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total).min(100) as u8
    }
}

/// Working state of a scan, owned by the coordinator loop
#[derive(Debug)]
pub(crate) struct ScanSession {
    exchange: ExchangeId,
    market: Market,
    interval: Interval,
    state: ScanState,
    universe: Vec<SymbolId>,
    completed: usize,
    results: HashMap<SymbolId, ScanResult>,
    failures: FailureCounts,
}

impl ScanSession {
    pub(crate) fn new(exchange: ExchangeId, market: Market, interval: Interval) -> Self {
        ScanSession {
            exchange,
            market,
            interval,
            state: ScanState::Idle,
            universe: Vec::new(),
            completed: 0,
            results: HashMap::new(),
            failures: FailureCounts::default(),
        }
    }

    pub(crate) fn set_state(&mut self, state: ScanState) {
        self.state = state;
    }

    pub(crate) fn begin(&mut self, universe: Vec<SymbolId>) {
        self.universe = universe;
        self.completed = 0;
        self.results.clear();
        self.state = ScanState::Scanning;
    }

    pub(crate) fn universe(&self) -> &[SymbolId] {
        &self.universe
    }

    pub(crate) fn failures_mut(&mut self) -> &mut FailureCounts {
        &mut self.failures
    }

    /// Merge a settled batch and advance progress
    pub(crate) fn commit_batch(&mut self, size: usize, results: &[ScanResult]) -> ScanProgress {
        for result in results {
            self.results.insert(result.symbol.clone(), result.clone());
        }
        self.completed = (self.completed + size).min(self.universe.len());
        self.progress()
    }

    pub(crate) fn progress(&self) -> ScanProgress {
        ScanProgress {
            completed: self.completed,
            total: self.universe.len(),
        }
    }

    pub(crate) fn into_report(self) -> ScanReport {
        ScanReport {
            exchange: self.exchange,
            market: self.market,
            interval: self.interval,
            state: self.state,
            universe: self.universe,
            completed: self.completed,
            results: self.results,
            failures: self.failures,
        }
    }
}

/// Final outcome of a scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub exchange: ExchangeId,
    pub market: Market,
    pub interval: Interval,
    pub state: ScanState,
    pub universe: Vec<SymbolId>,
    pub completed: usize,
    pub results: HashMap<SymbolId, ScanResult>,
    pub failures: FailureCounts,
}

impl ScanReport {
    pub fn is_cancelled(&self) -> bool {
        self.state == ScanState::Cancelled
    }

    /// Nothing was there to scan
    pub fn is_empty_universe(&self) -> bool {
        self.universe.is_empty()
    }

    pub fn progress(&self) -> ScanProgress {
        ScanProgress {
            completed: self.completed,
            total: self.universe.len(),
        }
    }

    /// Results ordered by signal strength, strongest first
    ///
    /// Ties keep a stable order by symbol.
    pub fn ranked(&self) -> Vec<&ScanResult> {
        let mut ranked: Vec<&ScanResult> = self.results.values().collect();
        ranked.sort_by(|a, b| {
            b.strength()
                .total_cmp(&a.strength())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        ranked
    }

    /// Ranked results restricted to one decision
    pub fn filter(&self, decision: Decision) -> Vec<&ScanResult> {
        self.ranked()
            .into_iter()
            .filter(|r| r.decision == decision)
            .collect()
    }

    pub fn stats(&self) -> DecisionStats {
        self.results
            .values()
            .fold(DecisionStats::default(), |mut stats, r| {
                stats.total += 1;
                match r.decision {
                    Decision::Long => stats.long += 1,
                    Decision::Short => stats.short += 1,
                    Decision::Neutral => stats.neutral += 1,
                }
                stats
            })
    }
}

/// Decision tallies over a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    pub total: usize,
    pub long: usize,
    pub short: usize,
    pub neutral: usize,
}
