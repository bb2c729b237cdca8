use serde::{Deserialize, Serialize};
use std::time::Duration;
use vrsi_core::{ExchangeId, Interval, Market, SymbolId};
use vrsi_signal::SignalParams;

use crate::ScanError;

/// Which symbols a scan covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "symbols", rename_all = "lowercase")]
pub enum SymbolSelection {
    /// Everything the exchange lists
    #[default]
    All,
    /// A caller-supplied list; discovery is skipped
    Explicit(Vec<SymbolId>),
    /// The caller's saved favorites; discovery is skipped
    Favorites(Vec<SymbolId>),
}

impl SymbolSelection {
    /// The caller-provided list, if any
    pub fn provided(&self) -> Option<&[SymbolId]> {
        match self {
            SymbolSelection::All => None,
            SymbolSelection::Explicit(list) | SymbolSelection::Favorites(list) => Some(list),
        }
    }
}

/// Parameters of one scan run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub exchange: ExchangeId,
    #[serde(default)]
    pub market: Market,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_period")]
    pub period: usize,
    #[serde(default = "default_steepness")]
    pub steepness: f64,
    /// |signal| above which LONG / SHORT is called
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub selection: SymbolSelection,
    /// Symbols evaluated concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Extra candles fetched on top of `period`
    #[serde(default = "default_candle_margin")]
    pub candle_margin: usize,
    /// Pause between batches in milliseconds
    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_ms: u64,
    /// Fetch funding / open interest on derivatives scans
    #[serde(default = "default_true")]
    pub include_funding: bool,
}

impl ScanConfig {
    pub fn new(exchange: ExchangeId) -> Self {
        ScanConfig {
            exchange,
            market: Market::default(),
            interval: Interval::default(),
            period: default_period(),
            steepness: default_steepness(),
            threshold: default_threshold(),
            selection: SymbolSelection::default(),
            batch_size: default_batch_size(),
            candle_margin: default_candle_margin(),
            inter_batch_delay_ms: default_inter_batch_delay(),
            include_funding: default_true(),
        }
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_signal(mut self, period: usize, steepness: f64, threshold: f64) -> Self {
        self.period = period;
        self.steepness = steepness;
        self.threshold = threshold;
        self
    }

    pub fn with_selection(mut self, selection: SymbolSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_batching(mut self, batch_size: usize, inter_batch_delay: Duration) -> Self {
        self.batch_size = batch_size;
        self.inter_batch_delay_ms = inter_batch_delay.as_millis() as u64;
        self
    }

    pub fn with_funding(mut self, include: bool) -> Self {
        self.include_funding = include;
        self
    }

    pub fn signal_params(&self) -> SignalParams {
        SignalParams::new(self.period, self.steepness, self.threshold)
    }

    /// Candles requested per symbol
    pub fn candle_count(&self) -> usize {
        self.period.saturating_add(self.candle_margin)
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn wants_funding(&self) -> bool {
        self.include_funding && self.market.is_derivatives()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.period == 0 {
            return Err(ScanError::InvalidConfig("period must be at least 1".into()));
        }
        if self.period.checked_add(self.candle_margin).is_none() {
            return Err(ScanError::InvalidConfig(format!(
                "period {} too large for a candle margin of {}",
                self.period, self.candle_margin
            )));
        }
        if !(self.steepness.is_finite() && self.steepness > 0.0) {
            return Err(ScanError::InvalidConfig("steepness must be positive".into()));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(ScanError::InvalidConfig("threshold must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ScanError::InvalidConfig("batch size must be at least 1".into()));
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_period() -> usize {
    14
}

fn default_steepness() -> f64 {
    0.12
}

fn default_threshold() -> f64 {
    0.25
}

fn default_batch_size() -> usize {
    6
}

fn default_candle_margin() -> usize {
    50
}

fn default_inter_batch_delay() -> u64 {
    200
}
