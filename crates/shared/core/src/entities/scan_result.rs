use serde::{Deserialize, Serialize};

use super::{Candle, Decision, FundingSnapshot, SymbolId};
use crate::values::Price;

/// Outcome of evaluating one symbol during a scan
///
/// Built once by the unit that computed it and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: SymbolId,
    /// V-RSI in [0, 100]
    pub raw_index: f64,
    /// Signal in the open interval (-1, 1)
    pub normalized_signal: f64,
    pub last_price: Price,
    /// Change between the last two closes, in percent
    pub percent_change: Price,
    pub decision: Decision,
    /// Candles the reading was computed from, oldest first
    pub candles: Vec<Candle>,
    /// Present for derivatives scans with funding enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding: Option<FundingSnapshot>,
}

impl ScanResult {
    /// Strength of the signal irrespective of direction
    pub fn strength(&self) -> f64 {
        self.normalized_signal.abs()
    }
}
