use serde::{Deserialize, Serialize};
use vrsi_core::{Candle, Decision};

use crate::calculations::{classify, normalize, volume_weighted_index};

/// Tunables of the signal pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    /// Number of close-to-close moves in the index window
    pub period: usize,
    /// Slope of the logistic normalization
    pub steepness: f64,
    /// |signal| above which a direction is called
    pub threshold: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            period: 14,
            steepness: 0.12,
            threshold: 0.25,
        }
    }
}

impl SignalParams {
    pub fn new(period: usize, steepness: f64, threshold: f64) -> Self {
        Self {
            period,
            steepness,
            threshold,
        }
    }

    /// Smallest series `evaluate` can produce a reading for
    pub fn min_candles(&self) -> usize {
        self.period.saturating_add(1)
    }

    /// Run the full pipeline over a chronological series
    pub fn evaluate(&self, candles: &[Candle]) -> Option<SignalReading> {
        let raw_index = volume_weighted_index(candles, self.period)?;
        let normalized_signal = normalize(raw_index, self.steepness);
        Some(SignalReading {
            raw_index,
            normalized_signal,
            decision: classify(normalized_signal, self.threshold),
        })
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub raw_index: f64,
    pub normalized_signal: f64,
    pub decision: Decision,
}
