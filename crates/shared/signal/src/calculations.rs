//! Stateless V-RSI calculations

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use vrsi_core::{Candle, Decision, Price, Timestamp};

/// Index reported when there was no movement at all
pub const NEUTRAL_INDEX: f64 = 50.0;

/// Upper bound on |normalize(..)|, one epsilon step below 1
const SIGNAL_BOUND: f64 = 1.0 - f64::EPSILON;

/// Volume-weighted RSI over the last `period` close-to-close moves.
///
/// Each move is weighted by the volume of the candle it ends on:
///
/// gain = Σ Δclose·volume over Δclose > 0
/// loss = Σ |Δclose|·volume over Δclose < 0
/// index = 100 / (1 + loss / gain)
///
/// Returns `None` when fewer than `period + 1` candles are available or the
/// sums overflow. A window without movement (gain = loss = 0) reads 50; a
/// window with losses only reads 0.
pub fn volume_weighted_index(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() <= period {
        return None;
    }

    let window = &candles[candles.len() - period - 1..];
    let mut gain = Decimal::ZERO;
    let mut loss = Decimal::ZERO;

    for pair in window.windows(2) {
        let delta = pair[1].close.checked_sub(pair[0].close)?;
        let weighted = delta.abs().checked_mul(pair[1].volume)?;
        if delta.is_sign_positive() && !delta.is_zero() {
            gain = gain.checked_add(weighted)?;
        } else if delta.is_sign_negative() && !delta.is_zero() {
            loss = loss.checked_add(weighted)?;
        }
    }

    let total = gain.checked_add(loss)?;
    if total.is_zero() {
        return Some(NEUTRAL_INDEX);
    }
    if gain.is_zero() {
        return Some(0.0);
    }

    // 100 / (1 + loss/gain) == 100·gain / (gain + loss)
    let index = Decimal::ONE_HUNDRED.checked_mul(gain)?.checked_div(total)?;
    index.to_f64()
}

/// Map an index onto (-1, 1) with a logistic curve centred on 50.
///
/// 2 / (1 + e^(-a·x)) - 1 with x = index - 50 is evaluated as tanh(a·x / 2),
/// which is the same function but odd by construction. The result is
/// clamped so it never reaches ±1 even when the curve saturates in f64.
pub fn normalize(index: f64, steepness: f64) -> f64 {
    let x = steepness * (index - NEUTRAL_INDEX) / 2.0;
    if x.is_nan() {
        return 0.0;
    }
    x.tanh().clamp(-SIGNAL_BOUND, SIGNAL_BOUND)
}

/// Threshold classification; boundaries are exclusive so a signal exactly
/// at ±threshold stays neutral.
pub fn classify(signal: f64, threshold: f64) -> Decision {
    if signal > threshold {
        Decision::Long
    } else if signal < -threshold {
        Decision::Short
    } else {
        Decision::Neutral
    }
}

/// Percent change between the last two closes, rounded to two places.
///
/// Zero with fewer than two candles or a zero previous close.
pub fn percent_change(candles: &[Candle]) -> Price {
    let [.., prev, last] = candles else {
        return Decimal::ZERO;
    };
    if prev.close.is_zero() {
        return Decimal::ZERO;
    }
    ((last.close - prev.close) / prev.close * Decimal::ONE_HUNDRED).round_dp(2)
}

/// One point of a rolling index series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub open_time: Timestamp,
    pub close: Price,
    pub index: f64,
}

/// Rolling V-RSI for every candle that has a full window behind it.
///
/// Point `i` covers candles `i - period ..= i`; the series therefore starts
/// at candle `period`. Windows that cannot be evaluated read 50.
pub fn index_series(candles: &[Candle], period: usize) -> Vec<IndexPoint> {
    if period == 0 || candles.len() <= period {
        return Vec::new();
    }

    (period..candles.len())
        .map(|i| {
            let window = &candles[i - period..=i];
            IndexPoint {
                open_time: candles[i].open_time,
                close: candles[i].close,
                index: volume_weighted_index(window, period).unwrap_or(NEUTRAL_INDEX),
            }
        })
        .collect()
}
