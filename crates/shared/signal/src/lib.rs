//! V-RSI Signal Engine
//!
//! Pure functions that turn a candle series into a directional reading:
//!
//! ```text
//!   candles ──► volume_weighted_index ──► normalize ──► classify
//!                 [0, 100]                  (-1, 1)      LONG / SHORT / NEUTRAL
//! ```
//!
//! No async, no I/O. Price arithmetic stays in `Decimal`; the index and the
//! normalized signal are reported as `f64`.

mod calculations;
mod params;

pub use calculations::{
    IndexPoint, NEUTRAL_INDEX, classify, index_series, normalize, percent_change,
    volume_weighted_index,
};
pub use params::{SignalParams, SignalReading};
