use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Traded volume over a candle interval
pub type Volume = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Quote asset every canonical symbol is denominated in
pub const QUOTE_ASSET: &str = "USDT";
