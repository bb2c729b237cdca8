use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Supported venues
///
/// Each variant maps to exactly one adapter implementation; nothing in the
/// scanner branches on exchange names as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Bybit,
    Okx,
    Mexc,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 4] = [
        ExchangeId::Binance,
        ExchangeId::Bybit,
        ExchangeId::Okx,
        ExchangeId::Mexc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bybit => "bybit",
            ExchangeId::Okx => "okx",
            ExchangeId::Mexc => "mexc",
        }
    }

    /// Discount applied to current open interest to approximate the prior value.
    ///
    /// None of the venues expose historical OI through the endpoints used here,
    /// so the previous reading is estimated with a fixed per-venue factor.
    pub fn open_interest_discount(&self) -> Decimal {
        match self {
            ExchangeId::Binance => Decimal::new(95, 2),
            ExchangeId::Bybit => Decimal::new(93, 2),
            ExchangeId::Okx => Decimal::new(94, 2),
            ExchangeId::Mexc => Decimal::new(92, 2),
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(ExchangeId::Binance),
            "bybit" => Ok(ExchangeId::Bybit),
            "okx" => Ok(ExchangeId::Okx),
            "mexc" => Ok(ExchangeId::Mexc),
            other => Err(ParseError::UnknownExchange(other.to_string())),
        }
    }
}
