use thiserror::Error;
use vrsi_core::{ExchangeId, Market, SymbolId};

/// Domain-level errors raised by exchange adapters
///
/// Every variant is contained by the caller: a failed discovery becomes an
/// empty universe, a failed candle fetch drops one symbol, a failed funding
/// fetch falls back to the zero snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Symbol discovery failed on {exchange} {market}: {reason}")]
    Discovery {
        exchange: ExchangeId,
        market: Market,
        reason: String,
    },

    #[error("Candle fetch failed for {symbol}: {reason}")]
    CandleFetch { symbol: SymbolId, reason: String },

    #[error("Funding fetch failed for {symbol}: {reason}")]
    FundingFetch { symbol: SymbolId, reason: String },

    #[error("Malformed stream message: {0}")]
    StreamParse(String),
}

impl AdapterError {
    pub fn discovery(exchange: ExchangeId, market: Market, reason: impl ToString) -> Self {
        AdapterError::Discovery {
            exchange,
            market,
            reason: reason.to_string(),
        }
    }

    pub fn candle_fetch(symbol: &SymbolId, reason: impl ToString) -> Self {
        AdapterError::CandleFetch {
            symbol: symbol.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn funding_fetch(symbol: &SymbolId, reason: impl ToString) -> Self {
        AdapterError::FundingFetch {
            symbol: symbol.clone(),
            reason: reason.to_string(),
        }
    }
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
