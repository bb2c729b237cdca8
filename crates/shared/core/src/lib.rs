//! V-RSI Core Domain
//!
//! Canonical market model shared by every scanner crate: symbols, candles,
//! funding snapshots, ticker updates and scan results.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod market;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Candle, Decision, FundingSnapshot, ScanResult, SymbolId, TickerUpdate, into_chronological,
    is_leveraged_base, parse_symbol_list,
};
pub use market::{ExchangeId, Interval, Market, ParseError};
pub use values::{Price, QUOTE_ASSET, Timestamp, Volume};
