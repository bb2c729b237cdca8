mod exchange;
mod interval;
mod kind;

pub use exchange::ExchangeId;
pub use interval::Interval;
pub use kind::Market;

use thiserror::Error;

/// Failure to parse one of the market enums from its textual token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Unsupported interval: {0}")]
    UnknownInterval(String),
}
