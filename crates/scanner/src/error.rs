use thiserror::Error;
use vrsi_core::{ExchangeId, Market};

/// Scan-level failures
///
/// Per-symbol problems never show up here; they are counted in
/// [`FailureCounts`](crate::FailureCounts) and the scan carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("No symbols to scan on {exchange} {market}")]
    EmptyUniverse { exchange: ExchangeId, market: Market },

    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),

    #[error("No adapter registered for {0}")]
    UnknownExchange(ExchangeId),

    #[error("Scan task failed: {0}")]
    Task(String),
}
