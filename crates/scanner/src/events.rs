use std::sync::Arc;

use vrsi_core::{ExchangeId, Market, ScanResult};

use crate::{ScanProgress, ScanReport};

/// Notifications published by a running scan, in order
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Discovery finished; the universe is fixed from here on
    Started {
        exchange: ExchangeId,
        market: Market,
        total: usize,
    },
    /// Results of one settled batch, in completion order
    BatchResults(Vec<ScanResult>),
    /// Emitted after each batch is merged
    Progress(ScanProgress),
    /// Discovery yielded nothing to scan
    EmptyUniverse { exchange: ExchangeId, market: Market },
    /// Scan stopped on request; partial results are in the report
    Cancelled(Arc<ScanReport>),
    /// Every batch ran; the full mapping is in the report
    Completed(Arc<ScanReport>),
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanEvent::EmptyUniverse { .. } | ScanEvent::Cancelled(_) | ScanEvent::Completed(_)
        )
    }
}
