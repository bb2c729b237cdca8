//! Scan orchestration
//!
//! ```text
//!   ScanConfig ──► Scanner::start_scan ──► ScanHandle
//!                        │                   │  next_event / cancel / join
//!                        ▼                   │
//!                   discovery                │
//!                        │                   │
//!          ┌─────────────┼─────────────┐     │
//!          ▼             ▼             ▼     │
//!       batch 1  ──►  batch 2  ──►  batch N  │   units run concurrently
//!          │             │             │     │   inside a batch only
//!          └──────► coordinator ◄──────┘     │
//!                   (ScanSession) ───────────┘   ScanEvent stream
//! ```
//!
//! The coordinator is the only writer of scan state. Units hand their
//! outcomes back to it and never touch shared state themselves.

mod config;
mod error;
mod events;
mod orchestrator;
mod session;

pub use config::{ScanConfig, SymbolSelection};
pub use error::ScanError;
pub use events::ScanEvent;
pub use orchestrator::{CancelHandle, ScanHandle, Scanner};
pub use session::{DecisionStats, FailureCounts, ScanProgress, ScanReport, ScanState};
