//! V-RSI Runner - command-line front end of the scanner
//!
//! - **Config**: one JSON file with a `gateway` and a `scan` section
//! - **CLI**: clap arguments layered over the file
//! - **App**: runs a scan with Ctrl-C cancellation and progress logging
//! - **Report**: ranked table, decision statistics, rolling index detail
//! - **Live**: optional real-time price overlay for the printed symbols
//!
//! ## Flow
//!
//! ```text
//!   vrsi_config.json ─┐
//!                     ├─► RunnerConfig ─► AdapterRegistry ─► Scanner
//!   command line ─────┘                                       │
//!                                                             ▼
//!                       stdout ◄── ResultTable / StatsLine ◄── ScanReport
//!                                                             │ --live
//!                                                             ▼
//!                       stdout ◄── LiveOverlay ◄── PriceBoard ◄── LiveStream
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod live;
pub mod logging;
pub mod report;

pub use app::execute_scan;
pub use cli::{Args, DecisionFilter, LogFormat};
pub use config::{
    RunnerConfig, RunnerConfigError, load_config, load_config_from_str, load_default_config,
};
pub use live::{LiveOverlay, PriceBoard, watch_prices};
pub use logging::init_logging;
pub use report::{IndexSeriesView, ResultTable, StatsLine};
