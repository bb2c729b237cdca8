//! Live ticker streams
//!
//! ```text
//!   ExchangeAdapter::build_stream_subscription ─► ConnectionSpec
//!                                                      │
//!                         ┌────────────────────────────▼─────────────┐
//!                         │ stream task (one per subscription)       │
//!                         │  connect ─► send subscriptions ─► read   │
//!                         │     ▲                              │     │
//!                         │     └──── reconnect after delay ◄──┘     │
//!                         └──────────────┬───────────────────────────┘
//!                                        │ parse_stream_message
//!                                        ▼
//!                                  TickerSink::on_update
//! ```

mod live;

pub use live::{LiveStream, StreamHandle, StreamStatus, TickerSink};
