//! V-RSI Ports
//!
//! Port definitions (traits) for the V-RSI scanner.
//! These define the boundary between the scanning logic and the exchange
//! infrastructure.

mod adapter;
mod error;
mod stream;

pub use adapter::ExchangeAdapter;
pub use error::{AdapterError, AdapterResult};
pub use stream::{ConnectionSpec, Keepalive};
