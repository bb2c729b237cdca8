//! HTTP transport
//!
//! Every REST call an adapter makes goes through a [`RestClient`]. The client
//! either calls the venue directly or wraps the upstream URL for the
//! forwarding relay; the adapter code is the same either way.
//!
//! ```text
//!   Adapter ──► RestClient ──┬──► https://venue/path?query            (Direct)
//!                            └──► {relay}/api/proxy?url=<encoded>     (Relay)
//! ```

pub mod http;

pub use http::{RestClient, Route, build_http_client};
