//! Error types for the gateway crate

use thiserror::Error;

/// HTTP transport errors, direct or through the relay
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Relay error ({status}): {message}")]
    Relay { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

impl TransportError {
    pub fn shape(what: impl Into<String>) -> Self {
        TransportError::Shape(what.into())
    }
}

/// Streaming connection errors
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Connection error: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("Gave up after {0} reconnect attempts")]
    ReconnectExhausted(u32),

    #[error("Stream task failed: {0}")]
    Task(String),
}
