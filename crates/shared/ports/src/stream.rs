use std::time::Duration;

/// Everything needed to open a streaming connection, without opening it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    /// Target WebSocket URL
    pub url: String,
    /// Text frames sent right after the connection opens
    pub subscribe_messages: Vec<String>,
    /// Application-level ping required by the venue, if any
    pub keepalive: Option<Keepalive>,
}

impl ConnectionSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subscribe_messages: Vec::new(),
            keepalive: None,
        }
    }

    pub fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.subscribe_messages = messages;
        self
    }

    pub fn with_keepalive(mut self, interval: Duration, payload: impl Into<String>) -> Self {
        self.keepalive = Some(Keepalive {
            interval,
            payload: payload.into(),
        });
        self
    }
}

/// Periodic text ping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keepalive {
    pub interval: Duration,
    pub payload: String,
}
