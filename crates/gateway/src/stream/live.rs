use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, interval_at};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use vrsi_core::{Market, SymbolId, TickerUpdate};
use vrsi_ports::{AdapterError, ConnectionSpec, ExchangeAdapter};

use crate::config::StreamConfig;
use crate::error::StreamError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Characters of a dropped frame kept in the log
const FRAME_EXCERPT: usize = 120;

/// Receiver of parsed ticker updates
///
/// Called from the stream task, once per parsed message, never after
/// [`StreamHandle::unsubscribe`] has returned.
pub trait TickerSink: Send + Sync + 'static {
    fn on_update(&self, update: TickerUpdate);
}

impl<F> TickerSink for F
where
    F: Fn(TickerUpdate) + Send + Sync + 'static,
{
    fn on_update(&self, update: TickerUpdate) {
        self(update)
    }
}

/// Connection state of a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    /// Stopped by the caller
    Closed,
    /// Gave up reconnecting
    Failed { reason: String },
}

impl StreamStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamStatus::Closed | StreamStatus::Failed { .. })
    }
}

/// Opens ticker subscriptions through an exchange adapter
#[derive(Debug, Clone, Default)]
pub struct LiveStream {
    config: StreamConfig,
}

impl LiveStream {
    pub fn new(config: StreamConfig) -> Self {
        LiveStream { config }
    }

    /// Start streaming prices for `symbols`; runs until unsubscribed or the
    /// reconnect budget is spent. Must be called within a tokio runtime.
    pub fn subscribe(
        &self,
        adapter: Arc<dyn ExchangeAdapter>,
        symbols: &[SymbolId],
        market: Market,
        sink: impl TickerSink,
    ) -> StreamHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(StreamStatus::Connecting);

        if symbols.is_empty() {
            tracing::debug!(exchange = %adapter.exchange(), "no symbols to stream");
            status_tx.send_replace(StreamStatus::Closed);
            return StreamHandle {
                shutdown: None,
                task: None,
                status: status_rx,
            };
        }

        let spec = adapter.build_stream_subscription(symbols, market);
        tracing::info!(
            exchange = %adapter.exchange(),
            %market,
            symbols = symbols.len(),
            url = %spec.url,
            "opening live stream"
        );

        let task = StreamTask {
            spec,
            adapter,
            sink: Box::new(sink),
            config: self.config.clone(),
            status: status_tx,
        };
        let task = tokio::spawn(task.run(shutdown_rx));

        StreamHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
            status: status_rx,
        }
    }
}

/// Owner-side handle of one subscription
pub struct StreamHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    status: watch::Receiver<StreamStatus>,
}

impl StreamHandle {
    /// Current connection state
    pub fn status(&self) -> StreamStatus {
        self.status.borrow().clone()
    }

    /// Receiver for status transitions
    pub fn watch_status(&self) -> watch::Receiver<StreamStatus> {
        self.status.clone()
    }

    /// Wait until the stream is closed or has failed
    pub async fn closed(&mut self) -> StreamStatus {
        let waited = self
            .status
            .wait_for(StreamStatus::is_terminal)
            .await
            .map(|status| status.clone());
        match waited {
            Ok(status) => status,
            Err(_) => self.status.borrow().clone(),
        }
    }

    /// Close the connection and wait for the stream task to finish
    pub async fn unsubscribe(mut self) -> Result<(), StreamError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| StreamError::Task(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// How a connected session ended
enum SessionEnd {
    Shutdown,
    Disconnected(String),
}

struct StreamTask {
    spec: ConnectionSpec,
    adapter: Arc<dyn ExchangeAdapter>,
    sink: Box<dyn TickerSink>,
    config: StreamConfig,
    status: watch::Sender<StreamStatus>,
}

impl StreamTask {
    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let exchange = self.adapter.exchange();
        let mut attempt: u32 = 0;

        loop {
            self.status.send_replace(if attempt == 0 {
                StreamStatus::Connecting
            } else {
                StreamStatus::Reconnecting { attempt }
            });

            let connected = tokio::select! {
                _ = &mut shutdown => {
                    self.status.send_replace(StreamStatus::Closed);
                    return;
                }
                result = connect(&self.spec.url, self.config.connect_timeout()) => result,
            };

            let reason = match connected {
                Ok(ws) => {
                    tracing::info!(%exchange, "live stream connected");
                    self.status.send_replace(StreamStatus::Connected);
                    attempt = 0;
                    match self.session(ws, &mut shutdown).await {
                        SessionEnd::Shutdown => {
                            tracing::info!(%exchange, "live stream closed");
                            self.status.send_replace(StreamStatus::Closed);
                            return;
                        }
                        SessionEnd::Disconnected(reason) => reason,
                    }
                }
                Err(e) => e.to_string(),
            };

            attempt += 1;
            if attempt > self.config.max_reconnect_attempts {
                let err = StreamError::ReconnectExhausted(self.config.max_reconnect_attempts);
                tracing::error!(%exchange, last_error = %reason, "{}", err);
                self.status.send_replace(StreamStatus::Failed {
                    reason: err.to_string(),
                });
                return;
            }

            tracing::warn!(
                %exchange,
                attempt,
                error = %reason,
                delay_ms = self.config.reconnect_delay_ms,
                "live stream disconnected, reconnecting"
            );
            tokio::select! {
                _ = &mut shutdown => {
                    self.status.send_replace(StreamStatus::Closed);
                    return;
                }
                _ = tokio::time::sleep(self.config.reconnect_delay()) => {}
            }
        }
    }

    async fn session(&self, ws: WsStream, shutdown: &mut oneshot::Receiver<()>) -> SessionEnd {
        let (mut write, mut read) = ws.split();

        for message in &self.spec.subscribe_messages {
            if let Err(e) = write.send(Message::Text(message.clone().into())).await {
                return SessionEnd::Disconnected(e.to_string());
            }
        }

        let mut keepalive = self
            .spec
            .keepalive
            .as_ref()
            .map(|k| (interval_at(Instant::now() + k.interval, k.interval), k.payload.clone()));

        loop {
            tokio::select! {
                _ = &mut *shutdown => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                payload = next_ping(&mut keepalive) => {
                    if let Err(e) = write.send(Message::Text(payload.into())).await {
                        return SessionEnd::Disconnected(e.to_string());
                    }
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                    Some(Ok(Message::Ping(data))) => {
                        tracing::trace!("Received ping: {:?}", data);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return SessionEnd::Disconnected(format!("closed by server: {:?}", frame));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Disconnected(e.to_string()),
                    None => return SessionEnd::Disconnected("stream ended".to_string()),
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match self.adapter.parse_stream_message(text) {
            Some(update) => self.sink.on_update(update),
            None => {
                let err = unparsed_frame(text);
                tracing::trace!(error = %err, "ignored stream frame");
            }
        }
    }
}

/// Error for a frame the adapter did not recognize, such as an ack or pong
fn unparsed_frame(text: &str) -> AdapterError {
    let mut excerpt: String = text.chars().take(FRAME_EXCERPT).collect();
    if excerpt.len() < text.len() {
        excerpt.push_str("...");
    }
    AdapterError::StreamParse(excerpt)
}

async fn connect(url: &str, timeout: Duration) -> Result<WsStream, StreamError> {
    match tokio::time::timeout(timeout, connect_async(url)).await {
        Ok(Ok((ws, _))) => Ok(ws),
        Ok(Err(e)) => Err(StreamError::Connection(e)),
        Err(_) => Err(StreamError::ConnectTimeout(timeout)),
    }
}

/// Wait for the next keepalive tick; never resolves without a keepalive
async fn next_ping(keepalive: &mut Option<(Interval, String)>) -> String {
    match keepalive {
        Some((interval, payload)) => {
            interval.tick().await;
            payload.clone()
        }
        None => std::future::pending().await,
    }
}
