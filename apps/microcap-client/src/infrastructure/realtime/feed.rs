//! Realtime Quote Feed
//!
//! WebSocket client for the quote stream. The connection state machine is
//! `domain::realtime::QuoteStream`; this module owns the socket, the reader
//! and writer tasks, and the live price map.
//!
//! # Connection Flow
//!
//! 1. `connect()` fetches an ephemeral token from the API. No token, no socket.
//! 2. The socket opens and the auth frame is queued first.
//! 3. `auth_success` moves the feed to connected and replays every tracked
//!    ticker in one batched subscribe frame.
//! 4. Any receive error, close frame or `auth_failed` moves the feed to
//!    failed. Reconnecting is the caller's decision.
//!
//! Each connection attempt carries a generation number. Callbacks from an
//! attempt that `disconnect()` or a newer `connect()` superseded are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::codec::{StreamMessage, decode_frame};
use crate::application::ports::RealtimeTokenProvider;
use crate::domain::realtime::{ConnectionStatus, ControlFrame, QuoteStream};
use crate::error::ApiError;
use crate::infrastructure::config::RealtimeConfig;
use crate::infrastructure::metrics;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

// =============================================================================
// Events and Errors
// =============================================================================

/// Change published by the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Connection status moved.
    StatusChanged(ConnectionStatus),
    /// A quote updated the price map.
    PriceUpdated {
        /// Ticker symbol.
        ticker: String,
        /// New price.
        price: f64,
    },
}

/// Realtime feed errors.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// The API would not issue a stream token.
    #[error("realtime token unavailable: {0}")]
    TokenUnavailable(#[source] ApiError),

    /// The socket could not be opened.
    #[error("connection failed: {0}")]
    Connect(String),

    /// A control frame could not be encoded.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// Feed State
// =============================================================================

struct Connection {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct FeedState {
    stream: QuoteStream,
    connection: Option<Connection>,
    ephemeral_token: Option<String>,
    generation: u64,
}

struct FeedInner {
    url: String,
    tokens: Arc<dyn RealtimeTokenProvider>,
    state: Mutex<FeedState>,
    prices: RwLock<HashMap<String, f64>>,
    events: broadcast::Sender<FeedEvent>,
}

/// Streaming quote client.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct RealtimeFeed {
    inner: Arc<FeedInner>,
}

impl RealtimeFeed {
    /// Create a disconnected feed.
    #[must_use]
    pub fn new(
        config: &RealtimeConfig,
        tokens: Arc<dyn RealtimeTokenProvider>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(FeedInner {
                url: config.url.clone(),
                tokens,
                state: Mutex::new(FeedState::default()),
                prices: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Open the stream.
    ///
    /// Does nothing unless the feed is disconnected or failed. Returns once
    /// the socket is open and the auth frame is queued; `Connected` follows
    /// when the server accepts it.
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        let generation = {
            let mut state = self.inner.state.lock();
            if !state.stream.begin_connect() {
                tracing::debug!(
                    status = state.stream.status().as_str(),
                    "Connect ignored, feed already active"
                );
                return Ok(());
            }
            state.generation += 1;
            state.generation
        };
        self.inner.emit_status(ConnectionStatus::Connecting);

        let token = match self.inner.tokens.fetch_realtime_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to obtain realtime token");
                self.inner.fail(generation);
                return Err(RealtimeError::TokenUnavailable(e));
            }
        };

        if !self.inner.is_current(generation) {
            tracing::debug!("Connect superseded while fetching token");
            return Ok(());
        }

        let auth = match ControlFrame::auth(&token).to_json() {
            Ok(auth) => auth,
            Err(e) => {
                self.inner.fail(generation);
                return Err(e.into());
            }
        };

        tracing::info!(url = %self.inner.url, "Connecting to quote stream");
        let ws = match tokio_tungstenite::connect_async(self.inner.url.as_str()).await {
            Ok((ws, _response)) => ws,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open quote stream");
                self.inner.fail(generation);
                return Err(RealtimeError::Connect(e.to_string()));
            }
        };

        let (write, read) = ws.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                tracing::debug!("Connect superseded while opening socket");
                return Ok(());
            }
            // The receiver is alive until the writer task starts below.
            let _ = outbound.send(auth);
            state.ephemeral_token = Some(token);
            state.connection = Some(Connection {
                outbound,
                cancel: cancel.clone(),
            });
        }

        tokio::spawn(Arc::clone(&self.inner).write_loop(
            write,
            outbound_rx,
            generation,
            cancel.clone(),
        ));
        tokio::spawn(Arc::clone(&self.inner).read_loop(read, generation, cancel));
        Ok(())
    }

    /// Track tickers and subscribe to any new ones if connected.
    ///
    /// While not connected the tickers are only recorded; they are sent on
    /// the next successful authentication.
    pub fn subscribe<S: AsRef<str>>(&self, tickers: &[S]) {
        let mut state = self.inner.state.lock();
        let fresh = state.stream.subscribe(tickers);
        if fresh.is_empty() {
            return;
        }

        tracing::debug!(tickers = ?fresh, "Subscribing to quotes");
        if let Some(connection) = &state.connection {
            send_frame(connection, &ControlFrame::subscribe(&fresh));
        }
    }

    /// Close the stream and forget every tracked ticker.
    ///
    /// Safe to call in any state, any number of times.
    pub fn disconnect(&self) {
        let (previous, connection) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            let previous = state.stream.status();
            state.stream.disconnect();
            state.ephemeral_token = None;
            (previous, state.connection.take())
        };

        if let Some(connection) = connection {
            connection.cancel.cancel();
        }
        if previous != ConnectionStatus::Disconnected {
            tracing::info!("Quote stream disconnected");
            self.inner.emit_status(ConnectionStatus::Disconnected);
        }
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.inner.state.lock().stream.status()
    }

    /// Tickers that are, or will be, subscribed.
    #[must_use]
    pub fn tracked_symbols(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .stream
            .tracked()
            .iter()
            .cloned()
            .collect()
    }

    /// Whether an ephemeral stream token is held.
    #[must_use]
    pub fn has_stream_token(&self) -> bool {
        self.inner.state.lock().ephemeral_token.is_some()
    }

    /// Last price received for `ticker`.
    #[must_use]
    pub fn last_price(&self, ticker: &str) -> Option<f64> {
        self.inner.prices.read().get(ticker).copied()
    }

    /// Copy of the whole price map.
    #[must_use]
    pub fn prices(&self) -> HashMap<String, f64> {
        self.inner.prices.read().clone()
    }

    /// Observe status changes and price updates.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<FeedEvent> {
        self.inner.events.subscribe()
    }
}

impl std::fmt::Debug for RealtimeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RealtimeFeed")
            .field("url", &self.inner.url)
            .field("status", &state.stream.status())
            .field("tracked", state.stream.tracked())
            .field("ephemeral_token", &state.ephemeral_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Connection Tasks
// =============================================================================

impl FeedInner {
    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    /// Whether `generation` is still the live attempt and has not failed.
    fn accepts_events(&self, generation: u64) -> bool {
        let state = self.state.lock();
        state.generation == generation && state.stream.status() != ConnectionStatus::Failed
    }

    fn emit_status(&self, status: ConnectionStatus) {
        metrics::record_feed_status(status);
        let _ = self.events.send(FeedEvent::StatusChanged(status));
    }

    /// Move the given attempt to failed and tear down its connection.
    fn fail(&self, generation: u64) {
        let changed = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            let changed = state.stream.fail();
            if let Some(connection) = state.connection.take() {
                connection.cancel.cancel();
            }
            state.ephemeral_token = None;
            changed
        };

        if changed {
            tracing::warn!("Quote stream failed");
            self.emit_status(ConnectionStatus::Failed);
        }
    }

    fn handle_text(&self, text: &str, generation: u64) {
        if !self.is_current(generation) {
            return;
        }

        let messages = match decode_frame(text) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode stream frame");
                return;
            }
        };

        for message in messages {
            // An earlier event in this batch may have failed the attempt.
            if !self.accepts_events(generation) {
                return;
            }
            metrics::record_realtime_frame(message.kind());
            match message {
                StreamMessage::AuthSuccess => self.on_auth_success(generation),
                StreamMessage::AuthFailed => {
                    tracing::error!("Quote stream rejected authentication");
                    self.fail(generation);
                }
                StreamMessage::Status(status) => {
                    tracing::debug!(status = %status, "Stream status");
                }
                StreamMessage::Quote { ticker, price } => self.apply_quote(ticker, price),
                StreamMessage::Ignored => {
                    tracing::trace!("Ignoring unhandled stream event");
                }
            }
        }
    }

    fn on_auth_success(&self, generation: u64) {
        let replayed = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            let Some(replay) = state.stream.on_auth_success() else {
                return;
            };
            if !replay.is_empty()
                && let Some(connection) = &state.connection
            {
                send_frame(connection, &ControlFrame::subscribe(&replay));
            }
            replay.len()
        };

        tracing::info!(replayed, "Quote stream authenticated");
        self.emit_status(ConnectionStatus::Connected);
    }

    fn apply_quote(&self, ticker: String, price: f64) {
        self.prices.write().insert(ticker.clone(), price);
        metrics::record_quote_update();
        let _ = self.events.send(FeedEvent::PriceUpdated { ticker, price });
    }

    async fn write_loop(
        self: Arc<Self>,
        mut write: WsWrite,
        mut outbound: mpsc::UnboundedReceiver<String>,
        generation: u64,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let _ = write.close().await;
                    return;
                }
                frame = outbound.recv() => {
                    let Some(frame) = frame else {
                        return;
                    };
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        tracing::warn!(error = %e, "Failed to write to quote stream");
                        self.fail(generation);
                        return;
                    }
                }
            }
        }
    }

    async fn read_loop(self: Arc<Self>, mut read: WsRead, generation: u64, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text, generation),
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Server sent close frame");
                        self.fail(generation);
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Quote stream receive error");
                        self.fail(generation);
                        return;
                    }
                    None => {
                        tracing::info!("Quote stream ended");
                        self.fail(generation);
                        return;
                    }
                },
            }
        }
    }
}

fn send_frame(connection: &Connection, frame: &ControlFrame) {
    match frame.to_json() {
        Ok(json) => {
            if connection.outbound.send(json).is_err() {
                tracing::debug!(action = frame.action(), "Writer gone, frame dropped");
            }
        }
        Err(e) => tracing::warn!(action = frame.action(), error = %e, "Failed to encode frame"),
    }
}
