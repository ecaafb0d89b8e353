//! Realtime Quote Stream State Machine
//!
//! Pure state for the streaming quote connection. Transport concerns live in
//! `infrastructure::realtime`; this module only decides what the connection
//! status is and which subscribe frames must go out.
//!
//! # States
//!
//! ```text
//!                 connect()                auth_success
//! Disconnected ─────────────► Connecting ──────────────► Connected
//!      ▲   ▲                     │   auth_failed /           │
//!      │   │ connect()           │   error                   │ error
//!      │   └──────────── Failed ◄┴───────────────────────────┘
//!      └──────────────────── disconnect() from any state
//! ```
//!
//! Tracked symbols survive failures so they can be replayed on the next
//! successful authentication. Only `disconnect()` forgets them.

use std::collections::BTreeSet;

use serde::Serialize;

// =============================================================================
// Connection Status
// =============================================================================

/// Status of the streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    /// No connection and none requested.
    #[default]
    Disconnected,
    /// Fetching the stream token, opening the socket, or awaiting auth.
    Connecting,
    /// Authenticated and receiving quotes.
    Connected,
    /// Token fetch, authentication or transport failed.
    Failed,
}

impl ConnectionStatus {
    /// Whether `connect()` may start a new attempt from this status.
    #[must_use]
    pub const fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }

    /// Whether the stream is authenticated.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Lowercase label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

// =============================================================================
// Outbound Frames
// =============================================================================

/// Quote channel prefix used in subscribe parameters.
pub const QUOTE_CHANNEL_PREFIX: &str = "Q.";

/// A control frame sent to the stream.
///
/// Serializes to `{"action":"auth","params":"<token>"}` or
/// `{"action":"subscribe","params":"Q.AAA,Q.BBB"}`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ControlFrame {
    action: &'static str,
    params: String,
}

impl ControlFrame {
    /// Authentication frame carrying the ephemeral stream token.
    #[must_use]
    pub fn auth(token: &str) -> Self {
        Self {
            action: "auth",
            params: token.to_string(),
        }
    }

    /// Batched quote subscription for the given tickers.
    #[must_use]
    pub fn subscribe<S: AsRef<str>>(tickers: &[S]) -> Self {
        let params = tickers
            .iter()
            .map(|t| format!("{QUOTE_CHANNEL_PREFIX}{}", t.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            action: "subscribe",
            params,
        }
    }

    /// Frame action name.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        self.action
    }

    /// Frame parameters.
    #[must_use]
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl std::fmt::Debug for ControlFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = if self.action == "auth" {
            "[REDACTED]"
        } else {
            self.params.as_str()
        };
        f.debug_struct("ControlFrame")
            .field("action", &self.action)
            .field("params", &params)
            .finish()
    }
}

// =============================================================================
// Quote Stream
// =============================================================================

/// Connection status plus the set of tickers the user asked for.
#[derive(Debug, Clone, Default)]
pub struct QuoteStream {
    status: ConnectionStatus,
    tracked: BTreeSet<String>,
}

impl QuoteStream {
    /// A disconnected stream with nothing tracked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Tickers that will be (re)subscribed on authentication.
    #[must_use]
    pub const fn tracked(&self) -> &BTreeSet<String> {
        &self.tracked
    }

    /// Start a connection attempt.
    ///
    /// Returns `false` (and changes nothing) unless the stream is
    /// disconnected or failed.
    pub const fn begin_connect(&mut self) -> bool {
        if !self.status.can_connect() {
            return false;
        }
        self.status = ConnectionStatus::Connecting;
        true
    }

    /// Mark the current attempt or connection as failed.
    ///
    /// Has no effect on a disconnected stream, so a late transport error
    /// cannot resurrect a stream the caller already closed.
    pub const fn fail(&mut self) -> bool {
        match self.status {
            ConnectionStatus::Connecting | ConnectionStatus::Connected => {
                self.status = ConnectionStatus::Failed;
                true
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Failed => false,
        }
    }

    /// Handle an `auth_success` status frame.
    ///
    /// When connecting, moves to connected and returns every tracked ticker
    /// for replay (possibly empty). Returns `None` in any other state.
    pub fn on_auth_success(&mut self) -> Option<Vec<String>> {
        if self.status != ConnectionStatus::Connecting {
            return None;
        }
        self.status = ConnectionStatus::Connected;
        Some(self.tracked.iter().cloned().collect())
    }

    /// Handle an `auth_failed` status frame.
    pub const fn on_auth_failed(&mut self) -> bool {
        self.fail()
    }

    /// Track new tickers.
    ///
    /// Already-tracked and empty tickers are skipped. Returns the tickers
    /// that must be sent now, which is only non-empty while connected;
    /// otherwise they wait for replay.
    pub fn subscribe<S: AsRef<str>>(&mut self, tickers: &[S]) -> Vec<String> {
        let mut fresh = Vec::new();
        for ticker in tickers {
            let ticker = ticker.as_ref().trim();
            if ticker.is_empty() {
                continue;
            }
            if self.tracked.insert(ticker.to_string()) {
                fresh.push(ticker.to_string());
            }
        }

        if self.status.is_connected() {
            fresh
        } else {
            Vec::new()
        }
    }

    /// Forget every tracked ticker and return to disconnected.
    pub fn disconnect(&mut self) {
        self.tracked.clear();
        self.status = ConnectionStatus::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_frame_shape() {
        let json = ControlFrame::auth("abc").to_json().unwrap();
        assert_eq!(json, r#"{"action":"auth","params":"abc"}"#);
    }

    #[test]
    fn subscribe_frame_shape() {
        let json = ControlFrame::subscribe(&["ACME", "XYZ"]).to_json().unwrap();
        assert_eq!(json, r#"{"action":"subscribe","params":"Q.ACME,Q.XYZ"}"#);
    }

    #[test]
    fn auth_frame_debug_redacts_token() {
        let debug = format!("{:?}", ControlFrame::auth("secret"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn connect_only_from_disconnected_or_failed() {
        let mut stream = QuoteStream::new();
        assert!(stream.begin_connect());
        assert!(!stream.begin_connect());

        stream.on_auth_success();
        assert!(!stream.begin_connect());

        stream.fail();
        assert!(stream.begin_connect());
    }

    #[test]
    fn subscribe_while_connecting_is_buffered() {
        let mut stream = QuoteStream::new();
        stream.begin_connect();

        let to_send = stream.subscribe(&["ACME"]);
        assert!(to_send.is_empty());
        assert!(stream.tracked().contains("ACME"));

        let replay = stream.on_auth_success().unwrap();
        assert_eq!(replay, vec!["ACME".to_string()]);
        assert_eq!(stream.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn subscribe_while_connected_sends_only_new_tickers() {
        let mut stream = QuoteStream::new();
        stream.begin_connect();
        stream.on_auth_success();

        assert_eq!(stream.subscribe(&["ACME", "XYZ"]), vec!["ACME", "XYZ"]);
        assert_eq!(stream.subscribe(&["ACME", "NEW", "NEW"]), vec!["NEW"]);
        assert!(stream.subscribe(&["ACME"]).is_empty());
    }

    #[test]
    fn tracked_symbols_survive_failure() {
        let mut stream = QuoteStream::new();
        stream.begin_connect();
        stream.on_auth_success();
        stream.subscribe(&["ACME"]);

        stream.fail();
        assert_eq!(stream.status(), ConnectionStatus::Failed);
        assert!(stream.tracked().contains("ACME"));

        stream.begin_connect();
        assert_eq!(stream.on_auth_success().unwrap(), vec!["ACME".to_string()]);
    }

    #[test]
    fn auth_success_outside_connecting_is_ignored() {
        let mut stream = QuoteStream::new();
        assert!(stream.on_auth_success().is_none());
        assert_eq!(stream.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn auth_failed_moves_to_failed() {
        let mut stream = QuoteStream::new();
        stream.begin_connect();
        assert!(stream.on_auth_failed());
        assert_eq!(stream.status(), ConnectionStatus::Failed);
    }

    #[test]
    fn late_failure_does_not_reopen_disconnected_stream() {
        let mut stream = QuoteStream::new();
        stream.begin_connect();
        stream.disconnect();
        assert!(!stream.fail());
        assert_eq!(stream.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut stream = QuoteStream::new();
        stream.begin_connect();
        stream.subscribe(&["ACME"]);

        for _ in 0..2 {
            stream.disconnect();
            assert_eq!(stream.status(), ConnectionStatus::Disconnected);
            assert!(stream.tracked().is_empty());
        }
    }
}
