//! Quote feed against a local WebSocket server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use microcap_client::{
    ApiClient, ApiConfig, ApiError, ConnectionStatus, FeedEvent, InMemoryVault, RealtimeConfig,
    RealtimeError, RealtimeFeed, RealtimeTokenProvider, SessionManager, TOKEN_ACCOUNT,
};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH_SUCCESS: &str = r#"[{"ev":"status","status":"auth_success","message":"authenticated"}]"#;
const AUTH_FAILED: &str = r#"[{"ev":"status","status":"auth_failed","message":"bad key"}]"#;

// =============================================================================
// Helpers
// =============================================================================

type ServerSocket = WebSocketStream<TcpStream>;

struct StaticToken(Option<&'static str>);

#[async_trait]
impl RealtimeTokenProvider for StaticToken {
    async fn fetch_realtime_token(&self) -> Result<String, ApiError> {
        self.0.map(str::to_string).ok_or(ApiError::Forbidden)
    }
}

async fn bind() -> (TcpListener, RealtimeConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, RealtimeConfig { url })
}

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

/// Next text frame from the client, or `None` once it closes.
async fn next_text(ws: &mut ServerSocket) -> Option<String> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Some(text.to_string()),
            Some(Ok(Message::Close(_)) | Err(_)) | None => return None,
            Some(Ok(_)) => {}
        }
    }
}

async fn send_text(ws: &mut ServerSocket, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

async fn wait_for_status(events: &mut broadcast::Receiver<FeedEvent>, expected: ConnectionStatus) {
    timeout(Duration::from_secs(5), async {
        loop {
            if let FeedEvent::StatusChanged(status) = events.recv().await.unwrap()
                && status == expected
            {
                return;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("feed never reached {expected:?}"));
}

async fn wait_for_price(events: &mut broadcast::Receiver<FeedEvent>, symbol: &str) -> f64 {
    timeout(Duration::from_secs(5), async {
        loop {
            if let FeedEvent::PriceUpdated { ticker, price } = events.recv().await.unwrap()
                && ticker == symbol
            {
                return price;
            }
        }
    })
    .await
    .unwrap()
}

async fn assert_silent(ws: &mut ServerSocket) {
    let frame = timeout(Duration::from_millis(150), next_text(ws)).await;
    assert!(frame.is_err(), "unexpected frame: {frame:?}");
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn subscribe_while_connecting_is_replayed_after_auth() {
    let backend = MockServer::start().await;
    Mock::given(path("/api/v1/config/realtime_token"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "rt-token"})))
        .expect(1)
        .mount(&backend)
        .await;

    let vault = Arc::new(InMemoryVault::with_entry(TOKEN_ACCOUNT, "tok"));
    let session = Arc::new(SessionManager::restore(vault, 16));
    let api = Arc::new(ApiClient::new(&ApiConfig::new(backend.uri()), session).unwrap());

    let (listener, config) = bind().await;
    let feed = RealtimeFeed::new(&config, api, 32);
    let mut events = feed.subscribe_events();

    let (connected, mut server) = tokio::join!(feed.connect(), accept(&listener));
    connected.unwrap();
    assert_eq!(feed.status(), ConnectionStatus::Connecting);
    assert!(feed.has_stream_token());
    assert_eq!(
        next_text(&mut server).await.unwrap(),
        r#"{"action":"auth","params":"rt-token"}"#
    );

    feed.subscribe(&["ACME"]);
    assert_silent(&mut server).await;

    send_text(&mut server, AUTH_SUCCESS).await;
    wait_for_status(&mut events, ConnectionStatus::Connected).await;
    assert_eq!(
        next_text(&mut server).await.unwrap(),
        r#"{"action":"subscribe","params":"Q.ACME"}"#
    );
    assert_silent(&mut server).await;

    // Only the ticker not yet tracked goes out.
    feed.subscribe(&["ACME", "XYZ"]);
    assert_eq!(
        next_text(&mut server).await.unwrap(),
        r#"{"action":"subscribe","params":"Q.XYZ"}"#
    );

    send_text(&mut server, r#"[{"ev":"Q","sym":"ACME","p":5.25}]"#).await;
    assert_eq!(wait_for_price(&mut events, "ACME").await, 5.25);
    assert_eq!(feed.last_price("ACME"), Some(5.25));

    feed.disconnect();
    feed.disconnect();
    assert_eq!(feed.status(), ConnectionStatus::Disconnected);
    assert!(feed.tracked_symbols().is_empty());
    assert!(!feed.has_stream_token());

    let closed = timeout(Duration::from_secs(2), next_text(&mut server))
        .await
        .unwrap();
    assert!(closed.is_none());
}

#[tokio::test]
async fn token_failure_fails_without_dialing() {
    let (listener, config) = bind().await;
    let feed = RealtimeFeed::new(&config, Arc::new(StaticToken(None)), 16);
    feed.subscribe(&["ACME"]);

    let (result, accepted) = tokio::join!(
        feed.connect(),
        timeout(Duration::from_millis(300), listener.accept())
    );

    assert!(matches!(
        result,
        Err(RealtimeError::TokenUnavailable(ApiError::Forbidden))
    ));
    assert!(accepted.is_err());
    assert_eq!(feed.status(), ConnectionStatus::Failed);
    assert!(!feed.has_stream_token());
    assert_eq!(feed.tracked_symbols(), vec!["ACME"]);
}

#[tokio::test]
async fn unreachable_endpoint_fails() {
    let config = RealtimeConfig {
        url: "ws://127.0.0.1:9".to_string(),
    };
    let feed = RealtimeFeed::new(&config, Arc::new(StaticToken(Some("rt"))), 16);

    let result = feed.connect().await;

    assert!(matches!(result, Err(RealtimeError::Connect(_))));
    assert_eq!(feed.status(), ConnectionStatus::Failed);
}

#[tokio::test]
async fn rejected_auth_then_reconnect_replays_tracked_tickers() {
    let (listener, config) = bind().await;
    let feed = RealtimeFeed::new(&config, Arc::new(StaticToken(Some("rt"))), 32);
    let mut events = feed.subscribe_events();
    feed.subscribe(&["XYZ", "ACME"]);

    let (connected, mut first) = tokio::join!(feed.connect(), accept(&listener));
    connected.unwrap();
    assert!(next_text(&mut first).await.is_some());
    send_text(&mut first, AUTH_FAILED).await;
    wait_for_status(&mut events, ConnectionStatus::Failed).await;
    assert!(!feed.has_stream_token());
    assert_eq!(feed.tracked_symbols(), vec!["ACME", "XYZ"]);

    let (connected, mut second) = tokio::join!(feed.connect(), accept(&listener));
    connected.unwrap();
    assert!(next_text(&mut second).await.is_some());
    send_text(&mut second, AUTH_SUCCESS).await;
    wait_for_status(&mut events, ConnectionStatus::Connected).await;

    assert_eq!(
        next_text(&mut second).await.unwrap(),
        r#"{"action":"subscribe","params":"Q.ACME,Q.XYZ"}"#
    );
    assert_silent(&mut second).await;

    feed.disconnect();
}

#[tokio::test]
async fn server_close_marks_feed_failed() {
    let (listener, config) = bind().await;
    let feed = RealtimeFeed::new(&config, Arc::new(StaticToken(Some("rt"))), 32);
    let mut events = feed.subscribe_events();
    feed.subscribe(&["ACME"]);

    let (connected, mut server) = tokio::join!(feed.connect(), accept(&listener));
    connected.unwrap();
    next_text(&mut server).await.unwrap();
    send_text(&mut server, AUTH_SUCCESS).await;
    wait_for_status(&mut events, ConnectionStatus::Connected).await;
    next_text(&mut server).await.unwrap();

    server.close(None).await.unwrap();
    wait_for_status(&mut events, ConnectionStatus::Failed).await;

    assert_eq!(feed.tracked_symbols(), vec!["ACME"]);
    assert!(!feed.has_stream_token());
}

#[tokio::test]
async fn second_connect_while_connecting_is_ignored() {
    let (listener, config) = bind().await;
    let feed = RealtimeFeed::new(&config, Arc::new(StaticToken(Some("rt"))), 16);

    let (connected, _server) = tokio::join!(feed.connect(), accept(&listener));
    connected.unwrap();

    let (again, accepted) = tokio::join!(
        feed.connect(),
        timeout(Duration::from_millis(200), listener.accept())
    );
    again.unwrap();
    assert!(accepted.is_err());
    assert_eq!(feed.status(), ConnectionStatus::Connecting);

    feed.disconnect();
}
