//! Watchlist Store
//!
//! Local mirror of the user's watchlist. Toggles are applied optimistically
//! and rolled back if the backend rejects them. The store empties itself on
//! logout and reloads on login when driven by `spawn_session_listener`.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::application::ports::WatchlistGateway;
use crate::application::services::session::SessionManager;
use crate::domain::content::{WatchlistAction, WatchlistUpdate};
use crate::domain::session::SessionEvent;
use crate::error::ApiError;

/// Watched tickers for the signed-in user.
pub struct WatchlistService {
    gateway: Arc<dyn WatchlistGateway>,
    session: Arc<SessionManager>,
    tickers: RwLock<BTreeSet<String>>,
}

impl WatchlistService {
    /// Create an empty store.
    #[must_use]
    pub fn new(gateway: Arc<dyn WatchlistGateway>, session: Arc<SessionManager>) -> Self {
        Self {
            gateway,
            session,
            tickers: RwLock::new(BTreeSet::new()),
        }
    }

    /// Replace the local set with the backend's.
    ///
    /// Signed-out sessions just clear the set and make no request.
    pub async fn load(&self) -> Result<(), ApiError> {
        if !self.session.is_authenticated() {
            self.clear();
            return Ok(());
        }

        let tickers = self.gateway.load_watchlist().await?;
        tracing::debug!(count = tickers.len(), "Watchlist loaded");
        *self.tickers.write() = tickers.into_iter().collect();
        Ok(())
    }

    /// Add or remove `ticker`, whichever flips its current state.
    ///
    /// The local set changes immediately. If the backend call fails the
    /// change is undone and the error returned.
    pub async fn toggle(&self, ticker: &str) -> Result<WatchlistAction, ApiError> {
        let action = {
            let mut tickers = self.tickers.write();
            if tickers.remove(ticker) {
                WatchlistAction::Remove
            } else {
                tickers.insert(ticker.to_string());
                WatchlistAction::Add
            }
        };

        let update = WatchlistUpdate::new(ticker, action);
        if let Err(e) = self.gateway.apply_watchlist_update(&update).await {
            tracing::warn!(ticker, action = action.as_str(), error = %e, "Watchlist update failed, rolling back");
            self.apply_local(ticker, action.inverse());
            return Err(e);
        }
        Ok(action)
    }

    /// Whether `ticker` is on the watchlist.
    #[must_use]
    pub fn is_watching(&self, ticker: &str) -> bool {
        self.tickers.read().contains(ticker)
    }

    /// Sorted copy of the watched tickers.
    #[must_use]
    pub fn tickers(&self) -> Vec<String> {
        self.tickers.read().iter().cloned().collect()
    }

    /// Drop every local entry.
    pub fn clear(&self) {
        self.tickers.write().clear();
    }

    /// React to a session change.
    pub async fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::LoggedIn => {
                if let Err(e) = self.load().await {
                    tracing::warn!(error = %e, "Failed to load watchlist after login");
                }
            }
            SessionEvent::LoggedOut => self.clear(),
            SessionEvent::EntitlementChanged { .. } => {}
        }
    }

    /// Follow session events in a background task until the session manager
    /// is dropped.
    pub fn spawn_session_listener(self: Arc<Self>) -> JoinHandle<()> {
        let mut events = self.session.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.handle_session_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Watchlist listener lagged behind session events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn apply_local(&self, ticker: &str, action: WatchlistAction) {
        let mut tickers = self.tickers.write();
        match action {
            WatchlistAction::Add => {
                tickers.insert(ticker.to_string());
            }
            WatchlistAction::Remove => {
                tickers.remove(ticker);
            }
        }
    }
}

impl std::fmt::Debug for WatchlistService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistService")
            .field("tickers", &*self.tickers.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockCredentialVault, MockWatchlistGateway};

    fn session(token: Option<&str>) -> Arc<SessionManager> {
        let mut vault = MockCredentialVault::new();
        vault.expect_get().return_const(token.map(str::to_string));
        vault.expect_set().returning(|_, _| Ok(()));
        vault.expect_delete().return_const(());
        Arc::new(SessionManager::restore(Arc::new(vault), 16))
    }

    #[tokio::test]
    async fn load_replaces_local_set() {
        let mut gateway = MockWatchlistGateway::new();
        gateway
            .expect_load_watchlist()
            .returning(|| Ok(vec!["XYZ".to_string(), "ACME".to_string()]));

        let service = WatchlistService::new(Arc::new(gateway), session(Some("tok")));
        service.load().await.unwrap();

        assert_eq!(service.tickers(), vec!["ACME", "XYZ"]);
    }

    #[tokio::test]
    async fn load_while_signed_out_makes_no_request() {
        let mut gateway = MockWatchlistGateway::new();
        gateway.expect_load_watchlist().times(0);

        let service = WatchlistService::new(Arc::new(gateway), session(None));
        service.load().await.unwrap();
        assert!(service.tickers().is_empty());
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let mut gateway = MockWatchlistGateway::new();
        gateway
            .expect_apply_watchlist_update()
            .times(2)
            .returning(|_| Ok(()));

        let service = WatchlistService::new(Arc::new(gateway), session(Some("tok")));

        assert_eq!(service.toggle("ACME").await.unwrap(), WatchlistAction::Add);
        assert!(service.is_watching("ACME"));
        assert_eq!(
            service.toggle("ACME").await.unwrap(),
            WatchlistAction::Remove
        );
        assert!(!service.is_watching("ACME"));
    }

    #[tokio::test]
    async fn failed_toggle_rolls_back() {
        let mut gateway = MockWatchlistGateway::new();
        gateway
            .expect_apply_watchlist_update()
            .withf(|update| update.ticker == "ACME" && update.action == WatchlistAction::Add)
            .returning(|_| Err(ApiError::Forbidden));

        let service = WatchlistService::new(Arc::new(gateway), session(Some("tok")));

        assert!(matches!(
            service.toggle("ACME").await,
            Err(ApiError::Forbidden)
        ));
        assert!(!service.is_watching("ACME"));
    }

    #[tokio::test]
    async fn listener_clears_on_logout() {
        let mut gateway = MockWatchlistGateway::new();
        gateway
            .expect_load_watchlist()
            .returning(|| Ok(vec!["ACME".to_string()]));

        let session = session(Some("tok"));
        let service = Arc::new(WatchlistService::new(
            Arc::new(gateway),
            Arc::clone(&session),
        ));
        service.load().await.unwrap();
        assert!(service.is_watching("ACME"));

        service.handle_session_event(SessionEvent::LoggedOut).await;
        assert!(service.tickers().is_empty());
    }

    #[tokio::test]
    async fn listener_loads_on_login() {
        let mut gateway = MockWatchlistGateway::new();
        gateway
            .expect_load_watchlist()
            .returning(|| Ok(vec!["ACME".to_string()]));

        let session = session(None);
        let service = Arc::new(WatchlistService::new(
            Arc::new(gateway),
            Arc::clone(&session),
        ));
        let handle = Arc::clone(&service).spawn_session_listener();

        session.establish("tok".to_string()).unwrap();

        for _ in 0..50 {
            if service.is_watching("ACME") {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(service.is_watching("ACME"));
        handle.abort();
    }
}
