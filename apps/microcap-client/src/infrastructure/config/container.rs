//! Dependency Injection Container
//!
//! Builds one instance of every service and wires them together. This is
//! the only place that knows which adapter backs which port.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::settings::ClientConfig;
use crate::application::ports::{CredentialVault, EntitlementOracle, ServerValidatedEntitlement};
use crate::application::services::{
    AuthService, EntitlementService, SessionManager, WatchlistService,
};
use crate::error::ApiError;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::realtime::RealtimeFeed;

/// Wired client services.
pub struct AppContainer {
    session: Arc<SessionManager>,
    api: Arc<ApiClient>,
    entitlement: Arc<EntitlementService>,
    auth: Arc<AuthService>,
    watchlist: Arc<WatchlistService>,
    feed: RealtimeFeed,
    cancel: CancellationToken,
}

impl AppContainer {
    /// Build the container with the server-trusting entitlement oracle.
    pub fn new(config: &ClientConfig, vault: Arc<dyn CredentialVault>) -> Result<Self, ApiError> {
        Self::with_oracle(config, vault, Arc::new(ServerValidatedEntitlement))
    }

    /// Build the container with a specific entitlement oracle.
    pub fn with_oracle(
        config: &ClientConfig,
        vault: Arc<dyn CredentialVault>,
        oracle: Arc<dyn EntitlementOracle>,
    ) -> Result<Self, ApiError> {
        let cancel = CancellationToken::new();
        let session = Arc::new(SessionManager::restore(vault, config.event_capacity));

        let api = Arc::new(
            ApiClient::new(&config.api, Arc::clone(&session))?.with_cancellation(cancel.clone()),
        );

        let entitlement = Arc::new(EntitlementService::new(Arc::clone(&session), oracle));
        let auth = Arc::new(AuthService::new(
            api.clone(),
            Arc::clone(&session),
            Arc::clone(&entitlement),
        ));
        let watchlist = Arc::new(WatchlistService::new(api.clone(), Arc::clone(&session)));
        let feed = RealtimeFeed::new(&config.realtime, api.clone(), config.event_capacity);

        tracing::info!(
            environment = config.environment.as_str(),
            base_url = %config.api.base_url,
            "Client container initialized"
        );

        Ok(Self {
            session,
            api,
            entitlement,
            auth,
            watchlist,
            feed,
            cancel,
        })
    }

    /// Get the session manager.
    #[must_use]
    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }

    /// Get the API client.
    #[must_use]
    pub fn api(&self) -> Arc<ApiClient> {
        Arc::clone(&self.api)
    }

    /// Get the entitlement service.
    #[must_use]
    pub fn entitlement(&self) -> Arc<EntitlementService> {
        Arc::clone(&self.entitlement)
    }

    /// Get the auth service.
    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    /// Get the watchlist store.
    #[must_use]
    pub fn watchlist(&self) -> Arc<WatchlistService> {
        Arc::clone(&self.watchlist)
    }

    /// Get the realtime feed.
    #[must_use]
    pub fn feed(&self) -> RealtimeFeed {
        self.feed.clone()
    }

    /// Start background listeners. Call once from inside a runtime.
    pub fn start(&self) -> JoinHandle<()> {
        Arc::clone(&self.watchlist).spawn_session_listener()
    }

    /// Cancel in-flight API calls and close the realtime feed.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.feed.disconnect();
    }
}

impl std::fmt::Debug for AppContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContainer")
            .field("session", &self.session)
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}
