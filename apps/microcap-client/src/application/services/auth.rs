//! Login, logout and entitlement refresh.
//!
//! `AuthService` drives the session lifecycle; `EntitlementService` keeps the
//! premium flag subordinate to it.

use std::sync::Arc;

use crate::application::ports::{AccountGateway, EntitlementOracle};
use crate::application::services::session::SessionManager;
use crate::error::ApiError;

// =============================================================================
// Entitlement
// =============================================================================

/// Refreshes the premium flag from the entitlement oracle.
pub struct EntitlementService {
    session: Arc<SessionManager>,
    oracle: Arc<dyn EntitlementOracle>,
}

impl EntitlementService {
    /// Create the service.
    #[must_use]
    pub fn new(session: Arc<SessionManager>, oracle: Arc<dyn EntitlementOracle>) -> Self {
        Self { session, oracle }
    }

    /// Ask the oracle for the current entitlement and apply the answer.
    ///
    /// Signed-out sessions are forced to non-premium without consulting the
    /// oracle. An oracle failure leaves the flag as it was. Returns the flag
    /// after the refresh.
    pub async fn refresh(&self) -> bool {
        let snapshot = self.session.snapshot();
        if !snapshot.is_authenticated() {
            self.session.set_premium(false);
            return false;
        }

        match self.oracle.verify(&snapshot).await {
            Ok(is_premium) => {
                // The session may have logged out while the oracle answered.
                if self.session.is_authenticated() {
                    self.session.set_premium(is_premium);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Entitlement refresh failed, keeping current flag");
            }
        }
        self.session.is_premium()
    }

    /// Apply the outcome of a purchase or restore flow.
    ///
    /// Returns `true` if the flag changed.
    pub fn apply_confirmation(&self, is_premium: bool) -> bool {
        self.session.set_premium(is_premium)
    }
}

impl std::fmt::Debug for EntitlementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementService").finish_non_exhaustive()
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Signs users in and out.
pub struct AuthService {
    gateway: Arc<dyn AccountGateway>,
    session: Arc<SessionManager>,
    entitlement: Arc<EntitlementService>,
}

impl AuthService {
    /// Create the service.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn AccountGateway>,
        session: Arc<SessionManager>,
        entitlement: Arc<EntitlementService>,
    ) -> Self {
        Self {
            gateway,
            session,
            entitlement,
        }
    }

    /// Exchange `identifier` for a token, persist it, then refresh
    /// entitlement.
    ///
    /// Returns `false` without changing any state if the identifier is empty,
    /// the exchange fails, or the token cannot be persisted.
    pub async fn login(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            tracing::warn!("Login attempted with an empty identifier");
            return false;
        }

        let token = match self.gateway.exchange_login(identifier).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Login exchange failed");
                return false;
            }
        };

        match self.session.establish(token) {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!("Login returned an empty token");
                return false;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist session token");
                return false;
            }
        }

        let is_premium = self.entitlement.refresh().await;
        tracing::info!(is_premium, "Login complete");
        true
    }

    /// Clear the session. Idempotent.
    pub fn logout(&self) {
        self.session.logout();
    }

    /// Delete the account on the backend, then log out locally.
    ///
    /// On failure the session is left alone, apart from whatever the request
    /// pipeline already did for a 401 or 403.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.gateway.remove_account().await?;
        tracing::info!("Account deleted");
        self.session.logout();
        Ok(())
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        EntitlementError, MockAccountGateway, MockCredentialVault, MockEntitlementOracle,
        ServerValidatedEntitlement,
    };
    use crate::domain::session::SessionEvent;

    fn vault(initial: Option<&str>) -> MockCredentialVault {
        let mut vault = MockCredentialVault::new();
        vault
            .expect_get()
            .return_const(initial.map(str::to_string));
        vault.expect_set().returning(|_, _| Ok(()));
        vault.expect_delete().return_const(());
        vault
    }

    fn session(initial: Option<&str>) -> Arc<SessionManager> {
        Arc::new(SessionManager::restore(Arc::new(vault(initial)), 16))
    }

    fn auth(gateway: MockAccountGateway, session: &Arc<SessionManager>) -> AuthService {
        let entitlement = Arc::new(EntitlementService::new(
            Arc::clone(session),
            Arc::new(ServerValidatedEntitlement),
        ));
        AuthService::new(Arc::new(gateway), Arc::clone(session), entitlement)
    }

    #[tokio::test]
    async fn login_establishes_session_and_refreshes_entitlement() {
        let mut gateway = MockAccountGateway::new();
        gateway
            .expect_exchange_login()
            .withf(|id| id == "trader@example.com")
            .times(1)
            .returning(|_| Ok("tok".to_string()));

        let session = session(None);
        let mut events = session.subscribe();
        let service = auth(gateway, &session);

        assert!(service.login("trader@example.com").await);
        assert!(session.is_authenticated());
        assert!(session.is_premium());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::EntitlementChanged { is_premium: true }
        );
    }

    #[tokio::test]
    async fn failed_exchange_leaves_state_untouched() {
        let mut gateway = MockAccountGateway::new();
        gateway
            .expect_exchange_login()
            .returning(|_| Err(ApiError::Network("offline".to_string())));

        let session = session(None);
        let service = auth(gateway, &session);

        assert!(!service.login("trader@example.com").await);
        assert!(!session.is_authenticated());
        assert!(!session.is_premium());
    }

    #[tokio::test]
    async fn empty_identifier_skips_exchange() {
        let mut gateway = MockAccountGateway::new();
        gateway.expect_exchange_login().times(0);

        let session = session(None);
        assert!(!auth(gateway, &session).login("   ").await);
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let mut gateway = MockAccountGateway::new();
        gateway
            .expect_exchange_login()
            .returning(|_| Ok(String::new()));

        let session = session(None);
        assert!(!auth(gateway, &session).login("trader@example.com").await);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn delete_account_logs_out_after_success() {
        let mut gateway = MockAccountGateway::new();
        gateway.expect_remove_account().times(1).returning(|| Ok(()));

        let session = session(Some("tok"));
        auth(gateway, &session).delete_account().await.unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn delete_account_failure_keeps_session() {
        let mut gateway = MockAccountGateway::new();
        gateway.expect_remove_account().returning(|| {
            Err(ApiError::ServerError {
                status: 500,
                attempts: 3,
            })
        });

        let session = session(Some("tok"));
        assert!(auth(gateway, &session).delete_account().await.is_err());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_forces_false_when_signed_out() {
        let mut oracle = MockEntitlementOracle::new();
        oracle.expect_verify().times(0);

        let session = session(None);
        let service = EntitlementService::new(Arc::clone(&session), Arc::new(oracle));
        assert!(!service.refresh().await);
    }

    #[tokio::test]
    async fn refresh_keeps_flag_when_oracle_fails() {
        let mut oracle = MockEntitlementOracle::new();
        oracle
            .expect_verify()
            .returning(|_| Err(EntitlementError::Unavailable("timeout".to_string())));

        let session = session(Some("tok"));
        session.set_premium(true);
        let service = EntitlementService::new(Arc::clone(&session), Arc::new(oracle));

        assert!(service.refresh().await);
    }

    #[tokio::test]
    async fn refresh_applies_downgrade() {
        let mut oracle = MockEntitlementOracle::new();
        oracle.expect_verify().returning(|_| Ok(false));

        let session = session(Some("tok"));
        session.set_premium(true);
        let service = EntitlementService::new(Arc::clone(&session), Arc::new(oracle));

        assert!(!service.refresh().await);
        assert!(session.is_authenticated());
    }

    #[test]
    fn confirmation_grants_only_when_signed_in() {
        let signed_in = session(Some("tok"));
        let service = EntitlementService::new(
            Arc::clone(&signed_in),
            Arc::new(ServerValidatedEntitlement),
        );
        assert!(service.apply_confirmation(true));
        assert!(signed_in.is_premium());

        let signed_out = session(None);
        let service =
            EntitlementService::new(Arc::clone(&signed_out), Arc::new(ServerValidatedEntitlement));
        assert!(!service.apply_confirmation(true));
    }
}
