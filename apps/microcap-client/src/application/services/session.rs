//! Session Manager
//!
//! Single owner of the bearer token and the premium flag. Every mutation
//! happens under one write lock, and the vault is updated inside that same
//! critical section, so readers never see a token without its matching
//! entitlement state.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::application::ports::{CredentialVault, VaultError};
use crate::domain::session::{SessionEvent, SessionSnapshot, TOKEN_ACCOUNT};

/// Default capacity of the session event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Owns session and entitlement state and publishes changes.
pub struct SessionManager {
    vault: Arc<dyn CredentialVault>,
    state: RwLock<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Restore the session from whatever token the vault holds.
    #[must_use]
    pub fn restore(vault: Arc<dyn CredentialVault>, event_capacity: usize) -> Self {
        let snapshot = SessionSnapshot::restore(vault.get(TOKEN_ACCOUNT));
        tracing::info!(
            authenticated = snapshot.is_authenticated(),
            "Session restored from vault"
        );

        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            vault,
            state: RwLock::new(snapshot),
            events,
        }
    }

    /// Consistent copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.read().clone()
    }

    /// Current bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.read().token().map(str::to_string)
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// Whether the user currently has paid access.
    #[must_use]
    pub fn is_premium(&self) -> bool {
        self.state.read().is_premium()
    }

    /// Observe session changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Persist a freshly issued token and mark the session authenticated.
    ///
    /// Returns `Ok(false)` without touching anything for an empty token. A
    /// vault failure also leaves the session unchanged.
    pub fn establish(&self, token: String) -> Result<bool, VaultError> {
        if token.is_empty() {
            return Ok(false);
        }

        {
            let mut state = self.state.write();
            self.vault.set(TOKEN_ACCOUNT, &token)?;
            state.sign_in(token);
        }

        tracing::info!("Session established");
        self.publish(SessionEvent::LoggedIn);
        Ok(true)
    }

    /// Clear the token from the vault and revoke everything.
    ///
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        self.logout_if(|_| true);
    }

    /// Log out because the backend rejected `rejected_token` with a 401.
    ///
    /// Ignored if the session has already moved on to a different token, so
    /// a stale response cannot sign out a newer login. Returns `true` if the
    /// session was cleared.
    pub fn invalidate(&self, rejected_token: &str) -> bool {
        let cleared = self.logout_if(|state| state.token() == Some(rejected_token));
        if cleared {
            tracing::warn!("Backend rejected session token, logging out");
        } else {
            tracing::debug!("Ignoring 401 for a token that is no longer current");
        }
        cleared
    }

    /// Sign out if `should_clear` holds, checked under the same write lock
    /// that clears the vault. Returns `true` if the session was cleared.
    fn logout_if(&self, should_clear: impl FnOnce(&SessionSnapshot) -> bool) -> bool {
        let (was_authenticated, was_premium) = {
            let mut state = self.state.write();
            if !should_clear(&state) {
                return false;
            }
            self.vault.delete(TOKEN_ACCOUNT);
            let was_premium = state.is_premium();
            (state.sign_out(), was_premium)
        };

        if was_premium {
            self.publish(SessionEvent::EntitlementChanged { is_premium: false });
        }
        if was_authenticated {
            tracing::info!("Session logged out");
            self.publish(SessionEvent::LoggedOut);
        }
        was_authenticated
    }

    /// Update the premium flag. Grants are ignored while signed out.
    ///
    /// Returns `true` if the flag changed.
    pub fn set_premium(&self, is_premium: bool) -> bool {
        let (changed, now) = {
            let mut state = self.state.write();
            let changed = state.set_premium(is_premium);
            (changed, state.is_premium())
        };

        if changed {
            tracing::info!(is_premium = now, "Entitlement changed");
            self.publish(SessionEvent::EntitlementChanged { is_premium: now });
        }
        changed
    }

    /// Revoke premium access after the backend answered 403.
    pub fn revoke_entitlement(&self) -> bool {
        self.set_premium(false)
    }

    fn publish(&self, event: SessionEvent) {
        // No receivers is not an error; the channel just drops the event.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
