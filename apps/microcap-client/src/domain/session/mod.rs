//! Session and Entitlement State
//!
//! A single snapshot type holds both the bearer token and the premium flag so
//! readers always observe a consistent pair. Authentication is derived from
//! the token rather than stored separately, which keeps
//! `is_authenticated() == token.is_some()` true by construction.
//!
//! # Entitlement rules
//!
//! - Premium access is only ever granted to an authenticated session.
//! - Signing out always revokes premium access.
//! - A backend rejection (403) revokes premium access but keeps the session.

use std::fmt;

/// Vault account key under which the bearer token is stored.
pub const TOKEN_ACCOUNT: &str = "userAuthToken";

// =============================================================================
// Session Snapshot
// =============================================================================

/// Current authentication and entitlement state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    token: Option<String>,
    is_premium: bool,
}

impl SessionSnapshot {
    /// Build the startup snapshot from whatever the vault returned.
    ///
    /// Empty tokens are treated as absent. Entitlement always starts revoked
    /// and is only granted by a later verification.
    #[must_use]
    pub fn restore(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            is_premium: false,
        }
    }

    /// Whether a bearer token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the user currently has paid access.
    #[must_use]
    pub const fn is_premium(&self) -> bool {
        self.is_premium
    }

    /// The bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Install a freshly issued token.
    ///
    /// Returns `false` and leaves the snapshot untouched for an empty token.
    pub fn sign_in(&mut self, token: String) -> bool {
        if token.is_empty() {
            return false;
        }
        self.token = Some(token);
        true
    }

    /// Drop the token and revoke entitlement.
    ///
    /// Returns `true` if the snapshot was authenticated before the call.
    pub fn sign_out(&mut self) -> bool {
        let was_authenticated = self.token.take().is_some();
        self.is_premium = false;
        was_authenticated
    }

    /// Update the premium flag.
    ///
    /// Granting is ignored while signed out. Returns `true` if the flag
    /// actually changed.
    pub fn set_premium(&mut self, is_premium: bool) -> bool {
        let next = is_premium && self.is_authenticated();
        let changed = next != self.is_premium;
        self.is_premium = next;
        changed
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("is_premium", &self.is_premium)
            .finish()
    }
}

// =============================================================================
// Session Events
// =============================================================================

/// State changes published to observers of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A token was obtained and persisted.
    LoggedIn,
    /// The token was cleared (explicit logout or a 401 from the backend).
    LoggedOut,
    /// The premium flag changed.
    EntitlementChanged {
        /// New premium state.
        is_premium: bool,
    },
}
