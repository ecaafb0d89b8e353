//! Port Interfaces
//!
//! Contracts for collaborators that live outside this crate.
//!
//! ## Driven Ports (Outbound)
//!
//! - `CredentialVault`: secure storage for the bearer token
//! - `EntitlementOracle`: source of truth for paid access
//! - `RealtimeTokenProvider`: issues short-lived stream credentials
//! - `AccountGateway`, `WatchlistGateway`: backend calls used by services

use async_trait::async_trait;

use crate::domain::content::WatchlistUpdate;
use crate::domain::session::SessionSnapshot;
use crate::error::ApiError;

// =============================================================================
// Credential Vault
// =============================================================================

/// Errors raised by a credential vault.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VaultError {
    /// The platform store rejected the write.
    #[error("vault write failed for account {account}: {message}")]
    WriteFailed {
        /// Account key that was being written.
        account: String,
        /// Platform error detail.
        message: String,
    },
}

/// Opaque secure key-value store for a single bearer token per account.
///
/// Calls are synchronous so the session can update the vault and its own
/// state under one lock.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVault: Send + Sync {
    /// Read the token stored under `account`.
    fn get(&self, account: &str) -> Option<String>;

    /// Store `token` under `account`, replacing any previous value.
    fn set(&self, account: &str, token: &str) -> Result<(), VaultError>;

    /// Remove whatever is stored under `account`. Missing entries are fine.
    fn delete(&self, account: &str);
}

// =============================================================================
// Entitlement Oracle
// =============================================================================

/// Errors raised while verifying entitlement.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EntitlementError {
    /// The oracle could not be reached or gave no answer.
    #[error("entitlement verification unavailable: {0}")]
    Unavailable(String),
}

/// Decides whether an authenticated session has paid access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementOracle: Send + Sync {
    /// Verify entitlement for the given session.
    async fn verify(&self, session: &SessionSnapshot) -> Result<bool, EntitlementError>;
}

/// Oracle that trusts the backend's server-side receipt validation.
///
/// Every authenticated session is treated as premium. Gated endpoints answer
/// 403 when that is not true, and the pipeline revokes the flag then.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerValidatedEntitlement;

#[async_trait]
impl EntitlementOracle for ServerValidatedEntitlement {
    async fn verify(&self, session: &SessionSnapshot) -> Result<bool, EntitlementError> {
        Ok(session.is_authenticated())
    }
}

// =============================================================================
// Realtime Token Provider
// =============================================================================

/// Issues the short-lived credential for the quote stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeTokenProvider: Send + Sync {
    /// Fetch a fresh stream token.
    async fn fetch_realtime_token(&self) -> Result<String, ApiError>;
}

// =============================================================================
// Backend Gateways
// =============================================================================

/// Account operations on the advisory backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Exchange a login identifier for a bearer token. Does not require a
    /// session.
    async fn exchange_login(&self, identifier: &str) -> Result<String, ApiError>;

    /// Permanently delete the signed-in account.
    async fn remove_account(&self) -> Result<(), ApiError>;
}

/// Watchlist operations on the advisory backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchlistGateway: Send + Sync {
    /// Fetch the tickers on the user's watchlist.
    async fn load_watchlist(&self) -> Result<Vec<String>, ApiError>;

    /// Add or remove one ticker.
    async fn apply_watchlist_update(&self, update: &WatchlistUpdate) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_validated_entitlement_follows_authentication() {
        let oracle = ServerValidatedEntitlement;
        let signed_out = SessionSnapshot::default();
        let signed_in = SessionSnapshot::restore(Some("tok".to_string()));

        assert!(!oracle.verify(&signed_out).await.unwrap());
        assert!(oracle.verify(&signed_in).await.unwrap());
    }
}
