//! Request pipeline error taxonomy.
//!
//! | Variant | Cause | Side effect before surfacing |
//! |---------|-------|------------------------------|
//! | `Unauthorized` | no token, or HTTP 401 | session logged out (401 only) |
//! | `Forbidden` | HTTP 403 | entitlement revoked |
//! | `ServerError` | 5xx after retries, or an unexpected status | none |
//! | `Network` | timeout, no connectivity, transport failure | none |
//! | `Decoding` | 2xx body did not match the expected shape | none |

use thiserror::Error;

/// Failure of a call through the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session. Either no token was held, or the backend rejected it.
    #[error("unauthorized: session is missing or expired")]
    Unauthorized,

    /// Session is valid but paid access has lapsed.
    #[error("forbidden: premium entitlement required")]
    Forbidden,

    /// The backend failed, or answered with a status this client does not
    /// handle.
    #[error("server error: status {status} after {attempts} attempt(s)")]
    ServerError {
        /// Last HTTP status received.
        status: u16,
        /// Number of requests issued.
        attempts: u32,
    },

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// A success body could not be decoded into the requested type.
    #[error("decoding error for {path}: {source}")]
    Decoding {
        /// API path of the failed call.
        path: String,
        /// Original parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The call was abandoned because the client is shutting down.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Whether the UI should offer a retry affordance for this failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError { .. } | Self::Network(_))
    }

    /// Whether the failure means the user must sign in again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Whether the failure means the user must (re)subscribe.
    #[must_use]
    pub const fn requires_subscription(&self) -> bool {
        matches!(self, Self::Forbidden)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
