//! Request and response bodies that exist only on the wire.

use serde::{Deserialize, Serialize};

/// `{token}` answer from `auth/login` and `config/realtime_token`.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Issued token.
    pub token: String,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Login identifier.
    pub email: &'a str,
}

/// Body of `POST user/register_device`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRegistration<'a> {
    /// Push notification device token.
    pub token: &'a str,
}

/// Generic success acknowledgement. Every field is optional so an empty
/// body decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    /// Status label, e.g. "success".
    #[serde(default)]
    pub status: Option<String>,
    /// Human readable detail.
    #[serde(default)]
    pub message: Option<String>,
}
