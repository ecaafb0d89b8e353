//! Authenticated HTTP client with retry logic.
//!
//! Every call goes through [`ApiClient::call`], which reads the bearer token
//! from the session, classifies the response status and applies the session
//! side effects of 401 and 403 before the error reaches the caller.

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::decode::decode_body;
use super::request::ApiRequest;
use super::retry::{ExponentialBackoff, StatusCategory, categorize_status};
use crate::application::services::SessionManager;
use crate::error::ApiError;
use crate::infrastructure::config::{ApiConfig, RetryConfig};
use crate::infrastructure::metrics;

/// Versioned prefix appended to the configured origin.
pub const API_PREFIX: &str = "/api/v1/";

/// HTTP client for the advisory backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_root: String,
    retry: RetryConfig,
    session: Arc<SessionManager>,
    cancel: CancellationToken,
}

impl ApiClient {
    /// Create a new client from config.
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let api_root = format!("{}{API_PREFIX}", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            api_root,
            retry: config.retry.clone(),
            session,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop in-flight calls and pending backoff waits when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path.trim_start_matches('/'))
    }

    /// Session this client authenticates with.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Perform an authenticated call.
    ///
    /// Fails with `Unauthorized` without touching the network if no token
    /// is held.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let Some(token) = self.session.token() else {
            tracing::debug!(path = %request.path, "No session token, failing fast");
            metrics::record_api_outcome(metrics::outcome_label(Err(&ApiError::Unauthorized)));
            return Err(ApiError::Unauthorized);
        };

        let result = self.execute(&request, Some(&token)).await;
        metrics::record_api_outcome(metrics::outcome_label(result.as_ref().map(|_| ())));
        result
    }

    /// Perform the bootstrap call that obtains a token.
    ///
    /// Sends no `Authorization` header, and a 401 or 403 here has no
    /// session side effects.
    pub async fn call_anonymous<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        let result = self.execute(&request, None).await;
        metrics::record_api_outcome(metrics::outcome_label(result.as_ref().map(|_| ())));
        result
    }

    /// Internal request implementation with retry logic.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(&request.path);
        let mut backoff = ExponentialBackoff::new(&self.retry);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let mut builder = self
                .http
                .request(request.method.clone(), &url)
                .header(ACCEPT, "application/json");
            if let Some(token) = token {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            tracing::debug!(method = %request.method, path = %request.path, attempt = attempts, "Sending request");

            let response = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                sent = builder.send() => match sent {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(path = %request.path, error = %e, "Network error");
                        return Err(ApiError::from(e));
                    }
                },
            };

            let status = response.status();
            match categorize_status(status) {
                StatusCategory::Success => {
                    let body = response.bytes().await?;
                    return decode_body(&body, request.date_strategy).map_err(|source| {
                        tracing::warn!(path = %request.path, error = %source, "Failed to decode response");
                        ApiError::Decoding {
                            path: request.path.clone(),
                            source,
                        }
                    });
                }
                StatusCategory::Unauthorized => {
                    if let Some(token) = token {
                        tracing::error!(path = %request.path, "Session rejected by backend");
                        self.session.invalidate(token);
                    }
                    return Err(ApiError::Unauthorized);
                }
                StatusCategory::Forbidden => {
                    if token.is_some() {
                        tracing::warn!(path = %request.path, "Entitlement rejected by backend");
                        self.session.revoke_entitlement();
                    }
                    return Err(ApiError::Forbidden);
                }
                StatusCategory::Transient => {
                    let Some(delay) = backoff.next_backoff() else {
                        tracing::error!(
                            path = %request.path,
                            status = status.as_u16(),
                            attempts,
                            "Server error, retries exhausted"
                        );
                        return Err(ApiError::ServerError {
                            status: status.as_u16(),
                            attempts,
                        });
                    };

                    tracing::warn!(
                        path = %request.path,
                        status = status.as_u16(),
                        attempt = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Server error, retrying"
                    );
                    metrics::record_api_retry();

                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                StatusCategory::Unexpected => {
                    tracing::warn!(path = %request.path, status = status.as_u16(), "Unexpected status");
                    return Err(ApiError::ServerError {
                        status: status.as_u16(),
                        attempts,
                    });
                }
            }
        }
    }
}
