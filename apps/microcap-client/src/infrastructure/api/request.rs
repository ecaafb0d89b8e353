//! Request description passed through the pipeline.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::decode::DateStrategy;
use crate::error::ApiError;

/// One call against the versioned API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Path relative to `/api/v1/`, e.g. `picks/daily`.
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Date decoding rule for the response.
    pub date_strategy: DateStrategy,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            date_strategy: DateStrategy::Iso8601,
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if `body` cannot be represented as JSON,
    /// matching how the transport reports a body it failed to encode.
    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Network(format!("failed to encode request body: {e}")))?;
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        Ok(request)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Override how dates in the response are parsed.
    #[must_use]
    pub const fn with_date_strategy(mut self, strategy: DateStrategy) -> Self {
        self.date_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_body() {
        let request = ApiRequest::post("auth/login", &serde_json::json!({"email": "a@b.c"})).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.unwrap()["email"], "a@b.c");
    }

    #[test]
    fn get_has_no_body() {
        let request = ApiRequest::get("picks/daily");
        assert!(request.body.is_none());
        assert_eq!(request.date_strategy, DateStrategy::Iso8601);
    }
}
