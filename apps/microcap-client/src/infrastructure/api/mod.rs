//! Request Pipeline
//!
//! Authenticated access to the versioned JSON API at
//! `{base_url}/api/v1/<path>`.
//!
//! - `client`: bearer auth, status handling, 5xx backoff, cancellation
//! - `decode`: body decoding and per-field date overrides
//! - `endpoints`: typed operations and the port implementations
//! - `retry`: status classification and the backoff schedule

mod client;
mod decode;
mod endpoints;
mod request;
mod retry;
mod types;

pub use client::{API_PREFIX, ApiClient};
pub use decode::{DateStrategy, decode_body};
pub use request::ApiRequest;
pub use retry::{ExponentialBackoff, StatusCategory, categorize_status};
pub use types::{Ack, DeviceRegistration, LoginRequest, TokenResponse};
