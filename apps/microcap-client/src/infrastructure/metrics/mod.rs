//! Client Metrics
//!
//! Counters recorded through the `metrics` facade. The library installs no
//! recorder; the host application decides where they go.
//!
//! # Metrics
//!
//! - `microcap_api_requests_total{outcome}`: pipeline calls by final outcome
//! - `microcap_api_retries_total`: retries after transient responses
//! - `microcap_realtime_frames_total{kind}`: inbound stream events
//! - `microcap_quote_updates_total`: price map writes
//! - `microcap_realtime_status_changes_total{status}`: feed transitions

use metrics::{counter, describe_counter};

use crate::domain::realtime::ConnectionStatus;
use crate::error::ApiError;

// =============================================================================
// Metric Registration
// =============================================================================

/// Attach descriptions to every counter. Call once after installing a
/// recorder.
pub fn describe_metrics() {
    describe_counter!(
        "microcap_api_requests_total",
        "API calls by final outcome"
    );
    describe_counter!(
        "microcap_api_retries_total",
        "API retries after transient server errors"
    );
    describe_counter!(
        "microcap_realtime_frames_total",
        "Realtime events received by kind"
    );
    describe_counter!(
        "microcap_quote_updates_total",
        "Live price updates applied"
    );
    describe_counter!(
        "microcap_realtime_status_changes_total",
        "Realtime connection status transitions"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Label for the final outcome of an API call.
#[must_use]
pub const fn outcome_label(result: Result<(), &ApiError>) -> &'static str {
    match result {
        Ok(()) => "success",
        Err(ApiError::Unauthorized) => "unauthorized",
        Err(ApiError::Forbidden) => "forbidden",
        Err(ApiError::ServerError { .. }) => "server_error",
        Err(ApiError::Network(_)) => "network",
        Err(ApiError::Decoding { .. }) => "decoding",
        Err(ApiError::Cancelled) => "cancelled",
    }
}

/// Record the final outcome of an API call.
pub fn record_api_outcome(outcome: &'static str) {
    counter!("microcap_api_requests_total", "outcome" => outcome).increment(1);
}

/// Record one retry.
pub fn record_api_retry() {
    counter!("microcap_api_retries_total").increment(1);
}

/// Record an inbound realtime event.
pub fn record_realtime_frame(kind: &'static str) {
    counter!("microcap_realtime_frames_total", "kind" => kind).increment(1);
}

/// Record a price map write.
pub fn record_quote_update() {
    counter!("microcap_quote_updates_total").increment(1);
}

/// Record a feed status transition.
pub fn record_feed_status(status: ConnectionStatus) {
    counter!("microcap_realtime_status_changes_total", "status" => status.as_str()).increment(1);
}
