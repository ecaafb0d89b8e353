#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Microcap Client - Subscription-Gated Research API Client
//!
//! Core of a client for a micro-cap stock research service: an authenticated
//! request pipeline, session and entitlement ownership, and a streaming
//! quote feed. The crate has no UI dependency; hosts observe state through
//! broadcast channels.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and state machines
//!   - `content`: ideas, analysis bundles, track record, catalysts, watchlist
//!   - `session`: token and premium flag
//!   - `realtime`: quote stream state machine and control frames
//!
//! - **Application**: Ports and stateful services
//!   - `ports`: vault, entitlement oracle, backend gateways
//!   - `services`: session manager, auth, entitlement, watchlist
//!
//! - **Infrastructure**: Adapters and ambient concerns
//!   - `api`: HTTP pipeline with bearer auth, 401/403 handling, 5xx backoff
//!   - `realtime`: WebSocket quote feed
//!   - `vault`: in-memory credential store
//!   - `config`: environment settings and the composition root
//!
//! # Data Flow
//!
//! ```text
//!               ┌──────────────┐  token   ┌────────────┐
//! Vault ◄──────►│SessionManager│─────────►│ ApiClient  │──► /api/v1/...
//!               └──────┬───────┘◄─────────└─────┬──────┘
//!                      │   401 logout /         │ realtime token
//!                      │   403 downgrade        ▼
//!              SessionEvent              ┌────────────┐
//!                      │                 │RealtimeFeed│──► quote stream
//!                      ▼                 └────────────┘
//!              WatchlistService              FeedEvent
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure types with no I/O.
pub mod domain;

/// Application layer - Ports and services.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Request pipeline error taxonomy.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Errors
pub use error::ApiError;

// Domain types
pub use domain::content::{
    AnalysisHub, EventCatalyst, PerformanceRecord, RiskLevel, Scorecard, StockIdea,
    WatchlistAction, WatchlistUpdate,
};
pub use domain::realtime::ConnectionStatus;
pub use domain::session::{SessionEvent, SessionSnapshot, TOKEN_ACCOUNT};

// Ports and services
pub use application::ports::{
    AccountGateway, CredentialVault, EntitlementError, EntitlementOracle, RealtimeTokenProvider,
    ServerValidatedEntitlement, VaultError, WatchlistGateway,
};
pub use application::services::{
    AuthService, EntitlementService, SessionManager, WatchlistService,
};

// Infrastructure
pub use infrastructure::api::{ApiClient, ApiRequest, DateStrategy};
pub use infrastructure::config::{
    ApiConfig, AppContainer, ClientConfig, ConfigError, Environment, RealtimeConfig, RetryConfig,
};
pub use infrastructure::realtime::{FeedEvent, RealtimeError, RealtimeFeed};
pub use infrastructure::telemetry::init as init_telemetry;
pub use infrastructure::vault::InMemoryVault;
