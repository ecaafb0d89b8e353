//! Infrastructure Layer
//!
//! Adapters behind the application ports plus ambient concerns.
//!
//! - `api`: HTTP request pipeline and typed endpoints
//! - `realtime`: streaming quote feed
//! - `vault`: in-memory credential store
//! - `config`: environment settings and the composition root
//! - `telemetry`, `metrics`: logging and counters

pub mod api;
pub mod config;
pub mod metrics;
pub mod realtime;
pub mod telemetry;
pub mod vault;
