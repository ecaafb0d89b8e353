//! Configuration Module
//!
//! Configuration loading and dependency injection for the client.

mod container;
mod settings;

pub use container::AppContainer;
pub use settings::{
    ApiConfig, ClientConfig, ConfigError, DEFAULT_REALTIME_URL, Environment, RealtimeConfig,
    RetryConfig,
};
