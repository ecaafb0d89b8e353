//! Watchlist mutations.

use serde::{Deserialize, Serialize};

/// Direction of a watchlist change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistAction {
    /// Start watching.
    Add,
    /// Stop watching.
    Remove,
}

impl WatchlistAction {
    /// Wire label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }

    /// The action that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Add => Self::Remove,
            Self::Remove => Self::Add,
        }
    }
}

/// Body of `POST watchlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistUpdate {
    /// Ticker to change.
    pub ticker: String,
    /// Add or remove.
    pub action: WatchlistAction,
}

impl WatchlistUpdate {
    /// Build an update.
    #[must_use]
    pub fn new(ticker: impl Into<String>, action: WatchlistAction) -> Self {
        Self {
            ticker: ticker.into(),
            action,
        }
    }
}
