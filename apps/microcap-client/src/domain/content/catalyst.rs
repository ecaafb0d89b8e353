//! Catalyst feed entries (filings, FDA updates, earnings).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dated event that may move a covered ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCatalyst {
    /// Backend identifier.
    pub id: Uuid,
    /// Ticker symbol.
    pub ticker: String,
    /// Event category label, e.g. "SEC Filing (8-K)".
    pub event_type: String,
    /// Headline.
    pub title: String,
    /// When the event occurred.
    pub date: DateTime<Utc>,
    /// Impact label ("High", "Medium", "Speculative").
    pub impact: Option<String>,
}

/// Interpreted event impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactLevel {
    /// Likely to move the price.
    High,
    /// Uncertain outcome.
    Speculative,
    /// Anything else, including no label.
    Moderate,
}

/// Interpreted event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalystKind {
    /// 8-K and similar filings.
    SecFiling,
    /// Regulatory update from the FDA.
    FdaUpdate,
    /// Earnings release.
    Earnings,
    /// General news.
    News,
}

impl EventCatalyst {
    /// Impact bucket for display.
    #[must_use]
    pub fn impact_level(&self) -> ImpactLevel {
        match self.impact.as_deref() {
            Some("High") => ImpactLevel::High,
            Some("Speculative") => ImpactLevel::Speculative,
            _ => ImpactLevel::Moderate,
        }
    }

    /// Category for display.
    #[must_use]
    pub fn kind(&self) -> CatalystKind {
        match self.event_type.as_str() {
            "SEC Filing (8-K)" => CatalystKind::SecFiling,
            "FDA Update" => CatalystKind::FdaUpdate,
            "Earnings" => CatalystKind::Earnings,
            _ => CatalystKind::News,
        }
    }
}

/// Order a feed newest first.
pub fn sort_newest_first(events: &mut [EventCatalyst]) {
    events.sort_by(|a, b| b.date.cmp(&a.date));
}
