//! Curated stock idea records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Risk tier assigned to an idea by the research desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Highest risk tier.
    Speculative,
    /// Elevated risk.
    High,
    /// Moderate risk.
    Medium,
}

impl RiskLevel {
    /// Label as sent by the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Speculative => "Speculative",
            Self::High => "High",
            Self::Medium => "Medium",
        }
    }
}

/// A published stock idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StockIdea {
    /// Backend identifier.
    pub id: Uuid,
    /// Ticker symbol.
    pub ticker: String,
    /// Issuer name.
    pub company_name: String,
    /// Investment thesis text.
    pub thesis: String,
    /// Risk tier.
    pub risk_level: RiskLevel,
    /// Suggested entry price.
    pub entry_price: Option<f64>,
    /// Price target.
    pub target_price: Option<f64>,
    /// When the idea was published.
    pub publication_date: Option<DateTime<Utc>>,
    /// Insider activity signal (e.g. "Bullish").
    pub signal_insider: Option<String>,
    /// Short interest as a fraction of float.
    pub signal_short_interest: Option<f64>,
    /// Liquidity score, 0-100.
    pub signal_liquidity: Option<i64>,
}

impl StockIdea {
    /// Relative upside from entry to target.
    ///
    /// `None` when either price is missing or the entry price is not positive.
    #[must_use]
    pub fn potential_upside(&self) -> Option<f64> {
        upside(self.entry_price?, self.target_price?)
    }

    /// SEC EDGAR full-text search URL for this ticker's periodic filings.
    #[must_use]
    pub fn sec_edgar_url(&self) -> String {
        let ticker = urlencoding::encode(&self.ticker);
        format!(
            "https://www.sec.gov/edgar/search/#/q={ticker}&entityName={ticker}&category=form-cat1"
        )
    }
}

/// `(target - entry) / entry`, undefined for a non-positive entry.
#[must_use]
pub fn upside(entry: f64, target: f64) -> Option<f64> {
    if entry > 0.0 {
        Some((target - entry) / entry)
    } else {
        None
    }
}
