//! Analysis hub bundle for a single ticker.
//!
//! The backend precomputes every score here; the client only interprets
//! bands and labels for display.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields in the analysis payload that carry plain `YYYY-MM-DD` dates.
pub const PLAIN_DATE_FIELDS: &[&str] = &["date"];

/// Full analysis bundle returned by `analysis/hub/{ticker}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisHub {
    /// Ticker the bundle describes.
    pub ticker: String,
    /// Red flag engine output.
    pub red_flags: RiskAnalysis,
    /// Insider buying and selling summary.
    pub insider_activity: InsiderActivity,
    /// Liquidity assessment.
    pub liquidity: LiquidityScore,
    /// News sentiment summary.
    pub sentiment: NewsSentiment,
    /// Revenue and net income history.
    pub fundamentals_chart: Vec<FinancialDataPoint>,
    /// Technical indicators and signals.
    pub technicals: TechnicalAnalysis,
    /// Institutional holders.
    pub ownership: InstitutionalOwnership,
}

// =============================================================================
// Red Flags
// =============================================================================

/// Composite risk analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Aggregate risk score.
    pub composite_risk_score: Option<f64>,
    /// Per-metric findings.
    pub details: Option<Vec<RiskDetail>>,
    /// Backend-side failure message, if the engine could not run.
    pub error: Option<String>,
}

/// A single red flag finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDetail {
    /// Metric name, unique within a bundle.
    pub metric: String,
    /// Metric score.
    pub score: Option<f64>,
    /// Human-readable explanation.
    pub insight: String,
    /// Severity bucket.
    pub severity: Severity,
}

/// Severity of a red flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Serious concern.
    High,
    /// Worth watching.
    Medium,
    /// Minor.
    Low,
    /// Not scored, or a label this client does not know.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Insider Activity
// =============================================================================

/// Recent insider transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderActivity {
    /// Sentiment label ("Bullish", "Neutral", "Bearish").
    pub sentiment: String,
    /// Dollar value of recent buys.
    pub recent_buys: f64,
    /// Dollar value of recent sells.
    pub recent_sells: f64,
}

/// Interpreted insider sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsiderOutlook {
    /// Net buying.
    Bullish,
    /// No clear direction.
    Neutral,
    /// Net selling.
    Bearish,
}

impl InsiderActivity {
    /// Interpret the sentiment label. Unknown labels read as neutral.
    #[must_use]
    pub fn outlook(&self) -> InsiderOutlook {
        match self.sentiment.as_str() {
            "Bullish" => InsiderOutlook::Bullish,
            "Bearish" => InsiderOutlook::Bearish,
            _ => InsiderOutlook::Neutral,
        }
    }
}

// =============================================================================
// Liquidity
// =============================================================================

/// Liquidity assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityScore {
    /// Score from 0 to 100.
    pub score: i64,
    /// Formatted bid/ask spread.
    pub spread: String,
    /// Spread as a percentage of price.
    pub spread_pct: Option<f64>,
}

/// Display band for a liquidity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityBand {
    /// Score above 70.
    Strong,
    /// Score above 40.
    Moderate,
    /// Anything lower.
    Weak,
}

impl LiquidityScore {
    /// Band the score for display.
    #[must_use]
    pub const fn band(&self) -> LiquidityBand {
        if self.score > 70 {
            LiquidityBand::Strong
        } else if self.score > 40 {
            LiquidityBand::Moderate
        } else {
            LiquidityBand::Weak
        }
    }
}

// =============================================================================
// Sentiment, Fundamentals, Technicals, Ownership
// =============================================================================

/// News sentiment summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSentiment {
    /// Sentiment score.
    pub score: f64,
    /// Sentiment label.
    pub sentiment: String,
    /// Number of articles scored.
    pub article_count: i64,
}

/// One reporting period of fundamentals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialDataPoint {
    /// Period date. Sent as `YYYY-MM-DD`, read as midnight UTC.
    pub date: DateTime<Utc>,
    /// Revenue for the period.
    pub revenue: f64,
    /// Net income for the period.
    pub net_income: f64,
}

/// Technical analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    /// Trend label.
    pub trend: Option<String>,
    /// Indicator values keyed by name; values may be null.
    pub indicators: Option<BTreeMap<String, Option<f64>>>,
    /// Discrete trading signals.
    pub signals: Option<Vec<TechnicalSignal>>,
    /// Backend-side failure message.
    pub error: Option<String>,
}

/// A discrete technical signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechnicalSignal {
    /// Signal name.
    pub signal: String,
    /// Sentiment of the signal.
    pub sentiment: String,
    /// Explanation.
    pub description: String,
}

/// Institutional ownership summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalOwnership {
    /// Largest holders.
    pub top_holders: Option<Vec<Holder>>,
    /// Share of float held by the top holders.
    pub concentration: Option<f64>,
}

/// An institutional holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    /// Institution name.
    pub name: String,
    /// Market value held.
    pub value_held: f64,
    /// Change in share count since the prior filing.
    pub change_in_shares: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn liquidity(score: i64) -> LiquidityScore {
        LiquidityScore {
            score,
            spread: "0.02".to_string(),
            spread_pct: None,
        }
    }

    #[test]
    fn liquidity_bands() {
        assert_eq!(liquidity(71).band(), LiquidityBand::Strong);
        assert_eq!(liquidity(70).band(), LiquidityBand::Moderate);
        assert_eq!(liquidity(41).band(), LiquidityBand::Moderate);
        assert_eq!(liquidity(40).band(), LiquidityBand::Weak);
    }

    #[test]
    fn insider_outlook_defaults_to_neutral() {
        let activity = InsiderActivity {
            sentiment: "Mixed".to_string(),
            recent_buys: 0.0,
            recent_sells: 0.0,
        };
        assert_eq!(activity.outlook(), InsiderOutlook::Neutral);
    }

    #[test]
    fn unknown_severity_label_is_tolerated() {
        let detail: RiskDetail = serde_json::from_str(
            r#"{"metric":"dilution","score":null,"insight":"n/a","severity":"Critical"}"#,
        )
        .unwrap();
        assert_eq!(detail.severity, Severity::Unknown);
    }

    #[test]
    fn null_indicator_values_decode() {
        let technicals: TechnicalAnalysis =
            serde_json::from_str(r#"{"trend":"Up","indicators":{"rsi":55.0,"macd":null}}"#)
                .unwrap();
        let indicators = technicals.indicators.unwrap();
        assert_eq!(indicators.get("rsi"), Some(&Some(55.0)));
        assert_eq!(indicators.get("macd"), Some(&None));
    }
}
