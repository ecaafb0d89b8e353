//! Content records served by the advisory backend.
//!
//! These are pure data-transfer types. Each one declares its wire schema with
//! serde attributes; the only behavior is derived display data.

mod analysis;
mod catalyst;
mod idea;
mod performance;
mod watchlist;

pub use analysis::{
    AnalysisHub, FinancialDataPoint, Holder, InsiderActivity, InsiderOutlook,
    InstitutionalOwnership, LiquidityBand, LiquidityScore, NewsSentiment, PLAIN_DATE_FIELDS,
    RiskAnalysis, RiskDetail, Severity, TechnicalAnalysis, TechnicalSignal,
};
pub use catalyst::{CatalystKind, EventCatalyst, ImpactLevel, sort_newest_first};
pub use idea::{RiskLevel, StockIdea, upside};
pub use performance::{PerformanceRecord, PositionStatus, Scorecard};
pub use watchlist::{WatchlistAction, WatchlistUpdate};
