//! Track record of published ideas.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a published idea is still being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Still open.
    Open,
    /// Closed out.
    Closed,
}

/// Outcome of one published idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Backend identifier.
    pub id: Uuid,
    /// Ticker symbol.
    pub ticker: String,
    /// When the idea was published.
    pub publication_date: Option<DateTime<Utc>>,
    /// Open or closed.
    pub status: PositionStatus,
    /// Return since publication, as a fraction.
    pub return_pct: Option<f64>,
}

/// Summary of the published track record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scorecard {
    /// Records, newest publication first; undated records last.
    pub history: Vec<PerformanceRecord>,
    /// Mean return over records that report one.
    pub average_return: f64,
    /// Share of reporting records with a positive return.
    pub win_rate: f64,
}

impl Scorecard {
    /// Build the scorecard from raw records.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(mut records: Vec<PerformanceRecord>) -> Self {
        records.sort_by(|a, b| newest_first(a.publication_date, b.publication_date));

        let returns: Vec<f64> = records.iter().filter_map(|r| r.return_pct).collect();
        if returns.is_empty() {
            return Self {
                history: records,
                ..Self::default()
            };
        }

        let count = returns.len() as f64;
        let average_return = returns.iter().sum::<f64>() / count;
        let wins = returns.iter().filter(|r| **r > 0.0).count();

        Self {
            history: records,
            average_return,
            win_rate: wins as f64 / count,
        }
    }
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
