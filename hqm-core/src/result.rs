//! Pipeline output — the sized portfolio plus a stage-by-stage summary.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::domain::Position;
use crate::rounding::serde_round;

/// Counts surviving each stage, cash totals, and the configuration applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_scanned: usize,
    pub after_quality_filter: usize,
    pub filtered_by_quality: usize,
    /// Size of the ranked pool handed to the trend filter.
    pub candidate_pool: usize,
    pub filtered_by_trend: usize,
    /// Pool members without a usable trend distance (kept, fail-open).
    pub missing_trend_data: usize,
    pub selected: usize,
    #[serde(serialize_with = "serde_round::dp2")]
    pub portfolio_size: f64,
    #[serde(serialize_with = "serde_round::dp2")]
    pub allocation_per_stock: f64,
    #[serde(serialize_with = "serde_round::dp2")]
    pub total_invested: f64,
    #[serde(serialize_with = "serde_round::dp2")]
    pub cash_remaining: f64,
    pub config: PipelineConfig,
}

/// Immutable result of one pipeline run.
///
/// `positions` are ordered by descending `hqm_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub positions: Vec<Position>,
    pub summary: Summary,
}

impl PortfolioResult {
    pub fn tickers(&self) -> Vec<&str> {
        self.positions.iter().map(|p| p.ticker.as_str()).collect()
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    /// Sum of position weights; 100 up to float error.
    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}
