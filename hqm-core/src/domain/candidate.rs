//! A scored ticker moving through the filter stages.

use serde::{Deserialize, Serialize};

use super::score::{CompositeScore, PercentileScore};
use super::snapshot::StockSnapshot;
use crate::rounding::serde_round;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub snapshot: StockSnapshot,
    pub percentiles: PercentileScore,
    pub score: CompositeScore,
    /// Percent distance of the latest close above (positive) or below its
    /// 10-period SMA. `None` when not computed or when history was missing.
    #[serde(default, serialize_with = "serde_round::opt_dp2")]
    pub trend_distance: Option<f64>,
}

impl Candidate {
    pub fn new(snapshot: StockSnapshot, percentiles: PercentileScore, score: CompositeScore) -> Self {
        Self {
            snapshot,
            percentiles,
            score,
            trend_distance: None,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.snapshot.ticker
    }

    pub fn price(&self) -> f64 {
        self.snapshot.price
    }

    pub fn hqm_score(&self) -> f64 {
        self.score.hqm_score
    }

    pub fn min_percentile(&self) -> f64 {
        self.score.min_percentile
    }
}
