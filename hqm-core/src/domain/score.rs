//! Percentile and composite scores.

use serde::{Deserialize, Serialize};

use super::snapshot::Timeframe;
use crate::rounding::serde_round;

/// Population-relative percentile (0–100) per timeframe for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileScore {
    #[serde(serialize_with = "serde_round::dp1")]
    pub pct_1m: f64,
    #[serde(serialize_with = "serde_round::dp1")]
    pub pct_3m: f64,
    #[serde(serialize_with = "serde_round::dp1")]
    pub pct_6m: f64,
    #[serde(serialize_with = "serde_round::dp1")]
    pub pct_1y: f64,
}

impl PercentileScore {
    /// Build from values in `Timeframe::ALL` order.
    pub fn from_values(values: [f64; 4]) -> Self {
        Self {
            pct_1m: values[0],
            pct_3m: values[1],
            pct_6m: values[2],
            pct_1y: values[3],
        }
    }

    pub fn get(&self, timeframe: Timeframe) -> f64 {
        self.values()[timeframe.index()]
    }

    pub fn values(&self) -> [f64; 4] {
        [self.pct_1m, self.pct_3m, self.pct_6m, self.pct_1y]
    }
}

/// Quality-momentum score for one ticker.
///
/// Invariant: `0 <= min_percentile <= hqm_score <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Mean of the four timeframe percentiles.
    #[serde(serialize_with = "serde_round::dp1")]
    pub hqm_score: f64,
    /// Weakest timeframe percentile.
    #[serde(serialize_with = "serde_round::dp1")]
    pub min_percentile: f64,
}
