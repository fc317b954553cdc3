//! Composite HQM score: mean and minimum of the timeframe percentiles.

use crate::domain::{CompositeScore, PercentileScore};

/// Combine the four timeframe percentiles.
///
/// `hqm_score` rewards strength on average; `min_percentile` exposes the weakest
/// timeframe so a single outlier period cannot carry a ticker.
pub fn composite_score(percentiles: &PercentileScore) -> CompositeScore {
    let values = percentiles.values();
    let hqm_score = values.iter().sum::<f64>() / values.len() as f64;
    let min_percentile = values.iter().copied().fold(f64::INFINITY, f64::min);
    CompositeScore {
        hqm_score,
        min_percentile,
    }
}
