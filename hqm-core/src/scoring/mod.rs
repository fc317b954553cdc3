//! Scoring: raw returns → percentiles → composite HQM score.

pub mod composite;
pub mod percentile;

pub use composite::composite_score;
pub use percentile::{mean_rank_percentiles, score_universe, timeframe_percentiles};
