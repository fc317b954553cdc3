//! Candidate selection — rank by HQM score and cap the pool.
//!
//! Ordering is a stable sort on `hqm_score` descending: tickers with equal
//! scores keep their original snapshot order, so the same input always yields
//! the same pool.

use tracing::debug;

use crate::domain::Candidate;

#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector {
    num_positions: usize,
    multiplier: f64,
}

impl CandidateSelector {
    pub fn new(num_positions: usize, multiplier: f64) -> Self {
        Self {
            num_positions,
            multiplier,
        }
    }

    /// `min(floor(num_positions × multiplier), survivors)`.
    pub fn pool_size(&self, survivors: usize) -> usize {
        let target = (self.num_positions as f64 * self.multiplier).floor() as usize;
        target.min(survivors)
    }

    /// Sort by score and truncate to the pool size.
    pub fn select(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        rank_by_score(&mut candidates);
        let pool = self.pool_size(candidates.len());
        candidates.truncate(pool);
        debug!(
            multiplier = self.multiplier,
            pool,
            "candidate pool selected"
        );
        candidates
    }

    /// Final cut to `num_positions`, preserving the existing order.
    pub fn finalize(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.truncate(self.num_positions);
        candidates
    }
}

/// Stable sort, highest `hqm_score` first.
pub fn rank_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.hqm_score().total_cmp(&a.hqm_score()));
}
