//! Quality (consistency) filter.
//!
//! A high mean score driven by one outlier timeframe is not quality momentum.
//! Every timeframe percentile must reach the threshold, which is the same as
//! requiring `min_percentile >= threshold`.

use tracing::debug;

use super::{CandidateFilter, FilterOutcome};
use crate::domain::Candidate;

#[derive(Debug, Clone, Copy)]
pub struct QualityFilter {
    threshold: f64,
}

impl QualityFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn passes(&self, candidate: &Candidate) -> bool {
        candidate.min_percentile() >= self.threshold
    }
}

impl CandidateFilter for QualityFilter {
    fn name(&self) -> &str {
        "quality"
    }

    fn apply(&self, candidates: Vec<Candidate>) -> FilterOutcome {
        let before = candidates.len();
        let kept: Vec<Candidate> = candidates.into_iter().filter(|c| self.passes(c)).collect();
        let removed = before - kept.len();
        debug!(
            threshold = self.threshold,
            before,
            after = kept.len(),
            removed,
            "quality filter applied"
        );
        FilterOutcome { kept, removed }
    }
}
