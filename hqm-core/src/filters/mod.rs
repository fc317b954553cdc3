//! Candidate filters — remove tickers between scoring and sizing.
//!
//! Each filter consumes the candidate list, keeps the survivors in their
//! original order, and reports how many it removed so the pipeline can build
//! its stage-by-stage summary.

pub mod quality;
pub mod trend_extension;

pub use quality::QualityFilter;
pub use trend_extension::{sma_latest, trend_distance, TrendExtensionFilter, SMA_PERIOD};

use crate::domain::Candidate;

/// Survivors of one filter stage plus the number removed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<Candidate>,
    pub removed: usize,
}

/// Trait for candidate filters.
///
/// # Architecture invariant
/// Filters never reorder candidates and never add new ones; ordering is the
/// selector's job.
pub trait CandidateFilter {
    /// Human-readable name (e.g., "quality", "trend_extension").
    fn name(&self) -> &str;

    /// Split `candidates` into survivors and a removal count.
    fn apply(&self, candidates: Vec<Candidate>) -> FilterOutcome;
}
