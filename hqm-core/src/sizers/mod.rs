//! Position Sizers — turn the final selection into share counts
//!
//! Sizers translate a capital budget into whole-share positions.
//! They are score-agnostic: ranking and filtering are finished before a sizer runs.

pub mod equal_weight;

pub use equal_weight::EqualWeightSizer;

use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, Position};
use crate::error::InsufficientDataError;
use crate::rounding::serde_round;

/// Sized positions plus the cash bookkeeping for one portfolio.
///
/// Totals are kept at full precision so that
/// `total_invested + cash_remaining == portfolio_size` holds exactly;
/// rounding happens only when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub positions: Vec<Position>,
    #[serde(serialize_with = "serde_round::dp2")]
    pub allocation_per_stock: f64,
    #[serde(serialize_with = "serde_round::dp2")]
    pub total_invested: f64,
    #[serde(serialize_with = "serde_round::dp2")]
    pub cash_remaining: f64,
}

/// Position sizing logic
///
/// # Responsibilities
/// - Split `portfolio_size` across every selected candidate
/// - Convert each slice into whole shares at the candidate's price
///
/// # Non-Responsibilities
/// - Sizers do NOT drop candidates (a zero-share position is still a position)
/// - Sizers do NOT reorder candidates
pub trait Sizer: Send + Sync {
    /// Size the selection. Fails only when `selection` is empty.
    fn allocate(
        &self,
        portfolio_size: f64,
        selection: Vec<Candidate>,
    ) -> Result<Allocation, InsufficientDataError>;

    /// Sizer name for summary/logging
    fn name(&self) -> &str;
}
