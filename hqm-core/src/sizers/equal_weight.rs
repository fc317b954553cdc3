//! Equal-weight sizer
//!
//! Every selected candidate receives `portfolio_size / N` of capital, bought
//! in whole shares. Weight is equal by count (`100 / N`), not by invested value.

use tracing::debug;

use crate::domain::{Candidate, Position};
use crate::error::InsufficientDataError;
use crate::sizers::{Allocation, Sizer};

#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeightSizer;

impl EqualWeightSizer {
    pub fn new() -> Self {
        Self
    }

    /// Whole shares affordable with `allocation`; zero for non-positive prices.
    pub fn shares_for(allocation: f64, price: f64) -> u64 {
        if price <= 0.0 || !price.is_finite() {
            return 0;
        }
        (allocation / price).floor() as u64
    }
}

impl Sizer for EqualWeightSizer {
    fn allocate(
        &self,
        portfolio_size: f64,
        selection: Vec<Candidate>,
    ) -> Result<Allocation, InsufficientDataError> {
        if selection.is_empty() {
            return Err(InsufficientDataError::EmptySelection);
        }

        let n = selection.len() as f64;
        let allocation_per_stock = portfolio_size / n;
        let weight = 100.0 / n;

        let positions: Vec<Position> = selection
            .into_iter()
            .map(|candidate| {
                let price = candidate.price();
                let shares = Self::shares_for(allocation_per_stock, price);
                let value = if shares == 0 { 0.0 } else { shares as f64 * price };
                Position {
                    ticker: candidate.ticker().to_string(),
                    price,
                    shares,
                    value,
                    weight,
                    candidate,
                }
            })
            .collect();

        let total_invested: f64 = positions.iter().map(|p| p.value).sum();
        let cash_remaining = portfolio_size - total_invested;

        debug!(
            positions = positions.len(),
            allocation_per_stock,
            total_invested,
            cash_remaining,
            "equal-weight allocation complete"
        );

        Ok(Allocation {
            positions,
            allocation_per_stock,
            total_invested,
            cash_remaining,
        })
    }

    fn name(&self) -> &str {
        "equal_weight"
    }
}
