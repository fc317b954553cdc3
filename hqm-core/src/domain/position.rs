use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use crate::rounding::serde_round;

/// A sized holding in the final portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub price: f64,
    /// Whole shares to buy. Zero when the price is not positive.
    pub shares: u64,
    /// `shares × price`.
    #[serde(serialize_with = "serde_round::dp2")]
    pub value: f64,
    /// Equal share of the portfolio in percent (`100 / N`), by count not by value.
    #[serde(serialize_with = "serde_round::dp1")]
    pub weight: f64,
    /// The scored candidate this position was sized from.
    pub candidate: Candidate,
}
