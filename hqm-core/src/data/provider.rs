//! Price-history lookup trait and structured error types.
//!
//! The pipeline never talks to a market-data vendor directly. The trend
//! extension stage asks a `PriceHistoryProvider` for recent closes, so Yahoo,
//! CSV files and in-memory fixtures can be swapped freely and mocked in tests.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::Ticker;

/// Ticker → closing prices, oldest first.
pub type ClosingPrices = HashMap<Ticker, Vec<f64>>;

/// Errors a provider may report for a whole lookup.
///
/// These are designed to be displayable in both log lines and CLI output.
/// The pipeline recovers from all of them by leaving trend data undefined.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("price history I/O error: {0}")]
    Io(String),

    #[error("price history error: {0}")]
    Other(String),
}

/// Source of short-term closing prices.
///
/// Implementations resolve as many tickers as they can and omit the rest;
/// a missing ticker is not an error. `Err` is reserved for failures that make
/// the whole lookup unusable (network down, provider ban).
pub trait PriceHistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch recent daily closes for a batch of tickers.
    fn closing_prices(&self, tickers: &[&str]) -> Result<ClosingPrices, HistoryError>;
}

/// In-memory provider backed by a fixed map. Useful for tests, replays and
/// synthetic runs.
#[derive(Debug, Clone, Default)]
pub struct StaticHistoryProvider {
    closes: ClosingPrices,
}

impl StaticHistoryProvider {
    pub fn new(closes: ClosingPrices) -> Self {
        Self { closes }
    }

    pub fn insert(&mut self, ticker: impl Into<Ticker>, closes: Vec<f64>) {
        self.closes.insert(ticker.into(), closes);
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl PriceHistoryProvider for StaticHistoryProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn closing_prices(&self, tickers: &[&str]) -> Result<ClosingPrices, HistoryError> {
        Ok(tickers
            .iter()
            .filter_map(|&t| self.closes.get(t).map(|c| (t.to_string(), c.clone())))
            .collect())
    }
}
