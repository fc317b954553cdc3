//! Price-history collaborators

pub mod provider;

pub use provider::{ClosingPrices, HistoryError, PriceHistoryProvider, StaticHistoryProvider};
