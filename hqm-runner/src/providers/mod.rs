//! Price-history providers for the trend-extension stage.
//!
//! `hqm-core` defines the `PriceHistoryProvider` seam; these are the concrete
//! sources a scan can plug in. `StaticHistoryProvider` (in core) covers tests
//! and synthetic runs.

pub mod circuit_breaker;
pub mod csv_history;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_history::CsvHistoryProvider;
pub use yahoo::{YahooConfig, YahooHistoryProvider};
