//! HQM Core — High Quality Momentum scoring, filtering and sizing.
//!
//! This crate contains the pure pipeline:
//! - Domain types (snapshots, percentile and composite scores, candidates, positions)
//! - Mean-rank percentile scoring per timeframe and the composite HQM score
//! - Quality and trend-extension filters
//! - Candidate selection and equal-weight position sizing
//! - The `PriceHistoryProvider` seam for the trend filter
//!
//! Nothing here performs I/O. Fetching, persistence and presentation live in
//! `hqm-runner` and `hqm-cli`.

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod result;
pub mod rounding;
pub mod scoring;
pub mod selection;
pub mod sizers;

pub use config::PipelineConfig;
pub use data::{ClosingPrices, HistoryError, PriceHistoryProvider, StaticHistoryProvider};
pub use domain::{
    Candidate, CompositeScore, Exchange, PercentileScore, Position, StockSnapshot, Timeframe,
};
pub use error::{InsufficientDataError, PipelineError, ValidationError};
pub use pipeline::{run_pipeline, Pipeline};
pub use result::{PortfolioResult, Summary};
