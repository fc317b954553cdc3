//! Typed pipeline errors.
//!
//! Every failure the caller can act on is one of two kinds: the request was
//! malformed (`ValidationError`, raised before any computation) or the data
//! could not support a portfolio (`InsufficientDataError`).

use thiserror::Error;

use crate::domain::Timeframe;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("portfolio size must be at least {min} (got {value})")]
    PortfolioTooSmall { value: f64, min: f64 },

    #[error("number of positions must be between {min} and {max} (got {value})")]
    PositionsOutOfRange { value: usize, min: usize, max: usize },

    #[error("quality threshold must be within 0..=100 (got {0})")]
    QualityThresholdOutOfRange(f64),

    #[error("max trend extension must be a finite percentage (got {0})")]
    InvalidTrendExtension(f64),

    #[error("{name} must be a finite value >= 1.0 (got {value})")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("trend batch size must be at least 1")]
    ZeroBatchSize,

    #[error("snapshot '{ticker}' has no {timeframe} return")]
    IncompleteSnapshot { ticker: String, timeframe: Timeframe },

    #[error("snapshot '{ticker}' has a non-finite {field}")]
    NonFiniteValue { ticker: String, field: &'static str },

    #[error("ticker '{0}' appears more than once in the snapshot collection")]
    DuplicateTicker(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsufficientDataError {
    #[error("snapshot collection is empty; refresh market data first")]
    EmptyUniverse,

    #[error(
        "no ticker out of {scanned} reached the {threshold} percentile in every timeframe; \
         lower the quality threshold or widen the universe"
    )]
    NoQualitySurvivors { scanned: usize, threshold: f64 },

    #[error("every candidate was removed before sizing; relax the trend extension limit")]
    EmptySelection,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient data: {0}")]
    InsufficientData(#[from] InsufficientDataError),
}
