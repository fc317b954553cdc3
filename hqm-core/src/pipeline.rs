//! Pipeline — snapshots in, sized portfolio out.
//!
//! Stage order is fixed:
//!
//! ```text
//! validate → percentiles → composite → quality → select pool
//!          → trend extension → truncate to N → size
//! ```
//!
//! Every stage is a pure transformation over the previous stage's output.
//! The only external call is the optional price-history lookup made by the
//! trend stage, and its failures never abort the run.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::data::PriceHistoryProvider;
use crate::domain::{Candidate, StockSnapshot, Timeframe};
use crate::error::{InsufficientDataError, PipelineError, ValidationError};
use crate::filters::{CandidateFilter, QualityFilter, TrendExtensionFilter};
use crate::result::{PortfolioResult, Summary};
use crate::scoring::{composite_score, score_universe};
use crate::selection::CandidateSelector;
use crate::sizers::{EqualWeightSizer, Sizer};

/// A configured pipeline, reusable across snapshot collections.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    history: Option<&'a dyn PriceHistoryProvider>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            history: None,
        }
    }

    pub fn with_history(mut self, history: &'a dyn PriceHistoryProvider) -> Self {
        self.history = Some(history);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, snapshots: &[StockSnapshot]) -> Result<PortfolioResult, PipelineError> {
        let config = &self.config;
        config.validate()?;
        if snapshots.is_empty() {
            return Err(InsufficientDataError::EmptyUniverse.into());
        }
        validate_snapshots(snapshots)?;

        let total_scanned = snapshots.len();
        info!(
            total_scanned,
            num_positions = config.num_positions,
            portfolio_size = config.portfolio_size,
            "running hqm pipeline"
        );

        // Scoring
        let percentiles = score_universe(snapshots)?;
        let candidates: Vec<Candidate> = snapshots
            .iter()
            .zip(percentiles)
            .map(|(snapshot, pct)| {
                let score = composite_score(&pct);
                Candidate::new(snapshot.clone(), pct, score)
            })
            .collect();

        // Quality
        let quality = QualityFilter::new(config.quality_threshold).apply(candidates);
        let after_quality_filter = quality.kept.len();
        if after_quality_filter == 0 {
            return Err(InsufficientDataError::NoQualitySurvivors {
                scanned: total_scanned,
                threshold: config.quality_threshold,
            }
            .into());
        }

        // Selection
        let selector = CandidateSelector::new(config.num_positions, config.candidate_multiplier());
        let pool = selector.select(quality.kept);
        let candidate_pool = pool.len();

        // Trend extension
        let trend = TrendExtensionFilter::new(
            self.history,
            config.max_trend_extension,
            config.trend_batch_size,
        );
        let (survivors, filtered_by_trend, missing_trend_data) =
            if self.history.is_some() || trend.is_active() {
                let outcome = trend.apply(pool);
                let missing = if self.history.is_some() {
                    outcome.kept.iter().filter(|c| c.trend_distance.is_none()).count()
                } else {
                    0
                };
                (outcome.kept, outcome.removed, missing)
            } else {
                (pool, 0, 0)
            };

        let selection = selector.finalize(survivors);
        if selection.is_empty() {
            return Err(InsufficientDataError::EmptySelection.into());
        }

        // Sizing
        let sizer = EqualWeightSizer::new();
        let allocation = sizer.allocate(config.portfolio_size, selection)?;

        let summary = Summary {
            total_scanned,
            after_quality_filter,
            filtered_by_quality: quality.removed,
            candidate_pool,
            filtered_by_trend,
            missing_trend_data,
            selected: allocation.positions.len(),
            portfolio_size: config.portfolio_size,
            allocation_per_stock: allocation.allocation_per_stock,
            total_invested: allocation.total_invested,
            cash_remaining: allocation.cash_remaining,
            config: config.clone(),
        };
        info!(
            selected = summary.selected,
            filtered_by_quality = summary.filtered_by_quality,
            filtered_by_trend = summary.filtered_by_trend,
            total_invested = summary.total_invested,
            cash_remaining = summary.cash_remaining,
            sizer = sizer.name(),
            "hqm pipeline complete"
        );

        Ok(PortfolioResult {
            positions: allocation.positions,
            summary,
        })
    }
}

/// Convenience entry point: build a [`Pipeline`] and run it once.
pub fn run_pipeline(
    snapshots: &[StockSnapshot],
    config: &PipelineConfig,
    history: Option<&dyn PriceHistoryProvider>,
) -> Result<PortfolioResult, PipelineError> {
    let mut pipeline = Pipeline::new(config.clone());
    if let Some(history) = history {
        pipeline = pipeline.with_history(history);
    }
    pipeline.run(snapshots)
}

/// Reject duplicate tickers, missing returns and non-finite numbers.
pub fn validate_snapshots(snapshots: &[StockSnapshot]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(snapshots.len());
    for snapshot in snapshots {
        if !seen.insert(snapshot.ticker.as_str()) {
            return Err(ValidationError::DuplicateTicker(snapshot.ticker.clone()));
        }
        if !snapshot.price.is_finite() {
            return Err(non_finite(snapshot, "price"));
        }
        if snapshot.market_cap.is_some_and(|cap| !cap.is_finite()) {
            return Err(non_finite(snapshot, "market_cap"));
        }
        for timeframe in Timeframe::ALL {
            match snapshot.return_for(timeframe) {
                None => {
                    return Err(ValidationError::IncompleteSnapshot {
                        ticker: snapshot.ticker.clone(),
                        timeframe,
                    })
                }
                Some(r) if !r.is_finite() => return Err(non_finite(snapshot, return_field(timeframe))),
                Some(_) => {}
            }
        }
    }
    debug!(count = snapshots.len(), "snapshots validated");
    Ok(())
}

fn non_finite(snapshot: &StockSnapshot, field: &'static str) -> ValidationError {
    ValidationError::NonFiniteValue {
        ticker: snapshot.ticker.clone(),
        field,
    }
}

fn return_field(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::OneMonth => "return_1m",
        Timeframe::ThreeMonths => "return_3m",
        Timeframe::SixMonths => "return_6m",
        Timeframe::OneYear => "return_1y",
    }
}
