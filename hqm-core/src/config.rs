//! Pipeline configuration and validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Smallest accepted portfolio, in account currency.
pub const MIN_PORTFOLIO_SIZE: f64 = 1_000.0;
/// Inclusive bounds on the number of positions.
pub const MIN_POSITIONS: usize = 1;
pub const MAX_POSITIONS: usize = 50;

pub const DEFAULT_PORTFOLIO_SIZE: f64 = 10_000.0;
pub const DEFAULT_NUM_POSITIONS: usize = 8;
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 25.0;
pub const DEFAULT_POOL_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_TREND_POOL_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_TREND_BATCH_SIZE: usize = 50;

/// Everything a single pipeline run needs besides its inputs.
///
/// The pool multipliers are tuned defaults; the one in effect is chosen by
/// [`PipelineConfig::candidate_multiplier`] depending on whether the trend
/// filter is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub portfolio_size: f64,
    pub num_positions: usize,
    /// Minimum percentile a ticker must reach in every timeframe.
    pub quality_threshold: f64,
    /// Maximum percent above the 10-period SMA. `None` disables trend filtering.
    pub max_trend_extension: Option<f64>,
    /// Candidate pool size relative to `num_positions` without the trend filter.
    pub pool_multiplier: f64,
    /// Candidate pool size relative to `num_positions` with the trend filter.
    pub trend_pool_multiplier: f64,
    /// Tickers per price-history lookup.
    pub trend_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            portfolio_size: DEFAULT_PORTFOLIO_SIZE,
            num_positions: DEFAULT_NUM_POSITIONS,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            max_trend_extension: None,
            pool_multiplier: DEFAULT_POOL_MULTIPLIER,
            trend_pool_multiplier: DEFAULT_TREND_POOL_MULTIPLIER,
            trend_batch_size: DEFAULT_TREND_BATCH_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn new(portfolio_size: f64, num_positions: usize) -> Self {
        Self {
            portfolio_size,
            num_positions,
            ..Self::default()
        }
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_max_trend_extension(mut self, max: Option<f64>) -> Self {
        self.max_trend_extension = max;
        self
    }

    pub fn trend_filter_enabled(&self) -> bool {
        self.max_trend_extension.is_some()
    }

    /// Pool multiplier in effect: the larger pool absorbs trend-filter attrition.
    pub fn candidate_multiplier(&self) -> f64 {
        if self.trend_filter_enabled() {
            self.trend_pool_multiplier
        } else {
            self.pool_multiplier
        }
    }

    /// Check every option. Runs before any computation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.portfolio_size.is_finite() || self.portfolio_size < MIN_PORTFOLIO_SIZE {
            return Err(ValidationError::PortfolioTooSmall {
                value: self.portfolio_size,
                min: MIN_PORTFOLIO_SIZE,
            });
        }
        if !(MIN_POSITIONS..=MAX_POSITIONS).contains(&self.num_positions) {
            return Err(ValidationError::PositionsOutOfRange {
                value: self.num_positions,
                min: MIN_POSITIONS,
                max: MAX_POSITIONS,
            });
        }
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(ValidationError::QualityThresholdOutOfRange(
                self.quality_threshold,
            ));
        }
        if let Some(max) = self.max_trend_extension {
            if !max.is_finite() {
                return Err(ValidationError::InvalidTrendExtension(max));
            }
        }
        for (name, value) in [
            ("pool_multiplier", self.pool_multiplier),
            ("trend_pool_multiplier", self.trend_pool_multiplier),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(ValidationError::InvalidMultiplier { name, value });
            }
        }
        if self.trend_batch_size == 0 {
            return Err(ValidationError::ZeroBatchSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_small_portfolio() {
        let err = PipelineConfig::new(999.99, 8).validate().unwrap_err();
        assert!(matches!(err, ValidationError::PortfolioTooSmall { .. }));
        assert!(PipelineConfig::new(1_000.0, 8).validate().is_ok());
    }

    #[test]
    fn rejects_nan_portfolio() {
        let err = PipelineConfig::new(f64::NAN, 8).validate().unwrap_err();
        assert!(matches!(err, ValidationError::PortfolioTooSmall { .. }));
    }

    #[test]
    fn positions_bounds_are_inclusive() {
        assert!(PipelineConfig::new(10_000.0, 1).validate().is_ok());
        assert!(PipelineConfig::new(10_000.0, 50).validate().is_ok());
        assert!(matches!(
            PipelineConfig::new(10_000.0, 0).validate(),
            Err(ValidationError::PositionsOutOfRange { value: 0, .. })
        ));
        assert!(matches!(
            PipelineConfig::new(10_000.0, 51).validate(),
            Err(ValidationError::PositionsOutOfRange { value: 51, .. })
        ));
    }

    #[test]
    fn multiplier_follows_trend_filter() {
        let config = PipelineConfig::default();
        assert_eq!(config.candidate_multiplier(), 1.5);
        let config = config.with_max_trend_extension(Some(15.0));
        assert_eq!(config.candidate_multiplier(), 3.0);
    }

    #[test]
    fn rejects_bad_multiplier_and_batch() {
        let mut config = PipelineConfig::default();
        config.pool_multiplier = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMultiplier { name: "pool_multiplier", .. })
        ));

        let mut config = PipelineConfig::default();
        config.trend_batch_size = 0;
        assert_eq!(config.validate(), Err(ValidationError::ZeroBatchSize));
    }

    #[test]
    fn rejects_infinite_trend_extension() {
        let config = PipelineConfig::default().with_max_trend_extension(Some(f64::INFINITY));
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTrendExtension(_))
        ));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"portfolio_size": 25000.0}"#).unwrap();
        assert_eq!(config.portfolio_size, 25_000.0);
        assert_eq!(config.num_positions, DEFAULT_NUM_POSITIONS);
        assert_eq!(config.max_trend_extension, None);
    }
}
