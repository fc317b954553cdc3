//! Serializable scan configuration (TOML).
//!
//! Every field has a default, so an empty file is a valid configuration.
//! CLI flags override file values after loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hqm_core::config::{
    DEFAULT_NUM_POSITIONS, DEFAULT_POOL_MULTIPLIER, DEFAULT_PORTFOLIO_SIZE,
    DEFAULT_QUALITY_THRESHOLD, DEFAULT_TREND_BATCH_SIZE, DEFAULT_TREND_POOL_MULTIPLIER,
};
use hqm_core::{PipelineConfig, ValidationError};

/// Errors from loading or validating a scan configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("trend source '{0}' is not one of yahoo, csv, none")]
    UnknownTrendSource(String),

    #[error("trend source 'csv' requires a closes file")]
    MissingClosesPath,
}

/// Full scan configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    pub portfolio: PortfolioSection,
    pub filters: FilterSection,
    pub selection: SelectionSection,
    pub trend: TrendSection,
    pub history: HistorySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSection {
    pub size: f64,
    pub num_positions: usize,
}

impl Default for PortfolioSection {
    fn default() -> Self {
        Self {
            size: DEFAULT_PORTFOLIO_SIZE,
            num_positions: DEFAULT_NUM_POSITIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub quality_threshold: f64,
    /// Percent above the 10-day SMA; omit to disable trend filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trend_extension: Option<f64>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            max_trend_extension: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSection {
    pub pool_multiplier: f64,
    pub trend_pool_multiplier: f64,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            pool_multiplier: DEFAULT_POOL_MULTIPLIER,
            trend_pool_multiplier: DEFAULT_TREND_POOL_MULTIPLIER,
        }
    }
}

/// Where closing prices for the trend filter come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSource {
    Yahoo,
    Csv,
    None,
}

impl FromStr for TrendSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "csv" => Ok(Self::Csv),
            "none" => Ok(Self::None),
            other => Err(ConfigError::UnknownTrendSource(other.to_string())),
        }
    }
}

impl fmt::Display for TrendSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yahoo => "yahoo",
            Self::Csv => "csv",
            Self::None => "none",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSection {
    pub source: TrendSource,
    pub batch_size: usize,
    /// Closes CSV for `source = "csv"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closes_path: Option<PathBuf>,
    /// Yahoo chart range.
    pub range: String,
}

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            source: TrendSource::Yahoo,
            batch_size: DEFAULT_TREND_BATCH_SIZE,
            closes_path: None,
            range: "1mo".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    /// Append each scan to the JSONL history.
    pub save: bool,
    pub path: PathBuf,
    /// Directory for per-scan report folders.
    pub output_dir: PathBuf,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            save: true,
            path: PathBuf::from("data/scan_history.jsonl"),
            output_dir: PathBuf::from("data/scans"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Core pipeline configuration, validated.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let config = PipelineConfig {
            portfolio_size: self.portfolio.size,
            num_positions: self.portfolio.num_positions,
            quality_threshold: self.filters.quality_threshold,
            max_trend_extension: self.filters.max_trend_extension,
            pool_multiplier: self.selection.pool_multiplier,
            trend_pool_multiplier: self.selection.trend_pool_multiplier,
            trend_batch_size: self.trend.batch_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section requirements not covered by the core config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_pipeline_config()?;
        if self.trend.source == TrendSource::Csv && self.trend.closes_path.is_none() {
            return Err(ConfigError::MissingClosesPath);
        }
        Ok(())
    }
}
