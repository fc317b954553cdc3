//! Scan runner — wires together snapshot loading, price history and the core pipeline.
//!
//! Two entry points:
//! - `run_scan()`: takes a loaded universe and an optional provider. No file I/O.
//! - `build_history_provider()`: picks the provider a `ScanConfig` asks for.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use hqm_core::{run_pipeline, PipelineConfig, PipelineError, PortfolioResult, PriceHistoryProvider};

use crate::config::{ConfigError, ScanConfig, TrendSource};
use crate::providers::{CircuitBreaker, CsvHistoryProvider, YahooConfig, YahooHistoryProvider};
use crate::snapshot_loader::{LoadError, LoadedUniverse, UniverseStats};

/// Errors from the scan runner.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("price history provider unavailable: {0}")]
    Provider(#[from] hqm_core::HistoryError),
    #[error("failed to fingerprint scan: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted scan reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Characters of the scan id shown in tables and directory names.
pub const SHORT_ID_LEN: usize = 12;

/// Complete, self-describing record of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 of universe hash, pipeline config and scan time.
    pub scan_id: String,
    pub scanned_at: DateTime<Utc>,
    pub universe: UniverseStats,
    /// Name of the price-history provider, if any.
    pub history_provider: Option<String>,
    pub result: PortfolioResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ScanReport {
    /// First 12 chars of the scan id, for directory names and tables.
    pub fn short_id(&self) -> &str {
        short_scan_id(&self.scan_id)
    }
}

/// Leading `SHORT_ID_LEN` characters of a scan id, cut on a char boundary.
pub fn short_scan_id(scan_id: &str) -> &str {
    match scan_id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &scan_id[..end],
        None => scan_id,
    }
}

/// Run the pipeline over a loaded universe and wrap the result in a report.
pub fn run_scan(
    universe: &LoadedUniverse,
    config: &PipelineConfig,
    history: Option<&dyn PriceHistoryProvider>,
) -> Result<ScanReport, ScanError> {
    let scanned_at = Utc::now();
    let scan_id = scan_id(&universe.stats.universe_hash, config, scanned_at)?;

    info!(
        scan_id = short_scan_id(&scan_id),
        tickers = universe.snapshots.len(),
        provider = history.map(|h| h.name()),
        "starting scan"
    );

    let result = run_pipeline(&universe.snapshots, config, history)?;

    Ok(ScanReport {
        schema_version: SCHEMA_VERSION,
        scan_id,
        scanned_at,
        universe: universe.stats.clone(),
        history_provider: history.map(|h| h.name().to_string()),
        result,
    })
}

/// Deterministic scan identifier.
pub fn scan_id(
    universe_hash: &str,
    config: &PipelineConfig,
    scanned_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(universe_hash.as_bytes());
    hasher.update(serde_json::to_string(config)?.as_bytes());
    hasher.update(scanned_at.to_rfc3339().as_bytes());
    Ok(hasher.finalize().to_hex().to_string())
}

/// Build the price-history provider selected in `config.trend`.
///
/// Returns `None` for `TrendSource::None`; the pipeline then skips lookups.
pub fn build_history_provider(
    config: &ScanConfig,
) -> Result<Option<Box<dyn PriceHistoryProvider>>, ScanError> {
    match config.trend.source {
        TrendSource::None => Ok(None),
        TrendSource::Csv => {
            let path = config
                .trend
                .closes_path
                .as_ref()
                .ok_or(ConfigError::MissingClosesPath)?;
            Ok(Some(Box::new(CsvHistoryProvider::from_file(path)?)))
        }
        TrendSource::Yahoo => {
            let yahoo = YahooConfig {
                range: config.trend.range.clone(),
                ..YahooConfig::default()
            };
            let provider = YahooHistoryProvider::new(Arc::new(CircuitBreaker::default()), yahoo)?;
            Ok(Some(Box::new(provider)))
        }
    }
}
