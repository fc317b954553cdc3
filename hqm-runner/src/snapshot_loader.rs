//! Snapshot loading for the runner.
//!
//! Reads one or more CSV exports (typically one per exchange) into the
//! immutable snapshot collection the pipeline consumes. Loading policy:
//! 1. Files are read in the order given and concatenated
//! 2. A ticker seen twice keeps its first row
//! 3. Rows with a blank ticker, or a missing or non-finite price or return, are dropped
//!
//! Expected header:
//! `ticker,exchange,market_cap,price,return_1m,return_3m,return_6m,return_1y`
//! with returns as fractions. An empty cell means undefined.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use hqm_core::{Exchange, StockSnapshot};

/// Errors from the snapshot loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no snapshot files given")]
    NoInputs,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot row in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    ticker: String,
    #[serde(default)]
    exchange: String,
    market_cap: Option<f64>,
    price: Option<f64>,
    return_1m: Option<f64>,
    return_3m: Option<f64>,
    return_6m: Option<f64>,
    return_1y: Option<f64>,
}

impl SnapshotRow {
    fn into_snapshot(self) -> Option<StockSnapshot> {
        let price = finite(self.price)?;
        let mut snapshot = StockSnapshot::new(
            self.ticker.trim().to_ascii_uppercase(),
            Exchange::from(self.exchange),
            price,
        );
        snapshot.market_cap = finite(self.market_cap).filter(|cap| *cap > 0.0);
        snapshot.return_1m = finite(self.return_1m);
        snapshot.return_3m = finite(self.return_3m);
        snapshot.return_6m = finite(self.return_6m);
        snapshot.return_1y = finite(self.return_1y);
        snapshot.is_complete().then_some(snapshot)
    }
}

/// `NaN`/`inf` cells count as undefined.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Provenance and data-quality counts for a loaded universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseStats {
    pub rows_read: usize,
    pub duplicates_removed: usize,
    pub incomplete_removed: usize,
    pub loaded: usize,
    /// Loaded tickers per exchange, sorted by exchange name.
    pub per_exchange: BTreeMap<String, usize>,
    /// BLAKE3 over the loaded snapshots, in load order.
    pub universe_hash: String,
    /// Hours since the newest input file was modified (`None` for in-memory data).
    pub data_age_hours: Option<f64>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub snapshots: Vec<StockSnapshot>,
    pub stats: UniverseStats,
}

/// Load and merge snapshot CSV files.
pub fn load_snapshots(paths: &[PathBuf]) -> Result<LoadedUniverse, LoadError> {
    if paths.is_empty() {
        return Err(LoadError::NoInputs);
    }

    let mut rows = Vec::new();
    let mut newest: Option<SystemTime> = None;
    for path in paths {
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        if let Ok(modified) = file.metadata().and_then(|m| m.modified()) {
            newest = Some(newest.map_or(modified, |n| n.max(modified)));
        }
        let parsed = read_rows(file, path)?;
        debug!(path = %path.display(), rows = parsed.len(), "snapshot file read");
        rows.extend(parsed);
    }

    let sources = paths.iter().map(|p| p.display().to_string()).collect();
    let mut universe = build_universe(rows, sources);
    universe.stats.data_age_hours = newest.map(age_hours);

    info!(
        loaded = universe.stats.loaded,
        duplicates_removed = universe.stats.duplicates_removed,
        incomplete_removed = universe.stats.incomplete_removed,
        data_age_hours = ?universe.stats.data_age_hours,
        "snapshot universe loaded"
    );
    Ok(universe)
}

/// Parse snapshots from in-memory CSV text (no file provenance).
pub fn load_snapshots_from_str(data: &str) -> Result<LoadedUniverse, LoadError> {
    let rows = read_rows(data.as_bytes(), Path::new("<memory>"))?;
    Ok(build_universe(rows, vec!["<memory>".into()]))
}

/// Wrap an already-built collection (synthetic or test data).
pub fn universe_from_snapshots(snapshots: Vec<StockSnapshot>, source: &str) -> LoadedUniverse {
    let stats = UniverseStats {
        rows_read: snapshots.len(),
        duplicates_removed: 0,
        incomplete_removed: 0,
        loaded: snapshots.len(),
        per_exchange: exchange_counts(&snapshots),
        universe_hash: universe_hash(&snapshots),
        data_age_hours: None,
        sources: vec![source.to_string()],
    };
    LoadedUniverse { snapshots, stats }
}

fn read_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<SnapshotRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader
        .deserialize()
        .collect::<Result<Vec<SnapshotRow>, _>>()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn build_universe(rows: Vec<SnapshotRow>, sources: Vec<String>) -> LoadedUniverse {
    let rows_read = rows.len();
    let mut seen = HashSet::with_capacity(rows_read);
    let mut duplicates_removed = 0;
    let mut incomplete_removed = 0;
    let mut snapshots = Vec::with_capacity(rows_read);

    for row in rows {
        let ticker = row.ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            incomplete_removed += 1;
            continue;
        }
        if !seen.insert(ticker.clone()) {
            duplicates_removed += 1;
            continue;
        }
        match row.into_snapshot() {
            Some(snapshot) => snapshots.push(snapshot),
            None => incomplete_removed += 1,
        }
    }

    if duplicates_removed > 0 {
        warn!(duplicates_removed, "duplicate tickers dropped (first occurrence kept)");
    }

    let stats = UniverseStats {
        rows_read,
        duplicates_removed,
        incomplete_removed,
        loaded: snapshots.len(),
        per_exchange: exchange_counts(&snapshots),
        universe_hash: universe_hash(&snapshots),
        data_age_hours: None,
        sources,
    };
    LoadedUniverse { snapshots, stats }
}

fn exchange_counts(snapshots: &[StockSnapshot]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for snapshot in snapshots {
        *counts.entry(snapshot.exchange.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Deterministic BLAKE3 hash over the snapshot collection.
///
/// Covers tickers, exchanges and every numeric field in collection order;
/// order matters because it breaks score ties.
pub fn universe_hash(snapshots: &[StockSnapshot]) -> String {
    let mut hasher = blake3::Hasher::new();
    for s in snapshots {
        hasher.update(s.ticker.as_bytes());
        hasher.update(s.exchange.as_str().as_bytes());
        hasher.update(&s.price.to_le_bytes());
        hasher.update(&s.market_cap.unwrap_or(f64::NAN).to_le_bytes());
        for r in [s.return_1m, s.return_3m, s.return_6m, s.return_1y] {
            hasher.update(&r.unwrap_or(f64::NAN).to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

fn age_hours(modified: SystemTime) -> f64 {
    let modified: DateTime<Utc> = modified.into();
    let age = Utc::now().signed_duration_since(modified);
    (age.num_seconds().max(0) as f64) / 3600.0
}
