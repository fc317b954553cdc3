//! HQM Runner — scan orchestration around the `hqm-core` pipeline.
//!
//! This crate builds on `hqm-core` to provide:
//! - Snapshot loading from CSV exports with dedupe and provenance
//! - Price-history providers (Yahoo chart API, CSV, in-memory)
//! - Scan reports with BLAKE3 fingerprints
//! - JSONL scan history with per-ticker daily queries
//! - JSON / CSV / Markdown export
//! - TOML configuration and logging setup
//! - Deterministic synthetic universes

pub mod config;
pub mod export;
pub mod history;
pub mod logging;
pub mod providers;
pub mod scan;
pub mod snapshot_loader;
pub mod synthetic;

pub use config::{ConfigError, ScanConfig, TrendSource};
pub use export::{
    export_json, export_positions_csv, format_market_cap, generate_report, import_json,
    load_report, save_report,
};
pub use history::{HistoryStoreError, RecordedPosition, ScanHistory, ScanRecord, TickerHistoryPoint};
pub use logging::init_logging;
pub use providers::{CircuitBreaker, CsvHistoryProvider, YahooConfig, YahooHistoryProvider};
pub use scan::{
    build_history_provider, run_scan, short_scan_id, ScanError, ScanReport, SCHEMA_VERSION,
    SHORT_ID_LEN,
};
pub use snapshot_loader::{
    load_snapshots, load_snapshots_from_str, universe_from_snapshots, universe_hash, LoadError,
    LoadedUniverse, UniverseStats,
};
pub use synthetic::{generate_universe, synthetic_closes};
