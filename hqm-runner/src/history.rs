//! Scan history — JSONL append-only persistence.
//!
//! Persists one `ScanRecord` per saved scan as one JSON object per line.
//! The format is resilient to partial writes and easy to stream; a malformed
//! line is skipped with a warning instead of poisoning the whole file.
//!
//! The history answers two questions: "what did recent scans buy?" and
//! "how has this ticker's HQM score moved day to day?"

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::scan::ScanReport;

#[derive(Debug, Error)]
pub enum HistoryStoreError {
    #[error("history I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode history record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One saved position, flattened for history queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPosition {
    pub ticker: String,
    pub price: f64,
    pub hqm_score: f64,
    pub pct_1m: f64,
    pub pct_3m: f64,
    pub pct_6m: f64,
    pub pct_1y: f64,
    pub shares: u64,
    pub value: f64,
    pub weight: f64,
}

/// A single history line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub scanned_at: DateTime<Utc>,
    pub portfolio_size: f64,
    pub num_positions: usize,
    pub total_invested: f64,
    pub cash_remaining: f64,
    pub positions: Vec<RecordedPosition>,
}

impl ScanRecord {
    pub fn short_id(&self) -> &str {
        crate::scan::short_scan_id(&self.scan_id)
    }

    /// Flatten a report, rounding the way reports are displayed.
    pub fn from_report(report: &ScanReport) -> Self {
        use hqm_core::rounding::round_to;

        let summary = &report.result.summary;
        Self {
            scan_id: report.scan_id.clone(),
            scanned_at: report.scanned_at,
            portfolio_size: summary.portfolio_size,
            num_positions: summary.config.num_positions,
            total_invested: round_to(summary.total_invested, 2),
            cash_remaining: round_to(summary.cash_remaining, 2),
            positions: report
                .result
                .positions
                .iter()
                .map(|p| {
                    let pct = &p.candidate.percentiles;
                    RecordedPosition {
                        ticker: p.ticker.clone(),
                        price: p.price,
                        hqm_score: round_to(p.candidate.hqm_score(), 1),
                        pct_1m: round_to(pct.pct_1m, 1),
                        pct_3m: round_to(pct.pct_3m, 1),
                        pct_6m: round_to(pct.pct_6m, 1),
                        pct_1y: round_to(pct.pct_1y, 1),
                        shares: p.shares,
                        value: round_to(p.value, 2),
                        weight: round_to(p.weight, 1),
                    }
                })
                .collect(),
        }
    }
}

/// One day of a ticker's score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerHistoryPoint {
    pub date: NaiveDate,
    pub scan_id: String,
    pub hqm_score: f64,
    pub pct_1m: f64,
    pub pct_3m: f64,
    pub pct_6m: f64,
    pub pct_1y: f64,
    pub price: f64,
}

/// JSONL history file manager.
pub struct ScanHistory {
    path: PathBuf,
}

impl ScanHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn io_err(&self, source: io::Error) -> HistoryStoreError {
        HistoryStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Append a record, creating the file and its parent directory if needed.
    pub fn append(&self, record: &ScanRecord) -> Result<(), HistoryStoreError> {
        let json = serde_json::to_string(record)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        writeln!(file, "{json}").map_err(|e| self.io_err(e))?;
        file.flush().map_err(|e| self.io_err(e))?;

        debug!(scan_id = %record.scan_id, path = %self.path.display(), "scan appended to history");
        Ok(())
    }

    /// Read all records in file order. Skips malformed lines.
    pub fn read_all(&self) -> Result<Vec<ScanRecord>, HistoryStoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path).map_err(|e| self.io_err(e))?;
        let reader = io::BufReader::new(file);
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| self.io_err(e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScanRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    error = %e,
                    "skipping malformed history line"
                ),
            }
        }

        Ok(records)
    }

    /// Most recent scans first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Result<Vec<ScanRecord>, HistoryStoreError> {
        let mut records = self.read_all()?;
        // Equal timestamps: the later append comes first.
        records.reverse();
        records.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        records.truncate(limit);
        Ok(records)
    }

    /// A ticker's daily score history, newest first, at most `days` points.
    ///
    /// When several scans ran on the same UTC date, the latest one wins.
    pub fn ticker_history(
        &self,
        ticker: &str,
        days: usize,
    ) -> Result<Vec<TickerHistoryPoint>, HistoryStoreError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        let mut by_date: BTreeMap<NaiveDate, (DateTime<Utc>, TickerHistoryPoint)> = BTreeMap::new();

        for record in self.read_all()? {
            let Some(p) = record.positions.iter().find(|p| p.ticker == ticker) else {
                continue;
            };
            let date = record.scanned_at.date_naive();
            let newer = by_date
                .get(&date)
                .map_or(true, |(seen_at, _)| record.scanned_at >= *seen_at);
            if newer {
                by_date.insert(
                    date,
                    (
                        record.scanned_at,
                        TickerHistoryPoint {
                            date,
                            scan_id: record.scan_id.clone(),
                            hqm_score: p.hqm_score,
                            pct_1m: p.pct_1m,
                            pct_3m: p.pct_3m,
                            pct_6m: p.pct_6m,
                            pct_1y: p.pct_1y,
                            price: p.price,
                        },
                    ),
                );
            }
        }

        Ok(by_date
            .into_values()
            .rev()
            .take(days)
            .map(|(_, point)| point)
            .collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn position(ticker: &str, score: f64) -> RecordedPosition {
        RecordedPosition {
            ticker: ticker.into(),
            price: 100.0,
            hqm_score: score,
            pct_1m: score,
            pct_3m: score,
            pct_6m: score,
            pct_1y: score,
            shares: 10,
            value: 1_000.0,
            weight: 50.0,
        }
    }

    fn record(id: &str, scanned_at: DateTime<Utc>, positions: Vec<RecordedPosition>) -> ScanRecord {
        ScanRecord {
            scan_id: id.into(),
            scanned_at,
            portfolio_size: 10_000.0,
            num_positions: positions.len(),
            total_invested: 1_000.0 * positions.len() as f64,
            cash_remaining: 10_000.0 - 1_000.0 * positions.len() as f64,
            positions,
        }
    }

    fn history(dir: &TempDir) -> ScanHistory {
        ScanHistory::new(dir.path().join("nested").join("history.jsonl"))
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(history(&dir).read_all().unwrap().is_empty());
        assert!(history(&dir).recent(5).unwrap().is_empty());
    }

    #[test]
    fn append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let h = history(&dir);
        let r = record("a", at(1, 10), vec![position("AAPL", 80.0)]);
        h.append(&r).unwrap();
        assert_eq!(h.read_all().unwrap(), vec![r]);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let dir = TempDir::new().unwrap();
        let h = history(&dir);
        h.append(&record("old", at(1, 10), vec![])).unwrap();
        h.append(&record("newest", at(3, 10), vec![])).unwrap();
        h.append(&record("middle", at(2, 10), vec![])).unwrap();

        let ids: Vec<String> = h.recent(2).unwrap().into_iter().map(|r| r.scan_id).collect();
        assert_eq!(ids, vec!["newest", "middle"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let h = history(&dir);
        h.append(&record("a", at(1, 10), vec![])).unwrap();
        let mut file = OpenOptions::new().append(true).open(h.path()).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(file).unwrap();
        h.append(&record("b", at(2, 10), vec![])).unwrap();

        assert_eq!(h.read_all().unwrap().len(), 2);
    }

    #[test]
    fn ticker_history_one_point_per_day_latest_wins() {
        let dir = TempDir::new().unwrap();
        let h = history(&dir);
        h.append(&record("d1", at(1, 9), vec![position("NVDA", 70.0)])).unwrap();
        h.append(&record("d2-late", at(2, 15), vec![position("NVDA", 90.0)])).unwrap();
        h.append(&record("d2-early", at(2, 9), vec![position("NVDA", 85.0)])).unwrap();
        h.append(&record("d3", at(3, 9), vec![position("AMD", 60.0)])).unwrap();
        h.append(&record("d4", at(4, 9), vec![position("NVDA", 88.0), position("AMD", 61.0)]))
            .unwrap();

        let points = h.ticker_history("nvda", 30).unwrap();
        let summary: Vec<(u32, f64)> = points
            .iter()
            .map(|p| (chrono::Datelike::day(&p.date), p.hqm_score))
            .collect();
        assert_eq!(summary, vec![(4, 88.0), (2, 90.0), (1, 70.0)]);
        assert_eq!(points[1].scan_id, "d2-late");

        assert_eq!(h.ticker_history("NVDA", 2).unwrap().len(), 2);
        assert!(h.ticker_history("TSLA", 30).unwrap().is_empty());
    }
}
