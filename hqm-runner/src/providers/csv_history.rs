//! Offline price history from a CSV file.
//!
//! Expected header: `ticker,date,close` with ISO dates. Rows may appear in any
//! order; closes are sorted by date per ticker on load.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use hqm_core::{ClosingPrices, HistoryError, PriceHistoryProvider};

#[derive(Debug, Deserialize)]
struct CloseRow {
    ticker: String,
    date: NaiveDate,
    close: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CsvHistoryProvider {
    closes: ClosingPrices,
}

impl CsvHistoryProvider {
    pub fn from_file(path: &Path) -> Result<Self, HistoryError> {
        let reader = csv::Reader::from_path(path)
            .map_err(|e| HistoryError::Io(format!("{}: {e}", path.display())))?;
        let provider = Self::from_reader(reader)?;
        info!(
            path = %path.display(),
            tickers = provider.closes.len(),
            "loaded closing prices from csv"
        );
        Ok(provider)
    }

    pub fn from_csv_str(data: &str) -> Result<Self, HistoryError> {
        Self::from_reader(csv::Reader::from_reader(data.as_bytes()))
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, HistoryError> {
        let mut dated: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
        for row in reader.deserialize::<CloseRow>() {
            let row = row.map_err(|e| HistoryError::ResponseFormatChanged(e.to_string()))?;
            dated
                .entry(row.ticker.trim().to_ascii_uppercase())
                .or_default()
                .push((row.date, row.close));
        }

        let closes = dated
            .into_iter()
            .map(|(ticker, mut rows)| {
                rows.sort_by_key(|(date, _)| *date);
                (ticker, rows.into_iter().map(|(_, close)| close).collect())
            })
            .collect();
        Ok(Self { closes })
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl PriceHistoryProvider for CsvHistoryProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn closing_prices(&self, tickers: &[&str]) -> Result<ClosingPrices, HistoryError> {
        Ok(tickers
            .iter()
            .filter_map(|t| self.closes.get(*t).map(|c| (t.to_string(), c.clone())))
            .collect())
    }
}
