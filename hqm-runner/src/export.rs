//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for scan reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: the selected positions for spreadsheets and brokers' basket upload
//! - **Markdown**: a human-readable summary of one scan
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use hqm_core::{Position, Timeframe};

use crate::scan::{ScanReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ScanReport` to pretty JSON.
pub fn export_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScanReport to JSON")
}

/// Deserialize a `ScanReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScanReport> {
    let report: ScanReport =
        serde_json::from_str(json).context("failed to deserialize ScanReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Market cap for display: `150.5B`, `1.2T`, or `-` when unknown.
pub fn format_market_cap(market_cap: Option<f64>) -> String {
    match market_cap {
        Some(cap) if cap.is_finite() => {
            let billions = cap / 1e9;
            if billions >= 1000.0 {
                format!("{:.1}T", billions / 1000.0)
            } else {
                format!("{billions:.1}B")
            }
        }
        _ => "-".to_string(),
    }
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.decimals$}"))
}

/// Export positions as CSV, one row per position in score order.
///
/// Columns: ticker, price, market_cap, exchange, return and percentile per
/// timeframe, hqm_score, trend_distance, shares, value, weight
pub fn export_positions_csv(positions: &[Position]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "ticker",
        "price",
        "market_cap",
        "exchange",
        "return_1m",
        "pct_1m",
        "return_3m",
        "pct_3m",
        "return_6m",
        "pct_6m",
        "return_1y",
        "pct_1y",
        "hqm_score",
        "trend_distance",
        "shares",
        "value",
        "weight",
    ])?;

    for p in positions {
        let c = &p.candidate;
        let mut row = vec![
            p.ticker.clone(),
            format!("{:.2}", p.price),
            format_market_cap(c.snapshot.market_cap),
            c.snapshot.exchange.to_string(),
        ];
        for tf in Timeframe::ALL {
            row.push(opt(c.snapshot.return_for(tf), 4));
            row.push(format!("{:.1}", c.percentiles.get(tf)));
        }
        row.extend([
            format!("{:.1}", c.hqm_score()),
            opt(c.trend_distance, 2),
            p.shares.to_string(),
            format!("{:.2}", p.value),
            format!("{:.1}", p.weight),
        ]);
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one scan.
///
/// Creates `scan_{short_id}/` under `output_dir` containing:
/// - `report.json`: the full `ScanReport`
/// - `positions.csv`: the selected positions
/// - `report.md`: the Markdown summary
///
/// Returns the path to the created directory.
pub fn save_report(report: &ScanReport, output_dir: &Path) -> Result<PathBuf> {
    let scan_dir = output_dir.join(format!("scan_{}", report.short_id()));
    std::fs::create_dir_all(&scan_dir)
        .with_context(|| format!("failed to create scan dir: {}", scan_dir.display()))?;

    std::fs::write(scan_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        scan_dir.join("positions.csv"),
        export_positions_csv(&report.result.positions)?,
    )?;
    std::fs::write(scan_dir.join("report.md"), generate_report(report))?;

    Ok(scan_dir)
}

/// Load a `ScanReport` from a scan directory's report.json.
///
/// Rejects unknown schema versions.
pub fn load_report(dir: &Path) -> Result<ScanReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one scan.
pub fn generate_report(report: &ScanReport) -> String {
    let summary = &report.result.summary;
    let mut md = String::with_capacity(2048);

    md.push_str("# HQM Scan Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Scan | {} |\n", report.short_id()));
    md.push_str(&format!(
        "| Scanned At | {} |\n",
        report.scanned_at.format("%Y-%m-%d %H:%M UTC")
    ));
    md.push_str(&format!("| Universe Hash | {} |\n", report.universe.universe_hash));
    if let Some(age) = report.universe.data_age_hours {
        md.push_str(&format!("| Data Age | {age:.1} h |\n"));
    }
    md.push_str(&format!(
        "| Price History | {} |\n",
        report.history_provider.as_deref().unwrap_or("none")
    ));
    md.push('\n');

    md.push_str("## Funnel\n\n");
    md.push_str("| Stage | Count |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Scanned | {} |\n", summary.total_scanned));
    md.push_str(&format!(
        "| Passed quality ({:.0}th pct) | {} |\n",
        summary.config.quality_threshold, summary.after_quality_filter
    ));
    md.push_str(&format!("| Candidate pool | {} |\n", summary.candidate_pool));
    if let Some(max) = summary.config.max_trend_extension {
        md.push_str(&format!(
            "| Removed by trend (> {max:.1}% over SMA10) | {} |\n",
            summary.filtered_by_trend
        ));
    }
    md.push_str(&format!("| Selected | {} |\n", summary.selected));
    md.push('\n');

    md.push_str("## Positions\n\n");
    md.push_str("| Ticker | Price | Mkt Cap | HQM | 1M | 3M | 6M | 1Y | Shares | Value | Weight |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for p in &report.result.positions {
        let pct = &p.candidate.percentiles;
        md.push_str(&format!(
            "| {} | {:.2} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {} | {:.2} | {:.1}% |\n",
            p.ticker,
            p.price,
            format_market_cap(p.candidate.snapshot.market_cap),
            p.candidate.hqm_score(),
            pct.pct_1m,
            pct.pct_3m,
            pct.pct_6m,
            pct.pct_1y,
            p.shares,
            p.value,
            p.weight,
        ));
    }
    md.push('\n');

    md.push_str("## Cash\n\n");
    md.push_str(&format!("- Portfolio: ${:.2}\n", summary.portfolio_size));
    md.push_str(&format!("- Per position: ${:.2}\n", summary.allocation_per_stock));
    md.push_str(&format!("- Invested: ${:.2}\n", summary.total_invested));
    md.push_str(&format!("- Cash remaining: ${:.2}\n", summary.cash_remaining));

    md
}
