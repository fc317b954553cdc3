//! HQM CLI — scan, history and config commands.
//!
//! Commands:
//! - `scan`: rank a snapshot universe and size an equal-weight portfolio
//! - `history scans`: list recent scans from the JSONL history
//! - `history ticker`: show one ticker's daily score history
//! - `config`: print the default TOML configuration

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hqm_core::{PriceHistoryProvider, StaticHistoryProvider, Timeframe};
use hqm_runner::{
    build_history_provider, export_json, format_market_cap, generate_universe, init_logging,
    load_snapshots, run_scan, save_report, synthetic_closes, universe_from_snapshots, ScanConfig,
    ScanHistory, ScanRecord, ScanReport, TrendSource,
};

/// Snapshot files older than this trigger a warning.
const STALE_DATA_HOURS: f64 = 24.0;

#[derive(Parser)]
#[command(
    name = "hqm",
    about = "HQM CLI — high quality momentum stock ranking and portfolio sizing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a snapshot universe and size an equal-weight portfolio.
    Scan {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Snapshot CSV files (e.g., one per exchange).
        #[arg(long, num_args = 1..)]
        snapshots: Vec<PathBuf>,

        /// Generate a synthetic universe of this many tickers instead.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for the synthetic universe.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Total capital to allocate.
        #[arg(long)]
        portfolio_size: Option<f64>,

        /// Number of positions to hold (1..=50).
        #[arg(long)]
        num_positions: Option<usize>,

        /// Minimum percentile required in every timeframe.
        #[arg(long)]
        quality_threshold: Option<f64>,

        /// Skip candidates more than this percent above their 10-day SMA.
        #[arg(long)]
        max_trend_extension: Option<f64>,

        /// Price history source for the trend filter: yahoo, csv, none.
        #[arg(long)]
        trend_source: Option<String>,

        /// Closing-price CSV (ticker,date,close) for `--trend-source csv`.
        #[arg(long)]
        closes: Option<PathBuf>,

        /// Output directory for scan artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Do not write artifacts or append to history.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Print the full report as JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Scan history queries.
    History {
        /// Path to a TOML config file (for the history path).
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Print the default configuration as TOML.
    Config,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List the most recent scans.
    Scans {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show one ticker's daily score history.
    Ticker {
        ticker: String,

        #[arg(long, default_value_t = 30)]
        days: usize,
    },
}

/// Command-line overrides applied on top of the config file.
struct ScanOverrides {
    portfolio_size: Option<f64>,
    num_positions: Option<usize>,
    quality_threshold: Option<f64>,
    max_trend_extension: Option<f64>,
    trend_source: Option<String>,
    closes: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    no_save: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            snapshots,
            synthetic,
            seed,
            portfolio_size,
            num_positions,
            quality_threshold,
            max_trend_extension,
            trend_source,
            closes,
            output_dir,
            no_save,
            json,
        } => {
            let overrides = ScanOverrides {
                portfolio_size,
                num_positions,
                quality_threshold,
                max_trend_extension,
                trend_source,
                closes,
                output_dir,
                no_save,
            };
            run_scan_cmd(config, snapshots, synthetic, seed, overrides, json)
        }
        Commands::History { config, action } => {
            let config = load_config(config.as_ref())?;
            init_logging(&config.logging.level, &config.logging.format);
            let history = ScanHistory::new(config.history.path);
            match action {
                HistoryAction::Scans { limit } => run_history_scans(&history, limit),
                HistoryAction::Ticker { ticker, days } => {
                    run_history_ticker(&history, &ticker, days)
                }
            }
        }
        Commands::Config => {
            print!("{}", ScanConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ScanConfig> {
    Ok(match path {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    })
}

fn apply_overrides(config: &mut ScanConfig, overrides: ScanOverrides) -> Result<()> {
    if let Some(size) = overrides.portfolio_size {
        config.portfolio.size = size;
    }
    if let Some(n) = overrides.num_positions {
        config.portfolio.num_positions = n;
    }
    if let Some(threshold) = overrides.quality_threshold {
        config.filters.quality_threshold = threshold;
    }
    if let Some(max) = overrides.max_trend_extension {
        config.filters.max_trend_extension = Some(max);
    }
    if let Some(source) = overrides.trend_source {
        config.trend.source = source.parse()?;
    }
    if let Some(closes) = overrides.closes {
        config.trend.closes_path = Some(closes);
    }
    if let Some(dir) = overrides.output_dir {
        config.history.output_dir = dir;
    }
    if overrides.no_save {
        config.history.save = false;
    }
    Ok(())
}

fn run_scan_cmd(
    config_path: Option<PathBuf>,
    snapshot_paths: Vec<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    overrides: ScanOverrides,
    json: bool,
) -> Result<()> {
    if synthetic.is_some() && !snapshot_paths.is_empty() {
        bail!("--snapshots and --synthetic are mutually exclusive");
    }
    if synthetic.is_none() && snapshot_paths.is_empty() {
        bail!("one of --snapshots or --synthetic is required");
    }

    let mut config = load_config(config_path.as_ref())?;
    apply_overrides(&mut config, overrides)?;
    init_logging(&config.logging.level, &config.logging.format);

    let (universe, provider): (_, Option<Box<dyn PriceHistoryProvider>>) = match synthetic {
        Some(count) => {
            let snapshots = generate_universe(count, seed);
            // Synthetic runs never touch the network.
            let provider: Option<Box<dyn PriceHistoryProvider>> =
                if config.trend.source == TrendSource::None {
                    None
                } else {
                    let closes = synthetic_closes(&snapshots, seed.wrapping_add(1));
                    Some(Box::new(StaticHistoryProvider::new(closes)))
                };
            (universe_from_snapshots(snapshots, "synthetic"), provider)
        }
        None => {
            config.validate()?;
            (load_snapshots(&snapshot_paths)?, build_history_provider(&config)?)
        }
    };

    let pipeline_config = config.to_pipeline_config()?;
    let report = run_scan(&universe, &pipeline_config, provider.as_deref())?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_summary(&report);
        print_positions(&report);
    }

    if config.history.save {
        let scan_dir = save_report(&report, &config.history.output_dir)?;
        let history = ScanHistory::new(config.history.path.clone());
        history.append(&ScanRecord::from_report(&report))?;
        if !json {
            println!("Artifacts saved to: {}", scan_dir.display());
            println!("History appended: {}", history.path().display());
        }
    }

    Ok(())
}

fn run_history_scans(history: &ScanHistory, limit: usize) -> Result<()> {
    let records = history.recent(limit)?;
    if records.is_empty() {
        println!("No scans recorded in {}", history.path().display());
        return Ok(());
    }

    println!(
        "{:<14} {:<17} {:>10} {:>5} {:>12} {:>10}  Tickers",
        "Scan", "Scanned At", "Portfolio", "Pos", "Invested", "Cash"
    );
    println!("{}", "-".repeat(96));
    for record in &records {
        let tickers: Vec<&str> = record.positions.iter().map(|p| p.ticker.as_str()).collect();
        println!(
            "{:<14} {:<17} {:>10.0} {:>5} {:>12.2} {:>10.2}  {}",
            record.short_id(),
            record.scanned_at.format("%Y-%m-%d %H:%M"),
            record.portfolio_size,
            record.positions.len(),
            record.total_invested,
            record.cash_remaining,
            tickers.join(" ")
        );
    }
    Ok(())
}

fn run_history_ticker(history: &ScanHistory, ticker: &str, days: usize) -> Result<()> {
    let points = history.ticker_history(ticker, days)?;
    if points.is_empty() {
        println!("{} was not selected in any recorded scan.", ticker.to_ascii_uppercase());
        return Ok(());
    }

    println!("{}", ticker.to_ascii_uppercase());
    println!(
        "{:<12} {:>6} {:>6} {:>6} {:>6} {:>6} {:>10}",
        "Date", "HQM", "1M", "3M", "6M", "1Y", "Price"
    );
    println!("{}", "-".repeat(58));
    for p in &points {
        println!(
            "{:<12} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>10.2}",
            p.date, p.hqm_score, p.pct_1m, p.pct_3m, p.pct_6m, p.pct_1y, p.price
        );
    }
    Ok(())
}

fn print_summary(report: &ScanReport) {
    let summary = &report.result.summary;
    let universe = &report.universe;

    println!();
    println!("=== HQM Scan ===");
    println!("Scan:           {}", report.short_id());
    println!("Scanned at:     {}", report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let exchanges: Vec<String> = universe
        .per_exchange
        .iter()
        .map(|(exchange, count)| format!("{exchange} {count}"))
        .collect();
    println!("Universe:       {} tickers ({})", universe.loaded, exchanges.join(", "));
    if universe.duplicates_removed + universe.incomplete_removed > 0 {
        println!(
            "Dropped rows:   {} duplicate, {} incomplete",
            universe.duplicates_removed, universe.incomplete_removed
        );
    }
    println!(
        "Trend source:   {}",
        report.history_provider.as_deref().unwrap_or("none")
    );
    println!();
    println!("--- Pipeline ---");
    println!("Scanned:        {}", summary.total_scanned);
    println!(
        "Quality filter: {} removed (threshold {:.0})",
        summary.filtered_by_quality, summary.config.quality_threshold
    );
    println!("Candidate pool: {}", summary.candidate_pool);
    match summary.config.max_trend_extension {
        Some(max) => println!(
            "Trend filter:   {} removed (max {max:.1}%), {} without data",
            summary.filtered_by_trend, summary.missing_trend_data
        ),
        None => println!("Trend filter:   off"),
    }
    println!("Selected:       {}", summary.selected);
    println!();
    println!("--- Allocation ---");
    println!("Portfolio:      {:.2}", summary.portfolio_size);
    println!("Per stock:      {:.2}", summary.allocation_per_stock);
    println!("Invested:       {:.2}", summary.total_invested);
    println!("Cash remaining: {:.2}", summary.cash_remaining);

    if let Some(age) = universe.data_age_hours {
        if age > STALE_DATA_HOURS {
            println!();
            println!("WARNING: snapshot data is {age:.0} hours old");
        }
    }
    println!();
}

fn print_positions(report: &ScanReport) {
    println!(
        "{:<4} {:<7} {:>10} {:>9} {:>6} {:>6} {:>6} {:>6} {:>6} {:>7} {:>7} {:>11} {:>6}",
        "#", "Ticker", "Price", "Cap", "HQM", "1M", "3M", "6M", "1Y", "Trend", "Shares", "Value",
        "Wt%"
    );
    println!("{}", "-".repeat(102));
    for (rank, p) in report.result.positions.iter().enumerate() {
        let c = &p.candidate;
        let pct: Vec<String> = Timeframe::ALL
            .iter()
            .map(|tf| format!("{:>6.1}", c.percentiles.get(*tf)))
            .collect();
        let trend = c
            .trend_distance
            .map_or_else(|| "-".to_string(), |d| format!("{d:+.1}%"));
        println!(
            "{:<4} {:<7} {:>10.2} {:>9} {:>6.1} {} {:>7} {:>7} {:>11.2} {:>6.1}",
            rank + 1,
            p.ticker,
            p.price,
            format_market_cap(c.snapshot.market_cap),
            c.hqm_score(),
            pct.join(" "),
            trend,
            p.shares,
            p.value,
            p.weight
        );
    }
    println!();
}
