//! Criterion benchmarks for HQM hot paths.
//!
//! Benchmarks:
//! 1. Percentile scoring (one timeframe, growing universe)
//! 2. Full pipeline without trend filter (2 000 tickers)
//! 3. Full pipeline with an in-memory price-history provider

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hqm_core::scoring::mean_rank_percentiles;
use hqm_core::{run_pipeline, Exchange, PipelineConfig, StaticHistoryProvider, StockSnapshot};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_universe(n: usize, seed: u64) -> Vec<StockSnapshot> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let returns = [
                rng.gen_range(-0.3..0.4),
                rng.gen_range(-0.5..0.8),
                rng.gen_range(-0.6..1.2),
                rng.gen_range(-0.8..2.5),
            ];
            StockSnapshot::new(format!("SYM{i:05}"), Exchange::Nyse, rng.gen_range(1.0..900.0))
                .with_returns(returns)
                .with_market_cap(rng.gen_range(1.0e8..2.0e12))
        })
        .collect()
}

fn make_history(universe: &[StockSnapshot], seed: u64) -> StaticHistoryProvider {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut history = StaticHistoryProvider::default();
    for snapshot in universe {
        let mut close = snapshot.price;
        let closes: Vec<f64> = (0..20)
            .map(|_| {
                close *= 1.0 + rng.gen_range(-0.03..0.035);
                close
            })
            .collect();
        history.insert(snapshot.ticker.clone(), closes);
    }
    history
}

// ── 1. Percentile Scoring ────────────────────────────────────────────

fn bench_percentiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("mean_rank_percentiles");

    for &n in &[500, 2_000, 8_000] {
        let mut rng = StdRng::seed_from_u64(7);
        let values: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..3.0)).collect();
        group.bench_with_input(BenchmarkId::new("distinct", n), &n, |b, _| {
            b.iter(|| mean_rank_percentiles(black_box(&values)));
        });
    }

    group.finish();
}

// ── 2. Full Pipeline ─────────────────────────────────────────────────

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    let universe = make_universe(2_000, 42);
    let config = PipelineConfig::new(100_000.0, 20);
    group.bench_function("2000_tickers_no_trend", |b| {
        b.iter(|| run_pipeline(black_box(&universe), black_box(&config), None));
    });

    // ── 3. With trend filter ─────────────────────────────────────────
    let history = make_history(&universe, 43);
    let trend_config = config.clone().with_max_trend_extension(Some(15.0));
    group.bench_function("2000_tickers_static_trend", |b| {
        b.iter(|| run_pipeline(black_box(&universe), black_box(&trend_config), Some(&history)));
    });

    group.finish();
}

criterion_group!(benches, bench_percentiles, bench_pipeline);
criterion_main!(benches);
