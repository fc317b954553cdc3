//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Percentile bounds: distinct values span 100/(2n) ..= 100(2n−1)/(2n)
//! 2. Composite bounds: min_percentile ≤ hqm_score ≤ 100, hqm_score is the mean
//! 3. Quality idempotence: filtering the survivors again removes nothing
//! 4. Selection order: the pool is non-increasing in hqm_score
//! 5. Trend fail-open: undefined distances are never removed
//! 6. Sizing identities: weights sum to 100, invested + cash = portfolio

use proptest::prelude::*;

use hqm_core::filters::{CandidateFilter, QualityFilter, TrendExtensionFilter};
use hqm_core::scoring::{composite_score, mean_rank_percentiles};
use hqm_core::selection::CandidateSelector;
use hqm_core::sizers::{EqualWeightSizer, Sizer};
use hqm_core::{
    run_pipeline, Candidate, CompositeScore, Exchange, PercentileScore, PipelineConfig,
    StaticHistoryProvider, StockSnapshot,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_return() -> impl Strategy<Value = f64> {
    (-0.9..3.0_f64).prop_map(|r| (r * 10_000.0).round() / 10_000.0)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (0.5..2_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_percentile() -> impl Strategy<Value = f64> {
    0.0..=100.0_f64
}

fn arb_universe() -> impl Strategy<Value = Vec<StockSnapshot>> {
    prop::collection::vec((arb_price(), [arb_return(), arb_return(), arb_return(), arb_return()]), 1..80)
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (price, returns))| {
                    StockSnapshot::new(format!("T{i:03}"), Exchange::Nyse, price).with_returns(returns)
                })
                .collect()
        })
}

fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(
        (arb_price(), [arb_percentile(), arb_percentile(), arb_percentile(), arb_percentile()]),
        0..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (price, pcts))| {
                let percentiles = PercentileScore::from_values(pcts);
                let score = composite_score(&percentiles);
                Candidate::new(
                    StockSnapshot::new(format!("C{i:03}"), Exchange::Nasdaq, price),
                    percentiles,
                    score,
                )
            })
            .collect()
    })
}

// ── 1. Percentile Bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn distinct_values_hit_extreme_percentiles(n in 1usize..200, offset in -5.0..5.0_f64) {
        let values: Vec<f64> = (0..n).map(|i| offset + i as f64 * 0.01).collect();
        let pct = mean_rank_percentiles(&values);
        let n = n as f64;
        prop_assert!((pct[0] - 100.0 / (2.0 * n)).abs() < 1e-9);
        prop_assert!((pct[pct.len() - 1] - 100.0 * (2.0 * n - 1.0) / (2.0 * n)).abs() < 1e-9);
    }

    #[test]
    fn percentiles_are_monotone_in_value(values in prop::collection::vec(arb_return(), 1..100)) {
        let pct = mean_rank_percentiles(&values);
        for i in 0..values.len() {
            prop_assert!(pct[i] > 0.0 && pct[i] < 100.0);
            for j in 0..values.len() {
                if values[i] < values[j] {
                    prop_assert!(pct[i] < pct[j]);
                } else if values[i] == values[j] {
                    prop_assert_eq!(pct[i], pct[j]);
                }
            }
        }
    }
}

// ── 2. Composite Bounds ──────────────────────────────────────────────

proptest! {
    #[test]
    fn composite_between_min_and_hundred(
        pcts in [arb_percentile(), arb_percentile(), arb_percentile(), arb_percentile()]
    ) {
        let score = composite_score(&PercentileScore::from_values(pcts));
        let mean = pcts.iter().sum::<f64>() / 4.0;
        prop_assert!(score.min_percentile <= score.hqm_score + 1e-12);
        prop_assert!(score.hqm_score <= 100.0);
        prop_assert!((score.hqm_score - mean).abs() < 1e-9);
    }
}

// ── 3. Quality Idempotence ───────────────────────────────────────────

proptest! {
    #[test]
    fn quality_filter_idempotent(candidates in arb_candidates(), threshold in 0.0..=100.0_f64) {
        let filter = QualityFilter::new(threshold);
        let once = filter.apply(candidates);
        prop_assert!(once.kept.iter().all(|c| c.min_percentile() >= threshold));
        let twice = filter.apply(once.kept.clone());
        prop_assert_eq!(twice.removed, 0);
        prop_assert_eq!(twice.kept, once.kept);
    }
}

// ── 4. Selection Order ───────────────────────────────────────────────

proptest! {
    #[test]
    fn selection_non_increasing(
        candidates in arb_candidates(),
        n in 1usize..=50,
        multiplier in prop::sample::select(vec![1.5, 3.0]),
    ) {
        let survivors = candidates.len();
        let pool = CandidateSelector::new(n, multiplier).select(candidates);
        prop_assert_eq!(pool.len(), ((n as f64 * multiplier).floor() as usize).min(survivors));
        for pair in pool.windows(2) {
            prop_assert!(pair[0].hqm_score() >= pair[1].hqm_score());
        }
    }
}

// ── 5. Trend Fail-Open ───────────────────────────────────────────────

proptest! {
    #[test]
    fn undefined_distance_never_removed(
        candidates in arb_candidates(),
        max in -50.0..50.0_f64,
        with_history in prop::collection::vec(any::<bool>(), 60),
    ) {
        let mut history = StaticHistoryProvider::default();
        for (candidate, has) in candidates.iter().zip(&with_history) {
            if *has {
                let mut closes = vec![100.0; 9];
                closes.push(candidate.price());
                history.insert(candidate.ticker(), closes);
            }
        }
        let filter = TrendExtensionFilter::new(Some(&history), Some(max), 7);
        let before: Vec<String> = candidates.iter().map(|c| c.ticker().to_string()).collect();
        let outcome = filter.apply(candidates);

        for (ticker, has) in before.iter().zip(&with_history) {
            if !has {
                prop_assert!(outcome.kept.iter().any(|c| c.ticker() == ticker));
            }
        }
        for kept in &outcome.kept {
            if let Some(d) = kept.trend_distance {
                prop_assert!(d <= max);
            }
        }
    }
}

// ── 6. Sizing Identities ─────────────────────────────────────────────

proptest! {
    #[test]
    fn sizing_identities_hold(
        candidates in arb_candidates().prop_filter("non-empty", |c| !c.is_empty()),
        portfolio in 1_000.0..1_000_000.0_f64,
    ) {
        let n = candidates.len();
        let allocation = EqualWeightSizer::new().allocate(portfolio, candidates).unwrap();

        prop_assert_eq!(allocation.positions.len(), n);
        let weights: f64 = allocation.positions.iter().map(|p| p.weight).sum();
        prop_assert!((weights - 100.0).abs() < 1e-9);

        let invested: f64 = allocation.positions.iter().map(|p| p.value).sum();
        prop_assert_eq!(allocation.total_invested, invested);
        prop_assert_eq!(allocation.cash_remaining, portfolio - invested);
        prop_assert!(allocation.cash_remaining >= -1e-6);
        for p in &allocation.positions {
            prop_assert!(p.value <= allocation.allocation_per_stock + 1e-6);
        }
    }

    #[test]
    fn pipeline_never_exceeds_requested_positions(
        universe in arb_universe(),
        n in 1usize..=50,
        threshold in 0.0..60.0_f64,
    ) {
        let config = PipelineConfig::new(10_000.0, n).with_quality_threshold(threshold);
        if let Ok(result) = run_pipeline(&universe, &config, None) {
            prop_assert!(result.len() <= n);
            prop_assert!(result.len() >= 1);
            prop_assert!(result.summary.cash_remaining >= -1e-6);
            for pair in result.positions.windows(2) {
                prop_assert!(pair[0].candidate.hqm_score() >= pair[1].candidate.hqm_score());
            }
        }
    }
}

#[test]
fn composite_of_known_scores() {
    let score: CompositeScore = composite_score(&PercentileScore::from_values([10.0, 30.0, 50.0, 70.0]));
    assert_eq!(score.hqm_score, 40.0);
    assert_eq!(score.min_percentile, 10.0);
}
