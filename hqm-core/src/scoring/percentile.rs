//! Mean-rank percentiles.
//!
//! For a value `x` in a population of `n`:
//!
//! ```text
//! percentile = 100 × (count(y < x) + count(y ≤ x)) / (2n)
//! ```
//!
//! i.e. halfway between the strict and the non-strict rank fraction. Ties get
//! identical percentiles. The population is sorted once and each value is
//! located with two binary searches, so a timeframe costs O(n log n).

use crate::domain::{PercentileScore, StockSnapshot, Timeframe};
use crate::error::ValidationError;

/// Mean-rank percentile of every value against the population formed by all of them.
///
/// Output is index-aligned with `values`. Values must be finite.
pub fn mean_rank_percentiles(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    values
        .iter()
        .map(|&x| {
            let below = sorted.partition_point(|&y| y < x);
            let at_or_below = sorted.partition_point(|&y| y <= x);
            100.0 * (below + at_or_below) as f64 / (2 * n) as f64
        })
        .collect()
}

/// Percentiles of one timeframe's returns across the whole snapshot collection.
///
/// Fails on the first snapshot without a return for `timeframe`.
pub fn timeframe_percentiles(
    snapshots: &[StockSnapshot],
    timeframe: Timeframe,
) -> Result<Vec<f64>, ValidationError> {
    let returns = snapshots
        .iter()
        .map(|s| {
            s.return_for(timeframe)
                .ok_or_else(|| ValidationError::IncompleteSnapshot {
                    ticker: s.ticker.clone(),
                    timeframe,
                })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(mean_rank_percentiles(&returns))
}

/// Score every snapshot in all four timeframes. Index-aligned with `snapshots`.
pub fn score_universe(snapshots: &[StockSnapshot]) -> Result<Vec<PercentileScore>, ValidationError> {
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(Timeframe::ALL.len());
    for tf in Timeframe::ALL {
        columns.push(timeframe_percentiles(snapshots, tf)?);
    }

    Ok((0..snapshots.len())
        .map(|i| {
            PercentileScore::from_values([
                columns[0][i],
                columns[1][i],
                columns[2][i],
                columns[3][i],
            ])
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Exchange;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn five_ticker_reference_example() {
        // D, B, C, A, E
        let pct = mean_rank_percentiles(&[0.02, 0.05, 0.08, 0.10, 0.15]);
        assert_eq!(pct, vec![10.0, 30.0, 50.0, 70.0, 90.0]);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let pct = mean_rank_percentiles(&[0.15, 0.02, 0.10, 0.05, 0.08]);
        assert_eq!(pct, vec![90.0, 10.0, 70.0, 30.0, 50.0]);
    }

    #[test]
    fn ties_share_a_percentile() {
        let pct = mean_rank_percentiles(&[1.0, 2.0, 2.0, 3.0]);
        // below=1, at_or_below=3 → 100 × 4 / 8
        assert_approx(pct[1], 50.0);
        assert_approx(pct[2], 50.0);
        assert_approx(pct[0], 12.5);
        assert_approx(pct[3], 87.5);
    }

    #[test]
    fn all_equal_values_sit_at_fifty() {
        let pct = mean_rank_percentiles(&[0.3; 7]);
        assert!(pct.iter().all(|&p| (p - 50.0).abs() < 1e-12));
    }

    #[test]
    fn single_value_is_fiftieth_percentile() {
        assert_eq!(mean_rank_percentiles(&[0.42]), vec![50.0]);
    }

    #[test]
    fn empty_population() {
        assert!(mean_rank_percentiles(&[]).is_empty());
    }

    #[test]
    fn extremes_for_distinct_values() {
        let n = 20;
        let values: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let pct = mean_rank_percentiles(&values);
        let n = n as f64;
        assert_approx(pct[0], 100.0 / (2.0 * n));
        assert_approx(pct[19], 100.0 * (2.0 * n - 1.0) / (2.0 * n));
    }

    #[test]
    fn negative_returns_rank_below_positive() {
        let pct = mean_rank_percentiles(&[-0.30, 0.01, -0.05]);
        assert!(pct[0] < pct[2]);
        assert!(pct[2] < pct[1]);
    }

    #[test]
    fn timeframe_percentiles_reject_missing_return() {
        let snapshots = vec![
            StockSnapshot::new("AAA", Exchange::Nyse, 10.0).with_returns([0.1, 0.1, 0.1, 0.1]),
            StockSnapshot::new("BBB", Exchange::Nyse, 10.0),
        ];
        let err = timeframe_percentiles(&snapshots, Timeframe::ThreeMonths).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteSnapshot {
                ticker: "BBB".into(),
                timeframe: Timeframe::ThreeMonths,
            }
        );
    }

    #[test]
    fn score_universe_aligns_columns() {
        let snapshots = vec![
            StockSnapshot::new("LOW", Exchange::Nyse, 10.0).with_returns([0.0, 0.3, 0.0, 0.3]),
            StockSnapshot::new("HIGH", Exchange::Nyse, 10.0).with_returns([0.3, 0.0, 0.3, 0.0]),
        ];
        let scores = score_universe(&snapshots).unwrap();
        assert_eq!(scores[0].values(), [25.0, 75.0, 25.0, 75.0]);
        assert_eq!(scores[1].values(), [75.0, 25.0, 75.0, 25.0]);
        assert_eq!(scores[1].get(Timeframe::OneMonth), 75.0);
    }
}
