//! Trend-extension filter — skip candidates stretched far above their SMA.
//!
//! For each candidate with at least `SMA_PERIOD` valid closes:
//!
//! ```text
//! trend_distance = 100 × (latest_close − sma10) / sma10
//! ```
//!
//! rounded to two decimals. Missing, short or unusable history leaves the
//! distance undefined and the candidate is kept: a flaky data provider must
//! never shrink the portfolio. Only a defined distance strictly above the
//! configured maximum removes a candidate.

use tracing::{debug, info, warn};

use super::{CandidateFilter, FilterOutcome};
use crate::data::{ClosingPrices, PriceHistoryProvider};
use crate::domain::Candidate;
use crate::rounding::round_to;

/// Closes required for the moving average.
pub const SMA_PERIOD: usize = 10;

/// Mean of the last `SMA_PERIOD` closes, `None` with fewer available.
pub fn sma_latest(closes: &[f64]) -> Option<f64> {
    let start = closes.len().checked_sub(SMA_PERIOD)?;
    Some(closes[start..].iter().sum::<f64>() / SMA_PERIOD as f64)
}

/// Percent distance of the latest close from the 10-period SMA.
///
/// Non-finite closes are dropped first. Returns `None` with fewer than
/// `SMA_PERIOD` valid closes or a non-positive average.
pub fn trend_distance(closes: &[f64]) -> Option<f64> {
    let valid: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();
    let sma = sma_latest(&valid)?;
    if sma <= 0.0 {
        return None;
    }
    let latest = *valid.last()?;
    Some(round_to(100.0 * (latest - sma) / sma, 2))
}

pub struct TrendExtensionFilter<'a> {
    history: Option<&'a dyn PriceHistoryProvider>,
    max_extension: Option<f64>,
    batch_size: usize,
}

impl<'a> TrendExtensionFilter<'a> {
    pub fn new(
        history: Option<&'a dyn PriceHistoryProvider>,
        max_extension: Option<f64>,
        batch_size: usize,
    ) -> Self {
        Self {
            history,
            max_extension,
            batch_size: batch_size.max(1),
        }
    }

    /// True when the filter removes candidates (a maximum is configured).
    pub fn is_active(&self) -> bool {
        self.max_extension.is_some()
    }

    /// Look up closes batch by batch. A failed batch is logged and skipped.
    fn lookup(&self, provider: &dyn PriceHistoryProvider, tickers: &[&str]) -> ClosingPrices {
        let mut closes = ClosingPrices::with_capacity(tickers.len());
        for (batch_index, batch) in tickers.chunks(self.batch_size).enumerate() {
            match provider.closing_prices(batch) {
                Ok(found) => {
                    debug!(
                        provider = provider.name(),
                        batch = batch_index,
                        requested = batch.len(),
                        resolved = found.len(),
                        "price history batch resolved"
                    );
                    closes.extend(found);
                }
                Err(e) => warn!(
                    provider = provider.name(),
                    batch = batch_index,
                    requested = batch.len(),
                    error = %e,
                    "price history lookup failed; trend distance left undefined"
                ),
            }
        }
        closes
    }

    /// Attach `trend_distance` to every candidate the provider can resolve.
    pub fn annotate(&self, candidates: &mut [Candidate]) {
        let Some(provider) = self.history else {
            if self.is_active() {
                warn!("trend extension limit set but no price history provider; filter passes everything");
            }
            return;
        };

        let tickers: Vec<&str> = candidates.iter().map(|c| c.ticker()).collect();
        let closes = self.lookup(provider, &tickers);

        let mut missing = 0;
        for candidate in candidates.iter_mut() {
            candidate.trend_distance = closes.get(candidate.ticker()).and_then(|c| trend_distance(c));
            if candidate.trend_distance.is_none() {
                missing += 1;
            }
        }
        if missing > 0 {
            info!(
                missing,
                total = candidates.len(),
                "candidates without usable price history kept (fail-open)"
            );
        }
    }

    fn within_limit(&self, candidate: &Candidate) -> bool {
        match (self.max_extension, candidate.trend_distance) {
            (Some(max), Some(distance)) => distance <= max,
            _ => true,
        }
    }
}

impl CandidateFilter for TrendExtensionFilter<'_> {
    fn name(&self) -> &str {
        "trend_extension"
    }

    fn apply(&self, mut candidates: Vec<Candidate>) -> FilterOutcome {
        self.annotate(&mut candidates);

        let before = candidates.len();
        let kept: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| self.within_limit(c))
            .collect();
        let removed = before - kept.len();
        debug!(
            max_extension = ?self.max_extension,
            before,
            after = kept.len(),
            removed,
            "trend extension filter applied"
        );
        FilterOutcome { kept, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HistoryError, StaticHistoryProvider};
    use crate::domain::{CompositeScore, Exchange, PercentileScore, StockSnapshot};
    use std::sync::Mutex;

    fn candidate(ticker: &str) -> Candidate {
        Candidate::new(
            StockSnapshot::new(ticker, Exchange::Nasdaq, 50.0),
            PercentileScore::from_values([50.0; 4]),
            CompositeScore {
                hqm_score: 50.0,
                min_percentile: 50.0,
            },
        )
    }

    /// Nine closes of 100 followed by `last`, so sma10 = (900 + last) / 10.
    fn closes_ending_at(last: f64) -> Vec<f64> {
        let mut closes = vec![100.0; 9];
        closes.push(last);
        closes
    }

    struct FailingProvider;

    impl PriceHistoryProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn closing_prices(&self, _tickers: &[&str]) -> Result<ClosingPrices, HistoryError> {
            Err(HistoryError::NetworkUnreachable("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct RecordingProvider {
        inner: StaticHistoryProvider,
        batches: Mutex<Vec<usize>>,
    }

    impl PriceHistoryProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        fn closing_prices(&self, tickers: &[&str]) -> Result<ClosingPrices, HistoryError> {
            self.batches.lock().unwrap().push(tickers.len());
            self.inner.closing_prices(tickers)
        }
    }

    #[test]
    fn sma_uses_last_window_only() {
        let closes: Vec<f64> = (1..=12).map(f64::from).collect();
        // mean(3..=12)
        assert_eq!(sma_latest(&closes), Some(7.5));
        assert_eq!(sma_latest(&[4.0; 10]), Some(4.0));
    }

    #[test]
    fn sma_needs_a_full_window() {
        assert_eq!(sma_latest(&[1.0; 9]), None);
        assert_eq!(sma_latest(&[]), None);
    }

    #[test]
    fn distance_of_rising_series() {
        let closes: Vec<f64> = (1..=12).map(f64::from).collect();
        // sma10 = 7.5, latest = 12 → 60%
        assert_eq!(trend_distance(&closes), Some(60.0));
    }

    #[test]
    fn distance_is_negative_below_average() {
        let d = trend_distance(&closes_ending_at(81.0)).unwrap();
        // sma = 98.1 → (81 − 98.1) / 98.1 = −17.43%
        assert_eq!(d, -17.43);
    }

    #[test]
    fn distance_skips_nan_closes() {
        let mut closes = closes_ending_at(110.0);
        closes.insert(3, f64::NAN);
        // the NaN is dropped; the 10 valid closes are unchanged
        assert_eq!(trend_distance(&closes), trend_distance(&closes_ending_at(110.0)));
    }

    #[test]
    fn distance_undefined_for_short_or_non_positive_history() {
        assert_eq!(trend_distance(&[100.0; 9]), None);
        assert_eq!(trend_distance(&[0.0; 12]), None);
        let mut with_nan = vec![100.0; 9];
        with_nan.push(f64::NAN);
        assert_eq!(trend_distance(&with_nan), None);
    }

    #[test]
    fn removes_only_defined_distances_above_limit() {
        let mut provider = StaticHistoryProvider::default();
        provider.insert("HOT", closes_ending_at(130.0)); // sma 103 → +26.21%
        provider.insert("OK", closes_ending_at(105.0)); // sma 100.5 → +4.48%
        provider.insert("SHORT", vec![100.0; 5]);

        let filter = TrendExtensionFilter::new(Some(&provider), Some(15.0), 50);
        let outcome = filter.apply(vec![
            candidate("HOT"),
            candidate("OK"),
            candidate("SHORT"),
            candidate("UNKNOWN"),
        ]);

        let tickers: Vec<&str> = outcome.kept.iter().map(|c| c.ticker()).collect();
        assert_eq!(tickers, vec!["OK", "SHORT", "UNKNOWN"]);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.kept[0].trend_distance, Some(4.48));
        assert_eq!(outcome.kept[1].trend_distance, None);
        assert_eq!(outcome.kept[2].trend_distance, None);
    }

    #[test]
    fn distance_equal_to_limit_is_kept() {
        let mut provider = StaticHistoryProvider::default();
        provider.insert("EDGE", closes_ending_at(105.0));
        let filter = TrendExtensionFilter::new(Some(&provider), Some(4.48), 50);
        let outcome = filter.apply(vec![candidate("EDGE")]);
        assert_eq!(outcome.kept.len(), 1);
    }

    #[test]
    fn failed_lookup_fails_open() {
        let provider = FailingProvider;
        let filter = TrendExtensionFilter::new(Some(&provider), Some(-100.0), 50);
        let outcome = filter.apply(vec![candidate("A"), candidate("B")]);
        assert_eq!(outcome.kept.len(), 2);
        assert_eq!(outcome.removed, 0);
        assert!(outcome.kept.iter().all(|c| c.trend_distance.is_none()));
    }

    #[test]
    fn missing_provider_fails_open() {
        let filter = TrendExtensionFilter::new(None, Some(0.0), 50);
        let outcome = filter.apply(vec![candidate("A")]);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn without_limit_annotates_but_keeps_everything() {
        let mut provider = StaticHistoryProvider::default();
        provider.insert("HOT", closes_ending_at(200.0));
        let filter = TrendExtensionFilter::new(Some(&provider), None, 50);
        assert!(!filter.is_active());

        let outcome = filter.apply(vec![candidate("HOT")]);
        assert_eq!(outcome.removed, 0);
        assert!(outcome.kept[0].trend_distance.unwrap() > 50.0);
    }

    #[test]
    fn lookups_are_batched() {
        let provider = RecordingProvider::default();
        let filter = TrendExtensionFilter::new(Some(&provider), Some(10.0), 2);
        let candidates: Vec<Candidate> = ["A", "B", "C", "D", "E"].iter().map(|t| candidate(t)).collect();

        filter.apply(candidates);

        assert_eq!(*provider.batches.lock().unwrap(), vec![2, 2, 1]);
    }
}
