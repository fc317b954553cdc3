//! Yahoo Finance price-history provider.
//!
//! Fetches recent daily closes from Yahoo's v8 chart API. Handles rate
//! limiting, retries with exponential backoff, response parsing, and the
//! circuit breaker. Tickers within one batch are fetched in parallel on the
//! rayon pool; tickers that cannot be resolved are omitted from the result.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV provider is the offline fallback.

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use hqm_core::{ClosingPrices, HistoryError, PriceHistoryProvider};

use super::circuit_breaker::CircuitBreaker;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

/// Per-ticker failure inside a batch. Only breaker trips escalate to the batch.
#[derive(Debug)]
enum FetchOutcome {
    Closes(Vec<f64>),
    NotFound,
    Failed(HistoryError),
}

#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Chart range, e.g. "1mo" (about 20 trading days).
    pub range: String,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            range: "1mo".into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct YahooHistoryProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    config: YahooConfig,
}

impl YahooHistoryProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, config: YahooConfig) -> Result<Self, HistoryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| HistoryError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            config,
        })
    }

    /// Default configuration with a fresh breaker.
    pub fn with_defaults() -> Result<Self, HistoryError> {
        Self::new(Arc::new(CircuitBreaker::default()), YahooConfig::default())
    }

    /// Yahoo uses '-' where exchanges use '.' in share-class tickers (BRK.B → BRK-B).
    fn chart_url(ticker: &str, range: &str) -> String {
        let symbol = ticker.replace('.', "-");
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?range={range}&interval=1d"
        )
    }

    /// Parse the chart response into closes, oldest first. Missing closes
    /// (halts, holidays) are skipped.
    fn parse_response(resp: ChartResponse) -> Result<Option<Vec<f64>>, HistoryError> {
        let Some(result) = resp.chart.result else {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => Ok(None),
                Some(err) => Err(HistoryError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                ))),
                None => Err(HistoryError::ResponseFormatChanged(
                    "empty result with no error".into(),
                )),
            };
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(None);
        };
        if data.timestamp.is_none() {
            return Ok(None);
        }
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| HistoryError::ResponseFormatChanged("no quote data".into()))?;

        let closes: Vec<f64> = quote.close.into_iter().flatten().filter(|c| c.is_finite()).collect();
        Ok(if closes.is_empty() { None } else { Some(closes) })
    }

    fn fetch_with_retry(&self, ticker: &str) -> FetchOutcome {
        if !self.circuit_breaker.is_allowed() {
            return FetchOutcome::Failed(HistoryError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(ticker, &self.config.range);
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.config.base_delay * 2u32.pow(attempt - 1));
            }
            if !self.circuit_breaker.is_allowed() {
                return FetchOutcome::Failed(HistoryError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(HistoryError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return FetchOutcome::Failed(HistoryError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return FetchOutcome::Failed(HistoryError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return FetchOutcome::NotFound;
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(HistoryError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(HistoryError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let chart: ChartResponse = match resp.json() {
                Ok(chart) => chart,
                Err(e) => {
                    return FetchOutcome::Failed(HistoryError::ResponseFormatChanged(format!(
                        "failed to parse response for {ticker}: {e}"
                    )))
                }
            };
            self.circuit_breaker.record_success();
            return match Self::parse_response(chart) {
                Ok(Some(closes)) => FetchOutcome::Closes(closes),
                Ok(None) => FetchOutcome::NotFound,
                Err(e) => FetchOutcome::Failed(e),
            };
        }

        FetchOutcome::Failed(last_error.unwrap_or_else(|| HistoryError::Other("max retries exceeded".into())))
    }
}

impl PriceHistoryProvider for YahooHistoryProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn closing_prices(&self, tickers: &[&str]) -> Result<ClosingPrices, HistoryError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(HistoryError::CircuitBreakerTripped);
        }

        let outcomes: Vec<(&str, FetchOutcome)> = tickers
            .par_iter()
            .map(|&ticker| (ticker, self.fetch_with_retry(ticker)))
            .collect();

        let mut closes = ClosingPrices::with_capacity(tickers.len());
        let mut tripped = false;
        for (ticker, outcome) in outcomes {
            match outcome {
                FetchOutcome::Closes(c) => {
                    closes.insert(ticker.to_string(), c);
                }
                FetchOutcome::NotFound => debug!(ticker, "no chart data"),
                FetchOutcome::Failed(HistoryError::CircuitBreakerTripped) => tripped = true,
                FetchOutcome::Failed(e) => warn!(ticker, error = %e, "price history fetch failed"),
            }
        }

        // Keep what resolved before the breaker opened.
        if tripped && closes.is_empty() {
            return Err(HistoryError::CircuitBreakerTripped);
        }
        Ok(closes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Option<Vec<f64>>, HistoryError> {
        YahooHistoryProvider::parse_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn url_uses_range_and_dash_share_class() {
        let url = YahooHistoryProvider::chart_url("BRK.B", "1mo");
        assert!(url.contains("/chart/BRK-B?"));
        assert!(url.contains("range=1mo"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn parses_closes_skipping_nulls() {
        let json = r#"{"chart":{"result":[{"timestamp":[1,2,3,4],
            "indicators":{"quote":[{"close":[10.0,null,11.5,12.0]}]}}],"error":null}}"#;
        assert_eq!(parse(json).unwrap(), Some(vec![10.0, 11.5, 12.0]));
    }

    #[test]
    fn not_found_is_unresolved_not_an_error() {
        let json = r#"{"chart":{"result":null,
            "error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert_eq!(parse(json).unwrap(), None);
    }

    #[test]
    fn other_chart_errors_flag_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"x"}}}"#;
        assert!(matches!(parse(json), Err(HistoryError::ResponseFormatChanged(_))));
    }

    #[test]
    fn tripped_breaker_refuses_batch() {
        let breaker = Arc::new(CircuitBreaker::default());
        breaker.trip();
        let provider = YahooHistoryProvider::new(breaker, YahooConfig::default()).unwrap();
        let err = provider.closing_prices(&["AAPL"]).unwrap_err();
        assert!(matches!(err, HistoryError::CircuitBreakerTripped));
    }
}
