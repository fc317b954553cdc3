//! Per-ticker market snapshot and the four return timeframes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rounding::serde_round;

/// Return horizon scored by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Timeframe {
    /// All timeframes, shortest first. Index order matches `Timeframe::index`.
    pub const ALL: [Timeframe; 4] = [
        Timeframe::OneMonth,
        Timeframe::ThreeMonths,
        Timeframe::SixMonths,
        Timeframe::OneYear,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::OneMonth => 0,
            Self::ThreeMonths => 1,
            Self::SixMonths => 2,
            Self::OneYear => 3,
        }
    }

    /// Short column label ("1M", "3M", "6M", "1Y").
    pub fn label(self) -> &'static str {
        match self {
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing exchange. Unknown venues are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Exchange {
    Nyse,
    Nasdaq,
    Amex,
    Other(String),
}

impl Exchange {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Nyse => "NYSE",
            Self::Nasdaq => "NASDAQ",
            Self::Amex => "AMEX",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Exchange {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "NYSE" => Self::Nyse,
            "NASDAQ" => Self::Nasdaq,
            "AMEX" | "NYSE AMERICAN" => Self::Amex,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<Exchange> for String {
    fn from(value: Exchange) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Exchange {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable market data for one ticker, as produced by the acquisition layer.
///
/// Returns are fractions (`0.12` = +12%). Any return may be undefined when the
/// provider had no figure; the pipeline rejects such snapshots, so loaders are
/// expected to drop them first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub ticker: String,
    pub exchange: Exchange,
    #[serde(default)]
    pub market_cap: Option<f64>,
    pub price: f64,
    #[serde(default, serialize_with = "serde_round::opt_dp4")]
    pub return_1m: Option<f64>,
    #[serde(default, serialize_with = "serde_round::opt_dp4")]
    pub return_3m: Option<f64>,
    #[serde(default, serialize_with = "serde_round::opt_dp4")]
    pub return_6m: Option<f64>,
    #[serde(default, serialize_with = "serde_round::opt_dp4")]
    pub return_1y: Option<f64>,
}

impl StockSnapshot {
    /// Snapshot with no market cap and no returns.
    pub fn new(ticker: impl Into<String>, exchange: Exchange, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            exchange,
            market_cap: None,
            price,
            return_1m: None,
            return_3m: None,
            return_6m: None,
            return_1y: None,
        }
    }

    /// Set all four returns, in `Timeframe::ALL` order.
    pub fn with_returns(mut self, returns: [f64; 4]) -> Self {
        self.return_1m = Some(returns[0]);
        self.return_3m = Some(returns[1]);
        self.return_6m = Some(returns[2]);
        self.return_1y = Some(returns[3]);
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn return_for(&self, timeframe: Timeframe) -> Option<f64> {
        match timeframe {
            Timeframe::OneMonth => self.return_1m,
            Timeframe::ThreeMonths => self.return_3m,
            Timeframe::SixMonths => self.return_6m,
            Timeframe::OneYear => self.return_1y,
        }
    }

    /// True when every timeframe has a return.
    pub fn is_complete(&self) -> bool {
        Timeframe::ALL.iter().all(|&tf| self.return_for(tf).is_some())
    }
}
