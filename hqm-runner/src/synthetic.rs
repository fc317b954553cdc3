//! Synthetic universes for demos, benchmarks and offline smoke runs.
//!
//! Everything here is clearly fake: tickers are `SYN0001`-style and scan
//! reports built from them carry the `synthetic` source tag.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hqm_core::{ClosingPrices, Exchange, StockSnapshot};

const EXCHANGES: [Exchange; 3] = [Exchange::Nyse, Exchange::Nasdaq, Exchange::Amex];

/// Days of closes produced per ticker (about one trading month).
pub const SYNTHETIC_HISTORY_DAYS: usize = 21;

/// Deterministic snapshot collection: same `(count, seed)`, same universe.
///
/// Returns widen with the horizon, so longer timeframes spread further apart,
/// roughly like real cross-sections.
pub fn generate_universe(count: usize, seed: u64) -> Vec<StockSnapshot> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            // A shared "momentum" factor makes some tickers consistent across timeframes.
            let momentum: f64 = rng.gen_range(-1.0..1.0);
            let returns = [0.06, 0.12, 0.2, 0.35].map(|spread: f64| {
                let noise: f64 = rng.gen_range(-1.0..1.0);
                (momentum * 0.6 + noise * 0.4) * spread
            });
            StockSnapshot::new(
                format!("SYN{:04}", i + 1),
                EXCHANGES[i % EXCHANGES.len()].clone(),
                (rng.gen_range(2.0_f64..600.0) * 100.0).round() / 100.0,
            )
            .with_returns(returns)
            .with_market_cap(rng.gen_range(2.0e8..1.5e12))
        })
        .collect()
}

/// Random-walk closes ending at each snapshot's price.
///
/// Each walk is built backwards from the current price so the latest close
/// always matches the snapshot.
pub fn synthetic_closes(snapshots: &[StockSnapshot], seed: u64) -> ClosingPrices {
    let mut rng = StdRng::seed_from_u64(seed);
    snapshots
        .iter()
        .map(|snapshot| {
            let drift: f64 = rng.gen_range(-0.01..0.015);
            let mut closes = Vec::with_capacity(SYNTHETIC_HISTORY_DAYS);
            let mut close = snapshot.price;
            for _ in 0..SYNTHETIC_HISTORY_DAYS {
                closes.push(close);
                let step: f64 = drift + rng.gen_range(-0.02..0.02);
                close /= 1.0 + step;
            }
            closes.reverse();
            (snapshot.ticker.clone(), closes)
        })
        .collect()
}
