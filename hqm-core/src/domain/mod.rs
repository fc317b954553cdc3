//! Domain types for the HQM pipeline

pub mod candidate;
pub mod position;
pub mod score;
pub mod snapshot;

pub use candidate::Candidate;
pub use position::Position;
pub use score::{CompositeScore, PercentileScore};
pub use snapshot::{Exchange, StockSnapshot, Timeframe};

/// Ticker type alias
pub type Ticker = String;
