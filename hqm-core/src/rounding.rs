//! Display/storage rounding.
//!
//! Results keep full precision in memory so identities such as
//! `total_invested + cash_remaining == portfolio_size` hold exactly. Rounding
//! is applied only when a value is serialized, through the `serde_round`
//! helpers used in `#[serde(serialize_with = ...)]` attributes.

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// `serialize_with` helpers for the fixed precisions used in reports.
pub mod serde_round {
    use super::round_to;
    use serde::Serializer;

    pub fn dp1<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(round_to(*value, 1))
    }

    pub fn dp2<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(round_to(*value, 2))
    }

    pub fn opt_dp2<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_some(&round_to(*v, 2)),
            None => s.serialize_none(),
        }
    }

    pub fn opt_dp4<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_some(&round_to(*v, 4)),
            None => s.serialize_none(),
        }
    }
}
