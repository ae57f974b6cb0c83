//! Index quote model and trend classification.

use serde::Serialize;

/// Epsilon below which a price change counts as flat.
const TREND_EPSILON: f64 = 1e-4;

/// Direction of an instrument's move since the previous close.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketTrend {
    Up,
    Down,
    Neutral,
}

impl MarketTrend {
    /// Classify a change value. A non-finite change classifies as neutral,
    /// as does anything within `1e-4` of zero.
    pub fn from_change(change: f64) -> Self {
        if change.is_nan() {
            return MarketTrend::Neutral;
        }
        if change > TREND_EPSILON {
            MarketTrend::Up
        } else if change < -TREND_EPSILON {
            MarketTrend::Down
        } else {
            MarketTrend::Neutral
        }
    }
}

/// Full quote for a known index, reconstructed on every fetch.
///
/// All numeric fields are sanitized before this struct is built: a missing
/// or non-numeric upstream value becomes `0.0`, never NaN or infinity.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuote {
    /// Human-readable index name resolved from the token registry.
    pub name: String,
    /// Last traded price.
    pub ltp: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Previous close.
    pub close: f64,
    /// Absolute change since the previous close.
    pub change: f64,
    /// Change as a percentage of the previous close.
    pub percent_change: f64,
    pub trend: MarketTrend,
}
