//! Historical candle model.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One OHLCV bucket of a historical series.
///
/// Candles arrive as ordered 6-element arrays and are immutable once
/// returned; the sequence preserves upstream order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candle {
    /// Interval start, as reported by the exchange (IST offset upstream).
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
