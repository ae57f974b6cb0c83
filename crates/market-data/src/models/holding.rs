//! Broker-side holdings and options sentiment records.

use serde::Serialize;

/// A position as reported by the broker's account system.
///
/// This is a read-only projection of the upstream account, distinct from
/// the locally tracked portfolio position.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub trading_symbol: String,
    pub symbol_token: String,
    pub quantity: i64,
    pub average_price: f64,
    pub ltp: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

/// Put/call ratio for one derivatives symbol.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutCallRatio {
    pub trading_symbol: String,
    pub pcr: f64,
}
