use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A watched instrument with the price recorded at the last refresh.
///
/// `current_ltp` is a cache of the most recent successful price fetch, not a
/// live value. It is `None` only until the first refresh succeeds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub owner_user_id: String,
    pub symbol_token: String,
    pub symbol_name: String,
    pub current_ltp: Option<Decimal>,
    pub target_price: Decimal,
    pub notes: Option<String>,
}

/// Request payload for adding a watchlist entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlistEntry {
    pub symbol_token: String,
    pub symbol_name: String,
    pub target_price: Decimal,
    pub notes: Option<String>,
}

/// Partial update for an existing entry. Absent fields keep their value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistUpdate {
    pub target_price: Option<Decimal>,
    pub notes: Option<String>,
}
