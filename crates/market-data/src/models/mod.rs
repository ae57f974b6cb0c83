//! Typed records produced by the gateway.
//!
//! - `quote` - full index quote with derived change/trend fields
//! - `candle` - one OHLCV bucket of a historical series
//! - `holding` - broker-side holdings and put/call ratios
//!
//! All of these are ephemeral projections of upstream responses: they are
//! reconstructed on every fetch and never persisted as-is.

mod candle;
mod holding;
mod quote;

pub use candle::Candle;
pub use holding::{Holding, PutCallRatio};
pub use quote::{IndexQuote, MarketTrend};
