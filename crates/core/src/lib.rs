//! AssetServe Core Crate
//!
//! Domain services of the AssetServe portfolio backend: locally tracked
//! positions, live portfolio valuation, the self-refreshing watchlist and
//! the daily portfolio-history snapshot job.
//!
//! Persistence and end-user authentication are external collaborators,
//! consumed through the narrow repository traits defined next to each
//! service ([`positions::PositionRepository`],
//! [`watchlist::WatchlistRepository`],
//! [`portfolio::PortfolioHistoryRepository`], [`portfolio::UserDirectory`]).
//! Live prices come from the market-data gateway through the
//! [`price_source::PriceSource`] seam, so the one-call-per-instrument fetch
//! strategy can be swapped for a batched one without touching callers.

pub mod errors;
pub mod portfolio;
pub mod positions;
pub mod price_source;
pub mod watchlist;

pub use errors::{Error, Result};
pub use portfolio::{
    HistoryRange, PortfolioHistory, PortfolioService, PortfolioValuation, SnapshotService,
    SnapshotSummary, ValuationResult, ValuationService,
};
pub use positions::{NewPosition, Position};
pub use price_source::{GatewayPriceSource, PriceSource};
pub use watchlist::{NewWatchlistEntry, WatchlistEntry, WatchlistService, WatchlistUpdate};
