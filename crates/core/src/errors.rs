use thiserror::Error;

use assetserve_market_data::MarketDataError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio application.
///
/// Market-data failures are caught and degraded at the gateway boundary, so
/// the variants that actually surface to users are the local ones: missing
/// entities, ownership mismatches, invalid input.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Input validation failed: {0}")]
    Validation(String),

    #[error("Store operation failed: {0}")]
    Store(String),
}
