//! Error types for the market data crate.
//!
//! The taxonomy follows the failure surfaces of the gateway:
//! - [`MarketDataError::InvalidSecret`]: the TOTP shared secret cannot be decoded
//! - [`MarketDataError::AuthFailure`]: login was rejected or the session expired
//! - [`MarketDataError::SessionNotReady`]: a call was attempted before any
//!   successful login
//! - [`MarketDataError::UpstreamUnavailable`]: network error, timeout or 5xx
//! - [`MarketDataError::MalformedResponse`]: the payload is missing expected
//!   fields or arrays

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The TOTP shared secret is not valid base32.
    #[error("Invalid TOTP secret: {0}")]
    InvalidSecret(String),

    /// Login failed: bad credentials, bad TOTP, or a network error during
    /// authentication. The session is left unauthenticated.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// An authenticated call was attempted before any successful login.
    /// No network request is made in this case.
    #[error("Session not ready: no successful login yet")]
    SessionNotReady,

    /// The upstream API could not be reached, timed out, or returned a
    /// server error.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream returned a payload that is missing expected fields.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MarketDataError::UpstreamUnavailable(format!("request timed out: {}", err))
        } else if err.is_decode() {
            MarketDataError::MalformedResponse(err.to_string())
        } else {
            MarketDataError::UpstreamUnavailable(err.to_string())
        }
    }
}
