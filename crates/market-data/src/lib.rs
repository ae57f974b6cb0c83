//! AssetServe Market Data Crate
//!
//! This crate provides the gateway to the Angel One SmartAPI brokerage data
//! feed for the AssetServe application.
//!
//! # Overview
//!
//! The market data crate supports:
//! - TOTP-based login against the SmartAPI auth endpoint
//! - An explicitly managed session lifecycle (no ambient global state)
//! - Quote, candle, holding, search and put/call-ratio queries
//! - Defensive normalization of the upstream's inconsistent JSON payloads
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |      totp        |  (shared secret -> 6-digit code)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  SessionManager  |  (login, token storage, authorized headers)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  SmartApiClient  | --> |  parse / models  |  (sanitized typed records)
//! +------------------+     +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`GatewayConfig`] - API credentials and endpoint configuration
//! - [`SessionManager`] - Owns the authenticated session
//! - [`SmartApiClient`] - One operation per upstream capability
//! - [`IndexQuote`] / [`Candle`] / [`Holding`] / [`PutCallRatio`] - typed records
//! - [`MarketDataError`] - error taxonomy for all gateway operations

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod registry;
pub mod session;
pub mod totp;

pub use client::{CandleInterval, SmartApiClient};
pub use config::GatewayConfig;
pub use errors::MarketDataError;
pub use models::{Candle, Holding, IndexQuote, MarketTrend, PutCallRatio};
pub use session::{SessionManager, SessionState};
