//! Live price seam between the domain services and the gateway.
//!
//! The valuation engine and the watchlist refresher both issue one upstream
//! call per instrument. That strategy is deliberately isolated behind this
//! trait so a batched implementation can be substituted without touching
//! the callers.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use assetserve_market_data::client::CandleInterval;
use assetserve_market_data::{MarketDataError, SmartApiClient};

/// Provider of current prices for tracked instruments.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Last traded price for a fully identified instrument.
    async fn last_traded_price(
        &self,
        exchange: &str,
        symbol: &str,
        token: &str,
    ) -> std::result::Result<Decimal, MarketDataError>;

    /// Most recent close for a bare symbol token, derived from recent
    /// one-minute candles. Used by the watchlist, which stores tokens only.
    async fn latest_close(
        &self,
        exchange: &str,
        token: &str,
    ) -> std::result::Result<Decimal, MarketDataError>;
}

/// [`PriceSource`] backed by the SmartAPI gateway client.
pub struct GatewayPriceSource {
    client: Arc<SmartApiClient>,
}

impl GatewayPriceSource {
    pub fn new(client: Arc<SmartApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceSource for GatewayPriceSource {
    async fn last_traded_price(
        &self,
        exchange: &str,
        symbol: &str,
        token: &str,
    ) -> std::result::Result<Decimal, MarketDataError> {
        self.client
            .try_last_traded_price(exchange, symbol, token)
            .await
    }

    async fn latest_close(
        &self,
        exchange: &str,
        token: &str,
    ) -> std::result::Result<Decimal, MarketDataError> {
        // Previous trading day's open through today's close, one-minute
        // buckets; the last candle carries the freshest close.
        let today = Utc::now().date_naive();
        let from_date = format!("{} 09:15", (today - Duration::days(1)).format("%Y-%m-%d"));
        let to_date = format!("{} 15:30", today.format("%Y-%m-%d"));

        let candles = self
            .client
            .try_candles(exchange, token, CandleInterval::OneMinute, &from_date, &to_date)
            .await?;

        let last = candles.last().ok_or_else(|| {
            MarketDataError::UpstreamUnavailable(format!(
                "no recent candle data for token {}",
                token
            ))
        })?;

        Ok(Decimal::try_from(last.close).unwrap_or_default())
    }
}
