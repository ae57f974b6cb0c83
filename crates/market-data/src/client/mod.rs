//! SmartAPI gateway client.
//!
//! One operation per upstream capability, all following the same shape:
//! build the request body, attach authorized headers from the session
//! manager (failing fast with `SessionNotReady` when no login happened),
//! issue the request, delegate to the parse layer.
//!
//! Every operation comes in two flavors:
//! - `try_*` returns `Result` so callers can distinguish degraded data from
//!   true absence;
//! - the plain variant degrades to an empty/zero value with a warning log,
//!   because market-data unavailability must not break the rest of the
//!   application (a dashboard rendering partial data beats an error page).

pub mod parse;

use log::warn;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{Candle, Holding, IndexQuote, PutCallRatio};
use crate::registry;
use crate::session::SessionManager;

const QUOTE_PATH: &str = "/rest/secure/angelbroking/market/v1/quote/";
const CANDLE_PATH: &str = "/rest/secure/angelbroking/historical/v1/getCandleData";
const HOLDING_PATH: &str = "/rest/secure/angelbroking/portfolio/v1/getHolding";
const SEARCH_PATH: &str = "/rest/secure/angelbroking/order/v1/searchScrip";
const PCR_PATH: &str = "/rest/secure/angelbroking/marketData/v1/putCallRatio";

/// Historical candle interval buckets supported by the upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandleInterval {
    OneMinute,
    ThreeMinute,
    FiveMinute,
    TenMinute,
    FifteenMinute,
    ThirtyMinute,
    OneHour,
    OneDay,
}

impl CandleInterval {
    /// The interval name expected by the candle endpoint.
    pub fn as_api_value(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "ONE_MINUTE",
            CandleInterval::ThreeMinute => "THREE_MINUTE",
            CandleInterval::FiveMinute => "FIVE_MINUTE",
            CandleInterval::TenMinute => "TEN_MINUTE",
            CandleInterval::FifteenMinute => "FIFTEEN_MINUTE",
            CandleInterval::ThirtyMinute => "THIRTY_MINUTE",
            CandleInterval::OneHour => "ONE_HOUR",
            CandleInterval::OneDay => "ONE_DAY",
        }
    }
}

/// Client for the authenticated SmartAPI endpoints.
pub struct SmartApiClient {
    session: Arc<SessionManager>,
    client: reqwest::Client,
}

impl SmartApiClient {
    /// Create a client sharing the given session.
    ///
    /// # Errors
    /// Returns [`MarketDataError::UpstreamUnavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(session: Arc<SessionManager>) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(session.config().timeout_secs))
            .build()
            .map_err(|e| {
                MarketDataError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { session, client })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.session.config().base_url, path)
    }

    /// Send an authenticated request and return the raw response once its
    /// status has been vetted.
    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, MarketDataError> {
        let headers = self.session.authorized_headers().await?;
        let response = request.headers(headers).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Expiry is discovered here: drop the session so the caller can
            // re-login cleanly.
            self.session.invalidate().await;
            return Err(MarketDataError::AuthFailure(format!(
                "authenticated call rejected with status {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(MarketDataError::UpstreamUnavailable(format!(
                "upstream returned status {}",
                status
            )));
        }

        Ok(response)
    }

    /// Send an authenticated request and return the parsed JSON body.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, MarketDataError> {
        self.send_checked(request)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| MarketDataError::MalformedResponse(e.to_string()))
    }

    async fn authorized_post(&self, path: &str, body: Value) -> Result<Value, MarketDataError> {
        self.send(self.client.post(self.url(path)).json(&body)).await
    }

    async fn authorized_get(&self, path: &str) -> Result<Value, MarketDataError> {
        self.send(self.client.get(self.url(path))).await
    }

    /// Single-instrument quote in LTP-only mode.
    pub async fn try_last_traded_price(
        &self,
        exchange: &str,
        symbol: &str,
        token: &str,
    ) -> Result<Decimal, MarketDataError> {
        let exchange_tokens = HashMap::from([(exchange, vec![token])]);
        let body = json!({
            "mode": "LTP",
            "exchangeTokens": exchange_tokens,
        });
        let response = self.authorized_post(QUOTE_PATH, body).await?;
        let ltp = parse::parse_ltp(&response).map_err(|e| {
            MarketDataError::MalformedResponse(format!("ltp for {}: {}", symbol, e))
        })?;
        // try_from rounds away the binary-float noise, so 2895.4 comes out
        // as 2895.4 and not its full f64 expansion.
        Ok(Decimal::try_from(ltp).unwrap_or_default())
    }

    /// Degrading variant of [`Self::try_last_traded_price`]: zero on any
    /// failure.
    pub async fn last_traded_price(&self, exchange: &str, symbol: &str, token: &str) -> Decimal {
        match self.try_last_traded_price(exchange, symbol, token).await {
            Ok(price) => price,
            Err(e) => {
                warn!("ltp fetch failed for {} ({}): {}", symbol, token, e);
                Decimal::ZERO
            }
        }
    }

    /// Batched multi-instrument quote in FULL mode, keyed by symbol token.
    ///
    /// Tokens outside the known-index registry are dropped from the result,
    /// not surfaced as errors.
    pub async fn try_full_quotes(
        &self,
        tokens: &[String],
    ) -> Result<HashMap<String, IndexQuote>, MarketDataError> {
        let grouped = registry::group_by_exchange(tokens.iter().map(String::as_str));
        if grouped.is_empty() {
            return Ok(HashMap::new());
        }

        let body = json!({
            "mode": "FULL",
            "exchangeTokens": grouped,
        });
        let response = self.authorized_post(QUOTE_PATH, body).await?;

        let mut quotes = HashMap::new();
        for (token, record) in parse::parse_full_quote_records(&response)? {
            if let Some(name) = registry::index_name(&token) {
                quotes.insert(token, parse::quote_from_value(name, &record));
            }
        }
        Ok(quotes)
    }

    /// Degrading variant of [`Self::try_full_quotes`]: empty map on failure.
    pub async fn full_quotes(&self, tokens: &[String]) -> HashMap<String, IndexQuote> {
        match self.try_full_quotes(tokens).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("full quote fetch failed: {}", e);
                HashMap::new()
            }
        }
    }

    /// FULL quotes for every index in the registry.
    pub async fn index_quotes(&self) -> HashMap<String, IndexQuote> {
        let tokens: Vec<String> = registry::all_index_tokens()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.full_quotes(&tokens).await
    }

    /// Name -> last traded price for every index in the registry. Backs the
    /// dashboard price ticker.
    pub async fn indices_ltp(&self) -> HashMap<String, f64> {
        self.index_quotes()
            .await
            .into_values()
            .map(|quote| (quote.name, quote.ltp))
            .collect()
    }

    /// Historical candle series, ordered as returned by the upstream.
    ///
    /// Dates use the upstream format, e.g. `"2024-01-02 09:15"`.
    pub async fn try_candles(
        &self,
        exchange: &str,
        token: &str,
        interval: CandleInterval,
        from_date: &str,
        to_date: &str,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let body = json!({
            "exchange": exchange,
            "symboltoken": token,
            "interval": interval.as_api_value(),
            "fromdate": from_date,
            "todate": to_date,
        });
        let response = self.authorized_post(CANDLE_PATH, body).await?;
        parse::parse_candles(&response)
    }

    /// Degrading variant of [`Self::try_candles`]: empty series on failure.
    pub async fn candles(
        &self,
        exchange: &str,
        token: &str,
        interval: CandleInterval,
        from_date: &str,
        to_date: &str,
    ) -> Vec<Candle> {
        match self
            .try_candles(exchange, token, interval, from_date, to_date)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                warn!("candle fetch failed for token {}: {}", token, e);
                Vec::new()
            }
        }
    }

    /// Broker-side current holdings.
    pub async fn try_holdings(&self) -> Result<Vec<Holding>, MarketDataError> {
        let response = self.authorized_get(HOLDING_PATH).await?;
        parse::parse_holdings(&response)
    }

    /// Degrading variant of [`Self::try_holdings`]: empty list on failure.
    pub async fn holdings(&self) -> Vec<Holding> {
        match self.try_holdings().await {
            Ok(holdings) => holdings,
            Err(e) => {
                warn!("holdings fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Instrument search, returned as the raw upstream JSON text.
    ///
    /// Intentionally untyped: the routing layer consuming this owns its
    /// interpretation. Searches default to the NSE exchange.
    pub async fn try_search_instruments(&self, query: &str) -> Result<String, MarketDataError> {
        let body = json!({
            "exchange": "NSE",
            "searchscrip": query,
        });
        let response = self
            .send_checked(self.client.post(self.url(SEARCH_PATH)).json(&body))
            .await?;
        Ok(response.text().await?)
    }

    /// Degrading variant of [`Self::try_search_instruments`]: an empty JSON
    /// array on failure.
    pub async fn search_instruments(&self, query: &str) -> String {
        match self.try_search_instruments(query).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("instrument search failed for {:?}: {}", query, e);
                "[]".to_string()
            }
        }
    }

    /// Put/call ratios for the derivatives board.
    pub async fn try_put_call_ratios(&self) -> Result<Vec<PutCallRatio>, MarketDataError> {
        let response = self.authorized_get(PCR_PATH).await?;
        parse::parse_put_call_ratios(&response)
    }

    /// Degrading variant of [`Self::try_put_call_ratios`]: empty list on
    /// failure.
    pub async fn put_call_ratios(&self) -> Vec<PutCallRatio> {
        match self.try_put_call_ratios().await {
            Ok(ratios) => ratios,
            Err(e) => {
                warn!("put/call ratio fetch failed: {}", e);
                Vec::new()
            }
        }
    }
}
