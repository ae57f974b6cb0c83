//! Gateway configuration.
//!
//! Credentials and endpoint settings for the SmartAPI connection. Values are
//! usually sourced from the environment at startup; tests construct the
//! struct directly and point `base_url` at a local mock server.

use crate::errors::MarketDataError;

/// Default SmartAPI REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://apiconnect.angelone.in";

/// Default request timeout in seconds. Upstream calls must never hang
/// indefinitely; a timeout is treated like any other fetch failure.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default endpoint used to discover the caller's public IP during login.
pub const DEFAULT_PUBLIC_IP_LOOKUP_URL: &str = "https://checkip.amazonaws.com";

/// SmartAPI gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// SmartAPI application key (sent as `X-PrivateKey`).
    pub api_key: String,
    /// Broker client code (sent as `clientcode` at login).
    pub client_code: String,
    /// Broker account PIN/password.
    pub password: String,
    /// Base32 shared secret for TOTP generation.
    pub totp_secret: String,
    /// REST base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Public IP lookup endpoint used during login identity detection.
    pub public_ip_lookup_url: String,
}

impl GatewayConfig {
    /// Create a configuration with default endpoint settings.
    pub fn new(
        api_key: impl Into<String>,
        client_code: impl Into<String>,
        password: impl Into<String>,
        totp_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            client_code: client_code.into(),
            password: password.into(),
            totp_secret: totp_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            public_ip_lookup_url: DEFAULT_PUBLIC_IP_LOOKUP_URL.to_string(),
        }
    }

    /// Load the configuration from `SMARTAPI_*` environment variables.
    ///
    /// Required: `SMARTAPI_API_KEY`, `SMARTAPI_CLIENT_CODE`,
    /// `SMARTAPI_PASSWORD`, `SMARTAPI_TOTP_SECRET`.
    /// Optional: `SMARTAPI_BASE_URL`, `SMARTAPI_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, MarketDataError> {
        let require = |key: &str| {
            std::env::var(key).map_err(|_| {
                MarketDataError::AuthFailure(format!("missing environment variable {}", key))
            })
        };

        let mut config = Self::new(
            require("SMARTAPI_API_KEY")?,
            require("SMARTAPI_CLIENT_CODE")?,
            require("SMARTAPI_PASSWORD")?,
            require("SMARTAPI_TOTP_SECRET")?,
        );

        if let Ok(url) = std::env::var("SMARTAPI_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(secs) = std::env::var("SMARTAPI_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse() {
                config.timeout_secs = parsed;
            }
        }

        Ok(config)
    }
}
