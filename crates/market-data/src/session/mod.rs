//! SmartAPI session lifecycle.
//!
//! Owns the authenticated session: login, token storage and the identity
//! headers required on every authenticated call. The session is shared
//! mutable state across all concurrent requests, so it lives behind a
//! `RwLock`; logins are serialized behind a separate mutex so two concurrent
//! `login()` calls can never interleave token writes.
//!
//! There is no automatic token refresh. Expiry is discovered by the next
//! authenticated call failing, at which point the gateway invalidates the
//! stored session and the caller re-invokes [`SessionManager::login`].

pub mod identity;

use chrono::{DateTime, Utc};
use log::{error, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::config::GatewayConfig;
use crate::errors::MarketDataError;
use crate::totp;

pub use identity::NetworkIdentity;

const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";

/// Observable session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No successful login yet, or the last session was invalidated.
    Unauthenticated,
    /// A login is in flight.
    Authenticating,
    /// A session is stored and usable.
    Authenticated,
}

/// An authenticated SmartAPI session.
///
/// Mutated only on (re-)login and never persisted beyond process lifetime.
#[derive(Clone, Debug)]
pub struct Session {
    pub jwt_token: String,
    pub refresh_token: String,
    pub feed_token: String,
    pub issued_at: DateTime<Utc>,
    pub identity: NetworkIdentity,
}

enum Slot {
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    clientcode: &'a str,
    password: &'a str,
    totp: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<LoginData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    jwt_token: Option<String>,
    refresh_token: Option<String>,
    feed_token: Option<String>,
}

/// Manages the SmartAPI session lifecycle.
pub struct SessionManager {
    config: GatewayConfig,
    client: reqwest::Client,
    slot: RwLock<Slot>,
    // Single authentication in flight at a time.
    login_gate: Mutex<()>,
}

impl SessionManager {
    /// Create a session manager in the `Unauthenticated` state.
    ///
    /// # Errors
    /// Returns [`MarketDataError::UpstreamUnavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                MarketDataError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            client,
            slot: RwLock::new(Slot::Unauthenticated),
            login_gate: Mutex::new(()),
        })
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        match *self.slot.read().await {
            Slot::Unauthenticated => SessionState::Unauthenticated,
            Slot::Authenticating => SessionState::Authenticating,
            Slot::Authenticated(_) => SessionState::Authenticated,
        }
    }

    /// Whether a usable session is stored.
    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.slot.read().await, Slot::Authenticated(_))
    }

    /// A copy of the stored session, if any.
    pub async fn session(&self) -> Option<Session> {
        match &*self.slot.read().await {
            Slot::Authenticated(session) => Some(session.clone()),
            _ => None,
        }
    }

    /// Drop the stored session.
    ///
    /// Called by the gateway when an authenticated call comes back with an
    /// auth rejection, which is how expiry is discovered.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        if matches!(*slot, Slot::Authenticated(_)) {
            info!("SmartAPI session invalidated, re-login required");
            *slot = Slot::Unauthenticated;
        }
    }

    /// Authenticate against the upstream login endpoint.
    ///
    /// Gathers network identity (best-effort, placeholder fallbacks),
    /// generates a TOTP code and submits client code + password + TOTP. On
    /// success the session transitions to `Authenticated`; on any failure it
    /// returns to `Unauthenticated` and the error is logged as well as
    /// returned, so unattended callers can rely on the log while direct
    /// callers can inspect the result.
    ///
    /// A re-login leaves the existing session in place until the
    /// replacement is stored, so concurrent reads keep working against the
    /// old tokens for the duration of the attempt.
    pub async fn login(&self) -> Result<(), MarketDataError> {
        let _gate = self.login_gate.lock().await;

        {
            // A still-valid session keeps serving reads until the
            // replacement is ready; the slot is only rewritten once the
            // attempt completes.
            let mut slot = self.slot.write().await;
            if matches!(*slot, Slot::Unauthenticated) {
                *slot = Slot::Authenticating;
            }
        }

        match self.attempt_login().await {
            Ok(session) => {
                info!(
                    "SmartAPI login succeeded for client {}",
                    self.config.client_code
                );
                let mut slot = self.slot.write().await;
                *slot = Slot::Authenticated(session);
                Ok(())
            }
            Err(e) => {
                error!("SmartAPI login failed: {}", e);
                let mut slot = self.slot.write().await;
                *slot = Slot::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn attempt_login(&self) -> Result<Session, MarketDataError> {
        let identity =
            NetworkIdentity::detect(&self.client, &self.config.public_ip_lookup_url).await;
        let totp_code = totp::totp_now(&self.config.totp_secret)?;

        let url = format!("{}{}", self.config.base_url, LOGIN_PATH);
        let body = LoginRequest {
            clientcode: &self.config.client_code,
            password: &self.config.password,
            totp: &totp_code,
        };

        let response = self
            .client
            .post(&url)
            .headers(identity_headers(&identity, &self.config.api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| MarketDataError::AuthFailure(format!("login request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MarketDataError::AuthFailure(format!("login response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(MarketDataError::AuthFailure(format!(
                "login rejected with status {}: {}",
                status, text
            )));
        }

        let parsed: LoginResponse = serde_json::from_str(&text).map_err(|e| {
            MarketDataError::AuthFailure(format!("login response not parseable: {}", e))
        })?;

        if !parsed.status {
            return Err(MarketDataError::AuthFailure(format!(
                "login rejected: {}",
                parsed.message
            )));
        }

        let data = parsed
            .data
            .ok_or_else(|| MarketDataError::AuthFailure("login response has no data".to_string()))?;

        match (data.jwt_token, data.refresh_token, data.feed_token) {
            (Some(jwt_token), Some(refresh_token), Some(feed_token)) => Ok(Session {
                jwt_token,
                refresh_token,
                feed_token,
                issued_at: Utc::now(),
                identity,
            }),
            _ => Err(MarketDataError::AuthFailure(
                "login response is missing token fields".to_string(),
            )),
        }
    }

    /// Headers for an authenticated request: bearer token plus the
    /// identification headers the upstream API requires.
    ///
    /// # Errors
    /// Returns [`MarketDataError::SessionNotReady`] while unauthenticated;
    /// no network call is attempted in that case.
    pub async fn authorized_headers(&self) -> Result<HeaderMap, MarketDataError> {
        let slot = self.slot.read().await;
        let session = match &*slot {
            Slot::Authenticated(session) => session,
            _ => return Err(MarketDataError::SessionNotReady),
        };

        let mut headers = identity_headers(&session.identity, &self.config.api_key)?;
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", session.jwt_token)
                .parse()
                .map_err(|_| {
                    MarketDataError::AuthFailure(
                        "session token contains characters invalid in a header".to_string(),
                    )
                })?,
        );
        Ok(headers)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// The identification headers sent on both login and authenticated calls.
fn identity_headers(
    identity: &NetworkIdentity,
    api_key: &str,
) -> Result<HeaderMap, MarketDataError> {
    let parse = |value: &str, what: &str| -> Result<HeaderValue, MarketDataError> {
        value.parse().map_err(|_| {
            MarketDataError::AuthFailure(format!(
                "{} contains characters invalid in a header",
                what
            ))
        })
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("X-UserType", HeaderValue::from_static("USER"));
    headers.insert("X-SourceID", HeaderValue::from_static("WEB"));
    headers.insert("X-ClientLocalIP", parse(&identity.local_ip, "local IP")?);
    headers.insert("X-ClientPublicIP", parse(&identity.public_ip, "public IP")?);
    headers.insert("X-MACAddress", parse(&identity.mac_address, "MAC address")?);
    headers.insert("X-PrivateKey", parse(api_key, "API key")?);
    Ok(headers)
}
