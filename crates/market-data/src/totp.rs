//! Time-based one-time password generation (RFC 6238).
//!
//! SmartAPI logins require a 6-digit TOTP derived from a base32 shared
//! secret, exactly what an authenticator app would produce: HMAC-SHA1,
//! 30-second time step, zero-padded output.
//!
//! Generation is deterministic given (secret, time) and has no side effects.

use chrono::Utc;
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::MarketDataError;

/// TOTP time step in seconds.
const TIME_STEP_SECS: u64 = 30;

/// Number of output digits.
const DIGITS: u32 = 6;

/// Generate the TOTP code for the current 30-second window.
///
/// # Errors
/// Returns [`MarketDataError::InvalidSecret`] if the secret is not valid
/// base32.
pub fn totp_now(secret: &str) -> Result<String, MarketDataError> {
    totp_at(secret, Utc::now().timestamp() as u64)
}

/// Generate the TOTP code for the window containing `unix_seconds`.
pub fn totp_at(secret: &str, unix_seconds: u64) -> Result<String, MarketDataError> {
    let key = decode_secret(secret)?;
    let counter = unix_seconds / TIME_STEP_SECS;
    Ok(hotp(&key, counter))
}

/// Decode a base32 shared secret, tolerating lowercase, spaces and padding.
fn decode_secret(secret: &str) -> Result<Vec<u8>, MarketDataError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(MarketDataError::InvalidSecret(
            "secret is empty".to_string(),
        ));
    }

    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|e| MarketDataError::InvalidSecret(e.to_string()))
}

/// HMAC-based one-time password (RFC 4226) with dynamic truncation.
fn hotp(key: &[u8], counter: u64) -> String {
    // HMAC accepts keys of any length, new_from_slice cannot fail.
    let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((u32::from(digest[offset]) & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    format!("{:06}", binary % 10u32.pow(DIGITS))
}
