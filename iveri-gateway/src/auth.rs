//! `Authorization` header generation for the REST gateway.
//!
//! The gateway verifies a token derived from the request target, a timestamp and the
//! account password:
//!
//! ```text
//! token = base64(sha256(gateway_url || endpoint || timestamp || md5(password)))
//! ```
//!
//! where `md5(password)` is the raw 16-byte digest and `||` is byte concatenation.
//! The timestamp is local time formatted as `YYYYMMDDHHMMSS` followed by a literal
//! `500` in place of milliseconds. The verifier expects exactly this format.

use chrono::{DateTime, Local, TimeZone};
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::config::Configuration;

/// `chrono` format producing the gateway timestamp.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S500";

/// Formats a timestamp the way the gateway verifier expects.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use iveri_gateway::auth::format_timestamp;
///
/// let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(format_timestamp(&at), "20240102030405500");
/// ```
#[must_use]
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Computes the request token.
///
/// Deterministic: identical inputs always produce the identical token.
#[must_use]
pub fn compute_token(gateway_url: &str, endpoint: &str, timestamp: &str, password: &str) -> String {
    let password_digest = Md5::digest(password.as_bytes());
    let hash = Sha256::new()
        .chain_update(gateway_url.as_bytes())
        .chain_update(endpoint.as_bytes())
        .chain_update(timestamp.as_bytes())
        .chain_update(password_digest)
        .finalize();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, hash)
}

/// Composes the full header value for a given timestamp.
///
/// # Examples
///
/// ```
/// use iveri_gateway::auth::compose;
///
/// let header = compose(
///     "https://portal.nedsecure.co.za/api/",
///     "transactions",
///     "20240102030405500",
///     "group-1",
///     "merchant",
///     "secret",
/// );
/// assert!(header.starts_with("Basic usergroup=\"group-1\", username=\"merchant\""));
/// ```
#[must_use]
pub fn compose(
    gateway_url: &str,
    endpoint: &str,
    timestamp: &str,
    user_group_id: &str,
    username: &str,
    password: &str,
) -> String {
    let token = compute_token(gateway_url, endpoint, timestamp, password);
    format!(
        "Basic usergroup=\"{user_group_id}\", username=\"{username}\", timestamp=\"{timestamp}\", token=\"{token}\""
    )
}

/// Builds the header value for `endpoint` using the current local time.
#[must_use]
pub fn authorization_header(config: &Configuration, endpoint: &str) -> String {
    let timestamp = format_timestamp(&Local::now());
    compose(
        config.gateway(),
        endpoint,
        &timestamp,
        config.user_group_id(),
        config.username(),
        config.password(),
    )
}
