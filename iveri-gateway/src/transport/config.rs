//! Client settings for calls to the iVeri gateway and the CardinalMPI service.
//!
//! Read from the `[http]` table of a gateway configuration file. Both transports
//! share one client built from these values.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// Upper bound for a single gateway round trip, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Upper bound for establishing a connection, in seconds.
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_IDLE_CONNECTIONS: usize = 10;

/// Timeouts and TLS policy for gateway calls.
///
/// A debit or 3-D Secure call waits at most `timeout_secs`. A call that runs out of
/// time is reported as a failed transaction, never retried.
///
/// ```toml
/// [http]
/// timeout_secs = 45
/// connect_timeout_secs = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Idle keep-alive connections retained per gateway host.
    #[serde(default = "default_idle_connections")]
    pub pool_max_idle_per_host: usize,

    /// Seconds a gateway round trip may take, `1..=300`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds allowed for connecting, `1..=60`. Never longer than `timeout_secs`
    /// in effect.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Skips TLS certificate verification.
    ///
    /// **Insecure.** Some iVeri test environments present certificates that do not
    /// verify. Only enable this against a test gateway you control.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: DEFAULT_IDLE_CONNECTIONS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            accept_invalid_certs: false,
        }
    }
}

impl HttpConfig {
    /// Checks both timeouts are set and within their ceilings.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] naming the offending `[http]` key.
    pub fn validate(&self) -> Result<()> {
        check_seconds("timeout_secs", self.timeout_secs, MAX_TIMEOUT_SECS)?;
        check_seconds("connect_timeout_secs", self.connect_timeout_secs, MAX_CONNECT_TIMEOUT_SECS)
    }

    /// Limit for a whole gateway round trip.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Limit for connecting, capped at [`timeout`](Self::timeout).
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.min(self.timeout_secs))
    }
}

fn check_seconds(key: &str, value: u64, max: u64) -> Result<()> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(GatewayError::InvalidConfig(format!(
            "[http] {key} = {value} is outside 1..={max} seconds"
        )))
    }
}

const fn default_idle_connections() -> usize {
    DEFAULT_IDLE_CONNECTIONS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
