//! HTTP plumbing shared by both transports.
//!
//! A thin wrapper over a pooled `reqwest` client: bounded timeouts, TLS verification on
//! unless explicitly disabled, header injection checks, and non-success statuses turned
//! into [`TransportFault::Status`].

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::{TransportFault, config::HttpConfig};
use crate::error::{GatewayError, Result};

/// Parameters for one POST request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext<'a> {
    /// Absolute request URL, without query string.
    pub url: &'a str,
    /// Query parameters, URL-encoded on send.
    pub query: Vec<(&'a str, &'a str)>,
    /// Additional HTTP headers.
    pub headers: Vec<(&'a str, &'a str)>,
    /// Content-Type header value (if applicable).
    pub content_type: Option<&'a str>,
}

/// Successful HTTP response.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> std::result::Result<(), TransportFault> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(TransportFault::InvalidHeader(
            "header name contains control characters".to_owned(),
        ));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(TransportFault::InvalidHeader(format!(
            "value of {name} contains control characters"
        )));
    }
    Ok(())
}

/// Pooled HTTP client used by the gateway transports.
///
/// Cloning is cheap and shares the connection pool.
///
/// # Examples
///
/// ```
/// use iveri_gateway::transport::{HttpConfig, HttpTransport};
///
/// let config = HttpConfig { timeout_secs: 20, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with default settings (30 s timeout, 10 s connect timeout,
    /// TLS verification on).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClient`] if the client cannot be constructed.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if the settings are out of range, or
    /// [`GatewayError::HttpClient`] if the client cannot be constructed.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(GatewayError::HttpClient)?;

        Ok(Self { client })
    }

    /// Sends a POST request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportFault`] if the URL or a header is invalid, the request fails,
    /// or the gateway answers with a non-success status.
    #[instrument(skip(self, ctx, body), fields(url = ctx.url, body_len = body.len()))]
    pub async fn post(
        &self,
        ctx: RequestContext<'_>,
        body: Vec<u8>,
    ) -> std::result::Result<TransportResponse, TransportFault> {
        let url = Url::parse(ctx.url).map_err(|e| TransportFault::InvalidUrl(e.to_string()))?;

        for (name, value) in &ctx.headers {
            validate_header(name, value)?;
        }

        let mut request = self.client.post(url);

        if !ctx.query.is_empty() {
            request = request.query(&ctx.query);
        }

        if let Some(content_type) = ctx.content_type {
            request = request.header("Content-Type", content_type);
        }

        for (name, value) in ctx.headers {
            request = request.header(name, value);
        }

        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(TransportFault::Status(status.as_u16()));
        }

        let body = response.bytes().await?.to_vec();
        debug!(status = status.as_u16(), body_len = body.len(), "gateway responded");

        Ok(TransportResponse { status: status.as_u16(), body })
    }
}
