//! Gateway transports.
//!
//! Two wire protocols reach the same gateway:
//!
//! - [`RestTransport`]: JSON debit with a signed `Authorization` header, 3-D Secure through
//!   the CardinalMPI service ([`centinel`]).
//! - [`LegacyTransport`]: SOAP operations returning pipe-delimited `Key||Value` strings.
//!
//! Both implement the sealed [`GatewayProtocol`] strategy trait and always produce a
//! [`TransactionResult`]. Network failures, bad status codes and unreadable bodies are
//! [`TransportFault`]s internally and are converted into failed results with a fixed
//! code, so nothing from the HTTP layer escapes to the caller.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use iveri_gateway::{
//!     config::Configuration,
//!     transaction::{NoopListener, Transaction},
//!     transport::{GatewayProtocol, HttpTransport, RestTransport},
//! };
//!
//! # async fn example(config: Configuration, debit: Transaction) -> iveri_gateway::error::Result<()> {
//! let transport = RestTransport::new(HttpTransport::new()?);
//! let result = transport.debit(&config, &debit).await;
//! println!("success: {}", result.is_success());
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use thiserror::Error;
use tracing::warn;

use crate::{
    codes::CONNECTION_ERROR,
    config::Configuration,
    transaction::{Transaction, TransactionKind, TransactionResult},
};

pub mod centinel;
pub mod config;
pub mod http;
pub mod legacy;
pub mod rest;
mod sealed;

#[cfg(test)]
mod tests;

pub use config::HttpConfig;
pub use http::{HttpTransport, RequestContext, TransportResponse};
pub use legacy::LegacyTransport;
pub use rest::RestTransport;

/// Failure below the gateway protocol: the request could not be sent or the response
/// could not be read.
#[derive(Debug, Error)]
pub enum TransportFault {
    /// Connection, TLS, timeout or body read failure.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success HTTP status.
    #[error("gateway responded with HTTP status {0}")]
    Status(u16),

    /// Request URL did not parse.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Header name or value contained control characters.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Gateway wire protocol.
///
/// This trait is sealed; only the transports in this crate implement it. Each method
/// performs exactly one network call and never fails: every fault is folded into the
/// returned [`TransactionResult`].
pub trait GatewayProtocol: sealed::private::Sealed + Send + Sync {
    /// Performs a 3-D Secure enrolment lookup.
    fn lookup<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> impl Future<Output = TransactionResult> + Send + 'a;

    /// Authenticates the issuer's PARes for a prior lookup.
    fn authorize<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> impl Future<Output = TransactionResult> + Send + 'a;

    /// Debits the card.
    fn debit<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> impl Future<Output = TransactionResult> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

/// Converts a REST-family transport fault into the `N0001` result.
pub(crate) fn connection_failure(kind: TransactionKind, fault: &TransportFault) -> TransactionResult {
    warn!(kind = %kind, error = %fault, "gateway request failed");
    TransactionResult::failure(kind, CONNECTION_ERROR, Some(&format!("Connection Error: {fault}")))
}
