//! iVeri Gateway: card payments and 3-D Secure over the iVeri gateway
//!
//! A Rust adapter that normalizes the two wire protocols of the iVeri card gateway
//! into one transaction lifecycle with a uniform result model.
//!
//! # What does it do?
//!
//! - **Two transports, one result**: the REST API (JSON debit with a signed
//!   `Authorization` header, 3-D Secure through the CardinalMPI service) and the legacy
//!   SOAP web service (pipe-delimited `Key||Value` responses) both produce a
//!   [`TransactionResult`](transaction::TransactionResult)
//! - **3-D Secure flow**: enrolment lookup, PARes authentication, then a debit carrying
//!   the CAVV/XID/ECI of the authentication
//! - **Deterministic lifecycle**: every attempt fires `*_initiated` followed by exactly
//!   one of `*_succeeded` / `*_failed` on the transaction's listener
//! - **No transport errors to catch**: connection failures, timeouts and unreadable
//!   responses become failed results with a resolved, human-readable message
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Caller          │  builds Configuration + Transaction
//! └────────┬─────────┘
//!          │ perform_transaction / submit_transaction
//! ┌────────▼──────────────────────────────────────────┐
//! │  ProtocolAdapter                                  │
//! │  ┌──────────────────┐     ┌────────────────────┐  │
//! │  │  RestTransport   │     │  LegacyTransport   │  │
//! │  │  (JSON + CMPI)   │     │  (SOAP, Key||Val)  │  │
//! │  └──────────────────┘     └────────────────────┘  │
//! └────────┬──────────────────────────────────────────┘
//!          │ HTTPS
//! ┌────────▼─────────┐
//! │  iVeri gateway   │  + CardinalMPI for REST 3-D Secure
//! └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use iveri_gateway::{
//!     IveriGateway,
//!     config::Configuration,
//!     transaction::{TracingListener, Transaction},
//! };
//! use rust_decimal::Decimal;
//!
//! # async fn example() -> iveri_gateway::Result<()> {
//! let config = Configuration::new()
//!     .with_user_group_id("{USER-GROUP}")
//!     .with_username("merchant")
//!     .with_password("secret")
//!     .with_application_id("{APPLICATION}")
//!     .with_certificate_id("{CERTIFICATE}")
//!     .with_live(false)
//!     .build()?;
//!
//! let debit = Transaction::debit(Arc::new(TracingListener))
//!     .with_amount(Decimal::new(19_999, 2))
//!     .with_currency("ZAR")
//!     .with_pan_holder_name("J Smith")
//!     .with_pan_number("4111111111111111")
//!     .with_pan_code("123")
//!     .with_pan_expiry(12, 2030)
//!     .with_reference("order-42")
//!     .build()?;
//!
//! let mut gateway = IveriGateway::new(config)?;
//! gateway.set_transaction(debit)?;
//! let debit = gateway.submit_transaction().await?;
//!
//! if debit.succeeds() {
//!     println!("authorised: {:?}", debit.echo().authorisation_code);
//! } else {
//!     println!("{}: {}", debit.error_code().unwrap_or("?"), debit.error_message().unwrap_or(""));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: gateway credentials, protocol selection, endpoints, TOML loading
//! - [`transaction`]: transaction model, validation gate, listener, results
//! - [`adapter`]: dispatch of one transaction to the configured transport
//! - [`transport`]: REST, CardinalMPI and legacy wire handling
//! - [`auth`]: REST `Authorization` header
//! - [`codes`]: result code catalog and message fallback
//! - [`card`]: card brand, ECI flag and currency lookups
//! - [`error`]: caller-facing errors

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and wiremock"
)]

pub mod adapter;
pub mod auth;
pub mod card;
pub mod codes;
pub mod config;
pub mod error;
pub mod gateway;
pub mod transaction;
pub mod transport;

pub use adapter::ProtocolAdapter;
pub use config::{Configuration, Protocol};
pub use error::{GatewayError, Result};
pub use gateway::IveriGateway;
pub use transaction::{Transaction, TransactionKind, TransactionListener, TransactionResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_reexports_drive_a_transaction() {
        let config = Configuration::new()
            .with_user_group_id("group-1")
            .with_username("merchant")
            .with_password("secret")
            .with_application_id("{APP}")
            .with_certificate_id("{CERT}")
            .with_live(false)
            .with_protocol(Protocol::Legacy);
        assert!(!config.is_built());
        let config = config.build().unwrap();
        assert_eq!(config.protocol(), Protocol::Legacy);

        let err = IveriGateway::new(Configuration::new()).unwrap_err();
        assert!(matches!(err, GatewayError::Precondition(_)));
        assert!(ProtocolAdapter::for_configuration(&config).is_ok());

        assert_eq!("DEBIT".parse::<TransactionKind>().unwrap(), TransactionKind::Debit);
        let failed = TransactionResult::failure(TransactionKind::Debit, "X001", None);
        assert!(!failed.is_success());
        assert_eq!(failed.error_message(), Some("An unexpected internal network error has occurred."));
    }
}
