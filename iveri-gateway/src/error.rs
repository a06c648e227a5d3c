//! Error types for the iVeri gateway adapter.
//!
//! Only caller mistakes surface as [`GatewayError`]: missing fields at `build()` time,
//! submitting something that was never built, or unreadable configuration files.
//! Anything that goes wrong on the wire is folded into a
//! [`TransactionResult`](crate::transaction::TransactionResult) instead, so callers never
//! have to catch network failures.
//!
//! # Error Categories
//!
//! - **Validation Errors** ([`GatewayError::ConfigurationValidation`],
//!   [`GatewayError::TransactionValidation`]): a required field is missing
//! - **Precondition Errors** ([`GatewayError::Precondition`]): an unbuilt configuration or
//!   transaction reached the adapter
//! - **Setup Errors** ([`GatewayError::InvalidConfig`], [`GatewayError::HttpClient`]):
//!   configuration file or HTTP client construction failed
//!
//! # Examples
//!
//! ```
//! use iveri_gateway::error::{GatewayError, Result};
//!
//! fn require(value: Option<&str>) -> Result<&str> {
//!     value.ok_or_else(|| {
//!         GatewayError::ConfigurationValidation("The Username is required".to_owned())
//!     })
//! }
//!
//! assert!(require(None).is_err());
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors returned to the caller by the gateway adapter.
///
/// Transport and gateway-reported failures are deliberately absent: those become a
/// failed [`TransactionResult`](crate::transaction::TransactionResult) carrying a
/// resolved message.
///
/// This type implements `#[must_use]` to ensure errors are not silently ignored.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration `build()` found a missing or malformed required field.
    ///
    /// Carries the message for the first failing field, in declaration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use iveri_gateway::error::GatewayError;
    ///
    /// let err = GatewayError::ConfigurationValidation("The Password is required".to_owned());
    /// assert_eq!(err.to_string(), "Cannot build config: The Password is required");
    /// ```
    #[error("Cannot build config: {0}")]
    ConfigurationValidation(String),

    /// Transaction `build()` found the kind or a kind-specific field missing.
    ///
    /// The message names both the missing field and the transaction kind.
    #[error("Cannot build transaction: {0}")]
    TransactionValidation(String),

    /// An unbuilt configuration or transaction was handed to the adapter.
    ///
    /// This is a caller bug. The adapter refuses to touch the network.
    #[error("{0}")]
    Precondition(String),

    /// A transaction kind string did not name one of the supported kinds.
    #[error("{0}")]
    InvalidTransactionKind(String),

    /// Configuration file could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client could not be constructed.
    ///
    /// Only raised while building an adapter; request failures never use this variant.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_validation_display() {
        let error = GatewayError::ConfigurationValidation("The Gateway is required".into());
        assert_eq!(error.to_string(), "Cannot build config: The Gateway is required");
    }

    #[test]
    fn test_transaction_validation_display() {
        let error = GatewayError::TransactionValidation(
            "The PAN Number is required for DEBIT transactions".into(),
        );
        assert_eq!(
            error.to_string(),
            "Cannot build transaction: The PAN Number is required for DEBIT transactions"
        );
    }

    #[test]
    fn test_precondition_passes_message_through() {
        let error = GatewayError::Precondition("Cannot use unbuilt configuration".to_owned());
        assert_eq!(error.to_string(), "Cannot use unbuilt configuration");
    }

    #[test]
    fn test_invalid_config_display() {
        let error = GatewayError::InvalidConfig("missing field `username`".to_owned());
        assert!(error.to_string().starts_with("Invalid configuration"));
    }
}
