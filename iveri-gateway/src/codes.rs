//! Result code catalog.
//!
//! Maps gateway and adapter error codes to display messages and implements the
//! three-tier message resolution used for every failed transaction:
//!
//! 1. a message supplied by the gateway response, with `&apos;` decoded
//! 2. the catalog entry for the code
//! 3. the generic [`UNEXPECTED_ERROR`] message
//!
//! # Examples
//!
//! ```
//! use iveri_gateway::codes::{ResultCodeCatalog, UNEXPECTED_ERROR};
//!
//! assert_eq!(ResultCodeCatalog::resolve(Some("9"), Some("it&apos;s ok")), "it's ok");
//! assert_eq!(
//!     ResultCodeCatalog::resolve(Some("does-not-exist"), None),
//!     ResultCodeCatalog::message(UNEXPECTED_ERROR).unwrap_or_default(),
//! );
//! ```

use std::{collections::HashMap, sync::LazyLock};

/// Legacy transport could not reach the gateway.
pub const COMMUNICATION_ERROR: &str = "X000";

/// Generic fallback for unknown codes and legacy responses without `Result`.
pub const UNEXPECTED_ERROR: &str = "X001";

/// REST response was well formed but carried no `Transaction.Result`.
pub const UNEXPECTED_RESPONSE: &str = "X0002";

/// REST transport failed before a response could be read.
pub const CONNECTION_ERROR: &str = "N0001";

/// Entity the gateway uses for apostrophes inside error descriptions.
const APOSTROPHE_ENTITY: &str = "&apos;";

static CATALOG: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (
            COMMUNICATION_ERROR,
            "There was an error communicating with the payment gateway. Please try again in a minute.",
        ),
        (UNEXPECTED_ERROR, "An unexpected internal network error has occurred."),
        (
            UNEXPECTED_RESPONSE,
            "Response Error: Received an unexpected response from the Iveri API",
        ),
        (CONNECTION_ERROR, "Connection Error: The payment gateway could not be reached."),
    ])
});

/// Process-wide, immutable code to message table.
#[derive(Debug, Clone, Copy)]
pub struct ResultCodeCatalog;

impl ResultCodeCatalog {
    /// Returns the catalog message for `code`, if the code is known.
    #[must_use]
    pub fn message(code: &str) -> Option<&'static str> {
        CATALOG.get(code).copied()
    }

    /// Resolves the display message for a failed transaction.
    ///
    /// Never returns an empty string.
    #[must_use]
    pub fn resolve(code: Option<&str>, supplied: Option<&str>) -> String {
        if let Some(message) = supplied.map(decode_apostrophes)
            && !message.trim().is_empty()
        {
            return message;
        }

        code.and_then(Self::message)
            .or_else(|| Self::message(UNEXPECTED_ERROR))
            .unwrap_or("An unexpected internal network error has occurred.")
            .to_owned()
    }
}

/// Replaces every `&apos;` entity with a literal apostrophe.
#[must_use]
pub fn decode_apostrophes(message: &str) -> String {
    message.replace(APOSTROPHE_ENTITY, "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_message_wins() {
        let message = ResultCodeCatalog::resolve(Some(COMMUNICATION_ERROR), Some("Card declined"));
        assert_eq!(message, "Card declined");
    }

    #[test]
    fn test_supplied_message_apostrophe_decoded() {
        let message = ResultCodeCatalog::resolve(Some("255"), Some("it&apos;s ok"));
        assert_eq!(message, "it's ok");
    }

    #[test]
    fn test_blank_supplied_message_falls_through_to_catalog() {
        let message = ResultCodeCatalog::resolve(Some(COMMUNICATION_ERROR), Some("  "));
        assert_eq!(
            message,
            "There was an error communicating with the payment gateway. Please try again in a minute."
        );
    }

    #[test]
    fn test_catalog_lookup_by_code() {
        let message = ResultCodeCatalog::resolve(Some(UNEXPECTED_RESPONSE), None);
        assert_eq!(message, "Response Error: Received an unexpected response from the Iveri API");
    }

    #[test]
    fn test_unknown_code_uses_generic_message() {
        let message = ResultCodeCatalog::resolve(Some("-1"), None);
        assert_eq!(message, "An unexpected internal network error has occurred.");
    }

    #[test]
    fn test_missing_code_uses_generic_message() {
        assert_eq!(
            ResultCodeCatalog::resolve(None, None),
            "An unexpected internal network error has occurred."
        );
    }

    #[test]
    fn test_resolution_is_stable() {
        let first = ResultCodeCatalog::resolve(Some(CONNECTION_ERROR), None);
        let second = ResultCodeCatalog::resolve(Some(CONNECTION_ERROR), None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_catalog_entry_is_non_empty() {
        for code in [COMMUNICATION_ERROR, UNEXPECTED_ERROR, UNEXPECTED_RESPONSE, CONNECTION_ERROR] {
            let message = ResultCodeCatalog::message(code);
            assert!(message.is_some_and(|m| !m.is_empty()), "missing message for {code}");
        }
    }

    #[test]
    fn test_decode_apostrophes_multiple() {
        assert_eq!(decode_apostrophes("can&apos;t won&apos;t"), "can't won't");
        assert_eq!(decode_apostrophes("plain"), "plain");
    }
}
