//! Normalized outcome of one gateway attempt.

use std::fmt;

use serde_json::Value;

use super::TransactionKind;
use crate::codes::ResultCodeCatalog;

/// Fields returned by a successful 3-D Secure lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupDetail {
    /// Server-assigned transaction index, needed by the authorize step.
    pub transaction_index: Option<String>,
    /// Enrolment flag (`Y`, `N` or `U`).
    pub enrolled: Option<String>,
    /// Issuer access-control server URL the cardholder is sent to.
    pub acs_url: Option<String>,
    /// PAReq payload to post to the ACS.
    pub pareq: Option<String>,
    /// ECI code reported for the lookup.
    pub eci: Option<String>,
    /// Order identifier assigned by the 3-D Secure service.
    pub order_id: Option<String>,
}

/// Fields returned by a successful 3-D Secure authorize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizeDetail {
    /// Cardholder authentication verification value.
    pub cavv: Option<String>,
    /// 3-D Secure transaction identifier.
    pub xid: Option<String>,
    /// ECI code for the authenticated transaction.
    pub eci: Option<String>,
    /// Whether the PARes signature verified (`Y`/`N`).
    pub signature_verification: Option<String>,
    /// PARes status (`Y`, `N`, `U` or `A`).
    pub pares_status: Option<String>,
}

/// Fields returned by a debit.
///
/// `Debug` omits the raw document, which may echo card data.
#[derive(Clone, Default, PartialEq)]
pub struct DebitDetail {
    /// Gateway transaction index.
    pub transaction_index: Option<String>,
    /// Issuer authorisation code.
    pub authorisation_code: Option<String>,
    /// Raw JSON response body, when the REST transport produced one.
    pub raw: Option<Value>,
}

impl fmt::Debug for DebitDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebitDetail")
            .field("transaction_index", &self.transaction_index)
            .field("authorisation_code", &self.authorisation_code)
            .field("raw", &self.raw.as_ref().map(|_| "[OMITTED]"))
            .finish()
    }
}

/// Transport-specific detail carried by a result.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultDetail {
    /// No detail, typically after a transport failure.
    #[default]
    None,
    /// 3-D Secure lookup detail.
    Lookup(LookupDetail),
    /// 3-D Secure authorize detail.
    Authorize(AuthorizeDetail),
    /// Debit detail.
    Debit(DebitDetail),
}

/// Outcome of a single gateway attempt.
///
/// A failed result always has an error code and a resolved, non-empty message.
/// A successful result has neither.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    kind: TransactionKind,
    success: bool,
    error_code: Option<String>,
    error_message: Option<String>,
    detail: ResultDetail,
}

impl TransactionResult {
    /// Successful outcome.
    #[must_use]
    pub fn success(kind: TransactionKind, detail: ResultDetail) -> Self {
        Self { kind, success: true, error_code: None, error_message: None, detail }
    }

    /// Failed outcome with the message resolved through the
    /// [`ResultCodeCatalog`](crate::codes::ResultCodeCatalog).
    ///
    /// # Examples
    ///
    /// ```
    /// use iveri_gateway::transaction::{TransactionKind, TransactionResult};
    ///
    /// let result = TransactionResult::failure(TransactionKind::Debit, "X000", None);
    /// assert!(result.has_error());
    /// assert!(result.error_message().unwrap().starts_with("There was an error"));
    /// ```
    #[must_use]
    pub fn failure(kind: TransactionKind, code: impl Into<String>, message: Option<&str>) -> Self {
        let code = code.into();
        let message = ResultCodeCatalog::resolve(Some(&code), message);
        Self {
            kind,
            success: false,
            error_code: Some(code),
            error_message: Some(message),
            detail: ResultDetail::None,
        }
    }

    /// Attaches transport detail, e.g. the raw body of a declined debit.
    #[must_use]
    pub fn with_detail(mut self, detail: ResultDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Kind of the transaction this result belongs to.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Whether the gateway accepted the request.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// `true` iff an error code is present.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error_code.is_some()
    }

    /// Gateway or adapter error code.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Resolved display message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Transport-specific detail.
    #[must_use]
    pub const fn detail(&self) -> &ResultDetail {
        &self.detail
    }

    /// `true` when a lookup reported the card as enrolled in 3-D Secure.
    #[must_use]
    pub fn is_three_d_secured(&self) -> bool {
        matches!(&self.detail, ResultDetail::Lookup(detail) if detail.enrolled.as_deref() == Some("Y"))
    }
}
