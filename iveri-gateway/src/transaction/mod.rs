//! Normalized transaction model and its validation gate.
//!
//! A [`Transaction`] carries the caller's inputs (card, amount, 3-D Secure correlation
//! fields), a [`TransactionListener`], and after submission the attached
//! [`TransactionResult`] plus any values the gateway assigned ([`ServerEcho`]).
//! Inputs and server echoes are stored separately; the adapter never overwrites input
//! fields.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use iveri_gateway::transaction::{NoopListener, Transaction};
//! use rust_decimal::Decimal;
//!
//! # fn example() -> iveri_gateway::error::Result<()> {
//! let debit = Transaction::debit(Arc::new(NoopListener))
//!     .with_amount(Decimal::new(10_050, 2))
//!     .with_currency("ZAR")
//!     .with_pan_holder_name("J Smith")
//!     .with_pan_number("4111111111111111")
//!     .with_pan_code("123")
//!     .with_pan_expiry(12, 2030)
//!     .with_reference("order-1")
//!     .build()?;
//!
//! assert_eq!(debit.amount_in_cents(), Some(10_050));
//! # Ok(())
//! # }
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use uuid::Uuid;

use crate::error::{GatewayError, Result};

mod listener;
mod result;

pub use listener::{LifecycleEvent, NoopListener, TracingListener, TransactionListener};
pub(crate) use listener::notify;
pub use result::{AuthorizeDetail, DebitDetail, LookupDetail, ResultDetail, TransactionResult};

/// The three supported transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// 3-D Secure enrolment lookup.
    ThreeDSecureLookup,
    /// 3-D Secure authentication of the issuer's PARes.
    ThreeDSecureAuthorize,
    /// Card debit (authorise and settle).
    Debit,
}

impl TransactionKind {
    /// Every kind, in the order used by error messages.
    pub const ALL: [Self; 3] = [Self::Debit, Self::ThreeDSecureLookup, Self::ThreeDSecureAuthorize];

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeDSecureLookup => "3DSECURE_LOOKUP",
            Self::ThreeDSecureAuthorize => "3DSECURE_AUTHORIZE",
            Self::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s.trim()).ok_or_else(|| {
            GatewayError::InvalidTransactionKind(format!(
                "Invalid Transaction Type provided. Available types: {}",
                available_kinds()
            ))
        })
    }
}

fn available_kinds() -> String {
    TransactionKind::ALL.map(TransactionKind::as_str).join(",")
}

/// Values the gateway assigned during the last successful attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerEcho {
    /// Transaction index assigned by a lookup or debit.
    pub transaction_index: Option<String>,
    /// PAReq payload from a lookup.
    pub pareq: Option<String>,
    /// ACS URL from a lookup.
    pub acs_url: Option<String>,
    /// Enrolment flag from a lookup.
    pub enrolled: Option<String>,
    /// CAVV from an authorize.
    pub cavv: Option<String>,
    /// XID from an authorize.
    pub xid: Option<String>,
    /// ECI code from a lookup or authorize.
    pub eci: Option<String>,
    /// PARes signature verification flag from an authorize.
    pub signature_verification: Option<String>,
    /// PARes status from an authorize.
    pub pares_status: Option<String>,
    /// Issuer authorisation code from a debit.
    pub authorisation_code: Option<String>,
}

/// One payment request and, after submission, its outcome.
pub struct Transaction {
    id: Uuid,
    kind: Option<TransactionKind>,
    listener: Arc<dyn TransactionListener>,
    pan_holder_name: Option<String>,
    pan_number: Option<String>,
    pan_code: Option<String>,
    pan_expiry_month: Option<String>,
    pan_expiry_year: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    reference: Option<String>,
    transaction_index: Option<String>,
    pares: Option<String>,
    cavv: Option<String>,
    xid: Option<String>,
    eci: Option<String>,
    echo: ServerEcho,
    result: Option<TransactionResult>,
    built: bool,
}

impl Transaction {
    /// Creates an unbuilt transaction without a kind.
    #[must_use]
    pub fn new(listener: Arc<dyn TransactionListener>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: None,
            listener,
            pan_holder_name: None,
            pan_number: None,
            pan_code: None,
            pan_expiry_month: None,
            pan_expiry_year: None,
            amount: None,
            currency: None,
            reference: None,
            transaction_index: None,
            pares: None,
            cavv: None,
            xid: None,
            eci: None,
            echo: ServerEcho::default(),
            result: None,
            built: false,
        }
    }

    /// Creates an unbuilt 3-D Secure lookup.
    #[must_use]
    pub fn lookup(listener: Arc<dyn TransactionListener>) -> Self {
        Self::new(listener).with_kind(TransactionKind::ThreeDSecureLookup)
    }

    /// Creates an unbuilt 3-D Secure authorize.
    #[must_use]
    pub fn authorize(listener: Arc<dyn TransactionListener>) -> Self {
        Self::new(listener).with_kind(TransactionKind::ThreeDSecureAuthorize)
    }

    /// Creates an unbuilt debit.
    #[must_use]
    pub fn debit(listener: Arc<dyn TransactionListener>) -> Self {
        Self::new(listener).with_kind(TransactionKind::Debit)
    }

    /// Creates the authorize step for a completed lookup.
    ///
    /// Copies the PAN and the transaction index the gateway assigned to `lookup`.
    #[must_use]
    pub fn authorize_from_lookup(
        lookup: &Self,
        pares: impl Into<String>,
        listener: Arc<dyn TransactionListener>,
    ) -> Self {
        let mut authorize = Self::authorize(listener).with_pares(pares);
        authorize.pan_number.clone_from(&lookup.pan_number);
        authorize.transaction_index =
            lookup.echo.transaction_index.clone().or_else(|| lookup.transaction_index.clone());
        authorize
    }

    /// Copies CAVV, XID and ECI from a completed authorize onto this transaction.
    #[must_use]
    pub fn with_authentication_from(mut self, authorize: &Self) -> Self {
        self.cavv = authorize.echo.cavv.clone().or(self.cavv);
        self.xid = authorize.echo.xid.clone().or(self.xid);
        self.eci = authorize.echo.eci.clone().or(self.eci);
        self.built = false;
        self
    }

    /// Validates the kind-specific required fields and marks the transaction built.
    ///
    /// On success fires the kind's `*_prepared` callback exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TransactionValidation`] naming the kind and the first
    /// missing field, or naming the missing kind.
    pub fn build(mut self) -> Result<Self> {
        let kind = self.kind.ok_or_else(|| {
            GatewayError::TransactionValidation("The Transaction Type is required".to_owned())
        })?;

        if let Some(field) = self.first_missing_field(kind) {
            return Err(GatewayError::TransactionValidation(format!(
                "The {field} is required for {kind} transactions"
            )));
        }

        if kind != TransactionKind::ThreeDSecureAuthorize
            && !self.amount_in_cents().is_some_and(|cents| cents > 0)
        {
            return Err(GatewayError::TransactionValidation(format!(
                "The Amount is invalid for {kind} transactions"
            )));
        }

        self.built = true;
        notify(self.listener.as_ref(), kind, LifecycleEvent::Prepared, &self);
        Ok(self)
    }

    fn first_missing_field(&self, kind: TransactionKind) -> Option<&'static str> {
        let amount = self.amount.is_some();
        let checks: &[(bool, &'static str)] = match kind {
            TransactionKind::ThreeDSecureLookup => &[
                (amount, "Transaction Amount"),
                (present(self.currency.as_ref()), "Transaction Currency"),
                (present(self.pan_number.as_ref()), "PAN Number"),
                (present(self.pan_expiry_month.as_ref()), "PAN Expiry Month"),
                (present(self.pan_expiry_year.as_ref()), "PAN Expiry Year"),
                (present(self.reference.as_ref()), "Transaction Reference"),
            ],
            TransactionKind::Debit => &[
                (amount, "Transaction Amount"),
                (present(self.pan_holder_name.as_ref()), "PAN Holder Name"),
                (present(self.pan_number.as_ref()), "PAN Number"),
                (present(self.pan_code.as_ref()), "PAN Security Code"),
                (present(self.pan_expiry_month.as_ref()), "PAN Expiry Month"),
                (present(self.pan_expiry_year.as_ref()), "PAN Expiry Year"),
                (present(self.currency.as_ref()), "Transaction Currency"),
                (present(self.reference.as_ref()), "Transaction Reference"),
            ],
            TransactionKind::ThreeDSecureAuthorize => &[
                (present(self.pan_number.as_ref()), "PAN Number"),
                (present(self.transaction_index.as_ref()), "Transaction Index"),
                (present(self.pares.as_ref()), "PARes Payload"),
            ],
        };

        checks.iter().find(|(ok, _)| !ok).map(|(_, field)| *field)
    }

    /// Attaches the outcome of an attempt, replacing any earlier one.
    ///
    /// Successful results echo server-assigned values into [`ServerEcho`].
    pub(crate) fn attach_result(&mut self, result: TransactionResult) {
        if result.is_success() {
            self.apply_echo(result.detail());
        }
        self.result = Some(result);
    }

    fn apply_echo(&mut self, detail: &ResultDetail) {
        let echo = &mut self.echo;
        match detail {
            ResultDetail::Lookup(lookup) => {
                echo.transaction_index.clone_from(&lookup.transaction_index);
                echo.pareq.clone_from(&lookup.pareq);
                echo.acs_url.clone_from(&lookup.acs_url);
                echo.enrolled.clone_from(&lookup.enrolled);
                echo.eci.clone_from(&lookup.eci);
            }
            ResultDetail::Authorize(authorize) => {
                echo.cavv.clone_from(&authorize.cavv);
                echo.xid.clone_from(&authorize.xid);
                echo.eci.clone_from(&authorize.eci);
                echo.signature_verification.clone_from(&authorize.signature_verification);
                echo.pares_status.clone_from(&authorize.pares_status);
            }
            ResultDetail::Debit(debit) => {
                echo.transaction_index.clone_from(&debit.transaction_index);
                echo.authorisation_code.clone_from(&debit.authorisation_code);
            }
            ResultDetail::None => {}
        }
    }

    /// Fires `event` on this transaction's listener.
    pub(crate) fn notify(&self, event: LifecycleEvent) {
        if let Some(kind) = self.kind {
            notify(self.listener.as_ref(), kind, event, self);
        }
    }

    /// Sets the transaction kind.
    #[must_use]
    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self.built = false;
        self
    }

    /// Replaces the listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn TransactionListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Sets the cardholder name.
    #[must_use]
    pub fn with_pan_holder_name(mut self, name: impl Into<String>) -> Self {
        self.pan_holder_name = Some(name.into());
        self.built = false;
        self
    }

    /// Sets the card number.
    #[must_use]
    pub fn with_pan_number(mut self, pan: impl Into<String>) -> Self {
        self.pan_number = Some(pan.into());
        self.built = false;
        self
    }

    /// Sets the card security code.
    #[must_use]
    pub fn with_pan_code(mut self, code: impl Into<String>) -> Self {
        self.pan_code = Some(code.into());
        self.built = false;
        self
    }

    /// Sets the expiry month (1-12) and four-digit year.
    #[must_use]
    pub fn with_pan_expiry(mut self, month: u8, year: u16) -> Self {
        self.pan_expiry_month = Some(format!("{month:02}"));
        self.pan_expiry_year = Some(year.to_string());
        self.built = false;
        self
    }

    /// Sets the amount in currency units.
    #[must_use]
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self.built = false;
        self
    }

    /// Sets the ISO-4217 currency code.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self.built = false;
        self
    }

    /// Sets the merchant reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self.built = false;
        self
    }

    /// Sets the transaction index from a prior lookup.
    #[must_use]
    pub fn with_transaction_index(mut self, index: impl Into<String>) -> Self {
        self.transaction_index = Some(index.into());
        self.built = false;
        self
    }

    /// Sets the PARes payload returned by the issuer.
    #[must_use]
    pub fn with_pares(mut self, pares: impl Into<String>) -> Self {
        self.pares = Some(pares.into());
        self.built = false;
        self
    }

    /// Sets the CAVV for a debit.
    #[must_use]
    pub fn with_cavv(mut self, cavv: impl Into<String>) -> Self {
        self.cavv = Some(cavv.into());
        self.built = false;
        self
    }

    /// Sets the XID for a debit.
    #[must_use]
    pub fn with_xid(mut self, xid: impl Into<String>) -> Self {
        self.xid = Some(xid.into());
        self.built = false;
        self
    }

    /// Sets the two-digit ECI code for a debit.
    #[must_use]
    pub fn with_eci(mut self, eci: impl Into<String>) -> Self {
        self.eci = Some(eci.into());
        self.built = false;
        self
    }

    /// Unique identifier generated at construction.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Transaction kind, if set.
    #[must_use]
    pub const fn kind(&self) -> Option<TransactionKind> {
        self.kind
    }

    /// `true` once [`build`](Self::build) has succeeded and nothing changed since.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// Cardholder name.
    #[must_use]
    pub fn pan_holder_name(&self) -> &str {
        self.pan_holder_name.as_deref().unwrap_or_default()
    }

    /// Card number.
    #[must_use]
    pub fn pan_number(&self) -> &str {
        self.pan_number.as_deref().unwrap_or_default()
    }

    /// Card security code.
    #[must_use]
    pub fn pan_code(&self) -> &str {
        self.pan_code.as_deref().unwrap_or_default()
    }

    /// Two-digit expiry month.
    #[must_use]
    pub fn pan_expiry_month(&self) -> &str {
        self.pan_expiry_month.as_deref().unwrap_or_default()
    }

    /// Four-digit expiry year.
    #[must_use]
    pub fn pan_expiry_year(&self) -> &str {
        self.pan_expiry_year.as_deref().unwrap_or_default()
    }

    /// Expiry as `MMYYYY`.
    #[must_use]
    pub fn expiry_date(&self) -> String {
        format!("{}{}", self.pan_expiry_month(), self.pan_expiry_year())
    }

    /// Amount in currency units.
    #[must_use]
    pub const fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    /// Amount in minor units, rounded half away from zero.
    ///
    /// `None` when no amount is set or the value does not fit an `i64`.
    #[must_use]
    pub fn amount_in_cents(&self) -> Option<i64> {
        self.amount?
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Currency code as supplied.
    #[must_use]
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or_default()
    }

    /// Merchant reference.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.reference.as_deref().unwrap_or_default()
    }

    /// Transaction index supplied by the caller.
    #[must_use]
    pub fn transaction_index(&self) -> Option<&str> {
        self.transaction_index.as_deref()
    }

    /// PARes payload supplied by the caller.
    #[must_use]
    pub fn pares(&self) -> Option<&str> {
        self.pares.as_deref()
    }

    /// CAVV supplied for a debit.
    #[must_use]
    pub fn cavv(&self) -> Option<&str> {
        self.cavv.as_deref()
    }

    /// XID supplied for a debit.
    #[must_use]
    pub fn xid(&self) -> Option<&str> {
        self.xid.as_deref()
    }

    /// ECI code supplied for a debit.
    #[must_use]
    pub fn eci(&self) -> Option<&str> {
        self.eci.as_deref()
    }

    /// Values echoed back by the gateway.
    #[must_use]
    pub const fn echo(&self) -> &ServerEcho {
        &self.echo
    }

    /// Outcome of the last attempt.
    #[must_use]
    pub const fn result(&self) -> Option<&TransactionResult> {
        self.result.as_ref()
    }

    /// `true` when a result is attached and carries an error code.
    #[must_use]
    pub fn fails(&self) -> bool {
        self.result.as_ref().is_some_and(TransactionResult::has_error)
    }

    /// `true` when a result is attached and carries no error code.
    ///
    /// Both `fails()` and `succeeds()` are `false` before the first attempt.
    #[must_use]
    pub fn succeeds(&self) -> bool {
        self.result.as_ref().is_some_and(|result| !result.has_error())
    }

    /// Error code of the last attempt.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.result.as_ref().and_then(TransactionResult::error_code)
    }

    /// Resolved error message of the last attempt.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.result.as_ref().and_then(TransactionResult::error_message)
    }

    /// `true` when the last lookup reported the card as enrolled.
    #[must_use]
    pub fn is_three_d_secured(&self) -> bool {
        self.result.as_ref().is_some_and(TransactionResult::is_three_d_secured)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("listener", &self.listener)
            .field("pan_holder_name", &self.pan_holder_name)
            .field("pan_number", &self.pan_number.as_deref().map(mask_pan))
            .field("pan_code", &self.pan_code.as_ref().map(|_| "[REDACTED]"))
            .field("pan_expiry_month", &self.pan_expiry_month)
            .field("pan_expiry_year", &self.pan_expiry_year)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("reference", &self.reference)
            .field("transaction_index", &self.transaction_index)
            .field("echo", &self.echo)
            .field("result", &self.result)
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}

fn present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Masks all but the last four digits of a card number.
#[must_use]
pub fn mask_pan(pan: &str) -> String {
    let visible = pan.len().saturating_sub(4);
    pan.char_indices().map(|(i, c)| if i < visible { '*' } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl TransactionListener for Recorder {
        fn lookup_prepared(&self, _: &Transaction) {
            self.0.lock().unwrap().push("lookup_prepared");
        }
        fn authorize_prepared(&self, _: &Transaction) {
            self.0.lock().unwrap().push("authorize_prepared");
        }
        fn debit_prepared(&self, _: &Transaction) {
            self.0.lock().unwrap().push("debit_prepared");
        }
    }

    fn noop() -> Arc<dyn TransactionListener> {
        Arc::new(NoopListener)
    }

    fn complete_debit(listener: Arc<dyn TransactionListener>) -> Transaction {
        Transaction::debit(listener)
            .with_amount(Decimal::new(10_050, 2))
            .with_currency("ZAR")
            .with_pan_holder_name("J Smith")
            .with_pan_number("4111111111111111")
            .with_pan_code("123")
            .with_pan_expiry(1, 2030)
            .with_reference("order-1")
    }

    fn validation_message(transaction: Transaction) -> String {
        match transaction.build() {
            Err(GatewayError::TransactionValidation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("DEBIT".parse::<TransactionKind>().unwrap(), TransactionKind::Debit);
        assert_eq!(
            "3DSECURE_LOOKUP".parse::<TransactionKind>().unwrap(),
            TransactionKind::ThreeDSecureLookup
        );
        assert_eq!(
            "3DSECURE_AUTHORIZE".parse::<TransactionKind>().unwrap(),
            TransactionKind::ThreeDSecureAuthorize
        );
    }

    #[test]
    fn test_kind_from_str_invalid() {
        let error = "REFUND".parse::<TransactionKind>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid Transaction Type provided. Available types: DEBIT,3DSECURE_LOOKUP,3DSECURE_AUTHORIZE"
        );
    }

    #[test]
    fn test_build_without_kind() {
        let message = validation_message(Transaction::new(noop()));
        assert_eq!(message, "The Transaction Type is required");
    }

    #[test]
    fn test_build_complete_debit_fires_prepared_once() {
        let recorder = Arc::new(Recorder::default());
        let debit = complete_debit(recorder.clone()).build().unwrap();
        assert!(debit.is_built());
        assert_eq!(*recorder.0.lock().unwrap(), vec!["debit_prepared"]);
    }

    #[test]
    fn test_build_rejects_amount_beyond_cents_range() {
        let recorder = Arc::new(Recorder::default());
        let huge = Decimal::from_i128_with_scale(10_i128.pow(20), 0);
        let debit = complete_debit(recorder.clone()).with_amount(huge);
        assert_eq!(debit.amount_in_cents(), None);
        assert_eq!(validation_message(debit), "The Amount is invalid for DEBIT transactions");
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_rejects_non_positive_amounts() {
        let negative = complete_debit(noop()).with_amount(Decimal::new(-500, 2));
        assert_eq!(validation_message(negative), "The Amount is invalid for DEBIT transactions");

        let zero = complete_debit(noop()).with_amount(Decimal::ZERO);
        assert_eq!(validation_message(zero), "The Amount is invalid for DEBIT transactions");

        let lookup = Transaction::lookup(noop())
            .with_amount(Decimal::new(1, 3))
            .with_currency("ZAR")
            .with_pan_number("4111111111111111")
            .with_pan_expiry(1, 2030)
            .with_reference("order-1");
        assert_eq!(
            validation_message(lookup),
            "The Amount is invalid for 3DSECURE_LOOKUP transactions"
        );
    }

    #[test]
    fn test_build_failure_fires_nothing() {
        let recorder = Arc::new(Recorder::default());
        let result = Transaction::debit(recorder.clone()).build();
        assert!(result.is_err());
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_debit_missing_fields_in_order() {
        assert_eq!(
            validation_message(Transaction::debit(noop())),
            "The Transaction Amount is required for DEBIT transactions"
        );
        assert_eq!(
            validation_message(Transaction::debit(noop()).with_amount(Decimal::ONE)),
            "The PAN Holder Name is required for DEBIT transactions"
        );
        assert_eq!(
            validation_message(complete_debit(noop()).with_pan_code(" ")),
            "The PAN Security Code is required for DEBIT transactions"
        );
        assert_eq!(
            validation_message(complete_debit(noop()).with_reference("")),
            "The Transaction Reference is required for DEBIT transactions"
        );
    }

    #[test]
    fn test_lookup_required_fields() {
        let recorder = Arc::new(Recorder::default());
        assert_eq!(
            validation_message(Transaction::lookup(noop()).with_amount(Decimal::ONE)),
            "The Transaction Currency is required for 3DSECURE_LOOKUP transactions"
        );

        let lookup = Transaction::lookup(recorder.clone())
            .with_amount(Decimal::ONE)
            .with_currency("ZAR")
            .with_pan_number("4111111111111111")
            .with_pan_expiry(12, 2030)
            .with_reference("order-1")
            .build()
            .unwrap();
        assert!(lookup.is_built());
        assert_eq!(*recorder.0.lock().unwrap(), vec!["lookup_prepared"]);
    }

    #[test]
    fn test_authorize_required_fields() {
        assert_eq!(
            validation_message(Transaction::authorize(noop())),
            "The PAN Number is required for 3DSECURE_AUTHORIZE transactions"
        );
        assert_eq!(
            validation_message(Transaction::authorize(noop()).with_pan_number("4111")),
            "The Transaction Index is required for 3DSECURE_AUTHORIZE transactions"
        );
        assert_eq!(
            validation_message(
                Transaction::authorize(noop()).with_pan_number("4111").with_transaction_index("idx")
            ),
            "The PARes Payload is required for 3DSECURE_AUTHORIZE transactions"
        );
    }

    #[test]
    fn test_setter_clears_built_flag() {
        let debit = complete_debit(noop()).build().unwrap().with_reference("order-2");
        assert!(!debit.is_built());
    }

    #[test]
    fn test_amount_in_cents_rounding() {
        let cents = |amount: Decimal| complete_debit(noop()).with_amount(amount).amount_in_cents();
        assert_eq!(cents(Decimal::new(10_050, 2)), Some(10_050));
        assert_eq!(cents(Decimal::new(1_005, 3)), Some(101));
        assert_eq!(cents(Decimal::new(1_004, 3)), Some(100));
        assert_eq!(cents(Decimal::new(25, 0)), Some(2_500));
        assert_eq!(Transaction::debit(noop()).amount_in_cents(), None);
    }

    #[test]
    fn test_expiry_date_format() {
        let debit = complete_debit(noop());
        assert_eq!(debit.pan_expiry_month(), "01");
        assert_eq!(debit.expiry_date(), "012030");
    }

    #[test]
    fn test_outcome_accessors_before_submission() {
        let debit = complete_debit(noop());
        assert!(!debit.fails());
        assert!(!debit.succeeds());
        assert!(debit.error_code().is_none());
        assert!(debit.result().is_none());
    }

    #[test]
    fn test_attach_success_echoes_lookup_fields() {
        let mut lookup = Transaction::lookup(noop());
        let detail = LookupDetail {
            transaction_index: Some("idx-1".to_owned()),
            enrolled: Some("Y".to_owned()),
            acs_url: Some("https://acs.example.com".to_owned()),
            pareq: Some("pareq".to_owned()),
            ..Default::default()
        };
        lookup.attach_result(TransactionResult::success(
            TransactionKind::ThreeDSecureLookup,
            ResultDetail::Lookup(detail),
        ));

        assert!(lookup.succeeds());
        assert!(lookup.is_three_d_secured());
        assert_eq!(lookup.echo().transaction_index.as_deref(), Some("idx-1"));
        assert_eq!(lookup.echo().pareq.as_deref(), Some("pareq"));
        assert!(lookup.transaction_index().is_none());
    }

    #[test]
    fn test_attach_failure_keeps_echo() {
        let mut debit = complete_debit(noop());
        debit.attach_result(TransactionResult::failure(TransactionKind::Debit, "N0001", None));
        assert!(debit.fails());
        assert_eq!(debit.error_code(), Some("N0001"));
        assert_eq!(debit.echo(), &ServerEcho::default());
    }

    #[test]
    fn test_attach_replaces_previous_result() {
        let mut debit = complete_debit(noop());
        debit.attach_result(TransactionResult::failure(TransactionKind::Debit, "X000", None));
        debit.attach_result(TransactionResult::success(TransactionKind::Debit, ResultDetail::None));
        assert!(debit.succeeds());
        assert!(debit.error_message().is_none());
    }

    #[test]
    fn test_authorize_from_lookup_copies_correlation() {
        let mut lookup = Transaction::lookup(noop()).with_pan_number("4111111111111111");
        lookup.attach_result(TransactionResult::success(
            TransactionKind::ThreeDSecureLookup,
            ResultDetail::Lookup(LookupDetail {
                transaction_index: Some("idx-9".to_owned()),
                ..Default::default()
            }),
        ));

        let authorize = Transaction::authorize_from_lookup(&lookup, "pares", noop()).build().unwrap();
        assert_eq!(authorize.kind(), Some(TransactionKind::ThreeDSecureAuthorize));
        assert_eq!(authorize.pan_number(), "4111111111111111");
        assert_eq!(authorize.transaction_index(), Some("idx-9"));
        assert_eq!(authorize.pares(), Some("pares"));
    }

    #[test]
    fn test_with_authentication_from_copies_authorize_echo() {
        let mut authorize = Transaction::authorize(noop());
        authorize.attach_result(TransactionResult::success(
            TransactionKind::ThreeDSecureAuthorize,
            ResultDetail::Authorize(AuthorizeDetail {
                cavv: Some("cavv".to_owned()),
                xid: Some("xid".to_owned()),
                eci: Some("05".to_owned()),
                ..Default::default()
            }),
        ));

        let debit = complete_debit(noop()).with_authentication_from(&authorize);
        assert_eq!(debit.cavv(), Some("cavv"));
        assert_eq!(debit.xid(), Some("xid"));
        assert_eq!(debit.eci(), Some("05"));
    }

    #[test]
    fn test_debug_masks_card_data() {
        let debit = complete_debit(noop());
        let debug = format!("{debit:?}");
        assert!(debug.contains("************1111"));
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("\"123\""));
    }

    #[test]
    fn test_mask_pan_short() {
        assert_eq!(mask_pan("1234"), "1234");
        assert_eq!(mask_pan("123456"), "**3456");
        assert_eq!(mask_pan(""), "");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Transaction::new(noop()).id(), Transaction::new(noop()).id());
    }
}
