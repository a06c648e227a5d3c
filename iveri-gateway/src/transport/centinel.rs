//! CardinalMPI (Centinel) 3-D Secure service.
//!
//! Under the REST protocol, lookup and authorize do not go to the iVeri gateway but to
//! the CardinalMPI service. The request is a `CardinalMPI` XML message passed in the
//! `cmpi_msg` query parameter; the response is a flat `CardinalMPI` XML document.
//!
//! Outcome rules:
//! - `ErrorNo` of `0` or empty: success
//! - any other `ErrorNo`: failure with that code and `ErrorDesc`
//! - no `ErrorNo` element: `X0002`
//! - HTTP failure or unreadable XML: `N0001`

use std::collections::HashMap;

use quick_xml::{Reader, events::Event};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::{
    TransportFault, connection_failure,
    http::{HttpTransport, RequestContext},
};
use crate::{
    card::numeric_currency_code,
    codes::UNEXPECTED_RESPONSE,
    config::Configuration,
    transaction::{
        AuthorizeDetail, LookupDetail, ResultDetail, Transaction, TransactionKind,
        TransactionResult,
    },
};

/// Message version understood by the service.
pub const MESSAGE_VERSION: &str = "1.7";

/// Transaction type for credit and debit cards.
pub const CARD_TRANSACTION_TYPE: &str = "C";

/// Outgoing `CardinalMPI` message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CmpiRequest<'a> {
    msg_type: &'static str,
    version: &'static str,
    processor_id: &'a str,
    merchant_id: &'a str,
    transaction_pwd: &'a str,
    transaction_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_exp_month: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_exp_year: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<&'a str>,
    #[serde(rename = "PAResPayload", skip_serializing_if = "Option::is_none")]
    pares_payload: Option<&'a str>,
}

impl<'a> CmpiRequest<'a> {
    fn new(msg_type: &'static str, config: &'a Configuration) -> Self {
        Self {
            msg_type,
            version: MESSAGE_VERSION,
            processor_id: config.cmpi_processor_id().unwrap_or_default(),
            merchant_id: config.cmpi_merchant_id().unwrap_or_default(),
            transaction_pwd: config.cmpi_password().unwrap_or_default(),
            transaction_type: CARD_TRANSACTION_TYPE,
            amount: None,
            currency_code: None,
            order_number: None,
            card_number: None,
            card_exp_month: None,
            card_exp_year: None,
            transaction_id: None,
            pares_payload: None,
        }
    }

    fn to_xml(&self) -> Result<String, TransportFault> {
        quick_xml::se::to_string_with_root("CardinalMPI", self)
            .map_err(|e| TransportFault::Malformed(format!("cannot encode CardinalMPI message: {e}")))
    }
}

/// Builds the `cmpi_lookup` message for a lookup transaction.
///
/// # Errors
///
/// Returns [`TransportFault::Malformed`] if the message cannot be serialized.
pub fn lookup_message(
    config: &Configuration,
    transaction: &Transaction,
) -> Result<String, TransportFault> {
    CmpiRequest {
        amount: transaction.amount_in_cents(),
        currency_code: Some(numeric_currency_code(transaction.currency())),
        order_number: Some(transaction.reference()),
        card_number: Some(transaction.pan_number()),
        card_exp_month: Some(transaction.pan_expiry_month()),
        card_exp_year: Some(transaction.pan_expiry_year()),
        ..CmpiRequest::new("cmpi_lookup", config)
    }
    .to_xml()
}

/// Builds the `cmpi_authenticate` message for an authorize transaction.
///
/// # Errors
///
/// Returns [`TransportFault::Malformed`] if the message cannot be serialized.
pub fn authenticate_message(
    config: &Configuration,
    transaction: &Transaction,
) -> Result<String, TransportFault> {
    CmpiRequest {
        transaction_id: transaction.transaction_index(),
        pares_payload: transaction.pares(),
        ..CmpiRequest::new("cmpi_authenticate", config)
    }
    .to_xml()
}

/// Flattens a `CardinalMPI` response into element name to text.
///
/// Only direct children of the root element are collected. Empty elements map to an
/// empty string.
///
/// # Errors
///
/// Returns [`TransportFault::Malformed`] if the document is not well-formed XML or has
/// no root element.
pub fn parse_response(xml: &str) -> Result<HashMap<String, String>, TransportFault> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = HashMap::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                saw_root = true;
                if depth == 2 {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    current = Some((name, String::new()));
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                if depth == 1 {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    fields.insert(name, String::new());
                }
            }
            Ok(Event::Text(e)) => {
                if depth == 2
                    && let Some((_, text)) = current.as_mut()
                {
                    let unescaped =
                        e.unescape().map_err(|e| TransportFault::Malformed(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if depth == 2
                    && let Some((_, text)) = current.as_mut()
                {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2
                    && let Some((name, text)) = current.take()
                {
                    fields.insert(name, text.trim().to_owned());
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TransportFault::Malformed(format!("invalid XML: {e}"))),
        }
    }

    if !saw_root {
        return Err(TransportFault::Malformed("empty CardinalMPI response".to_owned()));
    }

    Ok(fields)
}

/// Interprets a parsed response for the given kind.
#[must_use]
pub fn interpret(kind: TransactionKind, fields: &HashMap<String, String>) -> TransactionResult {
    let field = |name: &str| fields.get(name).filter(|v| !v.is_empty()).cloned();

    let Some(error_no) = fields.get("ErrorNo").map(|v| v.trim()) else {
        warn!(kind = %kind, "CardinalMPI response has no ErrorNo");
        return TransactionResult::failure(kind, UNEXPECTED_RESPONSE, None);
    };

    if !(error_no.is_empty() || error_no == "0") {
        return TransactionResult::failure(kind, error_no, fields.get("ErrorDesc").map(String::as_str));
    }

    let detail = match kind {
        TransactionKind::ThreeDSecureAuthorize => ResultDetail::Authorize(AuthorizeDetail {
            cavv: field("Cavv"),
            xid: field("Xid"),
            eci: field("EciFlag"),
            signature_verification: field("SignatureVerification"),
            pares_status: field("PAResStatus"),
        }),
        _ => ResultDetail::Lookup(LookupDetail {
            transaction_index: field("TransactionId"),
            enrolled: field("Enrolled"),
            acs_url: field("ACSUrl"),
            pareq: field("Payload"),
            eci: field("EciFlag"),
            order_id: field("OrderId"),
        }),
    };

    TransactionResult::success(kind, detail)
}

async fn submit(
    http: &HttpTransport,
    url: &str,
    message: &str,
) -> Result<HashMap<String, String>, TransportFault> {
    let ctx = RequestContext { url, query: vec![("cmpi_msg", message)], ..Default::default() };
    let response = http.post(ctx, Vec::new()).await?;
    let body = String::from_utf8_lossy(&response.body);
    let fields = parse_response(&body)?;
    debug!(keys = ?fields.keys().collect::<Vec<_>>(), "CardinalMPI response parsed");
    Ok(fields)
}

/// Performs a `cmpi_lookup`.
#[instrument(
    skip_all,
    fields(transaction_id = %transaction.id(), kind = "3DSECURE_LOOKUP", url = config.centinel_url())
)]
pub async fn lookup(
    http: &HttpTransport,
    config: &Configuration,
    transaction: &Transaction,
) -> TransactionResult {
    let kind = TransactionKind::ThreeDSecureLookup;
    let outcome = match lookup_message(config, transaction) {
        Ok(message) => submit(http, config.centinel_url(), &message).await,
        Err(fault) => Err(fault),
    };
    match outcome {
        Ok(fields) => interpret(kind, &fields),
        Err(fault) => connection_failure(kind, &fault),
    }
}

/// Performs a `cmpi_authenticate`.
#[instrument(
    skip_all,
    fields(transaction_id = %transaction.id(), kind = "3DSECURE_AUTHORIZE", url = config.centinel_url())
)]
pub async fn authenticate(
    http: &HttpTransport,
    config: &Configuration,
    transaction: &Transaction,
) -> TransactionResult {
    let kind = TransactionKind::ThreeDSecureAuthorize;
    let outcome = match authenticate_message(config, transaction) {
        Ok(message) => submit(http, config.centinel_url(), &message).await,
        Err(fault) => Err(fault),
    };
    match outcome {
        Ok(fields) => interpret(kind, &fields),
        Err(fault) => connection_failure(kind, &fault),
    }
}
