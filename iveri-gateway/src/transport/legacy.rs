//! Legacy SOAP web service.
//!
//! Three operations (`lookup`, `authenticate`, `fProcessAndSettle`) are posted as SOAP 1.1
//! envelopes to the live or test endpoint. Each returns an array of strings of the form
//! `Key||Value`, which [`prettify_response`] folds into a map.
//!
//! Success is signalled by the `Result` entry: lookup succeeds when `Result > -1`,
//! authenticate and debit when `Result == 0`. A response without `Result` yields `X001`.
//! Any fault on the way (network, HTTP status, SOAP fault, unreadable XML) yields `X000`.

use std::collections::HashMap;

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use tracing::{debug, instrument, warn};

use super::{
    GatewayProtocol, TransportFault,
    http::{HttpTransport, RequestContext},
    sealed,
};
use crate::{
    card::CardType,
    codes::{COMMUNICATION_ERROR, UNEXPECTED_ERROR},
    config::Configuration,
    transaction::{
        AuthorizeDetail, DebitDetail, LookupDetail, ResultDetail, Transaction, TransactionKind,
        TransactionResult,
    },
};

/// Namespace of the legacy operations.
pub const SERVICE_NAMESPACE: &str = "http://iveri.com/";

const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Separator between key and value in a response entry.
pub const ENTRY_DELIMITER: &str = "||";

/// Remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// 3-D Secure enrolment lookup.
    Lookup,
    /// 3-D Secure PARes authentication.
    Authenticate,
    /// Authorise and settle a card payment.
    ProcessAndSettle,
}

impl Operation {
    /// Remote operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Authenticate => "authenticate",
            Self::ProcessAndSettle => "fProcessAndSettle",
        }
    }

    /// Value of the `SOAPAction` header.
    #[must_use]
    pub fn soap_action(self) -> String {
        format!("\"{SERVICE_NAMESPACE}{}\"", self.as_str())
    }

    const fn kind(self) -> TransactionKind {
        match self {
            Self::Lookup => TransactionKind::ThreeDSecureLookup,
            Self::Authenticate => TransactionKind::ThreeDSecureAuthorize,
            Self::ProcessAndSettle => TransactionKind::Debit,
        }
    }
}

/// Folds `Key||Value` entries into a map.
///
/// Entries without the delimiter are dropped; keys and values are trimmed; a repeated
/// key keeps its last value. Only the first delimiter splits, so values may contain `||`.
///
/// # Examples
///
/// ```
/// use iveri_gateway::transport::legacy::prettify_response;
///
/// let map = prettify_response(["Result||0", "ErrorDesc||it&apos;s ok", "garbage"]);
/// assert_eq!(map.len(), 2);
/// assert_eq!(map["Result"], "0");
/// assert_eq!(map["ErrorDesc"], "it&apos;s ok");
/// ```
#[must_use]
pub fn prettify_response<I, S>(entries: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let (key, value) = entry.as_ref().split_once(ENTRY_DELIMITER)?;
            Some((key.trim().to_owned(), value.trim().to_owned()))
        })
        .collect()
}

fn common_params(config: &Configuration) -> Vec<(&'static str, String)> {
    vec![
        ("ApplicationID", config.application_id().to_owned()),
        ("CertificateID", config.certificate_id().to_owned()),
        ("UserGroupID", config.user_group_id().to_owned()),
        ("Username", config.username().to_owned()),
        ("Password", config.password().to_owned()),
        ("Mode", config.mode().to_owned()),
    ]
}

fn amount_param(transaction: &Transaction) -> String {
    transaction.amount_in_cents().map(|cents| cents.to_string()).unwrap_or_default()
}

/// Operation parameters, in wire order.
#[must_use]
pub fn operation_params(
    operation: Operation,
    config: &Configuration,
    transaction: &Transaction,
) -> Vec<(&'static str, String)> {
    let mut params = common_params(config);
    match operation {
        Operation::Lookup => params.extend([
            ("MerchantReference", transaction.reference().to_owned()),
            ("Amount", amount_param(transaction)),
            ("Currency", transaction.currency().to_owned()),
            ("PAN", transaction.pan_number().to_owned()),
            ("ExpiryDate", transaction.expiry_date()),
        ]),
        Operation::Authenticate => params.extend([
            ("TransactionIndex", transaction.transaction_index().unwrap_or_default().to_owned()),
            ("PARes", transaction.pares().unwrap_or_default().to_owned()),
        ]),
        Operation::ProcessAndSettle => params.extend([
            ("CardType", CardType::classify(transaction.pan_number()).as_str().to_owned()),
            ("PAN", transaction.pan_number().to_owned()),
            ("ExpiryDate", transaction.expiry_date()),
            ("CardSecurityCode", transaction.pan_code().to_owned()),
            ("CardholderName", transaction.pan_holder_name().to_owned()),
            ("Amount", amount_param(transaction)),
            ("Currency", transaction.currency().to_owned()),
            ("MerchantReference", transaction.reference().to_owned()),
            ("ElectronicCommerceIndicator", transaction.eci().unwrap_or_default().to_owned()),
            ("CAVV", transaction.cavv().unwrap_or_default().to_owned()),
            ("XID", transaction.xid().unwrap_or_default().to_owned()),
        ]),
    }
    params
}

fn write_fault(error: impl std::fmt::Display) -> TransportFault {
    TransportFault::Malformed(format!("cannot encode SOAP envelope: {error}"))
}

/// Builds the SOAP 1.1 request envelope.
///
/// # Errors
///
/// Returns [`TransportFault::Malformed`] if the envelope cannot be written.
pub fn build_envelope(
    operation: Operation,
    params: &[(&str, String)],
) -> Result<String, TransportFault> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_fault)?;

    let mut envelope = BytesStart::new("soap:Envelope");
    envelope.push_attribute(("xmlns:soap", SOAP_ENVELOPE_NAMESPACE));
    writer.write_event(Event::Start(envelope)).map_err(write_fault)?;
    writer.write_event(Event::Start(BytesStart::new("soap:Body"))).map_err(write_fault)?;

    let mut call = BytesStart::new(operation.as_str());
    call.push_attribute(("xmlns", SERVICE_NAMESPACE));
    writer.write_event(Event::Start(call)).map_err(write_fault)?;

    for (name, value) in params {
        writer.write_event(Event::Start(BytesStart::new(*name))).map_err(write_fault)?;
        writer.write_event(Event::Text(BytesText::new(value))).map_err(write_fault)?;
        writer.write_event(Event::End(BytesEnd::new(*name))).map_err(write_fault)?;
    }

    writer.write_event(Event::End(BytesEnd::new(operation.as_str()))).map_err(write_fault)?;
    writer.write_event(Event::End(BytesEnd::new("soap:Body"))).map_err(write_fault)?;
    writer.write_event(Event::End(BytesEnd::new("soap:Envelope"))).map_err(write_fault)?;

    String::from_utf8(writer.into_inner()).map_err(write_fault)
}

/// Extracts the `<string>` entries of the `<{operation}Result>` element.
///
/// # Errors
///
/// Returns [`TransportFault::Malformed`] for unreadable XML, a SOAP `Fault`, or a
/// response without the result element.
pub fn parse_envelope(operation: Operation, xml: &str) -> Result<Vec<String>, TransportFault> {
    let result_element = format!("{}Result", operation.as_str());
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut in_result = false;
    let mut saw_result = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if name == b"Fault" {
                    return Err(TransportFault::Malformed("SOAP fault".to_owned()));
                }
                if name == result_element.as_bytes() {
                    in_result = true;
                    saw_result = true;
                } else if in_result && name == b"string" {
                    current = Some(String::new());
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if name.as_ref() == result_element.as_bytes() {
                    saw_result = true;
                } else if in_result && name.as_ref() == b"string" {
                    entries.push(String::new());
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = current.as_mut() {
                    let unescaped =
                        e.unescape().map_err(|e| TransportFault::Malformed(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"string" {
                    if let Some(text) = current.take() {
                        entries.push(text);
                    }
                } else if name.as_ref() == result_element.as_bytes() {
                    in_result = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TransportFault::Malformed(format!("invalid XML: {e}"))),
        }
    }

    if !saw_result {
        return Err(TransportFault::Malformed(format!("response has no {result_element}")));
    }

    Ok(entries)
}

fn is_success(operation: Operation, result: &str) -> bool {
    let Ok(code) = result.trim().parse::<i64>() else {
        return false;
    };
    match operation {
        Operation::Lookup => code > -1,
        Operation::Authenticate | Operation::ProcessAndSettle => code == 0,
    }
}

/// Interprets a prettified response for `operation`.
#[must_use]
pub fn interpret(operation: Operation, map: &HashMap<String, String>) -> TransactionResult {
    let kind = operation.kind();
    let get = |key: &str| map.get(key).filter(|v| !v.is_empty()).cloned();

    let mut message = get("ErrorDesc");
    if operation == Operation::ProcessAndSettle {
        message = message.or_else(|| get("FSPMessage"));
    }

    let Some(result) = map.get("Result") else {
        warn!(operation = operation.as_str(), "legacy response has no Result");
        return TransactionResult::failure(kind, UNEXPECTED_ERROR, message.as_deref());
    };

    if !is_success(operation, result) {
        let code = get("ErrorCode")
            .or_else(|| Some(result.trim()).filter(|r| !r.is_empty()).map(str::to_owned))
            .unwrap_or_else(|| UNEXPECTED_ERROR.to_owned());
        return TransactionResult::failure(kind, code, message.as_deref());
    }

    let detail = match operation {
        Operation::Lookup => ResultDetail::Lookup(LookupDetail {
            transaction_index: get("TransactionIndex"),
            enrolled: get("Enrolled"),
            acs_url: get("ACSUrl"),
            pareq: get("PAReq"),
            eci: get("ECI"),
            order_id: None,
        }),
        Operation::Authenticate => ResultDetail::Authorize(AuthorizeDetail {
            cavv: get("CAVV"),
            xid: get("XID"),
            eci: get("ECI"),
            signature_verification: get("SignatureVerification"),
            pares_status: get("PAResStatus"),
        }),
        Operation::ProcessAndSettle => ResultDetail::Debit(DebitDetail {
            transaction_index: get("TransactionIndex"),
            authorisation_code: get("AuthorisationCode"),
            raw: None,
        }),
    };

    TransactionResult::success(kind, detail)
}

/// Legacy SOAP transport.
#[derive(Debug, Clone)]
pub struct LegacyTransport {
    http: HttpTransport,
}

impl sealed::private::Sealed for LegacyTransport {}

impl LegacyTransport {
    /// Creates a legacy transport over the given HTTP client.
    #[must_use]
    pub const fn new(http: HttpTransport) -> Self {
        Self { http }
    }

    async fn call(
        &self,
        operation: Operation,
        config: &Configuration,
        transaction: &Transaction,
    ) -> Result<HashMap<String, String>, TransportFault> {
        let params = operation_params(operation, config, transaction);
        let envelope = build_envelope(operation, &params)?;
        let soap_action = operation.soap_action();

        let ctx = RequestContext {
            url: config.legacy_url(),
            headers: vec![("SOAPAction", soap_action.as_str())],
            content_type: Some("text/xml; charset=utf-8"),
            ..Default::default()
        };
        let response = self.http.post(ctx, envelope.into_bytes()).await?;
        let body = String::from_utf8_lossy(&response.body);
        let map = prettify_response(parse_envelope(operation, &body)?);
        debug!(keys = ?map.keys().collect::<Vec<_>>(), "legacy response parsed");
        Ok(map)
    }

    #[instrument(
        skip_all,
        fields(
            transaction_id = %transaction.id(),
            operation = operation.as_str(),
            url = config.legacy_url()
        )
    )]
    async fn perform(
        &self,
        operation: Operation,
        config: &Configuration,
        transaction: &Transaction,
    ) -> TransactionResult {
        match self.call(operation, config, transaction).await {
            Ok(map) => interpret(operation, &map),
            Err(fault) => {
                warn!(error = %fault, "legacy gateway call failed");
                TransactionResult::failure(operation.kind(), COMMUNICATION_ERROR, None)
            }
        }
    }
}

impl GatewayProtocol for LegacyTransport {
    async fn lookup<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> TransactionResult {
        self.perform(Operation::Lookup, config, transaction).await
    }

    async fn authorize<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> TransactionResult {
        self.perform(Operation::Authenticate, config, transaction).await
    }

    async fn debit<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> TransactionResult {
        self.perform(Operation::ProcessAndSettle, config, transaction).await
    }

    fn protocol_name(&self) -> &'static str {
        "legacy"
    }
}
