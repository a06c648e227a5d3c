//! REST protocol: JSON debit against the iVeri Enterprise API.
//!
//! Lookup and authorize are delegated to the [`centinel`](super::centinel) service.
//! A debit is `POST {gateway}transactions` with a signed `Authorization` header; the
//! outcome is read from `Transaction.Result` in the JSON response.

use serde_json::{Value, json};
use tracing::{instrument, warn};
use url::Url;

use super::{
    GatewayProtocol, TransportFault, centinel, connection_failure,
    http::{HttpTransport, RequestContext},
    sealed,
};
use crate::{
    auth,
    card::EciFlag,
    codes::UNEXPECTED_RESPONSE,
    config::Configuration,
    transaction::{DebitDetail, ResultDetail, Transaction, TransactionKind, TransactionResult},
};

/// Debit endpoint, relative to the gateway base URL. Also part of the signed token.
pub const DEBIT_ENDPOINT: &str = "transactions";

/// REST transport.
#[derive(Debug, Clone)]
pub struct RestTransport {
    http: HttpTransport,
}

impl sealed::private::Sealed for RestTransport {}

impl RestTransport {
    /// Creates a REST transport over the given HTTP client.
    #[must_use]
    pub const fn new(http: HttpTransport) -> Self {
        Self { http }
    }

    #[instrument(skip_all, fields(transaction_id = %transaction.id(), kind = "DEBIT"))]
    async fn submit_debit(
        &self,
        config: &Configuration,
        transaction: &Transaction,
    ) -> Result<Value, TransportFault> {
        let url = Url::parse(config.gateway())
            .and_then(|base| base.join(DEBIT_ENDPOINT))
            .map_err(|e| TransportFault::InvalidUrl(e.to_string()))?;
        let authorization = auth::authorization_header(config, DEBIT_ENDPOINT);
        let body = serde_json::to_vec(&debit_body(config, transaction))
            .map_err(|e| TransportFault::Malformed(e.to_string()))?;

        let ctx = RequestContext {
            url: url.as_str(),
            headers: vec![("Authorization", authorization.as_str())],
            content_type: Some("application/json"),
            ..Default::default()
        };
        let response = self.http.post(ctx, body).await?;

        serde_json::from_slice(&response.body)
            .map_err(|e| TransportFault::Malformed(format!("invalid JSON: {e}")))
    }
}

/// Builds the JSON body of a debit request.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use iveri_gateway::{config::Configuration, transaction::{NoopListener, Transaction}};
/// use iveri_gateway::transport::rest::debit_body;
///
/// let config = Configuration::new().with_certificate_id("{CERT}").with_live(true);
/// let debit = Transaction::debit(Arc::new(NoopListener)).with_eci("02");
/// let body = debit_body(&config, &debit);
///
/// assert_eq!(body["Transaction"]["Mode"], "Live");
/// assert_eq!(body["Transaction"]["ElectronicCommerceIndicator"], "ThreeDSecure");
/// ```
#[must_use]
pub fn debit_body(config: &Configuration, transaction: &Transaction) -> Value {
    json!({
        "CertificateID": config.certificate_id(),
        "Transaction": {
            "ApplicationID": config.application_id(),
            "Command": "Debit",
            "Mode": config.mode(),
            "ExpiryDate": transaction.expiry_date(),
            "PAN": transaction.pan_number(),
            "CardSecurityCode": transaction.pan_code(),
            "Amount": transaction.amount_in_cents(),
            "Currency": transaction.currency(),
            "MerchantReference": transaction.reference(),
            "ElectronicCommerceIndicator": EciFlag::from_code(transaction.eci()).as_str(),
            "CardholderName": transaction.pan_holder_name(),
            "CardHolderAuthenticationID": transaction.xid(),
            "CardHolderAuthenticationData": transaction.cavv(),
        }
    })
}

/// Interprets a debit response document.
///
/// Success iff `Transaction.Result.Status` is `0` (number or string). A document
/// without `Transaction.Result` yields `X0002`.
#[must_use]
pub fn interpret_debit(response: Value) -> TransactionResult {
    let kind = TransactionKind::Debit;

    let Some(result) = response.pointer("/Transaction/Result") else {
        warn!("debit response has no Transaction.Result");
        return TransactionResult::failure(kind, UNEXPECTED_RESPONSE, None)
            .with_detail(ResultDetail::Debit(DebitDetail { raw: Some(response), ..Default::default() }));
    };

    let status = result.get("Status").map(scalar_to_string);
    if status.as_deref().map(str::trim) == Some("0") {
        let detail = DebitDetail {
            transaction_index: response.pointer("/Transaction/TransactionIndex").map(scalar_to_string),
            authorisation_code: response
                .pointer("/Transaction/AuthorisationCode")
                .map(scalar_to_string),
            raw: Some(response),
        };
        return TransactionResult::success(kind, ResultDetail::Debit(detail));
    }

    let code = result
        .get("Code")
        .map(scalar_to_string)
        .filter(|code| !code.is_empty())
        .or(status)
        .unwrap_or_else(|| UNEXPECTED_RESPONSE.to_owned());
    let description = result.get("Description").and_then(Value::as_str).map(str::to_owned);

    TransactionResult::failure(kind, code, description.as_deref())
        .with_detail(ResultDetail::Debit(DebitDetail { raw: Some(response), ..Default::default() }))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl GatewayProtocol for RestTransport {
    async fn lookup<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> TransactionResult {
        centinel::lookup(&self.http, config, transaction).await
    }

    async fn authorize<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> TransactionResult {
        centinel::authenticate(&self.http, config, transaction).await
    }

    async fn debit<'a>(
        &'a self,
        config: &'a Configuration,
        transaction: &'a Transaction,
    ) -> TransactionResult {
        match self.submit_debit(config, transaction).await {
            Ok(response) => interpret_debit(response),
            Err(fault) => connection_failure(TransactionKind::Debit, &fault),
        }
    }

    fn protocol_name(&self) -> &'static str {
        "rest"
    }
}
