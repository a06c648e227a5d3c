//! Transaction orchestration.
//!
//! [`ProtocolAdapter::perform_transaction`] is the single entry point: it checks both
//! inputs are built, picks the transport from [`Configuration::protocol`], fires the
//! `*_initiated` callback, performs exactly one network call, attaches the
//! [`TransactionResult`](crate::transaction::TransactionResult) and fires either
//! `*_succeeded` or `*_failed`.

use tracing::{debug, info, instrument};

use crate::{
    config::{Configuration, Protocol},
    error::{GatewayError, Result},
    transaction::{LifecycleEvent, Transaction, TransactionKind, TransactionResult},
    transport::{GatewayProtocol, HttpConfig, HttpTransport, LegacyTransport, RestTransport},
};

pub(crate) const UNBUILT_CONFIGURATION: &str =
    "Cannot use unbuilt configuration: use build() to validate and construct the config";
pub(crate) const UNBUILT_TRANSACTION: &str =
    "Cannot use unbuilt transaction: use build() to validate and construct the transaction";

/// Dispatches transactions to the configured transport.
///
/// Both transports share one pooled HTTP client.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use iveri_gateway::{
///     adapter::ProtocolAdapter,
///     config::Configuration,
///     transaction::{TracingListener, Transaction},
/// };
/// use rust_decimal::Decimal;
///
/// # async fn example() -> iveri_gateway::error::Result<()> {
/// let config = Configuration::new()
///     .with_user_group_id("{GROUP}")
///     .with_username("merchant")
///     .with_password("secret")
///     .with_application_id("{APP}")
///     .with_certificate_id("{CERT}")
///     .with_live(false)
///     .build()?;
///
/// let mut debit = Transaction::debit(Arc::new(TracingListener))
///     .with_amount(Decimal::new(2_500, 2))
///     .with_currency("ZAR")
///     .with_pan_holder_name("J Smith")
///     .with_pan_number("4111111111111111")
///     .with_pan_code("123")
///     .with_pan_expiry(12, 2030)
///     .with_reference("order-1")
///     .build()?;
///
/// let adapter = ProtocolAdapter::for_configuration(&config)?;
/// adapter.perform_transaction(&config, &mut debit).await?;
///
/// if debit.fails() {
///     eprintln!("{}", debit.error_message().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProtocolAdapter {
    rest: RestTransport,
    legacy: LegacyTransport,
}

impl ProtocolAdapter {
    /// Creates an adapter whose transports use the given HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] for out-of-range settings or
    /// [`GatewayError::HttpClient`] if the client cannot be constructed.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let http = HttpTransport::with_config(http)?;
        Ok(Self { rest: RestTransport::new(http.clone()), legacy: LegacyTransport::new(http) })
    }

    /// Creates an adapter using the HTTP settings of `config`.
    ///
    /// # Errors
    ///
    /// Same as [`ProtocolAdapter::new`].
    pub fn for_configuration(config: &Configuration) -> Result<Self> {
        Self::new(config.http())
    }

    /// Wire name of the transport that serves `protocol`.
    #[must_use]
    pub fn transport_name(&self, protocol: Protocol) -> &'static str {
        match protocol {
            Protocol::Rest => self.rest.protocol_name(),
            Protocol::Legacy => self.legacy.protocol_name(),
        }
    }

    /// Performs one gateway call for `transaction` and attaches the outcome.
    ///
    /// Gateway declines and transport failures are not errors: they end up as a failed
    /// result on the transaction, with `*_failed` fired.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Precondition`] if `config` or `transaction` is not built.
    /// No callback fires in that case.
    #[instrument(
        skip_all,
        fields(
            transaction_id = %transaction.id(),
            kind = ?transaction.kind(),
            protocol = config.protocol().name()
        )
    )]
    pub async fn perform_transaction(
        &self,
        config: &Configuration,
        transaction: &mut Transaction,
    ) -> Result<()> {
        if !config.is_built() {
            return Err(GatewayError::Precondition(UNBUILT_CONFIGURATION.to_owned()));
        }
        let Some(kind) = transaction.kind().filter(|_| transaction.is_built()) else {
            return Err(GatewayError::Precondition(UNBUILT_TRANSACTION.to_owned()));
        };

        info!("dispatching transaction");
        transaction.notify(LifecycleEvent::Initiated);

        let result = match config.protocol() {
            Protocol::Rest => dispatch(&self.rest, kind, config, transaction).await,
            Protocol::Legacy => dispatch(&self.legacy, kind, config, transaction).await,
        };

        transaction.attach_result(result);

        let event =
            if transaction.fails() { LifecycleEvent::Failed } else { LifecycleEvent::Succeeded };
        transaction.notify(event);

        info!(
            outcome = %event,
            transport = self.transport_name(config.protocol()),
            error_code = transaction.error_code().unwrap_or_default(),
            "transaction completed"
        );
        Ok(())
    }
}

async fn dispatch<P: GatewayProtocol>(
    protocol: &P,
    kind: TransactionKind,
    config: &Configuration,
    transaction: &Transaction,
) -> TransactionResult {
    debug!(transport = protocol.protocol_name(), %kind, "sending gateway request");
    match kind {
        TransactionKind::ThreeDSecureLookup => protocol.lookup(config, transaction).await,
        TransactionKind::ThreeDSecureAuthorize => protocol.authorize(config, transaction).await,
        TransactionKind::Debit => protocol.debit(config, transaction).await,
    }
}
